// src/web/student_handlers.rs
use crate::{
    error::{AppError, AppResult},
    models::student::StudentForm,
    services::{classroom_service, student_service},
    state::AppState,
    templates::{StudentRow, StudentsPage},
    web::{
        flash::{set_flash, take_flash, Flash},
        mw_auth::CurrentUser,
        render,
    },
};
use axum::{
    extract::{Extension, Form, Multipart, Path, State},
    response::{IntoResponse, Redirect, Response},
};
use tower_cookies::Cookies;

fn roster_url(classroom_id: &str) -> String {
    format!("/classrooms/{}/students", classroom_id)
}

// GET /classrooms/{id}/students
pub async fn show_students(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    cookies: Cookies,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let classroom = classroom_service::find_owned(&state.store, &user, &id).await?;
    let students = student_service::list_for_classroom(&state.store, &classroom)
        .await?
        .into_iter()
        .map(|s| StudentRow {
            id: s.id,
            name: s.name,
            roll: s.roll,
            email: s.email.unwrap_or_default(),
        })
        .collect();

    let template = StudentsPage {
        user_name: user.full_name,
        flash: take_flash(&cookies, &state.cookie_key),
        classroom_id: classroom.id,
        classroom_name: classroom.name,
        classroom_subject: classroom.subject,
        students,
    };
    Ok(render(&template)?.into_response())
}

// POST /classrooms/{id}/students
pub async fn handle_add_student(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    cookies: Cookies,
    Path(id): Path<String>,
    Form(form): Form<StudentForm>,
) -> AppResult<Redirect> {
    let classroom = classroom_service::find_owned(&state.store, &user, &id).await?;
    let flash = match student_service::add_student(&state.store, &classroom, &form).await {
        Ok(student) => Flash::success(format!("Student '{}' added.", student.name)),
        Err(e) => {
            tracing::warn!("Aluno não adicionado à turma {}: {:?}", classroom.id, e);
            Flash::from_error(&e, "Failed to add student. Please try again.")
        }
    };
    set_flash(&cookies, &state.cookie_key, flash);
    Ok(Redirect::to(&roster_url(&classroom.id)))
}

// POST /classrooms/{id}/students/{student_id}
pub async fn handle_update_student(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    cookies: Cookies,
    Path((id, student_id)): Path<(String, String)>,
    Form(form): Form<StudentForm>,
) -> AppResult<Redirect> {
    let classroom = classroom_service::find_owned(&state.store, &user, &id).await?;
    let flash = match student_service::update_student(&state.store, &classroom, &student_id, &form).await {
        Ok(student) => Flash::success(format!("Student '{}' updated.", student.name)),
        Err(e) => {
            tracing::warn!("Aluno {} não atualizado: {:?}", student_id, e);
            Flash::from_error(&e, "Failed to update student. Please try again.")
        }
    };
    set_flash(&cookies, &state.cookie_key, flash);
    Ok(Redirect::to(&roster_url(&classroom.id)))
}

// POST /classrooms/{id}/students/{student_id}/delete
pub async fn handle_remove_student(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    cookies: Cookies,
    Path((id, student_id)): Path<(String, String)>,
) -> AppResult<Redirect> {
    let classroom = classroom_service::find_owned(&state.store, &user, &id).await?;
    let flash = match student_service::remove_student(&state.store, &classroom, &student_id).await {
        Ok(()) => Flash::success("Student removed."),
        Err(e) => {
            tracing::error!("Falha ao remover aluno {}: {:?}", student_id, e);
            Flash::from_error(&e, "Failed to remove student. Please try again.")
        }
    };
    set_flash(&cookies, &state.cookie_key, flash);
    Ok(Redirect::to(&roster_url(&classroom.id)))
}

// Conteúdo do campo "file" do upload
async fn read_upload(multipart: &mut Multipart) -> AppResult<Vec<u8>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Could not read the upload: {}", e)))?
    {
        if field.name() == Some("file") {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::Validation(format!("Could not read the upload: {}", e)))?;
            return Ok(bytes.to_vec());
        }
    }
    Err(AppError::Validation("Choose a CSV file to import.".into()))
}

// POST /classrooms/{id}/students/import
pub async fn handle_import_students(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    cookies: Cookies,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> AppResult<Redirect> {
    let classroom = classroom_service::find_owned(&state.store, &user, &id).await?;
    let imported = match read_upload(&mut multipart).await {
        Ok(data) => student_service::import_students(&state.store, &classroom, &data).await,
        Err(e) => Err(e),
    };
    let flash = match imported {
        Ok(created) => Flash::success(format!("Imported {} students.", created.len())),
        Err(e) => {
            tracing::warn!("Importação de alunos falhou na turma {}: {:?}", classroom.id, e);
            Flash::from_error(&e, "Failed to import students. Please try again.")
        }
    };
    set_flash(&cookies, &state.cookie_key, flash);
    Ok(Redirect::to(&roster_url(&classroom.id)))
}
