// src/web/dashboard_handlers.rs
use crate::{
    error::{AppError, AppResult},
    models::classroom::ClassroomForm,
    services::classroom_service,
    state::AppState,
    templates::{ClassroomCard, ClassroomFormPage, DashboardPage},
    web::{
        flash::{set_flash, take_flash, Flash},
        mw_auth::{login_prompt, CurrentUser},
        render,
    },
};
use axum::{
    extract::{Extension, Form, Path, State},
    response::{IntoResponse, Redirect, Response},
};
use tower_cookies::Cookies;

pub const DELETE_FAILED: &str = "Failed to delete classroom. Please try again.";

// GET /
pub async fn dashboard(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    cookies: Cookies,
) -> AppResult<Response> {
    let summaries = match classroom_service::load_dashboard(&state.store, &user).await {
        Ok(summaries) => summaries,
        Err(e) => {
            tracing::error!("Dashboard: falha ao carregar turmas de {}: {:?}", user.email, e);
            return Ok(login_prompt("/"));
        }
    };
    // só consome o aviso quando a página vai mesmo ser mostrada
    let flash = take_flash(&cookies, &state.cookie_key);
    let totals = classroom_service::dashboard_totals(&summaries);

    let classrooms = summaries
        .into_iter()
        .map(|s| ClassroomCard {
            id: s.classroom.id,
            name: s.classroom.name,
            subject: s.classroom.subject,
            description: s.classroom.description.unwrap_or_default(),
            student_count: s.student_count,
        })
        .collect();

    let template = DashboardPage {
        user_name: user.full_name,
        flash,
        classrooms,
        total_classrooms: totals.classrooms,
        total_students: totals.students,
        total_subjects: totals.subjects,
    };
    Ok(render(&template)?.into_response())
}

// GET /classrooms/new
pub async fn show_classroom_form(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    cookies: Cookies,
) -> AppResult<Response> {
    let template = ClassroomFormPage {
        user_name: user.full_name,
        flash: take_flash(&cookies, &state.cookie_key),
        error: None,
        name: String::new(),
        subject: String::new(),
        description: String::new(),
    };
    Ok(render(&template)?.into_response())
}

// POST /classrooms
pub async fn handle_create_classroom(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    cookies: Cookies,
    Form(form): Form<ClassroomForm>,
) -> AppResult<Response> {
    match classroom_service::create_classroom(&state.store, &user, &form).await {
        Ok(classroom) => {
            set_flash(
                &cookies,
                &state.cookie_key,
                Flash::success(format!("Classroom '{}' created.", classroom.name)),
            );
            Ok(Redirect::to("/").into_response())
        }
        Err(AppError::Validation(msg)) => {
            tracing::warn!("Turma recusada para {}: {}", user.email, msg);
            let template = ClassroomFormPage {
                user_name: user.full_name,
                flash: None,
                error: Some(msg),
                name: form.name,
                subject: form.subject,
                description: form.description.unwrap_or_default(),
            };
            Ok(render(&template)?.into_response())
        }
        Err(e) => {
            tracing::error!("Falha ao criar turma para {}: {:?}", user.email, e);
            set_flash(
                &cookies,
                &state.cookie_key,
                Flash::from_error(&e, "Failed to create classroom. Please try again."),
            );
            Ok(Redirect::to("/classrooms/new").into_response())
        }
    }
}

// POST /classrooms/{id}/delete
pub async fn handle_delete_classroom(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    cookies: Cookies,
    Path(id): Path<String>,
) -> Redirect {
    let flash = match classroom_service::delete_classroom(&state.store, &user, &id).await {
        Ok(()) => Flash::success("Classroom deleted."),
        Err(e) => {
            tracing::error!("Falha ao apagar turma {} de {}: {:?}", id, user.email, e);
            Flash::error(DELETE_FAILED)
        }
    };
    set_flash(&cookies, &state.cookie_key, flash);
    Redirect::to("/")
}
