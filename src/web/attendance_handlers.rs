// src/web/attendance_handlers.rs
use crate::{
    error::{AppError, AppResult},
    models::attendance::SessionQuery,
    services::{
        attendance_service::{self, SessionSlot, STATUS_FIELD_PREFIX},
        classroom_service, student_service,
    },
    state::AppState,
    templates::{MarkPage, SessionSelectPage, StudentRow},
    web::{
        flash::{set_flash, take_flash, Flash},
        mw_auth::CurrentUser,
        render,
    },
};
use axum::{
    extract::{Extension, Form, Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use std::collections::HashMap;
use tower_cookies::Cookies;

fn select_url(classroom_id: &str) -> String {
    format!("/classrooms/{}/attendance", classroom_id)
}

fn mark_url(classroom_id: &str, slot: &SessionSlot) -> String {
    format!(
        "/classrooms/{}/attendance/mark?date={}&time={}",
        classroom_id,
        urlencoding::encode(&slot.date),
        urlencoding::encode(&slot.time)
    )
}

fn history_url(classroom_id: &str) -> String {
    format!("/history?classroom={}", urlencoding::encode(classroom_id))
}

// GET /classrooms/{id}/attendance
pub async fn show_session_select(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    cookies: Cookies,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let classroom = classroom_service::find_owned(&state.store, &user, &id).await?;
    let now = SessionSlot::now();
    let template = SessionSelectPage {
        user_name: user.full_name,
        flash: take_flash(&cookies, &state.cookie_key),
        classroom_id: classroom.id,
        classroom_name: classroom.name,
        classroom_subject: classroom.subject,
        date: now.date,
        time: now.time,
    };
    Ok(render(&template)?.into_response())
}

// GET /classrooms/{id}/attendance/mark?date=&time=
pub async fn show_mark_form(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    cookies: Cookies,
    Path(id): Path<String>,
    Query(query): Query<SessionQuery>,
) -> AppResult<Response> {
    let classroom = classroom_service::find_owned(&state.store, &user, &id).await?;
    let slot = match SessionSlot::parse(
        query.date.as_deref().unwrap_or_default(),
        query.time.as_deref().unwrap_or_default(),
    ) {
        Ok(slot) => slot,
        Err(e) => {
            set_flash(&cookies, &state.cookie_key, Flash::from_error(&e, "Select a date and time."));
            return Ok(Redirect::to(&select_url(&classroom.id)).into_response());
        }
    };

    if !attendance_service::session_records(&state.store, &classroom, &slot)
        .await?
        .is_empty()
    {
        let e = AppError::SessionAlreadyRecorded(format!("{} {}", slot.date, slot.time));
        set_flash(&cookies, &state.cookie_key, Flash::from_error(&e, ""));
        return Ok(Redirect::to(&select_url(&classroom.id)).into_response());
    }

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

    let template = MarkPage {
        user_name: user.full_name,
        flash: take_flash(&cookies, &state.cookie_key),
        classroom_id: classroom.id,
        classroom_name: classroom.name,
        date: slot.date,
        time: slot.time,
        students,
        status_prefix: STATUS_FIELD_PREFIX,
    };
    Ok(render(&template)?.into_response())
}

// POST /classrooms/{id}/attendance/mark
// Campos: date, time e um status_<roll> por aluno
pub async fn handle_submit_attendance(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    cookies: Cookies,
    Path(id): Path<String>,
    Form(form): Form<HashMap<String, String>>,
) -> AppResult<Redirect> {
    let classroom = classroom_service::find_owned(&state.store, &user, &id).await?;
    let field = |name: &str| form.get(name).map(String::as_str).unwrap_or_default();

    let slot = match SessionSlot::parse(field("date"), field("time")) {
        Ok(slot) => slot,
        Err(e) => {
            set_flash(&cookies, &state.cookie_key, Flash::from_error(&e, "Select a date and time."));
            return Ok(Redirect::to(&select_url(&classroom.id)));
        }
    };

    let result = match attendance_service::parse_marks(&form) {
        Ok(marks) => attendance_service::submit_session(&state.store, &user, &classroom, &slot, &marks).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(created) => {
            set_flash(
                &cookies,
                &state.cookie_key,
                Flash::success(format!("Attendance recorded for {} students.", created.len())),
            );
            Ok(Redirect::to(&history_url(&classroom.id)))
        }
        Err(e @ AppError::SessionAlreadyRecorded(_)) => {
            set_flash(&cookies, &state.cookie_key, Flash::from_error(&e, ""));
            Ok(Redirect::to(&history_url(&classroom.id)))
        }
        Err(e) => {
            tracing::error!("Falha ao gravar chamada da turma {}: {:?}", classroom.id, e);
            set_flash(
                &cookies,
                &state.cookie_key,
                Flash::from_error(&e, "Failed to save attendance. Please try again."),
            );
            Ok(Redirect::to(&mark_url(&classroom.id, &slot)))
        }
    }
}
