// src/web/history_handlers.rs
use crate::{
    error::{AppError, AppResult},
    models::{
        attendance::{Attendance, AttendanceStatus, ClassroomSelection, SessionSummary},
        classroom::{UNKNOWN_CLASSROOM, UNKNOWN_SUBJECT},
    },
    services::{
        export_service::{self, CSV_CONTENT_TYPE},
        history_service::{self, parse_calendar_date},
    },
    state::AppState,
    templates::{ClassroomOption, HistoryPage, RecordRow, SessionCard},
    web::{
        flash::{set_flash, take_flash, Flash},
        mw_auth::{login_prompt, CurrentUser},
        render,
    },
};
use axum::{
    extract::{Extension, OriginalUri, Query, State},
    http::header,
    response::{IntoResponse, Redirect, Response},
};
use chrono::Local;
use serde::Deserialize;
use tower_cookies::Cookies;

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(default)]
    pub classroom: Option<String>,
}

fn history_url(selection: &ClassroomSelection) -> String {
    format!("/history?classroom={}", urlencoding::encode(selection.as_param()))
}

fn export_url(selection: &ClassroomSelection) -> String {
    format!("/history/export?classroom={}", urlencoding::encode(selection.as_param()))
}

// "Friday, March 1, 2024"; datas irreconhecíveis aparecem como vieram
fn date_label(raw: &str) -> String {
    parse_calendar_date(raw)
        .map(|d| d.format("%A, %B %-d, %Y").to_string())
        .unwrap_or_else(|| raw.to_string())
}

fn record_row(record: &Attendance) -> RecordRow {
    let status = record.status();
    RecordRow {
        student_name: record.student_name.clone(),
        student_roll: record.student_roll.clone(),
        student_email: record.student_email.clone().unwrap_or_default(),
        status_label: match status {
            Some(AttendanceStatus::Present) => "Present".to_string(),
            Some(AttendanceStatus::Absent) => "Absent".to_string(),
            None => record.status.clone(),
        },
        is_present: status == Some(AttendanceStatus::Present),
    }
}

fn session_card(session: &SessionSummary) -> SessionCard {
    let stats = session.stats();
    let (classroom_name, classroom_subject) = match &session.classroom {
        Some(c) => (c.name.clone(), c.subject.clone()),
        None => (UNKNOWN_CLASSROOM.to_string(), UNKNOWN_SUBJECT.to_string()),
    };
    SessionCard {
        classroom_name,
        classroom_subject,
        date_label: date_label(&session.date),
        time: session.time.clone(),
        present: stats.present,
        absent: stats.absent,
        total: stats.total,
        records: session.records.iter().map(record_row).collect(),
    }
}

// GET /history?classroom=
pub async fn show_history(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    cookies: Cookies,
    OriginalUri(uri): OriginalUri,
    Query(query): Query<HistoryQuery>,
) -> AppResult<Response> {
    let flash = take_flash(&cookies, &state.cookie_key);
    let selection = ClassroomSelection::from_param(query.classroom.as_deref());
    let view = match history_service::load_history(&state.store, &user, selection).await {
        Ok(view) => view,
        Err(e) => {
            tracing::error!("Histórico: falha ao carregar dados de {}: {:?}", user.email, e);
            let return_to = uri.path_and_query().map_or("/history", |pq| pq.as_str());
            return Ok(login_prompt(return_to));
        }
    };

    let options = view
        .classrooms
        .iter()
        .map(|c| ClassroomOption {
            id: c.id.clone(),
            label: format!("{} ({})", c.name, c.subject),
            selected: view.selection.is_selected(&c.id),
        })
        .collect();

    let template = HistoryPage {
        user_name: user.full_name,
        flash,
        options,
        all_selected: view.selection == ClassroomSelection::All,
        export_url: export_url(&view.selection),
        record_count: view.stats.total,
        present: view.stats.present,
        absent: view.stats.absent,
        sessions: view.sessions.iter().map(session_card).collect(),
    };
    Ok(render(&template)?.into_response())
}

// GET /history/export?classroom=
pub async fn handle_export(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    cookies: Cookies,
    Query(query): Query<HistoryQuery>,
) -> Response {
    let selection = ClassroomSelection::from_param(query.classroom.as_deref());
    let today = Local::now().date_naive();

    let result = match history_service::load_history(&state.store, &user, selection.clone()).await {
        Ok(view) => export_service::export_csv(&view.records, &view.classrooms, &view.selection, today),
        Err(e) => Err(e),
    };

    match result {
        Ok(export) => (
            [
                (header::CONTENT_TYPE, CSV_CONTENT_TYPE.to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", export.filename),
                ),
            ],
            export.content,
        )
            .into_response(),
        Err(e) => {
            if !matches!(e, AppError::NothingToExport) {
                tracing::error!("Exportação falhou para {}: {:?}", user.email, e);
            }
            set_flash(
                &cookies,
                &state.cookie_key,
                Flash::from_error(&e, "Failed to export attendance. Please try again."),
            );
            Redirect::to(&history_url(&selection)).into_response()
        }
    }
}
