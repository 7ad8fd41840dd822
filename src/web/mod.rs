// src/web/mod.rs
pub mod attendance_handlers;
pub mod auth_handlers;
pub mod dashboard_handlers;
pub mod flash;
pub mod history_handlers;
pub mod mw_auth;
pub mod routes;
pub mod student_handlers;

use crate::error::{AppError, AppResult};
use askama::Template;
use axum::response::Html;

/// Renderiza um template askama; falhas viram erro interno.
pub fn render<T: Template>(template: &T) -> AppResult<Html<String>> {
    template.render().map(Html).map_err(|e| {
        tracing::error!("Falha ao renderizar template: {}", e);
        AppError::InternalServerError
    })
}
