// src/web/mw_auth.rs
use crate::{
    error::AppError,
    models::user::User,
    services::auth_service,
    state::AppState,
    templates::LoginPromptPage,
};
use askama::Template;
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{Html, IntoResponse, Response},
};
use tower_sessions::Session;

/// Professor autenticado, posto nas extensões do pedido por `require_auth`.
#[derive(Clone, Debug)]
pub struct CurrentUser(pub User);

/// Página "faça login para continuar" (401), com regresso a `return_to`.
pub fn login_prompt(return_to: &str) -> Response {
    let template = LoginPromptPage {
        login_url: auth_service::login_url(return_to),
    };
    match template.render() {
        Ok(html) => (StatusCode::UNAUTHORIZED, Html(html)).into_response(),
        Err(e) => {
            tracing::error!("Falha ao renderizar template do login prompt: {}", e);
            AppError::Unauthorized.into_response()
        }
    }
}

// Middleware que verifica se o utilizador está logado
pub async fn require_auth(
    State(state): State<AppState>,
    session: Session,
    mut request: Request,
    next: Next,
) -> Response {
    let return_to = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| "/".to_string());

    match auth_service::me(&state.store, &session).await {
        Ok(user) => {
            tracing::debug!("Autenticação MW: '{}' autenticado.", user.email);
            request.extensions_mut().insert(CurrentUser(user));
            next.run(request).await
        }
        Err(AppError::Unauthorized) => {
            tracing::debug!("Autenticação MW: sem login, mostrando prompt para {}", return_to);
            login_prompt(&return_to)
        }
        Err(e) => {
            // Falha a ler a sessão ou o store: o utilizador vê o mesmo prompt
            tracing::error!("Autenticação MW: erro ao obter utilizador: {:?}", e);
            login_prompt(&return_to)
        }
    }
}
