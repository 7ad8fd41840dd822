// src/web/auth_handlers.rs
use crate::{
    error::{AppError, AppResult},
    models::user::{LoginForm, RegisterForm},
    services::auth_service,
    state::AppState,
    templates::{LoginPage, RegisterPage},
    web::render,
};
use axum::{
    extract::{Form, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;

#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    #[serde(default)]
    pub return_to: Option<String>,
}

fn login_page(error: Option<&str>, return_to: String) -> AppResult<Response> {
    let template = LoginPage {
        error: error.map(str::to_string),
        return_to,
    };
    Ok(render(&template)?.into_response())
}

// GET /login
pub async fn show_login_form(
    session: Session,
    Query(query): Query<LoginQuery>,
) -> AppResult<Response> {
    let return_to = auth_service::safe_return_to(query.return_to.as_deref());
    // Já logado: segue direto para o destino
    if session
        .get::<String>(auth_service::SESSION_USER_KEY)
        .await
        .ok()
        .flatten()
        .is_some()
    {
        tracing::debug!("GET /login: utilizador já logado, redirecionando para {}", return_to);
        return Ok(Redirect::to(&return_to).into_response());
    }
    login_page(None, return_to)
}

// POST /login
pub async fn handle_login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> AppResult<Response> {
    tracing::info!("Tentativa de login para: {}", form.email);
    let return_to = auth_service::safe_return_to(form.return_to.as_deref());

    match auth_service::authenticate(&state.store, &form.email, &form.password).await {
        Ok(user) => {
            auth_service::start_session(&session, &user).await?;
            tracing::info!("✅ Login bem-sucedido para: {}", user.email);
            Ok(Redirect::to(&return_to).into_response())
        }
        Err(AppError::InvalidCredentials) => login_page(Some("Invalid email or password."), return_to),
        Err(e) => Err(e),
    }
}

// GET /register
pub async fn show_register_form() -> AppResult<Response> {
    let template = RegisterPage {
        error: None,
        email: String::new(),
        full_name: String::new(),
    };
    Ok(render(&template)?.into_response())
}

// POST /register
pub async fn handle_register(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> AppResult<Response> {
    let error = match auth_service::register(&state.store, &form).await {
        Ok(user) => {
            auth_service::start_session(&session, &user).await?;
            return Ok(Redirect::to("/").into_response());
        }
        Err(AppError::Validation(msg)) => msg,
        Err(AppError::AccountExists(_)) => "An account with this email already exists.".to_string(),
        Err(e) => return Err(e),
    };
    // Volta a mostrar o formulário com o que já foi escrito (nunca a senha)
    let template = RegisterPage {
        error: Some(error),
        email: form.email,
        full_name: form.full_name,
    };
    Ok(render(&template)?.into_response())
}

// GET /logout
pub async fn handle_logout(session: Session) -> AppResult<Redirect> {
    let email: Option<String> = session
        .get(auth_service::SESSION_USER_KEY)
        .await
        .ok()
        .flatten();
    auth_service::logout(&session).await?;

    if let Some(email) = email {
        tracing::info!("🚪 Utilizador '{}' desligado.", email);
    } else {
        tracing::info!("🚪 Sessão anónima desligada.");
    }
    Ok(Redirect::to("/login"))
}
