// src/web/routes.rs
use crate::{
    state::AppState,
    web::{
        attendance_handlers, auth_handlers, dashboard_handlers, history_handlers, mw_auth,
        student_handlers,
    },
};
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use time::Duration;
use tower::ServiceBuilder;
use tower_cookies::CookieManagerLayer;
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, SessionManagerLayer, SessionStore};

async fn health() -> &'static str {
    "ok"
}

pub fn create_router(app_state: AppState) -> Router {
    // --- Rotas Públicas ---
    let public_routes = Router::new()
        .route("/login", get(auth_handlers::show_login_form).post(auth_handlers::handle_login))
        .route(
            "/register",
            get(auth_handlers::show_register_form).post(auth_handlers::handle_register),
        )
        .route("/logout", get(auth_handlers::handle_logout))
        .route("/health", get(health));

    // --- Rotas Autenticadas ---
    let authenticated_routes = Router::new()
        .route("/", get(dashboard_handlers::dashboard))
        .route("/classrooms", post(dashboard_handlers::handle_create_classroom))
        .route("/classrooms/new", get(dashboard_handlers::show_classroom_form))
        .route("/classrooms/{id}/delete", post(dashboard_handlers::handle_delete_classroom))
        // Alunos da turma
        .route(
            "/classrooms/{id}/students",
            get(student_handlers::show_students).post(student_handlers::handle_add_student),
        )
        .route(
            "/classrooms/{id}/students/import",
            post(student_handlers::handle_import_students),
        )
        .route(
            "/classrooms/{id}/students/{student_id}",
            post(student_handlers::handle_update_student),
        )
        .route(
            "/classrooms/{id}/students/{student_id}/delete",
            post(student_handlers::handle_remove_student),
        )
        // Chamada: escolher data/hora, depois marcar
        .route("/classrooms/{id}/attendance", get(attendance_handlers::show_session_select))
        .route(
            "/classrooms/{id}/attendance/mark",
            get(attendance_handlers::show_mark_form).post(attendance_handlers::handle_submit_attendance),
        )
        .route("/history", get(history_handlers::show_history))
        .route("/history/export", get(history_handlers::handle_export))
        // require_auth em todas as rotas acima
        .route_layer(middleware::from_fn_with_state(
            app_state.clone(),
            mw_auth::require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(authenticated_routes)
        .with_state(app_state)
}

/// Router com as camadas de trace, cookies e sessão. `secure` marca o cookie
/// de sessão como só-HTTPS.
pub fn create_app<S>(app_state: AppState, session_store: S, secure: bool) -> Router
where
    S: SessionStore + Clone,
{
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(secure)
        .with_http_only(true)
        .with_expiry(Expiry::OnInactivity(Duration::days(1)));

    create_router(app_state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CookieManagerLayer::new())
            .layer(session_layer),
    )
}
