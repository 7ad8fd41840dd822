// src/error.rs
use axum::{http::StatusCode, response::Html, response::IntoResponse};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Erro na base de dados: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Erro de migração da base de dados: {0}")]
    SqlxMigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Configuração inválida: {0}")]
    ConfigError(String),

    // Registo vindo do store não tem o formato esperado pela entidade
    #[error("Registo inválido para {entity}: {source}")]
    MalformedRecord {
        entity: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Campo desconhecido '{field}' para {entity}")]
    UnknownField { entity: &'static str, field: String },

    #[error("Falha no store de registos: {0}")]
    StoreError(String),

    #[error("Erro ao processar password")]
    PasswordHashingError,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Já existe uma conta para {0}")]
    AccountExists(String),

    #[error("Erro na sessão: {0}")]
    SessionError(String),

    #[error("Dados inválidos: {0}")]
    Validation(String),

    #[error("Sessão de chamada já registada: {0}")]
    SessionAlreadyRecorded(String),

    #[error("Nada para exportar")]
    NothingToExport,

    #[error("Não encontrado: {0}")]
    NotFound(String),

    #[error("Erro interno inesperado")]
    InternalServerError,

    #[error("Não autorizado")]
    Unauthorized,
}

impl AppError {
    /// Estado HTTP e mensagem mostrada ao utilizador.
    pub fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            AppError::SqlxError(_) | AppError::SqlxMigrateError(_) | AppError::StoreError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Could not access the data store.".to_string(),
            ),
            AppError::MalformedRecord { .. } | AppError::UnknownField { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "The data store returned an unexpected record.".to_string(),
            ),
            AppError::ConfigError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Configuration error.".to_string(),
            ),
            AppError::PasswordHashingError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Could not process credentials.".to_string(),
            ),
            AppError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "Invalid email or password.".to_string())
            }
            AppError::AccountExists(_) => (
                StatusCode::CONFLICT,
                "An account with this email already exists.".to_string(),
            ),
            AppError::SessionError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Could not manage your session.".to_string(),
            ),
            AppError::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg.clone()),
            AppError::SessionAlreadyRecorded(_) => (
                StatusCode::CONFLICT,
                "Attendance for this session was already recorded.".to_string(),
            ),
            AppError::NothingToExport => {
                (StatusCode::UNPROCESSABLE_ENTITY, "No data to export".to_string())
            }
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "Not found.".to_string()),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Please log in.".to_string()),
            AppError::InternalServerError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Unexpected error.".to_string(),
            ),
        }
    }

    pub fn user_message(&self) -> String {
        self.status_and_message().1
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        tracing::error!("Erro processado: {:?}", self);

        let (status, user_message) = self.status_and_message();

        // Página HTML simples, sem template, para funcionar mesmo se o askama falhar
        (
            status,
            Html(format!(
                r#"
            <!DOCTYPE html><html><head><title>Error</title><style>body{{font-family:sans-serif;}}</style></head>
            <body><h1>Error {status_code}</h1><p>{message}</p><a href="javascript:history.back()">Back</a></body></html>
         "#,
                status_code = status.as_u16(),
                message = escape_html(&user_message)
            )),
        )
            .into_response()
    }
}

fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

// Tipo Result padrão para a aplicação
pub type AppResult<T = ()> = Result<T, AppError>;
