// src/services/auth_service.rs
use crate::{
    error::{AppError, AppResult},
    models::user::{Credential, NewCredential, NewUser, RegisterForm, User},
    store::{Criteria, Entities, SharedStore},
};
use axum::http::Uri;
use tower_sessions::Session;

/// Chave da sessão onde fica o email do professor autenticado.
pub const SESSION_USER_KEY: &str = "user_email";

const MIN_PASSWORD_LEN: usize = 8;

/// Verifica se a senha fornecida corresponde ao hash guardado.
pub async fn verify_password(password: &str, stored_hash: &str) -> AppResult<bool> {
    let password = password.to_string();
    let stored_hash = stored_hash.to_string();
    tokio::task::spawn_blocking(move || {
        tracing::debug!("Verificando hash bcrypt...");
        bcrypt::verify(&password, &stored_hash)
    })
    .await
    .map_err(|e| {
        tracing::error!("Erro na task spawn_blocking (verify_password): {:?}", e);
        AppError::InternalServerError
    })?
    .map_err(|e| {
        tracing::error!("Erro bcrypt ao verificar senha: {:?}", e);
        AppError::PasswordHashingError
    })
}

/// Gera um hash bcrypt para uma senha.
pub async fn hash_password(password: &str) -> AppResult<String> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || {
        tracing::debug!("Gerando hash bcrypt...");
        bcrypt::hash(&password, bcrypt::DEFAULT_COST)
    })
    .await
    .map_err(|e| {
        tracing::error!("Erro na task spawn_blocking (hash_password): {:?}", e);
        AppError::InternalServerError
    })?
    .map_err(|e| {
        tracing::error!("Erro bcrypt ao gerar hash: {:?}", e);
        AppError::PasswordHashingError
    })
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

async fn find_user_by_email(store: &SharedStore, email: &str) -> AppResult<Option<User>> {
    let users = Entities::<User>::new(store.clone());
    Ok(users
        .filter(&Criteria::new().eq("email", email), None)
        .await?
        .into_iter()
        .next())
}

async fn find_credential(store: &SharedStore, email: &str) -> AppResult<Option<Credential>> {
    let credentials = Entities::<Credential>::new(store.clone());
    Ok(credentials
        .filter(&Criteria::new().eq("email", email), None)
        .await?
        .into_iter()
        .next())
}

/// Cria a conta de um professor (credencial + utilizador).
pub async fn register(store: &SharedStore, form: &RegisterForm) -> AppResult<User> {
    let email = normalize_email(&form.email);
    let full_name = form.full_name.trim();

    if !email.contains('@') || email.starts_with('@') || email.ends_with('@') {
        return Err(AppError::Validation("Please enter a valid email.".into()));
    }
    if full_name.is_empty() {
        return Err(AppError::Validation("Full name is required.".into()));
    }
    if form.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "Password must have at least {} characters.",
            MIN_PASSWORD_LEN
        )));
    }
    if find_credential(store, &email).await?.is_some() {
        tracing::warn!("Registo recusado: {} já tem conta.", email);
        return Err(AppError::AccountExists(email));
    }

    let password_hash = hash_password(&form.password).await?;
    Entities::<Credential>::new(store.clone())
        .create(&NewCredential {
            email: email.clone(),
            password_hash,
        })
        .await?;
    let user = Entities::<User>::new(store.clone())
        .create(&NewUser {
            email,
            full_name: full_name.to_string(),
        })
        .await?;

    tracing::info!("✅ Conta criada para {}", user.email);
    Ok(user)
}

/// Confere email e senha. Qualquer falha de identificação vira `InvalidCredentials`.
pub async fn authenticate(store: &SharedStore, email: &str, password: &str) -> AppResult<User> {
    let email = normalize_email(email);
    let Some(credential) = find_credential(store, &email).await? else {
        tracing::warn!("Login: credencial não encontrada para {}", email);
        return Err(AppError::InvalidCredentials);
    };
    if !verify_password(password, &credential.password_hash).await? {
        tracing::warn!("Login: senha incorreta para {}", email);
        return Err(AppError::InvalidCredentials);
    }
    find_user_by_email(store, &email).await?.ok_or_else(|| {
        tracing::error!("Credencial sem utilizador correspondente: {}", email);
        AppError::InvalidCredentials
    })
}

/// Utilizador da sessão atual. Falha com `Unauthorized` se não houver login.
pub async fn me(store: &SharedStore, session: &Session) -> AppResult<User> {
    let email = session
        .get::<String>(SESSION_USER_KEY)
        .await
        .map_err(|e| AppError::SessionError(format!("Erro ao ler sessão: {}", e)))?
        .ok_or(AppError::Unauthorized)?;
    find_user_by_email(store, &email).await?.ok_or_else(|| {
        tracing::warn!("Sessão aponta para utilizador inexistente: {}", email);
        AppError::Unauthorized
    })
}

/// Autentica a sessão (com novo ID) para o utilizador.
pub async fn start_session(session: &Session, user: &User) -> AppResult<()> {
    session
        .cycle_id()
        .await
        .map_err(|e| AppError::SessionError(format!("Falha ao rodar ID: {}", e)))?;
    session
        .insert(SESSION_USER_KEY, &user.email)
        .await
        .map_err(|e| AppError::SessionError(format!("Falha ao inserir na sessão: {}", e)))?;
    Ok(())
}

pub async fn logout(session: &Session) -> AppResult<()> {
    session
        .delete()
        .await
        .map_err(|e| AppError::SessionError(format!("Falha ao apagar sessão: {}", e)))
}

/// URL da página de login que devolve o utilizador a `return_to` depois de entrar.
pub fn login_url(return_to: &str) -> String {
    format!("/login?return_to={}", urlencoding::encode(&safe_return_to(Some(return_to))))
}

/// Só aceita caminhos locais ("/..."); qualquer outra coisa volta ao dashboard.
/// Controlos e espaços ficam de fora: o browser descarta tabs e quebras de
/// linha, e "/\t/evil" viraria "//evil".
pub fn safe_return_to(raw: Option<&str>) -> String {
    match raw.map(str::trim) {
        Some(path) if is_local_path(path) => path.to_string(),
        Some(path) => {
            tracing::warn!("return_to recusado: {:?}", path);
            "/".to_string()
        }
        None => "/".to_string(),
    }
}

fn is_local_path(path: &str) -> bool {
    path.starts_with('/')
        && !path.starts_with("//")
        && !path.chars().any(|c| c == '\\' || c.is_control() || c.is_whitespace())
        && path
            .parse::<Uri>()
            .is_ok_and(|uri| uri.scheme().is_none() && uri.authority().is_none())
}
