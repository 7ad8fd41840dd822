// src/models/user.rs
use crate::store::{Entity, EntityKind};
use serde::{Deserialize, Serialize};

/// Professor autenticado. Só leitura para o resto da aplicação.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub full_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewUser {
    pub email: String,
    pub full_name: String,
}

impl Entity for User {
    const KIND: EntityKind = EntityKind::User;
    type Draft = NewUser;
}

// Hash bcrypt associado a um email. Nunca vai para os templates.
#[derive(Clone, Deserialize)]
pub struct Credential {
    pub id: String,
    pub email: String,
    pub password_hash: String,
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("id", &self.id)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Serialize)]
pub struct NewCredential {
    pub email: String,
    pub password_hash: String,
}

impl Entity for Credential {
    const KIND: EntityKind = EntityKind::Credential;
    type Draft = NewCredential;
}

// Struct para dados do formulário de login
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub return_to: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub email: String,
    pub full_name: String,
    pub password: String,
}
