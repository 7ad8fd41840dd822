// src/config.rs
use crate::error::{AppError, AppResult};
use std::{env, net::SocketAddr};

pub const DEFAULT_DATABASE_URL: &str = "sqlite://chamada.db";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_LOG_FILTER: &str = "chamada=debug,tower_http=info,sqlx=warn,tower_sessions=info";

// Tamanho mínimo exigido pelo Key do tower-cookies
const MIN_SECRET_LEN: usize = 64;

/// Configuração lida do ambiente (e do `.env`, se existir).
#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub session_secret: String,
    pub bind_addr: SocketAddr,
    pub session_secure: bool,
}

impl std::fmt::Debug for Config {
    // Nunca imprimir o segredo nos logs
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &self.database_url)
            .field("session_secret", &"<redacted>")
            .field("bind_addr", &self.bind_addr)
            .field("session_secure", &self.session_secure)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> AppResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Constrói a configuração a partir de uma função de lookup (facilita testes).
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.into());

        let session_secret = lookup("SESSION_SECRET")
            .ok_or_else(|| AppError::ConfigError("SESSION_SECRET não definida".into()))?;
        if session_secret.len() < MIN_SECRET_LEN {
            return Err(AppError::ConfigError(format!(
                "SESSION_SECRET precisa de pelo menos {} bytes (tem {})",
                MIN_SECRET_LEN,
                session_secret.len()
            )));
        }

        let bind_raw = lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.into());
        let bind_addr = bind_raw
            .parse::<SocketAddr>()
            .map_err(|e| AppError::ConfigError(format!("BIND_ADDR inválido '{}': {}", bind_raw, e)))?;

        let session_secure = match lookup("SESSION_SECURE").as_deref().map(str::trim) {
            None | Some("") => false,
            Some(v) if v.eq_ignore_ascii_case("true") || v == "1" => true,
            Some(v) if v.eq_ignore_ascii_case("false") || v == "0" => false,
            Some(other) => {
                return Err(AppError::ConfigError(format!("SESSION_SECURE inválido: {}", other)))
            }
        };

        Ok(Self {
            database_url,
            session_secret,
            bind_addr,
            session_secure,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_secret_is_set() {
        let secret = "s".repeat(64);
        let config = Config::from_lookup(lookup_from(&[("SESSION_SECRET", secret.as_str())])).unwrap();
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(config.bind_addr, DEFAULT_BIND_ADDR.parse().unwrap());
        assert!(!config.session_secure);
    }

    #[test]
    fn missing_or_short_secret_is_rejected() {
        assert!(matches!(
            Config::from_lookup(lookup_from(&[])),
            Err(AppError::ConfigError(_))
        ));
        assert!(matches!(
            Config::from_lookup(lookup_from(&[("SESSION_SECRET", "curto")])),
            Err(AppError::ConfigError(_))
        ));
    }

    #[test]
    fn bind_addr_and_secure_flag_are_parsed() {
        let secret = "x".repeat(80);
        let config = Config::from_lookup(lookup_from(&[
            ("SESSION_SECRET", secret.as_str()),
            ("BIND_ADDR", "127.0.0.1:8080"),
            ("SESSION_SECURE", "true"),
        ]))
        .unwrap();
        assert_eq!(config.bind_addr.port(), 8080);
        assert!(config.session_secure);

        let bad = Config::from_lookup(lookup_from(&[
            ("SESSION_SECRET", secret.as_str()),
            ("BIND_ADDR", "nope"),
        ]));
        assert!(bad.is_err());
    }

    #[test]
    fn debug_output_hides_secret() {
        let secret = "segredo".repeat(10);
        let config = Config::from_lookup(lookup_from(&[("SESSION_SECRET", secret.as_str())])).unwrap();
        assert!(!format!("{:?}", config).contains("segredo"));
    }
}
