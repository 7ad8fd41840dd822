// src/web/flash.rs
use crate::error::AppError;
use tower_cookies::{Cookie, Cookies, Key};

pub const FLASH_COOKIE: &str = "chamada_flash";

/// Mensagem de uma só leitura mostrada na próxima página.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flash {
    pub is_error: bool,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            is_error: false,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            is_error: true,
            message: message.into(),
        }
    }

    /// Alerta para uma mutação falhada: mensagens de validação passam tal como
    /// estão, o resto fica com a mensagem genérica.
    pub fn from_error(err: &AppError, fallback: &str) -> Self {
        match err {
            AppError::Validation(msg) => Self::error(msg.clone()),
            AppError::SessionAlreadyRecorded(_) | AppError::NothingToExport => {
                Self::error(err.user_message())
            }
            _ => Self::error(fallback),
        }
    }

    // "e:<mensagem>" ou "s:<mensagem>". A mensagem vai em percent-encoding com
    // '*' no lugar de '%': o tower-cookies escreve o valor tal como está mas
    // faz percent-decode ao ler, e a assinatura tem de ver o mesmo texto nos dois lados.
    fn encode(&self) -> String {
        let tag = if self.is_error { "e" } else { "s" };
        format!("{}:{}", tag, urlencoding::encode(&self.message).replace('%', "*"))
    }

    fn decode(raw: &str) -> Option<Self> {
        let (tag, encoded) = raw.split_once(':')?;
        let message = urlencoding::decode(&encoded.replace('*', "%")).ok()?.into_owned();
        match tag {
            "e" => Some(Self::error(message)),
            "s" => Some(Self::success(message)),
            _ => None,
        }
    }
}

fn flash_cookie(value: String) -> Cookie<'static> {
    let mut cookie = Cookie::new(FLASH_COOKIE, value);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie
}

pub fn set_flash(cookies: &Cookies, key: &Key, flash: Flash) {
    tracing::debug!("Flash definido: {:?}", flash);
    cookies.signed(key).add(flash_cookie(flash.encode()));
}

/// Lê e apaga o flash pendente. Cookies adulterados são descartados.
pub fn take_flash(cookies: &Cookies, key: &Key) -> Option<Flash> {
    let signed = cookies.signed(key);
    let cookie = signed.get(FLASH_COOKIE)?;
    signed.remove(flash_cookie(String::new()));
    let flash = Flash::decode(cookie.value());
    if flash.is_none() {
        tracing::warn!("Cookie flash com formato inválido ignorado");
    }
    flash
}
