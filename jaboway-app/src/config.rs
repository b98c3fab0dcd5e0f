use jaboway_errors::AppError;
use std::net::SocketAddr;

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    Supabase { url: String, api_key: String },
    Memory,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub backend: Backend,
    pub admin_password_hash: Option<String>,
    pub bind_addr: SocketAddr,
    /// Marks the session cookie `Secure`; on when served behind TLS.
    pub secure_cookies: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let required = |key: &str| {
            var(key).ok_or_else(|| AppError::Internal(format!("{key} must be set")))
        };

        let backend = match var("JABOWAY_BACKEND").as_deref() {
            None | Some("supabase") => Backend::Supabase {
                url: required("SUPABASE_URL")?,
                api_key: required("SUPABASE_KEY")?,
            },
            Some("memory") => Backend::Memory,
            Some(other) => {
                return Err(AppError::Internal(format!(
                    "JABOWAY_BACKEND tidak dikenal: {other}"
                )))
            }
        };

        let bind_addr = var("JABOWAY_BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| AppError::Internal(format!("JABOWAY_BIND_ADDR tidak valid: {e}")))?;

        let secure_cookies = match var("JABOWAY_SECURE_COOKIES").as_deref() {
            None | Some("false") | Some("0") => false,
            Some("true") | Some("1") => true,
            Some(other) => {
                return Err(AppError::Internal(format!(
                    "JABOWAY_SECURE_COOKIES tidak valid: {other}"
                )))
            }
        };

        Ok(Self {
            backend,
            admin_password_hash: var("JABOWAY_ADMIN_PASSWORD_HASH"),
            bind_addr,
            secure_cookies,
        })
    }
}
