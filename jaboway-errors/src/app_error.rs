use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum AppError {
    #[error("Validasi gagal: {0}")]
    Validation(String),

    #[error("Akun diblokir")]
    AccountBlocked,

    #[error("Harus login: {0}")]
    LoginRequired(String),

    #[error("Tidak diizinkan: {0}")]
    Forbidden(String),

    #[error("{0} tidak ditemukan")]
    NotFound(String),

    #[error("Permintaan ke server gagal: {0}")]
    Remote(String),

    #[error("Terjadi kesalahan internal: {0}")]
    Internal(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn user_message(&self) -> &str {
        match self {
            Self::Validation(msg) => msg,
            Self::AccountBlocked => "Akun Anda diblokir dan tidak dapat melakukan tindakan ini.",
            Self::LoginRequired(msg) => msg,
            Self::Forbidden(msg) => msg,
            Self::NotFound(_) => "Data sudah tidak ada. Silakan muat ulang halaman.",
            Self::Remote(_) => "Permintaan ke server gagal. Coba lagi.",
            Self::Internal(_) => "Ada masalah di server. Coba lagi nanti.",
        }
    }
}

#[cfg(feature = "server")]
mod server_impl {
    use super::AppError;
    use axum::http::StatusCode;
    use axum::response::{IntoResponse, Response};
    use axum::Json;

    #[derive(serde::Serialize)]
    struct ErrorResponse<'a> {
        message: &'a str,
    }

    impl AppError {
        pub fn status_code(&self) -> StatusCode {
            match self {
                AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
                AppError::AccountBlocked => StatusCode::FORBIDDEN,
                AppError::LoginRequired(_) => StatusCode::UNAUTHORIZED,
                AppError::Forbidden(_) => StatusCode::FORBIDDEN,
                AppError::NotFound(_) => StatusCode::NOT_FOUND,
                AppError::Remote(_) => StatusCode::BAD_GATEWAY,
                AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            }
        }
    }

    impl IntoResponse for AppError {
        fn into_response(self) -> Response {
            (
                self.status_code(),
                Json(ErrorResponse {
                    message: self.user_message(),
                }),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_is_shown_verbatim() {
        let err = AppError::validation("Komentar tidak boleh kosong.");
        assert_eq!(err.user_message(), "Komentar tidak boleh kosong.");
    }

    #[test]
    fn test_remote_message_hides_backend_detail() {
        let err = AppError::Remote("connection reset".to_string());
        assert_eq!(err.user_message(), "Permintaan ke server gagal. Coba lagi.");
        assert!(!err.user_message().contains("dibatalkan"));
        assert_eq!(err.to_string(), "Permintaan ke server gagal: connection reset");
    }
}
