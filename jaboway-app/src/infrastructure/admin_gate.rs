use argon2::{
    password_hash::{PasswordHash, PasswordVerifier},
    Argon2,
};
use jaboway_errors::AppError;

/// Checks the admin password against a stored argon2 PHC string.
///
/// Without a configured hash, admin mode cannot be entered at all.
#[derive(Debug, Clone, Default)]
pub struct AdminGate {
    password_hash: Option<String>,
}

impl AdminGate {
    pub fn new(password_hash: Option<String>) -> Result<Self, AppError> {
        if let Some(hash) = &password_hash {
            PasswordHash::new(hash)
                .map_err(|e| AppError::Internal(format!("Hash password admin tidak valid: {e}")))?;
        }
        Ok(Self { password_hash })
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.password_hash.is_some()
    }

    pub fn verify(&self, password: &str) -> Result<(), AppError> {
        let Some(hash) = &self.password_hash else {
            return Err(AppError::Forbidden(
                "Mode admin tidak tersedia.".to_string(),
            ));
        };
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| AppError::Internal(format!("Hash password admin tidak valid: {e}")))?;
        match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(()),
            Err(argon2::password_hash::Error::Password) => {
                tracing::warn!("admin login rejected");
                Err(AppError::Forbidden("Password salah!".to_string()))
            }
            Err(e) => Err(AppError::Internal(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argon2::password_hash::{PasswordHasher, SaltString};

    fn hash(password: &str) -> String {
        let salt = SaltString::encode_b64(b"jaboway-admin-salt").unwrap();
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .unwrap()
            .to_string()
    }

    #[test]
    fn test_verify_password() {
        let gate = AdminGate::new(Some(hash("rahasia"))).unwrap();
        assert!(gate.is_enabled());
        assert!(gate.verify("rahasia").is_ok());
        assert!(matches!(gate.verify("salah"), Err(AppError::Forbidden(_))));
    }

    #[test]
    fn test_disabled_gate_refuses() {
        let gate = AdminGate::disabled();
        assert!(!gate.is_enabled());
        assert!(gate.verify("apa saja").is_err());
    }

    #[test]
    fn test_malformed_hash_is_rejected_up_front() {
        assert!(matches!(
            AdminGate::new(Some("bukan-hash".to_string())),
            Err(AppError::Internal(_))
        ));
    }
}
