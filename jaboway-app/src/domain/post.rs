use super::thread::ReportLedger;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostAuthor {
    /// `None` for legacy rows written without an account.
    pub id: Option<uuid::Uuid>,
    pub display_name: String,
    #[serde(default)]
    pub is_blocked: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: uuid::Uuid,
    pub thread_id: uuid::Uuid,
    pub author: PostAuthor,
    pub text: String,
    pub reports: ReportLedger,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl Post {
    pub fn has_account_author(&self) -> bool {
        self.author.id.is_some()
    }
}

/// Text of a new post or an edit.
pub fn validate_post_text(text: &str) -> Result<String, jaboway_errors::AppError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(jaboway_errors::AppError::validation(
            "Komentar tidak boleh kosong.",
        ));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_text_is_trimmed() {
        assert_eq!(validate_post_text("  halo  ").unwrap(), "halo");
        assert!(validate_post_text(" \n\t ").is_err());
    }
}
