//! Boundary to the hosted data backend.
//!
//! Everything the client knows is mirrored from here. Compound or
//! authorization-sensitive writes go through named procedures; plain
//! inserts and field updates hit tables directly.

mod memory;
pub mod rows;
#[cfg(feature = "supabase")]
mod supabase;

pub use memory::{FailOn, MemoryStore};
#[cfg(feature = "supabase")]
pub use supabase::{SupabaseAuth, SupabaseStore};

use crate::domain::AuthUser;
use async_trait::async_trait;
use jaboway_errors::AppError;
use serde_json::Value;

/// PostgREST code for "zero rows where exactly one was expected".
pub const NO_ROWS_CODE: &str = "PGRST116";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Guides,
    Threads,
    Posts,
    Profiles,
}

impl Table {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Guides => "guides",
            Self::Threads => "threads",
            Self::Posts => "posts",
            Self::Profiles => "profiles",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Procedure {
    EditGuide,
    DeleteGuide,
    EditPost,
    DeletePost,
    DeleteThread,
    ThreadVote,
}

impl Procedure {
    pub fn name(self) -> &'static str {
        match self {
            Self::EditGuide => "handle_edit_guide",
            Self::DeleteGuide => "handle_delete_guide",
            Self::EditPost => "handle_edit_post",
            Self::DeletePost => "handle_delete_post",
            Self::DeleteThread => "handle_delete_thread",
            Self::ThreadVote => "handle_thread_vote",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Ascending(&'static str),
    Descending(&'static str),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub eq: Vec<(&'static str, String)>,
    pub order: Option<Order>,
}

impl Query {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn eq(mut self, column: &'static str, value: impl ToString) -> Self {
        self.eq.push((column, value.to_string()));
        self
    }

    pub fn order(mut self, order: Order) -> Self {
        self.order = Some(order);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}{}", .code.as_ref().map(|c| format!(" ({c})")).unwrap_or_default())]
pub struct RemoteError {
    pub code: Option<String>,
    pub message: String,
}

impl RemoteError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    pub fn with_code(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            message: message.into(),
        }
    }

    pub fn is_no_rows(&self) -> bool {
        self.code.as_deref() == Some(NO_ROWS_CODE)
    }
}

impl From<RemoteError> for AppError {
    fn from(err: RemoteError) -> Self {
        if err.is_no_rows() {
            AppError::NotFound("Data".to_string())
        } else {
            AppError::Remote(err.to_string())
        }
    }
}

#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn select(&self, table: Table, query: Query) -> Result<Vec<Value>, RemoteError>;

    /// Inserts one row and returns it as stored (with generated id and timestamps).
    async fn insert(&self, table: Table, row: Value) -> Result<Value, RemoteError>;

    async fn update(&self, table: Table, id: &str, patch: Value) -> Result<Value, RemoteError>;

    async fn rpc(&self, procedure: Procedure, args: Value) -> Result<Value, RemoteError>;
}

/// Resolves an access token issued by the authentication subsystem.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn user_for_token(&self, access_token: &str) -> Result<Option<AuthUser>, RemoteError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_rows_maps_to_not_found() {
        let err: AppError = RemoteError::with_code(NO_ROWS_CODE, "no rows").into();
        assert!(matches!(err, AppError::NotFound(_)));
        let err: AppError = RemoteError::with_code("42501", "permission denied").into();
        assert_eq!(
            err,
            AppError::Remote("permission denied (42501)".to_string())
        );
    }

    #[test]
    fn test_procedure_names() {
        assert_eq!(Procedure::ThreadVote.name(), "handle_thread_vote");
        assert_eq!(Procedure::DeletePost.name(), "handle_delete_post");
        assert_eq!(Table::Profiles.as_str(), "profiles");
    }
}
