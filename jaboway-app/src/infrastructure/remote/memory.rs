use super::{AuthProvider, Order, Procedure, Query, RemoteError, RemoteStore, Table, NO_ROWS_CODE};
use crate::domain::{AuthUser, VoteType};
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use dashmap::{DashMap, DashSet};
use serde_json::{json, Map, Value};
use std::cmp::Ordering;
use uuid::Uuid;

const INJECTED_FAILURE_CODE: &str = "XX000";
const RAISED_EXCEPTION_CODE: &str = "P0001";

/// A call on the in-memory store that should fail until recovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailOn {
    Select(Table),
    Insert(Table),
    Update(Table),
    Rpc(Procedure),
}

/// Process-local stand-in for the hosted backend.
///
/// Rows keep insertion order. The named procedures apply the same rules
/// the hosted database functions do, including the last-post guard.
#[derive(Default)]
pub struct MemoryStore {
    tables: DashMap<Table, Vec<Value>>,
    failures: DashSet<FailOn>,
    users: DashMap<Uuid, AuthUser>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail(&self, call: FailOn) {
        self.failures.insert(call);
    }

    pub fn recover(&self, call: FailOn) {
        self.failures.remove(&call);
    }

    pub fn register_user(&self, user: AuthUser) {
        self.users.insert(user.id, user);
    }

    /// Raw rows of a table, for inspection.
    pub fn rows(&self, table: Table) -> Vec<Value> {
        self.tables
            .get(&table)
            .map(|rows| rows.clone())
            .unwrap_or_default()
    }

    fn check(&self, call: FailOn) -> Result<(), RemoteError> {
        if self.failures.contains(&call) {
            tracing::debug!(?call, "injected remote failure");
            return Err(RemoteError::with_code(
                INJECTED_FAILURE_CODE,
                "koneksi ke server terputus",
            ));
        }
        Ok(())
    }

    fn modify_row<F>(&self, table: Table, id: &str, apply: F) -> Result<Value, RemoteError>
    where
        F: FnOnce(&mut Map<String, Value>),
    {
        let mut rows = self.tables.entry(table).or_default();
        let row = rows
            .iter_mut()
            .find(|row| has_id(row, id))
            .ok_or_else(|| no_rows(table))?;
        if let Value::Object(fields) = row {
            apply(fields);
        }
        Ok(row.clone())
    }

    fn remove_rows<F>(&self, table: Table, matches: F) -> usize
    where
        F: Fn(&Value) -> bool,
    {
        let mut rows = self.tables.entry(table).or_default();
        let before = rows.len();
        rows.retain(|row| !matches(row));
        before - rows.len()
    }

    fn edit_guide(&self, args: &Value) -> Result<Value, RemoteError> {
        let id = arg_str(args, "guide_id_in")?;
        let patch = args
            .get("update_data")
            .and_then(Value::as_object)
            .cloned()
            .ok_or_else(|| missing_arg("update_data"))?;
        self.modify_row(Table::Guides, id, |fields| {
            for (key, value) in patch {
                if key != "id" {
                    fields.insert(key, value);
                }
            }
        })
    }

    fn delete_guide(&self, args: &Value) -> Result<Value, RemoteError> {
        let id = arg_str(args, "guide_id_in")?;
        if self.remove_rows(Table::Guides, |row| has_id(row, id)) == 0 {
            return Err(no_rows(Table::Guides));
        }
        Ok(Value::Null)
    }

    fn edit_post(&self, args: &Value) -> Result<Value, RemoteError> {
        let id = arg_str(args, "post_id_in")?;
        let content = arg_str(args, "new_content_in")?.to_string();
        self.modify_row(Table::Posts, id, |fields| {
            fields.insert("content".to_string(), Value::String(content));
        })
    }

    fn delete_post(&self, args: &Value) -> Result<Value, RemoteError> {
        let id = arg_str(args, "post_id_in")?;
        let posts = self.rows(Table::Posts);
        let thread_id = posts
            .iter()
            .find(|row| has_id(row, id))
            .and_then(|row| row.get("thread_id").cloned())
            .ok_or_else(|| no_rows(Table::Posts))?;
        // Rows are kept in insertion order, so the first sibling opened the thread.
        let siblings: Vec<&Value> = posts
            .iter()
            .filter(|row| row.get("thread_id") == Some(&thread_id))
            .collect();
        if siblings.len() <= 1 {
            return Err(RemoteError::with_code(
                RAISED_EXCEPTION_CODE,
                "thread harus memiliki setidaknya satu post",
            ));
        }
        if siblings.first().is_some_and(|row| has_id(row, id)) {
            return Err(RemoteError::with_code(
                RAISED_EXCEPTION_CODE,
                "post pembuka tidak dapat dihapus",
            ));
        }
        self.remove_rows(Table::Posts, |row| has_id(row, id));
        Ok(Value::Null)
    }

    fn delete_thread(&self, args: &Value) -> Result<Value, RemoteError> {
        let id = arg_str(args, "thread_id_in")?;
        if self.remove_rows(Table::Threads, |row| has_id(row, id)) == 0 {
            return Err(no_rows(Table::Threads));
        }
        let removed = self.remove_rows(Table::Posts, |row| {
            row.get("thread_id").and_then(Value::as_str) == Some(id)
        });
        tracing::debug!(thread_id = id, posts = removed, "thread removed");
        Ok(Value::Null)
    }

    fn thread_vote(&self, args: &Value) -> Result<Value, RemoteError> {
        let id = arg_str(args, "thread_id_in")?;
        let voter = arg_str(args, "voter_id_in")?.to_string();
        let vote: VoteType = serde_json::from_value(
            args.get("vote_type_in")
                .cloned()
                .ok_or_else(|| missing_arg("vote_type_in"))?,
        )
        .map_err(|e| RemoteError::with_code(RAISED_EXCEPTION_CODE, e.to_string()))?;

        self.modify_row(Table::Threads, id, |fields| {
            let column = format!("{}_votes", vote.as_str());
            let already = fields
                .get(&column)
                .and_then(Value::as_array)
                .is_some_and(|voters| voters.iter().any(|v| v.as_str() == Some(voter.as_str())));
            for other in VoteType::ALL {
                let entry = fields
                    .entry(format!("{}_votes", other.as_str()))
                    .or_insert_with(|| json!([]));
                if !entry.is_array() {
                    *entry = json!([]);
                }
                if let Some(voters) = entry.as_array_mut() {
                    voters.retain(|v| v.as_str() != Some(voter.as_str()));
                }
            }
            if !already {
                if let Some(Value::Array(voters)) = fields.get_mut(&column) {
                    voters.push(Value::String(voter));
                }
            }
        })
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn select(&self, table: Table, query: Query) -> Result<Vec<Value>, RemoteError> {
        self.check(FailOn::Select(table))?;
        let mut rows: Vec<Value> = self
            .rows(table)
            .into_iter()
            .filter(|row| {
                query
                    .eq
                    .iter()
                    .all(|(column, expected)| column_text(row, column).as_deref() == Some(expected.as_str()))
            })
            .collect();
        match query.order {
            Some(Order::Ascending(column)) => rows.sort_by(|a, b| compare_column(a, b, column)),
            Some(Order::Descending(column)) => rows.sort_by(|a, b| compare_column(b, a, column)),
            None => {}
        }
        Ok(rows)
    }

    async fn insert(&self, table: Table, row: Value) -> Result<Value, RemoteError> {
        self.check(FailOn::Insert(table))?;
        let Value::Object(mut fields) = row else {
            return Err(RemoteError::with_code("PGRST102", "baris harus berupa objek"));
        };
        fields
            .entry("id")
            .or_insert_with(|| Value::String(Uuid::new_v4().to_string()));
        fields.entry("created_at").or_insert_with(|| {
            Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true))
        });
        let row = Value::Object(fields);
        if let Some(id) = row.get("id").and_then(Value::as_str) {
            if self.rows(table).iter().any(|existing| has_id(existing, id)) {
                return Err(RemoteError::with_code("23505", "duplicate key value"));
            }
        }
        self.tables.entry(table).or_default().push(row.clone());
        Ok(row)
    }

    async fn update(&self, table: Table, id: &str, patch: Value) -> Result<Value, RemoteError> {
        self.check(FailOn::Update(table))?;
        let Value::Object(patch) = patch else {
            return Err(RemoteError::with_code("PGRST102", "patch harus berupa objek"));
        };
        self.modify_row(table, id, |fields| {
            for (key, value) in patch {
                fields.insert(key, value);
            }
        })
    }

    async fn rpc(&self, procedure: Procedure, args: Value) -> Result<Value, RemoteError> {
        self.check(FailOn::Rpc(procedure))?;
        match procedure {
            Procedure::EditGuide => self.edit_guide(&args),
            Procedure::DeleteGuide => self.delete_guide(&args),
            Procedure::EditPost => self.edit_post(&args),
            Procedure::DeletePost => self.delete_post(&args),
            Procedure::DeleteThread => self.delete_thread(&args),
            Procedure::ThreadVote => self.thread_vote(&args),
        }
    }
}

#[async_trait]
impl AuthProvider for MemoryStore {
    /// Development auth: the token is the account id itself.
    async fn user_for_token(&self, access_token: &str) -> Result<Option<AuthUser>, RemoteError> {
        let Ok(id) = Uuid::parse_str(access_token.trim()) else {
            return Ok(None);
        };
        Ok(Some(self.users.get(&id).map(|u| u.clone()).unwrap_or(AuthUser {
            id,
            email: None,
            full_name: None,
        })))
    }
}

fn has_id(row: &Value, id: &str) -> bool {
    row.get("id").and_then(Value::as_str) == Some(id)
}

fn column_text(row: &Value, column: &str) -> Option<String> {
    match row.get(column)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn compare_column(a: &Value, b: &Value, column: &str) -> Ordering {
    match (a.get(column), b.get(column)) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        _ => column_text(a, column).cmp(&column_text(b, column)),
    }
}

fn arg_str<'a>(args: &'a Value, name: &str) -> Result<&'a str, RemoteError> {
    args.get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| missing_arg(name))
}

fn missing_arg(name: &str) -> RemoteError {
    RemoteError::with_code("PGRST202", format!("argumen {name} tidak ada"))
}

fn no_rows(table: Table) -> RemoteError {
    RemoteError::with_code(
        NO_ROWS_CODE,
        format!("tidak ada baris {} yang cocok", table.as_str()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn thread_with_posts(store: &MemoryStore, posts: usize) -> (String, Vec<String>) {
        let thread = store
            .insert(Table::Threads, json!({ "title": "Macet di Cawang" }))
            .await
            .unwrap();
        let thread_id = thread["id"].as_str().unwrap().to_string();
        let mut post_ids = Vec::new();
        for i in 0..posts {
            let post = store
                .insert(
                    Table::Posts,
                    json!({ "thread_id": thread_id, "content": format!("post {i}") }),
                )
                .await
                .unwrap();
            post_ids.push(post["id"].as_str().unwrap().to_string());
        }
        (thread_id, post_ids)
    }

    #[tokio::test]
    async fn test_insert_assigns_id_and_timestamp() {
        let store = MemoryStore::new();
        let row = store
            .insert(Table::Threads, json!({ "title": "Halo" }))
            .await
            .unwrap();
        assert!(Uuid::parse_str(row["id"].as_str().unwrap()).is_ok());
        assert!(row["created_at"].is_string());
        assert_eq!(store.rows(Table::Threads).len(), 1);
    }

    #[tokio::test]
    async fn test_select_filters_and_orders() {
        let store = MemoryStore::new();
        let (thread_id, post_ids) = thread_with_posts(&store, 3).await;
        thread_with_posts(&store, 1).await;

        let rows = store
            .select(
                Table::Posts,
                Query::all()
                    .eq("thread_id", &thread_id)
                    .order(Order::Ascending("created_at")),
            )
            .await
            .unwrap();
        let ids: Vec<&str> = rows.iter().filter_map(|r| r["id"].as_str()).collect();
        assert_eq!(ids, post_ids.iter().map(String::as_str).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_vote_procedure_toggles_and_switches() {
        let store = MemoryStore::new();
        let (thread_id, _) = thread_with_posts(&store, 1).await;
        let vote = |kind: &str| {
            json!({ "thread_id_in": thread_id, "vote_type_in": kind, "voter_id_in": "guest_1_1" })
        };

        let row = store.rpc(Procedure::ThreadVote, vote("green")).await.unwrap();
        assert_eq!(row["green_votes"], json!(["guest_1_1"]));
        let row = store.rpc(Procedure::ThreadVote, vote("red")).await.unwrap();
        assert_eq!(row["green_votes"], json!([]));
        assert_eq!(row["red_votes"], json!(["guest_1_1"]));
        let row = store.rpc(Procedure::ThreadVote, vote("red")).await.unwrap();
        assert_eq!(row["red_votes"], json!([]));
    }

    #[tokio::test]
    async fn test_delete_post_keeps_opening_post() {
        let store = MemoryStore::new();
        let (_, post_ids) = thread_with_posts(&store, 3).await;
        let err = store
            .rpc(Procedure::DeletePost, json!({ "post_id_in": post_ids[0] }))
            .await
            .unwrap_err();
        assert_eq!(err.code.as_deref(), Some(RAISED_EXCEPTION_CODE));
        store
            .rpc(Procedure::DeletePost, json!({ "post_id_in": post_ids[2] }))
            .await
            .unwrap();
        assert_eq!(store.rows(Table::Posts).len(), 2);
    }

    #[tokio::test]
    async fn test_delete_post_keeps_last_post() {
        let store = MemoryStore::new();
        let (_, post_ids) = thread_with_posts(&store, 2).await;
        store
            .rpc(Procedure::DeletePost, json!({ "post_id_in": post_ids[1] }))
            .await
            .unwrap();
        let err = store
            .rpc(Procedure::DeletePost, json!({ "post_id_in": post_ids[0] }))
            .await
            .unwrap_err();
        assert_eq!(err.code.as_deref(), Some(RAISED_EXCEPTION_CODE));
        assert_eq!(store.rows(Table::Posts).len(), 1);
    }

    #[tokio::test]
    async fn test_delete_thread_removes_its_posts() {
        let store = MemoryStore::new();
        let (thread_id, _) = thread_with_posts(&store, 3).await;
        let (_, other_posts) = thread_with_posts(&store, 1).await;
        store
            .rpc(Procedure::DeleteThread, json!({ "thread_id_in": thread_id }))
            .await
            .unwrap();
        let remaining: Vec<Value> = store.rows(Table::Posts);
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0]["id"].as_str(), Some(other_posts[0].as_str()));
    }

    #[tokio::test]
    async fn test_missing_row_reports_no_rows() {
        let store = MemoryStore::new();
        let err = store
            .update(Table::Guides, &Uuid::new_v4().to_string(), json!({ "views": 1 }))
            .await
            .unwrap_err();
        assert!(err.is_no_rows());
    }

    #[tokio::test]
    async fn test_injected_failure_until_recovered() {
        let store = MemoryStore::new();
        store.fail(FailOn::Insert(Table::Guides));
        assert!(store.insert(Table::Guides, json!({ "title": "x" })).await.is_err());
        assert!(store.rows(Table::Guides).is_empty());
        store.recover(FailOn::Insert(Table::Guides));
        assert!(store.insert(Table::Guides, json!({ "title": "x" })).await.is_ok());
    }

    #[tokio::test]
    async fn test_token_is_account_id() {
        let store = MemoryStore::new();
        let id = Uuid::new_v4();
        store.register_user(AuthUser {
            id,
            email: Some("budi@example.com".to_string()),
            full_name: None,
        });
        let user = store.user_for_token(&id.to_string()).await.unwrap().unwrap();
        assert_eq!(user.email.as_deref(), Some("budi@example.com"));
        assert!(store.user_for_token("bukan-token").await.unwrap().is_none());
    }
}
