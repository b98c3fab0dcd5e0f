//! Row shapes of the data backend and their mapping into domain values.
//!
//! This is the only place that knows column names, renames (`content` is a
//! post's `text`) and defaults (missing arrays are empty). Services never
//! touch raw rows.

use super::RemoteError;
use crate::domain::{
    ActorContext, ActorId, City, Difficulty, Guide, GuideCategory, GuideStatus, Post, PostAuthor,
    Profile, ReportLedger, Thread, ThreadCategory, VoteLedger, VoteType, ADMIN_DISPLAY_NAME,
};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use uuid::Uuid;

const ANONYMOUS_AUTHOR: &str = "Anonim";

pub type ProfileMap = HashMap<Uuid, Profile>;

#[derive(Debug, Deserialize)]
struct ProfileRow {
    id: Uuid,
    display_name: Option<String>,
    is_blocked: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct GuideRow {
    id: Uuid,
    title: String,
    author: Option<String>,
    profile_id: Option<Uuid>,
    cities: Option<Vec<City>>,
    category: Option<GuideCategory>,
    difficulty: Option<Difficulty>,
    duration: Option<String>,
    cost: Option<String>,
    steps: Option<Vec<String>>,
    tips: Option<Vec<String>>,
    status: Option<GuideStatus>,
    views: Option<i64>,
    is_user_contribution: Option<bool>,
    created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct ThreadRow {
    id: Uuid,
    title: String,
    category: Option<ThreadCategory>,
    views: Option<i64>,
    green_votes: Option<Vec<String>>,
    yellow_votes: Option<Vec<String>>,
    red_votes: Option<Vec<String>>,
    reports: Option<Vec<String>>,
    created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct PostRow {
    id: Uuid,
    thread_id: Uuid,
    profile_id: Option<Uuid>,
    content: Option<String>,
    author: Option<String>,
    reports: Option<Vec<String>>,
    created_at: Option<DateTime<Utc>>,
}

fn decode<T: DeserializeOwned>(kind: &str, row: Value) -> Result<T, RemoteError> {
    serde_json::from_value(row)
        .map_err(|e| RemoteError::new(format!("baris {kind} tidak valid: {e}")))
}

fn count(value: Option<i64>) -> u64 {
    value.unwrap_or(0).max(0) as u64
}

fn ledger(actors: Option<Vec<String>>) -> ReportLedger {
    ReportLedger::from_actors(actors.unwrap_or_default().into_iter().map(ActorId::new))
}

pub fn profile_from_row(row: Value) -> Result<Profile, RemoteError> {
    let row: ProfileRow = decode("profil", row)?;
    Ok(Profile {
        id: row.id,
        display_name: row.display_name.unwrap_or_else(|| "User".to_string()),
        is_blocked: row.is_blocked.unwrap_or(false),
    })
}

pub fn profile_map(rows: Vec<Value>) -> Result<ProfileMap, RemoteError> {
    rows.into_iter()
        .map(|row| profile_from_row(row).map(|p| (p.id, p)))
        .collect()
}

pub fn guide_from_row(row: Value, profiles: &ProfileMap) -> Result<Guide, RemoteError> {
    let row: GuideRow = decode("panduan", row)?;
    let is_user_contribution = row.is_user_contribution.unwrap_or(true);
    let author = if is_user_contribution {
        row.profile_id
            .and_then(|id| profiles.get(&id))
            .map(|p| p.display_name.clone())
            .or(row.author)
            .unwrap_or_else(|| ANONYMOUS_AUTHOR.to_string())
    } else {
        ADMIN_DISPLAY_NAME.to_string()
    };
    Ok(Guide {
        id: row.id,
        title: row.title,
        author,
        profile_id: row.profile_id,
        cities: row.cities.unwrap_or_default(),
        category: row.category.unwrap_or(GuideCategory::Umum),
        difficulty: row.difficulty.unwrap_or(Difficulty::Pemula),
        duration: row.duration.unwrap_or_else(|| "—".to_string()),
        cost: row.cost.unwrap_or_else(|| "—".to_string()),
        steps: row.steps.unwrap_or_default(),
        tips: row.tips.unwrap_or_default(),
        status: row.status.unwrap_or(GuideStatus::Pending),
        views: count(row.views),
        is_user_contribution,
        created_at: row.created_at,
    })
}

pub fn post_from_row(row: Value, profiles: &ProfileMap) -> Result<Post, RemoteError> {
    let row: PostRow = decode("post", row)?;
    let author = match row.profile_id.and_then(|id| profiles.get(&id)) {
        Some(profile) => PostAuthor {
            id: Some(profile.id),
            display_name: profile.display_name.clone(),
            is_blocked: profile.is_blocked,
        },
        None => PostAuthor {
            id: row.profile_id,
            display_name: row.author.unwrap_or_else(|| ANONYMOUS_AUTHOR.to_string()),
            is_blocked: false,
        },
    };
    Ok(Post {
        id: row.id,
        thread_id: row.thread_id,
        author,
        text: row.content.unwrap_or_default(),
        reports: ledger(row.reports),
        created_at: row.created_at,
    })
}

/// Later arrays win when corrupt data lists an actor under more than one color.
fn vote_ledger(green: Option<Vec<String>>, yellow: Option<Vec<String>>, red: Option<Vec<String>>) -> VoteLedger {
    let mut votes = VoteLedger::default();
    for (vote, actors) in [(VoteType::Green, green), (VoteType::Yellow, yellow), (VoteType::Red, red)] {
        for actor in actors.unwrap_or_default() {
            votes.set(ActorId::new(actor), vote);
        }
    }
    votes
}

pub fn thread_from_row(row: Value, posts: Vec<Post>) -> Result<Thread, RemoteError> {
    let row: ThreadRow = decode("thread", row)?;
    Ok(Thread {
        id: row.id,
        title: row.title,
        category: row.category.unwrap_or_default(),
        posts,
        views: count(row.views),
        votes: vote_ledger(row.green_votes, row.yellow_votes, row.red_votes),
        reports: ledger(row.reports),
        created_at: row.created_at,
    })
}

/// Joins post rows (already in creation order) onto their threads.
pub fn assemble_threads(
    thread_rows: Vec<Value>,
    post_rows: Vec<Value>,
    profiles: &ProfileMap,
) -> Result<Vec<Thread>, RemoteError> {
    let mut posts_by_thread: HashMap<Uuid, Vec<Post>> = HashMap::new();
    for row in post_rows {
        let post = post_from_row(row, profiles)?;
        posts_by_thread.entry(post.thread_id).or_default().push(post);
    }
    thread_rows
        .into_iter()
        .map(|row| {
            let id = row
                .get("id")
                .and_then(Value::as_str)
                .and_then(|id| Uuid::parse_str(id).ok());
            let posts = id
                .and_then(|id| posts_by_thread.remove(&id))
                .unwrap_or_default();
            thread_from_row(row, posts)
        })
        .collect()
}

pub fn reports_column(reports: &ReportLedger) -> Value {
    json!({ "reports": reports.actors() })
}

pub fn new_thread_row(title: &str, category: ThreadCategory) -> Value {
    json!({ "title": title, "category": category })
}

pub fn new_post_row(thread_id: Uuid, actor: &ActorContext, text: &str) -> Value {
    json!({
        "thread_id": thread_id,
        "profile_id": actor.account_id(),
        "content": text,
        "author": actor.display_name(),
    })
}

pub fn new_profile_row(id: Uuid, display_name: &str) -> Value {
    json!({ "id": id, "display_name": display_name })
}
