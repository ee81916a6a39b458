//! Best-effort remote mirror.
//!
//! The remote backend is never authoritative. Local stores are the source of
//! truth; the mirror only receives copies (room layout, completion history)
//! and serves the social lookups (friend codes, friend lists, reactions).

mod outbox;
mod rest;

pub use outbox::{MirrorJob, MirrorOutbox};
pub use rest::RestMirror;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::error::MirrorError;
use crate::room::RoomSnapshot;

/// A registered user as the backend knows them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteProfile {
    pub id: String,
    pub nickname: String,
    #[serde(default)]
    pub friend_code: Option<String>,
}

/// What is sent when a task is completed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionRecord {
    pub title: String,
    pub emoji: String,
}

/// A completion as stored remotely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteCompletion {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub emoji: String,
    pub completed_at: DateTime<FixedOffset>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionCount {
    pub emoji: String,
    pub count: u32,
}

/// Remote relational backend.
#[async_trait]
pub trait RemoteMirror: Send + Sync {
    /// Insert or replace the user's room row.
    async fn upsert_room(&self, user_id: &str, room: &RoomSnapshot) -> Result<(), MirrorError>;

    /// Create a profile. A taken friend code yields [`MirrorError::Duplicate`].
    async fn register_profile(
        &self,
        nickname: &str,
        friend_code: &str,
    ) -> Result<RemoteProfile, MirrorError>;

    async fn find_profile_by_code(&self, code: &str)
        -> Result<Option<RemoteProfile>, MirrorError>;

    /// Link two users in both directions.
    async fn create_friendship(&self, user_id: &str, friend_id: &str) -> Result<(), MirrorError>;

    async fn list_friends(&self, user_id: &str) -> Result<Vec<RemoteProfile>, MirrorError>;

    async fn record_completed_task(
        &self,
        user_id: &str,
        record: &CompletionRecord,
    ) -> Result<(), MirrorError>;

    /// Completions of any of `user_ids` at or after `since`, newest first.
    async fn completed_tasks_since(
        &self,
        user_ids: &[String],
        since: DateTime<FixedOffset>,
    ) -> Result<Vec<RemoteCompletion>, MirrorError>;

    /// Reaction tallies on one completion, ordered by emoji.
    async fn reaction_counts(&self, task_id: &str) -> Result<Vec<ReactionCount>, MirrorError>;

    async fn add_reaction(
        &self,
        from_user_id: &str,
        task_id: &str,
        emoji: &str,
    ) -> Result<(), MirrorError>;
}
