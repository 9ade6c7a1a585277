//! Ephemeral stories. Persistence sits behind [`StoryStore`] so the upload
//! path never depends on it.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

pub const DEFAULT_STORY_TTL_HOURS: i64 = 24;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    pub id: Uuid,
    pub user_id: String,
    pub media_url: String,
    pub caption: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub viewers: Vec<String>,
}

impl Story {
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStory {
    pub user_id: String,
    pub media_url: String,
    #[serde(default)]
    pub caption: Option<String>,
}

#[async_trait]
pub trait StoryStore: Send + Sync {
    /// Active stories, newest first.
    async fn list(&self, now: DateTime<Utc>) -> Vec<Story>;
    async fn create(&self, story: NewStory, now: DateTime<Utc>) -> Story;
    /// `None` when missing or expired.
    async fn get(&self, id: Uuid, now: DateTime<Utc>) -> Option<Story>;
    async fn delete(&self, id: Uuid) -> bool;
    /// Adds `viewer` once. `None` when the story is missing or expired.
    async fn record_view(&self, id: Uuid, viewer: &str, now: DateTime<Utc>) -> Option<Story>;
    /// Drops expired stories and returns how many were removed.
    async fn purge_expired(&self, now: DateTime<Utc>) -> usize;
}

/// Process-local store; contents are lost on restart.
#[derive(Debug)]
pub struct InMemoryStoryStore {
    ttl: Duration,
    stories: RwLock<HashMap<Uuid, Story>>,
}

impl Default for InMemoryStoryStore {
    fn default() -> Self {
        Self::new(Duration::hours(DEFAULT_STORY_TTL_HOURS))
    }
}

impl InMemoryStoryStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            stories: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl StoryStore for InMemoryStoryStore {
    async fn list(&self, now: DateTime<Utc>) -> Vec<Story> {
        let stories = self.stories.read().await;
        let mut active: Vec<Story> = stories
            .values()
            .filter(|story| story.is_active(now))
            .cloned()
            .collect();
        active.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        active
    }

    async fn create(&self, story: NewStory, now: DateTime<Utc>) -> Story {
        let story = Story {
            id: Uuid::new_v4(),
            user_id: story.user_id,
            media_url: story.media_url,
            caption: story.caption.filter(|caption| !caption.trim().is_empty()),
            created_at: now,
            expires_at: now
                .checked_add_signed(self.ttl)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
            viewers: Vec::new(),
        };
        self.stories.write().await.insert(story.id, story.clone());
        story
    }

    async fn get(&self, id: Uuid, now: DateTime<Utc>) -> Option<Story> {
        let stories = self.stories.read().await;
        stories.get(&id).filter(|story| story.is_active(now)).cloned()
    }

    async fn delete(&self, id: Uuid) -> bool {
        self.stories.write().await.remove(&id).is_some()
    }

    async fn record_view(&self, id: Uuid, viewer: &str, now: DateTime<Utc>) -> Option<Story> {
        let mut stories = self.stories.write().await;
        let story = stories.get_mut(&id).filter(|story| story.is_active(now))?;
        if !story.viewers.iter().any(|existing| existing == viewer) {
            story.viewers.push(viewer.to_string());
        }
        Some(story.clone())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let mut stories = self.stories.write().await;
        let before = stories.len();
        stories.retain(|_, story| story.is_active(now));
        before - stories.len()
    }
}
