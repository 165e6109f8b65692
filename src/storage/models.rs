use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A post as persisted in the post document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    /// Stable identifier. Nil for posts written before ids were assigned.
    #[serde(default)]
    pub id: Uuid,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    /// Stored attachment names, in upload order.
    #[serde(default)]
    pub files: Vec<String>,
    pub author: String,
    pub date: DateTime<Utc>,
}

impl Post {
    pub fn new(
        author: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
        files: Vec<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            content: content.into(),
            files,
            author: author.into(),
            date: Utc::now(),
        }
    }

    pub fn is_authored_by(&self, username: &str) -> bool {
        self.author == username
    }
}

/// Partial update for a post. Absent fields keep their current value.
///
/// Author and attachments are not patchable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

impl PostPatch {
    /// Overwrite the provided fields and refresh the post date.
    pub fn apply_to(&self, post: &mut Post) {
        if let Some(ref title) = self.title {
            post.title = title.clone();
        }
        if let Some(ref content) = self.content {
            post.content = content.clone();
        }
        post.date = Utc::now();
    }
}

/// A registered account as persisted in the user document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub username: String,
    #[serde(rename = "password")]
    pub password_verifier: String,
}
