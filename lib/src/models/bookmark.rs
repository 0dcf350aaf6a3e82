use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A bookmark row as the store returns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    pub id: String,
    pub user_id: String,
    pub url: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

impl Bookmark {
    pub fn new(
        id: impl Into<String>,
        user_id: impl Into<String>,
        url: impl Into<String>,
        title: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            user_id: user_id.into(),
            url: url.into(),
            title: title.into(),
            created_at,
        }
    }
}

/// What the user typed, before trimming or validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookmarkInput {
    pub title: String,
    pub url: String,
}

impl BookmarkInput {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
        }
    }
}

/// A validated insert row. The store assigns `id` and `created_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBookmark {
    pub user_id: String,
    pub url: String,
    pub title: String,
}
