use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub author_id: i64,
    pub author_name: String,
    pub author_photo: Option<String>,
    pub text: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Like state of one (user, post) pair after a toggle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LikeState {
    pub liked: bool,
    pub total: i64,
}
