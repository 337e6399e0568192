use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct AdminStats {
    pub users: i64,
    pub posts: i64,
    pub comments: i64,
    pub likes: i64,
    pub admins: i64,
    pub banned: i64,
}
