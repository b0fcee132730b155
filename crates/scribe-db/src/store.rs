use anyhow::Result;

use crate::models::{GroupRow, PostRow, UserRow};

/// Which posts a listing covers. Every listing is ordered newest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostFilter {
    All,
    Group(i64),
    Author(i64),
}

impl PostFilter {
    /// `(group_id, author_id)` bind parameters; `None` disables the clause.
    pub(crate) fn params(self) -> (Option<i64>, Option<i64>) {
        match self {
            PostFilter::All => (None, None),
            PostFilter::Group(id) => (Some(id), None),
            PostFilter::Author(id) => (None, Some(id)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub text: String,
    pub author_id: i64,
    pub group_id: Option<i64>,
}

/// Everything the request handlers need from persistence.
pub trait BlogStore: Send + Sync {
    // -- Users --

    /// Returns the id of the new user.
    fn create_user(&self, username: &str, password_hash: &str) -> Result<i64>;
    fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>>;

    // -- Groups --

    /// Returns the id of the new group.
    fn create_group(&self, title: &str, slug: &str, description: &str) -> Result<i64>;
    fn get_group_by_slug(&self, slug: &str) -> Result<Option<GroupRow>>;
    fn list_groups(&self) -> Result<Vec<GroupRow>>;

    // -- Posts --

    /// Returns the id of the new post. `created_at` is assigned by the store.
    fn insert_post(&self, post: &NewPost) -> Result<i64>;
    /// Replaces text and group; author and creation time are never touched.
    fn update_post(&self, id: i64, text: &str, group_id: Option<i64>) -> Result<()>;
    fn get_post(&self, id: i64) -> Result<Option<PostRow>>;
    fn count_posts(&self, filter: PostFilter) -> Result<u64>;
    fn list_posts(&self, filter: PostFilter, limit: u64, offset: u64) -> Result<Vec<PostRow>>;
}
