//! Conversions from store rows to the API models handed to templates.

use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::warn;

use scribe_db::models::{GroupRow, PostRow, UserRow};
use scribe_types::models::{Author, Group, GroupRef, Post, User};

pub fn post(row: PostRow) -> Post {
    let group = match (row.group_id, row.group_title, row.group_slug) {
        (Some(id), Some(title), Some(slug)) => Some(GroupRef { id, title, slug }),
        _ => None,
    };

    Post {
        id: row.id,
        created_at: parse_timestamp(&row.created_at, "post", row.id),
        text: row.text,
        author: Author { id: row.author_id, username: row.author_username },
        group,
    }
}

pub fn group(row: GroupRow) -> Group {
    Group {
        id: row.id,
        title: row.title,
        slug: row.slug,
        description: row.description,
    }
}

pub fn user(row: &UserRow) -> User {
    User {
        id: row.id,
        username: row.username.clone(),
        created_at: parse_timestamp(&row.created_at, "user", row.id),
    }
}

fn parse_timestamp(raw: &str, kind: &str, id: i64) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            // Rows written outside the app may use SQLite's "YYYY-MM-DD HH:MM:SS".
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt created_at '{}' on {} {}: {}", raw, kind, id, e);
            DateTime::default()
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_both_timestamp_layouts() {
        let iso = parse_timestamp("2024-03-01T10:20:30.123Z", "post", 1);
        let plain = parse_timestamp("2024-03-01 10:20:30", "post", 1);
        assert_eq!(iso.timestamp(), plain.timestamp());
        assert_eq!(parse_timestamp("garbage", "post", 1), DateTime::<Utc>::default());
    }

    #[test]
    fn post_without_group() {
        let row = PostRow {
            id: 7,
            text: "hi".into(),
            created_at: "2024-03-01T10:20:30Z".into(),
            author_id: 1,
            author_username: "auth".into(),
            group_id: None,
            group_title: None,
            group_slug: None,
        };
        let post = post(row);
        assert_eq!(post.author.username, "auth");
        assert!(post.group.is_none());
    }
}
