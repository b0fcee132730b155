use crate::models::{GroupRow, PostRow, UserRow};
use crate::store::{BlogStore, NewPost, PostFilter};
use crate::Database;
use anyhow::{Result, anyhow};
use rusqlite::{Connection, OptionalExtension, Row};

const POST_COLUMNS: &str = "
    SELECT p.id, p.text, p.created_at, p.author_id, u.username, p.group_id, g.title, g.slug
    FROM posts p
    JOIN users u ON p.author_id = u.id
    LEFT JOIN post_groups g ON p.group_id = g.id";

impl BlogStore for Database {
    // -- Users --

    fn create_user(&self, username: &str, password_hash: &str) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (username, password) VALUES (?1, ?2)",
                (username, password_hash),
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            query_user(conn, "SELECT id, username, password, created_at FROM users WHERE username = ?1", username)
        })
    }

    // -- Groups --

    fn create_group(&self, title: &str, slug: &str, description: &str) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO post_groups (title, slug, description) VALUES (?1, ?2, ?3)",
                (title, slug, description),
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    fn get_group_by_slug(&self, slug: &str) -> Result<Option<GroupRow>> {
        self.with_conn(|conn| {
            query_group(conn, "SELECT id, title, slug, description FROM post_groups WHERE slug = ?1", slug)
        })
    }

    fn list_groups(&self) -> Result<Vec<GroupRow>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT id, title, slug, description FROM post_groups ORDER BY title, id")?;
            let rows = stmt
                .query_map([], group_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Posts --

    fn insert_post(&self, post: &NewPost) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO posts (text, author_id, group_id) VALUES (?1, ?2, ?3)",
                rusqlite::params![post.text, post.author_id, post.group_id],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    fn update_post(&self, id: i64, text: &str, group_id: Option<i64>) -> Result<()> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE posts SET text = ?1, group_id = ?2 WHERE id = ?3",
                rusqlite::params![text, group_id, id],
            )?;
            if changed == 0 {
                return Err(anyhow!("Post not found: {}", id));
            }
            Ok(())
        })
    }

    fn get_post(&self, id: i64) -> Result<Option<PostRow>> {
        self.with_conn(|conn| {
            let sql = format!("{POST_COLUMNS} WHERE p.id = ?1");
            let row = conn.query_row(&sql, [id], post_from_row).optional()?;
            Ok(row)
        })
    }

    fn count_posts(&self, filter: PostFilter) -> Result<u64> {
        let (group_id, author_id) = filter.params();
        self.with_conn(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM posts
                 WHERE (?1 IS NULL OR group_id = ?1) AND (?2 IS NULL OR author_id = ?2)",
                rusqlite::params![group_id, author_id],
                |row| row.get(0),
            )?;
            Ok(count as u64)
        })
    }

    fn list_posts(&self, filter: PostFilter, limit: u64, offset: u64) -> Result<Vec<PostRow>> {
        let (group_id, author_id) = filter.params();
        self.with_conn(|conn| {
            let sql = format!(
                "{POST_COLUMNS}
                 WHERE (?1 IS NULL OR p.group_id = ?1) AND (?2 IS NULL OR p.author_id = ?2)
                 ORDER BY p.created_at DESC, p.id DESC
                 LIMIT ?3 OFFSET ?4"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(
                    rusqlite::params![group_id, author_id, limit as i64, offset as i64],
                    post_from_row,
                )?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

fn query_user<P: rusqlite::ToSql>(conn: &Connection, sql: &str, key: P) -> Result<Option<UserRow>> {
    let row = conn
        .query_row(sql, [key], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                username: row.get(1)?,
                password: row.get(2)?,
                created_at: row.get(3)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn query_group<P: rusqlite::ToSql>(conn: &Connection, sql: &str, key: P) -> Result<Option<GroupRow>> {
    Ok(conn.query_row(sql, [key], group_from_row).optional()?)
}

fn group_from_row(row: &Row<'_>) -> rusqlite::Result<GroupRow> {
    Ok(GroupRow {
        id: row.get(0)?,
        title: row.get(1)?,
        slug: row.get(2)?,
        description: row.get(3)?,
    })
}

fn post_from_row(row: &Row<'_>) -> rusqlite::Result<PostRow> {
    Ok(PostRow {
        id: row.get(0)?,
        text: row.get(1)?,
        created_at: row.get(2)?,
        author_id: row.get(3)?,
        author_username: row.get(4)?,
        group_id: row.get(5)?,
        group_title: row.get(6)?,
        group_slug: row.get(7)?,
    })
}
