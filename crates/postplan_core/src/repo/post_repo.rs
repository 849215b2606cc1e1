//! Post repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide stable CRUD APIs over the canonical `posts` table.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Write paths accept only normalized payloads; raw request data never
//!   reaches SQL.
//! - `Patch::Keep` and unsupplied fields never appear in UPDATE statements.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::migrations::latest_version;
use crate::db::{DbError, DbResult};
use crate::model::post::{Post, PostId, PostPurpose, PostStatus};
use crate::normalize::post_input::{NormalizedCreate, NormalizedUpdate, Patch};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const POST_SELECT_SQL: &str = "SELECT
    id,
    title,
    body,
    status,
    purpose,
    tags,
    scheduled_at,
    posted_at,
    created_at,
    updated_at
FROM posts";

const POSTS_DEFAULT_LIMIT: u32 = 50;
const POSTS_LIMIT_MAX: u32 = 200;

pub type RepoResult<T> = Result<T, RepoError>;

/// Generic repository error for post persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    NotFound(PostId),
    InvalidData(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "post not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted post data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection not migrated: expected schema version {expected_version}, found {actual_version}"
            ),
            Self::MissingRequiredTable(table) => write!(f, "missing required table: {table}"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "missing required column: {table}.{column}")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Query options for listing posts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostListQuery {
    /// Optional exact status filter.
    pub status: Option<PostStatus>,
    /// Maximum rows to return. Defaults to 50 and clamps to 200.
    pub limit: Option<u32>,
    /// Number of rows to skip.
    pub offset: u32,
}

/// Repository interface for post CRUD operations.
pub trait PostRepository {
    /// Persists a normalized create payload and returns the minted id.
    fn create_post(&self, input: &NormalizedCreate) -> RepoResult<PostId>;
    /// Applies a normalized partial update to one post.
    fn update_post(&self, id: PostId, patch: &NormalizedUpdate) -> RepoResult<()>;
    /// Gets one post by id.
    fn get_post(&self, id: PostId) -> RepoResult<Option<Post>>;
    /// Lists posts ordered by last-modified descending.
    fn list_posts(&self, query: &PostListQuery) -> RepoResult<Vec<Post>>;
    /// Hard-deletes one post by id.
    fn delete_post(&self, id: PostId) -> RepoResult<()>;
}

/// SQLite-backed post repository.
pub struct SqlitePostRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePostRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl PostRepository for SqlitePostRepository<'_> {
    fn create_post(&self, input: &NormalizedCreate) -> RepoResult<PostId> {
        let id = Uuid::new_v4();

        self.conn.execute(
            "INSERT INTO posts (
                id,
                title,
                body,
                status,
                purpose,
                tags,
                scheduled_at,
                posted_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                id.to_string(),
                input.title.as_deref(),
                input.body.as_str(),
                input.status.as_str(),
                input.purpose.as_str(),
                input.tags.as_str(),
                input.scheduled_at,
                input.posted_at,
            ],
        )?;

        Ok(id)
    }

    fn update_post(&self, id: PostId, patch: &NormalizedUpdate) -> RepoResult<()> {
        let mut assignments: Vec<String> = Vec::new();
        let mut bind_values: Vec<Value> = Vec::new();

        push_patch_text(&mut assignments, &mut bind_values, "title", &patch.title);
        if let Some(body) = &patch.body {
            push_bound(&mut assignments, &mut bind_values, "body", Value::Text(body.clone()));
        }
        if let Some(status) = patch.status {
            push_bound(
                &mut assignments,
                &mut bind_values,
                "status",
                Value::Text(status.as_str().to_string()),
            );
        }
        if let Some(purpose) = patch.purpose {
            push_bound(
                &mut assignments,
                &mut bind_values,
                "purpose",
                Value::Text(purpose.as_str().to_string()),
            );
        }
        if let Some(tags) = &patch.tags {
            push_bound(&mut assignments, &mut bind_values, "tags", Value::Text(tags.clone()));
        }
        push_patch_integer(
            &mut assignments,
            &mut bind_values,
            "scheduled_at",
            &patch.scheduled_at,
        );
        push_patch_integer(
            &mut assignments,
            &mut bind_values,
            "posted_at",
            &patch.posted_at,
        );

        // Every accepted update bumps recency, even a no-op payload.
        assignments.push("updated_at = (strftime('%s', 'now') * 1000)".to_string());

        let sql = format!(
            "UPDATE posts SET {} WHERE id = ?;",
            assignments.join(", ")
        );
        bind_values.push(Value::Text(id.to_string()));

        let changed = self.conn.execute(&sql, params_from_iter(bind_values))?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }

    fn get_post(&self, id: PostId) -> RepoResult<Option<Post>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{POST_SELECT_SQL} WHERE id = ?1;"))?;

        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_post_row(row)?));
        }

        Ok(None)
    }

    fn list_posts(&self, query: &PostListQuery) -> RepoResult<Vec<Post>> {
        let mut sql = format!("{POST_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(status) = query.status {
            sql.push_str(" AND status = ?");
            bind_values.push(Value::Text(status.as_str().to_string()));
        }

        sql.push_str(" ORDER BY updated_at DESC, id ASC");

        let limit = normalize_post_limit(query.limit);
        sql.push_str(" LIMIT ?");
        bind_values.push(Value::Integer(i64::from(limit)));
        if query.offset > 0 {
            sql.push_str(" OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut posts = Vec::new();
        while let Some(row) = rows.next()? {
            posts.push(parse_post_row(row)?);
        }

        Ok(posts)
    }

    fn delete_post(&self, id: PostId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM posts WHERE id = ?1;", [id.to_string()])?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }
}

/// Normalizes list limit according to the posts contract.
pub fn normalize_post_limit(limit: Option<u32>) -> u32 {
    match limit {
        Some(0) => POSTS_DEFAULT_LIMIT,
        Some(value) if value > POSTS_LIMIT_MAX => POSTS_LIMIT_MAX,
        Some(value) => value,
        None => POSTS_DEFAULT_LIMIT,
    }
}

fn push_bound(
    assignments: &mut Vec<String>,
    bind_values: &mut Vec<Value>,
    column: &str,
    value: Value,
) {
    assignments.push(format!("{column} = ?"));
    bind_values.push(value);
}

fn push_patch_text(
    assignments: &mut Vec<String>,
    bind_values: &mut Vec<Value>,
    column: &str,
    patch: &Patch<String>,
) {
    match patch {
        Patch::Keep => {}
        Patch::Clear => assignments.push(format!("{column} = NULL")),
        Patch::Set(value) => push_bound(assignments, bind_values, column, Value::Text(value.clone())),
    }
}

fn push_patch_integer(
    assignments: &mut Vec<String>,
    bind_values: &mut Vec<Value>,
    column: &str,
    patch: &Patch<i64>,
) {
    match patch {
        Patch::Keep => {}
        Patch::Clear => assignments.push(format!("{column} = NULL")),
        Patch::Set(value) => push_bound(assignments, bind_values, column, Value::Integer(*value)),
    }
}

fn parse_post_row(row: &Row<'_>) -> RepoResult<Post> {
    let id_text: String = row.get("id")?;
    let id = Uuid::parse_str(&id_text)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{id_text}` in posts.id")))?;

    let status_text: String = row.get("status")?;
    let status = PostStatus::parse(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid status `{status_text}` in posts.status"))
    })?;

    let purpose_text: String = row.get("purpose")?;
    let purpose = PostPurpose::parse(&purpose_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid purpose `{purpose_text}` in posts.purpose"))
    })?;

    Ok(Post {
        id,
        title: row.get("title")?,
        body: row.get("body")?,
        status,
        purpose,
        tags: row.get("tags")?,
        scheduled_at: row.get("scheduled_at")?,
        posted_at: row.get("posted_at")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_user_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, "posts")? {
        return Err(RepoError::MissingRequiredTable("posts"));
    }

    for column in [
        "id",
        "title",
        "body",
        "status",
        "purpose",
        "tags",
        "scheduled_at",
        "posted_at",
        "created_at",
        "updated_at",
    ] {
        if !table_has_column(conn, "posts", column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: "posts",
                column,
            });
        }
    }

    Ok(())
}

fn current_user_version(conn: &Connection) -> RepoResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
