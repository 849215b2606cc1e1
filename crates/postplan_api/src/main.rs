//! HTTP API server for postplan.
//!
//! ## Purpose
//! Exposes the post CRUD surface over JSON for the local planning UI.
//!
//! ## Environment variables
//! - `POSTPLAN_ADDR`: bind address (default `127.0.0.1:3000`).
//! - `POSTPLAN_DB`: SQLite database path (default `./postplan.db`).
//! - `POSTPLAN_LOG_DIR`: when set, logs rotate into this directory;
//!   otherwise logging goes to stderr.
//! - `POSTPLAN_LOG_LEVEL`: overrides the build-mode default level.

mod dto;

use axum::{
    extract::{Path as AxumPath, Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use log::{error, info};
use rusqlite::Connection;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use dto::{ErrorBody, HealthBody, IdBody, PostBody};
use postplan_core::db::open_db;
use postplan_core::{
    default_log_level, init_file_logging, init_stderr_logging, PostId, PostService,
    PostServiceError, PostStatus, SqlitePostRepository,
};

type ApiError = (StatusCode, Json<ErrorBody>);

/// Shared state for all request handlers.
///
/// The single SQLite connection is serialized behind a mutex; request
/// volume for a single-user planning tool never justifies a pool.
#[derive(Clone)]
struct AppState {
    db: Arc<Mutex<Connection>>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let level = std::env::var("POSTPLAN_LOG_LEVEL")
        .unwrap_or_else(|_| default_log_level().to_string());
    match std::env::var("POSTPLAN_LOG_DIR") {
        Ok(dir) => init_file_logging(&level, &dir).map_err(anyhow::Error::msg)?,
        Err(_) => init_stderr_logging(&level).map_err(anyhow::Error::msg)?,
    }

    let db_path = std::env::var("POSTPLAN_DB").unwrap_or_else(|_| "./postplan.db".into());
    let conn = open_db(&db_path)?;

    let state = AppState {
        db: Arc::new(Mutex::new(conn)),
    };

    let app = Router::new()
        .route("/health", get(health))
        .route("/posts", get(list_posts).post(create_post))
        .route(
            "/posts/:id",
            get(get_post).put(update_post).delete(delete_post),
        )
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = std::env::var("POSTPLAN_ADDR").unwrap_or_else(|_| "127.0.0.1:3000".into());
    info!("event=api_start module=api status=ok addr={addr} db={db_path}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check endpoint for the local UI and smoke tests.
async fn health() -> Json<HealthBody> {
    Json(HealthBody {
        ok: postplan_core::ping() == "pong",
        version: postplan_core::core_version().to_string(),
    })
}

#[derive(Debug, Deserialize)]
struct ListParams {
    status: Option<String>,
    limit: Option<u32>,
    offset: Option<u32>,
}

/// Lists posts, most-recently-updated first.
///
/// Invalid `status` filter values are ignored rather than rejected, in
/// line with the degrade-gracefully policy of the input normalizer.
async fn list_posts(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<PostBody>>, ApiError> {
    let status = params
        .status
        .as_deref()
        .and_then(PostStatus::parse);

    let conn = state.db.lock().await;
    let service = post_service(&conn)?;
    let listed = service
        .list_posts(status, params.limit, params.offset.unwrap_or(0))
        .map_err(|err| service_error("list_posts", err))?;

    Ok(Json(listed.items.into_iter().map(PostBody::from).collect()))
}

/// Creates a post from a JSON payload.
///
/// Non-object JSON is treated as an empty payload, which then fails the
/// body-required check with a 400.
async fn create_post(
    State(state): State<AppState>,
    Json(raw): Json<Value>,
) -> Result<(StatusCode, Json<IdBody>), ApiError> {
    let payload = match raw {
        Value::Object(map) => map,
        _ => Map::new(),
    };

    let conn = state.db.lock().await;
    let service = post_service(&conn)?;
    let created = service
        .create_post(&payload)
        .map_err(|err| service_error("create_post", err))?;

    Ok((
        StatusCode::CREATED,
        Json(IdBody {
            id: created.id.to_string(),
        }),
    ))
}

/// Gets one post by id.
async fn get_post(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<PostBody>, ApiError> {
    let id = parse_post_id(&id)?;

    let conn = state.db.lock().await;
    let service = post_service(&conn)?;
    let post = service
        .get_post(id)
        .map_err(|err| service_error("get_post", err.into()))?
        .ok_or_else(not_found)?;

    Ok(Json(PostBody::from(post)))
}

/// Applies a partial update to one post.
async fn update_post(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
    Json(raw): Json<Value>,
) -> Result<Json<IdBody>, ApiError> {
    let id = parse_post_id(&id)?;
    let Value::Object(payload) = raw else {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorBody {
                error: "Invalid JSON".to_string(),
            }),
        ));
    };

    let conn = state.db.lock().await;
    let service = post_service(&conn)?;
    let updated = service
        .update_post(id, &payload)
        .map_err(|err| service_error("update_post", err))?;

    Ok(Json(IdBody {
        id: updated.id.to_string(),
    }))
}

/// Deletes one post by id.
async fn delete_post(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<IdBody>, ApiError> {
    let id = parse_post_id(&id)?;

    let conn = state.db.lock().await;
    let service = post_service(&conn)?;
    let deleted = service
        .delete_post(id)
        .map_err(|err| service_error("delete_post", err))?;

    Ok(Json(IdBody {
        id: deleted.to_string(),
    }))
}

fn post_service(conn: &Connection) -> Result<PostService<SqlitePostRepository<'_>>, ApiError> {
    let repo = SqlitePostRepository::try_new(conn)
        .map_err(|err| service_error("repo_init", err.into()))?;
    Ok(PostService::new(repo))
}

/// Maps service failures onto the wire taxonomy: validation is a 400 with
/// the validation message, unknown ids are 404, everything else is an
/// opaque 500 that only reaches the logs in detail.
fn service_error(context: &'static str, err: PostServiceError) -> ApiError {
    match err {
        PostServiceError::Validation(err) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorBody {
                error: err.to_string(),
            }),
        ),
        PostServiceError::PostNotFound(_) => not_found(),
        other => {
            error!("event=request_failed module=api status=error context={context} error={other}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody {
                    error: "internal error".to_string(),
                }),
            )
        }
    }
}

fn not_found() -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody {
            error: "Not found".to_string(),
        }),
    )
}

/// Malformed ids get unknown-id semantics rather than a separate error
/// shape; the store never minted such an id.
fn parse_post_id(raw: &str) -> Result<PostId, ApiError> {
    Uuid::parse_str(raw).map_err(|_| not_found())
}
