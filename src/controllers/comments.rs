use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    db::{
        comment::{
            comment_on_manga, edit_comment, get_comments_by_manga, like_comment, remove_comment,
            reply_to_comment,
        },
        error::DatabaseError,
    },
    error::Error,
    model::{Comment, User},
    state::SharedAppState,
};

use super::{UrlPath, require_administrator, require_reader};

#[derive(serde::Deserialize, Debug)]
pub struct CommentRequest {
    pub body: String,
}

#[tracing::instrument(
    name = "[GET] manga/{id}/comments",
    skip_all,
    fields(path.id = path.id)
)]
pub async fn index(
    State(app_state): State<SharedAppState>,
    Path(path): Path<UrlPath>,
) -> Result<Json<Vec<Comment>>, Error> {
    let result = get_comments_by_manga(&app_state.pool, path.id).await?;

    Ok(Json(result))
}

#[tracing::instrument(
    name = "[POST] manga/{id}/comments",
    skip_all,
    fields(path.id = path.id)
)]
pub async fn store(
    Extension(user): Extension<Arc<User>>,
    State(app_state): State<SharedAppState>,
    Path(path): Path<UrlPath>,
    Json(request): Json<CommentRequest>,
) -> Result<(StatusCode, Json<Comment>), Error> {
    let reader_id = require_reader(&user)?;

    let mut tx = app_state.pool.begin().await.map_err(DatabaseError::from)?;
    let comment = comment_on_manga(&mut tx, reader_id, path.id, &request.body).await?;
    tx.commit().await.map_err(DatabaseError::from)?;

    Ok((StatusCode::CREATED, Json(comment)))
}

#[tracing::instrument(name = "[PUT] comments/{id}", skip_all, fields(path.id = path.id))]
pub async fn update(
    Extension(user): Extension<Arc<User>>,
    State(app_state): State<SharedAppState>,
    Path(path): Path<UrlPath>,
    Json(request): Json<CommentRequest>,
) -> Result<Json<Comment>, Error> {
    let reader_id = require_reader(&user)?;

    let mut tx = app_state.pool.begin().await.map_err(DatabaseError::from)?;
    let comment = edit_comment(&mut tx, reader_id, path.id, &request.body).await?;
    tx.commit().await.map_err(DatabaseError::from)?;

    Ok(Json(comment))
}

#[tracing::instrument(
    name = "[POST] comments/{id}/replies",
    skip_all,
    fields(path.id = path.id)
)]
pub async fn reply(
    Extension(user): Extension<Arc<User>>,
    State(app_state): State<SharedAppState>,
    Path(path): Path<UrlPath>,
    Json(request): Json<CommentRequest>,
) -> Result<(StatusCode, Json<Comment>), Error> {
    let reader_id = require_reader(&user)?;

    let mut tx = app_state.pool.begin().await.map_err(DatabaseError::from)?;
    let comment = reply_to_comment(&mut tx, reader_id, path.id, &request.body).await?;
    tx.commit().await.map_err(DatabaseError::from)?;

    Ok((StatusCode::CREATED, Json(comment)))
}

#[tracing::instrument(
    name = "[POST] comments/{id}/like",
    skip_all,
    fields(path.id = path.id)
)]
pub async fn like(
    Extension(user): Extension<Arc<User>>,
    State(app_state): State<SharedAppState>,
    Path(path): Path<UrlPath>,
) -> Result<Json<Comment>, Error> {
    require_reader(&user)?;

    let mut tx = app_state.pool.begin().await.map_err(DatabaseError::from)?;
    let comment = like_comment(&mut tx, path.id).await?;
    tx.commit().await.map_err(DatabaseError::from)?;

    Ok(Json(comment))
}

#[tracing::instrument(name = "[DELETE] comments/{id}", skip_all, fields(path.id = path.id))]
pub async fn destroy(
    Extension(user): Extension<Arc<User>>,
    State(app_state): State<SharedAppState>,
    Path(path): Path<UrlPath>,
) -> Result<StatusCode, Error> {
    require_administrator(&user)?;

    let mut tx = app_state.pool.begin().await.map_err(DatabaseError::from)?;
    remove_comment(&mut tx, path.id).await?;
    tx.commit().await.map_err(DatabaseError::from)?;

    Ok(StatusCode::NO_CONTENT)
}
