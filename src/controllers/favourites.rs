use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    db::{
        error::DatabaseError,
        reader_manga::{mark_favorite, unmark_favorite},
    },
    error::Error,
    model::{ReaderManga, User},
    state::SharedAppState,
};

use super::{UrlPath, require_reader};

#[tracing::instrument(
    name = "[PUT] manga/{id}/favourite",
    skip_all,
    fields(path.id = path.id)
)]
pub async fn store(
    Extension(user): Extension<Arc<User>>,
    State(app_state): State<SharedAppState>,
    Path(path): Path<UrlPath>,
) -> Result<Json<ReaderManga>, Error> {
    let reader_id = require_reader(&user)?;

    let mut tx = app_state.pool.begin().await.map_err(DatabaseError::from)?;
    let reading = mark_favorite(&mut tx, reader_id, path.id).await?;
    tx.commit().await.map_err(DatabaseError::from)?;

    Ok(Json(reading))
}

#[tracing::instrument(
    name = "[DELETE] manga/{id}/favourite",
    skip_all,
    fields(path.id = path.id)
)]
pub async fn destroy(
    Extension(user): Extension<Arc<User>>,
    State(app_state): State<SharedAppState>,
    Path(path): Path<UrlPath>,
) -> Result<StatusCode, Error> {
    let reader_id = require_reader(&user)?;

    let mut tx = app_state.pool.begin().await.map_err(DatabaseError::from)?;
    unmark_favorite(&mut tx, reader_id, path.id).await?;
    tx.commit().await.map_err(DatabaseError::from)?;

    Ok(StatusCode::NO_CONTENT)
}
