use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    db::{
        error::DatabaseError,
        rating::{rate_manga, remove_rating},
    },
    error::Error,
    model::{Rating, User},
    state::SharedAppState,
};

use super::{UrlPath, require_reader};

#[derive(serde::Deserialize, Debug)]
pub struct RatingRequest {
    pub score: f64,
}

#[tracing::instrument(
    name = "[PUT] manga/{id}/rating",
    skip_all,
    fields(path.id = path.id, score = request.score)
)]
pub async fn update(
    Extension(user): Extension<Arc<User>>,
    State(app_state): State<SharedAppState>,
    Path(path): Path<UrlPath>,
    Json(request): Json<RatingRequest>,
) -> Result<Json<Rating>, Error> {
    let reader_id = require_reader(&user)?;

    let mut tx = app_state.pool.begin().await.map_err(DatabaseError::from)?;
    let rating = rate_manga(&mut tx, reader_id, path.id, request.score).await?;
    tx.commit().await.map_err(DatabaseError::from)?;

    Ok(Json(rating))
}

#[tracing::instrument(
    name = "[DELETE] manga/{id}/rating",
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
    remove_rating(&mut tx, reader_id, path.id).await?;
    tx.commit().await.map_err(DatabaseError::from)?;

    Ok(StatusCode::NO_CONTENT)
}
