use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde_aux::field_attributes::deserialize_option_number_from_string;
use validator::Validate;

use crate::{
    db::{
        error::DatabaseError,
        manga::{
            NewManga, add_manga, edit_manga, get_manga_details, get_manga_with_pagination,
            remove_manga,
        },
    },
    error::Error,
    model::{Manga, MangaChanges, MangaDetails, MangaListItem, MangaStatus, User},
    state::SharedAppState,
};

use super::{UrlPath, require_administrator};

const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_OFFSET: i64 = 1_000_000;

#[derive(serde::Deserialize, serde::Serialize, Debug, Validate)]
pub struct Pagination {
    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    #[validate(range(min = 0, max = MAX_PAGE_OFFSET))]
    offset: Option<i64>,

    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    #[validate(range(min = 1, max = 100))]
    limit: Option<i64>,
}

#[derive(serde::Deserialize, Debug, Validate)]
pub struct StoreMangaRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[validate(length(min = 1, max = 255))]
    pub author: String,
    #[serde(default)]
    pub status: MangaStatus,
}

#[derive(serde::Deserialize, Debug, Validate)]
pub struct UpdateMangaRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub author: Option<String>,
    pub status: Option<MangaStatus>,
}

#[tracing::instrument(name = "[GET] manga", skip_all, fields(parameters = ?pagination))]
pub async fn index(
    State(app_state): State<SharedAppState>,
    Query(pagination): Query<Pagination>,
) -> Result<Json<Vec<MangaListItem>>, Error> {
    pagination.validate().map_err(Error::Validation)?;

    let limit = pagination.limit.unwrap_or(DEFAULT_PAGE_SIZE);
    let skip = pagination.offset.unwrap_or(0) * limit;

    let result = get_manga_with_pagination(&app_state.pool, limit, skip).await?;

    Ok(Json(result))
}

#[tracing::instrument(name = "[GET] manga/{id}", skip_all, fields(path.id = path.id))]
pub async fn show(
    State(app_state): State<SharedAppState>,
    Path(path): Path<UrlPath>,
) -> Result<Json<MangaDetails>, Error> {
    let result = get_manga_details(&app_state.pool, path.id).await?;

    Ok(Json(result))
}

#[tracing::instrument(name = "[POST] manga", skip_all, fields(user_id = user.id))]
pub async fn store(
    Extension(user): Extension<Arc<User>>,
    State(app_state): State<SharedAppState>,
    Json(request): Json<StoreMangaRequest>,
) -> Result<(StatusCode, Json<Manga>), Error> {
    let administrator_id = require_administrator(&user)?;
    request.validate().map_err(Error::Validation)?;

    let mut tx = app_state.pool.begin().await.map_err(DatabaseError::from)?;
    let manga = add_manga(
        &mut tx,
        administrator_id,
        NewManga {
            title: request.title,
            author: request.author,
            status: request.status,
        },
    )
    .await?;
    tx.commit().await.map_err(DatabaseError::from)?;

    Ok((StatusCode::CREATED, Json(manga)))
}

#[tracing::instrument(name = "[PUT] manga/{id}", skip_all, fields(path.id = path.id))]
pub async fn update(
    Extension(user): Extension<Arc<User>>,
    State(app_state): State<SharedAppState>,
    Path(path): Path<UrlPath>,
    Json(request): Json<UpdateMangaRequest>,
) -> Result<Json<Manga>, Error> {
    require_administrator(&user)?;
    request.validate().map_err(Error::Validation)?;

    let mut tx = app_state.pool.begin().await.map_err(DatabaseError::from)?;
    let manga = edit_manga(
        &mut tx,
        path.id,
        MangaChanges {
            title: request.title,
            author: request.author,
            status: request.status,
        },
    )
    .await?;
    tx.commit().await.map_err(DatabaseError::from)?;

    Ok(Json(manga))
}

#[tracing::instrument(name = "[DELETE] manga/{id}", skip_all, fields(path.id = path.id))]
pub async fn destroy(
    Extension(user): Extension<Arc<User>>,
    State(app_state): State<SharedAppState>,
    Path(path): Path<UrlPath>,
) -> Result<StatusCode, Error> {
    let administrator_id = require_administrator(&user)?;

    let mut tx = app_state.pool.begin().await.map_err(DatabaseError::from)?;
    remove_manga(&mut tx, administrator_id, path.id).await?;
    tx.commit().await.map_err(DatabaseError::from)?;

    Ok(StatusCode::NO_CONTENT)
}
