use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use validator::Validate;

use crate::{
    db::{
        chapter::{
            NewChapter, add_chapter, complete_chapter, get_chapters_by_manga, mark_pages_read,
            remove_chapter,
        },
        error::DatabaseError,
        reader_manga::record_chapter_read,
    },
    error::Error,
    model::{Chapter, ReaderManga, User},
    state::SharedAppState,
};

use super::{UrlPath, require_administrator, require_reader};

#[derive(serde::Deserialize, Debug, Validate)]
pub struct StoreChapterRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[validate(range(min = 0))]
    pub chapter_number: i32,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub page_count: i32,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
}

#[derive(serde::Deserialize, Debug)]
pub struct PagesReadRequest {
    pub pages: i32,
}

#[tracing::instrument(
    name = "[GET] manga/{id}/chapters",
    skip_all,
    fields(path.id = path.id)
)]
pub async fn index(
    State(app_state): State<SharedAppState>,
    Path(path): Path<UrlPath>,
) -> Result<Json<Vec<Chapter>>, Error> {
    let result = get_chapters_by_manga(&app_state.pool, path.id).await?;

    Ok(Json(result))
}

#[tracing::instrument(
    name = "[POST] manga/{id}/chapters",
    skip_all,
    fields(path.id = path.id)
)]
pub async fn store(
    Extension(user): Extension<Arc<User>>,
    State(app_state): State<SharedAppState>,
    Path(path): Path<UrlPath>,
    Json(request): Json<StoreChapterRequest>,
) -> Result<(StatusCode, Json<Chapter>), Error> {
    require_administrator(&user)?;
    request.validate().map_err(Error::Validation)?;

    let mut tx = app_state.pool.begin().await.map_err(DatabaseError::from)?;
    let chapter = add_chapter(
        &mut tx,
        path.id,
        NewChapter {
            title: request.title,
            chapter_number: request.chapter_number,
            page_count: request.page_count,
            published_at: request.published_at,
        },
    )
    .await?;
    tx.commit().await.map_err(DatabaseError::from)?;

    Ok((StatusCode::CREATED, Json(chapter)))
}

#[tracing::instrument(name = "[DELETE] chapters/{id}", skip_all, fields(path.id = path.id))]
pub async fn destroy(
    Extension(user): Extension<Arc<User>>,
    State(app_state): State<SharedAppState>,
    Path(path): Path<UrlPath>,
) -> Result<StatusCode, Error> {
    require_administrator(&user)?;

    let mut tx = app_state.pool.begin().await.map_err(DatabaseError::from)?;
    remove_chapter(&mut tx, path.id).await?;
    tx.commit().await.map_err(DatabaseError::from)?;

    Ok(StatusCode::NO_CONTENT)
}

#[tracing::instrument(
    name = "[POST] chapters/{id}/read",
    skip_all,
    fields(path.id = path.id)
)]
pub async fn read(
    Extension(user): Extension<Arc<User>>,
    State(app_state): State<SharedAppState>,
    Path(path): Path<UrlPath>,
) -> Result<Json<ReaderManga>, Error> {
    let reader_id = require_reader(&user)?;

    let mut tx = app_state.pool.begin().await.map_err(DatabaseError::from)?;
    let reading = record_chapter_read(&mut tx, reader_id, path.id).await?;
    tx.commit().await.map_err(DatabaseError::from)?;

    Ok(Json(reading))
}

#[tracing::instrument(
    name = "[PUT] chapters/{id}/pages",
    skip_all,
    fields(path.id = path.id)
)]
pub async fn pages(
    Extension(user): Extension<Arc<User>>,
    State(app_state): State<SharedAppState>,
    Path(path): Path<UrlPath>,
    Json(request): Json<PagesReadRequest>,
) -> Result<Json<Chapter>, Error> {
    require_reader(&user)?;

    let mut tx = app_state.pool.begin().await.map_err(DatabaseError::from)?;
    let chapter = mark_pages_read(&mut tx, path.id, request.pages).await?;
    tx.commit().await.map_err(DatabaseError::from)?;

    Ok(Json(chapter))
}

#[tracing::instrument(
    name = "[POST] chapters/{id}/complete",
    skip_all,
    fields(path.id = path.id)
)]
pub async fn complete(
    Extension(user): Extension<Arc<User>>,
    State(app_state): State<SharedAppState>,
    Path(path): Path<UrlPath>,
) -> Result<Json<Chapter>, Error> {
    require_administrator(&user)?;

    let mut tx = app_state.pool.begin().await.map_err(DatabaseError::from)?;
    let chapter = complete_chapter(&mut tx, path.id).await?;
    tx.commit().await.map_err(DatabaseError::from)?;

    Ok(Json(chapter))
}
