use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    db::{
        error::DatabaseError,
        genre::{
            create_genre, delete_genre, get_genres, rename_genre, tag_manga_genre,
            untag_manga_genre,
        },
    },
    error::Error,
    model::{Genre, MangaGenre, User},
    state::SharedAppState,
};

use super::{UrlPath, require_administrator};

#[derive(serde::Deserialize, Debug)]
pub struct GenreRequest {
    pub name: String,
}

#[derive(serde::Deserialize, Debug, Default)]
pub struct TagRequest {
    #[serde(default)]
    pub is_primary: bool,
}

#[derive(serde::Deserialize, Debug)]
pub struct MangaGenrePath {
    pub id: i64,
    pub genre_id: i64,
}

#[tracing::instrument(name = "[GET] genres", skip_all)]
pub async fn index(State(app_state): State<SharedAppState>) -> Result<Json<Vec<Genre>>, Error> {
    let result = get_genres(&app_state.pool).await?;

    Ok(Json(result))
}

#[tracing::instrument(name = "[POST] genres", skip_all, fields(name = %request.name))]
pub async fn store(
    Extension(user): Extension<Arc<User>>,
    State(app_state): State<SharedAppState>,
    Json(request): Json<GenreRequest>,
) -> Result<(StatusCode, Json<Genre>), Error> {
    require_administrator(&user)?;

    let mut tx = app_state.pool.begin().await.map_err(DatabaseError::from)?;
    let genre = create_genre(&mut tx, &request.name).await?;
    tx.commit().await.map_err(DatabaseError::from)?;

    Ok((StatusCode::CREATED, Json(genre)))
}

#[tracing::instrument(name = "[PUT] genres/{id}", skip_all, fields(path.id = path.id))]
pub async fn update(
    Extension(user): Extension<Arc<User>>,
    State(app_state): State<SharedAppState>,
    Path(path): Path<UrlPath>,
    Json(request): Json<GenreRequest>,
) -> Result<Json<Genre>, Error> {
    require_administrator(&user)?;

    let mut tx = app_state.pool.begin().await.map_err(DatabaseError::from)?;
    let genre = rename_genre(&mut tx, path.id, &request.name).await?;
    tx.commit().await.map_err(DatabaseError::from)?;

    Ok(Json(genre))
}

#[tracing::instrument(name = "[DELETE] genres/{id}", skip_all, fields(path.id = path.id))]
pub async fn destroy(
    Extension(user): Extension<Arc<User>>,
    State(app_state): State<SharedAppState>,
    Path(path): Path<UrlPath>,
) -> Result<StatusCode, Error> {
    require_administrator(&user)?;

    let mut tx = app_state.pool.begin().await.map_err(DatabaseError::from)?;
    delete_genre(&mut tx, path.id).await?;
    tx.commit().await.map_err(DatabaseError::from)?;

    Ok(StatusCode::NO_CONTENT)
}

#[tracing::instrument(
    name = "[PUT] manga/{id}/genres/{genre_id}",
    skip_all,
    fields(path.id = path.id, path.genre_id = path.genre_id)
)]
pub async fn tag(
    Extension(user): Extension<Arc<User>>,
    State(app_state): State<SharedAppState>,
    Path(path): Path<MangaGenrePath>,
    Json(request): Json<TagRequest>,
) -> Result<Json<MangaGenre>, Error> {
    require_administrator(&user)?;

    let mut tx = app_state.pool.begin().await.map_err(DatabaseError::from)?;
    let link = tag_manga_genre(&mut tx, path.id, path.genre_id, request.is_primary).await?;
    tx.commit().await.map_err(DatabaseError::from)?;

    Ok(Json(link))
}

#[tracing::instrument(
    name = "[DELETE] manga/{id}/genres/{genre_id}",
    skip_all,
    fields(path.id = path.id, path.genre_id = path.genre_id)
)]
pub async fn untag(
    Extension(user): Extension<Arc<User>>,
    State(app_state): State<SharedAppState>,
    Path(path): Path<MangaGenrePath>,
) -> Result<StatusCode, Error> {
    require_administrator(&user)?;

    let mut tx = app_state.pool.begin().await.map_err(DatabaseError::from)?;
    untag_manga_genre(&mut tx, path.id, path.genre_id).await?;
    tx.commit().await.map_err(DatabaseError::from)?;

    Ok(StatusCode::NO_CONTENT)
}
