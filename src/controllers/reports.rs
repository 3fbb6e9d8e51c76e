use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde_aux::field_attributes::deserialize_option_number_from_string;
use validator::Validate;

use crate::{
    db::report::{
        ActiveReader, CatalogStatistics, EngagedReader, GenrePopularity, TopRatedManga,
        WellRatedManga, active_readers, catalog_statistics, engaged_readers_in_genre,
        genre_popularity, top_rated_manga, well_rated_manga,
    },
    error::Error,
    state::SharedAppState,
};

const DEFAULT_TOP_RATED_LIMIT: i64 = 5;

#[derive(serde::Deserialize, Debug, Validate)]
pub struct TopRatedQuery {
    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    #[validate(range(min = 1, max = 100))]
    limit: Option<i64>,
}

#[derive(serde::Deserialize, Debug)]
pub struct GenrePath {
    pub name: String,
}

#[tracing::instrument(
    name = "[GET] reports/top-rated",
    skip_all,
    fields(parameters = ?query)
)]
pub async fn top_rated(
    State(app_state): State<SharedAppState>,
    Query(query): Query<TopRatedQuery>,
) -> Result<Json<Vec<TopRatedManga>>, Error> {
    query.validate().map_err(Error::Validation)?;

    let result = top_rated_manga(
        &app_state.pool,
        query.limit.unwrap_or(DEFAULT_TOP_RATED_LIMIT),
    )
    .await?;

    Ok(Json(result))
}

#[tracing::instrument(
    name = "[GET] reports/genres/{name}/engaged-readers",
    skip_all,
    fields(genre = %path.name)
)]
pub async fn engaged_readers(
    State(app_state): State<SharedAppState>,
    Path(path): Path<GenrePath>,
) -> Result<Json<Vec<EngagedReader>>, Error> {
    let result = engaged_readers_in_genre(&app_state.pool, &path.name).await?;

    Ok(Json(result))
}

#[tracing::instrument(name = "[GET] reports/genres", skip_all)]
pub async fn genres(
    State(app_state): State<SharedAppState>,
) -> Result<Json<Vec<GenrePopularity>>, Error> {
    let result = genre_popularity(&app_state.pool).await?;

    Ok(Json(result))
}

#[tracing::instrument(name = "[GET] reports/well-rated", skip_all)]
pub async fn well_rated(
    State(app_state): State<SharedAppState>,
) -> Result<Json<Vec<WellRatedManga>>, Error> {
    let result = well_rated_manga(&app_state.pool).await?;

    Ok(Json(result))
}

#[tracing::instrument(name = "[GET] reports/active-readers", skip_all)]
pub async fn active(
    State(app_state): State<SharedAppState>,
) -> Result<Json<Vec<ActiveReader>>, Error> {
    let result = active_readers(&app_state.pool).await?;

    Ok(Json(result))
}

#[tracing::instrument(name = "[GET] reports/statistics", skip_all)]
pub async fn statistics(
    State(app_state): State<SharedAppState>,
) -> Result<Json<CatalogStatistics>, Error> {
    let result = catalog_statistics(&app_state.pool).await?;

    Ok(Json(result))
}
