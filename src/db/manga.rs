use futures::TryStreamExt;
use sqlx::{PgPool, Postgres, QueryBuilder, postgres::PgConnection};

use crate::{
    error::Error,
    model::{
        Chapter, Manga, MangaChanges, MangaDetails, MangaGenreTag, MangaListItem, MangaStatus,
        RatingSummary, round_two_decimals,
    },
};

use super::{PostgresTransaction, error::DatabaseError, user::adjust_uploaded_manga_count};

#[derive(serde::Deserialize, Debug, Clone)]
pub struct NewManga {
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub status: MangaStatus,
}

pub(crate) async fn find_manga(conn: &mut PgConnection, manga_id: i64) -> Result<Manga, Error> {
    sqlx::query_as::<_, Manga>(
        r#"
        SELECT
            id, title, author, status, created_at
        FROM
            mangas
        WHERE
            id = $1;
    "#,
    )
    .bind(manga_id)
    .fetch_optional(conn)
    .await
    .map_err(DatabaseError::from)?
    .ok_or_else(|| DatabaseError::NotFound.into())
}

#[tracing::instrument(name = "add manga", skip(tx, manga), fields(title = %manga.title))]
pub async fn add_manga(
    tx: &mut PostgresTransaction,
    administrator_id: i64,
    manga: NewManga,
) -> Result<Manga, Error> {
    let created = sqlx::query_as::<_, Manga>(
        r#"
        INSERT INTO mangas
            (title, author, status)
        VALUES
            ($1, $2, $3)
        RETURNING id, title, author, status, created_at;
    "#,
    )
    .bind(&manga.title)
    .bind(&manga.author)
    .bind(manga.status)
    .fetch_one(&mut **tx)
    .await
    .map_err(DatabaseError::from)?;

    adjust_uploaded_manga_count(&mut **tx, administrator_id, 1).await?;

    Ok(created)
}

#[tracing::instrument(name = "edit manga", skip(tx, changes))]
pub async fn edit_manga(
    tx: &mut PostgresTransaction,
    manga_id: i64,
    changes: MangaChanges,
) -> Result<Manga, Error> {
    sqlx::query_as::<_, Manga>(
        r#"
        UPDATE mangas
        SET
            title = COALESCE($2, title),
            author = COALESCE($3, author),
            status = COALESCE($4, status)
        WHERE
            id = $1
        RETURNING id, title, author, status, created_at;
    "#,
    )
    .bind(manga_id)
    .bind(changes.title)
    .bind(changes.author)
    .bind(changes.status)
    .fetch_optional(&mut **tx)
    .await
    .map_err(DatabaseError::from)?
    .ok_or_else(|| DatabaseError::NotFound.into())
}

/// Deletes the manga; chapters, comments, ratings, reader links and genre links go with it.
#[tracing::instrument(name = "remove manga", skip(tx))]
pub async fn remove_manga(
    tx: &mut PostgresTransaction,
    administrator_id: i64,
    manga_id: i64,
) -> Result<(), Error> {
    let result = sqlx::query("DELETE FROM mangas WHERE id = $1")
        .bind(manga_id)
        .execute(&mut **tx)
        .await
        .map_err(DatabaseError::from)?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound.into());
    }

    adjust_uploaded_manga_count(&mut **tx, administrator_id, -1).await?;

    Ok(())
}

#[tracing::instrument(name = "get manga by id", skip(pool))]
pub async fn get_manga_by_id(pool: &PgPool, manga_id: i64) -> Result<Manga, Error> {
    let mut conn = pool.acquire().await.map_err(DatabaseError::from)?;
    find_manga(&mut conn, manga_id).await
}

#[tracing::instrument(name = "get manga with pagination", skip(pool))]
pub async fn get_manga_with_pagination(
    pool: &PgPool,
    limit: i64,
    skip: i64,
) -> Result<Vec<MangaListItem>, Error> {
    let mangas = sqlx::query_as::<_, Manga>(
        r#"
        SELECT
            id, title, author, status, created_at
        FROM
            mangas
        ORDER BY id
        LIMIT $1
        OFFSET $2
    "#,
    )
    .bind(limit)
    .bind(skip)
    .fetch_all(pool)
    .await
    .map_err(DatabaseError::from)?;

    if mangas.is_empty() {
        return Ok(Vec::new());
    }

    let mut genre_query_builder: QueryBuilder<Postgres> = QueryBuilder::new(
        r#"
        SELECT
            manga_genres.manga_id, genres.id AS genre_id, genres.name, manga_genres.is_primary
        FROM
            manga_genres
        INNER JOIN
            genres ON manga_genres.genre_id = genres.id
        WHERE
            manga_genres.manga_id IN (
    "#,
    );
    let mut genre_query_builder_separator = genre_query_builder.separated(", ");
    for manga in &mangas {
        genre_query_builder_separator.push_bind(manga.id);
    }
    genre_query_builder_separator
        .push_unseparated(") ORDER BY manga_genres.is_primary DESC, genres.name;");
    let mut genre_stream = genre_query_builder
        .build_query_as::<MangaGenreTag>()
        .fetch(pool);

    let mut manga_genres = Vec::new();
    while let Some(tag) = genre_stream
        .try_next()
        .await
        .map_err(DatabaseError::from)?
    {
        manga_genres.push(tag);
    }

    let items = mangas
        .into_iter()
        .map(|manga| {
            let genres = manga_genres
                .iter()
                .filter(|tag| tag.manga_id == manga.id)
                .cloned()
                .collect();

            MangaListItem { manga, genres }
        })
        .collect();

    Ok(items)
}

#[tracing::instrument(name = "get manga details", skip(pool))]
pub async fn get_manga_details(pool: &PgPool, manga_id: i64) -> Result<MangaDetails, Error> {
    let manga = get_manga_by_id(pool, manga_id).await?;

    let genres = sqlx::query_as::<_, MangaGenreTag>(
        r#"
        SELECT
            manga_genres.manga_id, genres.id AS genre_id, genres.name, manga_genres.is_primary
        FROM
            manga_genres
        INNER JOIN
            genres ON manga_genres.genre_id = genres.id
        WHERE
            manga_genres.manga_id = $1
        ORDER BY manga_genres.is_primary DESC, genres.name;
    "#,
    )
    .bind(manga_id)
    .fetch_all(pool)
    .await
    .map_err(DatabaseError::from)?;

    let chapters = sqlx::query_as::<_, Chapter>(
        r#"
        SELECT
            id, manga_id, title, chapter_number, page_count, pages_read, published_at
        FROM
            chapters
        WHERE
            manga_id = $1
        ORDER BY chapter_number, id;
    "#,
    )
    .bind(manga_id)
    .fetch_all(pool)
    .await
    .map_err(DatabaseError::from)?;

    let (average, count): (Option<f64>, i64) = sqlx::query_as(
        r#"
        SELECT
            AVG(score)::DOUBLE PRECISION, COUNT(*)
        FROM
            ratings
        WHERE
            manga_id = $1;
    "#,
    )
    .bind(manga_id)
    .fetch_one(pool)
    .await
    .map_err(DatabaseError::from)?;

    Ok(MangaDetails {
        manga,
        genres,
        chapters,
        rating: RatingSummary {
            average: average.map(round_two_decimals).unwrap_or(0.0),
            count,
        },
    })
}
