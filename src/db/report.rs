use serde::Serialize;
use sqlx::PgPool;

use crate::{error::Error, model::MangaStatus};

use super::error::DatabaseError;

pub const WELL_RATED_MIN_AVERAGE: f64 = 4.5;
pub const WELL_RATED_MIN_COMMENTS: i64 = 2;
pub const ENGAGED_PROGRESS: f64 = 50.0;

#[derive(sqlx::FromRow, Serialize, Debug, Clone, PartialEq)]
pub struct TopRatedManga {
    pub manga_id: i64,
    pub title: String,
    pub author: String,
    pub status: MangaStatus,
    pub average_score: f64,
    pub rating_count: i64,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReaderTier {
    Hardcore,
    Regular,
    #[default]
    Casual,
}

impl ReaderTier {
    pub fn from_average_progress(average_progress: f64) -> Self {
        if average_progress >= 80.0 {
            ReaderTier::Hardcore
        } else if average_progress >= 50.0 {
            ReaderTier::Regular
        } else {
            ReaderTier::Casual
        }
    }
}

#[derive(sqlx::FromRow, Serialize, Debug, Clone, PartialEq)]
pub struct EngagedReader {
    pub reader_id: i64,
    pub codename: String,
    pub name: String,
    pub email: String,
    pub manga_count: i64,
    pub average_progress: f64,
    pub max_progress: f64,
    #[sqlx(skip)]
    pub tier: ReaderTier,
}

#[derive(sqlx::FromRow, Serialize, Debug, Clone, PartialEq)]
pub struct GenrePopularity {
    pub genre_id: i64,
    pub name: String,
    pub manga_count: i64,
    pub reader_count: i64,
    pub average_score: Option<f64>,
    pub primary_count: i64,
}

#[derive(sqlx::FromRow, Serialize, Debug, Clone, PartialEq)]
pub struct WellRatedManga {
    pub manga_id: i64,
    pub title: String,
    pub author: String,
    pub average_score: f64,
    pub rating_count: i64,
    pub comment_count: i64,
}

#[derive(sqlx::FromRow, Serialize, Debug, Clone, PartialEq)]
pub struct ActiveReader {
    pub reader_id: i64,
    pub codename: String,
    pub name: String,
    pub favorite_count: i64,
    pub rating_count: i64,
    pub average_score_given: f64,
    pub average_progress: f64,
}

#[derive(sqlx::FromRow, Serialize, Debug, Clone, PartialEq)]
pub struct BestRatedManga {
    pub manga_id: i64,
    pub title: String,
    pub average_score: f64,
}

#[derive(sqlx::FromRow, Serialize, Debug, Clone, PartialEq)]
pub struct CatalogStatistics {
    pub users: i64,
    pub readers: i64,
    pub administrators: i64,
    pub mangas: i64,
    pub chapters: i64,
    pub ratings: i64,
    pub comments: i64,
    #[sqlx(skip)]
    pub best_rated: Option<BestRatedManga>,
}

/// Best average score first, more ratings breaking ties. Unrated manga are left out.
#[tracing::instrument(name = "report top rated manga", skip(pool))]
pub async fn top_rated_manga(pool: &PgPool, limit: i64) -> Result<Vec<TopRatedManga>, Error> {
    sqlx::query_as::<_, TopRatedManga>(
        r#"
        SELECT
            mangas.id AS manga_id,
            mangas.title,
            mangas.author,
            mangas.status,
            AVG(ratings.score)::DOUBLE PRECISION AS average_score,
            COUNT(ratings.id) AS rating_count
        FROM
            mangas
        INNER JOIN
            ratings ON ratings.manga_id = mangas.id
        GROUP BY
            mangas.id
        ORDER BY average_score DESC, rating_count DESC, mangas.id
        LIMIT $1;
    "#,
    )
    .bind(limit.max(0))
    .fetch_all(pool)
    .await
    .map_err(|e| DatabaseError::from(e).into())
}

/// Readers past half of at least one manga tagged with `genre_name`.
///
/// Only the records above the threshold take part in the counts and averages.
#[tracing::instrument(name = "report engaged readers in genre", skip(pool))]
pub async fn engaged_readers_in_genre(
    pool: &PgPool,
    genre_name: &str,
) -> Result<Vec<EngagedReader>, Error> {
    let mut readers = sqlx::query_as::<_, EngagedReader>(
        r#"
        SELECT
            readers.user_id AS reader_id,
            readers.codename,
            users.name,
            users.email,
            COUNT(reader_mangas.manga_id) AS manga_count,
            AVG(reader_mangas.progress)::DOUBLE PRECISION AS average_progress,
            MAX(reader_mangas.progress) AS max_progress
        FROM
            readers
        INNER JOIN
            users ON users.id = readers.user_id
        INNER JOIN
            reader_mangas ON reader_mangas.reader_id = readers.user_id
        WHERE
            reader_mangas.progress > $2
            AND reader_mangas.manga_id IN (
                SELECT
                    manga_genres.manga_id
                FROM
                    manga_genres
                INNER JOIN
                    genres ON genres.id = manga_genres.genre_id
                WHERE
                    genres.name = $1
            )
        GROUP BY
            readers.user_id, readers.codename, users.name, users.email
        ORDER BY average_progress DESC, readers.user_id;
    "#,
    )
    .bind(genre_name)
    .bind(ENGAGED_PROGRESS)
    .fetch_all(pool)
    .await
    .map_err(DatabaseError::from)?;

    for reader in &mut readers {
        reader.tier = ReaderTier::from_average_progress(reader.average_progress);
    }

    Ok(readers)
}

/// Per-genre figures, each from its own subquery so that reader links and ratings do not
/// multiply each other.
#[tracing::instrument(name = "report genre popularity", skip_all)]
pub async fn genre_popularity(pool: &PgPool) -> Result<Vec<GenrePopularity>, Error> {
    sqlx::query_as::<_, GenrePopularity>(
        r#"
        SELECT
            genres.id AS genre_id,
            genres.name,
            COUNT(manga_genres.manga_id) AS manga_count,
            (
                SELECT
                    COUNT(DISTINCT reader_mangas.reader_id)
                FROM
                    reader_mangas
                INNER JOIN
                    manga_genres AS tagged ON tagged.manga_id = reader_mangas.manga_id
                WHERE
                    tagged.genre_id = genres.id
            ) AS reader_count,
            (
                SELECT
                    AVG(ratings.score)::DOUBLE PRECISION
                FROM
                    ratings
                INNER JOIN
                    manga_genres AS tagged ON tagged.manga_id = ratings.manga_id
                WHERE
                    tagged.genre_id = genres.id
            ) AS average_score,
            COUNT(*) FILTER (WHERE manga_genres.is_primary) AS primary_count
        FROM
            genres
        INNER JOIN
            manga_genres ON manga_genres.genre_id = genres.id
        GROUP BY
            genres.id, genres.name
        ORDER BY reader_count DESC, average_score DESC NULLS LAST, genres.name;
    "#,
    )
    .fetch_all(pool)
    .await
    .map_err(|e| DatabaseError::from(e).into())
}

#[tracing::instrument(name = "report well rated manga", skip_all)]
pub async fn well_rated_manga(pool: &PgPool) -> Result<Vec<WellRatedManga>, Error> {
    sqlx::query_as::<_, WellRatedManga>(
        r#"
        SELECT
            mangas.id AS manga_id,
            mangas.title,
            mangas.author,
            rating_stats.average_score,
            rating_stats.rating_count,
            comment_stats.comment_count
        FROM
            mangas
        INNER JOIN (
            SELECT
                manga_id,
                AVG(score)::DOUBLE PRECISION AS average_score,
                COUNT(*) AS rating_count
            FROM
                ratings
            GROUP BY
                manga_id
        ) AS rating_stats ON rating_stats.manga_id = mangas.id
        INNER JOIN (
            SELECT
                manga_id,
                COUNT(*) AS comment_count
            FROM
                comments
            GROUP BY
                manga_id
        ) AS comment_stats ON comment_stats.manga_id = mangas.id
        WHERE
            rating_stats.average_score >= $1
            AND comment_stats.comment_count >= $2
        ORDER BY rating_stats.average_score DESC, mangas.id;
    "#,
    )
    .bind(WELL_RATED_MIN_AVERAGE)
    .bind(WELL_RATED_MIN_COMMENTS)
    .fetch_all(pool)
    .await
    .map_err(|e| DatabaseError::from(e).into())
}

/// Readers with more than one favorite, at least two ratings and one manga read past half.
///
/// `average_progress` covers only the records past half.
#[tracing::instrument(name = "report active readers", skip_all)]
pub async fn active_readers(pool: &PgPool) -> Result<Vec<ActiveReader>, Error> {
    sqlx::query_as::<_, ActiveReader>(
        r#"
        SELECT
            readers.user_id AS reader_id,
            readers.codename,
            users.name,
            favorites.favorite_count,
            reader_ratings.rating_count,
            reader_ratings.average_score AS average_score_given,
            engaged.average_progress
        FROM
            readers
        INNER JOIN
            users ON users.id = readers.user_id
        INNER JOIN (
            SELECT
                reader_id,
                COUNT(*) AS favorite_count
            FROM
                reader_mangas
            WHERE
                favorited_at IS NOT NULL
            GROUP BY
                reader_id
        ) AS favorites ON favorites.reader_id = readers.user_id
        INNER JOIN (
            SELECT
                reader_id,
                COUNT(*) AS rating_count,
                AVG(score)::DOUBLE PRECISION AS average_score
            FROM
                ratings
            GROUP BY
                reader_id
        ) AS reader_ratings ON reader_ratings.reader_id = readers.user_id
        INNER JOIN (
            SELECT
                reader_id,
                AVG(progress)::DOUBLE PRECISION AS average_progress
            FROM
                reader_mangas
            WHERE
                progress > $1
            GROUP BY
                reader_id
        ) AS engaged ON engaged.reader_id = readers.user_id
        WHERE
            favorites.favorite_count > 1
            AND reader_ratings.rating_count >= 2
        ORDER BY engaged.average_progress DESC, readers.user_id;
    "#,
    )
    .bind(ENGAGED_PROGRESS)
    .fetch_all(pool)
    .await
    .map_err(|e| DatabaseError::from(e).into())
}

#[tracing::instrument(name = "report catalog statistics", skip_all)]
pub async fn catalog_statistics(pool: &PgPool) -> Result<CatalogStatistics, Error> {
    let mut statistics = sqlx::query_as::<_, CatalogStatistics>(
        r#"
        SELECT
            (SELECT COUNT(*) FROM users) AS users,
            (SELECT COUNT(*) FROM readers) AS readers,
            (SELECT COUNT(*) FROM administrators) AS administrators,
            (SELECT COUNT(*) FROM mangas) AS mangas,
            (SELECT COUNT(*) FROM chapters) AS chapters,
            (SELECT COUNT(*) FROM ratings) AS ratings,
            (SELECT COUNT(*) FROM comments) AS comments;
    "#,
    )
    .fetch_one(pool)
    .await
    .map_err(DatabaseError::from)?;

    statistics.best_rated = sqlx::query_as::<_, BestRatedManga>(
        r#"
        SELECT
            mangas.id AS manga_id,
            mangas.title,
            AVG(ratings.score)::DOUBLE PRECISION AS average_score
        FROM
            mangas
        INNER JOIN
            ratings ON ratings.manga_id = mangas.id
        GROUP BY
            mangas.id, mangas.title
        ORDER BY average_score DESC, mangas.id
        LIMIT 1;
    "#,
    )
    .fetch_optional(pool)
    .await
    .map_err(DatabaseError::from)?;

    Ok(statistics)
}
