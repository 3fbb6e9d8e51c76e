use chrono::{DateTime, Utc};
use sqlx::{PgPool, postgres::PgConnection};

use crate::{
    error::Error,
    model::{Chapter, validate_pages_read},
};

use super::{PostgresTransaction, error::DatabaseError, manga::find_manga};

const CHAPTER_COLUMNS: &str =
    "id, manga_id, title, chapter_number, page_count, pages_read, published_at";

#[derive(serde::Deserialize, Debug, Clone)]
pub struct NewChapter {
    pub title: String,
    pub chapter_number: i32,
    #[serde(default)]
    pub page_count: i32,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
}

pub(crate) async fn find_chapter(
    conn: &mut PgConnection,
    chapter_id: i64,
) -> Result<Chapter, Error> {
    sqlx::query_as::<_, Chapter>(&format!(
        "SELECT {CHAPTER_COLUMNS} FROM chapters WHERE id = $1"
    ))
    .bind(chapter_id)
    .fetch_optional(conn)
    .await
    .map_err(DatabaseError::from)?
    .ok_or_else(|| DatabaseError::NotFound.into())
}

pub(crate) async fn count_chapters(conn: &mut PgConnection, manga_id: i64) -> Result<i64, Error> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chapters WHERE manga_id = $1")
        .bind(manga_id)
        .fetch_one(conn)
        .await
        .map_err(DatabaseError::from)?;

    Ok(total)
}

/// Adds a chapter to a manga. Does not touch the administrator's uploaded-manga count.
#[tracing::instrument(
    name = "add chapter",
    skip(tx, chapter),
    fields(chapter_number = chapter.chapter_number)
)]
pub async fn add_chapter(
    tx: &mut PostgresTransaction,
    manga_id: i64,
    chapter: NewChapter,
) -> Result<Chapter, Error> {
    find_manga(&mut **tx, manga_id).await?;

    sqlx::query_as::<_, Chapter>(&format!(
        r#"
        INSERT INTO chapters
            (manga_id, title, chapter_number, page_count, published_at)
        VALUES
            ($1, $2, $3, $4, COALESCE($5, NOW()))
        RETURNING {CHAPTER_COLUMNS};
    "#
    ))
    .bind(manga_id)
    .bind(&chapter.title)
    .bind(chapter.chapter_number)
    .bind(chapter.page_count)
    .bind(chapter.published_at)
    .fetch_one(&mut **tx)
    .await
    .map_err(|e| DatabaseError::from(e).into())
}

#[tracing::instrument(name = "remove chapter", skip(tx))]
pub async fn remove_chapter(tx: &mut PostgresTransaction, chapter_id: i64) -> Result<(), Error> {
    let result = sqlx::query("DELETE FROM chapters WHERE id = $1")
        .bind(chapter_id)
        .execute(&mut **tx)
        .await
        .map_err(DatabaseError::from)?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound.into());
    }

    Ok(())
}

#[tracing::instrument(name = "mark pages read", skip(tx))]
pub async fn mark_pages_read(
    tx: &mut PostgresTransaction,
    chapter_id: i64,
    pages: i32,
) -> Result<Chapter, Error> {
    let chapter = find_chapter(&mut **tx, chapter_id).await?;
    validate_pages_read(pages, chapter.page_count).map_err(Error::Validation)?;

    sqlx::query_as::<_, Chapter>(&format!(
        "UPDATE chapters SET pages_read = $2 WHERE id = $1 RETURNING {CHAPTER_COLUMNS}"
    ))
    .bind(chapter_id)
    .bind(pages)
    .fetch_one(&mut **tx)
    .await
    .map_err(|e| DatabaseError::from(e).into())
}

#[tracing::instrument(name = "complete chapter", skip(tx))]
pub async fn complete_chapter(
    tx: &mut PostgresTransaction,
    chapter_id: i64,
) -> Result<Chapter, Error> {
    sqlx::query_as::<_, Chapter>(&format!(
        "UPDATE chapters SET pages_read = page_count WHERE id = $1 RETURNING {CHAPTER_COLUMNS}"
    ))
    .bind(chapter_id)
    .fetch_optional(&mut **tx)
    .await
    .map_err(DatabaseError::from)?
    .ok_or_else(|| DatabaseError::NotFound.into())
}

#[tracing::instrument(name = "get chapters by manga", skip(pool))]
pub async fn get_chapters_by_manga(pool: &PgPool, manga_id: i64) -> Result<Vec<Chapter>, Error> {
    let mut conn = pool.acquire().await.map_err(DatabaseError::from)?;
    find_manga(&mut conn, manga_id).await?;

    sqlx::query_as::<_, Chapter>(&format!(
        "SELECT {CHAPTER_COLUMNS} FROM chapters WHERE manga_id = $1 ORDER BY chapter_number, id"
    ))
    .bind(manga_id)
    .fetch_all(&mut *conn)
    .await
    .map_err(|e| DatabaseError::from(e).into())
}
