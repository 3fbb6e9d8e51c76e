use sqlx::PgPool;

use crate::{
    error::Error,
    model::{ReaderManga, compute_progress},
};

use super::{
    PostgresTransaction,
    chapter::{count_chapters, find_chapter},
    error::DatabaseError,
    manga::find_manga,
    user::ensure_reader_exists,
};

const READER_MANGA_COLUMNS: &str =
    "id, reader_id, manga_id, favorited_at, progress, last_chapter_read";

/// Marks a manga as favorite. Re-marking keeps the original timestamp.
#[tracing::instrument(name = "mark favorite", skip(tx))]
pub async fn mark_favorite(
    tx: &mut PostgresTransaction,
    reader_id: i64,
    manga_id: i64,
) -> Result<ReaderManga, Error> {
    ensure_reader_exists(&mut **tx, reader_id).await?;
    find_manga(&mut **tx, manga_id).await?;

    sqlx::query_as::<_, ReaderManga>(&format!(
        r#"
        INSERT INTO reader_mangas
            (reader_id, manga_id, favorited_at, progress)
        VALUES
            ($1, $2, NOW(), 0.0)
        ON CONFLICT (reader_id, manga_id)
        DO UPDATE SET
            favorited_at = COALESCE(reader_mangas.favorited_at, EXCLUDED.favorited_at)
        RETURNING {READER_MANGA_COLUMNS};
    "#
    ))
    .bind(reader_id)
    .bind(manga_id)
    .fetch_one(&mut **tx)
    .await
    .map_err(|e| DatabaseError::from(e).into())
}

/// Clears the favorite flag; a missing link is left missing.
#[tracing::instrument(name = "unmark favorite", skip(tx))]
pub async fn unmark_favorite(
    tx: &mut PostgresTransaction,
    reader_id: i64,
    manga_id: i64,
) -> Result<Option<ReaderManga>, Error> {
    sqlx::query_as::<_, ReaderManga>(&format!(
        r#"
        UPDATE reader_mangas
        SET
            favorited_at = NULL
        WHERE
            reader_id = $1 AND manga_id = $2
        RETURNING {READER_MANGA_COLUMNS};
    "#
    ))
    .bind(reader_id)
    .bind(manga_id)
    .fetch_optional(&mut **tx)
    .await
    .map_err(|e| DatabaseError::from(e).into())
}

/// Records that a reader finished a chapter and recomputes the reading progress.
///
/// A link created here starts as a favorite. The last chapter read only moves forward,
/// and progress is left untouched while the manga has no chapters.
#[tracing::instrument(name = "record chapter read", skip(tx))]
pub async fn record_chapter_read(
    tx: &mut PostgresTransaction,
    reader_id: i64,
    chapter_id: i64,
) -> Result<ReaderManga, Error> {
    ensure_reader_exists(&mut **tx, reader_id).await?;
    let chapter = find_chapter(&mut **tx, chapter_id).await?;

    sqlx::query(
        r#"
        INSERT INTO reader_mangas
            (reader_id, manga_id, favorited_at)
        VALUES
            ($1, $2, NOW())
        ON CONFLICT (reader_id, manga_id) DO NOTHING;
    "#,
    )
    .bind(reader_id)
    .bind(chapter.manga_id)
    .execute(&mut **tx)
    .await
    .map_err(DatabaseError::from)?;

    let reading = sqlx::query_as::<_, ReaderManga>(&format!(
        r#"
        SELECT {READER_MANGA_COLUMNS}
        FROM
            reader_mangas
        WHERE
            reader_id = $1 AND manga_id = $2
        FOR UPDATE;
    "#
    ))
    .bind(reader_id)
    .bind(chapter.manga_id)
    .fetch_one(&mut **tx)
    .await
    .map_err(DatabaseError::from)?;

    let last_chapter_read = reading.last_chapter_read.max(chapter.chapter_number);
    let total_chapters = count_chapters(&mut **tx, chapter.manga_id).await?;
    let progress = compute_progress(last_chapter_read, total_chapters).unwrap_or(reading.progress);

    tracing::debug!(
        last_chapter_read,
        total_chapters,
        progress,
        "reading progress updated"
    );

    sqlx::query_as::<_, ReaderManga>(&format!(
        r#"
        UPDATE reader_mangas
        SET
            last_chapter_read = $2,
            progress = $3
        WHERE
            id = $1
        RETURNING {READER_MANGA_COLUMNS};
    "#
    ))
    .bind(reading.id)
    .bind(last_chapter_read)
    .bind(progress)
    .fetch_one(&mut **tx)
    .await
    .map_err(|e| DatabaseError::from(e).into())
}

#[tracing::instrument(name = "get reader manga", skip(pool))]
pub async fn get_reader_manga(
    pool: &PgPool,
    reader_id: i64,
    manga_id: i64,
) -> Result<Option<ReaderManga>, Error> {
    sqlx::query_as::<_, ReaderManga>(&format!(
        "SELECT {READER_MANGA_COLUMNS} FROM reader_mangas WHERE reader_id = $1 AND manga_id = $2"
    ))
    .bind(reader_id)
    .bind(manga_id)
    .fetch_optional(pool)
    .await
    .map_err(|e| DatabaseError::from(e).into())
}

#[tracing::instrument(name = "get reading list", skip(pool))]
pub async fn get_reading_list(pool: &PgPool, reader_id: i64) -> Result<Vec<ReaderManga>, Error> {
    sqlx::query_as::<_, ReaderManga>(&format!(
        r#"
        SELECT {READER_MANGA_COLUMNS}
        FROM
            reader_mangas
        WHERE
            reader_id = $1
        ORDER BY favorited_at DESC NULLS LAST, manga_id;
    "#
    ))
    .bind(reader_id)
    .fetch_all(pool)
    .await
    .map_err(|e| DatabaseError::from(e).into())
}
