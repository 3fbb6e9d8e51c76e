use crate::{
    error::Error,
    model::{Rating, validate_score},
};

use super::{
    PostgresTransaction, error::DatabaseError, manga::find_manga, user::ensure_reader_exists,
};

/// Rates a manga, overwriting the score of an earlier rating by the same reader.
///
/// The score is validated before any statement runs. The `(reader_id, manga_id)` unique
/// constraint turns concurrent first ratings into a single row.
#[tracing::instrument(name = "rate manga", skip(tx))]
pub async fn rate_manga(
    tx: &mut PostgresTransaction,
    reader_id: i64,
    manga_id: i64,
    score: f64,
) -> Result<Rating, Error> {
    validate_score(score).map_err(Error::Validation)?;

    ensure_reader_exists(&mut **tx, reader_id).await?;
    find_manga(&mut **tx, manga_id).await?;

    sqlx::query_as::<_, Rating>(
        r#"
        INSERT INTO ratings
            (reader_id, manga_id, score)
        VALUES
            ($1, $2, $3)
        ON CONFLICT (reader_id, manga_id)
        DO UPDATE SET
            score = EXCLUDED.score
        RETURNING id, reader_id, manga_id, score;
    "#,
    )
    .bind(reader_id)
    .bind(manga_id)
    .bind(score)
    .fetch_one(&mut **tx)
    .await
    .map_err(|e| DatabaseError::from(e).into())
}

#[tracing::instrument(name = "remove rating", skip(tx))]
pub async fn remove_rating(
    tx: &mut PostgresTransaction,
    reader_id: i64,
    manga_id: i64,
) -> Result<(), Error> {
    let result = sqlx::query("DELETE FROM ratings WHERE reader_id = $1 AND manga_id = $2")
        .bind(reader_id)
        .bind(manga_id)
        .execute(&mut **tx)
        .await
        .map_err(DatabaseError::from)?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound.into());
    }

    Ok(())
}
