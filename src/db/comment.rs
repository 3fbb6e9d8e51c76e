use sqlx::PgPool;

use crate::{
    error::Error,
    model::{Comment, validate_comment_body},
};

use super::{
    PostgresTransaction, error::DatabaseError, manga::find_manga, user::ensure_reader_exists,
};

const COMMENT_COLUMNS: &str = "id, reader_id, manga_id, body, likes, created_at";

async fn insert_comment(
    tx: &mut PostgresTransaction,
    reader_id: i64,
    manga_id: i64,
    body: &str,
) -> Result<Comment, Error> {
    sqlx::query_as::<_, Comment>(&format!(
        r#"
        INSERT INTO comments
            (reader_id, manga_id, body)
        VALUES
            ($1, $2, $3)
        RETURNING {COMMENT_COLUMNS};
    "#
    ))
    .bind(reader_id)
    .bind(manga_id)
    .bind(body)
    .fetch_one(&mut **tx)
    .await
    .map_err(|e| DatabaseError::from(e).into())
}

/// Always inserts a new comment; repeated text is not deduplicated.
#[tracing::instrument(name = "comment on manga", skip(tx, body))]
pub async fn comment_on_manga(
    tx: &mut PostgresTransaction,
    reader_id: i64,
    manga_id: i64,
    body: &str,
) -> Result<Comment, Error> {
    validate_comment_body(body).map_err(Error::Validation)?;

    ensure_reader_exists(&mut **tx, reader_id).await?;
    find_manga(&mut **tx, manga_id).await?;

    insert_comment(tx, reader_id, manga_id, body).await
}

/// Answers a comment with a new comment on the same manga, addressed to its author.
#[tracing::instrument(name = "reply to comment", skip(tx, body))]
pub async fn reply_to_comment(
    tx: &mut PostgresTransaction,
    reader_id: i64,
    comment_id: i64,
    body: &str,
) -> Result<Comment, Error> {
    validate_comment_body(body).map_err(Error::Validation)?;
    ensure_reader_exists(&mut **tx, reader_id).await?;

    let (manga_id, codename): (i64, String) = sqlx::query_as(
        r#"
        SELECT
            comments.manga_id, readers.codename
        FROM
            comments
        INNER JOIN
            readers ON readers.user_id = comments.reader_id
        WHERE
            comments.id = $1;
    "#,
    )
    .bind(comment_id)
    .fetch_optional(&mut **tx)
    .await
    .map_err(DatabaseError::from)?
    .ok_or(DatabaseError::NotFound)?;

    let reply = format!("@{}: {}", codename, body);
    validate_comment_body(&reply).map_err(Error::Validation)?;

    insert_comment(tx, reader_id, manga_id, &reply).await
}

/// Adds one like. Not a toggle: every call counts.
#[tracing::instrument(name = "like comment", skip(tx))]
pub async fn like_comment(tx: &mut PostgresTransaction, comment_id: i64) -> Result<Comment, Error> {
    sqlx::query_as::<_, Comment>(&format!(
        "UPDATE comments SET likes = likes + 1 WHERE id = $1 RETURNING {COMMENT_COLUMNS}"
    ))
    .bind(comment_id)
    .fetch_optional(&mut **tx)
    .await
    .map_err(DatabaseError::from)?
    .ok_or_else(|| DatabaseError::NotFound.into())
}

/// Replaces the text of a comment written by `reader_id`.
#[tracing::instrument(name = "edit comment", skip(tx, body))]
pub async fn edit_comment(
    tx: &mut PostgresTransaction,
    reader_id: i64,
    comment_id: i64,
    body: &str,
) -> Result<Comment, Error> {
    validate_comment_body(body).map_err(Error::Validation)?;

    sqlx::query_as::<_, Comment>(&format!(
        r#"
        UPDATE comments
        SET
            body = $3
        WHERE
            id = $1 AND reader_id = $2
        RETURNING {COMMENT_COLUMNS};
    "#
    ))
    .bind(comment_id)
    .bind(reader_id)
    .bind(body)
    .fetch_optional(&mut **tx)
    .await
    .map_err(DatabaseError::from)?
    .ok_or_else(|| DatabaseError::NotFound.into())
}

#[tracing::instrument(name = "remove comment", skip(tx))]
pub async fn remove_comment(tx: &mut PostgresTransaction, comment_id: i64) -> Result<(), Error> {
    let result = sqlx::query("DELETE FROM comments WHERE id = $1")
        .bind(comment_id)
        .execute(&mut **tx)
        .await
        .map_err(DatabaseError::from)?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound.into());
    }

    Ok(())
}

#[tracing::instrument(name = "get comments by manga", skip(pool))]
pub async fn get_comments_by_manga(pool: &PgPool, manga_id: i64) -> Result<Vec<Comment>, Error> {
    sqlx::query_as::<_, Comment>(&format!(
        "SELECT {COMMENT_COLUMNS} FROM comments WHERE manga_id = $1 ORDER BY created_at, id"
    ))
    .bind(manga_id)
    .fetch_all(pool)
    .await
    .map_err(|e| DatabaseError::from(e).into())
}
