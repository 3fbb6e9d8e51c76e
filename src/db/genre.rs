use sqlx::PgPool;

use crate::{
    error::Error,
    model::{Genre, MangaGenre, validate_genre_name},
};

use super::{PostgresTransaction, error::DatabaseError, manga::find_manga};

#[tracing::instrument(name = "create genre", skip(tx))]
pub async fn create_genre(tx: &mut PostgresTransaction, name: &str) -> Result<Genre, Error> {
    validate_genre_name(name).map_err(Error::Validation)?;

    sqlx::query_as::<_, Genre>(
        r#"
        INSERT INTO genres
            (name)
        VALUES
            ($1)
        RETURNING id, name;
    "#,
    )
    .bind(name.trim())
    .fetch_one(&mut **tx)
    .await
    .map_err(|e| DatabaseError::from(e).into())
}

/// Fails with a constraint violation when another genre already carries `new_name`.
#[tracing::instrument(name = "rename genre", skip(tx))]
pub async fn rename_genre(
    tx: &mut PostgresTransaction,
    genre_id: i64,
    new_name: &str,
) -> Result<Genre, Error> {
    validate_genre_name(new_name).map_err(Error::Validation)?;

    sqlx::query_as::<_, Genre>(
        r#"
        UPDATE genres
        SET
            name = $2
        WHERE
            id = $1
        RETURNING id, name;
    "#,
    )
    .bind(genre_id)
    .bind(new_name.trim())
    .fetch_optional(&mut **tx)
    .await
    .map_err(DatabaseError::from)?
    .ok_or_else(|| DatabaseError::NotFound.into())
}

/// Deletes the genre and its manga links; the manga themselves stay.
#[tracing::instrument(name = "delete genre", skip(tx))]
pub async fn delete_genre(tx: &mut PostgresTransaction, genre_id: i64) -> Result<(), Error> {
    let result = sqlx::query("DELETE FROM genres WHERE id = $1")
        .bind(genre_id)
        .execute(&mut **tx)
        .await
        .map_err(DatabaseError::from)?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound.into());
    }

    Ok(())
}

#[tracing::instrument(name = "get genres", skip_all)]
pub async fn get_genres(pool: &PgPool) -> Result<Vec<Genre>, Error> {
    sqlx::query_as::<_, Genre>("SELECT id, name FROM genres ORDER BY name")
        .fetch_all(pool)
        .await
        .map_err(|e| DatabaseError::from(e).into())
}

/// Links a genre to a manga, or updates the primary flag of an existing link.
///
/// The primary flag is advisory: several genres of one manga may carry it.
#[tracing::instrument(name = "tag manga genre", skip(tx))]
pub async fn tag_manga_genre(
    tx: &mut PostgresTransaction,
    manga_id: i64,
    genre_id: i64,
    is_primary: bool,
) -> Result<MangaGenre, Error> {
    find_manga(&mut **tx, manga_id).await?;

    let genre_exists: bool =
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM genres WHERE id = $1)")
            .bind(genre_id)
            .fetch_one(&mut **tx)
            .await
            .map_err(DatabaseError::from)?;
    if !genre_exists {
        return Err(DatabaseError::NotFound.into());
    }

    sqlx::query_as::<_, MangaGenre>(
        r#"
        INSERT INTO manga_genres
            (manga_id, genre_id, is_primary)
        VALUES
            ($1, $2, $3)
        ON CONFLICT (manga_id, genre_id)
        DO UPDATE SET
            is_primary = EXCLUDED.is_primary
        RETURNING id, manga_id, genre_id, is_primary;
    "#,
    )
    .bind(manga_id)
    .bind(genre_id)
    .bind(is_primary)
    .fetch_one(&mut **tx)
    .await
    .map_err(|e| DatabaseError::from(e).into())
}

#[tracing::instrument(name = "untag manga genre", skip(tx))]
pub async fn untag_manga_genre(
    tx: &mut PostgresTransaction,
    manga_id: i64,
    genre_id: i64,
) -> Result<(), Error> {
    let result = sqlx::query("DELETE FROM manga_genres WHERE manga_id = $1 AND genre_id = $2")
        .bind(manga_id)
        .bind(genre_id)
        .execute(&mut **tx)
        .await
        .map_err(DatabaseError::from)?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound.into());
    }

    Ok(())
}
