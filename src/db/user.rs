use anyhow::Context;
use secrecy::SecretString;
use sqlx::{PgPool, postgres::PgConnection};

use crate::{
    auth::{compute_password_hash, verify_password_hash},
    error::Error,
    model::{Role, User, UserKind},
    telemetry::spawn_blocking_with_tracing,
};

use super::{PostgresTransaction, error::DatabaseError};

const USER_COLUMNS: &str = r#"
        users.id, users.email, users.name, users.kind,
        readers.codename, administrators.uploaded_manga_count
"#;

const USER_JOINS: &str = r#"
    FROM
        users
    LEFT JOIN
        readers ON readers.user_id = users.id
    LEFT JOIN
        administrators ON administrators.user_id = users.id
"#;

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    email: String,
    name: String,
    kind: UserKind,
    codename: Option<String>,
    uploaded_manga_count: Option<i32>,
}

#[derive(sqlx::FromRow)]
struct CredentialRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}

impl TryFrom<UserRow> for User {
    type Error = DatabaseError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = match (row.kind, row.codename, row.uploaded_manga_count) {
            (UserKind::Reader, Some(codename), _) => Role::Reader { codename },
            (UserKind::Administrator, _, Some(uploaded_manga_count)) => Role::Administrator {
                uploaded_manga_count,
            },
            (kind, _, _) => {
                return Err(DatabaseError::DatabaseError(sqlx::Error::Decode(
                    format!("user {} has no {:?} row", row.id, kind).into(),
                )));
            }
        };

        Ok(User {
            id: row.id,
            email: row.email,
            name: row.name,
            role,
        })
    }
}

#[derive(Debug)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub password: SecretString,
}

async fn hash_password(password: SecretString) -> Result<String, Error> {
    spawn_blocking_with_tracing(move || compute_password_hash(password))
        .await
        .context("compute password hash")
        .map_err(Error::Other)?
}

async fn insert_user(
    tx: &mut PostgresTransaction,
    user: &NewUser,
    password_hash: &str,
    kind: UserKind,
) -> Result<i64, Error> {
    let user_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO users
            (email, name, password_hash, kind)
        VALUES
            ($1, $2, $3, $4)
        RETURNING id;
    "#,
    )
    .bind(&user.email)
    .bind(&user.name)
    .bind(password_hash)
    .bind(kind)
    .fetch_one(&mut **tx)
    .await
    .map_err(DatabaseError::from)?;

    Ok(user_id)
}

#[tracing::instrument(name = "create reader", skip_all, fields(email = %user.email))]
pub async fn create_reader(
    tx: &mut PostgresTransaction,
    user: NewUser,
    codename: String,
) -> Result<User, Error> {
    let password_hash = hash_password(user.password.clone()).await?;
    let user_id = insert_user(tx, &user, &password_hash, UserKind::Reader).await?;

    sqlx::query(
        r#"
        INSERT INTO readers
            (user_id, codename)
        VALUES
            ($1, $2);
    "#,
    )
    .bind(user_id)
    .bind(&codename)
    .execute(&mut **tx)
    .await
    .map_err(DatabaseError::from)?;

    Ok(User {
        id: user_id,
        email: user.email,
        name: user.name,
        role: Role::Reader { codename },
    })
}

#[tracing::instrument(name = "create administrator", skip_all, fields(email = %user.email))]
pub async fn create_administrator(
    tx: &mut PostgresTransaction,
    user: NewUser,
) -> Result<User, Error> {
    let password_hash = hash_password(user.password.clone()).await?;
    let user_id = insert_user(tx, &user, &password_hash, UserKind::Administrator).await?;

    sqlx::query(
        r#"
        INSERT INTO administrators
            (user_id)
        VALUES
            ($1);
    "#,
    )
    .bind(user_id)
    .execute(&mut **tx)
    .await
    .map_err(DatabaseError::from)?;

    Ok(User {
        id: user_id,
        email: user.email,
        name: user.name,
        role: Role::Administrator {
            uploaded_manga_count: 0,
        },
    })
}

#[tracing::instrument(name = "get user by id", skip(pool))]
pub async fn get_user_by_id_optional(pool: &PgPool, user_id: i64) -> Result<Option<User>, Error> {
    let row: Option<UserRow> = sqlx::query_as(&format!(
        "SELECT {USER_COLUMNS} {USER_JOINS} WHERE users.id = $1"
    ))
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .map_err(DatabaseError::from)?;

    Ok(row.map(User::try_from).transpose()?)
}

/// Returns the user with its stored password hash, for credential checks.
#[tracing::instrument(name = "get user credential", skip(pool))]
pub async fn get_user_credential(
    pool: &PgPool,
    email: &str,
) -> Result<Option<(User, String)>, Error> {
    let row: Option<CredentialRow> = sqlx::query_as(&format!(
        "SELECT {USER_COLUMNS}, users.password_hash {USER_JOINS} WHERE users.email = $1"
    ))
    .bind(email)
    .fetch_optional(pool)
    .await
    .map_err(DatabaseError::from)?;

    let Some(CredentialRow {
        user,
        password_hash,
    }) = row
    else {
        return Ok(None);
    };

    Ok(Some((User::try_from(user)?, password_hash)))
}

#[tracing::instrument(name = "change password", skip(tx, current_password, new_password))]
pub async fn change_password(
    tx: &mut PostgresTransaction,
    user_id: i64,
    current_password: SecretString,
    new_password: SecretString,
) -> Result<(), Error> {
    let password_hash: String =
        sqlx::query_scalar("SELECT password_hash FROM users WHERE id = $1 FOR UPDATE")
            .bind(user_id)
            .fetch_optional(&mut **tx)
            .await
            .map_err(DatabaseError::from)?
            .ok_or(DatabaseError::NotFound)?;

    spawn_blocking_with_tracing(move || verify_password_hash(password_hash, current_password))
        .await
        .context("verify password hash")
        .map_err(Error::Other)??;

    let new_hash = hash_password(new_password).await?;

    sqlx::query("UPDATE users SET password_hash = $1 WHERE id = $2")
        .bind(new_hash)
        .bind(user_id)
        .execute(&mut **tx)
        .await
        .map_err(DatabaseError::from)?;

    Ok(())
}

/// Removes the user and, through cascades, its variant row and everything a reader owns.
#[tracing::instrument(name = "delete user", skip(tx))]
pub async fn delete_user(tx: &mut PostgresTransaction, user_id: i64) -> Result<(), Error> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(user_id)
        .execute(&mut **tx)
        .await
        .map_err(DatabaseError::from)?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound.into());
    }

    Ok(())
}

pub(crate) async fn ensure_reader_exists(
    conn: &mut PgConnection,
    reader_id: i64,
) -> Result<(), Error> {
    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM readers WHERE user_id = $1)")
            .bind(reader_id)
            .fetch_one(conn)
            .await
            .map_err(DatabaseError::from)?;

    if !exists {
        return Err(DatabaseError::NotFound.into());
    }

    Ok(())
}

/// Shifts an administrator's uploaded-manga count, never below zero.
pub(crate) async fn adjust_uploaded_manga_count(
    conn: &mut PgConnection,
    administrator_id: i64,
    delta: i32,
) -> Result<i32, Error> {
    let count: Option<i32> = sqlx::query_scalar(
        r#"
        UPDATE administrators
        SET
            uploaded_manga_count = GREATEST(uploaded_manga_count + $1, 0)
        WHERE
            user_id = $2
        RETURNING uploaded_manga_count;
    "#,
    )
    .bind(delta)
    .bind(administrator_id)
    .fetch_optional(conn)
    .await
    .map_err(DatabaseError::from)?;

    count.ok_or_else(|| DatabaseError::NotFound.into())
}
