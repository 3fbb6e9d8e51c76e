use crate::{
    auth::error::AuthError,
    error::Error,
    model::{Role, User},
};

pub mod administrators;
pub mod auth;
pub mod chapters;
pub mod comments;
pub mod favourites;
pub mod genres;
pub mod home;
pub mod manga;
pub mod me;
pub mod ratings;
pub mod readers;
pub mod reports;
pub mod users;

#[derive(serde::Serialize, serde::Deserialize, Debug)]
pub struct UrlPath {
    pub id: i64,
}

/// Id of the authenticated user when it is a reader.
pub(crate) fn require_reader(user: &User) -> Result<i64, Error> {
    match user.role {
        Role::Reader { .. } => Ok(user.id),
        Role::Administrator { .. } => Err(Error::Auth(AuthError::Forbidden)),
    }
}

/// Id of the authenticated user when it is an administrator.
pub(crate) fn require_administrator(user: &User) -> Result<i64, Error> {
    match user.role {
        Role::Administrator { .. } => Ok(user.id),
        Role::Reader { .. } => Err(Error::Auth(AuthError::Forbidden)),
    }
}
