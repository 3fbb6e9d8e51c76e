use std::sync::Arc;

use axum::{Extension, Json, extract::State, http::StatusCode};
use secrecy::SecretString;
use serde::Deserialize;
use validator::{Validate, ValidationErrors};

use crate::{
    db::{error::DatabaseError, reader_manga::get_reading_list, user::change_password},
    error::Error,
    model::{ReaderManga, User},
    state::SharedAppState,
};

use super::{auth::validate_password, require_reader};

#[tracing::instrument(name = "[GET] me", skip_all)]
pub async fn index(Extension(user): Extension<Arc<User>>) -> Result<Json<Arc<User>>, Error> {
    Ok(Json(user))
}

#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: SecretString,
    pub new_password: SecretString,
}

impl Validate for ChangePasswordRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        validate_password(&mut errors, "current_password", &self.current_password);
        validate_password(&mut errors, "new_password", &self.new_password);

        if !errors.errors().is_empty() {
            return Err(errors);
        }

        Ok(())
    }
}

#[tracing::instrument(name = "[PUT] me/password", skip_all, fields(user_id = user.id))]
pub async fn update_password(
    Extension(user): Extension<Arc<User>>,
    State(app_state): State<SharedAppState>,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<StatusCode, Error> {
    request.validate().map_err(Error::Validation)?;

    let mut tx = app_state.pool.begin().await.map_err(DatabaseError::from)?;
    change_password(
        &mut tx,
        user.id,
        request.current_password,
        request.new_password,
    )
    .await?;
    tx.commit().await.map_err(DatabaseError::from)?;

    Ok(StatusCode::NO_CONTENT)
}

#[tracing::instrument(name = "[GET] me/reading", skip_all, fields(user_id = user.id))]
pub async fn reading(
    Extension(user): Extension<Arc<User>>,
    State(app_state): State<SharedAppState>,
) -> Result<Json<Vec<ReaderManga>>, Error> {
    let reader_id = require_reader(&user)?;

    let result = get_reading_list(&app_state.pool, reader_id).await?;

    Ok(Json(result))
}
