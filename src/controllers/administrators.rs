use std::{borrow::Cow, sync::Arc};

use axum::{Extension, Json, extract::State, http::StatusCode};
use secrecy::SecretString;
use serde::Deserialize;
use validator::{Validate, ValidateLength, ValidationError, ValidationErrors};

use crate::{
    db::{
        error::DatabaseError,
        user::{NewUser, create_administrator},
    },
    error::Error,
    model::User,
    state::SharedAppState,
};

use super::{
    auth::{validate_email, validate_password},
    require_administrator,
};

#[derive(Deserialize)]
pub struct CreateAdministratorRequest {
    pub email: String,
    pub name: String,
    pub password: SecretString,
}

impl Validate for CreateAdministratorRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        validate_email(&mut errors, &self.email);
        validate_password(&mut errors, "password", &self.password);

        if !self.name.validate_length(Some(1), Some(255), None) {
            errors.add(
                "name",
                ValidationError::new("name_length")
                    .with_message(Cow::from("Name length must be between 1 and 255")),
            );
        }

        if !errors.errors().is_empty() {
            return Err(errors);
        }

        Ok(())
    }
}

#[tracing::instrument(name = "[POST] administrators", skip_all)]
pub async fn store(
    Extension(user): Extension<Arc<User>>,
    State(app_state): State<SharedAppState>,
    Json(request): Json<CreateAdministratorRequest>,
) -> Result<(StatusCode, Json<User>), Error> {
    require_administrator(&user)?;
    request.validate().map_err(Error::Validation)?;

    let mut tx = app_state.pool.begin().await.map_err(DatabaseError::from)?;
    let administrator = create_administrator(
        &mut tx,
        NewUser {
            email: request.email,
            name: request.name,
            password: request.password,
        },
    )
    .await?;
    tx.commit().await.map_err(DatabaseError::from)?;

    Ok((StatusCode::CREATED, Json(administrator)))
}
