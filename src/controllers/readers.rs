use std::borrow::Cow;

use axum::{Json, extract::State, http::StatusCode};
use secrecy::SecretString;
use serde::Deserialize;
use validator::{Validate, ValidateLength, ValidationError, ValidationErrors};

use crate::{
    auth::error::AuthError,
    db::{
        error::DatabaseError,
        user::{NewUser, create_reader},
    },
    error::Error,
    model::User,
    state::SharedAppState,
};

use super::auth::{validate_email, validate_password};

#[derive(Deserialize)]
pub struct RegisterReaderRequest {
    pub email: String,
    pub name: String,
    pub password: SecretString,
    pub codename: String,
}

impl Validate for RegisterReaderRequest {
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
        if !self.codename.validate_length(Some(1), Some(100), None) {
            errors.add(
                "codename",
                ValidationError::new("codename_length")
                    .with_message(Cow::from("Codename length must be between 1 and 100")),
            );
        }

        if !errors.errors().is_empty() {
            return Err(errors);
        }

        Ok(())
    }
}

#[tracing::instrument(name = "[POST] readers", skip_all)]
pub async fn store(
    State(app_state): State<SharedAppState>,
    Json(request): Json<RegisterReaderRequest>,
) -> Result<(StatusCode, Json<User>), Error> {
    if !app_state.config.application.allow_registration {
        return Err(Error::Auth(AuthError::RegistrationDisabled));
    }

    request.validate().map_err(Error::Validation)?;

    let mut tx = app_state.pool.begin().await.map_err(DatabaseError::from)?;
    let user = create_reader(
        &mut tx,
        NewUser {
            email: request.email,
            name: request.name,
            password: request.password,
        },
        request.codename,
    )
    .await?;
    tx.commit().await.map_err(DatabaseError::from)?;

    Ok((StatusCode::CREATED, Json(user)))
}
