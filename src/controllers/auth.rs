use std::borrow::Cow;

use anyhow::Context;
use axum::{Json, extract::State};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidateEmail, ValidateLength, ValidationError, ValidationErrors};

use crate::{
    auth::{encode_jwt, error::AuthError, verify_password_hash},
    db::user::get_user_credential,
    error::Error,
    state::SharedAppState,
    telemetry::spawn_blocking_with_tracing,
};

pub(crate) const MAX_PASSWORD_LENGTH: u64 = 64;

pub(crate) fn validate_email(errors: &mut ValidationErrors, email: &str) {
    if !email.validate_email() {
        errors.add(
            "email",
            ValidationError::new("email_email").with_message(Cow::from("Incorrect email format")),
        );
    }
    if !email.validate_length(Some(1), Some(255), None) {
        errors.add(
            "email",
            ValidationError::new("email_length")
                .with_message(Cow::from("Email length must be between 1 and 255")),
        );
    }
}

pub(crate) fn validate_password(
    errors: &mut ValidationErrors,
    field: &'static str,
    password: &SecretString,
) {
    if !password
        .expose_secret()
        .validate_length(Some(1), Some(MAX_PASSWORD_LENGTH), None)
    {
        errors.add(
            field,
            ValidationError::new("password_length")
                .with_message(Cow::from("Password length must be between 1 and 64")),
        );
    }
}

#[derive(Deserialize)]
pub struct AuthRequest {
    pub email: String,
    pub password: SecretString,
}

impl Validate for AuthRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        validate_email(&mut errors, &self.email);
        validate_password(&mut errors, "password", &self.password);

        if !errors.errors().is_empty() {
            return Err(errors);
        }

        Ok(())
    }
}

#[derive(Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
}

#[tracing::instrument(name = "[POST] auth", skip_all)]
pub async fn store(
    State(app_state): State<SharedAppState>,
    Json(request): Json<AuthRequest>,
) -> Result<Json<AuthResponse>, Error> {
    request.validate().map_err(Error::Validation)?;

    let (user, hashed_password) = get_user_credential(&app_state.pool, &request.email)
        .await?
        .ok_or(Error::Auth(AuthError::IncorrectCredential))?;

    spawn_blocking_with_tracing(move || verify_password_hash(hashed_password, request.password))
        .await
        .context("verify password hash")
        .map_err(Error::Other)?
        .map_err(|_| Error::Auth(AuthError::IncorrectCredential))?;

    let token = encode_jwt(user.id, user.kind(), &app_state.config.jwt)?;

    Ok(Json(AuthResponse { token }))
}
