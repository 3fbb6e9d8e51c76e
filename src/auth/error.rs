#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Jwt error")]
    JwtError(jsonwebtoken::errors::Error),
    #[error("Password error")]
    PasswordError(argon2::password_hash::Error),
    #[error("Unauthenticated")]
    Unauthenticated,
    #[error("Incorrect credential")]
    IncorrectCredential,
    #[error("Registration is disabled")]
    RegistrationDisabled,
    #[error("Action not allowed for this role")]
    Forbidden,
}
