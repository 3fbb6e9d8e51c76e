use std::sync::Arc;

use axum::{
    Extension,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    db::{error::DatabaseError, user::delete_user},
    error::Error,
    model::User,
    state::SharedAppState,
};

use super::{UrlPath, require_administrator};

#[tracing::instrument(name = "[DELETE] users/{id}", skip_all, fields(path.id = path.id))]
pub async fn destroy(
    Extension(user): Extension<Arc<User>>,
    State(app_state): State<SharedAppState>,
    Path(path): Path<UrlPath>,
) -> Result<StatusCode, Error> {
    require_administrator(&user)?;

    let mut tx = app_state.pool.begin().await.map_err(DatabaseError::from)?;
    delete_user(&mut tx, path.id).await?;
    tx.commit().await.map_err(DatabaseError::from)?;

    Ok(StatusCode::NO_CONTENT)
}
