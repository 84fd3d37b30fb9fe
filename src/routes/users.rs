//! User listing route.

use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::error::{AppError, ValidationError};
use crate::store::{PgUserStore, UserStore};

#[derive(Deserialize)]
pub struct ListUsersQuery {
    pub user_id: Option<i64>,
}

/// GET /users?user_id=N
///
/// Returns the matching non-deleted users. The filter is mandatory; a
/// missing `user_id` is a 400.
pub async fn list_users(
    query: web::Query<ListUsersQuery>,
    store: web::Data<PgUserStore>,
) -> Result<HttpResponse, AppError> {
    let user_id = query
        .user_id
        .ok_or(ValidationError::EmptyField("user_id"))?;

    let users = store.list(Some(user_id)).await?;
    Ok(HttpResponse::Ok().json(users))
}
