// src/controllers/user_controller.rs

use actix_web::{get, post, web, HttpRequest, HttpResponse};
use serde::Deserialize;
use serde_json::json;

use crate::error::{AppError, AppResult};
use super::user_type_param;
use crate::models::user::PublicUser;
use crate::services::auth_service::{self, LoginForm, RegisterForm};
use crate::state::AppState; // AppState is defined in src/state.rs

/// Query parameters for GET /users.
#[derive(Debug, Deserialize)]
pub struct UsersQuery {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub id: Option<String>,
}

/// POST /register
/// Creates a student or teacher account and returns it without the password.
#[post("/register")]
pub async fn register(
    form: web::Json<RegisterForm>,
    data: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    let user = auth_service::register(data.users.as_ref(), &data.auth, form.into_inner()).await?;

    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "message": "Registration successful!",
        "user": user,
    })))
}

/// POST /login
/// Logs in to the account of the given type and returns it with a JWT.
#[post("/login")]
pub async fn login(form: web::Json<LoginForm>, data: web::Data<AppState>) -> AppResult<HttpResponse> {
    let session = auth_service::login(data.users.as_ref(), &data.auth, form.into_inner()).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Login successful!",
        "user": session.user,
        "accessToken": session.access_token,
        "tokenType": "bearer",
    })))
}

/// GET /users?type=&id=
/// One user by id, or every user optionally narrowed to one type.
#[get("")]
pub async fn list_users(
    query: web::Query<UsersQuery>,
    data: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    let UsersQuery { kind, id } = query.into_inner();
    let kind = user_type_param(kind.as_deref(), "type")?;

    if let Some(id) = id.filter(|id| !id.is_empty()) {
        let user = data
            .users
            .find_by_id(&id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;
        return Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "user": PublicUser::from(user),
        })));
    }

    let users: Vec<PublicUser> = data
        .users
        .list(kind)
        .await?
        .into_iter()
        .map(PublicUser::from)
        .collect();
    Ok(HttpResponse::Ok().json(json!({ "success": true, "users": users })))
}

/// GET /me
/// Returns the account behind the bearer token.
#[get("/me")]
pub async fn current_user(req: HttpRequest, data: web::Data<AppState>) -> AppResult<HttpResponse> {
    let claims = auth_service::authenticate(&req, &data.auth)?;
    let user = auth_service::current_user(data.users.as_ref(), &claims).await?;

    Ok(HttpResponse::Ok().json(json!({ "success": true, "user": user })))
}
