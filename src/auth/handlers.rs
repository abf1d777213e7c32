use crate::{
    auth::{jwt::generate_access_token, password::verify_password, session::AdminSession},
    config::Config,
    models::{LoginReqDto, LoginResponse},
};
use actix_web::{HttpResponse, Responder, web};
use serde_json::json;
use tracing::{debug, error, info, instrument};

/// Admin login
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginReqDto,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 400, description = "Username or password missing"),
        (status = 401, description = "Invalid credentials"),
        (status = 429, description = "Too many login attempts")
    ),
    tag = "Auth"
)]
#[instrument(
    name = "auth_login",
    skip(config, user),
    fields(username = %user.username)
)]
pub async fn login(user: web::Json<LoginReqDto>, config: web::Data<Config>) -> impl Responder {
    info!("Login request received");

    if user.username.trim().is_empty() || user.password.is_empty() {
        info!("Validation failed: empty username or password");
        return HttpResponse::BadRequest().json(json!({
            "message": "Username or password required"
        }));
    }

    if user.username.trim() != config.admin_username {
        info!("Invalid credentials: unknown username");
        return HttpResponse::Unauthorized().json(json!({ "message": "Invalid credentials" }));
    }

    debug!("Verifying password");
    if let Err(e) = verify_password(&user.password, &config.admin_password_hash) {
        info!(error = %e, "Invalid credentials: password mismatch");
        return HttpResponse::Unauthorized().json(json!({ "message": "Invalid credentials" }));
    }

    let access_token = match generate_access_token(
        &config.admin_username,
        &config.jwt_secret,
        config.access_token_ttl,
    ) {
        Ok(token) => token,
        Err(e) => {
            error!(error = %e, "Failed to sign access token");
            return HttpResponse::InternalServerError().json(json!({
                "message": "Internal Server Error"
            }));
        }
    };

    info!("Login successful");

    HttpResponse::Ok().json(LoginResponse {
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: config.access_token_ttl,
    })
}

/// Current admin session
#[utoipa::path(
    get,
    path = "/api/session",
    responses(
        (status = 200, description = "Active session", body = AdminSession),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Auth"
)]
pub async fn current_session(session: AdminSession) -> impl Responder {
    HttpResponse::Ok().json(session)
}
