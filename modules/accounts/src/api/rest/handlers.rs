use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path,
    },
    http::{header::ALLOW, Method, StatusCode},
    response::Json,
    Extension,
};
use restkit::{Problem, ProblemResponse, RequestCtx};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::api::rest::auth::CurrentUser;
use crate::api::rest::dto::{
    AddFormDto, AdminCreateReq, AdminPatchReq, AdminUserDto, AdminUserListDto, CreateUserReq,
    ProfileDto, TokenDto, TokenReq, UpdateProfileReq,
};
use crate::api::rest::error::{
    map_domain_error, BODY_TOO_LARGE, MALFORMED_BODY, METHOD_NOT_ALLOWED, UNSUPPORTED_MEDIA_TYPE,
    USER_NOT_FOUND,
};
use crate::domain::service::Service;

type Svc = Extension<Arc<Service>>;

/// Unwrap a JSON body or turn the rejection into a problem. Content-type and
/// size rejections keep their status; anything unparsable is a 400.
fn json_body<T>(ctx: &RequestCtx, body: Result<Json<T>, JsonRejection>) -> Result<T, ProblemResponse> {
    match body {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => {
            debug!("Rejected request body: {}", rejection.body_text());
            let def = match rejection.status() {
                StatusCode::UNSUPPORTED_MEDIA_TYPE => &UNSUPPORTED_MEDIA_TYPE,
                StatusCode::PAYLOAD_TOO_LARGE => &BODY_TOO_LARGE,
                _ => &MALFORMED_BODY,
            };
            Err(ctx.problem(def, rejection.body_text()))
        }
    }
}

/// Create a new account
#[utoipa::path(
    post,
    path = "/user/create",
    tag = "user",
    request_body = CreateUserReq,
    responses(
        (status = 201, description = "Account created", body = ProfileDto),
        (status = 400, description = "Missing, invalid or duplicate email, short password, or malformed body",
            body = Problem, content_type = "application/problem+json"),
    )
)]
pub async fn create_user(
    ctx: RequestCtx,
    Extension(svc): Svc,
    body: Result<Json<CreateUserReq>, JsonRejection>,
) -> Result<(StatusCode, Json<ProfileDto>), ProblemResponse> {
    let req = json_body(&ctx, body)?;
    info!("Creating user");

    match svc.create_user(req.into()).await {
        Ok(user) => Ok((StatusCode::CREATED, Json(ProfileDto::from(user)))),
        Err(e) => {
            warn!("Failed to create user: {}", e);
            Err(map_domain_error(&e, &ctx))
        }
    }
}

/// Exchange credentials for an API token
#[utoipa::path(
    post,
    path = "/user/token",
    tag = "user",
    request_body = TokenReq,
    responses(
        (status = 200, description = "Token for the account", body = TokenDto),
        (status = 400, description = "Missing or invalid credentials",
            body = Problem, content_type = "application/problem+json"),
    )
)]
pub async fn issue_token(
    ctx: RequestCtx,
    Extension(svc): Svc,
    body: Result<Json<TokenReq>, JsonRejection>,
) -> Result<Json<TokenDto>, ProblemResponse> {
    let req = json_body(&ctx, body)?;

    match svc.issue_token(req.into()).await {
        Ok(token) => Ok(Json(TokenDto { token: token.key })),
        Err(e) => {
            info!("Token request rejected: {}", e);
            Err(map_domain_error(&e, &ctx))
        }
    }
}

/// Read the caller's profile
#[utoipa::path(
    get,
    path = "/user/me",
    tag = "user",
    security(("token" = [])),
    responses(
        (status = 200, description = "Caller's profile", body = ProfileDto),
        (status = 401, description = "Not authenticated",
            body = Problem, content_type = "application/problem+json"),
    )
)]
pub async fn get_me(
    ctx: RequestCtx,
    Extension(svc): Svc,
    CurrentUser(principal): CurrentUser,
) -> Result<Json<ProfileDto>, ProblemResponse> {
    svc.get_profile(&principal)
        .await
        .map(|user| Json(user.into()))
        .map_err(|e| map_domain_error(&e, &ctx))
}

/// Partially update the caller's profile
#[utoipa::path(
    patch,
    path = "/user/me",
    tag = "user",
    security(("token" = [])),
    request_body = UpdateProfileReq,
    responses(
        (status = 200, description = "Updated profile", body = ProfileDto),
        (status = 400, description = "Invalid input",
            body = Problem, content_type = "application/problem+json"),
        (status = 401, description = "Not authenticated",
            body = Problem, content_type = "application/problem+json"),
    )
)]
pub async fn update_me(
    ctx: RequestCtx,
    Extension(svc): Svc,
    CurrentUser(principal): CurrentUser,
    body: Result<Json<UpdateProfileReq>, JsonRejection>,
) -> Result<Json<ProfileDto>, ProblemResponse> {
    let req = json_body(&ctx, body)?;
    info!(user_id = %principal.user_id, "Updating profile");

    match svc.update_profile(&principal, req.into()).await {
        Ok(user) => Ok(Json(user.into())),
        Err(e) => {
            warn!("Failed to update profile: {}", e);
            Err(map_domain_error(&e, &ctx))
        }
    }
}

/// Admin list view
#[utoipa::path(
    get,
    path = "/admin/users",
    tag = "admin",
    security(("token" = [])),
    responses(
        (status = 200, description = "All users", body = AdminUserListDto),
        (status = 401, description = "Not authenticated", body = Problem, content_type = "application/problem+json"),
        (status = 403, description = "Not a superuser", body = Problem, content_type = "application/problem+json"),
    )
)]
pub async fn admin_list_users(
    ctx: RequestCtx,
    Extension(svc): Svc,
    CurrentUser(principal): CurrentUser,
) -> Result<Json<AdminUserListDto>, ProblemResponse> {
    let users = svc
        .admin_list_users(&principal)
        .await
        .map_err(|e| map_domain_error(&e, &ctx))?;
    let users: Vec<AdminUserDto> = users.into_iter().map(Into::into).collect();
    Ok(Json(AdminUserListDto {
        total: users.len(),
        users,
    }))
}

/// Admin add view: describes the create form
#[utoipa::path(
    get,
    path = "/admin/users/add",
    tag = "admin",
    security(("token" = [])),
    responses(
        (status = 200, description = "Form description", body = AddFormDto),
        (status = 403, description = "Not a superuser", body = Problem, content_type = "application/problem+json"),
    )
)]
pub async fn admin_add_form(
    ctx: RequestCtx,
    Extension(svc): Svc,
    CurrentUser(principal): CurrentUser,
) -> Result<Json<AddFormDto>, ProblemResponse> {
    svc.admin_add_form(&principal)
        .map(|form| Json(form.into()))
        .map_err(|e| map_domain_error(&e, &ctx))
}

/// Admin add view: create an account
#[utoipa::path(
    post,
    path = "/admin/users/add",
    tag = "admin",
    security(("token" = [])),
    request_body = AdminCreateReq,
    responses(
        (status = 201, description = "Created user", body = AdminUserDto),
        (status = 400, description = "Invalid input", body = Problem, content_type = "application/problem+json"),
        (status = 403, description = "Not a superuser", body = Problem, content_type = "application/problem+json"),
    )
)]
pub async fn admin_create_user(
    ctx: RequestCtx,
    Extension(svc): Svc,
    CurrentUser(principal): CurrentUser,
    body: Result<Json<AdminCreateReq>, JsonRejection>,
) -> Result<(StatusCode, Json<AdminUserDto>), ProblemResponse> {
    let req = json_body(&ctx, body)?;
    info!(admin = %principal.user_id, "Admin creating user");

    match svc.admin_create_user(&principal, req.into()).await {
        Ok(user) => Ok((StatusCode::CREATED, Json(user.into()))),
        Err(e) => {
            warn!("Admin create failed: {}", e);
            Err(map_domain_error(&e, &ctx))
        }
    }
}

/// Admin change view
#[utoipa::path(
    get,
    path = "/admin/users/{id}",
    tag = "admin",
    security(("token" = [])),
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "User record", body = AdminUserDto),
        (status = 403, description = "Not a superuser", body = Problem, content_type = "application/problem+json"),
        (status = 404, description = "Unknown user", body = Problem, content_type = "application/problem+json"),
    )
)]
pub async fn admin_get_user(
    ctx: RequestCtx,
    Extension(svc): Svc,
    CurrentUser(principal): CurrentUser,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<AdminUserDto>, ProblemResponse> {
    let id = user_id(&ctx, id)?;
    svc.admin_get_user(&principal, id)
        .await
        .map(|user| Json(user.into()))
        .map_err(|e| map_domain_error(&e, &ctx))
}

/// Admin change view: apply an edit
#[utoipa::path(
    patch,
    path = "/admin/users/{id}",
    tag = "admin",
    security(("token" = [])),
    params(("id" = Uuid, Path, description = "User id")),
    request_body = AdminPatchReq,
    responses(
        (status = 200, description = "Updated user", body = AdminUserDto),
        (status = 400, description = "Invalid input", body = Problem, content_type = "application/problem+json"),
        (status = 403, description = "Not a superuser", body = Problem, content_type = "application/problem+json"),
        (status = 404, description = "Unknown user", body = Problem, content_type = "application/problem+json"),
    )
)]
pub async fn admin_update_user(
    ctx: RequestCtx,
    Extension(svc): Svc,
    CurrentUser(principal): CurrentUser,
    id: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<AdminPatchReq>, JsonRejection>,
) -> Result<Json<AdminUserDto>, ProblemResponse> {
    let id = user_id(&ctx, id)?;
    let req = json_body(&ctx, body)?;
    info!(admin = %principal.user_id, user_id = %id, "Admin editing user");

    match svc.admin_update_user(&principal, id, req.into()).await {
        Ok(user) => Ok(Json(user.into())),
        Err(e) => {
            warn!("Admin edit of {} failed: {}", id, e);
            Err(map_domain_error(&e, &ctx))
        }
    }
}

/// Unparseable ids cannot name a user.
fn user_id(ctx: &RequestCtx, id: Result<Path<Uuid>, PathRejection>) -> Result<Uuid, ProblemResponse> {
    id.map(|Path(id)| id)
        .map_err(|_| ctx.problem(&USER_NOT_FOUND, "User not found"))
}

/// Problem body for verbs a route does not serve.
pub fn method_not_allowed(ctx: &RequestCtx, method: &Method, allow: &'static str) -> ProblemResponse {
    ctx.problem(
        &METHOD_NOT_ALLOWED,
        format!("Method \"{method}\" not allowed."),
    )
    .with_header(ALLOW, allow)
}
