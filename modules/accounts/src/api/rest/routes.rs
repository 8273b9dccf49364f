use std::sync::Arc;

use axum::{
    http::Method,
    routing::{get, post, MethodRouter},
    Extension, Router,
};
use restkit::{FieldViolation, Problem, RequestCtx};
use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
    Modify, OpenApi,
};

use crate::api::rest::{dto, handlers};
use crate::domain::service::Service;

#[derive(OpenApi)]
#[openapi(
    info(title = "Accounts API", description = "User accounts, tokens and administration"),
    paths(
        handlers::create_user,
        handlers::issue_token,
        handlers::get_me,
        handlers::update_me,
        handlers::admin_list_users,
        handlers::admin_add_form,
        handlers::admin_create_user,
        handlers::admin_get_user,
        handlers::admin_update_user,
    ),
    components(schemas(
        dto::CreateUserReq,
        dto::TokenReq,
        dto::TokenDto,
        dto::ProfileDto,
        dto::UpdateProfileReq,
        dto::AdminUserDto,
        dto::AdminUserListDto,
        dto::AdminCreateReq,
        dto::AdminPatchReq,
        dto::AddFormDto,
        dto::FormFieldDto,
        Problem,
        FieldViolation,
    )),
    modifiers(&TokenAuth),
    tags(
        (name = "user", description = "Sign-up, tokens and the caller's profile"),
        (name = "admin", description = "Superuser management of user records"),
    )
)]
pub struct ApiDoc;

struct TokenAuth;

impl Modify for TokenAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "token",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                "Authorization",
                "`Token <key>` as returned by POST /user/token",
            ))),
        );
    }
}

/// Answer every verb the route does not list with a 405 problem.
fn reject_others(route: MethodRouter, allow: &'static str) -> MethodRouter {
    route.fallback(move |ctx: RequestCtx, method: Method| async move {
        handlers::method_not_allowed(&ctx, &method, allow)
    })
}

pub fn register_routes(router: Router, service: Arc<Service>) -> Router {
    router
        .route(
            "/user/create",
            reject_others(post(handlers::create_user), "POST"),
        )
        .route(
            "/user/token",
            reject_others(post(handlers::issue_token), "POST"),
        )
        .route(
            "/user/me",
            reject_others(
                get(handlers::get_me).patch(handlers::update_me),
                "GET, HEAD, PATCH",
            ),
        )
        .route(
            "/admin/users",
            reject_others(get(handlers::admin_list_users), "GET, HEAD"),
        )
        .route(
            "/admin/users/add",
            reject_others(
                get(handlers::admin_add_form).post(handlers::admin_create_user),
                "GET, HEAD, POST",
            ),
        )
        .route(
            "/admin/users/{id}",
            reject_others(
                get(handlers::admin_get_user).patch(handlers::admin_update_user),
                "GET, HEAD, PATCH",
            ),
        )
        .layer(Extension(service))
}
