use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::catalog::ErrDef;
use crate::problem::ProblemResponse;

/// Request id stored in request extensions by the ingress middleware.
#[derive(Clone, Debug)]
pub struct XRequestId(pub String);

/// Per-request context that error mapping needs: the path for `instance`
/// and the request id for correlation.
#[derive(Clone, Debug, Default)]
pub struct RequestCtx {
    pub path: String,
    pub request_id: Option<String>,
}

impl RequestCtx {
    pub fn problem(&self, def: &ErrDef, detail: impl Into<String>) -> ProblemResponse {
        let problem = def.to_problem(detail).with_instance(self.path.clone());
        match &self.request_id {
            Some(id) => problem.with_request_id(id.clone()).into(),
            None => problem.into(),
        }
    }
}

impl<S> FromRequestParts<S> for RequestCtx
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self {
            path: parts.uri.path().to_owned(),
            request_id: parts.extensions.get::<XRequestId>().map(|r| r.0.clone()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{Request, StatusCode};

    const TEAPOT: ErrDef = ErrDef {
        status: StatusCode::IM_A_TEAPOT,
        title: "Teapot",
        code: "TEST_TEAPOT",
        type_url: "https://errors.example.com/TEST_TEAPOT",
    };

    #[tokio::test]
    async fn extracts_path_and_request_id() {
        let mut req = Request::builder()
            .uri("/user/me?x=1")
            .body(())
            .unwrap();
        req.extensions_mut().insert(XRequestId("rid-7".into()));
        let (mut parts, _) = req.into_parts();

        let ctx = RequestCtx::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(ctx.path, "/user/me");
        assert_eq!(ctx.request_id.as_deref(), Some("rid-7"));

        let resp = ctx.problem(&TEAPOT, "short and stout");
        assert_eq!(resp.status(), StatusCode::IM_A_TEAPOT);
        assert_eq!(resp.problem.instance, "/user/me");
        assert_eq!(resp.problem.request_id.as_deref(), Some("rid-7"));
    }
}
