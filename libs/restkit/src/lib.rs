//! Shared REST plumbing: RFC 9457 problem bodies, static error catalogs and
//! the per-request context used when rendering them.

pub mod catalog;
pub mod problem;
pub mod request;

pub use catalog::ErrDef;
pub use problem::{FieldViolation, Problem, ProblemResponse, APPLICATION_PROBLEM_JSON};
pub use request::{RequestCtx, XRequestId};
