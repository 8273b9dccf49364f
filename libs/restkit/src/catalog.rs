//! Catalog-driven Problem building.
//!
//! Each module declares its errors as `ErrDef` constants and maps domain
//! failures onto them at the REST boundary.
use http::StatusCode;

use crate::problem::Problem;

/// Static error definition from a module's catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrDef {
    pub status: StatusCode,
    pub title: &'static str,
    pub code: &'static str,
    pub type_url: &'static str,
}

impl ErrDef {
    /// Convert this error definition into a Problem with the given detail.
    pub fn to_problem(&self, detail: impl Into<String>) -> Problem {
        Problem::new(self.status, self.title, detail)
            .with_code(self.code)
            .with_type(self.type_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_NOT_FOUND: ErrDef = ErrDef {
        status: StatusCode::NOT_FOUND,
        title: "Not Found",
        code: "TEST_NOT_FOUND",
        type_url: "https://errors.example.com/TEST_NOT_FOUND",
    };

    #[test]
    fn err_def_to_problem_works() {
        let problem = TEST_NOT_FOUND.to_problem("Resource missing");
        assert_eq!(problem.status, 404);
        assert_eq!(problem.title, "Not Found");
        assert_eq!(problem.detail, "Resource missing");
        assert_eq!(problem.code, "TEST_NOT_FOUND");
        assert_eq!(
            problem.type_url,
            "https://errors.example.com/TEST_NOT_FOUND"
        );
    }
}
