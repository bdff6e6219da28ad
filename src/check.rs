use std::fmt::Display;

use thiserror::Error;

use crate::{ApiResponse, ImagesError};

/// Why a case failed.
#[derive(Debug, Error)]
pub enum CheckFailure {
    #[error("Unexpected status code received. Expected: {expected} Received: {actual}")]
    Status { expected: u16, actual: u16 },
    #[error("{}", .0.join("\n"))]
    Fields(Vec<String>),
    #[error("precondition not met: {0}")]
    Precondition(String),
    #[error("{0}")]
    Assertion(String),
    #[error(transparent)]
    Api(#[from] ImagesError),
}

/// Fails unless `resp` carries the `expected` status code.
pub fn expect_status<T>(resp: &ApiResponse<T>, expected: u16) -> Result<(), CheckFailure> {
    if resp.status == expected {
        Ok(())
    } else {
        Err(CheckFailure::Status {
            expected,
            actual: resp.status,
        })
    }
}

/// Takes the entity out of a successful response.
pub fn take_entity<T>(resp: ApiResponse<T>, what: &str) -> Result<T, CheckFailure> {
    resp.entity.ok_or_else(|| {
        CheckFailure::Assertion(format!(
            "response with status {} carried no {what}",
            resp.status
        ))
    })
}

/// Fails with every accumulated message when `errors` is not empty.
pub fn expect_no_errors(errors: Vec<String>) -> Result<(), CheckFailure> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(CheckFailure::Fields(errors))
    }
}

/// Message for a single field that did not hold its expected value.
pub fn field_error(field: &str, expected: impl Display, received: impl Display) -> String {
    format!("Unexpected {field} value received. Expected: {expected} Received: {received}")
}
