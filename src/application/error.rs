use std::error::Error as StdError;
use std::iter;

use axum::{http::StatusCode, response::Response};
use thiserror::Error;

use crate::{config::LoadError, infra::error::InfraError};

/// Diagnostics stashed in response extensions for the logging middleware.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub status: StatusCode,
    /// Outermost message first, then each `source()` in turn.
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_error(source: &'static str, status: StatusCode, error: &dyn StdError) -> Self {
        let messages = iter::successors(Some(error), |&err| err.source())
            .map(ToString::to_string)
            .collect();
        Self {
            source,
            status,
            messages,
        }
    }

    pub fn from_message(
        source: &'static str,
        status: StatusCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source,
            status,
            messages: vec![message.into()],
        }
    }

    pub fn attach(self, response: &mut Response) {
        response.extensions_mut().insert(self);
    }
}

/// Why the binary exited early.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration rejected")]
    Config(#[from] LoadError),
    #[error(transparent)]
    Infra(#[from] InfraError),
}

impl AppError {
    /// The full cause chain joined for a single log line.
    pub fn chain(&self) -> String {
        iter::successors(Some(self as &dyn StdError), |&err| err.source())
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(": ")
    }
}
