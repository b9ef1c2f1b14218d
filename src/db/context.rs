// src/db/context.rs
// DOCUMENTATION: Request-scoped deadline
// PURPOSE: Bound every database call and file write of one request

use crate::errors::NewsError;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::time::{timeout_at, Instant};

/// Deadline shared by all storage steps of a single request
/// DOCUMENTATION: Created once per request from the configured timeout and
/// passed by reference into the gateway and the upload writer
#[derive(Debug, Clone, Copy)]
pub struct OpContext {
    deadline: Instant,
}

impl OpContext {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            deadline: Instant::now() + timeout,
        }
    }

    /// Run one storage step under the deadline
    /// DOCUMENTATION: Both the step's own error and an expired deadline come
    /// back as `StorageError`, labelled with `what`
    pub async fn run<F, T, E>(&self, what: &str, step: F) -> Result<T, NewsError>
    where
        F: Future<Output = Result<T, E>>,
        E: Display,
    {
        match timeout_at(self.deadline, step).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(NewsError::storage(what, e)),
            Err(_) => Err(NewsError::storage(what, "deadline exceeded")),
        }
    }
}
