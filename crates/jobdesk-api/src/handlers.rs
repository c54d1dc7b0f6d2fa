//! HTTP request handlers.

pub mod companies;
pub mod health;
pub mod jobs;
pub mod users;

pub use companies::*;
pub use health::*;
pub use jobs::*;
pub use users::*;

use serde::Serialize;

/// Body for operations whose only payload is an acknowledgement.
#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
