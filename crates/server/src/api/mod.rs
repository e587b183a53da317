pub mod handlers;
pub mod middleware;
pub mod queue;
pub mod routes;
pub mod upload;
pub mod ws;

pub use routes::create_router;
pub use ws::WsBroadcaster;

use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
