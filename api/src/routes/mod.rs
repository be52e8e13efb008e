pub mod analyze;
pub mod cats;
pub mod geocode;
pub mod ipfs;
pub mod likes;
pub mod users;

use serde::Serialize;
use utoipa::ToSchema;

/// Uniform error payload; routes keep messages generic and put detail in
/// the logs instead.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(message: &str) -> Self {
        Self {
            error: message.to_owned(),
        }
    }
}
