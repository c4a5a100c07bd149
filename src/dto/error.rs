use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Body returned with every non-2xx JSON response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    /// Human-readable reason, safe to show to end users.
    pub error: String,
}

impl ErrorBody {
    /// Body carrying `error` as its reason.
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
