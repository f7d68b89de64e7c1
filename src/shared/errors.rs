use serde::{Deserialize, Serialize};

/// Error codes the panel API returns in `{ "error": ... }` bodies.
///
/// These strings are part of the client contract; none of them carry store
/// paths or driver messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApiErrorCode {
    #[serde(rename = "not_found")]
    NotFound,
    #[serde(rename = "invalid_id")]
    InvalidId,
    #[serde(rename = "antfarm store unavailable")]
    StoreUnavailable,
    #[serde(rename = "unauthorized_action")]
    UnauthorizedAction,
    #[serde(rename = "antfarm command failed")]
    CommandFailed,
    #[serde(rename = "invalid_request")]
    InvalidRequest,
}

impl ApiErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::InvalidId => "invalid_id",
            Self::StoreUnavailable => "antfarm store unavailable",
            Self::UnauthorizedAction => "unauthorized_action",
            Self::CommandFailed => "antfarm command failed",
            Self::InvalidRequest => "invalid_request",
        }
    }
}

impl std::fmt::Display for ApiErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorCode,
}

impl From<ApiErrorCode> for ApiErrorBody {
    fn from(error: ApiErrorCode) -> Self {
        Self { error }
    }
}
