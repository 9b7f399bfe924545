use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{service} request failed ({status}): {body}")]
    Status {
        service: &'static str,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Failed to decode {service} response: {reason}")]
    Decode {
        service: &'static str,
        reason: String,
    },

    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Missing configuration: {0}")]
    MissingConfig(&'static str),

    #[error("{service} has no result for '{part_number}'")]
    NotFound {
        service: &'static str,
        part_number: String,
    },

    #[error("Not connected to the InvenTree server")]
    NotConnected,
}

pub type Result<T> = std::result::Result<T, ApiError>;

impl ApiError {
    pub(crate) fn decode(service: &'static str, reason: impl ToString) -> Self {
        ApiError::Decode {
            service,
            reason: reason.to_string(),
        }
    }
}

/// Turn a non-success response into `ApiError::Status`, keeping the body for diagnostics.
pub(crate) fn check_status(
    service: &'static str,
    response: reqwest::blocking::Response,
) -> Result<reqwest::blocking::Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response.text().unwrap_or_default();
    Err(ApiError::Status {
        service,
        status,
        body,
    })
}
