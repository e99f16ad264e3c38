use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub struct RestApiError {
    pub code: RestApiErrorCode,
    pub message: String,
}

impl RestApiError {
    pub fn new(code: RestApiErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn not_found() -> Self {
        Self::new(RestApiErrorCode::NotFound, "not found")
    }

    /// Upstream couldn't be reached or answered with garbage
    pub fn proxy(details: impl fmt::Display) -> Self {
        Self::new(RestApiErrorCode::Proxy, details.to_string())
    }
}

#[derive(Debug)]
pub enum RestApiErrorCode {
    NotFound,
    Proxy,
}

impl fmt::Display for RestApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl fmt::Display for RestApiErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RestApiErrorCode::NotFound => write!(f, "not found"),
            RestApiErrorCode::Proxy => write!(f, "proxy error"),
        }
    }
}

impl RestApiErrorCode {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Proxy => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ResponseError for RestApiError {
    fn error_response(&self) -> HttpResponse {
        let body = match self.code {
            RestApiErrorCode::NotFound => json!({ "error": self.code.to_string() }),
            RestApiErrorCode::Proxy => json!({
                "error": self.code.to_string(),
                "details": self.message,
            }),
        };
        HttpResponse::build(self.status_code()).json(body)
    }

    fn status_code(&self) -> StatusCode {
        self.code.status_code()
    }
}
