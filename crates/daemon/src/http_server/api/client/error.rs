use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
    #[error("HTTP status {0}: {}", body_message(.1))]
    HttpStatus(StatusCode, String),
}

impl ApiError {
    /// The `msg` field of a JSON error body, or the raw body text.
    pub fn server_message(&self) -> Option<String> {
        match self {
            ApiError::HttpStatus(_, body) => Some(body_message(body)),
            _ => None,
        }
    }
}

fn body_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("msg").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_message_prefers_json_msg() {
        let err = ApiError::HttpStatus(
            StatusCode::CONFLICT,
            r#"{"kind":"conflict","msg":"an upload named 'report' already exists"}"#.to_string(),
        );
        assert_eq!(
            err.server_message().unwrap(),
            "an upload named 'report' already exists"
        );

        let err = ApiError::HttpStatus(StatusCode::BAD_GATEWAY, "upstream down".to_string());
        assert_eq!(err.server_message().unwrap(), "upstream down");
        assert_eq!(err.to_string(), "HTTP status 502 Bad Gateway: upstream down");
    }
}
