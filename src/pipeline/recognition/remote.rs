use serde::Deserialize;

use super::types::RemoteRecognizer;
use super::RecognitionError;

/// HTTP client for an external recognition service.
///
/// Contract: POST the image bytes, receive `{ "text": "..." }` or an
/// error. Invoked only as a fallback after every local strategy came back
/// insufficient; failures here are degraded by the caller, never fatal.
pub struct HttpRecognizer {
    base_url: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

/// Response body from the remote /recognize endpoint.
#[derive(Deserialize)]
struct RecognizeResponse {
    text: String,
}

impl HttpRecognizer {
    pub fn new(base_url: &str, timeout_secs: u64) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            timeout_secs,
        }
    }
}

impl RemoteRecognizer for HttpRecognizer {
    fn recognize(&self, image_bytes: &[u8]) -> Result<String, RecognitionError> {
        let url = format!("{}/recognize", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("content-type", "application/octet-stream")
            .body(image_bytes.to_vec())
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    RecognitionError::RemoteTimeout(self.timeout_secs)
                } else {
                    RecognitionError::RemoteService(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(RecognitionError::RemoteService(format!(
                "HTTP {status}: {body}"
            )));
        }

        let parsed: RecognizeResponse = response
            .json()
            .map_err(|e| RecognitionError::RemoteService(e.to_string()))?;

        Ok(parsed.text)
    }
}

/// Mock remote recognizer for tests — configurable text or failure.
pub struct MockRemoteRecognizer {
    response: Result<String, String>,
}

impl MockRemoteRecognizer {
    pub fn with_text(text: &str) -> Self {
        Self {
            response: Ok(text.to_string()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            response: Err(message.to_string()),
        }
    }
}

impl RemoteRecognizer for MockRemoteRecognizer {
    fn recognize(&self, _image_bytes: &[u8]) -> Result<String, RecognitionError> {
        match &self.response {
            Ok(text) => Ok(text.clone()),
            Err(msg) => Err(RecognitionError::RemoteService(msg.clone())),
        }
    }
}
