use std::{thread, time::Duration};

use rand::{thread_rng, Rng};
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::StatusCode;

use crate::error::{CoreError, Result};

pub const MAX_RETRIES: usize = 3;
const BASE_DELAY_MS: u64 = 800;

pub fn client(timeout_secs: u64) -> Result<Client> {
    Ok(Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()?)
}

fn backoff(attempt: usize) -> Duration {
    let jitter: u64 = thread_rng().gen_range(0..200);
    let ms = BASE_DELAY_MS * (2_u64.pow(attempt as u32)) + jitter;
    Duration::from_millis(ms)
}

/// Sends the request built by `build`, retrying transport errors and transient
/// HTTP statuses. Returns the response body of the first successful attempt.
pub fn send_with_retry<F>(build: F) -> Result<String>
where
    F: Fn() -> RequestBuilder,
{
    let mut last_err: Option<CoreError> = None;

    for attempt in 0..MAX_RETRIES {
        let last_attempt = attempt + 1 == MAX_RETRIES;

        match build().send() {
            Ok(resp) => {
                let status = resp.status();

                // read as text first so the error body survives a non-JSON reply
                let text = match resp.text() {
                    Ok(t) => t,
                    Err(err) => {
                        last_err = Some(err.into());
                        if !last_attempt {
                            thread::sleep(backoff(attempt));
                        }
                        continue;
                    }
                };

                if status.is_success() {
                    return Ok(text);
                }

                last_err = Some(CoreError::Service {
                    status: status.as_u16(),
                    message: extract_error_message(&text),
                });

                if should_retry_http(status) && !last_attempt {
                    log::debug!("[HTTP] {} on attempt {}, retrying", status, attempt + 1);
                    thread::sleep(backoff(attempt));
                    continue;
                }
                break;
            }
            Err(err) => {
                log::debug!("[HTTP] transport error on attempt {}: {}", attempt + 1, err);
                last_err = Some(err.into());
                if !last_attempt {
                    thread::sleep(backoff(attempt));
                }
            }
        }
    }

    Err(last_err.unwrap_or_else(|| CoreError::invalid_response("no response")))
}

pub fn should_retry_http(status: StatusCode) -> bool {
    status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::TOO_MANY_REQUESTS
        || status.is_server_error()
}

/// Message from `{ "error": { "message": .. } }` or `{ "message": .. }`, else the body.
pub fn extract_error_message(body_text: &str) -> String {
    if let Ok(v) = serde_json::from_str::<serde_json::Value>(body_text) {
        if let Some(msg) = v
            .get("error")
            .and_then(|e| e.get("message"))
            .and_then(|m| m.as_str())
        {
            return msg.to_string();
        }
        if let Some(msg) = v.get("message").and_then(|m| m.as_str()) {
            return msg.to_string();
        }
    }

    let trimmed = body_text.trim();
    if trimmed.chars().count() > 400 {
        let snippet: String = trimmed.chars().take(400).collect();
        format!("{snippet}...")
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_statuses() {
        assert!(should_retry_http(StatusCode::TOO_MANY_REQUESTS));
        assert!(should_retry_http(StatusCode::REQUEST_TIMEOUT));
        assert!(should_retry_http(StatusCode::BAD_GATEWAY));
        assert!(!should_retry_http(StatusCode::UNAUTHORIZED));
        assert!(!should_retry_http(StatusCode::BAD_REQUEST));
    }

    #[test]
    fn error_message_from_json_shapes() {
        assert_eq!(
            extract_error_message(r#"{"error":{"code":401000,"message":"bad key"}}"#),
            "bad key"
        );
        assert_eq!(extract_error_message(r#"{"message":"quota"}"#), "quota");
        assert_eq!(extract_error_message("  plain failure \n"), "plain failure");
    }

    #[test]
    fn long_bodies_are_truncated() {
        let body = "x".repeat(1000);
        let msg = extract_error_message(&body);
        assert_eq!(msg.len(), 403);
        assert!(msg.ends_with("..."));
    }

    #[test]
    fn backoff_grows() {
        assert!(backoff(0) < Duration::from_millis(1000));
        assert!(backoff(2) >= Duration::from_millis(3200));
    }
}
