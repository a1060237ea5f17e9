//! Turn one outbound HTTP request into a [`DeliveryAttempt`].

use tracing::{debug, warn};

use relay_core::DeliveryAttempt;

/// Longest slice of an error body kept in a [`DeliveryAttempt`].
const ERROR_BODY_MAX: usize = 200;

/// Send `request` and record the outcome against `target`.
///
/// Transport errors, timeouts and non-2xx statuses all become failed
/// attempts; nothing is propagated.
pub async fn attempt_request(request: reqwest::RequestBuilder, target: &str) -> DeliveryAttempt {
    match request.send().await {
        Ok(resp) => {
            let status = resp.status().as_u16();
            if resp.status().is_success() {
                debug!(target_url = %target, status, "delivery succeeded");
                DeliveryAttempt::delivered(target, Some(status))
            } else {
                let body = resp.text().await.unwrap_or_default();
                warn!(target_url = %target, status, body = %truncate(&body), "delivery rejected");
                DeliveryAttempt::failed(target, Some(status), format!("HTTP {status}: {}", truncate(&body)))
            }
        }
        Err(e) => {
            let reason = if e.is_timeout() {
                "request timed out".to_string()
            } else {
                e.to_string()
            };
            warn!(target_url = %target, error = %reason, "delivery failed");
            DeliveryAttempt::failed(target, None, reason)
        }
    }
}

fn truncate(body: &str) -> &str {
    match body.char_indices().nth(ERROR_BODY_MAX) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}
