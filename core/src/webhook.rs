//! Webhook Emitter (C8): best-effort notification of batch completion.
//! Never fails the owning job — every error is logged and discarded.

use common::models::batch::WebhookConfig;
use common::models::webhook::WebhookPayload;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::{instrument, warn};

use crate::coordinator::BatchOutcome;
use crate::state::AppState;

const SIGNATURE_HEADER: &str = "X-Wraith-Signature";

/// Fire the webhook if the batch configured one. Swallows every failure
/// mode (non-2xx, timeout, DNS) after logging it.
#[instrument(skip(state, outcome), fields(job_id))]
pub async fn fire_if_configured(
    state: &AppState,
    webhook: Option<&WebhookConfig>,
    job_id: &str,
    status: &str,
    outcome: &BatchOutcome,
) {
    let Some(webhook) = webhook else {
        return;
    };

    let payload = WebhookPayload {
        job_id: job_id.to_string(),
        status: status.to_string(),
        stats: outcome.stats(),
        results: outcome.per_url.clone(),
        signature: None,
    };

    let body = match serde_json::to_vec(&payload) {
        Ok(b) => b,
        Err(e) => {
            warn!(job_id, error = %e, "failed to serialize webhook payload");
            return;
        }
    };

    let mut request = state
        .http_client
        .post(&webhook.url)
        .timeout(std::time::Duration::from_secs(state.config.webhook_timeout_seconds))
        .header("content-type", "application/json");

    if let Some(secret) = &state.config.webhook_signing_secret {
        if let Some(signature) = sign(secret, &body) {
            request = request.header(SIGNATURE_HEADER, signature);
        }
    }

    // Standard headers (content-type, authorization, signature) always
    // take precedence; merge the rest of the caller's headers afterward.
    for (key, value) in &webhook.headers {
        if key.eq_ignore_ascii_case("content-type")
            || key.eq_ignore_ascii_case("authorization")
            || key.eq_ignore_ascii_case(SIGNATURE_HEADER)
        {
            continue;
        }
        request = request.header(key, value);
    }

    match request.body(body).send().await {
        Ok(response) if response.status().is_success() => {}
        Ok(response) => {
            warn!(job_id, status = %response.status(), url = %webhook.url, "webhook returned non-2xx");
        }
        Err(e) => {
            warn!(job_id, url = %webhook.url, error = %e, "webhook delivery failed");
        }
    }
}

fn sign(secret: &str, body: &[u8]) -> Option<String> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(body);
    Some(hex::encode(mac.finalize().into_bytes()))
}
