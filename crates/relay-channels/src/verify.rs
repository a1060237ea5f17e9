//! Inbound signature checks, one scheme per channel.
//!
//! - WhatsApp: `X-Hub-Signature-256: sha256=<hex>` over the raw body, keyed
//!   with the app secret. A missing header always fails.
//! - Generic webhook: `X-Webhook-Signature: sha256=<hex>`, optional. Keyed
//!   with the credential's own secret, the configured webhook secret, or
//!   `<api key>_secret`, in that order.
//! - Telegram: no signature. Authenticity rests on the secrecy of the
//!   webhook URL, which is a weaker guarantee than the other channels get.

use hmac::{Hmac, Mac};
use reqwest::header::HeaderMap;
use sha2::Sha256;
use tracing::{debug, warn};

use relay_core::{config::RelayConfig, ChannelKind, Credential};

type HmacSha256 = Hmac<Sha256>;

pub const WHATSAPP_SIGNATURE_HEADER: &str = "x-hub-signature-256";
pub const WEBHOOK_SIGNATURE_HEADER: &str = "x-webhook-signature";

/// Per-channel signature verification, configured once at start-up.
#[derive(Debug, Clone, Default)]
pub struct SignatureVerifier {
    whatsapp_app_secret: Option<String>,
    webhook_secret: Option<String>,
    insecure_skip: bool,
}

impl SignatureVerifier {
    pub fn new(
        whatsapp_app_secret: Option<String>,
        webhook_secret: Option<String>,
        insecure_skip: bool,
    ) -> Self {
        Self {
            whatsapp_app_secret: whatsapp_app_secret.filter(|s| !s.is_empty()),
            webhook_secret: webhook_secret.filter(|s| !s.is_empty()),
            insecure_skip,
        }
    }

    pub fn from_config(cfg: &RelayConfig) -> Self {
        Self::new(
            cfg.channels
                .whatsapp
                .as_ref()
                .and_then(|w| w.app_secret.clone()),
            cfg.channels.webhook.secret.clone(),
            cfg.gateway.insecure_skip_signatures,
        )
    }

    /// Check that `body` was sent by the claimed channel or an authorized caller.
    pub fn verify(
        &self,
        channel: ChannelKind,
        body: &[u8],
        headers: &HeaderMap,
        credential: Option<&Credential>,
    ) -> bool {
        match channel {
            ChannelKind::Whatsapp => self.verify_whatsapp(body, headers),
            ChannelKind::Webhook | ChannelKind::Generic => {
                self.verify_webhook(body, headers, credential)
            }
            ChannelKind::Telegram => true,
        }
    }

    fn verify_whatsapp(&self, body: &[u8], headers: &HeaderMap) -> bool {
        let Some(header) = header_str(headers, WHATSAPP_SIGNATURE_HEADER) else {
            warn!("whatsapp: missing X-Hub-Signature-256 header");
            return false;
        };

        let Some(secret) = self.whatsapp_app_secret.as_deref() else {
            if self.insecure_skip {
                warn!("whatsapp: app secret not configured, accepting unverified payload (insecure mode)");
                return true;
            }
            warn!("whatsapp: app secret not configured, rejecting payload");
            return false;
        };

        match check_hmac_sha256(body, header, secret) {
            Ok(()) => true,
            Err(reason) => {
                warn!(reason, "whatsapp: signature verification failed");
                false
            }
        }
    }

    fn verify_webhook(
        &self,
        body: &[u8],
        headers: &HeaderMap,
        credential: Option<&Credential>,
    ) -> bool {
        let Some(header) = header_str(headers, WEBHOOK_SIGNATURE_HEADER) else {
            debug!("webhook: no signature header, skipping verification");
            return true;
        };

        let Some(secret) = self.webhook_secret_for(credential) else {
            warn!("webhook: signature present but no credential to derive a secret from");
            return false;
        };

        match check_hmac_sha256(body, header, &secret) {
            Ok(()) => true,
            Err(reason) => {
                warn!(reason, "webhook: signature verification failed");
                false
            }
        }
    }

    /// Signing secret for a generic webhook caller.
    pub fn webhook_secret_for(&self, credential: Option<&Credential>) -> Option<String> {
        if let Some(secret) = credential
            .and_then(|c| c.issued_secret.as_deref())
            .filter(|s| !s.is_empty())
        {
            return Some(secret.to_string());
        }
        if let Some(secret) = &self.webhook_secret {
            return Some(secret.clone());
        }
        credential
            .filter(|c| c.is_valid())
            .map(|c| format!("{}_secret", c.key))
    }
}

/// Verify `sha256=<hex>` against HMAC-SHA256 of `body`. Comparison is constant-time.
pub fn check_hmac_sha256(body: &[u8], header: &str, secret: &str) -> Result<(), &'static str> {
    let sig_hex = header
        .strip_prefix("sha256=")
        .ok_or("signature header must start with sha256=")?;

    let expected = hex::decode(sig_hex).map_err(|_| "signature is not valid hex")?;

    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| "invalid HMAC key length")?;
    mac.update(body);

    mac.verify_slice(&expected)
        .map_err(|_| "HMAC signature mismatch")
}

/// Compute the `sha256=<hex>` header value for `body`.
pub fn sign_sha256(body: &[u8], secret: &str) -> String {
    // HMAC accepts keys of any length, so construction cannot fail.
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => return String::new(),
    };
    mac.update(body);
    format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
