//! API key authentication for callers of the gateway.
//!
//! A key is accepted when it is on the configured allow-list or starts with
//! the reserved issued-key prefix (`ak_` by default). An absent or empty key
//! never authenticates.

use reqwest::header::HeaderMap;

use relay_core::{config::AuthConfig, ChannelKind, Credential};

/// Read-only store of accepted API keys.
#[derive(Debug, Clone, Default)]
pub struct CredentialStore {
    keys: Vec<Credential>,
    prefix: String,
}

impl CredentialStore {
    pub fn new(keys: Vec<Credential>, prefix: impl Into<String>) -> Self {
        Self {
            keys: keys.into_iter().filter(Credential::is_valid).collect(),
            prefix: prefix.into(),
        }
    }

    pub fn from_config(cfg: &AuthConfig) -> Self {
        Self::new(cfg.keys.clone(), cfg.key_prefix.clone())
    }

    /// Returns `true` when `candidate` is an accepted key.
    pub fn authenticate(&self, candidate: Option<&str>) -> bool {
        self.lookup(candidate).is_some()
    }

    /// Resolve `candidate` to its credential.
    ///
    /// Prefix-matched keys resolve to a `generic`-scoped credential with no
    /// dedicated secret. The bare prefix itself is not a key.
    pub fn lookup(&self, candidate: Option<&str>) -> Option<Credential> {
        let key = candidate.filter(|k| !k.is_empty())?;

        if let Some(found) = self.keys.iter().find(|c| c.key == key) {
            return Some(found.clone());
        }

        if !self.prefix.is_empty() && key.len() > self.prefix.len() && key.starts_with(&self.prefix)
        {
            return Some(Credential {
                key: key.to_string(),
                scope: ChannelKind::Generic,
                issued_secret: None,
            });
        }

        None
    }

    /// Number of allow-listed keys (prefix-matched keys are not counted).
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Pull the caller's key from `X-API-Key`, falling back to `Authorization: Bearer <key>`.
pub fn candidate_key(headers: &HeaderMap) -> Option<&str> {
    let api_key = headers
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|k| !k.is_empty());
    if api_key.is_some() {
        return api_key;
    }

    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|k| !k.is_empty())
}

/// Key shortened for logs: first 10 characters followed by `...`.
pub fn redact(key: &str) -> String {
    let head: String = key.chars().take(10).collect();
    format!("{head}...")
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn store() -> CredentialStore {
        CredentialStore::new(
            vec![
                Credential {
                    key: "demo-webhook-key-abcde".into(),
                    scope: ChannelKind::Webhook,
                    issued_secret: None,
                },
                Credential {
                    key: "demo-integration-key-12345".into(),
                    scope: ChannelKind::Generic,
                    issued_secret: Some("integration-secret".into()),
                },
                Credential {
                    key: String::new(),
                    scope: ChannelKind::Generic,
                    issued_secret: None,
                },
            ],
            "ak_",
        )
    }

    #[test]
    fn allow_listed_keys_authenticate() {
        let s = store();
        assert!(s.authenticate(Some("demo-webhook-key-abcde")));
        let c = s.lookup(Some("demo-integration-key-12345")).unwrap();
        assert_eq!(c.issued_secret.as_deref(), Some("integration-secret"));
    }

    #[test]
    fn empty_and_absent_keys_never_authenticate() {
        let s = store();
        assert!(!s.authenticate(None));
        assert!(!s.authenticate(Some("")));
        assert_eq!(s.len(), 2, "empty configured key must be dropped");
    }

    #[test]
    fn prefixed_keys_authenticate_as_generic() {
        let s = store();
        let c = s.lookup(Some("ak_live_123")).unwrap();
        assert_eq!(c.scope, ChannelKind::Generic);
        assert!(c.issued_secret.is_none());
        assert!(!s.authenticate(Some("ak_")));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let s = store();
        for key in ["demo-webhook-key", "AK_123", "xak_123", "demo-webhook-key-abcdef", " "] {
            assert!(!s.authenticate(Some(key)), "{key:?} should be rejected");
        }
    }

    #[test]
    fn empty_prefix_disables_prefix_matching() {
        let s = CredentialStore::new(Vec::new(), "");
        assert!(!s.authenticate(Some("ak_123")));
        assert!(s.is_empty());
    }

    #[test]
    fn candidate_key_prefers_api_key_header() {
        let mut h = HeaderMap::new();
        h.insert("authorization", HeaderValue::from_static("Bearer from-bearer"));
        assert_eq!(candidate_key(&h), Some("from-bearer"));

        h.insert("x-api-key", HeaderValue::from_static("from-header"));
        assert_eq!(candidate_key(&h), Some("from-header"));
    }

    #[test]
    fn candidate_key_ignores_other_auth_schemes() {
        let mut h = HeaderMap::new();
        h.insert("authorization", HeaderValue::from_static("Basic abc"));
        assert_eq!(candidate_key(&h), None);
    }

    #[test]
    fn redact_keeps_ten_chars() {
        assert_eq!(redact("demo-webhook-key-abcde"), "demo-webho...");
        assert_eq!(redact("ak_1"), "ak_1...");
    }
}
