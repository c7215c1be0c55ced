/// Header carrying the shared secret
pub const API_KEY_HEADER: &str = "x-api-key";

/// Single shared-secret check gating every protected endpoint.
///
/// Plain string equality: there is no hashing, no per-key identity and the
/// comparison is not constant-time.
#[derive(Clone)]
pub struct ApiKeyGuard {
    secret: Option<String>,
}

impl ApiKeyGuard {
    /// An unset or empty secret rejects every key.
    pub fn new(secret: Option<String>) -> Self {
        Self {
            secret: secret.filter(|s| !s.is_empty()),
        }
    }

    pub fn validate(&self, key: Option<&str>) -> bool {
        match (self.secret.as_deref(), key) {
            (Some(secret), Some(key)) => secret == key,
            _ => false,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.secret.is_some()
    }
}

impl std::fmt::Debug for ApiKeyGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeyGuard")
            .field("configured", &self.is_configured())
            .finish()
    }
}
