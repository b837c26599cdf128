use async_trait::async_trait;
use secrecy::SecretString;

/// Supplies the bearer token for outgoing requests. A failure here is not
/// fatal: the transport logs it at debug and sends the request
/// unauthenticated, letting the server's 401 drive the user-facing error.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn bearer_token(&self) -> anyhow::Result<Option<SecretString>>;
}

/// A fixed token, for CLI use and tests.
pub struct StaticToken(SecretString);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(SecretString::from(token.into()))
    }
}

#[async_trait]
impl TokenProvider for StaticToken {
    async fn bearer_token(&self) -> anyhow::Result<Option<SecretString>> {
        Ok(Some(self.0.clone()))
    }
}

/// No authentication at all.
pub struct NoAuth;

#[async_trait]
impl TokenProvider for NoAuth {
    async fn bearer_token(&self) -> anyhow::Result<Option<SecretString>> {
        Ok(None)
    }
}
