//! Signed-in User Abstraction

use async_trait::async_trait;

/// Exposes the BaaS user session owned by the host application.
///
/// The username is recorded alongside each device registration so the core
/// can tell when a different user signed in on the same device.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// Username of the signed-in user, `None` when signed out.
    async fn signed_in_username(&self) -> Option<String>;

    /// Bearer token for backend calls, `None` for anonymous access.
    async fn access_token(&self) -> Option<String>;
}

/// Session provider for apps that never sign users in.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnonymousSession;

#[async_trait]
impl SessionProvider for AnonymousSession {
    async fn signed_in_username(&self) -> Option<String> {
        None
    }

    async fn access_token(&self) -> Option<String> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_anonymous_session_has_no_identity() {
        let session = AnonymousSession;
        assert_eq!(session.signed_in_username().await, None);
        assert_eq!(session.access_token().await, None);
    }
}
