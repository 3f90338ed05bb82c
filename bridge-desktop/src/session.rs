//! In-process session holder

use async_trait::async_trait;
use bridge_traits::session::SessionProvider;
use tokio::sync::RwLock;

#[derive(Debug, Default, Clone)]
struct SessionState {
    username: Option<String>,
    access_token: Option<String>,
}

/// Session provider for desktop hosts that manage sign-in themselves and
/// push the resulting identity into the core.
#[derive(Debug, Default)]
pub struct StaticSessionProvider {
    state: RwLock<SessionState>,
}

impl StaticSessionProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a signed-in user.
    pub async fn sign_in(&self, username: impl Into<String>, access_token: Option<String>) {
        let mut state = self.state.write().await;
        state.username = Some(username.into());
        state.access_token = access_token;
    }

    pub async fn sign_out(&self) {
        *self.state.write().await = SessionState::default();
    }
}

#[async_trait]
impl SessionProvider for StaticSessionProvider {
    async fn signed_in_username(&self) -> Option<String> {
        self.state.read().await.username.clone()
    }

    async fn access_token(&self) -> Option<String> {
        self.state.read().await.access_token.clone()
    }
}
