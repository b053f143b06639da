//! Login, Web API client setup and one-time device creation

use std::sync::Arc;

use crate::auth::AccessToken;
use crate::model::WebApi;
use super::AppController;

impl AppController {
    /// Reuse a token saved by an earlier login, if it is still accepted.
    pub async fn restore_session(&self) -> bool {
        let token = match self.tokens.load() {
            Ok(Some(token)) => token,
            Ok(None) => return false,
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring unreadable stored token");
                return false;
            }
        };

        let client = match self.login.web_api(&token).await {
            Ok(client) => client,
            Err(e) => {
                tracing::error!(error = %e, "Could not build Web API client");
                return false;
            }
        };

        match client.current_user().await {
            Ok(user) => {
                tracing::info!(user = %user, "Restored stored session");
                self.model.set_user_name(user).await;
                self.start_session(token, client).await;
                true
            }
            Err(e) => {
                tracing::info!(error = %e, "Stored token was rejected, login required");
                if let Err(e) = self.tokens.clear() {
                    tracing::warn!(error = %e, "Could not remove stored token");
                }
                false
            }
        }
    }

    /// Start the browser login in the background.
    pub async fn begin_login(&self) {
        let session = self.model.get_session_info().await;
        if session.logged_in || session.login_in_progress {
            return;
        }

        self.model.set_login_in_progress(true).await;
        self.model.set_status("Waiting for browser login...").await;

        let controller = self.clone();
        tokio::spawn(async move {
            match controller.login.login().await {
                Ok(token) => controller.complete_login(token).await,
                Err(e) => {
                    tracing::error!(error = %e, "Login failed");
                    controller.model.set_status(Self::format_error(&e)).await;
                }
            }
            controller.model.set_login_in_progress(false).await;
        });
    }

    async fn complete_login(&self, token: AccessToken) {
        if let Err(e) = self.tokens.save(&token) {
            tracing::warn!(error = %e, "Could not persist access token");
        }

        let client = match self.login.web_api(&token).await {
            Ok(client) => client,
            Err(e) => {
                tracing::error!(error = %e, "Could not build Web API client");
                self.model.set_status(Self::format_error(&e)).await;
                return;
            }
        };

        match client.current_user().await {
            Ok(user) => self.model.set_user_name(user).await,
            Err(e) => tracing::warn!(error = %e, "Could not load user profile"),
        }

        self.model.clear_status().await;
        self.start_session(token, client).await;
    }

    /// Drop the token, the Web API client and the stored record. The device
    /// stays registered and is reused after the next login.
    pub async fn end_session(&self) {
        tracing::info!("Session ended, login required");
        self.model.clear_token().await;
        *self.api.write().await = None;
        if let Err(e) = self.tokens.clear() {
            tracing::warn!(error = %e, "Could not remove stored token");
        }
    }

    /// End the session once the token's lifetime has passed.
    pub async fn expire_session_if_needed(&self) {
        let expired = self.model.token().await.is_some_and(|token| token.is_expired());
        if expired {
            self.end_session().await;
            self.model
                .set_status("Session expired. Press Enter in the drawer to log in again.")
                .await;
        }
    }

    /// Install the token and client, then bring up the device.
    pub async fn start_session(&self, token: AccessToken, api: Arc<dyn WebApi>) {
        self.model.set_token(token).await;
        *self.api.write().await = Some(api);
        self.initialize_player().await;
    }

    /// Create the playback device. Happens at most once per session.
    pub async fn initialize_player(&self) {
        let Some(token) = self.model.token().await else {
            tracing::debug!("No token yet, player not initialized");
            return;
        };
        let Some(api) = self.web_api().await else {
            tracing::debug!("No Web API client yet, player not initialized");
            return;
        };

        let mut initialized = self.player_initialized.lock().await;
        if *initialized {
            return;
        }

        match self.connector.connect(&token, api).await {
            Ok((device, events)) => {
                *initialized = true;
                *self.device.lock().await = Some(device);
                drop(initialized);
                self.start_device_event_listener(events);
                tracing::info!("Playback device created");
            }
            Err(e) => {
                tracing::error!(error = %e, "Playback device could not be created");
                self.model.set_status(Self::format_error(&e)).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use crate::auth::AccessToken;
    use super::super::fakes::{FakeApi, Harness};

    #[tokio::test]
    async fn no_device_without_token() {
        let harness = Harness::new(FakeApi::default());
        harness.controller.initialize_player().await;
        assert_eq!(*harness.connector.connects.lock().unwrap(), 0);
        assert!(harness.controller.playback_device().await.is_none());
    }

    #[tokio::test]
    async fn expired_token_ends_the_session() {
        let harness = Harness::new(FakeApi::default());
        let expired = AccessToken {
            value: "old".to_string(),
            token_type: "Bearer".to_string(),
            expires_at: Some(Utc::now() - Duration::seconds(1)),
        };
        let token_path = harness.favorite_path().with_file_name("spotify_token.json");
        std::fs::write(&token_path, serde_json::to_string(&expired).unwrap()).unwrap();
        harness.controller.start_session(expired, harness.api.clone()).await;

        harness.controller.expire_session_if_needed().await;

        assert!(!harness.model.has_token().await);
        assert!(!harness.model.get_session_info().await.logged_in);
        assert!(harness.controller.web_api().await.is_none());
        assert!(!token_path.exists());
    }

    #[tokio::test]
    async fn valid_token_is_kept() {
        let harness = Harness::logged_in(FakeApi::default()).await;
        harness.controller.expire_session_if_needed().await;
        assert!(harness.model.has_token().await);
    }

    #[tokio::test]
    async fn device_is_created_once() {
        let harness = Harness::logged_in(FakeApi::default()).await;
        harness.controller.initialize_player().await;
        harness.controller.initialize_player().await;

        assert_eq!(*harness.connector.connects.lock().unwrap(), 1);
        assert!(harness.controller.playback_device().await.is_some());
        assert!(harness.model.has_token().await);
    }
}
