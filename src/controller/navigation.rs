//! Catalog search

use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::model::{DrawerFocus, WebApi};
use super::AppController;

impl AppController {
    /// Start a search for the current query in the background. Returns `None`
    /// when there is nothing to search, no token, or a search is already running.
    pub async fn perform_search(&self) -> Option<JoinHandle<()>> {
        if self.model.is_loading().await {
            tracing::debug!("Search already running");
            return None;
        }
        let query = self.model.search_query().await.trim().to_string();
        if query.is_empty() {
            return None;
        }
        let Some(api) = self.web_api().await else {
            tracing::debug!("Search ignored, not logged in");
            return None;
        };

        // Set before spawning so the next frame already shows it
        self.model.set_loading(true).await;

        let controller = self.clone();
        Some(tokio::spawn(async move {
            controller.run_search(api, &query).await;
        }))
    }

    async fn run_search(&self, api: Arc<dyn WebApi>, query: &str) {
        tracing::debug!(query, "Performing search");

        match api.search_tracks(query, self.search_limit).await {
            Ok(songs) => {
                tracing::info!(query, results = songs.len(), "Search completed");
                let has_results = !songs.is_empty();
                self.model.set_songs(songs).await;
                if has_results && self.model.focus().await == DrawerFocus::Search {
                    self.model.set_focus(DrawerFocus::Results).await;
                }
            }
            Err(e) => {
                // Previous results stay on screen
                tracing::error!(query, error = %e, "Search failed");
                self.report_api_error(&e).await;
            }
        }

        self.model.set_loading(false).await;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use tokio::sync::Notify;

    use crate::model::DrawerFocus;
    use crate::model::fixtures::track;
    use super::super::fakes::{Call, FakeApi, Harness};

    async fn search(harness: &Harness) {
        if let Some(handle) = harness.controller.perform_search().await {
            handle.await.unwrap();
        }
    }

    async fn type_query(harness: &Harness, query: &str) {
        for c in query.chars() {
            harness.model.append_to_search(c).await;
        }
    }

    #[tokio::test]
    async fn search_replaces_results() {
        let harness = Harness::logged_in(FakeApi::with_results(vec![track("1", "Get Lucky")])).await;
        harness.model.set_songs(vec![track("old", "Old")]).await;
        type_query(&harness, "  get lucky ").await;

        search(&harness).await;

        assert_eq!(harness.api.calls(), vec![Call::Search("get lucky".to_string(), 5)]);
        let songs = harness.model.songs().await;
        assert_eq!(songs.len(), 1);
        assert_eq!(songs[0].name, "Get Lucky");
        assert!(!harness.model.is_loading().await);
    }

    #[tokio::test]
    async fn empty_result_is_an_empty_list() {
        let harness = Harness::logged_in(FakeApi::with_results(vec![])).await;
        harness.model.set_songs(vec![track("old", "Old")]).await;
        type_query(&harness, "zzzzqqq").await;

        search(&harness).await;

        assert!(harness.model.songs().await.is_empty());
        assert!(harness.model.get_ui_state().await.status.is_none());
    }

    #[tokio::test]
    async fn failed_search_keeps_previous_results() {
        // No canned results: the fake answers with an error
        let harness = Harness::logged_in(FakeApi::default()).await;
        harness.model.set_songs(vec![track("old", "Old")]).await;
        type_query(&harness, "anything").await;

        search(&harness).await;

        assert_eq!(harness.model.songs().await[0].id, "old");
        assert!(!harness.model.is_loading().await);
        assert!(harness.model.get_ui_state().await.status.is_some());
    }

    #[tokio::test]
    async fn loading_is_visible_while_the_search_runs() {
        let gate = Arc::new(Notify::new());
        let harness = Harness::logged_in(FakeApi {
            search_results: Some(vec![track("1", "Get Lucky")]).into(),
            search_gate: Some(gate.clone()),
            ..Default::default()
        })
        .await;
        type_query(&harness, "get lucky").await;

        let handle = harness.controller.perform_search().await.unwrap();
        assert!(harness.model.is_loading().await);

        // A second Enter while the first search is pending is ignored
        assert!(harness.controller.perform_search().await.is_none());

        gate.notify_one();
        handle.await.unwrap();

        assert!(!harness.model.is_loading().await);
        assert_eq!(harness.model.songs().await.len(), 1);
        assert_eq!(harness.model.focus().await, DrawerFocus::Results);
        assert_eq!(harness.api.calls().len(), 1);
    }

    #[tokio::test]
    async fn unauthorized_search_ends_the_session() {
        let harness = Harness::logged_in(FakeApi {
            search_error: Some("http error: status code 401 Unauthorized".to_string()),
            ..Default::default()
        })
        .await;
        type_query(&harness, "anything").await;

        search(&harness).await;

        assert!(!harness.model.has_token().await);
        assert!(!harness.model.get_session_info().await.logged_in);
        assert!(harness.controller.web_api().await.is_none());
    }

    #[tokio::test]
    async fn blank_query_or_no_token_does_nothing() {
        let harness = Harness::logged_in(FakeApi::with_results(vec![])).await;
        type_query(&harness, "   ").await;
        search(&harness).await;
        assert!(harness.api.calls().is_empty());

        let logged_out = Harness::new(FakeApi::with_results(vec![]));
        type_query(&logged_out, "query").await;
        search(&logged_out).await;
        assert!(logged_out.api.calls().is_empty());
    }
}
