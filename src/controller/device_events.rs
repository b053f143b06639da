//! Device notification listener

use crate::audio::{DeviceEvent, DeviceEvents};
use super::AppController;

impl AppController {
    pub fn start_device_event_listener(&self, mut events: DeviceEvents) {
        let controller = self.clone();
        tracing::info!("Starting device event listener");

        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                if controller.model.should_quit().await {
                    tracing::debug!("Device event listener shutting down");
                    break;
                }
                controller.handle_device_event(event).await;
            }
        });
    }

    pub async fn handle_device_event(&self, event: DeviceEvent) {
        match event {
            DeviceEvent::Ready { device_id } => {
                tracing::info!(device_id = %device_id, "Device ready, transferring playback");
                self.model.set_device_id(device_id.clone()).await;

                let Some(api) = self.web_api().await else {
                    return;
                };
                // Transfer without starting playback
                if let Err(e) = api.transfer_playback(&device_id, false).await {
                    tracing::error!(device_id = %device_id, error = %e, "Playback transfer failed");
                    self.report_api_error(&e).await;
                }
            }
            DeviceEvent::StateChanged(Some(state)) => {
                tracing::debug!(paused = state.paused, "Device state changed");
                self.model.set_playing(!state.paused).await;
            }
            DeviceEvent::StateChanged(None) => {
                tracing::trace!("Device state changed without a state");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::DeviceState;
    use super::super::fakes::{Call, FakeApi, Harness};

    #[tokio::test]
    async fn ready_transfers_without_playing() {
        let harness = Harness::logged_in(FakeApi::default()).await;
        harness
            .controller
            .handle_device_event(DeviceEvent::Ready { device_id: "dev-1".to_string() })
            .await;

        assert_eq!(harness.model.device_id().await.as_deref(), Some("dev-1"));
        assert_eq!(harness.api.calls(), vec![Call::Transfer("dev-1".to_string(), false)]);
    }

    #[tokio::test]
    async fn state_changes_mirror_the_paused_flag() {
        let harness = Harness::logged_in(FakeApi::default()).await;
        let controller = &harness.controller;

        controller
            .handle_device_event(DeviceEvent::StateChanged(Some(DeviceState { paused: false })))
            .await;
        assert!(harness.model.is_playing().await);

        // A notification without state leaves the flag alone
        controller.handle_device_event(DeviceEvent::StateChanged(None)).await;
        assert!(harness.model.is_playing().await);

        controller
            .handle_device_event(DeviceEvent::StateChanged(Some(DeviceState { paused: true })))
            .await;
        assert!(!harness.model.is_playing().await);
    }

    #[tokio::test]
    async fn listener_applies_pushed_events() {
        let harness = Harness::logged_in(FakeApi::default()).await;
        let sender = harness.connector.events.lock().unwrap().clone().unwrap();

        sender
            .send(DeviceEvent::StateChanged(Some(DeviceState { paused: false })))
            .unwrap();

        for _ in 0..50 {
            if harness.model.is_playing().await {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert!(harness.model.is_playing().await);
    }
}
