//! Publishes domain events to NATS when a server is configured.

use tracing::{debug, info, warn};

use crate::domain::DomainEvent;

#[derive(Clone, Default)]
pub struct EventPublisher {
    client: Option<async_nats::Client>,
}

impl EventPublisher {
    /// Connects to `url` if given. A failed connection disables publishing
    /// rather than failing startup.
    pub async fn connect(url: Option<&str>) -> Self {
        let Some(url) = url else { return Self::disabled() };
        match async_nats::connect(url).await {
            Ok(client) => {
                info!(%url, "publishing domain events to NATS");
                Self { client: Some(client) }
            }
            Err(e) => {
                warn!(%url, error = %e, "NATS unavailable, domain events will only be logged");
                Self::disabled()
            }
        }
    }

    pub fn disabled() -> Self { Self { client: None } }

    pub fn is_enabled(&self) -> bool { self.client.is_some() }

    pub async fn publish(&self, event: DomainEvent) {
        debug!(subject = event.subject(), ?event, "domain event");
        let Some(client) = &self.client else { return };
        let payload = match serde_json::to_vec(&event) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(subject = event.subject(), error = %e, "could not encode domain event");
                return;
            }
        };
        if let Err(e) = client.publish(event.subject().to_string(), payload.into()).await {
            warn!(subject = event.subject(), error = %e, "failed to publish domain event");
        }
    }
}
