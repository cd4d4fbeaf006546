use bar_core::ChangeHub;
use bar_shared::ChangeEvent;
use sqlx::postgres::{PgListener, PgNotification};
use sqlx::PgPool;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};
use tracing::{debug, error, info, warn};

use crate::error::StoreResult;

/// Notify channel the row triggers publish on.
pub const CHANGE_CHANNEL: &str = "bar_admin_changes";

/// Bridges Postgres `NOTIFY` into the in-process [`ChangeHub`].
pub struct ChangeFeed {
    handle: JoinHandle<()>,
}

impl ChangeFeed {
    /// Connects a dedicated listener connection and starts forwarding.
    pub async fn start(pool: &PgPool, hub: ChangeHub) -> StoreResult<Self> {
        let mut listener = PgListener::connect_with(pool).await?;
        listener.listen(CHANGE_CHANNEL).await?;
        info!(channel = CHANGE_CHANNEL, "Change feed listening");

        let handle = tokio::spawn(async move {
            loop {
                match listener.recv().await {
                    Ok(notification) => forward(&hub, &notification),
                    Err(e) => {
                        // PgListener reconnects on the next recv
                        error!("Change feed error: {}", e);
                        sleep(Duration::from_secs(1)).await;
                    }
                }
            }
        });

        Ok(Self { handle })
    }

    pub fn stop(self) {
        self.handle.abort();
    }
}

fn forward(hub: &ChangeHub, notification: &PgNotification) {
    match parse_payload(notification.payload()) {
        Ok(event) => {
            let delivered = hub.publish(event.clone());
            debug!(?event, delivered, "Change event published");
        }
        Err(e) => warn!(payload = notification.payload(), "Ignoring change notification: {}", e),
    }
}

pub(crate) fn parse_payload(payload: &str) -> StoreResult<ChangeEvent> {
    Ok(serde_json::from_str(payload)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use bar_shared::{ChangeKind, Collection};

    #[test]
    fn test_parse_trigger_payload() {
        let event = parse_payload(r#"{"table":"bookings","op":"DELETE"}"#).unwrap();
        assert_eq!(event.collection, Collection::Bookings);
        assert_eq!(event.kind, ChangeKind::Delete);
    }

    #[test]
    fn test_garbage_payload_is_error() {
        assert!(matches!(parse_payload("not json"), Err(StoreError::Payload(_))));
    }
}
