use std::time::Duration;

use sqlx::{postgres::PgListener, PgPool};
use tokio::task::JoinHandle;
use tracing::Instrument;

use super::{ChangeEvent, ChangeHub};

/// Channel the `bookmarks_notify_change` trigger publishes on.
pub const CHANGE_CHANNEL: &str = "bookmark_changes";

const RECONNECT_DELAY: Duration = Duration::from_secs(1);

/// Forwards row notifications from Postgres into the hub. Runs until aborted,
/// waiting for the database to come up if it is not reachable yet.
pub fn spawn_change_listener(pool: PgPool, hub: ChangeHub) -> JoinHandle<()> {
    tokio::spawn(
        async move {
            let mut listener = loop {
                match listen(&pool).await {
                    Ok(listener) => break listener,
                    Err(error) => {
                        tracing::error!(?error, "could not listen for bookmark changes");
                        tokio::time::sleep(RECONNECT_DELAY).await;
                    }
                }
            };

            tracing::info!("listening for bookmark changes");
            loop {
                match listener.recv().await {
                    Ok(notification) => {
                        match serde_json::from_str::<ChangeEvent>(notification.payload()) {
                            Ok(event) => {
                                tracing::debug!(bookmark = %event.bookmark_id(), "bookmark changed");
                                hub.publish(event);
                            }
                            Err(error) => {
                                tracing::warn!(?error, payload = notification.payload(), "malformed change notification");
                            }
                        }
                    }
                    Err(error) => {
                        // sqlx re-establishes the connection and re-issues LISTEN on the next recv
                        tracing::error!(?error, "change listener connection lost");
                        tokio::time::sleep(RECONNECT_DELAY).await;
                    }
                }
            }
        }
        .instrument(tracing::info_span!(parent: None, "change listener")),
    )
}

async fn listen(pool: &PgPool) -> Result<PgListener, sqlx::Error> {
    let mut listener = PgListener::connect_with(pool).await?;
    listener.listen(CHANGE_CHANNEL).await?;
    Ok(listener)
}
