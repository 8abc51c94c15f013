use std::ops::ControlFlow;

use axum::extract::ws::{close_code, CloseFrame, Message, WebSocket};
use futures::{SinkExt, StreamExt};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    auth::User,
    feed::{FeedError, Subscription},
};

/// One open feed connection. Streams the user's change events until either side goes away.
#[derive(Debug)]
pub struct Client {
    id: Uuid,
    user: User,
    user_agent: String,
    subscription: Subscription,
}

impl Client {
    pub fn new(user: User, user_agent: String, subscription: Subscription) -> Self {
        Self {
            id: Uuid::new_v4(),
            user,
            user_agent,
            subscription,
        }
    }

    #[instrument(name = "feed connection", skip_all, fields(client = %self.id, user = %self.user.id, user_agent = %self.user_agent))]
    pub async fn run(mut self, socket: WebSocket) {
        tracing::info!("new client connected");
        let (mut sender, mut receiver) = socket.split();

        loop {
            tokio::select! {
                msg = receiver.next() => {
                    let Some(Ok(msg)) = msg else {
                        tracing::info!("client went away");
                        break;
                    };
                    if process_message(msg).is_break() {
                        break;
                    }
                }
                event = self.subscription.recv() => {
                    let event = match event {
                        Ok(event) => event,
                        Err(FeedError::Lagged(missed)) => {
                            tracing::warn!(missed, "client lagged behind the change feed");
                            let _ = sender
                                .send(Message::Close(Some(CloseFrame {
                                    code: close_code::AGAIN,
                                    reason: "lagged behind, refetch and resubscribe".into(),
                                })))
                                .await;
                            break;
                        }
                        Err(FeedError::Closed) => {
                            tracing::info!("change feed closed");
                            let _ = sender.send(Message::Close(None)).await;
                            break;
                        }
                    };

                    let payload = match serde_json::to_string(&event) {
                        Ok(payload) => payload,
                        Err(error) => {
                            tracing::error!(?error, "could not serialize change event");
                            continue;
                        }
                    };
                    if let Err(error) = sender.send(Message::Text(payload)).await {
                        tracing::info!(?error, "could not forward change event");
                        break;
                    }
                }
            }
        }

        tracing::info!("client disconnected");
    }
}

fn process_message(msg: Message) -> ControlFlow<(), ()> {
    match msg {
        Message::Close(c) => {
            if let Some(cf) = c {
                tracing::info!(code = %cf.code, reason = %cf.reason, "received close message");
            } else {
                tracing::warn!("somehow received close message without CloseFrame");
            }
            return ControlFlow::Break(());
        }
        Message::Pong(_) => (),
        Message::Ping(_) => (),
        // The feed is one-way; anything the client sends is ignored.
        msg => tracing::debug!(?msg, "ignoring client message"),
    }
    ControlFlow::Continue(())
}
