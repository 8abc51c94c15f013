mod client;

use std::sync::Arc;

use axum::{
    extract::{ws::WebSocket, State, WebSocketUpgrade},
    response::Response,
    Extension,
};
use axum_extra::TypedHeader;

use crate::{auth::User, feed::Subscription, startup::ApplicationState};

use self::client::Client;

/// GET /api/feed
pub async fn feed_handler(
    ws: WebSocketUpgrade,
    user_agent: Option<TypedHeader<headers::UserAgent>>,
    State(state): State<Arc<ApplicationState>>,
    Extension(user): Extension<User>,
) -> Response {
    let user_agent = if let Some(TypedHeader(user_agent)) = user_agent {
        user_agent.to_string()
    } else {
        String::from("Unknown client")
    };

    // Subscribe before upgrading so nothing committed after the handshake is missed.
    let subscription = state.hub.subscribe(user.id);

    ws.on_upgrade(move |socket| handle_socket(socket, user, user_agent, subscription))
}

async fn handle_socket(
    socket: WebSocket,
    user: User,
    user_agent: String,
    subscription: Subscription,
) {
    let client = Client::new(user, user_agent, subscription);
    client.run(socket).await;
}
