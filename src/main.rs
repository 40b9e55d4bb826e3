//! Makao Lobby Server Binary
//!
//! Runs the HTTP server hosting the game lobby.
//! Clients connect over WebSocket at `/ws?user=<name>`.

use makao::*;

#[tokio::main]
async fn main() {
    log();
    hosting::Server::run().await.unwrap();
}
