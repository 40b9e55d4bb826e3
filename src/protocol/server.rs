use crate::Seat;
use crate::TableId;
use crate::game::GameView;
use serde::Serialize;

/// Messages sent from server to client over WebSocket.
///
/// Everything a client renders is pushed through these; there are no
/// replies to individual requests, and invalid requests produce nothing.
/// Clients self-correct by applying the next broadcast they receive.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    /// Full snapshot sent to every newly opened socket.
    LobbyState {
        users: Vec<UserEntry>,
        tables: Vec<TableEntry>,
        username: String,
    },
    /// A user entered the lobby for the first time.
    LobbyJoin { name: String },
    /// A user's grace period elapsed and they are gone.
    LobbyLeave { name: String },
    /// A table opened.
    TableCreated {
        id: TableId,
        seats: Vec<Option<String>>,
        users: Vec<String>,
        operator: String,
    },
    /// The last member left and the table is gone.
    TableDestroyed { id: TableId },
    /// A user entered a table.
    TableJoin { id: TableId, user: String },
    /// A user left a table.
    TableLeave { id: TableId, user: String },
    /// The operator role moved to another member.
    TableOperator { id: TableId, user: String },
    /// A member took a seat.
    TableSit {
        id: TableId,
        user: String,
        seat: Seat,
    },
    /// A seat was vacated.
    TableStand { id: TableId, seat: Seat },
    /// Chat line, delivered to table members only.
    TableChat { user: String, content: String },
    /// Per-viewer game state after every valid move.
    GameState(GameView),
}

/// A lobby user and their current table, as seen in the snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct UserEntry {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<TableId>,
}

/// A table's directory entry, as seen in the snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct TableEntry {
    pub id: TableId,
    pub seats: Vec<Option<String>>,
    pub users: Vec<String>,
    pub operator: String,
}

impl ServerMessage {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).expect("serialize server message")
    }
}
