use crate::Seat;
use crate::TableId;
use serde::Deserialize;

/// Messages received from clients over WebSocket.
///
/// Cards, suits, and ranks travel as their wire codes and are parsed at
/// the table layer; a code that fails to parse drops that one message,
/// matching the protocol's silent-ignore error design. Unknown tags fail
/// deserialization and are likewise dropped.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    /// Open a new table with the sender as sole member and operator.
    CreateTable,
    /// Enter an existing table by id.
    JoinTable { id: TableId },
    /// Leave the current table.
    LeaveTable,
    /// Chat line scoped to the sender's table.
    TableChat { content: String },
    /// Take a numbered seat at the current table.
    TableSit { seat: Seat },
    /// Give up the held seat.
    TableStand,
    /// Deal a fresh game (operator only).
    StartGame,
    /// Play a card by wire code, e.g. `HA` or `D10`.
    PlayCard { card: String },
    /// Draw from the stock.
    DrawCard,
    /// Decline to act (ends repeats, settles draws, absorbs blocks).
    Pass,
    /// Demand a suit after playing an Ace.
    Suit { suit: String },
    /// Demand a rank after playing a Jack.
    Rank { rank: String },
}

impl ClientMessage {
    /// Room-management messages are handled by the lobby itself; everything
    /// else routes to the sender's current table.
    pub fn is_lobby(&self) -> bool {
        matches!(
            self,
            ClientMessage::CreateTable | ClientMessage::JoinTable { .. } | ClientMessage::LeaveTable
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tagged_kinds() {
        let msg: ClientMessage = serde_json::from_str(r#"{"type":"createTable"}"#).unwrap();
        assert!(matches!(msg, ClientMessage::CreateTable));
        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"joinTable","id":101}"#).unwrap();
        assert!(matches!(msg, ClientMessage::JoinTable { id: 101 }));
        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"playCard","card":"HA"}"#).unwrap();
        assert!(matches!(msg, ClientMessage::PlayCard { .. }));
    }

    #[test]
    fn rejects_unknown_tags() {
        assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"reboot"}"#).is_err());
        assert!(serde_json::from_str::<ClientMessage>("not json").is_err());
    }
}
