pub mod user;
pub use user::*;

use crate::ConnId;
use crate::GRACE_PERIOD;
use crate::TABLE_ID_BASE;
use crate::TableId;
use crate::protocol::ClientMessage;
use crate::protocol::ServerMessage;
use crate::protocol::UserEntry;
use crate::table::Table;
use std::collections::BTreeMap;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::mpsc::unbounded_channel;

/// Everything that can happen to the lobby, funneled through one channel.
///
/// Socket bridges send `Connect`/`Inbound`/`Disconnect`; grace timers send
/// `Expire` back through the lobby's own sender. One task drains the
/// channel, so all state transitions are serialized and need no locks.
#[derive(Debug)]
pub enum Command {
    /// A WebSocket opened for this username.
    Connect {
        name: String,
        conn: ConnId,
        tx: Tx,
    },
    /// A WebSocket closed.
    Disconnect { name: String, conn: ConnId },
    /// Raw text frame from a client.
    Inbound { name: String, text: String },
    /// A fully disconnected user's grace period ran out.
    Expire { name: String },
}

/// The single authority over users and tables. Spawned once per process;
/// everything else talks to it through [`Command`]s.
#[derive(Debug)]
pub struct Lobby {
    users: HashMap<String, User>,
    tables: BTreeMap<TableId, Table>,
    tx: UnboundedSender<Command>,
    grace: Duration,
}

impl Lobby {
    pub fn new() -> (Self, UnboundedSender<Command>, UnboundedReceiver<Command>) {
        let (tx, rx) = unbounded_channel();
        let lobby = Self {
            users: HashMap::new(),
            tables: BTreeMap::new(),
            tx: tx.clone(),
            grace: GRACE_PERIOD,
        };
        (lobby, tx, rx)
    }

    /// Start the lobby task and hand back its mailbox.
    pub fn spawn() -> UnboundedSender<Command> {
        let (mut lobby, tx, mut rx) = Self::new();
        tokio::spawn(async move {
            log::info!("lobby task started");
            while let Some(cmd) = rx.recv().await {
                lobby.handle(cmd);
            }
            log::info!("lobby task stopped");
        });
        tx
    }

    /// Apply one command. Synchronous by design: the run loop calls this
    /// for every command in order, and tests drive it directly.
    pub fn handle(&mut self, cmd: Command) {
        match cmd {
            Command::Connect { name, conn, tx } => self.connect(&name, conn, tx),
            Command::Disconnect { name, conn } => self.disconnect(&name, conn),
            Command::Inbound { name, text } => self.inbound(&name, &text),
            Command::Expire { name } => self.expire(&name),
        }
    }
}

impl Lobby {
    /// Adopt a socket. First socket of an unknown name creates the user and
    /// announces them; any socket gets the full lobby snapshot, and a user
    /// already at a table additionally gets a game-state resync on exactly
    /// this socket.
    fn connect(&mut self, name: &str, conn: ConnId, tx: Tx) {
        if !self.users.contains_key(name) {
            broadcast(
                self.users.values(),
                &ServerMessage::LobbyJoin {
                    name: name.to_string(),
                },
            );
            self.users.insert(name.to_string(), User::new(name));
            log::info!("[lobby] {name} joined");
        }
        let snapshot = self.snapshot(name);
        let Lobby { users, tables, .. } = self;
        let Some(user) = users.get_mut(name) else {
            return;
        };
        user.attach(conn, tx);
        user.send_to(conn, &snapshot);
        if let Some(id) = user.table() {
            user.send_to(
                conn,
                &ServerMessage::TableJoin {
                    id,
                    user: name.to_string(),
                },
            );
            if let Some(table) = tables.get_mut(&id) {
                table.join(users, name, Some(conn));
            }
        }
    }

    /// Drop a socket. When it was the user's last one, arm the grace timer
    /// instead of removing them outright, so a refresh or a brief network
    /// drop keeps their seat.
    fn disconnect(&mut self, name: &str, conn: ConnId) {
        let grace = self.grace;
        let tx = self.tx.clone();
        let Some(user) = self.users.get_mut(name) else {
            return;
        };
        user.detach(conn);
        if !user.online() {
            let name = name.to_string();
            user.schedule_removal(tokio::spawn(async move {
                tokio::time::sleep(grace).await;
                let _ = tx.send(Command::Expire { name });
            }));
        }
    }

    /// Final removal after the grace period. A user who reconnected in the
    /// meantime is left alone, even if a stale timer message slips through.
    fn expire(&mut self, name: &str) {
        let Lobby { users, tables, .. } = self;
        let Some(user) = users.get(name) else {
            return;
        };
        if user.online() {
            return;
        }
        if let Some(id) = user.table() {
            if let Some(table) = tables.get_mut(&id) {
                if table.leave(users, name) {
                    tables.remove(&id);
                }
            }
        }
        self.users.remove(name);
        broadcast(
            self.users.values(),
            &ServerMessage::LobbyLeave {
                name: name.to_string(),
            },
        );
        log::info!("[lobby] {name} left");
    }

    /// Parse and route one frame. Anything that fails to parse, or arrives
    /// from an unknown name, is dropped without a reply.
    fn inbound(&mut self, name: &str, text: &str) {
        let Ok(msg) = serde_json::from_str::<ClientMessage>(text) else {
            log::debug!("[lobby] dropping unparseable frame from {name}");
            return;
        };
        if !self.users.contains_key(name) {
            return;
        }
        match msg {
            ClientMessage::CreateTable => self.create_table(name),
            ClientMessage::JoinTable { id } => self.join_table(name, id),
            ClientMessage::LeaveTable => self.leave_table(name),
            msg => {
                let Lobby { users, tables, .. } = self;
                let Some(id) = users.get(name).and_then(User::table) else {
                    return;
                };
                if let Some(table) = tables.get_mut(&id) {
                    table.handle(users, name, &msg);
                }
            }
        }
    }

    /// Open a table with the sender as sole member and operator. A user
    /// already at a table must leave it first.
    fn create_table(&mut self, name: &str) {
        if self.users.get(name).is_none_or(|u| u.table().is_some()) {
            return;
        }
        let id = self.allocate_id();
        if let Some(user) = self.users.get_mut(name) {
            user.set_table(Some(id));
        }
        let table = Table::new(id, name);
        broadcast(
            self.users.values(),
            &ServerMessage::TableCreated {
                id,
                seats: table.seats().to_vec(),
                users: table.members().to_vec(),
                operator: table.operator().to_string(),
            },
        );
        self.tables.insert(id, table);
        log::info!("[lobby] {name} created table {id}");
    }

    fn join_table(&mut self, name: &str, id: TableId) {
        let Lobby { users, tables, .. } = self;
        let Some(user) = users.get(name) else {
            return;
        };
        if user.table().is_some() {
            return;
        }
        if let Some(table) = tables.get_mut(&id) {
            table.join(users, name, None);
        }
    }

    fn leave_table(&mut self, name: &str) {
        let Lobby { users, tables, .. } = self;
        let Some(id) = users.get(name).and_then(User::table) else {
            return;
        };
        if let Some(table) = tables.get_mut(&id) {
            if table.leave(users, name) {
                tables.remove(&id);
            }
        }
    }

    /// Smallest unused id at or above the base. Freed ids are reused.
    fn allocate_id(&self) -> TableId {
        let mut id = TABLE_ID_BASE;
        for k in self.tables.keys() {
            if *k == id {
                id += 1;
            } else if *k > id {
                break;
            }
        }
        id
    }

    fn snapshot(&self, name: &str) -> ServerMessage {
        ServerMessage::LobbyState {
            users: self
                .users
                .values()
                .map(|u| UserEntry {
                    name: u.name().to_string(),
                    table: u.table(),
                })
                .collect(),
            tables: self.tables.values().map(Table::entry).collect(),
            username: name.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::UnboundedReceiver;

    fn connect(lobby: &mut Lobby, name: &str, conn: ConnId) -> UnboundedReceiver<String> {
        let (tx, rx) = unbounded_channel();
        lobby.handle(Command::Connect {
            name: name.to_string(),
            conn,
            tx,
        });
        rx
    }

    fn say(lobby: &mut Lobby, name: &str, text: &str) {
        lobby.handle(Command::Inbound {
            name: name.to_string(),
            text: text.to_string(),
        });
    }

    fn drain(rx: &mut UnboundedReceiver<String>) -> Vec<String> {
        let mut out = Vec::new();
        while let Ok(json) = rx.try_recv() {
            out.push(json);
        }
        out
    }

    #[test]
    fn connect_delivers_a_snapshot_with_the_username() {
        let (mut lobby, _tx, _rx) = Lobby::new();
        let mut ala = connect(&mut lobby, "ala", 1);
        let msgs = drain(&mut ala);
        assert_eq!(msgs.len(), 1);
        assert!(msgs[0].contains(r#""type":"lobbyState""#));
        assert!(msgs[0].contains(r#""username":"ala""#));
    }

    #[test]
    fn a_new_name_is_announced_to_everyone_already_there() {
        let (mut lobby, _tx, _rx) = Lobby::new();
        let mut ala = connect(&mut lobby, "ala", 1);
        drain(&mut ala);
        let _ola = connect(&mut lobby, "ola", 2);
        assert!(drain(&mut ala).iter().any(|m| m.contains("lobbyJoin")));
        // A second socket of a known name is not a new user.
        let _ala2 = connect(&mut lobby, "ala", 3);
        assert!(!drain(&mut ala).iter().any(|m| m.contains("lobbyJoin")));
    }

    #[test]
    fn table_ids_start_at_the_base_and_reuse_freed_ones() {
        let (mut lobby, _tx, _rx) = Lobby::new();
        let _ala = connect(&mut lobby, "ala", 1);
        let _ola = connect(&mut lobby, "ola", 2);
        let _ula = connect(&mut lobby, "ula", 3);
        say(&mut lobby, "ala", r#"{"type":"createTable"}"#);
        say(&mut lobby, "ola", r#"{"type":"createTable"}"#);
        assert_eq!(
            lobby.tables.keys().copied().collect::<Vec<_>>(),
            vec![100, 101]
        );
        say(&mut lobby, "ala", r#"{"type":"leaveTable"}"#);
        say(&mut lobby, "ula", r#"{"type":"createTable"}"#);
        assert_eq!(
            lobby.tables.keys().copied().collect::<Vec<_>>(),
            vec![100, 101]
        );
        assert_eq!(lobby.tables[&100].operator(), "ula");
    }

    #[test]
    fn one_table_per_user() {
        let (mut lobby, _tx, _rx) = Lobby::new();
        let _ala = connect(&mut lobby, "ala", 1);
        say(&mut lobby, "ala", r#"{"type":"createTable"}"#);
        say(&mut lobby, "ala", r#"{"type":"createTable"}"#);
        assert_eq!(lobby.tables.len(), 1);
        let _ola = connect(&mut lobby, "ola", 2);
        say(&mut lobby, "ola", r#"{"type":"createTable"}"#);
        say(&mut lobby, "ola", r#"{"type":"joinTable","id":100}"#);
        assert_eq!(lobby.tables[&100].members(), &["ala"]);
    }

    #[test]
    fn joining_a_missing_table_is_a_no_op() {
        let (mut lobby, _tx, _rx) = Lobby::new();
        let mut ala = connect(&mut lobby, "ala", 1);
        drain(&mut ala);
        say(&mut lobby, "ala", r#"{"type":"joinTable","id":777}"#);
        assert!(drain(&mut ala).is_empty());
        assert_eq!(lobby.users["ala"].table(), None);
    }

    #[test]
    fn unparseable_frames_are_dropped() {
        let (mut lobby, _tx, _rx) = Lobby::new();
        let mut ala = connect(&mut lobby, "ala", 1);
        drain(&mut ala);
        say(&mut lobby, "ala", "garbage");
        say(&mut lobby, "ala", r#"{"type":"selfDestruct"}"#);
        assert!(drain(&mut ala).is_empty());
    }

    #[test]
    fn game_moves_route_to_the_senders_table() {
        let (mut lobby, _tx, _rx) = Lobby::new();
        let mut ala = connect(&mut lobby, "ala", 1);
        let _ola = connect(&mut lobby, "ola", 2);
        say(&mut lobby, "ala", r#"{"type":"createTable"}"#);
        say(&mut lobby, "ola", r#"{"type":"joinTable","id":100}"#);
        say(&mut lobby, "ala", r#"{"type":"tableSit","seat":0}"#);
        say(&mut lobby, "ola", r#"{"type":"tableSit","seat":1}"#);
        drain(&mut ala);
        say(&mut lobby, "ala", r#"{"type":"startGame"}"#);
        assert!(drain(&mut ala).iter().any(|m| m.contains("gameState")));
        // A member of no table cannot move.
        let mut ula = connect(&mut lobby, "ula", 3);
        drain(&mut ula);
        say(&mut lobby, "ula", r#"{"type":"drawCard"}"#);
        assert!(drain(&mut ula).is_empty());
    }

    #[tokio::test]
    async fn a_lapsed_grace_period_removes_the_user_and_their_seat() {
        let (mut lobby, _tx, mut rx) = Lobby::new();
        lobby.grace = Duration::from_millis(10);
        let _ala = connect(&mut lobby, "ala", 1);
        let mut ola = connect(&mut lobby, "ola", 2);
        say(&mut lobby, "ala", r#"{"type":"createTable"}"#);
        say(&mut lobby, "ola", r#"{"type":"joinTable","id":100}"#);
        say(&mut lobby, "ala", r#"{"type":"tableSit","seat":0}"#);
        lobby.handle(Command::Disconnect {
            name: "ala".to_string(),
            conn: 1,
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        while let Ok(cmd) = rx.try_recv() {
            lobby.handle(cmd);
        }
        assert!(!lobby.users.contains_key("ala"));
        assert!(lobby.tables[&100].seats()[0].is_none());
        assert_eq!(lobby.tables[&100].operator(), "ola");
        let msgs = drain(&mut ola);
        assert!(msgs.iter().any(|m| m.contains("tableLeave")));
        assert!(msgs.iter().any(|m| m.contains("lobbyLeave")));
    }

    #[tokio::test]
    async fn reconnecting_within_grace_keeps_the_seat() {
        let (mut lobby, _tx, mut rx) = Lobby::new();
        lobby.grace = Duration::from_millis(30);
        let _ala = connect(&mut lobby, "ala", 1);
        say(&mut lobby, "ala", r#"{"type":"createTable"}"#);
        say(&mut lobby, "ala", r#"{"type":"tableSit","seat":2}"#);
        lobby.handle(Command::Disconnect {
            name: "ala".to_string(),
            conn: 1,
        });
        let mut ala = connect(&mut lobby, "ala", 2);
        tokio::time::sleep(Duration::from_millis(80)).await;
        while let Ok(cmd) = rx.try_recv() {
            lobby.handle(cmd);
        }
        assert!(lobby.users.contains_key("ala"));
        assert_eq!(lobby.tables[&100].seats()[2].as_deref(), Some("ala"));
        let msgs = drain(&mut ala);
        assert!(
            msgs.iter().any(|m| m.contains("lobbyState")),
            "reconnect gets a fresh snapshot"
        );
        assert!(
            msgs.iter().any(|m| m.contains("tableJoin")),
            "reconnect is told which table it is in"
        );
        assert!(
            msgs.iter().any(|m| m.contains("gameState")),
            "reconnect resyncs the game"
        );
    }

    #[tokio::test]
    async fn the_last_member_expiring_destroys_the_table() {
        let (mut lobby, _tx, mut rx) = Lobby::new();
        lobby.grace = Duration::from_millis(10);
        let _ala = connect(&mut lobby, "ala", 1);
        say(&mut lobby, "ala", r#"{"type":"createTable"}"#);
        lobby.handle(Command::Disconnect {
            name: "ala".to_string(),
            conn: 1,
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        while let Ok(cmd) = rx.try_recv() {
            lobby.handle(cmd);
        }
        assert!(lobby.tables.is_empty());
        assert!(lobby.users.is_empty());
    }
}
