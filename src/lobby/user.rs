use crate::ConnId;
use crate::TableId;
use crate::protocol::ServerMessage;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

/// Outbound half of one WebSocket connection. Sends are fire-and-forget:
/// a closed receiver means the bridge is gone and the send is skipped.
pub type Tx = UnboundedSender<String>;

/// One logical user: a unique name with however many open sockets they
/// currently hold (several browser tabs are one user). The record survives
/// a full disconnect for the grace period, keeping table membership and
/// seat across brief network interruptions.
#[derive(Debug)]
pub struct User {
    name: String,
    sockets: Vec<(ConnId, Tx)>,
    table: Option<TableId>,
    removal: Option<JoinHandle<()>>,
}

impl User {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sockets: Vec::new(),
            table: None,
            removal: None,
        }
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn table(&self) -> Option<TableId> {
        self.table
    }
    pub fn set_table(&mut self, id: Option<TableId>) {
        self.table = id;
    }
    pub fn online(&self) -> bool {
        !self.sockets.is_empty()
    }
    /// Adopt a new socket. Any pending removal is cancelled first, before
    /// any other state is touched.
    pub fn attach(&mut self, conn: ConnId, tx: Tx) {
        self.cancel_removal();
        self.sockets.push((conn, tx));
    }
    pub fn detach(&mut self, conn: ConnId) {
        self.sockets.retain(|(id, _)| *id != conn);
    }
    /// Arm the grace-period timer, replacing any previous one.
    pub fn schedule_removal(&mut self, handle: JoinHandle<()>) {
        self.cancel_removal();
        self.removal = Some(handle);
    }
    pub fn cancel_removal(&mut self) {
        if let Some(handle) = self.removal.take() {
            handle.abort();
        }
    }
    /// Best-effort delivery to every open socket of this user.
    pub fn send(&self, msg: &ServerMessage) {
        self.send_json(&msg.to_json());
    }
    /// Best-effort delivery to one specific socket of this user.
    pub fn send_to(&self, conn: ConnId, msg: &ServerMessage) {
        if let Some((_, tx)) = self.sockets.iter().find(|(id, _)| *id == conn) {
            let _ = tx.send(msg.to_json());
        }
    }
    pub fn send_json(&self, json: &str) {
        for (_, tx) in &self.sockets {
            let _ = tx.send(json.to_string());
        }
    }
}

impl Drop for User {
    fn drop(&mut self) {
        self.cancel_removal();
    }
}

/// Best-effort fan-out of one message to every socket of every given user.
pub fn broadcast<'a>(users: impl IntoIterator<Item = &'a User>, msg: &ServerMessage) {
    let json = msg.to_json();
    for user in users {
        user.send_json(&json);
    }
}
