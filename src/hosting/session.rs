use crate::ConnId;
use crate::lobby::Command;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::mpsc::unbounded_channel;

/// Admits WebSocket connections into the lobby. Hands each socket a fresh
/// connection id and spawns the task that pumps frames between the socket
/// and the lobby's command channel.
pub struct Gate {
    lobby: UnboundedSender<Command>,
    count: AtomicU64,
}

impl Gate {
    pub fn new(lobby: UnboundedSender<Command>) -> Self {
        Self {
            lobby,
            count: AtomicU64::new(1),
        }
    }

    /// Spawns the bridge task for one socket. Outbound lobby messages take
    /// priority over inbound frames; either side closing tears the bridge
    /// down, and the lobby hears about it exactly once.
    pub fn bridge(&self, name: String, mut session: actix_ws::Session, mut stream: actix_ws::MessageStream) {
        use futures::StreamExt;
        let conn: ConnId = self.count.fetch_add(1, Ordering::Relaxed);
        let lobby = self.lobby.clone();
        let (tx, mut rx) = unbounded_channel::<String>();
        let _ = lobby.send(Command::Connect {
            name: name.clone(),
            conn,
            tx,
        });
        log::info!("socket {conn} opened for {name}");
        actix_web::rt::spawn(async move {
            'sesh: loop {
                tokio::select! {
                    biased;
                    msg = rx.recv() => match msg {
                        Some(json) => if session.text(json).await.is_err() { break 'sesh },
                        None => break 'sesh,
                    },
                    msg = stream.next() => match msg {
                        Some(Ok(actix_ws::Message::Text(text))) => if lobby.send(Command::Inbound { name: name.clone(), text: text.to_string() }).is_err() { break 'sesh },
                        Some(Ok(actix_ws::Message::Close(_))) => break 'sesh,
                        Some(Err(_)) => break 'sesh,
                        None => break 'sesh,
                        _ => continue 'sesh,
                    },
                }
            }
            let _ = lobby.send(Command::Disconnect { name, conn });
            log::info!("socket {conn} closed");
        });
    }
}
