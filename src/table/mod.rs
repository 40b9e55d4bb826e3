use crate::ConnId;
use crate::SEATS;
use crate::Seat;
use crate::TableId;
use crate::cards::Card;
use crate::cards::Rank;
use crate::cards::Suit;
use crate::game::GameView;
use crate::game::Makao;
use crate::lobby::User;
use crate::lobby::broadcast;
use crate::protocol::ClientMessage;
use crate::protocol::ServerMessage;
use crate::protocol::TableEntry;
use std::collections::HashMap;

/// One game room: membership, seating, the operator role, and the scope
/// of its broadcasts. Owns the room's [`Makao`] engine.
///
/// Membership and seating are distinct: a member without a seat is a
/// spectator, and a seat may only hold a member's name, each name in at
/// most one seat. Members keep join order, so operator promotion on
/// departure is deterministic (earliest-joined remaining member).
///
/// Room structure (join/leave/sit/stand/operator) is broadcast lobby-wide
/// so waiting players can watch tables fill up; chat and game state go to
/// members only.
#[derive(Debug)]
pub struct Table {
    id: TableId,
    members: Vec<String>,
    seats: Vec<Option<String>>,
    operator: String,
    game: Makao,
}

impl Table {
    pub fn new(id: TableId, founder: &str) -> Self {
        Self {
            id,
            members: vec![founder.to_string()],
            seats: vec![None; SEATS],
            operator: founder.to_string(),
            game: Makao::default(),
        }
    }
    pub fn id(&self) -> TableId {
        self.id
    }
    pub fn operator(&self) -> &str {
        &self.operator
    }
    pub fn members(&self) -> &[String] {
        &self.members
    }
    pub fn seats(&self) -> &[Option<String>] {
        &self.seats
    }
    pub fn is_member(&self, name: &str) -> bool {
        self.members.iter().any(|m| m == name)
    }
    pub fn seat_of(&self, name: &str) -> Option<Seat> {
        self.seats
            .iter()
            .position(|s| s.as_deref() == Some(name))
    }
    /// Directory entry for lobby snapshots.
    pub fn entry(&self) -> TableEntry {
        TableEntry {
            id: self.id,
            seats: self.seats.clone(),
            users: self.members.clone(),
            operator: self.operator.clone(),
        }
    }
}

impl Table {
    /// Idempotent membership add, then a game-state resync to the joining
    /// user (to one specific socket on reconnect, else to all of theirs).
    /// The join itself is announced lobby-wide; the resync makes a new
    /// join and a reconnect look identical to the member.
    pub fn join(&mut self, users: &mut HashMap<String, User>, name: &str, conn: Option<ConnId>) {
        if !self.is_member(name) {
            self.members.push(name.to_string());
            if let Some(user) = users.get_mut(name) {
                user.set_table(Some(self.id));
            }
            broadcast(
                users.values(),
                &ServerMessage::TableJoin {
                    id: self.id,
                    user: name.to_string(),
                },
            );
            log::info!("[table {}] {} joined", self.id, name);
        }
        self.send_state(users, name, conn);
    }

    /// Remove a member, vacating their seat and reassigning the operator
    /// role if needed. Returns true when the table emptied and must be
    /// dropped from the lobby registry.
    pub fn leave(&mut self, users: &mut HashMap<String, User>, name: &str) -> bool {
        let Some(at) = self.members.iter().position(|m| m == name) else {
            return false;
        };
        self.members.remove(at);
        if let Some(seat) = self.seat_of(name) {
            self.seats[seat] = None;
        }
        if let Some(user) = users.get_mut(name) {
            user.set_table(None);
        }
        broadcast(
            users.values(),
            &ServerMessage::TableLeave {
                id: self.id,
                user: name.to_string(),
            },
        );
        log::info!("[table {}] {} left", self.id, name);
        if self.members.is_empty() {
            broadcast(users.values(), &ServerMessage::TableDestroyed { id: self.id });
            log::info!("[table {}] destroyed", self.id);
            return true;
        }
        if self.operator == name {
            self.operator = self.members[0].clone();
            broadcast(
                users.values(),
                &ServerMessage::TableOperator {
                    id: self.id,
                    user: self.operator.clone(),
                },
            );
            log::info!("[table {}] operator is now {}", self.id, self.operator);
        }
        false
    }

    /// Route a non-lobby message from a member: table concerns here,
    /// everything else into the game engine.
    pub fn handle(&mut self, users: &mut HashMap<String, User>, name: &str, msg: &ClientMessage) {
        match msg {
            ClientMessage::TableChat { content } => self.chat(users, name, content),
            ClientMessage::TableSit { seat } => self.sit(users, name, *seat),
            ClientMessage::TableStand => self.stand(users, name),
            _ => self.game(users, name, msg),
        }
    }

    /// Take a free seat. Rejected silently when the seat is occupied, out
    /// of range, or the member already sits elsewhere.
    fn sit(&mut self, users: &HashMap<String, User>, name: &str, seat: Seat) {
        if !self.is_member(name) || seat >= self.seats.len() {
            return;
        }
        if self.seats[seat].is_some() || self.seat_of(name).is_some() {
            return;
        }
        self.seats[seat] = Some(name.to_string());
        broadcast(
            users.values(),
            &ServerMessage::TableSit {
                id: self.id,
                user: name.to_string(),
                seat,
            },
        );
    }

    fn stand(&mut self, users: &HashMap<String, User>, name: &str) {
        let Some(seat) = self.seat_of(name) else {
            return;
        };
        self.seats[seat] = None;
        broadcast(
            users.values(),
            &ServerMessage::TableStand { id: self.id, seat },
        );
    }

    /// Chat stays within the room.
    fn chat(&self, users: &HashMap<String, User>, name: &str, content: &str) {
        let msg = ServerMessage::TableChat {
            user: name.to_string(),
            content: content.to_string(),
        };
        broadcast(self.member_users(users), &msg);
    }

    /// Game moves: validate the actor's seat, parse wire codes, and let
    /// the engine accept or silently reject. Only accepted moves are
    /// rebroadcast; clients resync from the next state they see.
    fn game(&mut self, users: &HashMap<String, User>, name: &str, msg: &ClientMessage) {
        let changed = match msg {
            ClientMessage::StartGame => {
                name == self.operator && {
                    let occupied = (0..self.seats.len())
                        .filter(|s| self.seats[*s].is_some())
                        .collect::<Vec<_>>();
                    self.game.start(occupied)
                }
            }
            ClientMessage::PlayCard { card } => match (self.seat_of(name), Card::try_from(card.as_str())) {
                (Some(seat), Ok(card)) => self.game.play(seat, card),
                _ => false,
            },
            ClientMessage::DrawCard => match self.seat_of(name) {
                Some(seat) => self.game.draw(seat),
                None => false,
            },
            ClientMessage::Pass => match self.seat_of(name) {
                Some(seat) => self.game.pass(seat),
                None => false,
            },
            ClientMessage::Suit { suit } => match (self.seat_of(name), Suit::try_from(suit.as_str())) {
                (Some(seat), Ok(suit)) => self.game.demand_suit(seat, suit),
                _ => false,
            },
            ClientMessage::Rank { rank } => match (self.seat_of(name), Rank::try_from(rank.as_str())) {
                (Some(seat), Ok(rank)) => self.game.demand_rank(seat, rank),
                _ => false,
            },
            _ => false,
        };
        if changed {
            self.broadcast_state(users);
        }
    }

    /// Push each member their own view of the game.
    fn broadcast_state(&self, users: &HashMap<String, User>) {
        for name in &self.members {
            self.send_state(users, name, None);
        }
    }

    fn send_state(&self, users: &HashMap<String, User>, name: &str, conn: Option<ConnId>) {
        let Some(user) = users.get(name) else {
            return;
        };
        let msg = ServerMessage::GameState(GameView::of(&self.game, self.seat_of(name)));
        match conn {
            Some(conn) => user.send_to(conn, &msg),
            None => user.send(&msg),
        }
    }

    fn member_users<'a>(
        &'a self,
        users: &'a HashMap<String, User>,
    ) -> impl Iterator<Item = &'a User> {
        self.members.iter().filter_map(|name| users.get(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::UnboundedReceiver;
    use tokio::sync::mpsc::unbounded_channel;

    fn roster(names: &[&str]) -> (HashMap<String, User>, Vec<UnboundedReceiver<String>>) {
        let mut users = HashMap::new();
        let mut inboxes = Vec::new();
        for (i, name) in names.iter().enumerate() {
            let mut user = User::new(*name);
            let (tx, rx) = unbounded_channel();
            user.attach(i as u64, tx);
            users.insert(name.to_string(), user);
            inboxes.push(rx);
        }
        (users, inboxes)
    }

    fn drain(rx: &mut UnboundedReceiver<String>) -> Vec<String> {
        let mut out = Vec::new();
        while let Ok(json) = rx.try_recv() {
            out.push(json);
        }
        out
    }

    #[test]
    fn join_is_idempotent_and_sets_the_back_reference() {
        let (mut users, _inboxes) = roster(&["ala", "ola"]);
        let mut table = Table::new(100, "ala");
        table.join(&mut users, "ola", None);
        table.join(&mut users, "ola", None);
        assert_eq!(table.members(), &["ala", "ola"]);
        assert_eq!(users["ola"].table(), Some(100));
    }

    #[test]
    fn join_announces_lobby_wide_and_resyncs_the_joiner() {
        let (mut users, mut inboxes) = roster(&["ala", "ola", "ula"]);
        let mut table = Table::new(100, "ala");
        table.join(&mut users, "ola", None);
        let outsider = drain(&mut inboxes[2]);
        assert!(outsider.iter().any(|m| m.contains("tableJoin")));
        assert!(!outsider.iter().any(|m| m.contains("gameState")));
        let joiner = drain(&mut inboxes[1]);
        assert!(joiner.iter().any(|m| m.contains("gameState")));
    }

    #[test]
    fn sit_rejects_taken_and_double_seats() {
        let (mut users, _inboxes) = roster(&["ala", "ola"]);
        let mut table = Table::new(100, "ala");
        table.join(&mut users, "ola", None);
        table.sit(&users, "ala", 0);
        table.sit(&users, "ola", 0);
        assert_eq!(table.seats()[0].as_deref(), Some("ala"), "seat 0 is taken");
        table.sit(&users, "ala", 1);
        assert!(table.seats()[1].is_none(), "one seat per member");
        table.sit(&users, "ola", 9);
        assert_eq!(table.seat_of("ola"), None, "seat index out of range");
    }

    #[test]
    fn stand_requires_a_seat() {
        let (users, mut inboxes) = roster(&["ala"]);
        let mut table = Table::new(100, "ala");
        table.sit(&users, "ala", 2);
        table.stand(&users, "ala");
        assert_eq!(table.seat_of("ala"), None);
        table.stand(&users, "ala");
        let msgs = drain(&mut inboxes[0]);
        assert_eq!(
            msgs.iter().filter(|m| m.contains("tableStand")).count(),
            1,
            "second stand is a no-op"
        );
    }

    #[test]
    fn leave_vacates_seat_and_promotes_earliest_member() {
        let (mut users, mut inboxes) = roster(&["ala", "ola", "ula"]);
        let mut table = Table::new(100, "ala");
        table.join(&mut users, "ola", None);
        table.join(&mut users, "ula", None);
        table.sit(&users, "ala", 0);
        assert!(!table.leave(&mut users, "ala"));
        assert!(table.seats()[0].is_none());
        assert_eq!(table.operator(), "ola", "earliest remaining member");
        assert_eq!(users["ala"].table(), None);
        let msgs = drain(&mut inboxes[2]);
        assert!(msgs.iter().any(|m| m.contains("tableOperator")));
    }

    #[test]
    fn last_leave_destroys_the_table() {
        let (mut users, mut inboxes) = roster(&["ala"]);
        let mut table = Table::new(100, "ala");
        assert!(table.leave(&mut users, "ala"));
        let msgs = drain(&mut inboxes[0]);
        assert!(msgs.iter().any(|m| m.contains("tableDestroyed")));
    }

    #[test]
    fn chat_stays_within_the_table() {
        let (mut users, mut inboxes) = roster(&["ala", "ola", "ula"]);
        let mut table = Table::new(100, "ala");
        table.join(&mut users, "ola", None);
        drain(&mut inboxes[2]);
        table.handle(
            &mut users,
            "ala",
            &ClientMessage::TableChat {
                content: "hej".to_string(),
            },
        );
        assert!(drain(&mut inboxes[1]).iter().any(|m| m.contains("hej")));
        assert!(drain(&mut inboxes[2]).is_empty(), "outsiders hear nothing");
    }

    #[test]
    fn only_the_operator_starts_a_game() {
        let (mut users, mut inboxes) = roster(&["ala", "ola"]);
        let mut table = Table::new(100, "ala");
        table.join(&mut users, "ola", None);
        table.sit(&users, "ala", 0);
        table.sit(&users, "ola", 1);
        drain(&mut inboxes[0]);
        table.handle(&mut users, "ola", &ClientMessage::StartGame);
        assert!(drain(&mut inboxes[0]).is_empty(), "non-operator is ignored");
        table.handle(&mut users, "ala", &ClientMessage::StartGame);
        let msgs = drain(&mut inboxes[0]);
        assert!(msgs.iter().any(|m| m.contains("gameState")));
    }

    #[test]
    fn hands_are_private_to_their_seat() {
        let (mut users, mut inboxes) = roster(&["ala", "ola"]);
        let mut table = Table::new(100, "ala");
        table.join(&mut users, "ola", None);
        table.sit(&users, "ala", 0);
        table.sit(&users, "ola", 1);
        drain(&mut inboxes[1]);
        table.handle(&mut users, "ala", &ClientMessage::StartGame);
        let state = drain(&mut inboxes[1])
            .into_iter()
            .find(|m| m.contains("gameState"))
            .unwrap();
        let state: serde_json::Value = serde_json::from_str(&state).unwrap();
        assert_eq!(state["hands"][0], 5, "opponent hand arrives as a count");
        assert_eq!(state["hand"].as_array().unwrap().len(), 5);
        assert!(
            state["hand"]
                .as_array()
                .unwrap()
                .iter()
                .all(|c| c["card"].is_string()),
            "own hand arrives as cards"
        );
    }

    #[test]
    fn unseated_members_cannot_move() {
        let (mut users, mut inboxes) = roster(&["ala", "ola"]);
        let mut table = Table::new(100, "ala");
        table.join(&mut users, "ola", None);
        table.sit(&users, "ala", 0);
        table.sit(&users, "ola", 1);
        table.handle(&mut users, "ala", &ClientMessage::StartGame);
        table.join(&mut users, "iga", None);
        drain(&mut inboxes[0]);
        table.handle(&mut users, "iga", &ClientMessage::DrawCard);
        table.handle(
            &mut users,
            "iga",
            &ClientMessage::PlayCard {
                card: "HA".to_string(),
            },
        );
        assert!(
            drain(&mut inboxes[0]).is_empty(),
            "spectator moves change nothing"
        );
    }

    #[test]
    fn malformed_card_codes_are_dropped() {
        let (mut users, mut inboxes) = roster(&["ala"]);
        let mut table = Table::new(100, "ala");
        table.sit(&users, "ala", 0);
        table.handle(&mut users, "ala", &ClientMessage::StartGame);
        drain(&mut inboxes[0]);
        table.handle(
            &mut users,
            "ala",
            &ClientMessage::PlayCard {
                card: "ZZ".to_string(),
            },
        );
        assert!(drain(&mut inboxes[0]).is_empty());
    }
}
