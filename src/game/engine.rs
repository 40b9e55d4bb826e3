use super::demand::Demand;
use crate::DRAW_PENALTY_KING;
use crate::DRAW_PENALTY_THREE;
use crate::DRAW_PENALTY_TWO;
use crate::HAND_SIZE;
use crate::JOKERS;
use crate::RANK_DEMAND_TURNS;
use crate::SEATS;
use crate::SUIT_DEMAND_TURNS;
use crate::Seat;
use crate::cards::Card;
use crate::cards::Rank;
use crate::cards::Suit;
use crate::cards::deck;

/// Game lifecycle. A finished game freezes every move until the operator
/// starts the next one.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    #[default]
    NotStarted,
    InProgress,
    Finished(Seat),
}

/// Makao rules state machine over up to [`SEATS`] seats.
///
/// Functional core: every operation takes the acting seat, validates it
/// against the current state, and either commits the full effect or leaves
/// the state untouched. Rejections are silent (`false`); the table layer
/// simply skips the broadcast so clients resync on the next valid move.
#[derive(Debug)]
pub struct Makao {
    phase: Phase,
    /// Draw pile, top at the end.
    stock: Vec<Card>,
    /// Discard pile, top (last played) at the end.
    played: Vec<Card>,
    hands: Vec<Vec<Card>>,
    /// Seats that were occupied at start, ascending. Turn order wraps here.
    players: Vec<Seat>,
    turn: Seat,
    /// A card just drawn, awaiting the drawer's play-or-pass decision.
    drawn: Option<Card>,
    /// The current player may keep playing cards of the top rank.
    repeating: bool,
    /// Accumulated forced-draw penalty from Twos, Threes, and penalty Kings.
    to_draw: usize,
    /// Turn-skip penalty from Fours, not yet pinned on a victim.
    to_block: usize,
    /// Remaining turns each seat must sit out.
    blocks: Vec<usize>,
    demand: Option<Demand>,
}

impl Default for Makao {
    fn default() -> Self {
        Self {
            phase: Phase::NotStarted,
            stock: Vec::new(),
            played: Vec::new(),
            hands: vec![Vec::new(); SEATS],
            players: Vec::new(),
            turn: 0,
            drawn: None,
            repeating: false,
            to_draw: 0,
            to_block: 0,
            blocks: vec![0; SEATS],
            demand: None,
        }
    }
}

impl Makao {
    /// Deal a fresh game to the given occupied seats. Resets from any phase.
    /// No-op when nobody is seated.
    pub fn start(&mut self, players: Vec<Seat>) -> bool {
        if players.is_empty() {
            return false;
        }
        let mut stock = deck::fulldeck(JOKERS);
        deck::shuffle(&mut stock);
        self.begin(stock, players);
        true
    }

    /// Deterministic tail of [`Makao::start`]: deal [`HAND_SIZE`] cards to
    /// every player round-robin, then flip stock cards until a non-special
    /// one opens the discard pile (specials go back under the stock).
    fn begin(&mut self, stock: Vec<Card>, players: Vec<Seat>) {
        *self = Self::default();
        self.stock = stock;
        self.players = players;
        for _ in 0..HAND_SIZE {
            for seat in self.players.clone() {
                if let Some(card) = self.stock.pop() {
                    self.hands[seat].push(card);
                }
            }
        }
        while let Some(card) = self.stock.pop() {
            if card.is_special() {
                self.stock.insert(0, card);
            } else {
                self.played.push(card);
                break;
            }
        }
        self.turn = self.players[0];
        self.phase = Phase::InProgress;
    }

    /// Play a card from hand. A freshly drawn card must be played before
    /// any other; all rank effects, demand bookkeeping, win detection, and
    /// turn advancement happen here.
    pub fn play(&mut self, seat: Seat, card: Card) -> bool {
        if self.phase != Phase::InProgress || seat != self.turn {
            return false;
        }
        let Some(at) = self.hands[seat].iter().position(|c| *c == card) else {
            return false;
        };
        if !self.may_play(seat, card) {
            return false;
        }
        self.hands[seat].remove(at);
        self.played.push(card);
        self.drawn = None;
        match card.rank() {
            Rank::Two => self.to_draw += DRAW_PENALTY_TWO,
            Rank::Three => self.to_draw += DRAW_PENALTY_THREE,
            Rank::King if card.suit().is_king_penalty_suit() => {
                self.to_draw += DRAW_PENALTY_KING
            }
            Rank::Four => self.to_block += 1,
            _ => {}
        }
        if let Some(demand) = &mut self.demand {
            if demand.tick() {
                self.demand = None;
            }
        }
        if self.hands[seat].is_empty() {
            self.phase = Phase::Finished(seat);
            return true;
        }
        self.repeating = true;
        let follow = self.hands[seat].iter().any(|c| self.playable(seat, *c));
        let choosing = matches!(card.rank(), Rank::Ace | Rank::Jack);
        if !follow && !choosing {
            self.advance();
        }
        true
    }

    /// Draw one card from the stock. A playable draw is held for a
    /// play-or-pass decision; an unplayable one immediately absorbs the
    /// rest of any pending forced-draw penalty and ends the turn.
    pub fn draw(&mut self, seat: Seat) -> bool {
        if self.phase != Phase::InProgress || seat != self.turn {
            return false;
        }
        if self.blocks[seat] > 0 || self.to_block > 0 || self.repeating {
            return false;
        }
        if self.drawn.is_some() && self.to_draw == 0 {
            return false;
        }
        let Some(card) = self.take_stock() else {
            // Both piles exhausted: forgive the penalty rather than deadlock.
            self.to_draw = 0;
            self.advance();
            return true;
        };
        self.hands[seat].push(card);
        if self.playable(seat, card) {
            self.drawn = Some(card);
        } else {
            if self.to_draw > 0 {
                self.force_draw(seat, self.to_draw - 1);
                self.to_draw = 0;
            }
            self.advance();
        }
        true
    }

    /// Decline to act: pin a pending block, end a repeat turn, settle a
    /// draw decision, or sit out one blocked turn.
    ///
    /// A pending block lands on the next player when the passer is the one
    /// who played the Four (mid-repeat), and on the passer themselves when
    /// they inherited it and hold no counter-Four.
    pub fn pass(&mut self, seat: Seat) -> bool {
        if self.phase != Phase::InProgress || seat != self.turn {
            return false;
        }
        if self.to_block > 0 {
            let victim = if self.repeating { self.next_player() } else { seat };
            self.blocks[victim] += self.to_block;
            self.to_block = 0;
        } else if self.repeating {
            self.repeating = false;
            self.demand = None;
        } else if self.drawn.is_some() {
            self.drawn = None;
            if self.to_draw > 0 {
                self.force_draw(seat, self.to_draw - 1);
                self.to_draw = 0;
            }
        } else if self.blocks[seat] > 0 {
            self.blocks[seat] -= 1;
        } else {
            return false;
        }
        self.advance();
        true
    }

    /// Demand a suit, immediately after playing an Ace.
    pub fn demand_suit(&mut self, seat: Seat, suit: Suit) -> bool {
        if !self.may_demand(seat, Rank::Ace) || suit == Suit::Joker {
            return false;
        }
        self.demand = Some(Demand::Suit {
            suit,
            turns: SUIT_DEMAND_TURNS,
        });
        self.advance();
        true
    }

    /// Demand a rank, immediately after playing a Jack.
    pub fn demand_rank(&mut self, seat: Seat, rank: Rank) -> bool {
        if !self.may_demand(seat, Rank::Jack) || rank == Rank::Joker {
            return false;
        }
        self.demand = Some(Demand::Rank {
            rank,
            turns: RANK_DEMAND_TURNS,
        });
        self.advance();
        true
    }

    /// Legal-play predicate in strict priority order: blocked seats play
    /// nothing; pending blocks take only Fours; repeat turns take only the
    /// top rank; demands take their suit/rank (or a fresh Ace/Jack);
    /// pending draws take only counters; otherwise match rank or suit.
    pub fn playable(&self, seat: Seat, card: Card) -> bool {
        let Some(top) = self.played.last().copied() else {
            return false;
        };
        if self.blocks[seat] > 0 {
            return false;
        }
        if self.to_block > 0 {
            return card.rank() == Rank::Four;
        }
        if self.repeating {
            return card.rank() == top.rank();
        }
        if let Some(demand) = self.demand {
            return match demand {
                Demand::Suit { suit, .. } => card.suit() == suit || card.rank() == Rank::Ace,
                Demand::Rank { rank, .. } => card.rank() == rank || card.rank() == Rank::Jack,
            };
        }
        if self.to_draw > 0 {
            return matches!(card.rank(), Rank::Two | Rank::Three)
                || (card.rank() == Rank::King && card.suit().is_king_penalty_suit());
        }
        card.rank() == top.rank() || card.suit() == top.suit()
    }

    /// [`Makao::playable`] plus the drawn-card lock: once a card has been
    /// drawn this turn, it is the only card that may leave the hand.
    pub fn may_play(&self, seat: Seat, card: Card) -> bool {
        self.playable(seat, card) && self.drawn.is_none_or(|d| d == card)
    }

    /// Non-card moves currently open to the acting seat, for client hints.
    pub fn actions(&self, seat: Seat) -> Vec<&'static str> {
        let mut actions = Vec::new();
        if self.phase != Phase::InProgress || seat != self.turn {
            return actions;
        }
        if self.hands[seat].iter().any(|c| self.may_play(seat, *c)) {
            actions.push("play");
        }
        if self.blocks[seat] == 0
            && self.to_block == 0
            && !self.repeating
            && (self.to_draw > 0 || self.drawn.is_none())
        {
            actions.push("draw");
        }
        if self.repeating || self.drawn.is_some() || self.to_block > 0 || self.blocks[seat] > 0 {
            actions.push("pass");
        }
        if self.repeating && self.top_rank() == Some(Rank::Ace) {
            actions.push("suit");
        }
        if self.repeating && self.top_rank() == Some(Rank::Jack) {
            actions.push("rank");
        }
        actions
    }
}

impl Makao {
    pub fn turn(&self) -> Option<Seat> {
        match self.phase {
            Phase::NotStarted => None,
            _ => Some(self.turn),
        }
    }
    pub fn winner(&self) -> Option<Seat> {
        match self.phase {
            Phase::Finished(seat) => Some(seat),
            _ => None,
        }
    }
    pub fn played(&self) -> &[Card] {
        &self.played
    }
    pub fn hand(&self, seat: Seat) -> &[Card] {
        &self.hands[seat]
    }
    pub fn hand_sizes(&self) -> Vec<usize> {
        self.hands.iter().map(Vec::len).collect()
    }
    pub fn blocks(&self) -> &[usize] {
        &self.blocks
    }
    pub fn to_draw(&self) -> usize {
        self.to_draw
    }
    pub fn to_block(&self) -> usize {
        self.to_block
    }
    pub fn repeating(&self) -> bool {
        self.repeating
    }
    pub fn demand(&self) -> Option<Demand> {
        self.demand
    }
}

impl Makao {
    fn top_rank(&self) -> Option<Rank> {
        self.played.last().map(Card::rank)
    }
    fn may_demand(&self, seat: Seat, played: Rank) -> bool {
        self.phase == Phase::InProgress
            && seat == self.turn
            && self.repeating
            && self.top_rank() == Some(played)
    }
    fn next_player(&self) -> Seat {
        let at = self
            .players
            .iter()
            .position(|s| *s == self.turn)
            .unwrap_or(0);
        self.players[(at + 1) % self.players.len()]
    }
    /// Move to the next participating seat, dropping per-turn state.
    fn advance(&mut self) {
        self.turn = self.next_player();
        self.drawn = None;
        self.repeating = false;
    }
    /// Draw up to n cards into the seat's hand, stopping early if both
    /// piles run dry.
    fn force_draw(&mut self, seat: Seat, n: usize) {
        for _ in 0..n {
            match self.take_stock() {
                Some(card) => self.hands[seat].push(card),
                None => break,
            }
        }
    }
    /// Pop the stock, reshuffling the discard pile (minus its top card)
    /// back into a fresh stock when it runs out.
    fn take_stock(&mut self) -> Option<Card> {
        if self.stock.is_empty() && self.played.len() > 1 {
            let top = self.played.pop();
            self.stock = std::mem::take(&mut self.played);
            deck::shuffle(&mut self.stock);
            self.played.extend(top);
        }
        self.stock.pop()
    }
}
