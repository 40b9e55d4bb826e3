use super::demand::Demand;
use super::engine::Makao;
use crate::Seat;
use serde::Serialize;

/// One viewer's picture of the game, embedded in the `gameState` wire
/// message. Opponents' hands appear only as counts; the viewer's own seat
/// (if any) gets full cards with per-card playability, and the acting seat
/// gets a hint list of its open non-card moves.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameView {
    pub turn: Option<Seat>,
    pub played_cards: Vec<String>,
    pub hands: Vec<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hand: Option<Vec<HandCard>>,
    pub to_draw: usize,
    pub to_block: usize,
    pub blocks: Vec<usize>,
    pub repeating_turn: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner: Option<Seat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub demand: Option<DemandView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actions: Option<Vec<&'static str>>,
}

/// A hand card with its legality under the current state, drawn-card lock
/// included.
#[derive(Debug, Clone, Serialize)]
pub struct HandCard {
    pub card: String,
    pub playable: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DemandView {
    pub kind: &'static str,
    pub value: String,
    pub turns_remaining: usize,
}

impl From<Demand> for DemandView {
    fn from(demand: Demand) -> Self {
        match demand {
            Demand::Suit { suit, turns } => Self {
                kind: "suit",
                value: suit.to_string(),
                turns_remaining: turns,
            },
            Demand::Rank { rank, turns } => Self {
                kind: "rank",
                value: rank.to_string(),
                turns_remaining: turns,
            },
        }
    }
}

impl GameView {
    /// Render the game as seen from `seat` (None for an unseated member).
    pub fn of(game: &Makao, seat: Option<Seat>) -> Self {
        let hand = seat.map(|seat| {
            game.hand(seat)
                .iter()
                .map(|card| HandCard {
                    card: card.to_string(),
                    playable: game.may_play(seat, *card),
                })
                .collect()
        });
        let actions = seat
            .filter(|seat| game.turn() == Some(*seat))
            .map(|seat| game.actions(seat));
        Self {
            turn: game.turn(),
            played_cards: game.played().iter().map(|c| c.to_string()).collect(),
            hands: game.hand_sizes(),
            hand,
            to_draw: game.to_draw(),
            to_block: game.to_block(),
            blocks: game.blocks().to_vec(),
            repeating_turn: game.repeating(),
            winner: game.winner(),
            demand: game.demand().map(DemandView::from),
            actions,
        }
    }
}
