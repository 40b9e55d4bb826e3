use crate::cards::Rank;
use crate::cards::Suit;

/// A constraint on upcoming plays, established by an Ace (suit) or a
/// Jack (rank). It expires after a fixed number of successful plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Demand {
    Suit { suit: Suit, turns: usize },
    Rank { rank: Rank, turns: usize },
}

impl Demand {
    pub fn turns(&self) -> usize {
        match self {
            Demand::Suit { turns, .. } => *turns,
            Demand::Rank { turns, .. } => *turns,
        }
    }
    /// Spend one play against the demand. Returns true once expired.
    pub fn tick(&mut self) -> bool {
        let turns = match self {
            Demand::Suit { turns, .. } => turns,
            Demand::Rank { turns, .. } => turns,
        };
        *turns = turns.saturating_sub(1);
        *turns == 0
    }
}
