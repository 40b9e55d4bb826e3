pub mod card;
pub use card::*;

pub mod deck;
pub use deck::*;

pub mod rank;
pub use rank::*;

pub mod suit;
pub use suit::*;

/// A wire code that does not name a card, suit, or rank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidCard(pub String);

impl std::fmt::Display for InvalidCard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid card code: {}", self.0)
    }
}

impl std::error::Error for InvalidCard {}
