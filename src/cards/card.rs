use super::InvalidCard;
use super::rank::Rank;
use super::suit::Suit;
use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result;

/// Immutable card value. Equality is by (suit, rank), so the two jokers
/// compare equal, which is all the rules ever need.
#[derive(Debug, Default, Clone, Copy, Hash, PartialEq, Eq)]
pub struct Card {
    suit: Suit,
    rank: Rank,
}

impl Card {
    pub fn suit(&self) -> Suit {
        self.suit
    }
    pub fn rank(&self) -> Rank {
        self.rank
    }
    /// Special ranks may not open the discard pile and, at game start, are
    /// pushed back under the stock until a plain card turns up.
    pub fn is_special(&self) -> bool {
        match self.rank {
            Rank::Ace | Rank::Two | Rank::Three | Rank::Four | Rank::Jack | Rank::Joker => true,
            Rank::King => self.suit.is_king_penalty_suit(),
            _ => false,
        }
    }
}

impl From<(Suit, Rank)> for Card {
    fn from((suit, rank): (Suit, Rank)) -> Self {
        Self { suit, rank }
    }
}

/// str isomorphism
/// suit letter followed by rank code
/// HA  = Ace of Hearts
/// D10 = Ten of Diamonds
/// JJOKER = Joker
impl TryFrom<&str> for Card {
    type Error = InvalidCard;
    fn try_from(s: &str) -> std::result::Result<Self, Self::Error> {
        let (suit, rank) = s.split_at_checked(1).ok_or_else(|| InvalidCard(s.to_string()))?;
        let suit = Suit::try_from(suit)?;
        let rank = Rank::try_from(rank)?;
        match (suit, rank) {
            (Suit::Joker, rank) if rank != Rank::Joker => Err(InvalidCard(s.to_string())),
            (suit, Rank::Joker) if suit != Suit::Joker => Err(InvalidCard(s.to_string())),
            _ => Ok(Self { suit, rank }),
        }
    }
}

impl Display for Card {
    fn fmt(&self, f: &mut Formatter) -> Result {
        write!(f, "{}{}", self.suit, self.rank)
    }
}
