use super::InvalidCard;

#[derive(Debug, Default, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum Suit {
    #[default]
    Clubs,
    Diamonds,
    Hearts,
    Spades,
    /// Pseudo-suit carried only by the two jokers.
    Joker,
}

impl Suit {
    /// The four real suits, in deck-construction order.
    pub const ALL: [Self; 4] = [Suit::Clubs, Suit::Diamonds, Suit::Hearts, Suit::Spades];

    /// Hearts and Spades; their King carries the heavy draw penalty.
    pub fn is_king_penalty_suit(&self) -> bool {
        matches!(self, Suit::Hearts | Suit::Spades)
    }
}

/// str isomorphism over single-letter wire codes
impl TryFrom<&str> for Suit {
    type Error = InvalidCard;
    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "C" => Ok(Suit::Clubs),
            "D" => Ok(Suit::Diamonds),
            "H" => Ok(Suit::Hearts),
            "S" => Ok(Suit::Spades),
            "J" => Ok(Suit::Joker),
            _ => Err(InvalidCard(s.to_string())),
        }
    }
}

impl std::fmt::Display for Suit {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Suit::Clubs => "C",
                Suit::Diamonds => "D",
                Suit::Hearts => "H",
                Suit::Spades => "S",
                Suit::Joker => "J",
            }
        )
    }
}
