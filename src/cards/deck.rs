use super::card::Card;
use super::rank::Rank;
use super::suit::Suit;
use rand::seq::SliceRandom;

/// Construct a full 52-card deck, with the two jokers appended when enabled.
/// Order is deterministic; shuffle before dealing.
pub fn fulldeck(jokers: bool) -> Vec<Card> {
    let mut deck = Rank::ALL
        .iter()
        .flat_map(|rank| Suit::ALL.iter().map(|suit| Card::from((*suit, *rank))))
        .collect::<Vec<_>>();
    if jokers {
        deck.push(Card::from((Suit::Joker, Rank::Joker)));
        deck.push(Card::from((Suit::Joker, Rank::Joker)));
    }
    deck
}

/// Uniform in-place Fisher–Yates shuffle.
pub fn shuffle(cards: &mut [Card]) {
    cards.shuffle(&mut rand::rng());
}
