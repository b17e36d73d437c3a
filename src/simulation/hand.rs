//! Hand evaluation. Cards are blackjack values: 1 stands for A, 10 stands for
//! 10 and J, Q, K.

use std::cmp::Ordering;

/// Does this hand have an Ace that can count as 11 without busting?
pub fn has_usable_ace(hand: &[u8]) -> bool {
    hand.contains(&1) && naive_sum(hand) + 10 <= 21
}

/// Current hand total, counting a usable Ace as 11.
pub fn hand_value(hand: &[u8]) -> u16 {
    if has_usable_ace(hand) {
        naive_sum(hand) + 10
    } else {
        naive_sum(hand)
    }
}

pub fn is_bust(hand: &[u8]) -> bool {
    hand_value(hand) > 21
}

/// The hand total, or 0 if bust.
pub fn score(hand: &[u8]) -> u16 {
    if is_bust(hand) {
        0
    } else {
        hand_value(hand)
    }
}

/// Ace plus a ten-valued card, and nothing else.
pub fn is_natural(hand: &[u8]) -> bool {
    matches!(hand, [1, 10] | [10, 1])
}

/// Returns 1, 0 or -1 for a > b, a == b and a < b.
pub fn compare(a: u16, b: u16) -> i8 {
    match a.cmp(&b) {
        Ordering::Greater => 1,
        Ordering::Equal => 0,
        Ordering::Less => -1,
    }
}

fn naive_sum(hand: &[u8]) -> u16 {
    hand.iter().map(|&card| card as u16).sum()
}

/// Represents the cards held by the player or the dealer during one episode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hand {
    cards: Vec<u8>,
}

impl Hand {
    pub fn new() -> Hand {
        Hand {
            cards: Vec::with_capacity(3),
        }
    }

    pub fn receive_card(&mut self, card: u8) {
        self.cards.push(card);
    }

    pub fn get_cards(&self) -> &[u8] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn value(&self) -> u16 {
        hand_value(&self.cards)
    }

    pub fn has_usable_ace(&self) -> bool {
        has_usable_ace(&self.cards)
    }

    pub fn bust(&self) -> bool {
        is_bust(&self.cards)
    }

    pub fn score(&self) -> u16 {
        score(&self.cards)
    }

    pub fn is_natural(&self) -> bool {
        is_natural(&self.cards)
    }

    pub fn clear(&mut self) {
        self.cards.clear();
    }
}

impl From<Vec<u8>> for Hand {
    fn from(cards: Vec<u8>) -> Self {
        Hand { cards }
    }
}
