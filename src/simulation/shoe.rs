use crate::CardCount;

use rand::Rng;

/// One deck in blackjack values. 1 stands for A, 10 stands for 10 and J, Q, K.
pub static DECK_TEMPLATE: [u8; 52] = [
    1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 10, 10, 10, //
    1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 10, 10, 10, //
    1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 10, 10, 10, //
    1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 10, 10, 10,
];

/// A new episode starts with a fresh shoe once this many cards or fewer are left.
pub const RESHUFFLE_THRESHOLD: usize = 15;

/// Represents the undealt cards. Cards are drawn at random without replacement.
#[derive(Debug, Clone)]
pub struct Shoe {
    cards: Vec<u8>,
    card_count: CardCount,
}

impl Shoe {
    /// Creates a full shoe in template order.
    pub fn new() -> Shoe {
        Shoe {
            cards: DECK_TEMPLATE.to_vec(),
            card_count: CardCount::from_cards(&DECK_TEMPLATE),
        }
    }

    /// Creates a full shoe and moves the given cards to the frontmost positions,
    /// keeping the rest in template order. Panics if the cards cannot be taken
    /// from a single fresh deck.
    /// Note that the cards are given in blackjack values.
    pub fn with_firsts(firsts: &[u8]) -> Shoe {
        let mut rest = DECK_TEMPLATE.to_vec();
        for blackjack_value in firsts {
            let position = rest
                .iter()
                .position(|card| card == blackjack_value)
                .expect("The given first cards are invalid");
            rest.remove(position);
        }

        let mut cards = firsts.to_vec();
        cards.extend(rest);
        let card_count = CardCount::from_cards(&cards);
        Shoe { cards, card_count }
    }

    /// Draws a card uniformly at random. Returns None if empty.
    pub fn draw<R: Rng>(&mut self, rng: &mut R) -> Option<u8> {
        if self.cards.is_empty() {
            return None;
        }
        let index = rng.gen_range(0..self.cards.len());
        let card = self.cards.remove(index);
        self.card_count.remove_card(card);
        Some(card)
    }

    /// Replaces the shoe with a full one if it reached the reshuffle threshold.
    /// Returns true if it did.
    pub fn reset_if_depleted(&mut self) -> bool {
        if self.remaining() <= RESHUFFLE_THRESHOLD {
            *self = Shoe::new();
            true
        } else {
            false
        }
    }

    pub fn remaining(&self) -> usize {
        self.card_count.get_total() as usize
    }

    pub fn get_cards(&self) -> &[u8] {
        &self.cards
    }

    pub fn get_card_count(&self) -> &CardCount {
        &self.card_count
    }
}

impl Default for Shoe {
    fn default() -> Self {
        Shoe::new()
    }
}
