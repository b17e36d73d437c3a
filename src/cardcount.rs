use std::ops::Index;

/// This provides a container to store the numbers of each card value (from
/// 1 to 10 inclusive).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CardCount {
    counts: [u16; 10],
    total: u16,
}

impl CardCount {
    /// Builds the count of the given card values.
    pub fn from_cards(cards: &[u8]) -> CardCount {
        let mut card_count = CardCount::default();
        for &card_value in cards {
            card_count.add_card(card_value);
        }
        card_count
    }

    /// Add a card of given card value.
    ///
    /// Note that this method won't check if the card value is valid.
    pub fn add_card(&mut self, card_value: u8) {
        self.counts[(card_value - 1) as usize] += 1;
        self.total += 1;
    }

    /// Remove a card of given card value. Returns false and leaves the count
    /// untouched if there is no such card.
    pub fn remove_card(&mut self, card_value: u8) -> bool {
        let index = (card_value - 1) as usize;
        if self.counts[index] == 0 {
            return false;
        }
        self.counts[index] -= 1;
        self.total -= 1;
        true
    }

    pub fn get_total(&self) -> u16 {
        self.total
    }
}

impl Index<u8> for CardCount {
    type Output = u16;
    fn index(&self, index: u8) -> &Self::Output {
        &self.counts[(index - 1) as usize]
    }
}
