/// Count weight of each card value in half points, indexed by value - 1.
/// A, 10: -1. 2, 7: +0.5. 3, 4, 6: +1. 5: +1.5. 8: 0. 9: -0.5.
static HALF_POINT_WEIGHTS: [i32; 10] = [-2, 1, 2, 2, 3, 2, 1, 0, -1, -2];

/// Count weight of the given card value.
pub fn card_weight(card_value: u8) -> f64 {
    half_point_weight(card_value) as f64 / 2.0
}

fn half_point_weight(card_value: u8) -> i32 {
    HALF_POINT_WEIGHTS[(card_value - 1) as usize]
}

/// The player's running count since the last reshuffle.
///
/// Every weight is a multiple of 0.5, so the count is kept in half points and
/// never accumulates rounding error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunningCount {
    half_points: i32,
}

impl RunningCount {
    pub fn new() -> Self {
        Default::default()
    }

    /// A card became visible to the player.
    pub fn observe(&mut self, card_value: u8) {
        self.half_points += half_point_weight(card_value);
    }

    /// Takes back the weight of a card the player cannot see.
    pub fn conceal(&mut self, card_value: u8) {
        self.half_points -= half_point_weight(card_value);
    }

    pub fn reset(&mut self) {
        self.half_points = 0;
    }

    pub fn score(&self) -> f64 {
        self.half_points as f64 / 2.0
    }

    /// Twice the count, which is always an integer.
    pub fn signal(&self) -> i32 {
        self.half_points
    }
}
