pub mod count;
pub mod hand;
pub mod shoe;

use std::collections::HashMap;

use counting_blackjack_macros::allowed_phase;
use log::{debug, trace};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use crate::{
    spaces::COUNT_SIGNAL_OFFSET, Action, ActionSpace, EnvError, Environment, EpisodePhase,
    ObservationSpace, Rule, StepResult,
};

use self::{count::RunningCount, hand::Hand, shoe::Shoe};

/// The dealer draws until reaching this value.
const DEALER_STAND_VALUE: u16 = 17;

/// Reward for a double that is not the first move of the episode.
const LATE_DOUBLE_REWARD: f64 = -100.0;

/// What the player sees after reset and after every step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Observation {
    pub player_sum: u16,
    /// 0 only before the first deal.
    pub dealer_up_card: u8,
    pub usable_ace: bool,
    /// True only before the player's first action.
    pub start: bool,
    /// Twice the running count.
    pub count_signal: i32,
}

impl Observation {
    /// The count signal shifted into `0..=92`.
    pub fn count_index(&self) -> u16 {
        (self.count_signal + COUNT_SIGNAL_OFFSET) as u16
    }

    pub fn as_tuple(&self) -> (u16, u8, bool, bool, i32) {
        (
            self.player_sum,
            self.dealer_up_card,
            self.usable_ace,
            self.start,
            self.count_signal,
        )
    }
}

/// Single-player blackjack against a dealer who stands on 17, with a running
/// card count carried across episodes until the shoe is replenished.
///
/// The dealer's hole card is subtracted from the count when dealt and added
/// back when it is revealed at the end of the episode, so during play the
/// count reflects only the cards the player can see.
pub struct BlackjackCountingEnv<R: Rng = ChaCha8Rng> {
    rule: Rule,
    rng: R,

    // Episode state
    current_phase: EpisodePhase,
    start: bool,
    shoe: Shoe,
    running_count: RunningCount,
    player_hand: Hand,
    dealer_hand: Hand,
}

impl BlackjackCountingEnv<ChaCha8Rng> {
    pub fn new(rule: Rule, seed: u64) -> Self {
        Self::with_rng(rule, ChaCha8Rng::seed_from_u64(seed))
    }
}

impl<R: Rng + SeedableRng> BlackjackCountingEnv<R> {
    /// Reseeds the generator. The shoe and the count are left as they are.
    pub fn seed(&mut self, seed: u64) {
        self.rng = R::seed_from_u64(seed);
    }
}

impl<R: Rng> BlackjackCountingEnv<R> {
    pub fn with_rng(rule: Rule, rng: R) -> Self {
        Self::with_shoe(rule, Shoe::new(), rng)
    }

    /// Starts from the given shoe instead of a full one. The count starts at
    /// zero regardless of which cards are missing.
    pub fn with_shoe(rule: Rule, shoe: Shoe, rng: R) -> Self {
        Self {
            rule,
            rng,
            current_phase: EpisodePhase::NotStarted,
            start: true,
            shoe,
            running_count: RunningCount::new(),
            player_hand: Hand::new(),
            dealer_hand: Hand::new(),
        }
    }

    /// Discards everything: full shoe, zero count, empty hands.
    pub fn hard_reset(&mut self) {
        debug!("Hard reset");
        self.shoe = Shoe::new();
        self.running_count.reset();
        self.player_hand.clear();
        self.dealer_hand.clear();
        self.start = true;
        self.current_phase = EpisodePhase::NotStarted;
    }

    /// Starts a new episode. Can be called in any phase; an unfinished
    /// episode is abandoned and its hole card stays uncounted.
    pub fn reset(&mut self) -> Result<Observation, EnvError> {
        if self.shoe.reset_if_depleted() {
            debug!("Shoe replenished, running count reset");
            self.running_count.reset();
        }

        self.player_hand.clear();
        self.dealer_hand.clear();
        for _ in 0..2 {
            let card = self.draw_card()?;
            self.dealer_hand.receive_card(card);
        }
        // The player does not know the hole card until the dealer plays.
        let hole_card = self.hole_card();
        self.running_count.conceal(hole_card);
        for _ in 0..2 {
            let card = self.draw_card()?;
            self.player_hand.receive_card(card);
        }

        self.start = true;
        self.current_phase = EpisodePhase::AwaitingAction;
        Ok(self.get_obs())
    }

    /// Applies the action to the running episode. Can be called in
    /// AwaitingAction phase.
    #[allowed_phase(AwaitingAction)]
    pub fn step(&mut self, action: Action) -> Result<StepResult<Observation>, EnvError> {
        let (reward, done) = match action {
            Action::Stick => {
                self.reveal_hole_card();
                self.dealer_plays()?;
                (self.stick_reward(), true)
            }
            Action::Hit => {
                let card = self.draw_card()?;
                self.player_hand.receive_card(card);
                if self.player_hand.bust() {
                    self.reveal_hole_card();
                    (-1.0, true)
                } else {
                    (0.0, false)
                }
            }
            Action::Double => {
                let card = self.draw_card()?;
                self.player_hand.receive_card(card);
                self.reveal_hole_card();
                let reward = if self.player_hand.bust() {
                    -2.0
                } else {
                    self.dealer_plays()?;
                    2.0 * self.base_reward()
                };
                if self.start {
                    (reward, true)
                } else {
                    (LATE_DOUBLE_REWARD, true)
                }
            }
        };

        self.start = false;
        if done {
            self.current_phase = EpisodePhase::Terminal;
            debug!(
                "Episode finished with {:?}: player {:?}, dealer {:?}, reward {}",
                action,
                self.player_hand.get_cards(),
                self.dealer_hand.get_cards(),
                reward
            );
        }

        Ok(StepResult {
            observation: self.get_obs(),
            reward,
            done,
            info: HashMap::new(),
        })
    }

    /// Steps with a raw discrete action, rejecting anything outside the
    /// action space.
    pub fn step_index(&mut self, action: u8) -> Result<StepResult<Observation>, EnvError> {
        if !self.action_space().contains(action) {
            return Err(EnvError::InvalidAction(action));
        }
        let action = Action::try_from(action)?;
        self.step(action)
    }

    /// Snapshot of the undealt cards.
    pub fn get_deck(&self) -> Vec<u8> {
        self.shoe.get_cards().to_vec()
    }

    pub fn get_shoe(&self) -> &Shoe {
        &self.shoe
    }

    pub fn player_hand(&self) -> &Hand {
        &self.player_hand
    }

    pub fn dealer_hand(&self) -> &Hand {
        &self.dealer_hand
    }

    pub fn running_count(&self) -> &RunningCount {
        &self.running_count
    }

    pub fn count_signal(&self) -> i32 {
        self.running_count.signal()
    }

    pub fn is_start(&self) -> bool {
        self.start
    }

    pub fn phase(&self) -> EpisodePhase {
        self.current_phase
    }

    pub fn rule(&self) -> Rule {
        self.rule
    }

    pub fn action_space(&self) -> ActionSpace {
        ActionSpace::default()
    }

    pub fn observation_space(&self) -> ObservationSpace {
        ObservationSpace::default()
    }

    fn get_obs(&self) -> Observation {
        Observation {
            player_sum: self.player_hand.value(),
            dealer_up_card: self.dealer_hand.get_cards().first().copied().unwrap_or(0),
            usable_ace: self.player_hand.has_usable_ace(),
            start: self.start,
            count_signal: self.running_count.signal(),
        }
    }

    fn draw_card(&mut self) -> Result<u8, EnvError> {
        let card = self.shoe.draw(&mut self.rng).ok_or(EnvError::EmptyShoe)?;
        self.running_count.observe(card);
        trace!(
            "Drew {}, {} left, count signal {}",
            card,
            self.shoe.remaining(),
            self.running_count.signal()
        );
        Ok(card)
    }

    fn hole_card(&self) -> u8 {
        self.dealer_hand.get_cards()[1]
    }

    fn reveal_hole_card(&mut self) {
        let hole_card = self.hole_card();
        self.running_count.observe(hole_card);
    }

    fn dealer_plays(&mut self) -> Result<(), EnvError> {
        while self.dealer_hand.value() < DEALER_STAND_VALUE {
            let card = self.draw_card()?;
            self.dealer_hand.receive_card(card);
        }
        Ok(())
    }

    fn base_reward(&self) -> f64 {
        hand::compare(self.player_hand.score(), self.dealer_hand.score()) as f64
    }

    fn stick_reward(&self) -> f64 {
        let reward = self.base_reward();
        let player_natural = self.player_hand.is_natural();
        if self.rule.sab {
            if player_natural && !self.dealer_hand.is_natural() {
                // Player automatically wins. Sutton & Barto rules.
                return 1.0;
            }
        } else if self.rule.natural && player_natural && reward == 1.0 {
            // A natural pays extra but does not win automatically.
            return 1.5;
        }
        reward
    }
}

impl<R: Rng> Environment for BlackjackCountingEnv<R> {
    type Action = Action;
    type Observation = Observation;
    type Error = EnvError;

    fn reset(&mut self) -> Result<Observation, EnvError> {
        BlackjackCountingEnv::reset(self)
    }

    fn step(&mut self, action: Action) -> Result<StepResult<Observation>, EnvError> {
        BlackjackCountingEnv::step(self, action)
    }

    fn action_space(&self) -> ActionSpace {
        BlackjackCountingEnv::action_space(self)
    }

    fn observation_space(&self) -> ObservationSpace {
        BlackjackCountingEnv::observation_space(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;

    /// An environment whose deal order is exactly `firsts`: dealer up card,
    /// hole card, two player cards, then one card per draw.
    fn stacked_env(rule: Rule, firsts: &[u8]) -> BlackjackCountingEnv<StepRng> {
        BlackjackCountingEnv::with_shoe(rule, Shoe::with_firsts(firsts), StepRng::new(0, 0))
    }

    fn half_points(cards: &[u8]) -> i32 {
        cards
            .iter()
            .map(|&card| (count::card_weight(card) * 2.0) as i32)
            .sum()
    }

    fn play_script<R: Rng>(
        env: &mut BlackjackCountingEnv<R>,
        episodes: usize,
    ) -> Vec<(Observation, f64, bool)> {
        let mut trajectory = Vec::new();
        for _ in 0..episodes {
            let mut observation = env.reset().unwrap();
            trajectory.push((observation, 0.0, false));
            loop {
                let action = if observation.start && observation.player_sum == 11 {
                    Action::Double
                } else if observation.player_sum < 15 {
                    Action::Hit
                } else {
                    Action::Stick
                };
                let result = env.step(action).unwrap();
                trajectory.push((result.observation, result.reward, result.done));
                if result.done {
                    break;
                }
                observation = result.observation;
            }
        }
        trajectory
    }

    #[test]
    fn reset_deals_two_cards_each() {
        let mut env = BlackjackCountingEnv::new(Rule::default(), 1);
        let observation = env.reset().unwrap();
        assert_eq!(env.player_hand().len(), 2);
        assert_eq!(env.dealer_hand().len(), 2);
        assert_eq!(env.get_deck().len(), 48);
        assert!(observation.start);
        assert_eq!(observation.dealer_up_card, env.dealer_hand().get_cards()[0]);
        assert_eq!(env.phase(), EpisodePhase::AwaitingAction);
    }

    #[test]
    fn initial_count_hides_hole_card() {
        let mut env = stacked_env(Rule::default(), &[9, 5, 10, 2]);
        let observation = env.reset().unwrap();
        // Visible: 9, 10, 2. Hole card 5 is not counted.
        assert_eq!(observation.count_signal, half_points(&[9, 10, 2]));
        assert_eq!(observation.count_signal, -2);
    }

    #[test]
    fn natural_pays_one_and_a_half_on_stick() {
        let rule = Rule {
            natural: true,
            sab: false,
        };
        let mut env = stacked_env(rule, &[10, 6, 1, 10]);
        let observation = env.reset().unwrap();
        assert_eq!(observation.as_tuple(), (21, 10, true, true, -6));

        let result = env.step(Action::Stick).unwrap();
        // Dealer 16 draws the 2 left at the front of the shoe and stands on 18.
        assert_eq!(env.dealer_hand().get_cards(), &[10, 6, 2]);
        assert_eq!(result.reward, 1.5);
        assert!(result.done);
        assert!(result.info.is_empty());
        assert_eq!(result.observation.as_tuple(), (21, 10, true, false, -3));
        assert_eq!(env.phase(), EpisodePhase::Terminal);
    }

    #[test]
    fn natural_without_bonus_pays_one() {
        let mut env = stacked_env(Rule::default(), &[10, 6, 1, 10]);
        env.reset().unwrap();
        assert_eq!(env.step(Action::Stick).unwrap().reward, 1.0);
    }

    #[test]
    fn sab_natural_wins_one_even_with_natural_bonus() {
        let rule = Rule {
            natural: true,
            sab: true,
        };
        let mut env = stacked_env(rule, &[10, 6, 1, 10]);
        env.reset().unwrap();
        assert_eq!(env.step(Action::Stick).unwrap().reward, 1.0);
    }

    #[test]
    fn sab_natural_against_dealer_natural_pushes() {
        let rule = Rule {
            natural: false,
            sab: true,
        };
        let mut env = stacked_env(rule, &[1, 10, 10, 1]);
        env.reset().unwrap();
        let result = env.step(Action::Stick).unwrap();
        assert_eq!(result.reward, 0.0);
        assert!(result.done);
    }

    #[test]
    fn sab_natural_beats_three_card_21() {
        let rule = Rule {
            natural: false,
            sab: true,
        };
        let mut env = stacked_env(rule, &[10, 6, 1, 10, 5]);
        env.reset().unwrap();
        let result = env.step(Action::Stick).unwrap();
        // Dealer 16 draws a 5 to 21, which ties on score but is not a natural.
        assert_eq!(env.dealer_hand().get_cards(), &[10, 6, 5]);
        assert_eq!(result.reward, 1.0);
        assert!(result.done);
    }

    #[test]
    fn natural_bonus_needs_a_win() {
        let rule = Rule {
            natural: true,
            sab: false,
        };
        let mut env = stacked_env(rule, &[10, 6, 1, 10, 5]);
        env.reset().unwrap();
        let result = env.step(Action::Stick).unwrap();
        assert_eq!(env.dealer_hand().get_cards(), &[10, 6, 5]);
        assert_eq!(result.reward, 0.0);
        assert!(result.done);
    }

    #[test]
    fn hit_to_22_busts_and_reveals_hole_card_once() {
        let mut env = stacked_env(Rule::default(), &[9, 5, 10, 2, 10]);
        let observation = env.reset().unwrap();
        assert_eq!(observation.count_signal, -2);

        let result = env.step(Action::Hit).unwrap();
        assert_eq!(result.observation.player_sum, 22);
        assert_eq!(result.reward, -1.0);
        assert!(result.done);
        // Every dealt card is now counted exactly once.
        assert_eq!(result.observation.count_signal, half_points(&[9, 5, 10, 2, 10]));
        assert_eq!(env.running_count().score(), -0.5);
        assert_eq!(env.dealer_hand().len(), 2);
    }

    #[test]
    fn hit_without_bust_continues() {
        let mut env = stacked_env(Rule::default(), &[10, 7, 2, 3, 4]);
        env.reset().unwrap();
        let result = env.step(Action::Hit).unwrap();
        assert_eq!(result.reward, 0.0);
        assert!(!result.done);
        assert!(!result.observation.start);
        assert_eq!(result.observation.player_sum, 9);
        // The hole card is still hidden.
        assert_eq!(result.observation.count_signal, half_points(&[10, 2, 3, 4]));
        assert_eq!(env.phase(), EpisodePhase::AwaitingAction);
    }

    #[test]
    fn first_move_double_pays_twice() {
        let mut env = stacked_env(Rule::default(), &[10, 6, 5, 6, 10]);
        env.reset().unwrap();
        let result = env.step(Action::Double).unwrap();
        // Dealer draws an Ace to hard 17.
        assert_eq!(env.dealer_hand().get_cards(), &[10, 6, 1]);
        assert_eq!(result.observation.player_sum, 21);
        assert_eq!(result.reward, 2.0);
        assert!(result.done);
    }

    #[test]
    fn first_move_double_bust_loses_two() {
        let mut env = stacked_env(Rule::default(), &[10, 7, 10, 2, 10]);
        env.reset().unwrap();
        let result = env.step(Action::Double).unwrap();
        assert_eq!(result.reward, -2.0);
        assert!(result.done);
        assert_eq!(result.observation.count_signal, half_points(&[10, 7, 10, 2, 10]));
    }

    #[test]
    fn late_double_is_penalised() {
        let mut env = stacked_env(Rule::default(), &[10, 7, 2, 3, 4, 5]);
        env.reset().unwrap();
        assert!(!env.step(Action::Hit).unwrap().done);
        let result = env.step(Action::Double).unwrap();
        assert_eq!(env.player_hand().get_cards(), &[2, 3, 4, 5]);
        assert_eq!(result.reward, LATE_DOUBLE_REWARD);
        assert!(result.done);
    }

    #[test]
    fn step_requires_running_episode() {
        let mut env = BlackjackCountingEnv::new(Rule::default(), 0);
        assert_eq!(
            env.step(Action::Hit).unwrap_err(),
            EnvError::PhaseNotAllowed {
                operation: "step",
                required: EpisodePhase::AwaitingAction,
                actual: EpisodePhase::NotStarted,
            }
        );

        env.reset().unwrap();
        env.step(Action::Stick).unwrap();
        assert!(matches!(
            env.step(Action::Stick),
            Err(EnvError::PhaseNotAllowed {
                actual: EpisodePhase::Terminal,
                ..
            })
        ));
    }

    #[test]
    fn invalid_action_index_is_rejected() {
        let mut env = BlackjackCountingEnv::new(Rule::default(), 0);
        env.reset().unwrap();
        assert_eq!(env.step_index(3).unwrap_err(), EnvError::InvalidAction(3));
        assert_eq!(env.phase(), EpisodePhase::AwaitingAction);
        assert!(env.step_index(0).unwrap().done);
    }

    #[test]
    fn same_seed_same_trajectory() {
        let mut env1 = BlackjackCountingEnv::new(Rule::default(), 42);
        let mut env2 = BlackjackCountingEnv::new(Rule::default(), 42);
        assert_eq!(play_script(&mut env1, 50), play_script(&mut env2, 50));
        assert_eq!(env1.get_deck(), env2.get_deck());
    }

    #[test]
    fn reseeding_reproduces_draws() {
        let mut env1 = BlackjackCountingEnv::new(Rule::default(), 5);
        let mut env2 = BlackjackCountingEnv::new(Rule::default(), 9);
        env2.seed(5);
        assert_eq!(play_script(&mut env1, 20), play_script(&mut env2, 20));
    }

    #[test]
    fn reshuffle_restarts_count() {
        let mut env = BlackjackCountingEnv::new(Rule::default(), 7);
        let mut reshuffles = 0;
        for _ in 0..200 {
            let depleted = env.get_deck().len() <= shoe::RESHUFFLE_THRESHOLD;
            let observation = env.reset().unwrap();
            if depleted {
                reshuffles += 1;
                assert_eq!(env.get_deck().len(), 48);
                let visible: Vec<u8> = env
                    .player_hand()
                    .get_cards()
                    .iter()
                    .copied()
                    .chain(std::iter::once(observation.dealer_up_card))
                    .collect();
                assert_eq!(observation.count_signal, half_points(&visible));
            }
            while !env.step(Action::Stick).unwrap().done {}
        }
        assert!(reshuffles > 0);
    }

    #[test]
    fn count_matches_dealt_cards_after_each_episode() {
        let mut env = BlackjackCountingEnv::new(Rule::default(), 3);
        let mut dealt: Vec<u8> = Vec::new();
        for _ in 0..30 {
            if env.get_deck().len() <= shoe::RESHUFFLE_THRESHOLD {
                dealt.clear();
            }
            play_script(&mut env, 1);
            dealt.extend(env.dealer_hand().get_cards());
            dealt.extend(env.player_hand().get_cards());
            assert_eq!(env.count_signal(), half_points(&dealt));
        }
    }

    #[test]
    fn observations_stay_in_space() {
        let mut env = BlackjackCountingEnv::new(Rule::default(), 13);
        let space = env.observation_space();
        let mut rng = ChaCha8Rng::seed_from_u64(13);
        for _ in 0..500 {
            let observation = env.reset().unwrap();
            assert!(space.contains(&observation));
            loop {
                let action = env.action_space().sample(&mut rng).unwrap();
                let result = env.step(action).unwrap();
                assert!(space.contains(&result.observation));
                assert!(result.observation.count_index() <= 92);
                if result.done {
                    break;
                }
            }
        }
    }

    #[test]
    fn hard_reset_restores_full_shoe() {
        let mut env = BlackjackCountingEnv::new(Rule::default(), 21);
        play_script(&mut env, 3);
        env.hard_reset();
        assert_eq!(env.get_deck().len(), 52);
        assert_eq!(env.count_signal(), 0);
        assert!(env.player_hand().is_empty());
        assert_eq!(env.phase(), EpisodePhase::NotStarted);
    }

    #[test]
    fn drives_through_trait() {
        fn run<E: Environment<Action = Action>>(env: &mut E) -> f64 {
            env.reset().ok();
            env.step(Action::Stick).map(|result| result.reward).unwrap_or(f64::NAN)
        }
        let mut env = BlackjackCountingEnv::new(Rule::default(), 8);
        let reward = run(&mut env);
        assert!([-1.0, 0.0, 1.0].contains(&reward));
    }
}
