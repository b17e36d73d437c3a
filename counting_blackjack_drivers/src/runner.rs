use counting_blackjack::{Action, EnvError, Environment, Observation, StepResult};
use log::{debug, info};
use serde::{Deserialize, Serialize};

/// Receives the events of a run of episodes.
pub trait EpisodeHandler {
    fn on_episode_begin(&mut self, episode: u64, observation: &Observation);
    fn on_step(&mut self, action: Action, result: &StepResult<Observation>);
    fn on_episode_end(&mut self, episode: u64, record: &EpisodeRecord);
}

/// The actions and rewards of one finished episode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EpisodeRecord {
    pub initial_count_signal: i32,
    pub actions: Vec<Action>,
    pub rewards: Vec<f64>,
}

impl EpisodeRecord {
    pub fn total_reward(&self) -> f64 {
        self.rewards.iter().sum()
    }
}

/// Plays the given number of episodes, asking the policy for every action.
pub fn run_episodes<E, P, H>(
    env: &mut E,
    episodes: u64,
    mut policy: P,
    handler: &mut H,
) -> Result<(), EnvError>
where
    E: Environment<Action = Action, Observation = Observation, Error = EnvError>,
    P: FnMut(&Observation) -> Action,
    H: EpisodeHandler,
{
    for episode in 0..episodes {
        let mut observation = env.reset()?;
        handler.on_episode_begin(episode, &observation);
        let mut record = EpisodeRecord {
            initial_count_signal: observation.count_signal,
            ..Default::default()
        };

        loop {
            let action = policy(&observation);
            let result = env.step(action)?;
            handler.on_step(action, &result);
            record.actions.push(action);
            record.rewards.push(result.reward);
            observation = result.observation;
            if result.done {
                break;
            }
        }

        debug!(
            "Episode #{}: {:?}, reward {}",
            episode,
            record.actions,
            record.total_reward()
        );
        handler.on_episode_end(episode, &record);
    }
    info!("Finished {} episodes", episodes);
    Ok(())
}

/// Aggregates the results of finished episodes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Statistics {
    episodes: u64,
    wins: u64,
    losses: u64,
    pushes: u64,
    late_doubles: u64,

    total_reward: f64,
    min_total_reward: f64,
}

impl Statistics {
    pub fn get_episodes(&self) -> u64 {
        self.episodes
    }

    pub fn get_wins(&self) -> u64 {
        self.wins
    }

    pub fn get_losses(&self) -> u64 {
        self.losses
    }

    pub fn get_pushes(&self) -> u64 {
        self.pushes
    }

    /// Episodes that ended with a double after the first move.
    pub fn get_late_doubles(&self) -> u64 {
        self.late_doubles
    }

    pub fn get_total_reward(&self) -> f64 {
        self.total_reward
    }

    /// The lowest the cumulative reward has been.
    pub fn get_min_total_reward(&self) -> f64 {
        self.min_total_reward
    }

    pub fn get_rate(&self) -> f64 {
        if self.episodes == 0 {
            0.0
        } else {
            self.total_reward / self.episodes as f64
        }
    }
}

impl EpisodeHandler for Statistics {
    fn on_episode_begin(&mut self, _: u64, _: &Observation) {}

    fn on_step(&mut self, _: Action, _: &StepResult<Observation>) {}

    fn on_episode_end(&mut self, _: u64, record: &EpisodeRecord) {
        let reward = record.total_reward();
        self.episodes += 1;
        if reward > 0.0 {
            self.wins += 1;
        } else if reward < 0.0 {
            self.losses += 1;
        } else {
            self.pushes += 1;
        }
        if record.actions.len() > 1 && record.actions.last() == Some(&Action::Double) {
            self.late_doubles += 1;
        }

        self.total_reward += reward;
        if self.min_total_reward > self.total_reward {
            self.min_total_reward = self.total_reward;
        }
    }
}
