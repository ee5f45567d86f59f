//! Random-agent episode driver.

use rand::Rng;
use serde::Serialize;

use crate::core::status::SubtaskStatus;
use crate::core::types::Action;
use crate::env::SubtaskEnv;
use crate::error::EnvError;

/// One executed step, as printed by `sge run`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StepRecord {
    pub step: usize,
    pub action: Action,
    pub reward: f64,
    pub done: bool,
}

/// Outcome of a finished episode.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EpisodeSummary {
    pub graph_index: usize,
    pub steps: usize,
    pub episode_length: usize,
    pub cumulative_return: f64,
    pub completed: usize,
    pub failed: usize,
    pub subtasks: usize,
    pub game_over: bool,
    pub time_over: bool,
}

/// Reset `env` and play uniformly random legal actions until `done`.
///
/// Actions are drawn from `agent_rng`, which is separate from the
/// environment's own stream. `on_step` sees every step as it happens.
pub fn run_random_episode<R, F>(
    env: &mut SubtaskEnv,
    seed: Option<u64>,
    graph_index: Option<usize>,
    agent_rng: &mut R,
    mut on_step: F,
) -> Result<EpisodeSummary, EnvError>
where
    R: Rng + ?Sized,
    F: FnMut(&StepRecord),
{
    let (_, mut info) = env.reset(seed, graph_index)?;
    let actions = env.legal_actions();

    let mut step = 0;
    loop {
        // Moves are always legal, so the set is never empty.
        let action = actions[agent_rng.gen_range(0..actions.len())];
        let (_, reward, done, step_info) = env.step(action)?;
        on_step(&StepRecord {
            step,
            action,
            reward,
            done,
        });
        info = step_info;
        step += 1;
        if done {
            break;
        }
    }

    let rows = env.status_rows()?;
    let count = |wanted: SubtaskStatus| rows.iter().filter(|row| row.status == wanted).count();
    Ok(EpisodeSummary {
        graph_index: info.graph_index,
        steps: info.step_count,
        episode_length: info.episode_length,
        cumulative_return: info.cumulative_return,
        completed: count(SubtaskStatus::Success),
        failed: count(SubtaskStatus::Fail),
        subtasks: rows.len(),
        game_over: info.game_over,
        time_over: info.time_over,
    })
}
