//! Episode controller: binds a graph instance, its completion state and a
//! generated grid into one reset/step environment.

use std::sync::Arc;

use anyhow::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::core::completion::{AttemptOutcome, CompletionState, project_to_ids};
use crate::core::graph::GraphInstance;
use crate::core::grid::{GridState, OBJ_LAYER_BIAS, Observation};
use crate::core::simulator::GridWorld;
use crate::core::status::{SubtaskStatus, statuses};
use crate::core::types::{Action, ObjectKind, SubtaskId};
use crate::error::EnvError;
use crate::games::{GameConfig, GameKind};
use crate::io::config::EnvConfig;
use crate::io::graph_store::GraphInstanceStore;

/// Per-environment episode parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpisodeSettings {
    /// Base episode length before the per-reset `[0.8, 1.2)` scaling.
    pub game_len: usize,
    /// Flat multiplier on each step's reward when accumulating the return.
    pub gamma: f64,
}

impl Default for EpisodeSettings {
    fn default() -> Self {
        Self {
            game_len: 70,
            gamma: 0.99,
        }
    }
}

/// Observation returned by `reset` and `step`.
///
/// Subtask vectors are projected onto the game's full subtask-kind id space;
/// ids outside the active graph read as `0.0`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct State {
    pub observation: Observation,
    pub mask: Vec<f32>,
    pub completion: Vec<f32>,
    pub eligibility: Vec<f32>,
    /// Steps remaining before the time budget runs out.
    pub step: i64,
}

/// Auxiliary per-step information.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepInfo {
    pub graph_index: usize,
    /// Subtask attempted this step, if the interaction matched one in the graph.
    pub attempted: Option<SubtaskId>,
    pub succeeded: bool,
    pub step_count: usize,
    pub episode_length: usize,
    pub game_over: bool,
    pub time_over: bool,
    pub cumulative_return: f64,
}

/// Element type of a [`State`] field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DType {
    U8,
    F32,
    I64,
}

/// Shape and dtype of one [`State`] field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
    pub name: &'static str,
    pub dtype: DType,
    pub shape: Vec<usize>,
}

/// One line of the subtask status table a renderer draws.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusRow {
    pub id: SubtaskId,
    pub name: String,
    pub object: ObjectKind,
    pub key: char,
    pub reward: f64,
    pub status: SubtaskStatus,
}

#[derive(Debug, Clone)]
struct Episode {
    graph_index: usize,
    graph: GraphInstance,
    completion: CompletionState,
    step_count: usize,
    episode_length: usize,
    ret: f64,
    reward: f64,
    attempted: Option<SubtaskId>,
    succeeded: bool,
    game_over: bool,
    time_over: bool,
}

impl Episode {
    fn is_done(&self) -> bool {
        self.game_over || self.time_over
    }
}

/// Subtask graph environment.
///
/// `Idle` until the first successful [`SubtaskEnv::reset`], then `Ready`
/// until a step reports `done`, then `Terminated` until the next reset.
#[derive(Debug)]
pub struct SubtaskEnv {
    config: Arc<GameConfig>,
    store: GraphInstanceStore,
    settings: EpisodeSettings,
    rng: StdRng,
    world: GridWorld,
    episode: Option<Episode>,
}

impl SubtaskEnv {
    /// Environment over an already-loaded store. Without a seed the RNG is
    /// seeded from OS entropy.
    ///
    /// The store must have been validated against `game`'s subtask id space.
    pub fn new(
        game: GameKind,
        store: GraphInstanceStore,
        settings: EpisodeSettings,
        seed: Option<u64>,
    ) -> Result<Self, EnvError> {
        let config = Arc::new(game.config());
        if store.nb_subtask_type() != config.nb_subtask_type() {
            return Err(EnvError::StoreMismatch {
                expected: config.nb_subtask_type(),
                found: store.nb_subtask_type(),
            });
        }
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self {
            world: GridWorld::new(Arc::clone(&config)),
            config,
            store,
            settings,
            rng,
            episode: None,
        })
    }

    /// Load the configured dataset and build the environment.
    pub fn from_config(cfg: &EnvConfig) -> Result<Self> {
        cfg.validate()?;
        let config = cfg.game.config();
        let store = GraphInstanceStore::load(&cfg.dataset_path(), config.nb_subtask_type())?;
        let settings = EpisodeSettings {
            game_len: cfg.game_len,
            gamma: cfg.gamma,
        };
        Ok(Self::new(cfg.game, store, settings, cfg.seed)?)
    }

    /// Start a new episode.
    ///
    /// Reseeds the RNG when `seed` is given, then draws (in order) the graph
    /// (unless `graph_index` is given, which is taken modulo the store size),
    /// the episode length and the grid. On error no episode is active.
    pub fn reset(
        &mut self,
        seed: Option<u64>,
        graph_index: Option<usize>,
    ) -> Result<(State, StepInfo), EnvError> {
        self.episode = None;
        if let Some(seed) = seed {
            self.rng = StdRng::seed_from_u64(seed);
        }

        let selected = match graph_index {
            Some(index) => self.store.select(index),
            None => self.store.random(&mut self.rng),
        };
        let (graph_index, graph) = selected.ok_or(EnvError::EmptyStore)?;
        let graph = graph.clone();

        let scale: f64 = self.rng.gen_range(0.8..1.2);
        let episode_length = ((scale * self.settings.game_len as f64) as usize).max(1);

        if let Err(err) = self.world.reset(graph.subtask_ids(), &mut self.rng) {
            warn!(error = %err, graph_index, "grid generation failed");
            return Err(err.into());
        }

        debug!(
            ?seed,
            graph_index,
            episode_length,
            subtasks = graph.len(),
            "episode reset"
        );
        self.episode = Some(Episode {
            graph_index,
            completion: CompletionState::new(&graph),
            graph,
            step_count: 0,
            episode_length,
            ret: 0.0,
            reward: 0.0,
            attempted: None,
            succeeded: false,
            game_over: false,
            time_over: false,
        });
        let state = self.state()?;
        let info = self.info()?;
        Ok((state, info))
    }

    /// Advance one step.
    ///
    /// Returns `(state, reward, done, info)`. Precondition violations are
    /// reported before anything changes.
    pub fn step(&mut self, action: Action) -> Result<(State, f64, bool, StepInfo), EnvError> {
        let episode = self.episode.as_ref().ok_or(EnvError::NotReset)?;
        if episode.is_done() {
            return Err(EnvError::Terminated);
        }
        if !self.config.is_legal(action) {
            return Err(EnvError::IllegalAction { action });
        }

        let acted_on = self.world.act(action, &mut self.rng)?;
        let episode = self.episode.as_mut().ok_or(EnvError::NotReset)?;

        // Only (action, kind) pairs naming a subtask of the active graph count.
        let attempt = acted_on
            .and_then(|kind| self.config.subtask_id(action, kind))
            .and_then(|id| episode.graph.index_of(id).map(|ind| (id, ind)));

        let mut reward = 0.0;
        let mut succeeded = false;
        if let Some((id, ind)) = attempt {
            let outcome = episode.completion.attempt(ind, &episode.graph);
            succeeded = outcome == AttemptOutcome::Completed;
            if succeeded {
                reward += episode.graph.reward(ind);
            }
            debug!(subtask = id, ?outcome, reward, "subtask attempt");
        }
        let attempted = attempt.map(|(id, _)| id);

        episode.reward = reward;
        episode.ret += reward * self.settings.gamma;
        episode.step_count += 1;
        episode.attempted = attempted;
        episode.succeeded = succeeded;
        episode.time_over = episode.step_count >= episode.episode_length;
        episode.game_over = !episode.completion.has_actionable();
        let done = episode.is_done();
        if done {
            info!(
                steps = episode.step_count,
                game_over = episode.game_over,
                time_over = episode.time_over,
                ret = episode.ret,
                "episode finished"
            );
        }

        let state = self.state()?;
        let info = self.info()?;
        Ok((state, reward, done, info))
    }

    /// Current observation; requires an active episode.
    pub fn state(&self) -> Result<State, EnvError> {
        let episode = self.episode.as_ref().ok_or(EnvError::NotReset)?;
        let grid = self.world.grid().ok_or(EnvError::NotReset)?;
        let nb_subtask_type = self.config.nb_subtask_type();
        let completion = &episode.completion;
        Ok(State {
            observation: grid.observation(self.config.nb_obj_type()),
            mask: project_to_ids(completion.mask(), &episode.graph, nb_subtask_type),
            completion: project_to_ids(completion.completion(), &episode.graph, nb_subtask_type),
            eligibility: project_to_ids(completion.eligibility(), &episode.graph, nb_subtask_type),
            step: episode.episode_length as i64 - episode.step_count as i64,
        })
    }

    fn info(&self) -> Result<StepInfo, EnvError> {
        let episode = self.episode.as_ref().ok_or(EnvError::NotReset)?;
        Ok(StepInfo {
            graph_index: episode.graph_index,
            attempted: episode.attempted,
            succeeded: episode.succeeded,
            step_count: episode.step_count,
            episode_length: episode.episode_length,
            game_over: episode.game_over,
            time_over: episode.time_over,
            cumulative_return: episode.ret,
        })
    }

    /// Shapes and dtypes of the [`State`] fields.
    pub fn state_spec(&self) -> Vec<FieldSpec> {
        let nb_subtask_type = self.config.nb_subtask_type();
        vec![
            FieldSpec {
                name: "observation",
                dtype: DType::U8,
                shape: vec![
                    self.config.nb_obj_type() + OBJ_LAYER_BIAS,
                    self.config.width,
                    self.config.height,
                ],
            },
            FieldSpec {
                name: "mask",
                dtype: DType::F32,
                shape: vec![nb_subtask_type],
            },
            FieldSpec {
                name: "completion",
                dtype: DType::F32,
                shape: vec![nb_subtask_type],
            },
            FieldSpec {
                name: "eligibility",
                dtype: DType::F32,
                shape: vec![nb_subtask_type],
            },
            FieldSpec {
                name: "step",
                dtype: DType::I64,
                shape: Vec::new(),
            },
        ]
    }

    pub fn legal_actions(&self) -> Vec<Action> {
        self.config.legal_actions()
    }

    /// Status of every subtask of the active graph, in index order.
    pub fn status_rows(&self) -> Result<Vec<StatusRow>, EnvError> {
        let episode = self.episode.as_ref().ok_or(EnvError::NotReset)?;
        let rows = statuses(&episode.completion)
            .into_iter()
            .enumerate()
            .map(|(ind, status)| {
                let id = episode.graph.id_of(ind);
                let subtask = self.config.subtask(id);
                let key = self
                    .config
                    .operation(subtask.action)
                    .map_or('?', |op| op.key);
                StatusRow {
                    id,
                    name: subtask.name.clone(),
                    object: subtask.object,
                    key,
                    reward: episode.graph.reward(ind),
                    status,
                }
            })
            .collect();
        Ok(rows)
    }

    /// `Step=SS/LL | Return=+R.RR | Reward=+R.RR`
    pub fn status_line(&self) -> Result<String, EnvError> {
        let episode = self.episode.as_ref().ok_or(EnvError::NotReset)?;
        Ok(format!(
            "Step={:02}/{:02} | Return={:+.2} | Reward={:+.2}",
            episode.step_count, episode.episode_length, episode.ret, episode.reward
        ))
    }

    pub fn is_done(&self) -> bool {
        self.episode.as_ref().is_some_and(Episode::is_done)
    }

    pub fn game_config(&self) -> &GameConfig {
        &self.config
    }

    pub fn store(&self) -> &GraphInstanceStore {
        &self.store
    }

    /// Active graph, if an episode is running.
    pub fn graph(&self) -> Option<&GraphInstance> {
        self.episode.as_ref().map(|episode| &episode.graph)
    }

    /// Active grid, if an episode is running.
    pub fn grid(&self) -> Option<&GridState> {
        self.episode.as_ref().and(self.world.grid())
    }

    /// Raw per-index completion state of the active graph.
    pub fn completion_state(&self) -> Option<&CompletionState> {
        self.episode.as_ref().map(|episode| &episode.completion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{flat_record, path_to, worked_example_record};

    fn mining_env(records: Vec<crate::core::graph::GraphRecord>, seed: u64) -> SubtaskEnv {
        let store = GraphInstanceStore::from_records(records, 26).expect("store");
        SubtaskEnv::new(
            GameKind::Mining,
            store,
            EpisodeSettings::default(),
            Some(seed),
        )
        .expect("env")
    }

    #[test]
    fn step_before_reset_is_an_error() {
        let mut env = mining_env(vec![worked_example_record()], 0);
        assert_eq!(env.step(Action::Up).map(|_| ()), Err(EnvError::NotReset));
        assert_eq!(env.state().map(|_| ()), Err(EnvError::NotReset));
    }

    #[test]
    fn reset_with_empty_store_is_an_error() {
        let mut env = mining_env(Vec::new(), 0);
        assert_eq!(env.reset(None, None).map(|_| ()), Err(EnvError::EmptyStore));
    }

    #[test]
    fn reset_initialises_episode() {
        let mut env = mining_env(vec![worked_example_record()], 1);
        let (state, info) = env.reset(None, Some(0)).expect("reset");

        assert_eq!(info.step_count, 0);
        assert!((56..=84).contains(&info.episode_length));
        assert_eq!(state.step, info.episode_length as i64);
        assert_eq!(&state.mask[..4], &[1.0, 1.0, 1.0, 0.0]);
        assert_eq!(&state.completion[..3], &[0.0, 0.0, 0.0]);
        assert_eq!(&state.eligibility[..3], &[1.0, 1.0, 0.0]);
        assert_eq!(state.observation.shape(), [16, 10, 10]);
        assert!(env.grid().expect("grid").is_connected());
    }

    #[test]
    fn graph_index_wraps() {
        let records = vec![flat_record(&[0], 1.0), flat_record(&[1], 1.0)];
        let mut env = mining_env(records, 2);
        let (_, info) = env.reset(None, Some(5)).expect("reset");
        assert_eq!(info.graph_index, 1);
    }

    #[test]
    fn illegal_action_leaves_episode_untouched() {
        let store = GraphInstanceStore::from_records(vec![flat_record(&[0], 1.0)], 16)
            .expect("store");
        let mut env = SubtaskEnv::new(
            GameKind::Playground,
            store,
            EpisodeSettings::default(),
            Some(4),
        )
        .expect("env");
        env.reset(None, None).expect("reset");
        let before = env.state().expect("state");

        assert_eq!(
            env.step(Action::Use4).map(|_| ()),
            Err(EnvError::IllegalAction {
                action: Action::Use4
            })
        );
        assert_eq!(env.state().expect("state"), before);
        assert_eq!(env.info().expect("info").step_count, 0);
    }

    /// Picking up the only tree completes "Cut wood" and ends the game.
    #[test]
    fn picking_up_required_item_rewards_and_masks() {
        let mut env = mining_env(vec![flat_record(&[0], 0.7)], 8);
        env.reset(None, None).expect("reset");

        let grid = env.grid().expect("grid");
        let tree = grid
            .objects()
            .iter()
            .find(|obj| obj.kind == 2)
            .expect("tree")
            .pos;
        let path = path_to(grid, tree).expect("reachable");
        for action in path {
            let (_, reward, done, _) = env.step(action).expect("move");
            assert_eq!(reward, 0.0);
            assert!(!done);
        }

        let trees_before = env
            .grid()
            .expect("grid")
            .objects()
            .iter()
            .filter(|obj| obj.kind == 2)
            .count();
        let (state, reward, done, info) = env.step(Action::Pickup).expect("pickup");
        assert_eq!(reward, 0.7);
        assert_eq!(info.attempted, Some(0));
        assert!(info.succeeded);
        assert_eq!(state.completion[0], 1.0);
        assert_eq!(state.mask[0], 0.0);
        assert!(done);
        assert!(info.game_over);
        let trees_after = env
            .grid()
            .expect("grid")
            .objects()
            .iter()
            .filter(|obj| obj.kind == 2)
            .count();
        assert_eq!(trees_after + 1, trees_before);

        assert_eq!(env.step(Action::Up).map(|_| ()), Err(EnvError::Terminated));
    }

    #[test]
    fn return_uses_flat_discount() {
        let mut env = mining_env(vec![flat_record(&[0], 1.0)], 8);
        env.reset(None, None).expect("reset");
        let grid = env.grid().expect("grid");
        let tree = grid
            .objects()
            .iter()
            .find(|obj| obj.kind == 2)
            .expect("tree")
            .pos;
        for action in path_to(grid, tree).expect("reachable") {
            env.step(action).expect("move");
        }
        let (_, _, _, info) = env.step(Action::Pickup).expect("pickup");
        assert!((info.cumulative_return - 0.99).abs() < 1e-12);
        assert!(env.status_line().expect("line").contains("Return=+0.99"));
    }

    #[test]
    fn time_budget_terminates_episode() {
        let settings = EpisodeSettings {
            game_len: 5,
            gamma: 1.0,
        };
        let store =
            GraphInstanceStore::from_records(vec![worked_example_record()], 26).expect("store");
        let mut env = SubtaskEnv::new(GameKind::Mining, store, settings, Some(3)).expect("env");
        let (_, info) = env.reset(None, None).expect("reset");
        let length = info.episode_length;
        assert!((4..=6).contains(&length));

        let mut steps = 0;
        loop {
            let (_, _, done, info) = env.step(Action::Up).expect("step");
            steps += 1;
            if done {
                assert!(info.time_over);
                break;
            }
        }
        assert_eq!(steps, length);
        assert!(env.is_done());
    }

    #[test]
    fn state_spec_matches_state() {
        let mut env = mining_env(vec![worked_example_record()], 0);
        let (state, _) = env.reset(None, None).expect("reset");
        let spec = env.state_spec();
        assert_eq!(spec[0].shape, state.observation.shape().to_vec());
        assert_eq!(spec[1].shape, vec![state.mask.len()]);
        assert_eq!(spec[4].dtype, DType::I64);
        assert!(spec[4].shape.is_empty());
    }

    #[test]
    fn status_rows_name_active_subtasks() {
        let mut env = mining_env(vec![worked_example_record()], 0);
        env.reset(None, None).expect("reset");
        let rows = env.status_rows().expect("rows");
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].name, "Cut wood");
        assert_eq!(rows[0].key, 'p');
        assert_eq!(rows[2].status, SubtaskStatus::Ineligible);
        assert_eq!(
            env.status_line().expect("line"),
            format!(
                "Step=00/{:02} | Return=+0.00 | Reward=+0.00",
                env.info().expect("info").episode_length
            )
        );
    }

    #[test]
    fn store_for_another_game_is_rejected() {
        let store = GraphInstanceStore::from_records(vec![flat_record(&[20], 1.0)], 26)
            .expect("store");
        let err = SubtaskEnv::new(
            GameKind::Playground,
            store,
            EpisodeSettings::default(),
            Some(0),
        )
        .map(|_| ())
        .expect_err("mismatched store");
        assert_eq!(
            err,
            EnvError::StoreMismatch {
                expected: 16,
                found: 26
            }
        );
    }

    const WORKSPACE: ObjectKind = 0;

    /// Env over "Cut wood" + "Make stone pickaxe" with the agent standing on
    /// the workspace.
    fn env_at_workspace(seed: u64) -> SubtaskEnv {
        let mut env = mining_env(vec![flat_record(&[0, 7], 0.5)], seed);
        env.reset(None, None).expect("reset");
        let grid = env.grid().expect("grid");
        let workspace = grid
            .objects()
            .iter()
            .find(|obj| obj.kind == WORKSPACE)
            .expect("workspace")
            .pos;
        for action in path_to(grid, workspace).expect("reachable") {
            env.step(action).expect("move");
        }
        env
    }

    /// USE_2 on the workspace is "Make iron pickaxe", which is not in the graph.
    #[test]
    fn subtask_outside_active_graph_is_a_plain_step() {
        let mut env = env_at_workspace(6);
        let before = env.state().expect("state");

        let (state, reward, done, info) = env.step(Action::Use2).expect("step");
        assert_eq!(info.attempted, None);
        assert!(!info.succeeded);
        assert_eq!(reward, 0.0);
        assert!(!done);
        assert_eq!(state.mask, before.mask);
        assert_eq!(state.completion, before.completion);
        assert_eq!(state.eligibility, before.eligibility);
        assert_eq!(state.step, before.step - 1);
    }

    /// No mining subtask picks up a station.
    #[test]
    fn interaction_matching_no_subtask_is_a_plain_step() {
        let mut env = env_at_workspace(7);
        let before = env.state().expect("state");

        let (state, reward, done, info) = env.step(Action::Pickup).expect("step");
        assert_eq!(info.attempted, None);
        assert_eq!(reward, 0.0);
        assert!(!done);
        assert_eq!(state.mask, before.mask);
        assert_eq!(state.completion, before.completion);
        assert_eq!(
            env.grid().expect("grid").item_at(env.grid().expect("grid").agent()),
            Some(WORKSPACE)
        );
    }

    #[test]
    fn repeated_attempt_earns_nothing() {
        let mut env = env_at_workspace(8);

        let (first, reward, done, info) = env.step(Action::Use1).expect("craft");
        assert_eq!(info.attempted, Some(7));
        assert!(info.succeeded);
        assert_eq!(reward, 0.5);
        assert!(!done);
        assert_eq!(first.completion[7], 1.0);
        assert_eq!(first.mask[7], 0.0);

        let (second, reward, done, info) = env.step(Action::Use1).expect("craft again");
        assert_eq!(info.attempted, Some(7));
        assert!(!info.succeeded);
        assert_eq!(reward, 0.0);
        assert!(!done);
        assert_eq!(second.completion, first.completion);
        assert_eq!(second.mask, first.mask);
        assert!((info.cumulative_return - 0.5 * 0.99).abs() < 1e-12);
    }

    #[test]
    fn same_seed_reproduces_episode() {
        let records = vec![worked_example_record(), flat_record(&[3, 4], 0.5)];
        let mut a = mining_env(records.clone(), 0);
        let mut b = mining_env(records, 99);
        let (state_a, info_a) = a.reset(Some(17), None).expect("reset");
        let (state_b, info_b) = b.reset(Some(17), None).expect("reset");
        assert_eq!(state_a, state_b);
        assert_eq!(info_a, info_b);

        for action in [Action::Up, Action::Left, Action::Pickup, Action::Down] {
            let step_a = a.step(action).expect("step");
            let step_b = b.step(action).expect("step");
            assert_eq!(step_a, step_b);
        }
    }
}
