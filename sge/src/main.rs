//! Subtask graph environment CLI.
//!
//! Loads a game's graph dataset and plays random-agent episodes, validates
//! datasets, or lists a game's legal actions.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use rand::SeedableRng;
use rand::rngs::StdRng;

use sge::env::SubtaskEnv;
use sge::error::EnvError;
use sge::exit_codes;
use sge::games::GameKind;
use sge::io::config::{EnvConfig, load_config};
use sge::io::graph_store::GraphInstanceStore;
use sge::logging;
use sge::rollout::run_random_episode;

#[derive(Parser)]
#[command(
    name = "sge",
    version,
    about = "Subtask graph execution environment"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Play random-agent episodes and print every step.
    Run(RunArgs),
    /// Load a graph dataset and check it against the schema and invariants.
    Validate(DatasetArgs),
    /// List the legal actions of a game.
    Actions {
        #[arg(long, default_value = "mining")]
        game: GameKind,
    },
}

/// Config file plus per-field overrides.
#[derive(Args)]
struct DatasetArgs {
    /// TOML config; defaults apply when the file is missing.
    #[arg(long, default_value = "sge.toml")]
    config: PathBuf,
    #[arg(long)]
    game: Option<GameKind>,
    #[arg(long)]
    graph_param: Option<String>,
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

impl DatasetArgs {
    fn load(&self) -> Result<EnvConfig> {
        let mut cfg = load_config(&self.config)?;
        if let Some(game) = self.game {
            cfg.game = game;
        }
        if let Some(param) = &self.graph_param {
            cfg.graph_param = param.clone();
        }
        if let Some(dir) = &self.data_dir {
            cfg.data_dir = dir.clone();
        }
        Ok(cfg)
    }
}

#[derive(Args)]
struct RunArgs {
    #[command(flatten)]
    dataset: DatasetArgs,
    #[arg(long)]
    game_len: Option<usize>,
    #[arg(long)]
    gamma: Option<f64>,
    #[arg(long)]
    seed: Option<u64>,
    /// Play this graph (modulo the dataset size) instead of a random one.
    #[arg(long)]
    graph_index: Option<usize>,
    #[arg(long, default_value_t = 1)]
    episodes: usize,
    /// Print only the per-episode summary.
    #[arg(long)]
    quiet: bool,
}

fn main() {
    logging::init();
    if let Err(err) = run() {
        eprintln!("{:#}", err);
        std::process::exit(exit_code(&err));
    }
}

fn exit_code(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<EnvError>() {
        Some(EnvError::Generation(_)) => exit_codes::FAILED,
        _ => exit_codes::INVALID,
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Run(args) => cmd_run(&args),
        Command::Validate(args) => cmd_validate(&args),
        Command::Actions { game } => cmd_actions(game),
    }
}

fn cmd_run(args: &RunArgs) -> Result<()> {
    let mut cfg = args.dataset.load()?;
    if let Some(game_len) = args.game_len {
        cfg.game_len = game_len;
    }
    if let Some(gamma) = args.gamma {
        cfg.gamma = gamma;
    }
    if args.seed.is_some() {
        cfg.seed = args.seed;
    }
    cfg.validate()?;

    let mut env = SubtaskEnv::from_config(&cfg)?;
    let mut agent_rng = match cfg.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    for episode in 0..args.episodes {
        // Later episodes continue the same RNG stream.
        let seed = if episode == 0 { cfg.seed } else { None };
        let summary = run_random_episode(
            &mut env,
            seed,
            args.graph_index,
            &mut agent_rng,
            |record| {
                if !args.quiet {
                    println!(
                        "Step={:02}, Action={}, Reward={:.2}, Done={}",
                        record.step, record.action, record.reward, record.done
                    );
                }
            },
        )
        .with_context(|| format!("episode {}", episode))?;

        if !args.quiet {
            println!("{}", env.status_line()?);
            for row in env.status_rows()? {
                println!(
                    "  [{}] {:<20} obj={:<2} +{:<5.2} {}",
                    row.key, row.name, row.object, row.reward, row.status
                );
            }
        }
        println!(
            "episode={} graph={} steps={}/{} return={:.2} completed={}/{} failed={} game_over={} time_over={}",
            episode,
            summary.graph_index,
            summary.steps,
            summary.episode_length,
            summary.cumulative_return,
            summary.completed,
            summary.subtasks,
            summary.failed,
            summary.game_over,
            summary.time_over
        );
    }
    Ok(())
}

fn cmd_validate(args: &DatasetArgs) -> Result<()> {
    let cfg = args.load()?;
    let path = cfg.dataset_path();
    let config = cfg.game.config();
    let store = GraphInstanceStore::load(&path, config.nb_subtask_type())?;
    if store.is_empty() {
        bail!("dataset {} holds no graphs", path.display());
    }
    println!("{}: {} graphs", path.display(), store.len());
    for (index, graph) in store.iter().enumerate() {
        println!(
            "  graph {}: {} subtasks, {} levels, {} gates",
            index,
            graph.len(),
            graph.num_levels(),
            graph.num_gates()
        );
    }
    Ok(())
}

fn cmd_actions(game: GameKind) -> Result<()> {
    let config = game.config();
    for action in config.legal_actions() {
        match config.operation(action) {
            Some(op) => println!("{} {} [{}] {}", action.code(), action, op.key, op.name),
            None => println!("{} {}", action.code(), action),
        }
    }
    Ok(())
}
