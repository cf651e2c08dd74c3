use std::fmt::Display;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use log::{error, info, LevelFilter};
use serde::de::DeserializeOwned;
use serde::Serialize;

use u_formulate::cp::{ListScheduleSolver, PumpkinSolver, SolverConfig};
use u_formulate::error::Result;
use u_formulate::problems::{AssemblyProblem, LocationProblem, ProductionProblem};

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Log more (-v info, -vv debug, -vvv trace). Ignored when RUST_LOG is set.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Print the plan as JSON instead of the text report.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Place departments in cities (mixed-integer program).
    Location {
        /// Instance file (JSON). Defaults to the built-in instance.
        #[arg(long)]
        data: Option<PathBuf>,
    },
    /// Plan monthly production, stock and backlog (linear program).
    Production {
        /// Instance file (JSON). Defaults to the built-in instance.
        #[arg(long)]
        data: Option<PathBuf>,
    },
    /// Schedule computer assembly on shared stations (constraint programming).
    Assembly {
        /// Instance file (JSON). Defaults to the built-in instance.
        #[arg(long)]
        data: Option<PathBuf>,

        /// Engine used for the search.
        #[arg(long, value_enum, default_value_t = Engine::Pumpkin)]
        engine: Engine,

        /// Wall-clock limit for the search, in milliseconds.
        #[arg(long)]
        time_limit_ms: Option<u64>,

        /// Maximum number of search passes (list engine only).
        #[arg(long)]
        iterations: Option<usize>,

        /// Seed for the randomized passes.
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Solve all three built-in instances.
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Engine {
    /// Exact constraint solver; proves optimality.
    Pumpkin,
    /// Priority-rule heuristic; fast, rarely proves optimality.
    List,
}

fn main() {
    let args = Args::parse();
    configure_logging(args.verbose);

    if let Err(e) = run(args) {
        error!("Execution failed, error: {e}");
        std::process::exit(1);
    }
}

fn configure_logging(verbose: u8) {
    if std::env::var_os("RUST_LOG").is_some() {
        env_logger::Builder::from_default_env().init();
        return;
    }

    let level_filter = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new().filter_level(level_filter).init();
}

fn run(args: Args) -> Result<()> {
    match args.command {
        Command::Location { data } => {
            let problem = load_or(data.as_deref(), LocationProblem::reference)?;
            emit(&problem.solve()?, args.json)
        }
        Command::Production { data } => {
            let problem = load_or(data.as_deref(), ProductionProblem::reference)?;
            emit(&problem.solve()?, args.json)
        }
        Command::Assembly {
            data,
            engine,
            time_limit_ms,
            iterations,
            seed,
        } => {
            let problem = load_or(data.as_deref(), AssemblyProblem::reference)?;
            let mut config = SolverConfig::default();
            if let Some(ms) = time_limit_ms {
                config = config.with_time_limit_ms(ms);
            }
            if let Some(n) = iterations {
                config = config.with_max_iterations(n);
            }
            if let Some(s) = seed {
                config = config.with_seed(s);
            }
            let plan = match engine {
                Engine::Pumpkin => problem.solve_with(&PumpkinSolver::new(), &config)?,
                Engine::List => problem.solve_with(&ListScheduleSolver::new(), &config)?,
            };
            emit(&plan, args.json)
        }
        Command::All => {
            let location = LocationProblem::reference().solve()?;
            let production = ProductionProblem::reference().solve()?;
            let assembly = AssemblyProblem::reference().solve(&SolverConfig::default())?;

            if args.json {
                let all = serde_json::json!({
                    "location": location,
                    "production": production,
                    "assembly": assembly,
                });
                println!("{}", serde_json::to_string_pretty(&all)?);
            } else {
                println!("{location}");
                println!("{production}");
                print!("{assembly}");
            }
            Ok(())
        }
    }
}

/// Reads an instance from `path`, or builds the default one.
fn load_or<T: DeserializeOwned>(path: Option<&Path>, default: impl FnOnce() -> T) -> Result<T> {
    match path {
        Some(path) => {
            info!("reading instance from {}", path.display());
            let reader = BufReader::new(File::open(path)?);
            Ok(serde_json::from_reader(reader)?)
        }
        None => Ok(default()),
    }
}

fn emit<T: Serialize + Display>(plan: &T, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(plan)?);
    } else {
        print!("{plan}");
    }
    Ok(())
}
