//! Effectron - demo CLI
//!
//! Builds a small effect program and runs it on the selected host.

use std::path::PathBuf;
use std::process;
use std::time::Instant;

use clap::{Parser, ValueEnum};
use rand::Rng;
use tracing_subscriber::EnvFilter;

use effectron::{flat_map, map, pipe, sync, Effect, EventLoop, RuntimeConfig, WorkerHost};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Host {
    /// Explicit event loop pumped on the main thread
    EventLoop,
    /// Dedicated host thread
    Worker,
    /// Tokio task (requires the `async` feature)
    Async,
}

#[derive(Debug, Parser)]
#[command(name = "effectron", version, about = "Run a lazy effect program on a trampoline")]
struct Options {
    /// Host that resumes suspended runs
    #[arg(long, value_enum, default_value_t = Host::EventLoop)]
    host: Host,

    /// Run a synthetic chain of this many flat_map stages instead of the random-sum program
    #[arg(long)]
    depth: Option<usize>,

    /// Nodes processed per host turn (overrides config file and environment)
    #[arg(long)]
    step_budget: Option<usize>,

    /// TOML runtime configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "effectron=debug",
        _ => "effectron=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(options: &Options) -> Result<RuntimeConfig, String> {
    let config = match &options.config {
        Some(path) => RuntimeConfig::load(path).map_err(|e| e.to_string())?,
        None => RuntimeConfig::default(),
    };
    let config = config.apply_env().map_err(|e| e.to_string())?;
    match options.step_budget {
        Some(step_budget) => config
            .with_step_budget(step_budget)
            .validate()
            .map_err(|e| e.to_string()),
        None => Ok(config),
    }
}

/// The random-sum program: three random draws added through two flat_maps
fn random_sum_program() -> Effect<String> {
    pipe!(
        sync(|| rand::thread_rng().gen::<f64>()),
        flat_map(|n: f64| sync(move || n + rand::thread_rng().gen::<f64>())),
        flat_map(|n: f64| sync(move || n + rand::thread_rng().gen::<f64>())),
        map(|n: f64| format!("n: {}", n)),
    )
}

fn counting_program(depth: usize) -> Effect<String> {
    let mut effect = sync(|| 0_u64);
    for _ in 0..depth {
        effect = effect.flat_map(|n| sync(move || n + 1));
    }
    effect.map(|n| format!("n: {}", n))
}

fn run_program(host: Host, config: RuntimeConfig, program: Effect<String>) -> Result<(String, u64), String> {
    match host {
        Host::EventLoop => {
            let event_loop = EventLoop::new();
            let output = event_loop.block_on(config, program).map_err(|e| e.to_string())?;
            Ok((output, event_loop.turns()))
        }
        Host::Worker => {
            let worker = WorkerHost::spawn().map_err(|e| format!("Failed to start worker: {}", e))?;
            let output = worker.block_on(config, program).map_err(|e| e.to_string())?;
            let turns = worker.turns();
            worker.shutdown();
            Ok((output, turns))
        }
        #[cfg(feature = "async")]
        Host::Async => {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_time()
                .build()
                .map_err(|e| format!("Failed to start tokio: {}", e))?;
            let output = runtime
                .block_on(effectron::run_async(config, program))
                .map_err(|e| e.to_string())?;
            // Suspensions are tokio yields, not host tasks
            Ok((output, 0))
        }
        #[cfg(not(feature = "async"))]
        Host::Async => Err("the async host requires the `async` feature".to_string()),
    }
}

fn main() {
    let options = Options::parse();
    init_tracing(options.verbose);

    let config = match load_config(&options) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(2);
        }
    };

    let program = match options.depth {
        Some(depth) => counting_program(depth),
        None => random_sum_program(),
    };

    let start = Instant::now();
    match run_program(options.host, config, program) {
        Ok((output, turns)) => {
            println!("{}", output);
            eprintln!(
                "host={:?} step_budget={} turns={} elapsed={:?}",
                options.host,
                config.step_budget,
                turns,
                start.elapsed()
            );
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}
