use anyhow::Context;
use clap::{Parser, Subcommand};
use divedraw_assets::{process_csv, AssetError, HttpFetcher, ProcessOptions, DEFAULT_MAX_SIZE};
use divedraw_core::{MachineConfig, PullView, RngState, SlotMachine};
use divedraw_data::{load_items, load_machine_config, load_machine_config_or_default};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;

const DEFAULT_DATASET: &str = "helldivers_2_loadout_with_resized.csv";
const DEFAULT_INPUT: &str = "Helldivers Weapons and Strategems - helldivers_2_loadout.csv";
const EXIT_MISSING_INPUT: u8 = 2;

#[derive(Parser)]
#[command(name = "divedraw")]
#[command(version)]
#[command(about = "Loadout slot machine and its image pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Pull the lever and print a loadout
    Pull {
        /// Dataset CSV
        #[arg(short, long, default_value = DEFAULT_DATASET)]
        data: PathBuf,

        /// Machine config JSON; the built-in loadout machine when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Seed for a reproducible pull
        #[arg(short, long)]
        seed: Option<u64>,

        /// Number of pulls
        #[arg(short = 'n', long, default_value_t = 1)]
        pulls: u32,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Download and resize the images a dataset links to
    ProcessImages {
        /// Input CSV
        #[arg(short, long, default_value = DEFAULT_INPUT)]
        input: PathBuf,

        /// Output CSV with the resized-path column added
        #[arg(short, long, default_value = DEFAULT_DATASET)]
        output: PathBuf,

        /// Root folder for original and resized images
        #[arg(long, default_value = divedraw_assets::DEFAULT_ASSETS_DIR)]
        assets_dir: PathBuf,

        /// Max width/height of resized images
        #[arg(long, default_value_t = DEFAULT_MAX_SIZE)]
        max_size: u32,
    },

    /// Show how many dataset items land in each reel
    Inspect {
        #[arg(short, long, default_value = DEFAULT_DATASET)]
        data: PathBuf,

        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Validate a machine config, or print the built-in one
    CheckConfig {
        config: Option<PathBuf>,
    },
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .try_init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if let Some(AssetError::MissingInput(path)) = err.downcast_ref::<AssetError>() {
                error!("input CSV not found: {path}");
                return ExitCode::from(EXIT_MISSING_INPUT);
            }
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Pull {
            data,
            config,
            seed,
            pulls,
            json,
        } => pull(&data, config.as_deref(), seed, pulls, json),
        Command::ProcessImages {
            input,
            output,
            assets_dir,
            max_size,
        } => {
            let options = ProcessOptions {
                assets_root: assets_dir,
                max_size,
                ..ProcessOptions::default()
            };
            let fetcher = HttpFetcher::new().context("build http client")?;
            let report = process_csv(&input, &output, &options, &fetcher)?;
            println!(
                "Wrote updated CSV: {} ({} resized, {} reused, {} without image, {} failed)",
                output.display(),
                report.processed,
                report.cached,
                report.skipped,
                report.failed
            );
            Ok(())
        }
        Command::Inspect { data, config } => {
            let machine = build_machine(&data, config.as_deref())?;
            println!("{} items", machine.items().len());
            for (reel, size) in machine.pool_sizes() {
                let spec = machine.config().reel(reel).context("reel spec")?;
                println!("  {reel:<12} {size:>4} candidates for {} slots", spec.slots);
            }
            Ok(())
        }
        Command::CheckConfig { config } => {
            match config {
                Some(path) => {
                    let config = load_machine_config(&path)?;
                    println!(
                        "{}: ok ({} reels, {} slots)",
                        path.display(),
                        config.reels.len(),
                        config.total_slots()
                    );
                }
                None => {
                    println!("{}", serde_json::to_string_pretty(&MachineConfig::default())?);
                }
            }
            Ok(())
        }
    }
}

fn build_machine(data: &Path, config: Option<&Path>) -> anyhow::Result<SlotMachine> {
    let config = load_machine_config_or_default(config)?;
    let items = load_items(data)?;
    Ok(SlotMachine::new(config, items)?)
}

fn pull(
    data: &Path,
    config: Option<&Path>,
    seed: Option<u64>,
    pulls: u32,
    json: bool,
) -> anyhow::Result<()> {
    let machine = build_machine(data, config)?;
    let mut seeds = match seed {
        Some(seed) => RngState::from_seed(seed),
        None => RngState::from_entropy(),
    };
    for round in 0..pulls {
        // First pull uses the given seed directly so it can be replayed.
        let pull_seed = if round == 0 && seed.is_some() {
            seeds.seed()
        } else {
            seeds.next_u64()
        };
        let pull = machine.pull(&mut RngState::from_seed(pull_seed));
        let view = PullView::new(&machine, &pull);
        if json {
            println!("{}", serde_json::to_string_pretty(&view)?);
        } else {
            print_pull(&view);
        }
    }
    Ok(())
}

fn print_pull(view: &PullView) {
    println!("seed {}", view.seed);
    for reel in &view.reels {
        println!("{}", reel.label);
        for slot in &reel.slots {
            if slot.empty {
                println!("  [{:>5}ms] --", slot.stop_at_ms);
            } else {
                println!(
                    "  [{:>5}ms] {} ({} / {})",
                    slot.stop_at_ms, slot.label, slot.category, slot.item_type
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_pull_flags() {
        let cli = Cli::try_parse_from(["divedraw", "pull", "--seed", "42", "-n", "3", "--json"])
            .expect("parse");
        match cli.command {
            Command::Pull {
                seed, pulls, json, ..
            } => {
                assert_eq!(seed, Some(42));
                assert_eq!(pulls, 3);
                assert!(json);
            }
            _ => panic!("expected pull"),
        }
    }

    #[test]
    fn process_images_defaults_match_pipeline() {
        let cli = Cli::try_parse_from(["divedraw", "process-images"]).expect("parse");
        match cli.command {
            Command::ProcessImages {
                assets_dir,
                max_size,
                ..
            } => {
                assert_eq!(assets_dir, PathBuf::from("assets/images"));
                assert_eq!(max_size, 300);
            }
            _ => panic!("expected process-images"),
        }
    }
}
