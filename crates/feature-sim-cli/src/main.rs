//! feature-sim — entry point.

use std::path::PathBuf;

use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use feature_sim::{AnalysisOptions, ArchiveReader, ExtractorConfig, OnnxExtractor};
use feature_sim_cli::config::{
    resolve_model_path, resolve_output_dir, DEFAULT_IMAGES_DIR, DEFAULT_PHOTOS_DIR,
};
use feature_sim_cli::frontend::{self, images, photos, Run};
use feature_sim_cli::output::save_run;
use feature_sim_cli::render::RunView;

#[derive(Parser)]
#[command(
    name = "feature-sim",
    about = "Similarity analysis over image embeddings — matrix, neighbors, groups, and statistics",
    version
)]
struct Cli {
    /// Path to the ONNX feature model.
    #[arg(long, global = true)]
    model: Option<String>,

    /// Threads ONNX Runtime may use per operator.
    #[arg(long, global = true, default_value_t = 1)]
    threads: usize,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct RunArgs {
    /// Grouping threshold; pairs must score strictly above it.
    #[arg(long)]
    threshold: Option<f32>,

    /// Keep only this many neighbors per item in the saved report.
    #[arg(long)]
    top_k: Option<usize>,

    /// Directory for results and feature files.
    #[arg(short, long)]
    output: Option<String>,

    /// Print the report without writing any files.
    #[arg(long)]
    no_save: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze the generated test images (`*.jpg` plus categories.json).
    Images {
        /// Directory of test images.
        #[arg(default_value = DEFAULT_IMAGES_DIR)]
        dir: PathBuf,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Analyze a directory of photos (jpg, jpeg, png, webp, bmp).
    Photos {
        /// Directory of photos.
        #[arg(default_value = DEFAULT_PHOTOS_DIR)]
        dir: PathBuf,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Re-run the analysis on a saved feature archive (.fsa); no model needed.
    Analyze {
        /// Feature archive written by a previous run.
        archive: PathBuf,

        #[command(flatten)]
        run: RunArgs,

        /// Print the report as JSON instead of tables.
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completion scripts.
    ///
    /// Examples:
    ///   feature-sim completions bash > ~/.local/share/bash-completion/completions/feature-sim
    ///   feature-sim completions zsh > ~/.zfunc/_feature-sim
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Images { dir, run } => {
            let options = options_for(&run, images::DEFAULT_THRESHOLD);
            let mut extractor = load_extractor(cli.model.as_deref(), cli.threads)?;
            let result = images::run(&dir, &mut extractor, &options)?;
            finish(&result, &run, true)?;
        }

        Commands::Photos { dir, run } => {
            let options = options_for(&run, photos::DEFAULT_THRESHOLD);
            let mut extractor = load_extractor(cli.model.as_deref(), cli.threads)?;
            let result = photos::run(&dir, &mut extractor, &options)?;
            finish(&result, &run, true)?;
        }

        Commands::Analyze { archive, run, json } => {
            let options = options_for(&run, feature_sim::DEFAULT_THRESHOLD);
            let store = ArchiveReader::read_from_file(&archive)?;
            tracing::info!(
                "Loaded {} vectors from {}",
                store.len(),
                archive.display()
            );
            let result = frontend::run_store(archive.display().to_string(), store, &options)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&result.report)?);
                if !run.no_save {
                    save(&result, &run, false)?;
                }
            } else {
                finish(&result, &run, false)?;
            }
        }

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "feature-sim", &mut std::io::stdout());
        }
    }

    Ok(())
}

fn options_for(run: &RunArgs, default_threshold: f32) -> AnalysisOptions {
    AnalysisOptions {
        threshold: run.threshold.unwrap_or(default_threshold),
        top_k: run.top_k,
    }
}

fn load_extractor(model: Option<&str>, threads: usize) -> anyhow::Result<OnnxExtractor> {
    let mut config = ExtractorConfig::new(resolve_model_path(model));
    config.intra_threads = threads;
    Ok(OnnxExtractor::new(&config)?)
}

fn finish(result: &Run, run: &RunArgs, with_features: bool) -> anyhow::Result<()> {
    print!("{}", RunView(result));
    if !run.no_save {
        save(result, run, with_features)?;
    }
    Ok(())
}

fn save(result: &Run, run: &RunArgs, with_features: bool) -> anyhow::Result<()> {
    let dir = resolve_output_dir(run.output.as_deref());
    let saved = save_run(result, &dir, with_features)?;
    eprintln!("Results saved to {}", saved.results.display());
    if let Some(features) = saved.features {
        eprintln!("Features saved to {}", features.display());
    }
    Ok(())
}
