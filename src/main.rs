use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use tube_digest::config::Config;
use tube_digest::pipeline::{DigestPipeline, RunOptions, RunOutcome};
use tube_digest::scoring::ScoringProfile;

#[derive(Parser)]
#[command(name = "tube-digest")]
#[command(version, about = "Post a ranked YouTube learning digest to Chatwork")]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print the digest instead of posting it
    #[arg(long)]
    dry_run: bool,

    /// Run even on weekends
    #[arg(long)]
    force: bool,

    /// Seed for category and keyword selection
    #[arg(long, value_name = "N")]
    seed: Option<u64>,

    /// Use this category instead of drawing one
    #[arg(long, value_name = "ID")]
    category: Option<String>,

    /// Scoring profile override (lenient or strict)
    #[arg(long, value_name = "PROFILE")]
    profile: Option<ScoringProfile>,

    /// Report which credentials are set and exit
    #[arg(long)]
    check_env: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "tube_digest=debug,info"
    } else {
        "tube_digest=info,warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn report_env(config: &Config) -> bool {
    let checks = [
        ("Chatwork Token", config.chatwork.api_token.is_some()),
        ("Chatwork Room", config.chatwork.room_id.is_some()),
        ("YouTube API Key", config.youtube.api_key.is_some()),
    ];

    info!("🔍 Environment check:");
    for (name, set) in &checks {
        info!("{}: {}", name, if *set { "✅ set" } else { "❌ missing" });
    }

    let all_set = checks.iter().all(|(_, set)| *set);
    if all_set {
        info!("✅ All credentials are set");
    } else {
        error!("❌ Some credentials are missing");
    }
    all_set
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(profile) = cli.profile {
        config.scoring.profile = profile;
    }

    if cli.check_env {
        if !report_env(&config) {
            std::process::exit(1);
        }
        return Ok(());
    }

    info!("{}", config.summary());

    let options = RunOptions {
        dry_run: cli.dry_run,
        force: cli.force,
        category: cli.category,
    };
    let pipeline = DigestPipeline::from_config(&config, options)?;

    let mut rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    match pipeline.run(Utc::now(), &mut rng).await {
        Ok(RunOutcome::Posted(summary)) => {
            info!("🎉 Posted {} videos ({})", summary.video_count, summary.category);
        }
        Ok(RunOutcome::DryRun { summary, message }) => {
            println!("{}", message);
            info!(
                "📝 Dry run: {} videos, average score {:.1}",
                summary.video_count, summary.average_score
            );
        }
        Ok(RunOutcome::Skipped(reason)) => {
            info!("⏭️ Skipped: {}", reason);
        }
        Err(e) => {
            error!("❌ Digest run failed: {:#}", e);
            return Err(e);
        }
    }

    Ok(())
}
