use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use gq_app::artifact::export_file_stem;
use gq_app::{AppConfig, Enqueued, EventBus, JobStatus, QueueEvent, Scheduler, SdWebUiBackend};
use gq_core::prompts::random_prompt;
use gq_core::{AspectRatio, QualityTier, Request, RANDOM_SEED};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Queue txt2img jobs against a Stable Diffusion WebUI instance
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Prompts to generate, one job each. A random prompt is used when none are given.
    prompts: Vec<String>,

    /// How many random prompts to queue when no prompt is given
    #[arg(long, default_value_t = 1)]
    count: usize,

    #[arg(long, default_value = "nsfw, text, low quality")]
    negative: String,

    /// portrait, landscape or square
    #[arg(long, default_value = "portrait")]
    aspect: AspectRatio,

    /// low, medium or high
    #[arg(long, default_value = "low")]
    quality: QualityTier,

    /// Fixed seed, or -1 for a random seed per job
    #[arg(long, default_value = RANDOM_SEED, allow_hyphen_values = true)]
    seed: String,

    /// Overrides SD_API_URL
    #[arg(long)]
    api_url: Option<String>,

    /// Overrides GQ_OUTPUT_DIR
    #[arg(long)]
    out: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gq_app=info,gq_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let mut config = AppConfig::load()?;
    if let Some(api_url) = args.api_url.clone() {
        config.api_url = api_url.trim_end_matches('/').to_string();
    }
    if let Some(out) = args.out.clone() {
        config.output_dir = out;
    }

    let backend = SdWebUiBackend::new(&config)?;
    info!(api_url = backend.base_url(), "Using Stable Diffusion backend");

    let scheduler = Arc::new(Scheduler::new(Arc::new(backend), EventBus::default()));
    let reporter = tokio::spawn(report_progress(scheduler.clone()));

    for request in build_requests(&args) {
        match scheduler.enqueue(request, false)? {
            Enqueued::Queued(_) => {}
            Enqueued::Duplicate => warn!("Skipping duplicate prompt"),
        }
    }

    tokio::select! {
        _ = scheduler.wait_idle() => {}
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted, abandoning the current job");
        }
    }
    scheduler.shutdown().await;
    reporter.abort();

    export_results(&scheduler, &config.output_dir);
    Ok(())
}

fn build_requests(args: &Args) -> Vec<Request> {
    let prompts = if args.prompts.is_empty() {
        let mut rng = rand::rng();
        (0..args.count).map(|_| random_prompt(&mut rng)).collect()
    } else {
        args.prompts.clone()
    };

    prompts
        .into_iter()
        .map(|prompt| Request {
            prompt,
            negative_prompt: args.negative.clone(),
            aspect_ratio: args.aspect,
            quality: args.quality,
            seed: args.seed.clone(),
        })
        .collect()
}

async fn report_progress(scheduler: Arc<Scheduler>) {
    let mut events = scheduler.subscribe();
    loop {
        match events.recv().await {
            Ok(QueueEvent::JobSucceeded(_) | QueueEvent::JobFailed { .. }) => {
                let counts = scheduler.counts();
                info!(
                    active = counts.active(),
                    completed = counts.completed(),
                    failed = counts.failed,
                    "Queue progress"
                );
            }
            Ok(_) => {}
            Err(RecvError::Lagged(skipped)) => warn!(skipped, "Progress reporter lagged"),
            Err(RecvError::Closed) => break,
        }
    }
}

fn export_results(scheduler: &Scheduler, output_dir: &std::path::Path) {
    for job in scheduler.snapshot() {
        match (job.status(), job.artifact()) {
            (JobStatus::Succeeded, Some(artifact)) => {
                let stem = export_file_stem(job.resolved_seed(), &job.request().prompt);
                match artifact.save(output_dir, &stem) {
                    Ok(path) => info!(job_id = %job.id(), path = %path.display(), "Saved image"),
                    Err(e) => warn!(job_id = %job.id(), error = %e, "Failed to save image"),
                }
            }
            (status, _) => warn!(
                job_id = %job.id(),
                prompt = %job.request().prompt,
                status = status.label(),
                error = job.error().unwrap_or_default(),
                "No image"
            ),
        }
    }
}
