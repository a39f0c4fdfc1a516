//! babel-worker: claims story jobs and generates illustrated, narrated picture books.

use anyhow::Result;
use babel_core::{JobRequest, StoryId};
use babel_database::{PostgresStore, establish_pool};
use babel_interface::JobQueue;
use babel_worker::api::{ApiState, Liveness, create_router};
use babel_worker::{JobCoordinator, WorkerConfig, init_observability};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info, warn};

/// Command-line arguments for the worker.
#[derive(Parser, Debug)]
#[command(name = "babel-worker")]
#[command(about = "BabelBooks story worker", version)]
struct Cli {
    /// Path to a TOML configuration file (default: ./babel.toml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the job coordinator and the health/metrics server
    Run,
    /// Apply pending database migrations and exit
    Migrate,
    /// Queue a new story
    Submit {
        /// Story prompt
        prompt: String,
        /// Age band, e.g. "3-4 years"
        #[arg(long)]
        age: Option<String>,
        /// Story tone, e.g. "wholesome"
        #[arg(long)]
        tone: Option<String>,
        /// Story text language
        #[arg(long)]
        language: Option<String>,
        /// Narration language, if different from the text
        #[arg(long)]
        narration_language: Option<String>,
        /// Child's name to weave into the story
        #[arg(long)]
        child_name: Option<String>,
        /// Child's interests
        #[arg(long)]
        interests: Option<String>,
    },
    /// Reset a story and put its job back on the queue
    Requeue {
        /// Story identifier
        story_id: StoryId,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = WorkerConfig::load(cli.config.as_deref())?;
    init_observability(&config.observability()).map_err(|e| anyhow::anyhow!("{e}"))?;

    match cli.command {
        Command::Run => run(config).await,
        Command::Migrate => {
            connect(&config)?.migrate().await?;
            info!("Migrations applied");
            Ok(())
        }
        Command::Submit {
            prompt,
            age,
            tone,
            language,
            narration_language,
            child_name,
            interests,
        } => {
            let mut builder = JobRequest::builder();
            builder.prompt(prompt);
            if let Some(age) = age {
                builder.child_age(age);
            }
            if let Some(tone) = tone {
                builder.tone(tone);
            }
            if let Some(language) = language {
                builder.text_language(language);
            }
            if let Some(language) = narration_language {
                builder.narration_language(language);
            }
            if let Some(name) = child_name {
                builder.child_name(name);
            }
            if let Some(interests) = interests {
                builder.child_interests(interests);
            }
            let request = builder.build()?;

            let store = connect(&config)?;
            store.migrate().await?;
            let (job_id, story_id) = store.enqueue(request).await?;
            println!("{}", serde_json::json!({ "jobId": job_id, "storyId": story_id }));
            Ok(())
        }
        Command::Requeue { story_id } => {
            let job_id = connect(&config)?.requeue_story(story_id).await?;
            println!("{}", serde_json::json!({ "jobId": job_id, "storyId": story_id }));
            Ok(())
        }
    }
}

fn connect(config: &WorkerConfig) -> Result<PostgresStore> {
    let pool = establish_pool(config.require_database_url()?, *config.database_pool_size())?;
    Ok(PostgresStore::new(pool))
}

async fn run(config: WorkerConfig) -> Result<()> {
    info!("Starting BabelBooks worker");
    let store = Arc::new(connect(&config)?);
    store.migrate().await?;

    let coordinator = JobCoordinator::from_config(&config, store.clone(), store.clone())?;
    let liveness = Liveness::default();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let worker_liveness = liveness.clone();
    let mut worker = tokio::spawn(async move {
        let _alive = worker_liveness.alive();
        coordinator.run(shutdown_rx).await;
    });

    let listener = tokio::net::TcpListener::bind(config.http_addr()).await?;
    info!(addr = %config.http_addr(), "HTTP surface listening");
    let app = create_router(ApiState::new(store.clone(), liveness));
    let mut http_shutdown = shutdown_tx.subscribe();
    let server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = http_shutdown.wait_for(|stop| *stop).await;
            })
            .await
    });

    shutdown_signal().await;
    info!("Shutdown signal received, no new jobs will be claimed");
    let _ = shutdown_tx.send(true);

    match tokio::time::timeout(config.shutdown_grace_period(), &mut worker).await {
        Ok(Ok(())) => info!("Coordinator stopped cleanly"),
        Ok(Err(e)) => error!(error = %e, "Coordinator task failed"),
        Err(_) => {
            warn!(
                grace_secs = config.shutdown_grace_period().as_secs(),
                "In-flight job did not finish within the grace period, abandoning it"
            );
            worker.abort();
        }
    }

    server.await??;
    info!("BabelBooks worker stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
