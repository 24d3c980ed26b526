//! Operations CLI for the Cohort API database: recompute program progress
//! summaries and print dashboard counts without going through HTTP.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use uuid::Uuid;

use cohort_api::database::manager::DatabaseManager;
use cohort_api::services::ProgressService;

#[derive(Parser)]
#[command(name = "cohortctl")]
#[command(about = "Cohort CLI - operational tasks for the learning-management backend")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Recompute program progress summaries")]
    Recalculate {
        #[arg(long, help = "Program to recompute")]
        program: Uuid,

        #[arg(long, help = "Single user to recompute; omit to recompute every enrolled user")]
        user: Option<Uuid>,
    },

    #[command(about = "Print entity and completion counts")]
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Recalculate { program, user } => recalculate(program, user).await,
        Commands::Stats => stats().await,
    }
}

async fn recalculate(program_id: Uuid, user: Option<Uuid>) -> Result<()> {
    let pool = DatabaseManager::pool().await.context("database connection failed")?;
    let service = ProgressService::new(pool);

    let user_ids = match user {
        Some(user_id) => vec![user_id],
        None => service
            .enrolled_user_ids(program_id)
            .await
            .context("listing enrolled users failed")?,
    };

    if user_ids.is_empty() {
        println!("no enrolled users for program {}", program_id);
        return Ok(());
    }

    for user_id in user_ids {
        let result = service
            .calculate_program_progress(user_id, program_id)
            .await
            .with_context(|| format!("recompute failed for user {}", user_id))?;
        println!(
            "{} {} -> {}%{}",
            user_id,
            program_id,
            result.completion_percentage,
            if result.is_completed { " (completed)" } else { "" }
        );
    }
    Ok(())
}

async fn stats() -> Result<()> {
    let pool = DatabaseManager::pool().await.context("database connection failed")?;

    for (label, sql) in [
        ("programs", "SELECT COUNT(*) FROM programs WHERE status <> 'archived'"),
        ("courses", "SELECT COUNT(*) FROM courses WHERE status <> 'archived'"),
        ("lessons", "SELECT COUNT(*) FROM lessons WHERE status <> 'archived'"),
        ("modules", "SELECT COUNT(*) FROM modules WHERE status <> 'archived'"),
        ("users", "SELECT COUNT(*) FROM users"),
        ("module completions", "SELECT COUNT(*) FROM user_progress WHERE status = 'completed'"),
        (
            "program completions",
            "SELECT COUNT(*) FROM user_program_progress WHERE status = 'completed'",
        ),
    ] {
        let count: (i64,) = sqlx::query_as(sql).fetch_one(&pool).await?;
        println!("{:>20}: {}", label, count.0);
    }
    Ok(())
}
