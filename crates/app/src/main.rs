use chrono::Utc;
use migration::{Migrator, MigratorTrait};
use settings::Database;

mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;
    let mut tasks = tokio::task::JoinSet::new();

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "ledgerd={level},server={level},engine={level}",
            level = settings.app.level
        ))
        .init();

    if let Some(server) = settings.server {
        tasks.spawn(async move {
            tracing::info!("Found server settings...");
            let db = match parse_database(&server.database).await {
                Ok(db) => db,
                Err(err) => {
                    tracing::error!("failed to initialize database: {err}");
                    return;
                }
            };

            let engine = match engine::Engine::builder()
                .database(db.clone())
                .build()
                .await
            {
                Ok(engine) => engine,
                Err(err) => {
                    tracing::error!("failed to build engine from database: {err}");
                    return;
                }
            };
            let bind = server.bind.unwrap_or_else(|| "127.0.0.1".to_string());
            let addr = format!("{}:{}", bind, server.port);
            let listener = match tokio::net::TcpListener::bind(addr).await {
                Ok(listener) => listener,
                Err(err) => {
                    tracing::error!("failed to bind server listener: {err}");
                    return;
                }
            };
            if let Err(err) = server::run_with_listener(engine, db, listener).await {
                tracing::error!("server failed: {err}");
            }
        });
    }

    if let Some(jobs) = settings.jobs {
        tasks.spawn(async move {
            tracing::info!("Found jobs settings...");
            let db = match parse_database(&jobs.database).await {
                Ok(db) => db,
                Err(err) => {
                    tracing::error!("failed to initialize database: {err}");
                    return;
                }
            };

            let engine = match engine::Engine::builder().database(db).build().await {
                Ok(engine) => engine,
                Err(err) => {
                    tracing::error!("failed to build engine from database: {err}");
                    return;
                }
            };
            run_jobs(engine, jobs).await;
        });
    }

    while tasks.join_next().await.is_some() {
        tasks.shutdown().await;
    }

    Ok(())
}

async fn parse_database(
    config: &settings::Database,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let url = match config {
        Database::Memory => String::from("sqlite::memory:"),
        Database::Sqlite(path) => format!("sqlite:{}?mode=rwc", path),
    };

    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    Ok(database)
}

/// Tick lengths and horizons for the job runner. Recurring execution runs
/// daily, the retry/stuck-recovery pass hourly and log pruning weekly unless
/// the settings say otherwise.
struct JobSchedule {
    recurring_every: std::time::Duration,
    maintenance_every: std::time::Duration,
    prune_every: std::time::Duration,
    retry_window: chrono::Duration,
    stuck_after: chrono::Duration,
    retention: chrono::Duration,
}

impl JobSchedule {
    fn from_settings(jobs: &settings::Jobs) -> Self {
        Self {
            recurring_every: std::time::Duration::from_secs(
                jobs.recurring_interval_secs.unwrap_or(86_400),
            ),
            maintenance_every: std::time::Duration::from_secs(
                jobs.maintenance_interval_secs.unwrap_or(3_600),
            ),
            prune_every: std::time::Duration::from_secs(
                jobs.prune_interval_secs.unwrap_or(604_800),
            ),
            retry_window: chrono::Duration::seconds(jobs.retry_window_secs.unwrap_or(86_400) as i64),
            stuck_after: chrono::Duration::seconds(jobs.stuck_after_secs.unwrap_or(900) as i64),
            retention: chrono::Duration::days(jobs.log_retention_days.unwrap_or(90)),
        }
    }
}

/// Drives the periodic maintenance loops until the task is shut down.
async fn run_jobs(engine: engine::Engine, jobs: settings::Jobs) {
    let schedule = JobSchedule::from_settings(&jobs);

    let mut recurring = tokio::time::interval(schedule.recurring_every);
    let mut maintenance = tokio::time::interval(schedule.maintenance_every);
    let mut pruning = tokio::time::interval(schedule.prune_every);

    loop {
        tokio::select! {
            _ = recurring.tick() => {
                let now = Utc::now();
                match engine.process_due_recurring(now.date_naive(), now).await {
                    Ok(report) => tracing::info!(
                        processed = report.processed,
                        failed = report.failed,
                        total = report.total,
                        "recurring run finished"
                    ),
                    Err(err) => tracing::error!("recurring run failed: {err}"),
                }
            }
            _ = maintenance.tick() => {
                let now = Utc::now();
                match engine.retry_failed_transactions(now - schedule.retry_window, now).await {
                    Ok(report) => tracing::info!(
                        retried = report.retried,
                        total = report.total,
                        "retry pass finished"
                    ),
                    Err(err) => tracing::error!("retry pass failed: {err}"),
                }
                match engine.recover_stuck_transactions(now - schedule.stuck_after, now).await {
                    Ok(recovered) => tracing::info!(recovered, "stuck recovery finished"),
                    Err(err) => tracing::error!("stuck recovery failed: {err}"),
                }
            }
            _ = pruning.tick() => {
                let now = Utc::now();
                match engine.prune_logs(now - schedule.retention).await {
                    Ok(pruned) => tracing::info!(pruned, "log pruning finished"),
                    Err(err) => tracing::error!("log pruning failed: {err}"),
                }
            }
        }
    }
}
