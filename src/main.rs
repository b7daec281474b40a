use std::process;
use std::sync::Arc;

use bayaz::{
    application::{CacheOrchestrator, StateStore},
    cache::CacheConfig,
    config::{self, CliArgs, Command, SearchArgs},
    domain::filter::FilterCriteria,
    infra::{AppwriteClient, SqliteCacheStore, telemetry},
    util::humanize_age,
};
use clap::Parser;
use time::OffsetDateTime;
use tracing::{Dispatch, Level, dispatcher, error, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(error.as_ref());
        process::exit(1);
    }
}

fn report_application_error(error: &dyn std::error::Error) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CliArgs::parse();
    let settings = config::load(&cli)?;
    telemetry::init(&settings.logging)?;

    let command = cli.command.unwrap_or(Command::Warm(Default::default()));

    let durable = match settings.cache.durable_path.as_deref() {
        Some(path) => match SqliteCacheStore::open(path).await {
            Ok(store) => Some(Arc::new(store)),
            Err(err) => {
                warn!(error = %err, "Durable cache unavailable; running memory-only");
                None
            }
        },
        None => None,
    };

    let remote = Arc::new(AppwriteClient::new(&settings.remote)?);
    let state = Arc::new(StateStore::new());
    let orchestrator = CacheOrchestrator::new(
        state,
        remote,
        durable,
        CacheConfig::from(&settings.cache),
    );

    match command {
        Command::Warm(_) => run_warm(&orchestrator).await,
        Command::Search(args) => run_search(&orchestrator, &args).await,
        Command::Stats(_) => run_stats(&orchestrator).await,
        Command::Clear(_) => run_clear(&orchestrator).await,
    }
}

async fn run_warm(orchestrator: &CacheOrchestrator) -> Result<(), Box<dyn std::error::Error>> {
    orchestrator.warm().await?;

    let state = orchestrator.state().snapshot();
    let poems = state.poems.map(|record| record.items.len()).unwrap_or(0);
    let categories = state
        .categories
        .map(|record| record.items.len())
        .unwrap_or(0);
    println!("warmed {poems} poems, {categories} categories");
    Ok(())
}

async fn run_search(
    orchestrator: &CacheOrchestrator,
    args: &SearchArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let criteria = FilterCriteria {
        search: args.query.clone().unwrap_or_default(),
        category: args.category.clone().unwrap_or_default(),
    };

    let outcome = orchestrator.ensure_poems(&criteria, args.refresh).await?;
    for poem in &outcome.data {
        let title = match poem.title_ur.as_deref() {
            Some(ur) => format!("{} / {ur}", poem.title_en),
            None => poem.title_en.clone(),
        };
        println!("{}\t{}\t{}", poem.id, poem.category, title);
    }
    println!(
        "{} result(s) from {}",
        outcome.data.len(),
        outcome.source.as_str()
    );
    Ok(())
}

async fn run_stats(orchestrator: &CacheOrchestrator) -> Result<(), Box<dyn std::error::Error>> {
    let metrics = orchestrator.state().metrics().snapshot();
    println!(
        "hits {}  misses {}  remote calls {}  local filters {}  hit ratio {}%",
        metrics.hits,
        metrics.misses,
        metrics.remote_calls,
        metrics.local_filters,
        metrics.hit_ratio()
    );

    let now = OffsetDateTime::now_utc();
    for stat in orchestrator.durable_stats().await {
        let age = now - stat.fetched_at;
        let age = humanize_age(age.try_into().unwrap_or_default());
        let status = if stat.expired { "expired" } else { "valid" };
        println!(
            "{}: {} item(s), age {age}, {status}",
            stat.dataset, stat.count
        );
    }
    Ok(())
}

async fn run_clear(orchestrator: &CacheOrchestrator) -> Result<(), Box<dyn std::error::Error>> {
    orchestrator.clear_cache().await;
    println!("cache cleared");
    Ok(())
}
