use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod config;
mod database;
mod dates;
mod fetcher;
mod listing;
mod models;
mod publication_finder;
mod scrapers;
mod traits;

use config::AppConfig;
use database::Database;
use fetcher::PageFetcher;
use models::DateRange;
use publication_finder::PublicationFinder;
use traits::ScrapeContext;

#[derive(Parser)]
#[command(version, about = "Collects law firm publications into per-firm MySQL tables")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scrape once and exit
    Run {
        /// Only scrape this firm (see `firms`)
        #[arg(long)]
        firm: Option<String>,
        /// Earliest publication date to keep (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Latest publication date to keep (YYYY-MM-DD)
        #[arg(long)]
        to: Option<NaiveDate>,
        /// Log what would be stored without touching the database
        #[arg(long)]
        dry_run: bool,
    },
    /// Scrape every firm now, then again on the SCRAPE_SCHEDULE cron expression
    Schedule,
    /// Row counts for one firm's table
    Stats {
        #[arg(long)]
        firm: String,
    },
    /// Most recent publications stored for one firm
    Latest {
        #[arg(long)]
        firm: String,
        #[arg(long, default_value_t = 10)]
        limit: u32,
        /// Print JSON instead of one line per publication
        #[arg(long)]
        json: bool,
    },
    /// List the supported firms
    Firms,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    // Listing firms needs no configuration
    let command = match cli.command {
        Command::Firms => {
            list_firms();
            return Ok(());
        }
        command => command,
    };

    let config = AppConfig::from_env()?;

    match command {
        Command::Run {
            firm,
            from,
            to,
            dry_run,
        } => {
            let range = resolve_range(config.range, from, to)?;
            let database = if dry_run {
                info!("Dry run: nothing will be written to the database");
                None
            } else {
                Some(Database::connect(&config.database_url).await?)
            };
            let finder = PublicationFinder::new(scrape_context(&config)?, database).with_range(range);

            match firm {
                Some(key) => {
                    finder.run_firm(&key).await?;
                }
                None => {
                    let report = finder.run_all().await;
                    if !report.failed_firms.is_empty() {
                        bail!("Scraping failed for: {}", report.failed_firms.join(", "));
                    }
                }
            }
        }
        Command::Schedule => run_scheduled(&config).await?,
        Command::Stats { firm } => {
            let table = firm_table(&firm)?;
            let database = Database::connect(&config.database_url).await?;
            let stats = database.statistics(table).await?;

            println!("{table}: {} publications", stats.total);
            println!("\nBy type:");
            for (label, count) in &stats.by_type {
                println!("  {label:<40} {count}");
            }
            println!("\nTop practice areas:");
            for (label, count) in &stats.by_practice {
                println!("  {label:<40} {count}");
            }
            println!("\nMost recent:");
            for (date, heading) in &stats.recent {
                println!("  {}  {}", date.map_or_else(|| "undated   ".to_string(), |d| d.to_string()), heading);
            }
        }
        Command::Latest { firm, limit, json } => {
            let table = firm_table(&firm)?;
            let database = Database::connect(&config.database_url).await?;
            let publications = database.latest(table, limit).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&publications)?);
            } else {
                for publication in &publications {
                    println!(
                        "{}  [{}] {}\n            {}",
                        publication
                            .publication_date
                            .map_or_else(|| "undated   ".to_string(), |d| d.to_string()),
                        publication.publication_type,
                        publication.heading,
                        publication.link
                    );
                }
            }
        }
        Command::Firms => list_firms(),
    }

    Ok(())
}

fn list_firms() {
    for scraper in scrapers::all() {
        let config = scraper.config();
        println!("{:<10} {:<16} {}", config.key, config.name, config.table);
    }
}

fn scrape_context(config: &AppConfig) -> Result<ScrapeContext> {
    Ok(ScrapeContext {
        fetcher: PageFetcher::new(config.fetch.clone())?,
        range: config.range,
        max_pages: config.max_pages,
    })
}

/// Command-line dates override the configured range bounds
fn resolve_range(
    configured: DateRange,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Result<DateRange> {
    let start = from.unwrap_or(configured.start);
    let end = to.unwrap_or(configured.end);
    if start > end {
        bail!("--from {} is after --to {}", start, end);
    }
    Ok(DateRange::new(start, end))
}

fn firm_table(key: &str) -> Result<&'static str> {
    scrapers::find(key)
        .map(|scraper| scraper.config().table)
        .with_context(|| format!("Unknown firm '{key}', see `firms` for the list"))
}

async fn run_scheduled(config: &AppConfig) -> Result<()> {
    info!("Starting law firm publication scraper");

    let database = Database::connect(&config.database_url).await?;
    let finder = PublicationFinder::new(scrape_context(config)?, Some(database));

    // Run once immediately
    finder.run_all().await;

    let sched = JobScheduler::new().await?;

    let job_finder = finder.clone();
    sched
        .add(Job::new_async(config.schedule.as_str(), move |_uuid, _l| {
            let finder = job_finder.clone();
            Box::pin(async move {
                let report = finder.run_all().await;
                if !report.failed_firms.is_empty() {
                    error!("Scheduled run failed for: {}", report.failed_firms.join(", "));
                }
            })
        })?)
        .await?;

    info!("Scheduler started with schedule '{}'", config.schedule);
    sched.start().await?;

    // Keep the program running
    loop {
        tokio::time::sleep(tokio::time::Duration::from_secs(30)).await;
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_run_with_overrides() {
        let cli = Cli::try_parse_from([
            "firm-publications",
            "run",
            "--firm",
            "lks",
            "--from",
            "2025-01-01",
            "--dry-run",
        ])
        .unwrap();

        match cli.command {
            Command::Run {
                firm,
                from,
                to,
                dry_run,
            } => {
                assert_eq!(firm.as_deref(), Some("lks"));
                assert_eq!(from, Some(date(2025, 1, 1)));
                assert_eq!(to, None);
                assert!(dry_run);
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn range_overrides_apply_per_bound() {
        let configured = DateRange::default();

        let range = resolve_range(configured, Some(date(2025, 6, 1)), None).unwrap();
        assert_eq!(range, DateRange::new(date(2025, 6, 1), configured.end));

        assert!(resolve_range(configured, Some(date(2025, 6, 1)), Some(date(2025, 1, 1))).is_err());
    }

    #[test]
    fn firm_table_rejects_unknown_keys() {
        assert_eq!(firm_table("khaitan").unwrap(), "khaitan_publications");
        assert!(firm_table("nope").is_err());
    }
}
