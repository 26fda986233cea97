use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use sqlx::mysql::{MySqlPoolOptions, MySqlRow};
use sqlx::{MySql, MySqlPool, Row, migrate::MigrateDatabase};
use tracing::{debug, info};

use crate::models::{FirmStatistics, Publication, UpsertOutcome};

const COLUMNS: &str =
    "company_name, publication_type, publication_date, practice_area, article_heading, article_link";

pub struct Database {
    pool: MySqlPool,
}

impl Database {
    /// Connect, creating the schema on first use, and apply pending migrations
    pub async fn connect(database_url: &str) -> Result<Self> {
        if !MySql::database_exists(database_url).await.unwrap_or(false) {
            info!("Creating database");
            MySql::create_database(database_url)
                .await
                .context("Failed to create database")?;
        }

        let pool = MySqlPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .context("Failed to connect to MySQL")?;

        info!("Running database migrations");
        sqlx::migrate!("./migrations").run(&pool).await?;

        info!("Database initialized successfully");
        Ok(Self { pool })
    }

    /// Insert `publication` into `table`, or refresh the row already stored under its link hash
    pub async fn upsert(&self, table: &str, publication: &Publication) -> Result<UpsertOutcome> {
        let table = checked_table(table)?;
        let link_hash = publication.link_hash();

        let existing = sqlx::query(&format!("SELECT {COLUMNS} FROM {table} WHERE link_hash = ?"))
            .bind(&link_hash)
            .fetch_optional(&self.pool)
            .await?
            .map(|row| publication_from_row(&row))
            .transpose()?;
        let outcome = compare(existing.as_ref(), publication);

        sqlx::query(&format!(
            r"
            INSERT INTO {table} ({COLUMNS}, link_hash)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE
                company_name = VALUES(company_name),
                publication_type = VALUES(publication_type),
                publication_date = VALUES(publication_date),
                practice_area = VALUES(practice_area),
                article_heading = VALUES(article_heading),
                article_link = VALUES(article_link),
                scraped_at = CURRENT_TIMESTAMP
            "
        ))
        .bind(&publication.company)
        .bind(&publication.publication_type)
        .bind(publication.publication_date)
        .bind(&publication.practice_area)
        .bind(&publication.heading)
        .bind(&publication.link)
        .bind(&link_hash)
        .execute(&self.pool)
        .await
        .with_context(|| format!("Failed to upsert {} into {}", publication.link, table))?;

        debug!("{:?}: {}", outcome, publication.link);
        Ok(outcome)
    }

    pub async fn statistics(&self, table: &str) -> Result<FirmStatistics> {
        let table = checked_table(table)?;

        let total: i64 = sqlx::query(&format!("SELECT COUNT(*) AS total FROM {table}"))
            .fetch_one(&self.pool)
            .await?
            .try_get("total")?;

        let by_type = self
            .grouped_counts(&format!(
                "SELECT publication_type AS label, COUNT(*) AS n FROM {table}
                 GROUP BY publication_type ORDER BY n DESC"
            ))
            .await?;

        let by_practice = self
            .grouped_counts(&format!(
                "SELECT practice_area AS label, COUNT(*) AS n FROM {table}
                 WHERE practice_area IS NOT NULL
                 GROUP BY practice_area ORDER BY n DESC LIMIT 10"
            ))
            .await?;

        let recent = sqlx::query(&format!(
            "SELECT publication_date, article_heading FROM {table}
             ORDER BY publication_date DESC, scraped_at DESC LIMIT 5"
        ))
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(|row| -> Result<(Option<NaiveDate>, String)> {
            Ok((row.try_get("publication_date")?, row.try_get("article_heading")?))
        })
        .collect::<Result<Vec<_>>>()?;

        Ok(FirmStatistics {
            total,
            by_type,
            by_practice,
            recent,
        })
    }

    async fn grouped_counts(&self, sql: &str) -> Result<Vec<(String, i64)>> {
        sqlx::query(sql)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(|row| -> Result<(String, i64)> { Ok((row.try_get("label")?, row.try_get("n")?)) })
            .collect()
    }

    /// Most recently published rows first; undated rows sort last
    pub async fn latest(&self, table: &str, limit: u32) -> Result<Vec<Publication>> {
        let table = checked_table(table)?;

        sqlx::query(&format!(
            "SELECT {COLUMNS} FROM {table}
             ORDER BY publication_date IS NULL, publication_date DESC, scraped_at DESC
             LIMIT ?"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(publication_from_row)
        .collect()
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
        }
    }
}

fn publication_from_row(row: &MySqlRow) -> Result<Publication> {
    Ok(Publication {
        company: row.try_get("company_name")?,
        publication_type: row.try_get("publication_type")?,
        publication_date: row.try_get("publication_date")?,
        practice_area: row.try_get("practice_area")?,
        heading: row.try_get("article_heading")?,
        link: row.try_get("article_link")?,
    })
}

/// Table names are interpolated into SQL, so only plain identifiers are accepted
fn checked_table(table: &str) -> Result<&str> {
    let valid = !table.is_empty()
        && table
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if !valid {
        bail!("Refusing to use {:?} as a table name", table);
    }
    Ok(table)
}

/// What an upsert of `incoming` does given the row currently stored under its link hash
pub fn compare(existing: Option<&Publication>, incoming: &Publication) -> UpsertOutcome {
    match existing {
        None => UpsertOutcome::Inserted,
        Some(stored) if stored == incoming => UpsertOutcome::Unchanged,
        Some(_) => UpsertOutcome::Updated,
    }
}
