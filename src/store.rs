//! Contact store backends.
//!
//! The site only ever inserts into a single `contacts` collection. The store
//! is chosen at startup: Postgres if `DATABASE_URL` is set, Supabase REST if
//! its credentials are set, otherwise a store that refuses every write.

use crate::config::{Config, SupabaseConfig};
use crate::contact::ContactSubmission;
use crate::retry::{with_retry_if, RetryConfig};
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use futures::FutureExt;
use serde::Serialize;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// One row of the `contacts` collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactRecord {
    pub name: String,
    pub email: String,
    pub company: Option<String>,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl ContactRecord {
    pub fn from_submission(submission: &ContactSubmission, created_at: DateTime<Utc>) -> Self {
        Self {
            name: submission.name.clone(),
            email: submission.email.clone(),
            company: submission.company.clone(),
            message: submission.message.clone(),
            created_at,
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("contact store is not configured")]
    NotConfigured,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("store rejected insert with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

impl StoreError {
    /// Whether retrying the same operation could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            StoreError::Database(e) => matches!(
                e,
                sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::Tls(_)
            ),
            StoreError::Http(e) => e.is_timeout() || e.is_connect(),
            StoreError::Rejected { status, .. } => *status >= 500,
            StoreError::NotConfigured => false,
        }
    }
}

/// The external data sink for contact leads.
pub trait ContactStore: Send + Sync {
    /// Short backend name for logs and `/health`.
    fn backend(&self) -> &'static str;

    fn insert<'a>(&'a self, record: &'a ContactRecord) -> BoxFuture<'a, Result<(), StoreError>>;
}

// ==================== Postgres ====================

pub struct PgContactStore {
    pool: PgPool,
}

impl PgContactStore {
    /// Connect and make sure the `contacts` table exists.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;

        let store = Self { pool };
        store.ensure_schema().await?;
        Ok(store)
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS contacts (
                id BIGSERIAL PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT NOT NULL,
                company TEXT,
                message TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

impl ContactStore for PgContactStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    fn insert<'a>(&'a self, record: &'a ContactRecord) -> BoxFuture<'a, Result<(), StoreError>> {
        async move {
            sqlx::query(
                "INSERT INTO contacts (name, email, company, message, created_at)
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(&record.name)
            .bind(&record.email)
            .bind(&record.company)
            .bind(&record.message)
            .bind(record.created_at)
            .execute(&self.pool)
            .await?;
            Ok(())
        }
        .boxed()
    }
}

// ==================== Supabase REST ====================

/// Inserts through a PostgREST endpoint such as Supabase's `/rest/v1`.
pub struct RestContactStore {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl RestContactStore {
    pub fn new(config: &SupabaseConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    pub fn with_client(client: reqwest::Client, config: &SupabaseConfig) -> Self {
        Self {
            client,
            endpoint: format!("{}/rest/v1/contacts", config.url.trim_end_matches('/')),
            api_key: config.anon_key.clone(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl ContactStore for RestContactStore {
    fn backend(&self) -> &'static str {
        "supabase"
    }

    fn insert<'a>(&'a self, record: &'a ContactRecord) -> BoxFuture<'a, Result<(), StoreError>> {
        async move {
            let response = self
                .client
                .post(&self.endpoint)
                .header("apikey", &self.api_key)
                .bearer_auth(&self.api_key)
                .header("Prefer", "return=minimal")
                .json(&[record])
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(StoreError::Rejected {
                    status: status.as_u16(),
                    body,
                });
            }

            Ok(())
        }
        .boxed()
    }
}

// ==================== Unconfigured ====================

/// Stand-in used when no backend is configured. Every write fails, so
/// visitors get the fallback notice and the failure shows up in metrics.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnconfiguredStore;

impl ContactStore for UnconfiguredStore {
    fn backend(&self) -> &'static str {
        "unconfigured"
    }

    fn insert<'a>(&'a self, _record: &'a ContactRecord) -> BoxFuture<'a, Result<(), StoreError>> {
        futures::future::ready(Err(StoreError::NotConfigured)).boxed()
    }
}

/// Build the store selected by `config`.
pub async fn connect_store(config: &Config) -> Result<Arc<dyn ContactStore>, StoreError> {
    if let Some(url) = &config.database_url {
        let store = with_retry_if(
            &RetryConfig::store_connect(),
            "Postgres connect",
            || PgContactStore::connect(url),
            StoreError::is_transient,
        )
        .await?;
        info!("✓ Contact store: Postgres");
        return Ok(Arc::new(store));
    }

    if let Some(supabase) = &config.supabase {
        let store = RestContactStore::new(supabase);
        info!(endpoint = store.endpoint(), "✓ Contact store: Supabase REST");
        return Ok(Arc::new(store));
    }

    warn!("No contact store configured; submissions will show the fallback notice");
    Ok(Arc::new(UnconfiguredStore))
}
