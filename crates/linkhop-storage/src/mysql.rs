use async_trait::async_trait;
use jiff::Timestamp;
use linkhop_core::store::Result;
use linkhop_core::{Link, LinkId, LinkStore, NewLink, Slug, StorageError, Ttl, Visit};
use sqlx::mysql::{MySqlPoolOptions, MySqlRow};
use sqlx::{MySqlPool, Row};
use std::time::Duration;
use tracing::{debug, trace, warn};

/// MySQL implementation of the link store contract.
///
/// Links live in `links`, click history in `click_events`; both tables are
/// created by the embedded migrations (see [`MySqlLinkStore::migrate`]).
/// Timestamps are stored as Unix milliseconds.
#[derive(Debug, Clone)]
pub struct MySqlLinkStore {
    pool: MySqlPool,
}

impl MySqlLinkStore {
    /// Creates a store from an existing MySQL connection pool.
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Creates a store by opening a new MySQL connection pool.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = MySqlPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(map_sqlx_error)?;
        Ok(Self::new(pool))
    }

    /// Applies the embedded schema migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StorageError::Operation(format!("failed to apply migrations: {e}")))
    }

    /// Closes every pooled connection.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn now_unix_millis() -> i64 {
    Timestamp::now().as_millisecond()
}

fn parse_timestamp(millis: i64) -> Result<Timestamp> {
    Timestamp::from_millisecond(millis).map_err(|e| {
        StorageError::InvalidData(format!("invalid created_at timestamp '{millis}': {e}"))
    })
}

fn parse_ttl(seconds: Option<u32>) -> Result<Option<Ttl>> {
    seconds
        .map(|value| {
            Ttl::from_secs(u64::from(value))
                .map_err(|e| StorageError::InvalidData(format!("invalid ttl_seconds: {e}")))
        })
        .transpose()
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(sqlx::error::DatabaseError::is_unique_violation)
}

fn map_sqlx_error(err: sqlx::Error) -> StorageError {
    let message = err.to_string();

    match err {
        sqlx::Error::PoolTimedOut => StorageError::Timeout(message),
        sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => StorageError::Unavailable(message),
        sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::TypeNotFound { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::RowNotFound => StorageError::InvalidData(message),
        _ => StorageError::Query(message),
    }
}

fn link_from_row(row: &MySqlRow) -> Result<Link> {
    let id: u64 = row.try_get("id").map_err(map_sqlx_error)?;
    let slug: String = row.try_get("slug").map_err(map_sqlx_error)?;
    let url: String = row.try_get("url").map_err(map_sqlx_error)?;
    let ttl_seconds: Option<u32> = row.try_get("ttl_seconds").map_err(map_sqlx_error)?;
    let clicks: u64 = row.try_get("clicks").map_err(map_sqlx_error)?;
    let created_at: i64 = row.try_get("created_at").map_err(map_sqlx_error)?;

    Ok(Link {
        id: LinkId(id),
        slug: Slug::new_unchecked(slug),
        url,
        ttl: parse_ttl(ttl_seconds)?,
        clicks,
        created_at: parse_timestamp(created_at)?,
    })
}

impl MySqlLinkStore {
    async fn append_click(&self, link_id: LinkId, visit: Visit) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        let updated = sqlx::query(
            r#"
            UPDATE links
            SET clicks = clicks + 1
            WHERE id = ?
            "#,
        )
        .bind(link_id.0)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        if updated.rows_affected() == 0 {
            // Dropping the transaction rolls it back.
            return Err(StorageError::Missing(link_id.to_string()));
        }

        sqlx::query(
            r#"
            INSERT INTO click_events (link_id, ip, user_agent, referer, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(link_id.0)
        .bind(visit.ip)
        .bind(visit.user_agent)
        .bind(visit.referer)
        .bind(now_unix_millis())
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)
    }
}

#[async_trait]
impl LinkStore for MySqlLinkStore {
    async fn get_by_slug(&self, slug: &Slug) -> Result<Option<Link>> {
        let row = sqlx::query(
            r#"
            SELECT id, slug, url, ttl_seconds, clicks, created_at
            FROM links
            WHERE slug = ?
            LIMIT 1
            "#,
        )
        .bind(slug.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.as_ref().map(link_from_row).transpose()
    }

    async fn create_link(&self, link: NewLink) -> Result<Link> {
        let created_at = now_unix_millis();

        let result = sqlx::query(
            r#"
            INSERT INTO links (slug, url, ttl_seconds, clicks, created_at)
            VALUES (?, ?, ?, 0, ?)
            "#,
        )
        .bind(link.slug.as_str())
        .bind(link.url.as_str())
        .bind(link.ttl.map(|ttl| ttl.as_secs()))
        .bind(created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) => {
                let id = LinkId(done.last_insert_id());
                debug!(slug = %link.slug, link_id = %id, "Created link in MySQL");
                Ok(Link {
                    id,
                    slug: link.slug,
                    url: link.url,
                    ttl: link.ttl,
                    clicks: 0,
                    created_at: parse_timestamp(created_at)?,
                })
            }
            Err(err) if is_unique_violation(&err) => {
                Err(StorageError::Conflict(link.slug.to_string()))
            }
            Err(err) => Err(map_sqlx_error(err)),
        }
    }

    async fn record_click(&self, link_id: LinkId, visit: Visit, deadline: Duration) -> Result<()> {
        trace!(link_id = %link_id, "Recording click in MySQL");

        match tokio::time::timeout(deadline, self.append_click(link_id, visit)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(link_id = %link_id, deadline_ms = deadline.as_millis() as u64, "Click transaction abandoned");
                Err(StorageError::Timeout(format!(
                    "click recording for link {link_id} exceeded {}ms",
                    deadline.as_millis()
                )))
            }
        }
    }

    async fn count_clicks_since(&self, link_id: LinkId, since: Timestamp) -> Result<u64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM click_events
            WHERE link_id = ?
              AND created_at >= ?
            "#,
        )
        .bind(link_id.0)
        .bind(since.as_millisecond())
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        u64::try_from(count)
            .map_err(|_| StorageError::InvalidData(format!("negative click count {count}")))
    }
}
