//! PostgreSQL storage implementation

use crate::{models::*, DatabaseUrl, Result};
use futures::future::BoxFuture;
use sqlx::{postgres::PgPoolOptions, PgPool, Postgres, Transaction};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, instrument, warn};

/// Name of the mirrored table
pub const CUSTOMERS_TABLE: &str = "customers";

const UPSERT_CUSTOMER_SQL: &str = r#"
    INSERT INTO customers ("objectId", name, "objectKey", "createdAt", "updatedAt")
    VALUES ($1, $2, $3, NOW(), NOW())
    ON CONFLICT ("objectId")
    DO UPDATE SET name = EXCLUDED.name, "updatedAt" = NOW()
"#;

const SELECT_CUSTOMER_COLUMNS: &str = r#"
    SELECT "objectId",
           name,
           "objectKey",
           "createdAt"::timestamptz AS "createdAt",
           "updatedAt"::timestamptz AS "updatedAt"
    FROM customers
"#;

/// Configuration for the PostgreSQL connection pool
///
/// A sync run is strictly sequential, so one connection is enough.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 1,
            acquire_timeout_secs: 30,
        }
    }
}

/// Storage for the `customers` table
pub struct CustomerStorage {
    pool: PgPool,
}

impl CustomerStorage {
    /// Connect with the default pool configuration
    pub async fn connect(url: &DatabaseUrl) -> Result<Self> {
        Self::connect_with(url, PoolConfig::default()).await
    }

    /// Connect using a PoolConfig
    pub async fn connect_with(url: &DatabaseUrl, config: PoolConfig) -> Result<Self> {
        if config.max_connections == 0 {
            return Err(crate::Error::ValidationError(
                "max_connections must be > 0".to_string(),
            ));
        }

        debug!(database_url = %url, "Connecting to database");

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect_with(url.connect_options())
            .await
            .map_err(map_db_error)?;

        Ok(Self { pool })
    }

    /// Wrap an existing pool
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Close every pooled connection
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Execute a closure within a transaction
    ///
    /// This method:
    /// 1. Begins a new transaction
    /// 2. Executes the provided closure with the transaction
    /// 3. Commits on success, rolls back on error
    async fn with_transaction<F, T>(&self, f: F) -> Result<T>
    where
        F: for<'c> FnOnce(&'c mut Transaction<'_, Postgres>) -> BoxFuture<'c, Result<T>> + Send,
        T: Send,
    {
        let start = Instant::now();
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        let result = match f(&mut tx).await {
            Ok(result) => {
                tx.commit().await.map_err(map_db_error)?;
                Ok(result)
            }
            Err(e) => {
                if let Err(rollback_err) = tx.rollback().await {
                    error!(error = %rollback_err, "Rollback failed");
                }
                Err(e)
            }
        };

        let elapsed = start.elapsed();
        if elapsed.as_secs() >= 5 {
            warn!(
                duration_ms = elapsed.as_millis() as u64,
                "Slow database transaction detected"
            );
        }

        result
    }

    // ========== Input Validation Helpers ==========

    /// Validate pagination parameters
    fn validate_pagination_params(limit: i64, offset: i64) -> Result<()> {
        if limit <= 0 {
            return Err(crate::Error::ValidationError(
                "Limit must be greater than 0".to_string(),
            ));
        }
        if limit > 1000 {
            return Err(crate::Error::ValidationError(
                "Limit cannot exceed 1000".to_string(),
            ));
        }
        if offset < 0 {
            return Err(crate::Error::ValidationError(
                "Offset must be non-negative".to_string(),
            ));
        }
        Ok(())
    }

    /// Validate that every record has a non-empty id and name
    fn validate_records(records: &[CustomerRecord]) -> Result<()> {
        for record in records {
            if record.object_id.trim().is_empty() {
                return Err(crate::Error::ValidationError(
                    "Customer objectId cannot be empty".to_string(),
                ));
            }
            if record.name.is_empty() {
                return Err(crate::Error::ValidationError(format!(
                    "Customer {} has an empty name",
                    record.object_id
                )));
            }
        }
        Ok(())
    }

    // ========== Customer Operations ==========

    /// Replace the whole table with `records`
    ///
    /// Deletes every row, then upserts each record, all in one transaction. A
    /// failure anywhere rolls back, leaving the previous contents in place.
    #[instrument(
        skip(self, records),
        fields(
            db.system = "postgresql",
            db.operation = "DELETE+UPSERT",
            db.sql.table = CUSTOMERS_TABLE,
            records = records.len()
        )
    )]
    pub async fn replace_customers(&self, records: &[CustomerRecord]) -> Result<ReplaceSummary> {
        Self::validate_records(records)?;
        let records = records.to_vec();

        let summary = self
            .with_transaction(|tx| {
                Box::pin(async move {
                    info!("Clearing existing customer records");
                    let deleted = sqlx::query("DELETE FROM customers")
                        .execute(&mut **tx)
                        .await
                        .map_err(map_db_error)?
                        .rows_affected();

                    info!(records = records.len(), "Inserting customer records");
                    let upserted = upsert_all(tx, &records).await?;

                    Ok(ReplaceSummary { deleted, upserted })
                })
            })
            .await?;

        info!(
            deleted = summary.deleted,
            upserted = summary.upserted,
            "Customer table replaced"
        );

        Ok(summary)
    }

    /// Upsert one record without deleting anything
    ///
    /// On conflict only `name` and `updatedAt` change; an existing `objectKey`
    /// is kept.
    #[instrument(
        skip(self, record),
        fields(
            db.system = "postgresql",
            db.operation = "UPSERT",
            db.sql.table = CUSTOMERS_TABLE,
            object_id = %record.object_id
        )
    )]
    pub async fn upsert_customer(&self, record: &CustomerRecord) -> Result<()> {
        Self::validate_records(std::slice::from_ref(record))?;

        sqlx::query(UPSERT_CUSTOMER_SQL)
            .bind(&record.object_id)
            .bind(&record.name)
            .bind(&record.object_key)
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;

        Ok(())
    }

    /// Count rows in the table
    #[instrument(
        skip(self),
        fields(db.system = "postgresql", db.operation = "SELECT", db.sql.table = CUSTOMERS_TABLE)
    )]
    pub async fn count_customers(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customers")
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_error)?;

        Ok(count)
    }

    /// Get a customer by objectId
    #[instrument(
        skip(self),
        fields(db.system = "postgresql", db.operation = "SELECT", db.sql.table = CUSTOMERS_TABLE)
    )]
    pub async fn get_customer(&self, object_id: &str) -> Result<CustomerModel> {
        let sql = format!(r#"{} WHERE "objectId" = $1"#, SELECT_CUSTOMER_COLUMNS);

        sqlx::query_as::<_, CustomerModel>(&sql)
            .bind(object_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error)?
            .ok_or_else(|| crate::Error::NotFound(format!("Customer {}", object_id)))
    }

    /// List customers ordered by name
    #[instrument(
        skip(self),
        fields(db.system = "postgresql", db.operation = "SELECT", db.sql.table = CUSTOMERS_TABLE)
    )]
    pub async fn list_customers(&self, limit: i64, offset: i64) -> Result<Vec<CustomerModel>> {
        Self::validate_pagination_params(limit, offset)?;
        let sql = format!(
            r#"{} ORDER BY name, "objectId" LIMIT $1 OFFSET $2"#,
            SELECT_CUSTOMER_COLUMNS
        );

        let customers = sqlx::query_as::<_, CustomerModel>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_error)?;

        Ok(customers)
    }
}

/// Upsert each record on the given transaction
async fn upsert_all(tx: &mut Transaction<'_, Postgres>, records: &[CustomerRecord]) -> Result<u64> {
    let mut upserted = 0;
    for record in records {
        sqlx::query(UPSERT_CUSTOMER_SQL)
            .bind(&record.object_id)
            .bind(&record.name)
            .bind(&record.object_key)
            .execute(&mut **tx)
            .await
            .map_err(map_db_error)?;
        upserted += 1;
    }
    Ok(upserted)
}

fn map_db_error(err: sqlx::Error) -> crate::Error {
    // Map connection-related errors
    match &err {
        sqlx::Error::PoolTimedOut => {
            error!(error = %err, "Connection pool timed out");
            return crate::Error::PoolExhausted("Connection pool timed out".to_string());
        }
        sqlx::Error::PoolClosed => {
            error!(error = %err, "Connection pool closed");
            return crate::Error::ConnectionFailed("Connection pool closed".to_string());
        }
        sqlx::Error::Io(io_err) => {
            error!(error = %err, "Database connection failed");
            return crate::Error::ConnectionFailed(io_err.to_string());
        }
        _ => {}
    }

    // Map PostgreSQL-specific errors
    if let sqlx::Error::Database(db_err) = &err {
        if let Some(code) = db_err.code().as_deref() {
            match code {
                // undefined_table - the customers table has not been created
                "42P01" => {
                    error!(
                        error_code = code,
                        message = db_err.message(),
                        "Customers table does not exist"
                    );
                    return crate::Error::MissingTable(db_err.message().to_string());
                }
                // not_null_violation - required field is null
                "23502" => {
                    warn!(
                        error_code = code,
                        message = db_err.message(),
                        "Not null violation"
                    );
                    return crate::Error::ValidationError(format!(
                        "Required field cannot be null: {}",
                        db_err.message()
                    ));
                }
                // too_many_connections - connection limit reached
                "53300" => {
                    error!(
                        error_code = code,
                        message = db_err.message(),
                        "Database connection limit reached"
                    );
                    return crate::Error::PoolExhausted(db_err.message().to_string());
                }
                // invalid_password / invalid_authorization_specification
                "28P01" | "28000" => {
                    error!(
                        error_code = code,
                        message = db_err.message(),
                        "Database authentication failed"
                    );
                    return crate::Error::ConnectionFailed(db_err.message().to_string());
                }
                // connection_failure - database connection failed
                "08006" | "08001" | "08003" | "08004" | "3D000" => {
                    error!(
                        error_code = code,
                        message = db_err.message(),
                        "Database connection failed"
                    );
                    return crate::Error::ConnectionFailed(db_err.message().to_string());
                }
                _ => {
                    error!(
                        error_code = code,
                        message = db_err.message(),
                        "Unexpected database error"
                    );
                }
            }
        }
    }

    error!(error = %err, "Database error");
    crate::Error::Database(err)
}
