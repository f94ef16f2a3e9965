mod memory;

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgConnection, PgPool};

use crate::config::Config;
use crate::models::{Client, ClientFields};

pub use memory::MemoryClientRepository;

// Column list shared by every query that yields a `Client`, in `FromRow` order.
macro_rules! client_columns {
    () => {
        "id, name, email, phone, checkin, checkout, card_info, signed, active, created_on"
    };
}

/// Persistence for client records.
///
/// Activation writes (`insert_active`, `replace_inactive`) clear every other
/// active flag as part of the same atomic step, so a reader never sees the
/// intermediate state.
#[async_trait]
pub trait ClientRepository: Send + Sync {
    /// Clear the active flag on every active client, returning how many changed.
    async fn deactivate_all(&self) -> Result<u64>;

    /// Deactivate all clients and insert a new active, unsigned client.
    async fn insert_active(&self, fields: &ClientFields) -> Result<Client>;

    async fn find(&self, id: i32) -> Result<Option<Client>>;

    /// Deactivate all clients and overwrite the editable fields of `id`,
    /// leaving it inactive and unsigned. Returns `None` (and changes nothing)
    /// when `id` does not exist.
    async fn replace_inactive(&self, id: i32, fields: &ClientFields) -> Result<Option<Client>>;

    /// Active clients, newest first.
    async fn list_active(&self) -> Result<Vec<Client>>;

    /// Unsigned clients, newest first.
    async fn list_unsigned(&self) -> Result<Vec<Client>>;
}

/// Postgres-backed client store
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new Database instance with a connection pool
    pub async fn new(config: &Config) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .connect(config.database_url()?)
            .await
            .context("Failed to connect to database")?;

        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the connection pool
    pub fn get_pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply the embedded schema migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!()
            .run(self.get_pool())
            .await
            .context("Failed to run migrations")?;

        Ok(())
    }

    // Activation writes from concurrent requests must not interleave. The
    // lock is self-conflicting but still admits plain reads.
    async fn lock_clients(conn: &mut PgConnection) -> Result<()> {
        sqlx::query("LOCK TABLE clients IN SHARE ROW EXCLUSIVE MODE")
            .execute(conn)
            .await?;

        Ok(())
    }

    async fn clear_active(conn: &mut PgConnection) -> Result<u64> {
        let result = sqlx::query("UPDATE clients SET active = FALSE WHERE active")
            .execute(conn)
            .await?;

        Ok(result.rows_affected())
    }
}

#[async_trait]
impl ClientRepository for Database {
    async fn deactivate_all(&self) -> Result<u64> {
        let mut conn = self.pool.acquire().await?;
        let changed = Self::clear_active(&mut conn)
            .await
            .context("Failed to deactivate clients")?;

        Ok(changed)
    }

    async fn insert_active(&self, fields: &ClientFields) -> Result<Client> {
        let mut tx = self.pool.begin().await?;

        Self::lock_clients(&mut tx)
            .await
            .context("Failed to lock clients table")?;
        Self::clear_active(&mut tx)
            .await
            .context("Failed to deactivate clients")?;

        // now() is fixed at transaction start; created_on must follow lock order.
        let client = sqlx::query_as::<_, Client>(concat!(
            "INSERT INTO clients (name, email, phone, checkin, checkout, card_info, active, signed, created_on) ",
            "VALUES ($1, $2, $3, $4, $5, $6, TRUE, FALSE, clock_timestamp()) ",
            "RETURNING ",
            client_columns!()
        ))
        .bind(&fields.name)
        .bind(&fields.email)
        .bind(&fields.phone)
        .bind(&fields.checkin)
        .bind(&fields.checkout)
        .bind(&fields.card_info)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to insert client")?;

        tx.commit().await?;

        Ok(client)
    }

    async fn find(&self, id: i32) -> Result<Option<Client>> {
        let client = sqlx::query_as::<_, Client>(concat!(
            "SELECT ",
            client_columns!(),
            " FROM clients WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.get_pool())
        .await
        .context("Failed to load client")?;

        Ok(client)
    }

    async fn replace_inactive(&self, id: i32, fields: &ClientFields) -> Result<Option<Client>> {
        let mut tx = self.pool.begin().await?;

        Self::lock_clients(&mut tx)
            .await
            .context("Failed to lock clients table")?;
        Self::clear_active(&mut tx)
            .await
            .context("Failed to deactivate clients")?;

        let client = sqlx::query_as::<_, Client>(concat!(
            "UPDATE clients ",
            "SET name = $1, email = $2, phone = $3, checkin = $4, checkout = $5, card_info = $6, ",
            "active = FALSE, signed = FALSE ",
            "WHERE id = $7 RETURNING ",
            client_columns!()
        ))
        .bind(&fields.name)
        .bind(&fields.email)
        .bind(&fields.phone)
        .bind(&fields.checkin)
        .bind(&fields.checkout)
        .bind(&fields.card_info)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .context("Failed to update client")?;

        match client {
            Some(client) => {
                tx.commit().await?;
                Ok(Some(client))
            }
            None => {
                tx.rollback().await?;
                Ok(None)
            }
        }
    }

    async fn list_active(&self) -> Result<Vec<Client>> {
        let clients = sqlx::query_as::<_, Client>(concat!(
            "SELECT ",
            client_columns!(),
            " FROM clients WHERE active ORDER BY created_on DESC, id DESC"
        ))
        .fetch_all(self.get_pool())
        .await
        .context("Failed to list active clients")?;

        Ok(clients)
    }

    async fn list_unsigned(&self) -> Result<Vec<Client>> {
        let clients = sqlx::query_as::<_, Client>(concat!(
            "SELECT ",
            client_columns!(),
            " FROM clients WHERE NOT signed ORDER BY created_on DESC, id DESC"
        ))
        .fetch_all(self.get_pool())
        .await
        .context("Failed to list unsigned clients")?;

        Ok(clients)
    }
}

/// Initialize the database connection pool and bring the schema up to date
pub async fn init(config: &Config) -> Result<Database> {
    let db = Database::new(config).await?;

    db.migrate().await?;

    Ok(db)
}
