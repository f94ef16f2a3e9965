//! Client registry
//!
//! Records desk clients and tracks which one is currently being served. At
//! most one client is active: inserting a client makes it the only active
//! one, and modifying any client leaves none active.

mod error;

use std::sync::Arc;

use crate::db::ClientRepository;
use crate::models::{Client, ClientFields};

pub use error::{RegistryError, Result};

#[derive(Clone)]
pub struct ClientRegistry {
    repo: Arc<dyn ClientRepository>,
}

impl ClientRegistry {
    pub fn new(repo: Arc<dyn ClientRepository>) -> Self {
        Self { repo }
    }

    /// Clear the active flag on every client. Idempotent.
    pub async fn deactivate_all(&self) -> Result<()> {
        let changed = self.repo.deactivate_all().await?;
        tracing::debug!(changed, "Deactivated clients");
        Ok(())
    }

    /// Register a new client and make it the only active one.
    pub async fn insert(&self, fields: &ClientFields) -> Result<Client> {
        let client = self.repo.insert_active(fields).await?;
        tracing::info!(id = client.id, "Client {} inserted and set as active", client.name);
        Ok(client)
    }

    /// Overwrite a client's details. Every client, the modified one included,
    /// ends up inactive and the modified client is reset to unsigned.
    ///
    /// An unknown id fails with [`RegistryError::NotFound`] before anything
    /// is written.
    pub async fn modify(&self, id: i32, fields: &ClientFields) -> Result<Client> {
        if self.repo.find(id).await?.is_none() {
            return Err(RegistryError::NotFound(id));
        }

        let client = self
            .repo
            .replace_inactive(id, fields)
            .await?
            .ok_or(RegistryError::NotFound(id))?;

        tracing::info!("Client {} modified and set as not active", id);
        Ok(client)
    }

    pub async fn get(&self, id: i32) -> Result<Client> {
        self.repo.find(id).await?.ok_or(RegistryError::NotFound(id))
    }

    /// Active clients, newest first. Normally zero or one; every active
    /// record is returned if there are more.
    pub async fn get_active(&self) -> Result<Vec<Client>> {
        let active = self.repo.list_active().await?;
        if active.len() > 1 {
            let ids: Vec<i32> = active.iter().map(|c| c.id).collect();
            tracing::warn!(?ids, "More than one client is active");
        }
        Ok(active)
    }

    /// Clients that have not signed yet, newest first.
    pub async fn list_unsigned(&self) -> Result<Vec<Client>> {
        Ok(self.repo.list_unsigned().await?)
    }
}

#[cfg(test)]
mod tests;
