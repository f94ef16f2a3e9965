use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use super::ClientRepository;
use crate::models::{Client, ClientFields};

/// In-process client store.
///
/// Every operation runs under one lock, so activation writes are atomic with
/// respect to each other. Data is lost when the process exits.
#[derive(Default)]
pub struct MemoryClientRepository {
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    next_id: i32,
    clients: Vec<Client>,
}

impl MemoryClientRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing set of records. New ids continue after the
    /// highest id present.
    pub fn with_clients(clients: Vec<Client>) -> Self {
        let next_id = clients.iter().map(|c| c.id).max().unwrap_or(0);
        Self {
            state: Mutex::new(State { next_id, clients }),
        }
    }

    fn newest_first(mut clients: Vec<Client>) -> Vec<Client> {
        clients.sort_by(|a, b| {
            b.created_on
                .cmp(&a.created_on)
                .then_with(|| b.id.cmp(&a.id))
        });
        clients
    }
}

impl State {
    fn clear_active(&mut self) -> u64 {
        let mut changed = 0;
        for client in self.clients.iter_mut().filter(|c| c.active) {
            client.active = false;
            changed += 1;
        }
        changed
    }
}

#[async_trait]
impl ClientRepository for MemoryClientRepository {
    async fn deactivate_all(&self) -> Result<u64> {
        Ok(self.state.lock().await.clear_active())
    }

    async fn insert_active(&self, fields: &ClientFields) -> Result<Client> {
        let mut state = self.state.lock().await;
        let id = state
            .next_id
            .checked_add(1)
            .ok_or_else(|| anyhow!("Client id space exhausted"))?;
        state.clear_active();
        state.next_id = id;

        let client = Client {
            id,
            name: fields.name.clone(),
            email: fields.email.clone(),
            phone: fields.phone.clone(),
            checkin: fields.checkin.clone(),
            checkout: fields.checkout.clone(),
            card_info: fields.card_info.clone(),
            signed: false,
            active: true,
            created_on: Utc::now(),
        };
        state.clients.push(client.clone());

        Ok(client)
    }

    async fn find(&self, id: i32) -> Result<Option<Client>> {
        let state = self.state.lock().await;
        Ok(state.clients.iter().find(|c| c.id == id).cloned())
    }

    async fn replace_inactive(&self, id: i32, fields: &ClientFields) -> Result<Option<Client>> {
        let mut state = self.state.lock().await;
        let Some(index) = state.clients.iter().position(|c| c.id == id) else {
            return Ok(None);
        };

        state.clear_active();

        let client = &mut state.clients[index];
        client.name = fields.name.clone();
        client.email = fields.email.clone();
        client.phone = fields.phone.clone();
        client.checkin = fields.checkin.clone();
        client.checkout = fields.checkout.clone();
        client.card_info = fields.card_info.clone();
        client.active = false;
        client.signed = false;

        Ok(Some(client.clone()))
    }

    async fn list_active(&self) -> Result<Vec<Client>> {
        let state = self.state.lock().await;
        let active = state.clients.iter().filter(|c| c.active).cloned().collect();
        Ok(Self::newest_first(active))
    }

    async fn list_unsigned(&self) -> Result<Vec<Client>> {
        let state = self.state.lock().await;
        let unsigned = state.clients.iter().filter(|c| !c.signed).cloned().collect();
        Ok(Self::newest_first(unsigned))
    }
}
