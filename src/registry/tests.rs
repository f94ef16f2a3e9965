use super::*;
use crate::db::MemoryClientRepository;
use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::sync::Mutex;

fn fields(name: &str) -> ClientFields {
    ClientFields {
        name: name.to_string(),
        email: format!("{name}@example.com"),
        phone: "0601020304".to_string(),
        checkin: "2024-06-01".to_string(),
        checkout: "2024-06-03".to_string(),
        card_info: "4111 1111 1111 1111".to_string(),
    }
}

fn memory_registry() -> ClientRegistry {
    ClientRegistry::new(Arc::new(MemoryClientRepository::new()))
}

fn seeded(id: i32, signed: bool, active: bool, age_minutes: i64) -> Client {
    Client {
        id,
        name: format!("client-{id}"),
        email: String::new(),
        phone: String::new(),
        checkin: String::new(),
        checkout: String::new(),
        card_info: String::new(),
        signed,
        active,
        created_on: Utc::now() - Duration::minutes(age_minutes),
    }
}

fn ids(clients: &[Client]) -> Vec<i32> {
    clients.iter().map(|c| c.id).collect()
}

// Records the order of repository calls so tests can check what ran.
#[derive(Default)]
struct RecordingRepository {
    calls: Mutex<Vec<&'static str>>,
}

impl RecordingRepository {
    fn record(&self, call: &'static str) {
        self.calls.lock().unwrap().push(call);
    }

    fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ClientRepository for RecordingRepository {
    async fn deactivate_all(&self) -> anyhow::Result<u64> {
        self.record("deactivate_all");
        Ok(0)
    }

    async fn insert_active(&self, _fields: &ClientFields) -> anyhow::Result<Client> {
        self.record("insert_active");
        Err(anyhow!("not used"))
    }

    async fn find(&self, _id: i32) -> anyhow::Result<Option<Client>> {
        self.record("find");
        Ok(None)
    }

    async fn replace_inactive(
        &self,
        _id: i32,
        _fields: &ClientFields,
    ) -> anyhow::Result<Option<Client>> {
        self.record("replace_inactive");
        Ok(None)
    }

    async fn list_active(&self) -> anyhow::Result<Vec<Client>> {
        self.record("list_active");
        Ok(vec![])
    }

    async fn list_unsigned(&self) -> anyhow::Result<Vec<Client>> {
        self.record("list_unsigned");
        Ok(vec![])
    }
}

struct FailingRepository;

#[async_trait]
impl ClientRepository for FailingRepository {
    async fn deactivate_all(&self) -> anyhow::Result<u64> {
        Err(anyhow!("connection refused"))
    }

    async fn insert_active(&self, _fields: &ClientFields) -> anyhow::Result<Client> {
        Err(anyhow!("connection refused"))
    }

    async fn find(&self, _id: i32) -> anyhow::Result<Option<Client>> {
        Err(anyhow!("connection refused"))
    }

    async fn replace_inactive(
        &self,
        _id: i32,
        _fields: &ClientFields,
    ) -> anyhow::Result<Option<Client>> {
        Err(anyhow!("connection refused"))
    }

    async fn list_active(&self) -> anyhow::Result<Vec<Client>> {
        Err(anyhow!("connection refused"))
    }

    async fn list_unsigned(&self) -> anyhow::Result<Vec<Client>> {
        Err(anyhow!("connection refused"))
    }
}

#[tokio::test]
async fn test_insert_makes_newest_client_the_only_active_one() {
    let registry = memory_registry();

    let mut last = None;
    for name in ["ana", "bruno", "chloe"] {
        let client = registry.insert(&fields(name)).await.unwrap();
        let active = registry.get_active().await.unwrap();
        assert_eq!(ids(&active), vec![client.id]);
        last = Some(client);
    }

    let last = last.unwrap();
    assert_eq!(last.name, "chloe");
    assert!(last.active);
    assert!(!last.signed);
}

#[tokio::test]
async fn test_insert_defaults_missing_fields() {
    let registry = memory_registry();
    let input = ClientFields {
        checkin: "2024-07-14".to_string(),
        checkout: "2024-07-16".to_string(),
        ..Default::default()
    };

    let client = registry.insert(&input).await.unwrap();
    let stored = registry.get(client.id).await.unwrap();

    assert_eq!(stored.name, "");
    assert_eq!(stored.email, "");
    assert_eq!(stored.phone, "");
    assert_eq!(stored.card_info, "");
    assert_eq!(stored.checkin, "2024-07-14");
    assert_eq!(stored.checkout, "2024-07-16");
    assert!(!stored.signed);
    assert!(stored.active);
}

#[tokio::test]
async fn test_modify_unknown_client_changes_nothing() {
    let registry = memory_registry();
    let active = registry.insert(&fields("ana")).await.unwrap();

    let err = registry.modify(active.id + 100, &fields("ghost")).await.unwrap_err();
    assert!(matches!(err, RegistryError::NotFound(id) if id == active.id + 100));

    let still_active = registry.get_active().await.unwrap();
    assert_eq!(ids(&still_active), vec![active.id]);
    assert_eq!(still_active[0], active);
}

#[tokio::test]
async fn test_modify_unknown_client_never_writes() {
    let repo = Arc::new(RecordingRepository::default());
    let registry = ClientRegistry::new(repo.clone());

    let err = registry.modify(5, &fields("ghost")).await.unwrap_err();

    assert!(matches!(err, RegistryError::NotFound(5)));
    assert_eq!(repo.calls(), vec!["find"]);
}

#[tokio::test]
async fn test_modify_other_client_leaves_no_active_client() {
    let registry = memory_registry();
    let b = registry.insert(&fields("bruno")).await.unwrap();
    let a = registry.insert(&fields("ana")).await.unwrap();
    assert_eq!(ids(&registry.get_active().await.unwrap()), vec![a.id]);

    let modified = registry.modify(b.id, &fields("bruno-2")).await.unwrap();

    assert!(!modified.active);
    assert!(registry.get_active().await.unwrap().is_empty());
    assert!(!registry.get(a.id).await.unwrap().active);
    assert!(!registry.get(b.id).await.unwrap().active);
}

#[tokio::test]
async fn test_modify_overwrites_fields_and_keeps_identity() {
    let registry = memory_registry();
    let original = registry.insert(&fields("ana")).await.unwrap();

    let update = ClientFields {
        name: "Ana Martin".to_string(),
        ..Default::default()
    };
    let modified = registry.modify(original.id, &update).await.unwrap();

    assert_eq!(modified.id, original.id);
    assert_eq!(modified.created_on, original.created_on);
    assert_eq!(modified.name, "Ana Martin");
    // Fields left out of the update are cleared, not preserved.
    assert_eq!(modified.email, "");
    assert_eq!(modified.card_info, "");
    assert!(!modified.active);
    assert!(!modified.signed);
}

#[tokio::test]
async fn test_modify_resets_signed() {
    let repo = MemoryClientRepository::with_clients(vec![seeded(1, true, false, 10)]);
    let registry = ClientRegistry::new(Arc::new(repo));

    let modified = registry.modify(1, &fields("ana")).await.unwrap();

    assert!(!modified.signed);
    assert_eq!(ids(&registry.list_unsigned().await.unwrap()), vec![1]);
}

#[tokio::test]
async fn test_list_unsigned_filters_signed_clients() {
    let repo = MemoryClientRepository::with_clients(vec![
        seeded(1, false, false, 50),
        seeded(2, true, false, 40),
        seeded(3, false, false, 30),
        seeded(4, true, false, 20),
        seeded(5, false, false, 10),
    ]);
    let registry = ClientRegistry::new(Arc::new(repo));

    let unsigned = registry.list_unsigned().await.unwrap();

    assert_eq!(unsigned.len(), 3);
    assert!(unsigned.iter().all(|c| !c.signed));
}

#[tokio::test]
async fn test_listings_are_newest_first() {
    let registry = memory_registry();
    let a = registry.insert(&fields("ana")).await.unwrap();
    let b = registry.insert(&fields("bruno")).await.unwrap();

    assert_eq!(ids(&registry.list_unsigned().await.unwrap()), vec![b.id, a.id]);
}

#[tokio::test]
async fn test_get_active_returns_every_active_client() {
    let repo = MemoryClientRepository::with_clients(vec![
        seeded(1, false, true, 30),
        seeded(2, false, true, 20),
        seeded(3, false, false, 10),
    ]);
    let registry = ClientRegistry::new(Arc::new(repo));

    assert_eq!(ids(&registry.get_active().await.unwrap()), vec![2, 1]);
}

#[tokio::test]
async fn test_deactivate_all_is_idempotent() {
    let repo = MemoryClientRepository::with_clients(vec![
        seeded(1, false, true, 30),
        seeded(2, false, true, 20),
    ]);
    let registry = ClientRegistry::new(Arc::new(repo));

    registry.deactivate_all().await.unwrap();
    assert!(registry.get_active().await.unwrap().is_empty());

    registry.deactivate_all().await.unwrap();
    assert!(registry.get_active().await.unwrap().is_empty());
    assert_eq!(registry.list_unsigned().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_get_unknown_client() {
    let registry = memory_registry();
    assert!(matches!(
        registry.get(3).await.unwrap_err(),
        RegistryError::NotFound(3)
    ));
}

#[tokio::test]
async fn test_storage_failures_surface() {
    let registry = ClientRegistry::new(Arc::new(FailingRepository));

    assert!(matches!(
        registry.insert(&fields("ana")).await,
        Err(RegistryError::Storage(_))
    ));
    assert!(matches!(
        registry.modify(1, &fields("ana")).await,
        Err(RegistryError::Storage(_))
    ));
    assert!(matches!(
        registry.get_active().await,
        Err(RegistryError::Storage(_))
    ));
    assert!(matches!(
        registry.list_unsigned().await,
        Err(RegistryError::Storage(_))
    ));
    assert!(matches!(
        registry.deactivate_all().await,
        Err(RegistryError::Storage(_))
    ));

    let err = registry.get(1).await.unwrap_err();
    assert!(err.to_string().contains("connection refused"));
}
