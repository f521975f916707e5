//! Equipment service

use std::sync::Arc;

use validator::Validate;

use crate::{
    error::{AppError, AppResult, ErrorResponse},
    models::equipment::{merge, Equipment, EquipmentInput},
    repository::{EquipmentSession, EquipmentStore},
};

/// Outcome of looking a record up by id
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    Found(Equipment),
    NotFound,
}

impl Lookup {
    /// Turn a miss into [`AppError::NotFound`] for `id`
    pub fn found(self, id: i32) -> AppResult<Equipment> {
        match self {
            Lookup::Found(equipment) => Ok(equipment),
            Lookup::NotFound => Err(AppError::NotFound(format!("Equipment {} not found", id))),
        }
    }
}

impl From<Option<Equipment>> for Lookup {
    fn from(row: Option<Equipment>) -> Self {
        row.map_or(Lookup::NotFound, Lookup::Found)
    }
}

#[derive(Clone)]
pub struct EquipmentService {
    store: Arc<dyn EquipmentStore>,
}

impl EquipmentService {
    pub fn new(store: Arc<dyn EquipmentStore>) -> Self {
        Self { store }
    }

    /// Open the storage session for one request
    pub async fn begin(&self) -> AppResult<Box<dyn EquipmentSession>> {
        self.store.begin().await
    }

    pub async fn ping(&self) -> AppResult<()> {
        self.store.ping().await
    }

    pub async fn list(&self, session: &mut dyn EquipmentSession) -> AppResult<Vec<Equipment>> {
        session.find_all().await
    }

    pub async fn lookup(&self, session: &mut dyn EquipmentSession, id: i32) -> AppResult<Lookup> {
        Ok(session.find_by_id(id).await?.into())
    }

    pub async fn get(&self, session: &mut dyn EquipmentSession, id: i32) -> AppResult<Equipment> {
        self.lookup(session, id).await?.found(id)
    }

    /// Return `candidate` if it still names a stored record
    pub async fn ensure_exists(
        &self,
        session: &mut dyn EquipmentSession,
        candidate: Equipment,
    ) -> AppResult<Equipment> {
        if candidate.id <= 0 {
            return Err(AppError::NotFound("Equipment without id".to_string()));
        }
        match self.lookup(session, candidate.id).await? {
            Lookup::Found(_) => Ok(candidate),
            Lookup::NotFound => Err(AppError::NotFound(format!(
                "Equipment {} not found",
                candidate.id
            ))),
        }
    }

    pub async fn create(
        &self,
        session: &mut dyn EquipmentSession,
        input: EquipmentInput,
    ) -> AppResult<Equipment> {
        let data = input.into_new()?;
        data.validate()?;

        let equipment = session.save_new(&data).await?;
        tracing::info!(id = equipment.id, "Equipment created");
        Ok(equipment)
    }

    /// Merge `input` onto the stored record and write it back
    pub async fn update(
        &self,
        session: &mut dyn EquipmentSession,
        id: i32,
        input: EquipmentInput,
    ) -> AppResult<Equipment> {
        let existing = self.get(session, id).await?;
        let mut updated = merge(existing, input)?;
        updated.validate()?;
        updated.touch();

        let candidate = self.ensure_exists(session, updated).await?;
        let equipment = session.save(&candidate).await?;
        tracing::info!(id = equipment.id, "Equipment updated");
        Ok(equipment)
    }

    pub async fn delete(&self, session: &mut dyn EquipmentSession, id: i32) -> AppResult<()> {
        let equipment = self.get(session, id).await?;
        session.delete(&equipment).await?;
        tracing::info!(id, "Equipment deleted");
        Ok(())
    }

    pub fn not_found_payload() -> ErrorResponse {
        ErrorResponse::new("Equipment not found")
    }

    pub fn bad_request_payload() -> ErrorResponse {
        ErrorResponse::new("Bad request")
    }

    pub fn update_error_payload() -> ErrorResponse {
        ErrorResponse::new("Unable to update equipment")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{MemoryEquipmentRepository, MockEquipmentStore};
    use serde_json::json;
    use tokio_test::{assert_err, assert_ok};

    fn service() -> EquipmentService {
        EquipmentService::new(Arc::new(MemoryEquipmentRepository::new()))
    }

    fn input(value: serde_json::Value) -> EquipmentInput {
        serde_json::from_value(value).unwrap()
    }

    async fn seeded(service: &EquipmentService) -> Equipment {
        let mut session = service.begin().await.unwrap();
        let created = service
            .create(
                session.as_mut(),
                input(json!({
                    "name": "Drill",
                    "category": "Tools",
                    "number": "T-001",
                    "description": "Cordless"
                })),
            )
            .await
            .unwrap();
        session.commit().await.unwrap();
        created
    }

    #[tokio::test]
    async fn test_create_then_get() {
        let service = service();
        let created = seeded(&service).await;
        assert!(created.id > 0);
        assert!(created.updated_at.is_none());

        let mut session = service.begin().await.unwrap();
        let fetched = service.get(session.as_mut(), created.id).await.unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_create_rejects_short_name() {
        let service = service();
        let mut session = service.begin().await.unwrap();
        let result = service
            .create(session.as_mut(), input(json!({"name": "Dr", "number": "T-001"})))
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert!(service.list(session.as_mut()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_lookup_miss() {
        let service = service();
        let mut session = service.begin().await.unwrap();
        assert_eq!(service.lookup(session.as_mut(), 42).await.unwrap(), Lookup::NotFound);
        assert!(matches!(
            service.get(session.as_mut(), 42).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_ensure_exists() {
        let service = service();
        let created = seeded(&service).await;
        let mut session = service.begin().await.unwrap();

        assert_ok!(service.ensure_exists(session.as_mut(), created.clone()).await);

        let mut unsaved = created.clone();
        unsaved.id = 0;
        assert_err!(service.ensure_exists(session.as_mut(), unsaved).await);

        let mut missing = created;
        missing.id = 999;
        assert_err!(service.ensure_exists(session.as_mut(), missing).await);
    }

    #[tokio::test]
    async fn test_partial_update_keeps_other_fields() {
        let service = service();
        let created = seeded(&service).await;

        let mut session = service.begin().await.unwrap();
        let updated = service
            .update(session.as_mut(), created.id, input(json!({"name": "X-Drill"})))
            .await
            .unwrap();
        session.commit().await.unwrap();

        assert_eq!(updated.name, "X-Drill");
        assert_eq!(updated.category, created.category);
        assert_eq!(updated.number, created.number);
        assert_eq!(updated.description, created.description);
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at.unwrap() > created.created_at);

        let mut session = service.begin().await.unwrap();
        let again = service
            .update(session.as_mut(), created.id, input(json!({"number": "T-002"})))
            .await
            .unwrap();
        assert!(again.updated_at.unwrap() > updated.updated_at.unwrap());
    }

    #[tokio::test]
    async fn test_update_validates_merged_record() {
        let service = service();
        let created = seeded(&service).await;

        let mut session = service.begin().await.unwrap();
        let result = service
            .update(session.as_mut(), created.id, input(json!({"number": "T"})))
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_update_unknown_id() {
        let service = service();
        let mut session = service.begin().await.unwrap();
        let result = service
            .update(session.as_mut(), 7, input(json!({"name": "Hammer"})))
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_then_get() {
        let service = service();
        let created = seeded(&service).await;

        let mut session = service.begin().await.unwrap();
        service.delete(session.as_mut(), created.id).await.unwrap();
        session.commit().await.unwrap();

        let mut session = service.begin().await.unwrap();
        assert!(matches!(
            service.get(session.as_mut(), created.id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            service.delete(session.as_mut(), created.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let mut store = MockEquipmentStore::new();
        store
            .expect_begin()
            .returning(|| Err(AppError::Database(sqlx::Error::PoolTimedOut)));
        let service = EquipmentService::new(Arc::new(store));

        assert!(matches!(service.begin().await, Err(AppError::Database(_))));
    }

    #[test]
    fn test_payloads() {
        assert_eq!(EquipmentService::not_found_payload().error, "Equipment not found");
        assert_eq!(EquipmentService::bad_request_payload().error, "Bad request");
        assert_eq!(
            EquipmentService::update_error_payload().error,
            "Unable to update equipment"
        );
    }
}
