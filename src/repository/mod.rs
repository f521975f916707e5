//! Repository layer for database operations
//!
//! Handlers never touch the pool directly: each request opens one
//! [`EquipmentSession`] through an [`EquipmentStore`], performs its reads and
//! writes on it and commits once. A session dropped without `commit` leaves
//! the stored state unchanged.

pub mod equipment;
pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use crate::{
    error::AppResult,
    models::equipment::{Equipment, NewEquipment},
};

pub use equipment::EquipmentRepository;
pub use memory::MemoryEquipmentRepository;

/// Factory for request-scoped storage sessions
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EquipmentStore: Send + Sync {
    /// Open a new session
    async fn begin(&self) -> AppResult<Box<dyn EquipmentSession>>;

    /// Check that the backing store is reachable
    async fn ping(&self) -> AppResult<()>;
}

/// Unit of work over the equipment table
#[async_trait]
pub trait EquipmentSession: Send {
    /// All records, ordered by id
    async fn find_all(&mut self) -> AppResult<Vec<Equipment>>;

    async fn find_by_id(&mut self, id: i32) -> AppResult<Option<Equipment>>;

    /// Insert a new record and return it with its assigned id
    async fn save_new(&mut self, data: &NewEquipment) -> AppResult<Equipment>;

    /// Write back an existing record. Fails with `NotFound` if the row is gone.
    async fn save(&mut self, equipment: &Equipment) -> AppResult<Equipment>;

    async fn delete(&mut self, equipment: &Equipment) -> AppResult<()>;

    /// Make every change of this session durable
    async fn commit(self: Box<Self>) -> AppResult<()>;
}

/// Main repository struct holding the storage backend
#[derive(Clone)]
pub struct Repository {
    pub equipment: Arc<dyn EquipmentStore>,
}

impl Repository {
    /// Create a repository backed by PostgreSQL
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self::with_store(Arc::new(EquipmentRepository::new(pool)))
    }

    /// Create a repository backed by process memory
    pub fn in_memory() -> Self {
        Self::with_store(Arc::new(MemoryEquipmentRepository::new()))
    }

    pub fn with_store(equipment: Arc<dyn EquipmentStore>) -> Self {
        Self { equipment }
    }
}
