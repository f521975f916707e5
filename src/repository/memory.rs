//! In-memory equipment repository
//!
//! Used by the test suites and by `memory://` database URLs. A session reads
//! through its own pending changes onto the shared table and only publishes
//! them on commit. Ids come from a shared counter, so they are never reused,
//! even when the session that allocated them is discarded. A commit that
//! would write back a row deleted by another session fails as a whole.

use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{EquipmentSession, EquipmentStore};
use crate::{
    error::{AppError, AppResult},
    models::equipment::{Equipment, NewEquipment},
};

#[derive(Debug, Default)]
struct Table {
    rows: BTreeMap<i32, Equipment>,
    last_id: i32,
}

#[derive(Clone, Default)]
pub struct MemoryEquipmentRepository {
    table: Arc<Mutex<Table>>,
}

impl MemoryEquipmentRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EquipmentStore for MemoryEquipmentRepository {
    async fn begin(&self) -> AppResult<Box<dyn EquipmentSession>> {
        Ok(Box::new(MemoryEquipmentSession {
            table: self.table.clone(),
            pending: BTreeMap::new(),
            inserted: BTreeSet::new(),
        }))
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}

pub struct MemoryEquipmentSession {
    table: Arc<Mutex<Table>>,
    /// `None` marks a deletion
    pending: BTreeMap<i32, Option<Equipment>>,
    /// Ids allocated by `save_new` in this session
    inserted: BTreeSet<i32>,
}

impl MemoryEquipmentSession {
    async fn current(&self, id: i32) -> Option<Equipment> {
        match self.pending.get(&id) {
            Some(staged) => staged.clone(),
            None => self.table.lock().await.rows.get(&id).cloned(),
        }
    }
}

#[async_trait]
impl EquipmentSession for MemoryEquipmentSession {
    async fn find_all(&mut self) -> AppResult<Vec<Equipment>> {
        let mut rows = self.table.lock().await.rows.clone();
        for (id, staged) in &self.pending {
            match staged {
                Some(equipment) => rows.insert(*id, equipment.clone()),
                None => rows.remove(id),
            };
        }
        Ok(rows.into_values().collect())
    }

    async fn find_by_id(&mut self, id: i32) -> AppResult<Option<Equipment>> {
        Ok(self.current(id).await)
    }

    async fn save_new(&mut self, data: &NewEquipment) -> AppResult<Equipment> {
        let id = {
            let mut table = self.table.lock().await;
            table.last_id += 1;
            table.last_id
        };

        let equipment = Equipment {
            id,
            name: data.name.clone(),
            category: data.category.clone(),
            number: data.number.clone(),
            description: data.description.clone(),
            created_at: data.created_at,
            updated_at: None,
        };
        self.inserted.insert(id);
        self.pending.insert(id, Some(equipment.clone()));
        Ok(equipment)
    }

    async fn save(&mut self, equipment: &Equipment) -> AppResult<Equipment> {
        let stored = self
            .current(equipment.id)
            .await
            .ok_or_else(|| AppError::NotFound(format!("Equipment {} not found", equipment.id)))?;

        let updated = Equipment {
            id: stored.id,
            created_at: stored.created_at,
            ..equipment.clone()
        };
        self.pending.insert(updated.id, Some(updated.clone()));
        Ok(updated)
    }

    async fn delete(&mut self, equipment: &Equipment) -> AppResult<()> {
        if self.current(equipment.id).await.is_none() {
            return Err(AppError::NotFound(format!("Equipment {} not found", equipment.id)));
        }
        self.pending.insert(equipment.id, None);
        Ok(())
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        let MemoryEquipmentSession {
            table,
            pending,
            inserted,
        } = *self;
        let mut table = table.lock().await;

        let vanished = pending.iter().find(|(id, staged)| {
            staged.is_some() && !inserted.contains(*id) && !table.rows.contains_key(*id)
        });
        if let Some((id, _)) = vanished {
            return Err(AppError::NotFound(format!("Equipment {} not found", id)));
        }

        for (id, staged) in pending {
            match staged {
                Some(equipment) => table.rows.insert(id, equipment),
                None => table.rows.remove(&id),
            };
        }
        Ok(())
    }
}
