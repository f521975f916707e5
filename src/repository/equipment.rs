//! PostgreSQL equipment repository

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Transaction};

use super::{EquipmentSession, EquipmentStore};
use crate::{
    error::{AppError, AppResult},
    models::equipment::{Equipment, NewEquipment},
};

#[derive(Clone)]
pub struct EquipmentRepository {
    pool: Pool<Postgres>,
}

impl EquipmentRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EquipmentStore for EquipmentRepository {
    async fn begin(&self) -> AppResult<Box<dyn EquipmentSession>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgEquipmentSession { tx }))
    }

    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Session backed by a database transaction; rolled back on drop
pub struct PgEquipmentSession {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl EquipmentSession for PgEquipmentSession {
    /// List all equipment
    async fn find_all(&mut self) -> AppResult<Vec<Equipment>> {
        let rows = sqlx::query_as::<_, Equipment>("SELECT * FROM equipment ORDER BY id")
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(rows)
    }

    /// Get equipment by ID
    async fn find_by_id(&mut self, id: i32) -> AppResult<Option<Equipment>> {
        let row = sqlx::query_as::<_, Equipment>("SELECT * FROM equipment WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(row)
    }

    /// Create equipment
    async fn save_new(&mut self, data: &NewEquipment) -> AppResult<Equipment> {
        let row = sqlx::query_as::<_, Equipment>(
            r#"
            INSERT INTO equipment (name, category, number, description, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&data.name)
        .bind(&data.category)
        .bind(&data.number)
        .bind(&data.description)
        .bind(data.created_at)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(row)
    }

    /// Update equipment; `id` and `created_at` are never written
    async fn save(&mut self, equipment: &Equipment) -> AppResult<Equipment> {
        sqlx::query_as::<_, Equipment>(
            r#"
            UPDATE equipment
            SET name = $1, category = $2, number = $3, description = $4, updated_at = $5
            WHERE id = $6
            RETURNING *
            "#,
        )
        .bind(&equipment.name)
        .bind(&equipment.category)
        .bind(&equipment.number)
        .bind(&equipment.description)
        .bind(equipment.updated_at)
        .bind(equipment.id)
        .fetch_optional(&mut *self.tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Equipment {} not found", equipment.id)))
    }

    /// Delete equipment
    async fn delete(&mut self, equipment: &Equipment) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM equipment WHERE id = $1")
            .bind(equipment.id)
            .execute(&mut *self.tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Equipment {} not found", equipment.id)));
        }
        Ok(())
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
