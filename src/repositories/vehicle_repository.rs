use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::{StoreError, VehicleStore};
use crate::models::vehicle::{Vehicle, VehicleStatus};

// Fila cruda de la tabla vehicles
#[derive(Debug, sqlx::FromRow)]
struct VehicleRow {
    id: i64,
    name: String,
    status: String,
    last_maintenance: Option<DateTime<Utc>>,
}

impl TryFrom<VehicleRow> for Vehicle {
    type Error = StoreError;

    fn try_from(row: VehicleRow) -> Result<Self, Self::Error> {
        let status = VehicleStatus::from_label(&row.status)
            .ok_or_else(|| StoreError::InvalidStatus(row.status.clone()))?;
        Ok(Vehicle {
            id: row.id,
            name: row.name,
            status,
            last_maintenance: row.last_maintenance,
        })
    }
}

fn backend_error(context: &str, e: sqlx::Error) -> StoreError {
    StoreError::Backend(format!("{}: {}", context, e))
}

pub struct PgVehicleStore {
    pool: PgPool,
}

impl PgVehicleStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VehicleStore for PgVehicleStore {
    async fn list_all(&self) -> Result<Vec<Vehicle>, StoreError> {
        let rows = sqlx::query_as::<_, VehicleRow>(
            "SELECT id, name, status, last_maintenance FROM vehicles ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| backend_error("Error listing vehicles", e))?;

        rows.into_iter().map(Vehicle::try_from).collect()
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Vehicle>, StoreError> {
        let row = sqlx::query_as::<_, VehicleRow>(
            "SELECT id, name, status, last_maintenance FROM vehicles WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| backend_error("Error finding vehicle", e))?;

        row.map(Vehicle::try_from).transpose()
    }

    async fn set_status(
        &self,
        id: i64,
        expected: Option<VehicleStatus>,
        new_status: VehicleStatus,
    ) -> Result<Vehicle, StoreError> {
        // Compare-and-set en una sola sentencia: la fila se actualiza solo si
        // el estado sigue siendo el observado
        let row = sqlx::query_as::<_, VehicleRow>(
            r#"
            UPDATE vehicles
            SET status = $2, last_maintenance = NOW()
            WHERE id = $1 AND ($3::text IS NULL OR status = $3)
            RETURNING id, name, status, last_maintenance
            "#,
        )
        .bind(id)
        .bind(new_status.label())
        .bind(expected.map(|s| s.label()))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| backend_error("Error updating vehicle status", e))?;

        if let Some(row) = row {
            return Vehicle::try_from(row);
        }

        // Sin fila: o no existe, o el estado cambió entre lectura y escritura
        match (self.get_by_id(id).await?, expected) {
            (None, _) => Err(StoreError::NotFound(id)),
            (Some(current), Some(expected)) => Err(StoreError::Conflict {
                id,
                expected,
                actual: current.status,
            }),
            (Some(_), None) => Err(StoreError::Backend(format!(
                "Update of vehicle {} affected no rows",
                id
            ))),
        }
    }
}
