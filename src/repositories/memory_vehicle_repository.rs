use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::{StoreError, VehicleStore};
use crate::models::vehicle::{Vehicle, VehicleStatus};

/// Store en memoria - para tests y para correr sin DATABASE_URL
#[derive(Clone, Default)]
pub struct InMemoryVehicleStore {
    vehicles: Arc<RwLock<BTreeMap<i64, Vehicle>>>,
}

impl InMemoryVehicleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_vehicles(vehicles: Vec<Vehicle>) -> Self {
        let map = vehicles.into_iter().map(|v| (v.id, v)).collect();
        Self {
            vehicles: Arc::new(RwLock::new(map)),
        }
    }

    pub async fn insert(&self, vehicle: Vehicle) {
        self.vehicles.write().await.insert(vehicle.id, vehicle);
    }

    pub async fn remove(&self, id: i64) -> Option<Vehicle> {
        self.vehicles.write().await.remove(&id)
    }
}

#[async_trait]
impl VehicleStore for InMemoryVehicleStore {
    async fn list_all(&self) -> Result<Vec<Vehicle>, StoreError> {
        Ok(self.vehicles.read().await.values().cloned().collect())
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Vehicle>, StoreError> {
        Ok(self.vehicles.read().await.get(&id).cloned())
    }

    async fn set_status(
        &self,
        id: i64,
        expected: Option<VehicleStatus>,
        new_status: VehicleStatus,
    ) -> Result<Vehicle, StoreError> {
        let mut vehicles = self.vehicles.write().await;
        let vehicle = vehicles.get_mut(&id).ok_or(StoreError::NotFound(id))?;

        if let Some(expected) = expected {
            if vehicle.status != expected {
                return Err(StoreError::Conflict {
                    id,
                    expected,
                    actual: vehicle.status,
                });
            }
        }

        vehicle.status = new_status;
        vehicle.last_maintenance = Some(Utc::now());
        Ok(vehicle.clone())
    }
}
