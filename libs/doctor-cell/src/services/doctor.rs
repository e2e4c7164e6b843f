use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use shared_database::SchedulingStore;
use shared_models::scheduling::Doctor;

use crate::models::DoctorError;

pub struct DoctorService {
    store: Arc<dyn SchedulingStore>,
}

impl DoctorService {
    pub fn new(store: Arc<dyn SchedulingStore>) -> Self {
        Self { store }
    }

    /// All doctors with their display info
    pub async fn list_doctors(&self) -> Result<Vec<Doctor>, DoctorError> {
        debug!("Listing doctors");
        Ok(self.store.list_doctors().await?)
    }

    /// Look up a doctor by record id
    pub async fn get_doctor(&self, doctor_id: Uuid) -> Result<Doctor, DoctorError> {
        debug!("Fetching doctor: {}", doctor_id);

        self.store
            .find_doctor(doctor_id)
            .await?
            .ok_or(DoctorError::NotFound)
    }

    /// Resolve the doctor record owned by a user account
    pub async fn resolve_user(&self, user_id: Uuid) -> Result<Doctor, DoctorError> {
        debug!("Resolving doctor for user: {}", user_id);

        self.store
            .find_doctor_by_user_id(user_id)
            .await?
            .ok_or(DoctorError::NotFoundForUser)
    }
}
