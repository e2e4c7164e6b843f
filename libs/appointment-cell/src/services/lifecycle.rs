use tracing::{debug, warn};

use shared_config::AppConfig;
use shared_models::scheduling::AppointmentStatus;

use crate::models::AppointmentError;

/// Which status changes an appointment may go through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransitionPolicy {
    /// Any known status may follow any other.
    #[default]
    Permissive,
    /// `pending -> confirmed | canceled`, `confirmed -> completed | canceled`;
    /// `completed` and `canceled` are terminal.
    Strict,
}

impl TransitionPolicy {
    pub fn from_config(config: &AppConfig) -> Self {
        if config.strict_status_transitions {
            TransitionPolicy::Strict
        } else {
            TransitionPolicy::Permissive
        }
    }
}

pub struct AppointmentLifecycleService {
    policy: TransitionPolicy,
}

impl AppointmentLifecycleService {
    pub fn new(policy: TransitionPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> TransitionPolicy {
        self.policy
    }

    /// Parse a status name from a request body
    pub fn parse_status(&self, value: &str) -> Result<AppointmentStatus, AppointmentError> {
        value.trim().parse::<AppointmentStatus>().map_err(|_| {
            let allowed: Vec<&str> = AppointmentStatus::ALL.iter().map(|s| s.as_str()).collect();
            AppointmentError::InvalidStatus(format!(
                "'{}' is not one of {}",
                value.trim(),
                allowed.join(", ")
            ))
        })
    }

    /// Validate that a status transition is allowed
    pub fn validate_status_transition(
        &self,
        current_status: AppointmentStatus,
        new_status: AppointmentStatus,
    ) -> Result<(), AppointmentError> {
        debug!("Validating status transition from {} to {}", current_status, new_status);

        // Re-asserting the current status is always accepted
        if current_status == new_status {
            return Ok(());
        }

        if !self.get_valid_transitions(current_status).contains(&new_status) {
            warn!("Invalid status transition attempted: {} -> {}", current_status, new_status);
            return Err(AppointmentError::InvalidStatusTransition {
                from: current_status,
                to: new_status,
            });
        }

        Ok(())
    }

    /// Get all valid next statuses for a given current status
    pub fn get_valid_transitions(&self, current_status: AppointmentStatus) -> Vec<AppointmentStatus> {
        match self.policy {
            TransitionPolicy::Permissive => AppointmentStatus::ALL
                .iter()
                .copied()
                .filter(|s| *s != current_status)
                .collect(),
            TransitionPolicy::Strict => match current_status {
                AppointmentStatus::Pending => vec![AppointmentStatus::Confirmed, AppointmentStatus::Canceled],
                AppointmentStatus::Confirmed => vec![AppointmentStatus::Completed, AppointmentStatus::Canceled],
                // Terminal states
                AppointmentStatus::Completed | AppointmentStatus::Canceled => vec![],
            },
        }
    }

    pub fn is_terminal(&self, status: AppointmentStatus) -> bool {
        self.get_valid_transitions(status).is_empty()
    }
}

impl Default for AppointmentLifecycleService {
    fn default() -> Self {
        Self::new(TransitionPolicy::default())
    }
}
