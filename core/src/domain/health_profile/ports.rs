use std::future::Future;

use crate::domain::{
    common::entities::app_errors::CoreError, health_profile::entities::HealthCondition,
};

/// Read-only access to the conditions recorded in a user's health profile.
#[cfg_attr(test, mockall::automock)]
pub trait HealthProfileRepository: Send + Sync {
    /// Returns an empty list when the user has no profile.
    fn get_health_conditions(
        &self,
        user_id: &str,
    ) -> impl Future<Output = Result<Vec<HealthCondition>, CoreError>> + Send;
}
