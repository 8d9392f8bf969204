use std::{io::ErrorKind, path::PathBuf};

use tracing::{debug, error};

use crate::domain::{
    common::{ProfileStoreConfig, entities::app_errors::CoreError},
    health_profile::{
        entities::{HealthCondition, HealthProfile},
        ports::HealthProfileRepository,
    },
};

/// Reads health profiles stored as `<profile_dir>/<user_id>.json`.
#[derive(Debug, Clone)]
pub struct FileHealthProfileRepository {
    profile_dir: PathBuf,
}

impl FileHealthProfileRepository {
    pub fn new(config: &ProfileStoreConfig) -> Self {
        Self {
            profile_dir: config.profile_dir.clone(),
        }
    }

    fn profile_path(&self, user_id: &str) -> Result<PathBuf, CoreError> {
        let safe = !user_id.is_empty()
            && user_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !safe {
            return Err(CoreError::Database(format!("invalid user id '{user_id}'")));
        }
        Ok(self.profile_dir.join(format!("{user_id}.json")))
    }
}

impl HealthProfileRepository for FileHealthProfileRepository {
    async fn get_health_conditions(
        &self,
        user_id: &str,
    ) -> Result<Vec<HealthCondition>, CoreError> {
        let path = self.profile_path(user_id)?;

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(user_id, "No health profile stored");
                return Ok(Vec::new());
            }
            Err(e) => {
                error!(user_id, error = %e, "Failed to read health profile");
                return Err(CoreError::Database(e.to_string()));
            }
        };

        let profile: HealthProfile = serde_json::from_slice(&bytes).map_err(|e| {
            error!(user_id, error = %e, "Malformed health profile");
            CoreError::Database(format!("malformed profile: {e}"))
        })?;

        Ok(profile.to_conditions())
    }
}
