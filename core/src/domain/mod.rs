pub mod analysis;
pub mod common;
pub mod health_profile;
