pub mod cache;
pub mod health_profile;
pub mod llm;
