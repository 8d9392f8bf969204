pub mod file_profile_repository;

pub use file_profile_repository::FileHealthProfileRepository;
