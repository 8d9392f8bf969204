pub mod entities;
pub mod extractor;
pub mod fingerprint;
pub mod invoker;
pub mod merger;
pub mod pipeline;
pub mod ports;
pub mod prompts;
pub mod schema;
pub mod services;
pub mod temp_file;
pub mod validation;
pub mod value_objects;

pub use entities::*;
pub use ports::*;
pub use value_objects::*;
