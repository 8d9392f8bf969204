pub mod http;
pub mod request_context;
