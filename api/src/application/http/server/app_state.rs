use std::sync::Arc;

use nutriscan_core::application::NutriscanService;

use crate::args::Args;

#[derive(Clone)]
pub struct AppState {
    pub args: Arc<Args>,
    pub service: Arc<NutriscanService>,
}

impl AppState {
    pub fn new(args: Arc<Args>, service: NutriscanService) -> Self {
        Self {
            args,
            service: Arc::new(service),
        }
    }
}
