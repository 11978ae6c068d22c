use std::sync::Arc;

use crate::analyzer::Analyzer;
use crate::storage::Storage;

#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn Storage>,
    pub analyzer: Arc<Analyzer>,
}
