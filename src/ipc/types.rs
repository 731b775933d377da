use std::path::PathBuf;

use serde::Deserialize;

use crate::config::AppConfig;
use crate::store::TableStore;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub config: AppConfig,
    pub workspace: Option<PathBuf>,
    pub store: Option<Box<dyn TableStore>>,
}
