pub mod config;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod storage;
pub mod utils;

use std::sync::Arc;

use reqwest::Client;

use crate::services::{
    activity_service::ActivityService, analysis_service::AnalysisService,
    auth_service::AuthService, lifecycle_service::LifecycleService,
};
use crate::storage::snapshot::SnapshotBackend;

#[derive(Clone)]
pub struct AppState {
    pub activity_service: ActivityService,
    pub lifecycle_service: LifecycleService,
    pub analysis_service: AnalysisService,
    pub auth_service: AuthService,
}

impl AppState {
    pub async fn new(snapshot: Arc<dyn SnapshotBackend>) -> Self {
        let config = crate::config::get_config();
        let http_client = Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .unwrap();

        let activity_service = ActivityService::open(snapshot).await;
        let lifecycle_service = LifecycleService::new(activity_service.clone());
        let analysis_service = AnalysisService::new(config.openai_api_key.clone(), http_client);
        let auth_service = AuthService::new();

        Self {
            activity_service,
            lifecycle_service,
            analysis_service,
            auth_service,
        }
    }
}
