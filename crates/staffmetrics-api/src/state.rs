use std::sync::Arc;

use staffmetrics_report::ReportEngine;
use staffmetrics_store::RecordStore;

use crate::auth::JwtService;
use crate::rate_limit::RateLimiter;
use crate::settings::ApiSettings;

/// Shared handler state. Cheap to clone.
#[derive(Clone)]
pub struct ApiState {
    pub store: Arc<dyn RecordStore>,
    pub reports: ReportEngine,
    pub jwt: Arc<JwtService>,
    pub limiter: Arc<RateLimiter>,
    pub settings: Arc<ApiSettings>,
}

impl ApiState {
    pub fn new(store: Arc<dyn RecordStore>, jwt: JwtService, settings: ApiSettings) -> Self {
        Self {
            reports: ReportEngine::new(Arc::clone(&store)),
            store,
            jwt: Arc::new(jwt),
            limiter: Arc::new(RateLimiter::per_minute(settings.rate_limit_per_minute)),
            settings: Arc::new(settings),
        }
    }
}
