//! Shared handler state.

use std::sync::Arc;

use crate::services::{InsightsGateway, StreamingRelay};

/// Shared handler state
#[derive(Debug, Clone)]
pub struct AppState {
    /// Absent when no model API key is configured; `/api/claude` then fails with 500
    pub relay: Option<Arc<StreamingRelay>>,
    /// Agent gateway for `/api/captain-insights`
    pub gateway: Arc<InsightsGateway>,
    /// Reported by `/health`
    pub service_name: String,
}
