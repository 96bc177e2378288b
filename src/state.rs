use std::sync::Arc;

use chrono::{Local, NaiveDate};

use crate::api::{ApiClient, ApiError};
use crate::cache::QueryCache;
use crate::config::AppConfig;
use crate::validations::{ActionDispatcher, InFlightActions, RequestSequencer, ValidationFetcher};

/// Shared by every request. Cloning only bumps reference counts.
#[derive(Clone)]
pub struct AppState {
    pub api: Arc<ApiClient>,
    pub cache: Arc<QueryCache>,
    pub sequencer: Arc<RequestSequencer>,
    pub in_flight: Arc<InFlightActions>,
    pub config: Arc<AppConfig>,
    today: Option<NaiveDate>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Result<Self, ApiError> {
        let api = ApiClient::new(&config.api_base(), config.request_timeout)?;
        Ok(Self {
            api: Arc::new(api),
            cache: Arc::new(QueryCache::new(config.cache_ttl)),
            sequencer: Arc::new(RequestSequencer::default()),
            in_flight: Arc::new(InFlightActions::default()),
            config: Arc::new(config),
            today: None,
        })
    }

    /// Pins the calendar date, for deterministic pages.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }

    pub fn fetcher(&self) -> ValidationFetcher<'_> {
        ValidationFetcher::new(&self.api, &self.cache, &self.sequencer)
    }

    pub fn dispatcher(&self) -> ActionDispatcher<'_> {
        ActionDispatcher::new(&self.api, &self.cache, &self.in_flight)
    }
}
