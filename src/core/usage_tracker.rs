//! Query usage tracking and daily limit management

use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::core::config::AdvisorConfig;
use crate::core::errors::AdvisorError;
use crate::core::models::{Language, UsageStats};

/// In-memory usage counters shared by all requests
#[derive(Debug, Clone)]
pub struct UsageTracker {
    usage: Arc<RwLock<UsageStats>>,
    alert_threshold: usize,
}

impl UsageTracker {
    pub fn new(daily_limit: usize, alert_threshold: usize) -> Self {
        Self {
            usage: Arc::new(RwLock::new(UsageStats::new(daily_limit))),
            alert_threshold,
        }
    }

    pub fn from_config(config: &AdvisorConfig) -> Self {
        Self::new(config.daily_query_limit, config.alert_threshold)
    }

    /// Claim one of today's query slots, failing with a daily-limit error
    /// once the cap is reached. The check and the increment share one lock
    /// hold, so concurrent requests cannot overshoot the limit.
    pub async fn try_reserve(&self) -> Result<(), AdvisorError> {
        let daily = {
            let mut usage = self.usage.write().await;
            usage.reset_if_needed();
            if usage.daily_queries >= usage.daily_limit {
                warn!(limit = usage.daily_limit, "daily query limit reached");
                return Err(AdvisorError::DailyLimit {
                    limit: usage.daily_limit,
                });
            }
            usage.daily_queries += 1;
            usage.daily_queries
        };

        debug!(daily_queries = daily, "query slot reserved");
        if daily == self.alert_threshold {
            warn!(
                daily_queries = daily,
                threshold = self.alert_threshold,
                "daily query volume reached alert threshold"
            );
        }
        Ok(())
    }

    /// Give back a slot taken by `try_reserve` for a query that was not answered
    pub async fn release(&self) {
        let mut usage = self.usage.write().await;
        usage.daily_queries = usage.daily_queries.saturating_sub(1);
    }

    /// Count one answered query in the preferred language
    pub async fn record_query(&self, lang: Language) {
        let mut usage = self.usage.write().await;
        usage.total_queries += 1;
        *usage
            .language_usage
            .entry(lang.code().to_string())
            .or_insert(0) += 1;
        debug!(total_queries = usage.total_queries, lang = lang.code(), "query recorded");
    }

    pub async fn record_document_upload(&self) {
        self.usage.write().await.document_uploads += 1;
    }

    pub async fn record_error(&self) {
        self.usage.write().await.errors += 1;
    }

    /// Get current usage statistics
    pub async fn get_stats(&self) -> UsageStats {
        let mut usage = self.usage.write().await;
        usage.reset_if_needed();
        usage.clone()
    }

    pub async fn remaining(&self) -> usize {
        self.usage.read().await.remaining()
    }

    /// Reset the daily counter (for testing or manual reset)
    pub async fn reset(&self) {
        let mut usage = self.usage.write().await;
        usage.daily_queries = 0;
        usage.last_reset = chrono::Utc::now();
        info!("Daily query counter reset");
    }
}
