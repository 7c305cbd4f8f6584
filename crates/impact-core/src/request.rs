//! Per-call inference request facts

use crate::electricity::DEFAULT_GEOGRAPHY;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Observed facts about one inference call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// Tokens generated by the model
    pub output_token_count: u64,
    /// Wall-clock request latency in seconds
    pub measured_latency_seconds: f64,
    /// Geography code of the serving datacenter
    pub geography: String,
}

impl Request {
    pub fn new(
        output_token_count: u64,
        measured_latency_seconds: f64,
        geography: impl Into<String>,
    ) -> Self {
        Self {
            output_token_count,
            measured_latency_seconds,
            geography: geography.into(),
        }
    }

    /// Request timed with a [`Duration`], e.g. from `Instant::elapsed`
    pub fn from_duration(
        output_token_count: u64,
        latency: Duration,
        geography: impl Into<String>,
    ) -> Self {
        Self::new(output_token_count, latency.as_secs_f64(), geography)
    }

    /// Request served in the default geography
    pub fn in_default_geography(output_token_count: u64, measured_latency_seconds: f64) -> Self {
        Self::new(output_token_count, measured_latency_seconds, DEFAULT_GEOGRAPHY)
    }
}
