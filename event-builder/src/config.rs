//! Configuration management for the event builder.
//!
//! Loads configuration from `EVENT_BUILDER_*` environment variables with
//! sensible defaults. Unparseable or out-of-range values fall back to the
//! default.

use crate::fields::DEFAULT_BUTTON_WINDOW;
use crate::gateway::GatewayLatency;
use crate::modules::RenderContext;
use crate::schedule::DEFAULT_EVENT_DURATION;
use serde::{Deserialize, Serialize};
use std::env;
use std::ops::RangeInclusive;
use std::time::Duration;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Mock backend configuration
    pub gateway: GatewayConfig,
    /// Editor behaviour
    pub editor: EditorConfig,
    /// Log filter directives, as accepted by `EnvFilter`
    pub log_filter: String,
}

/// Mock backend latencies, in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// `create_event` latency
    pub create_latency_ms: u64,
    /// Update and `add_module` latency
    pub update_latency_ms: u64,
    /// `get_quick_links` latency
    pub quick_links_latency_ms: u64,
    /// Give up waiting for an action's result after this long (unset: wait forever)
    pub action_timeout_ms: Option<u64>,
}

/// Editor configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorConfig {
    /// Quick-add buttons shown before "show more"
    pub button_window: usize,
    /// Default event length in minutes for the date editor
    pub default_duration_minutes: i64,
    /// Countdown target offset in days when the event has no start
    pub countdown_fallback_days: i64,
}

impl Config {
    /// Default `EnvFilter` directives
    pub const DEFAULT_LOG_FILTER: &'static str = "event_builder=debug,event_builder_runtime=info";

    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            gateway: GatewayConfig {
                create_latency_ms: env::var("EVENT_BUILDER_CREATE_LATENCY_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(500),
                update_latency_ms: env::var("EVENT_BUILDER_UPDATE_LATENCY_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(300),
                quick_links_latency_ms: env::var("EVENT_BUILDER_QUICK_LINKS_LATENCY_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(200),
                action_timeout_ms: env::var("EVENT_BUILDER_ACTION_TIMEOUT_MS")
                    .ok()
                    .and_then(|s| s.parse().ok()),
            },
            editor: EditorConfig {
                button_window: env::var("EVENT_BUILDER_BUTTON_WINDOW")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_BUTTON_WINDOW),
                default_duration_minutes: parse_in_range(
                    env::var("EVENT_BUILDER_DEFAULT_DURATION_MINUTES").ok(),
                    EditorConfig::DURATION_MINUTES_RANGE,
                )
                .unwrap_or(EditorConfig::DEFAULT_DURATION_MINUTES),
                countdown_fallback_days: parse_in_range(
                    env::var("EVENT_BUILDER_COUNTDOWN_FALLBACK_DAYS").ok(),
                    EditorConfig::COUNTDOWN_FALLBACK_DAYS_RANGE,
                )
                .unwrap_or(RenderContext::DEFAULT_COUNTDOWN_FALLBACK_DAYS),
            },
            log_filter: env::var("EVENT_BUILDER_LOG")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or_else(|_| Self::DEFAULT_LOG_FILTER.to_string()),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gateway: GatewayConfig {
                create_latency_ms: 500,
                update_latency_ms: 300,
                quick_links_latency_ms: 200,
                action_timeout_ms: None,
            },
            editor: EditorConfig {
                button_window: DEFAULT_BUTTON_WINDOW,
                default_duration_minutes: EditorConfig::DEFAULT_DURATION_MINUTES,
                countdown_fallback_days: RenderContext::DEFAULT_COUNTDOWN_FALLBACK_DAYS,
            },
            log_filter: Self::DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl GatewayConfig {
    /// Latencies for [`MockBackend`](crate::gateway::MockBackend)
    #[must_use]
    pub const fn latency(&self) -> GatewayLatency {
        GatewayLatency {
            create: Duration::from_millis(self.create_latency_ms),
            update: Duration::from_millis(self.update_latency_ms),
            quick_links: Duration::from_millis(self.quick_links_latency_ms),
        }
    }

    /// Timeout for [`EventActions`](crate::actions::EventActions)
    #[must_use]
    pub fn action_timeout(&self) -> Option<Duration> {
        self.action_timeout_ms.map(Duration::from_millis)
    }
}

impl EditorConfig {
    /// Two hours
    pub const DEFAULT_DURATION_MINUTES: i64 = 120;

    /// Accepted event lengths: up to a year
    pub const DURATION_MINUTES_RANGE: RangeInclusive<i64> = 0..=525_600;

    /// Accepted countdown offsets: up to a century
    pub const COUNTDOWN_FALLBACK_DAYS_RANGE: RangeInclusive<i64> = 0..=36_500;

    /// Default event length for the date editor
    ///
    /// Out-of-range settings give [`DEFAULT_EVENT_DURATION`].
    #[must_use]
    pub fn default_duration(&self) -> chrono::Duration {
        Some(self.default_duration_minutes)
            .filter(|minutes| Self::DURATION_MINUTES_RANGE.contains(minutes))
            .and_then(chrono::Duration::try_minutes)
            .unwrap_or(DEFAULT_EVENT_DURATION)
    }

    /// Unscheduled countdown offset
    ///
    /// Out-of-range settings give the 30-day default.
    #[must_use]
    pub fn countdown_fallback(&self) -> chrono::Duration {
        Some(self.countdown_fallback_days)
            .filter(|days| Self::COUNTDOWN_FALLBACK_DAYS_RANGE.contains(days))
            .and_then(chrono::Duration::try_days)
            .unwrap_or(RenderContext::DEFAULT_COUNTDOWN_FALLBACK)
    }
}

/// Parses an integer setting, discarding values outside `range`
fn parse_in_range(raw: Option<String>, range: RangeInclusive<i64>) -> Option<i64> {
    raw?.trim().parse().ok().filter(|value| range.contains(value))
}
