use crate::layout::GridLayout;
use std::time::Duration;

const DEFAULT_INTER_COMMAND_DELAY_MS: u64 = 50;
const DEFAULT_POST_CONNECT_DELAY_MS: u64 = 100;
const MAX_DELAY_MS: u64 = 5_000;

/// Fixed delays used when the facility cannot fence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettlePolicy {
    pub inter_command: Duration,
    pub post_connect: Duration,
}

impl Default for SettlePolicy {
    fn default() -> Self {
        Self {
            inter_command: Duration::from_millis(DEFAULT_INTER_COMMAND_DELAY_MS),
            post_connect: Duration::from_millis(DEFAULT_POST_CONNECT_DELAY_MS),
        }
    }
}

impl SettlePolicy {
    pub fn none() -> Self {
        Self {
            inter_command: Duration::ZERO,
            post_connect: Duration::ZERO,
        }
    }

    /// Defaults overridden by `FLOWBOARD_INTER_COMMAND_DELAY_MS` and
    /// `FLOWBOARD_POST_CONNECT_DELAY_MS`
    pub fn from_env() -> Self {
        let inter = std::env::var("FLOWBOARD_INTER_COMMAND_DELAY_MS").ok();
        let post = std::env::var("FLOWBOARD_POST_CONNECT_DELAY_MS").ok();
        Self {
            inter_command: parse_delay(inter.as_deref(), DEFAULT_INTER_COMMAND_DELAY_MS),
            post_connect: parse_delay(post.as_deref(), DEFAULT_POST_CONNECT_DELAY_MS),
        }
    }
}

fn parse_delay(raw: Option<&str>, default_ms: u64) -> Duration {
    let ms = raw
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default_ms)
        .min(MAX_DELAY_MS);
    Duration::from_millis(ms)
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ApplierConfig {
    pub settle: SettlePolicy,
    pub layout: GridLayout,
}

impl ApplierConfig {
    pub fn from_env() -> Self {
        Self {
            settle: SettlePolicy::from_env(),
            layout: GridLayout::default(),
        }
    }

    /// No sleeping at all; for tests and facilities that apply synchronously
    pub fn immediate() -> Self {
        Self {
            settle: SettlePolicy::none(),
            layout: GridLayout::default(),
        }
    }
}
