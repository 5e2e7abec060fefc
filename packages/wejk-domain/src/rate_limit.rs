//! Sliding-window admission arithmetic shared by every rate-limit store.

use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
	pub window: Duration,
	pub max_requests: u32,
}
impl RateLimitPolicy {
	pub fn from_config(cfg: &wejk_config::RateLimit) -> Self {
		Self {
			window: Duration::seconds(i64::try_from(cfg.window_seconds).unwrap_or(i64::MAX)),
			max_requests: cfg.max_requests,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitRecord {
	pub count: u32,
	#[serde(with = "time::serde::rfc3339")]
	pub window_reset_at: OffsetDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum Admission {
	Allowed { count: u32 },
	Denied { retry_after_minutes: u64 },
}
impl Admission {
	pub fn is_allowed(&self) -> bool {
		matches!(self, Self::Allowed { .. })
	}
}

/// Decides one admission and returns the record to persist, if it changed.
///
/// Callers must hold the per-identity lock between reading `record` and writing the result.
pub fn evaluate(
	record: Option<&RateLimitRecord>,
	policy: &RateLimitPolicy,
	now: OffsetDateTime,
) -> (Admission, Option<RateLimitRecord>) {
	let fresh = RateLimitRecord { count: 1, window_reset_at: now + policy.window };

	let Some(record) = record else {
		return (Admission::Allowed { count: 1 }, Some(fresh));
	};

	if now > record.window_reset_at {
		return (Admission::Allowed { count: 1 }, Some(fresh));
	}
	if record.count >= policy.max_requests {
		return (
			Admission::Denied { retry_after_minutes: retry_after_minutes(record, now) },
			None,
		);
	}

	let count = record.count + 1;

	(Admission::Allowed { count }, Some(RateLimitRecord { count, ..*record }))
}

fn retry_after_minutes(record: &RateLimitRecord, now: OffsetDateTime) -> u64 {
	let remaining = (record.window_reset_at - now).whole_seconds().max(0) as u64;

	remaining.div_ceil(60).max(1)
}
