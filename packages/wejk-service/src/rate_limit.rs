use std::sync::Arc;

use serde::Serialize;
use time::OffsetDateTime;

use wejk_config::Config;
use wejk_domain::rate_limit::{Admission, RateLimitPolicy};

use crate::RateLimitStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum RejectionReason {
	MissingIdentity,
	RateLimited { retry_after_minutes: u64 },
	/// The counter store could not be reached. Requests are refused rather than admitted
	/// uncounted.
	Unavailable,
}

/// A refused request and the user-facing text explaining why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rejection {
	pub reason: RejectionReason,
	pub message: String,
}

#[derive(Clone)]
pub struct RateLimiter {
	store: Arc<dyn RateLimitStore>,
	policy: RateLimitPolicy,
	missing_identity_message: String,
	rate_limited_message: String,
	apology_message: String,
}
impl RateLimiter {
	pub fn new(cfg: &Config, store: Arc<dyn RateLimitStore>) -> Self {
		Self {
			store,
			policy: RateLimitPolicy::from_config(&cfg.rate_limit),
			missing_identity_message: cfg.assistant.missing_identity_message.clone(),
			rate_limited_message: cfg.assistant.rate_limited_message.clone(),
			apology_message: cfg.assistant.apology_message.clone(),
		}
	}

	/// Admits one request for `identity`. A missing or blank identity is refused before the
	/// store is touched.
	pub async fn admit(&self, identity: Option<&str>) -> Result<u32, Rejection> {
		self.admit_at(identity, OffsetDateTime::now_utc()).await
	}

	pub async fn admit_at(
		&self,
		identity: Option<&str>,
		now: OffsetDateTime,
	) -> Result<u32, Rejection> {
		let Some(identity) = identity.map(str::trim).filter(|identity| !identity.is_empty()) else {
			tracing::info!("Rejected request without caller identity.");

			return Err(self.reject(RejectionReason::MissingIdentity));
		};

		match self.store.admit(identity, &self.policy, now).await {
			Ok(Admission::Allowed { count }) => {
				tracing::debug!(identity, count, "Admitted request.");

				Ok(count)
			},
			Ok(Admission::Denied { retry_after_minutes }) => {
				tracing::info!(identity, retry_after_minutes, "Rate limit exceeded.");

				Err(self.reject(RejectionReason::RateLimited { retry_after_minutes }))
			},
			Err(err) => {
				tracing::warn!(error = %err, identity, "Rate-limit store failed.");

				Err(self.reject(RejectionReason::Unavailable))
			},
		}
	}

	fn reject(&self, reason: RejectionReason) -> Rejection {
		let message = match reason {
			RejectionReason::MissingIdentity => self.missing_identity_message.clone(),
			RejectionReason::RateLimited { retry_after_minutes } => self
				.rate_limited_message
				.replace("{minutes}", &retry_after_minutes.to_string()),
			RejectionReason::Unavailable => self.apology_message.clone(),
		};

		Rejection { reason, message }
	}
}
