use sqlx::PgPool;
use time::OffsetDateTime;

use wejk_domain::rate_limit::{self, Admission, RateLimitPolicy, RateLimitRecord};

use crate::{Error, Result};

/// Evaluates one admission for `identity` under a transaction-scoped advisory lock keyed by the
/// identity, so concurrent requests for the same caller serialize while others proceed.
pub async fn admit(
	pool: &PgPool,
	identity: &str,
	policy: &RateLimitPolicy,
	now: OffsetDateTime,
) -> Result<Admission> {
	let mut tx = pool.begin().await?;

	sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
		.bind(identity)
		.execute(&mut *tx)
		.await?;

	let row: Option<(i32, OffsetDateTime)> = sqlx::query_as(
		"SELECT request_count, window_reset_at FROM rate_limits WHERE identity = $1",
	)
	.bind(identity)
	.fetch_optional(&mut *tx)
	.await?;
	let record = row
		.map(|(count, window_reset_at)| {
			let count = u32::try_from(count).map_err(|_| {
				Error::InvalidArgument(format!("Negative request count stored for {identity:?}."))
			})?;

			Ok::<_, Error>(RateLimitRecord { count, window_reset_at })
		})
		.transpose()?;
	let (admission, next) = rate_limit::evaluate(record.as_ref(), policy, now);

	if let Some(next) = next {
		let count = i32::try_from(next.count).map_err(|_| {
			Error::InvalidArgument(format!("Request count overflow for {identity:?}."))
		})?;

		sqlx::query(
			"\
INSERT INTO rate_limits (identity, request_count, window_reset_at, updated_at)
VALUES ($1, $2, $3, $4)
ON CONFLICT (identity) DO UPDATE
SET request_count = EXCLUDED.request_count,
	window_reset_at = EXCLUDED.window_reset_at,
	updated_at = EXCLUDED.updated_at",
		)
		.bind(identity)
		.bind(count)
		.bind(next.window_reset_at)
		.bind(now)
		.execute(&mut *tx)
		.await?;
	}

	tx.commit().await?;

	Ok(admission)
}
