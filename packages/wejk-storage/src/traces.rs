use serde_json::Value;
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::Result;

pub struct SessionTraceRow<'a> {
	pub session_id: Uuid,
	pub question: &'a str,
	pub started_at: OffsetDateTime,
	pub ended_at: OffsetDateTime,
	pub failed: bool,
	pub payload: Value,
}

/// Sessions are written once; a repeated id keeps the first row.
pub async fn insert_session_trace(pool: &PgPool, row: SessionTraceRow<'_>) -> Result<bool> {
	let result = sqlx::query(
		"\
INSERT INTO session_traces (session_id, question, started_at, ended_at, failed, payload)
VALUES ($1, $2, $3, $4, $5, $6)
ON CONFLICT (session_id) DO NOTHING",
	)
	.bind(row.session_id)
	.bind(row.question)
	.bind(row.started_at)
	.bind(row.ended_at)
	.bind(row.failed)
	.bind(row.payload)
	.execute(pool)
	.await?;

	Ok(result.rows_affected() == 1)
}

pub async fn fetch_session_trace(pool: &PgPool, session_id: Uuid) -> Result<Option<Value>> {
	let payload: Option<Value> =
		sqlx::query_scalar("SELECT payload FROM session_traces WHERE session_id = $1")
			.bind(session_id)
			.fetch_optional(pool)
			.await?;

	Ok(payload)
}
