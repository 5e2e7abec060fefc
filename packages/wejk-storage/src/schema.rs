pub fn render_schema() -> String {
	expand_includes(include_str!("../../../sql/init.sql"))
}

fn expand_includes(sql: &str) -> String {
	let mut out = String::new();

	for line in sql.lines() {
		let trimmed = line.trim();

		if let Some(path) = trimmed.strip_prefix("\\ir ") {
			match path.trim() {
				"tables/001_rate_limits.sql" =>
					out.push_str(include_str!("../../../sql/tables/001_rate_limits.sql")),
				"tables/002_session_traces.sql" =>
					out.push_str(include_str!("../../../sql/tables/002_session_traces.sql")),
				_ => {},
			}

			out.push('\n');

			continue;
		}

		out.push_str(line);
		out.push('\n');
	}

	out
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn schema_inlines_every_table() {
		let sql = render_schema();

		assert!(sql.contains("CREATE TABLE IF NOT EXISTS rate_limits"));
		assert!(sql.contains("CREATE TABLE IF NOT EXISTS session_traces"));
		assert!(!sql.contains("\\ir"));
	}
}
