pub mod wiring;

use std::{
	io::{self, Write},
	path::{Path, PathBuf},
};

use clap::Parser;
use color_eyre::eyre;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use wejk_domain::{
	answer::{AssistantResponse, QuickResponse},
	intent::ChatTurn,
};
use wejk_service::{AskOutcome, AskRequest, Rejection};

#[derive(Debug, Parser)]
#[command(
	version = wejk_cli::VERSION,
	rename_all = "kebab",
	styles = wejk_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	/// Stable caller identity used for rate limiting.
	#[arg(long, value_name = "ID")]
	pub identity: Option<String>,
	/// JSON array of prior turns: `[{"role": "user", "text": "..."}]`.
	#[arg(long, value_name = "FILE")]
	pub history_file: Option<PathBuf>,
	pub question: String,
}

/// One line per channel, in arrival order.
#[derive(Debug, Serialize)]
#[serde(tag = "channel", rename_all = "snake_case")]
pub enum Printed<'a> {
	Rejected { rejection: &'a Rejection },
	Quick { session_id: String, response: &'a QuickResponse },
	Full { session_id: String, response: Option<&'a AssistantResponse> },
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = wejk_config::load(&args.config)?;

	init_tracing(&config)?;

	let history = match &args.history_file {
		Some(path) => read_history(path)?,
		None => Vec::new(),
	};
	let orchestrator = wiring::orchestrator(config).await?;
	let request = AskRequest { question: args.question, history, identity: args.identity };
	let handles = match orchestrator.ask_question(request).await {
		AskOutcome::Rejected(rejection) => {
			print_line(&Printed::Rejected { rejection: &rejection })?;

			return Ok(());
		},
		AskOutcome::Accepted(handles) => handles,
	};
	let session_id = handles.session_id.to_string();
	let quick = handles.quick.await.map_err(|_| eyre::eyre!("Quick answer was never sent."))?;

	print_line(&Printed::Quick { session_id: session_id.clone(), response: &quick })?;

	let full = handles.full.await.map_err(|_| eyre::eyre!("Full answer was never sent."))?;

	print_line(&Printed::Full { session_id, response: full.as_ref() })?;

	// The session task ends once its trace is persisted.
	handles.session.await?;

	Ok(())
}

pub fn read_history(path: &Path) -> color_eyre::Result<Vec<ChatTurn>> {
	let raw = std::fs::read_to_string(path)?;
	let turns: Vec<ChatTurn> = serde_json::from_str(&raw)?;

	Ok(turns)
}

fn print_line(printed: &Printed<'_>) -> color_eyre::Result<()> {
	let mut stdout = io::stdout().lock();

	serde_json::to_writer(&mut stdout, printed)?;
	writeln!(stdout)?;

	Ok(())
}

fn init_tracing(config: &wejk_config::Config) -> color_eyre::Result<()> {
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();

	Ok(())
}
