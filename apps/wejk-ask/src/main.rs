use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = wejk_ask::Args::parse();

	wejk_ask::run(args).await
}
