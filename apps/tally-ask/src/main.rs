use clap::Parser;

use tally_ask::Args;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = Args::parse();

	tally_ask::run(args).await
}
