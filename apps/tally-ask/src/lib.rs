use std::{
	fs,
	path::{Path, PathBuf},
	sync::Arc,
};

use clap::Parser;
use color_eyre::eyre;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use tally_service::{Answer, TallyService};
use tally_storage::qdrant::QdrantStore;

#[derive(Debug, Parser)]
#[command(
	version = tally_cli::VERSION,
	rename_all = "kebab",
	styles = tally_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	/// One question per line. Blank lines and lines starting with `#` are skipped.
	#[arg(long, short = 's', value_name = "FILE")]
	pub suite: Option<PathBuf>,
	#[arg(value_name = "QUESTION", required_unless_present = "suite")]
	pub questions: Vec<String>,
}

#[derive(Debug, Serialize)]
struct AskLine<'a> {
	question: &'a str,
	#[serde(skip_serializing_if = "Option::is_none")]
	answer: Option<Answer>,
	#[serde(skip_serializing_if = "Option::is_none")]
	error: Option<String>,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let cfg = tally_config::load(&args.config)?;
	let filter = EnvFilter::new(cfg.service.log_level.clone());

	tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

	let mut questions = args.questions;

	if let Some(path) = &args.suite {
		questions.extend(load_suite(path)?);
	}
	if questions.is_empty() {
		return Err(eyre::eyre!("No questions to answer."));
	}

	let store = QdrantStore::new(&cfg.storage.qdrant)?;
	let service = TallyService::new(cfg, Arc::new(store));

	service.rebuild_corpus().await?;

	for question in &questions {
		let line = match service.ask(question).await {
			Ok(answer) => AskLine { question, answer: Some(answer), error: None },
			Err(err) => {
				tracing::error!(question = %question, error = %err, "Question failed.");

				AskLine { question, answer: None, error: Some(err.to_string()) }
			},
		};

		println!("{}", serde_json::to_string(&line)?);
	}

	Ok(())
}

fn load_suite(path: &Path) -> color_eyre::Result<Vec<String>> {
	let raw = fs::read_to_string(path)?;

	Ok(parse_suite(&raw))
}

fn parse_suite(raw: &str) -> Vec<String> {
	raw.lines()
		.map(str::trim)
		.filter(|line| !line.is_empty() && !line.starts_with('#'))
		.map(str::to_string)
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn suite_skips_blank_and_comment_lines() {
		let raw = "# December\nHow much did I spend at Whole Foods?\n\n   \n  What did I buy at CVS?  \n";

		assert_eq!(
			parse_suite(raw),
			vec!["How much did I spend at Whole Foods?", "What did I buy at CVS?"]
		);
	}

	#[test]
	fn questions_are_required_without_a_suite() {
		assert!(Args::try_parse_from(["tally-ask", "--config", "tally.toml"]).is_err());
		assert!(
			Args::try_parse_from(["tally-ask", "--config", "tally.toml", "--suite", "q.txt"]).is_ok()
		);

		let args = Args::try_parse_from(["tally-ask", "-c", "tally.toml", "How much at Shell?"])
			.expect("Failed to parse arguments.");

		assert_eq!(args.questions, vec!["How much at Shell?"]);
	}
}
