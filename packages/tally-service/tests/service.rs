use std::{
	collections::BTreeSet,
	sync::{
		Arc, Mutex,
		atomic::{AtomicUsize, Ordering},
	},
	time::Duration,
};

use serde_json::Map;
use time::macros::datetime;

use tally_config::{
	Audit, Config, EmbeddingProviderConfig, LlmProviderConfig, Providers as ProviderSection, Qdrant,
	Resolver, Retry, Service, Storage,
};
use tally_domain::{
	Category, ClauseKind, MerchantOutcome, MerchantSource, Notice, Receipt, TemporalOutcome,
	TemporalStrategy,
};
use tally_providers::completion::ChatMessage;
use tally_service::{
	BoxFuture, CompletionProvider, EmbeddingProvider, Error, Providers, TallyService,
	answer::NO_MATCH_ANSWER,
};
use tally_testkit::{MemoryIndex, ReceiptBuilder, hash_embed, sample_receipts};

const DIM: usize = 64;

struct HashEmbedding {
	calls: Arc<AtomicUsize>,
	delay: Option<Duration>,
}
impl EmbeddingProvider for HashEmbedding {
	fn embed<'a>(
		&'a self,
		_cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, tally_providers::Result<Vec<Vec<f32>>>> {
		self.calls.fetch_add(1, Ordering::SeqCst);

		let vectors: Vec<Vec<f32>> = texts.iter().map(|text| hash_embed(text, DIM)).collect();
		let delay = self.delay;

		Box::pin(async move {
			if let Some(delay) = delay {
				tokio::time::sleep(delay).await;
			}

			Ok(vectors)
		})
	}
}

/// Answers each prompt by stage, recording which stages asked.
struct ScriptedCompletion {
	stages: Arc<Mutex<Vec<&'static str>>>,
	reply: fn(&'static str) -> String,
	delay: Option<Duration>,
}
impl CompletionProvider for ScriptedCompletion {
	fn complete<'a>(
		&'a self,
		_cfg: &'a LlmProviderConfig,
		messages: &'a [ChatMessage],
	) -> BoxFuture<'a, tally_providers::Result<String>> {
		let system = messages.first().map(|message| message.content.as_str()).unwrap_or_default();
		let stage = if system.contains("date expressions") {
			"temporal"
		} else if system.contains("known store") {
			"merchant"
		} else {
			"answer"
		};

		self.stages.lock().expect("Stage log poisoned.").push(stage);

		let reply = (self.reply)(stage);
		let delay = self.delay;

		Box::pin(async move {
			if let Some(delay) = delay {
				tokio::time::sleep(delay).await;
			}

			Ok(reply)
		})
	}
}

struct Harness {
	service: TallyService,
	embedding_calls: Arc<AtomicUsize>,
	stages: Arc<Mutex<Vec<&'static str>>>,
	search_calls: Arc<AtomicUsize>,
	filters_seen: Arc<Mutex<Vec<tally_domain::ChunkFilter>>>,
}
impl Harness {
	fn stages(&self) -> Vec<&'static str> {
		self.stages.lock().expect("Stage log poisoned.").clone()
	}
}

fn test_config() -> Config {
	Config {
		service: Service { log_level: "info".to_string() },
		storage: Storage {
			qdrant: Qdrant {
				url: "http://127.0.0.1:6334".to_string(),
				collection: "receipts".to_string(),
				vector_dim: DIM as u32,
			},
		},
		providers: ProviderSection {
			embedding: EmbeddingProviderConfig {
				provider_id: "test".to_string(),
				api_base: "http://127.0.0.1:1".to_string(),
				api_key: "test-key".to_string(),
				path: "/embeddings".to_string(),
				model: "hash".to_string(),
				dimensions: DIM as u32,
				timeout_ms: 1_000,
				default_headers: Map::new(),
			},
			llm: LlmProviderConfig {
				provider_id: "test".to_string(),
				api_base: "http://127.0.0.1:1".to_string(),
				api_key: "test-key".to_string(),
				path: "/chat/completions".to_string(),
				model: "scripted".to_string(),
				temperature: 0.0,
				timeout_ms: 1_000,
				default_headers: Map::new(),
			},
			retry: Retry { max_attempts: 2, base_backoff_ms: 1, max_backoff_ms: 2 },
		},
		resolver: Resolver {
			merchant_threshold: 0.75,
			reference_date: Some("2023-12-31".to_string()),
			llm_fallback: true,
		},
		retrieval: tally_config::Retrieval {
			top_k: 50,
			aggregation_top_k: 200,
			widen_on_empty: true,
			embedding_cache_entries: 64,
		},
		audit: Audit::default(),
		answer: tally_config::Answer::default(),
	}
}

async fn harness_with(
	cfg: Config,
	receipts: &[Receipt],
	reply: fn(&'static str) -> String,
	completion_delay: Option<Duration>,
	embedding_delay: Option<Duration>,
) -> Harness {
	let index = MemoryIndex::from_receipts(receipts, DIM);
	let search_calls = index.search_calls.clone();
	let filters_seen = index.filters_seen.clone();
	let embedding_calls = Arc::new(AtomicUsize::new(0));
	let stages = Arc::new(Mutex::new(Vec::new()));
	let providers = Providers::new(
		Arc::new(HashEmbedding { calls: embedding_calls.clone(), delay: embedding_delay }),
		Arc::new(ScriptedCompletion { stages: stages.clone(), reply, delay: completion_delay }),
	);
	let service = TallyService::with_providers(cfg, Arc::new(index), providers);

	service.rebuild_corpus().await.expect("Failed to build merchant corpus.");

	Harness { service, embedding_calls, stages, search_calls, filters_seen }
}

async fn harness(reply: fn(&'static str) -> String) -> Harness {
	harness_with(test_config(), &sample_receipts(), reply, None, None).await
}

fn silent(_stage: &'static str) -> String {
	"Here is what I found.".to_string()
}

fn receipt_ids(answer: &tally_service::Answer) -> BTreeSet<&str> {
	answer.unique_receipts.iter().map(|hit| hit.receipt_id.as_str()).collect()
}

#[tokio::test]
async fn whole_foods_on_december_13th_is_audited() {
	let harness = harness(|stage| match stage {
		"answer" => "Your Whole Foods total on December 13 was $142.56.".to_string(),
		_ => "NONE".to_string(),
	})
	.await;
	let answer = harness
		.service
		.ask("How much did I spend at Whole Foods on December 13th?")
		.await
		.expect("Failed to answer.");
	let audited = answer.audited_value.as_ref().expect("Expected an audited value.");

	assert_eq!(receipt_ids(&answer), BTreeSet::from(["wf-1213"]));
	assert_eq!(audited.display(), "$142.56");
	assert_eq!(audited.count, 1);
	assert_eq!(answer.answer_text, "Your Whole Foods total on December 13 was $142.56.");
	assert!(answer.notices.is_empty(), "{:?}", answer.notices);
	assert_eq!(answer.confidence, 1.0);
	assert_eq!(harness.stages(), vec!["answer"]);
}

#[tokio::test]
async fn contradicting_narrative_falls_back_to_template() {
	let harness = harness(|_| "You spent about $150 at Whole Foods.".to_string()).await;
	let answer = harness
		.service
		.ask("How much did I spend at Whole Foods on December 13th?")
		.await
		.expect("Failed to answer.");

	assert!(
		answer.answer_text.starts_with("You spent $142.56 at Whole Foods Market across 1 receipt."),
		"{}",
		answer.answer_text
	);
	assert!(!answer.answer_text.contains("$150"));
}

#[tokio::test]
async fn no_data_skips_the_generator() {
	let harness = harness(silent).await;
	let answer = harness
		.service
		.ask("How much did I spend at Whole Foods in March 2023?")
		.await
		.expect("Failed to answer.");

	assert_eq!(answer.answer_text, NO_MATCH_ANSWER);
	assert!(answer.audited_value.is_none());
	assert!(answer.unique_receipts.is_empty());
	assert_eq!(answer.notices, vec![Notice::NoMatch]);
	assert_eq!(answer.confidence, 0.0);
	assert!(answer.widened.is_none());
	assert!(harness.stages().is_empty());
}

#[tokio::test]
async fn strict_filter_widens_once_keeping_merchant_and_category() {
	let harness = harness(silent).await;
	let answer = harness
		.service
		.ask("groceries over $500 at Whole Foods")
		.await
		.expect("Failed to answer.");
	let filters = harness.filters_seen.lock().expect("Filter log poisoned.").clone();

	assert_eq!(answer.widened, Some(ClauseKind::Amount));
	assert!(answer.notices.contains(&Notice::Widened { dropped: ClauseKind::Amount }));
	assert_eq!(receipt_ids(&answer), BTreeSet::from(["wf-1202", "wf-1213"]));
	assert_eq!(harness.search_calls.load(Ordering::SeqCst), 2);
	assert_eq!(filters.len(), 2);
	assert!(filters[0].has(ClauseKind::Amount));
	assert!(!filters[1].has(ClauseKind::Amount));
	assert!(filters[1].has(ClauseKind::Merchant));
	assert!(filters[1].has(ClauseKind::Category));
	assert!((answer.confidence - 0.8).abs() < 1e-6);
}

#[tokio::test]
async fn query_embeddings_are_cached_until_the_corpus_is_rebuilt() {
	let harness = harness(silent).await;
	let question = "What did I buy at Home Depot?";

	harness.service.ask(question).await.expect("Failed to answer.");
	harness.service.ask(question).await.expect("Failed to answer.");

	assert_eq!(harness.embedding_calls.load(Ordering::SeqCst), 1);

	let corpus = harness.service.rebuild_corpus().await.expect("Failed to rebuild corpus.");

	assert_eq!(corpus.version(), 2);

	harness.service.ask(question).await.expect("Failed to answer.");

	assert_eq!(harness.embedding_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn deferred_date_expression_uses_the_fallback() {
	let harness = harness(|stage| match stage {
		"temporal" => r#"{"start": "2023-12-18", "end": "2023-12-24"}"#.to_string(),
		_ => "Four stops that week.".to_string(),
	})
	.await;
	let answer = harness
		.service
		.ask("What did I buy the week before Christmas?")
		.await
		.expect("Failed to answer.");

	assert!(matches!(
		answer.parameters.temporal,
		TemporalOutcome::Resolved { strategy: TemporalStrategy::Fallback, .. }
	));
	assert_eq!(receipt_ids(&answer), BTreeSet::from(["mc-1219", "sb-1220", "sh-1218", "wm-1222"]));
	assert_eq!(harness.stages(), vec!["temporal", "answer"]);
	assert!((answer.confidence - 0.9).abs() < 1e-6);
}

#[tokio::test]
async fn malformed_fallback_reply_leaves_time_unresolved() {
	let harness = harness(|stage| match stage {
		"temporal" => r#"{"start": "2023-12-24", "end": "2023-12-18"}"#.to_string(),
		_ => "Here is everything.".to_string(),
	})
	.await;
	let answer = harness
		.service
		.ask("What did I buy the week before Christmas?")
		.await
		.expect("Failed to answer.");

	assert_eq!(answer.parameters.temporal, TemporalOutcome::Unresolved);
	assert!(answer.notices.contains(&Notice::UnresolvedTemporal));
	assert!(!answer.unique_receipts.is_empty());
}

#[tokio::test]
async fn indirect_merchant_is_confirmed_against_the_corpus() {
	let harness = harness(|stage| match stage {
		"merchant" => "Starbucks".to_string(),
		_ => "You spent $10.70 at Starbucks.".to_string(),
	})
	.await;
	let answer = harness
		.service
		.ask("How much did I spend at that coffee place?")
		.await
		.expect("Failed to answer.");

	assert!(matches!(
		&answer.parameters.merchant,
		MerchantOutcome::Resolved { display, source: MerchantSource::Generative, .. } if display == "Starbucks"
	));
	assert_eq!(receipt_ids(&answer), BTreeSet::from(["sb-1220"]));
	assert_eq!(answer.audited_value.as_ref().map(|value| value.display()), Some("$10.70".to_string()));
	assert_eq!(answer.answer_text, "You spent $10.70 at Starbucks.");
	assert_eq!(harness.stages(), vec!["merchant", "answer"]);
}

#[tokio::test]
async fn unknown_merchant_suggestion_is_not_trusted() {
	let harness = harness(|stage| match stage {
		"merchant" => "Blue Bottle".to_string(),
		_ => "Here is what I found.".to_string(),
	})
	.await;
	let answer = harness
		.service
		.ask("What did I get at that coffee place?")
		.await
		.expect("Failed to answer.");

	assert_eq!(
		answer.parameters.merchant,
		MerchantOutcome::Unresolved { mention: "that coffee place".to_string() }
	);
	assert!(
		answer
			.notices
			.contains(&Notice::UnresolvedMerchant { mention: "that coffee place".to_string() })
	);
	assert!((answer.confidence - 0.75).abs() < 1e-6);
}

#[tokio::test]
async fn slow_generator_degrades_without_failing_the_query() {
	let mut cfg = test_config();

	cfg.providers.llm.timeout_ms = 20;

	let harness = harness_with(
		cfg,
		&sample_receipts(),
		|_| r#"{"start": "2023-12-18", "end": "2023-12-24"}"#.to_string(),
		Some(Duration::from_millis(500)),
		None,
	)
	.await;
	let answer = harness
		.service
		.ask("What did I buy the week before Christmas?")
		.await
		.expect("Failed to answer.");
	let timeout = |stage: &str| Notice::CollaboratorTimeout {
		collaborator: "completion".to_string(),
		stage: stage.to_string(),
	};

	assert_eq!(answer.parameters.temporal, TemporalOutcome::Unresolved);
	assert!(answer.notices.contains(&timeout("temporal")));
	assert!(answer.notices.contains(&timeout("answer")));
	assert!(answer.answer_text.starts_with("Found "), "{}", answer.answer_text);
	assert_eq!(harness.stages(), vec!["temporal", "temporal", "answer", "answer"]);
}

#[tokio::test]
async fn slow_embedding_is_a_timeout_error() {
	let mut cfg = test_config();

	cfg.providers.embedding.timeout_ms = 20;

	let harness =
		harness_with(cfg, &sample_receipts(), silent, None, Some(Duration::from_millis(500))).await;
	let err = harness
		.service
		.ask("What did I buy at Home Depot?")
		.await
		.expect_err("Expected a timeout.");

	assert!(matches!(err, Error::CollaboratorTimeout { collaborator } if collaborator == "embedding"));
	assert_eq!(harness.embedding_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn unbalanced_receipts_are_reported_not_corrected() {
	let mut receipts = sample_receipts();

	receipts.push(
		ReceiptBuilder::new("co-1201", "Costco Wholesale", datetime!(2023-12-01 10:00 UTC))
			.item("Paper Towels", 1_999, Category::Other)
			.total(4_000)
			.build(),
	);

	let harness = harness_with(
		test_config(),
		&receipts,
		|_| "Costco came to $40.00.".to_string(),
		None,
		None,
	)
	.await;
	let answer =
		harness.service.ask("How much did I spend at Costco?").await.expect("Failed to answer.");

	assert_eq!(answer.audited_value.as_ref().map(|value| value.display()), Some("$40.00".to_string()));
	assert!(answer.notices.iter().any(|notice| matches!(
		notice,
		Notice::InvariantViolation(violation) if violation.receipt_id == "co-1201"
	)));
	assert_eq!(answer.answer_text, "Costco came to $40.00.");
}

#[tokio::test]
async fn empty_question_is_rejected() {
	let harness = harness(silent).await;
	let err = harness.service.ask("   ").await.expect_err("Expected a rejection.");

	assert!(matches!(err, Error::InvalidRequest { .. }));
	assert_eq!(harness.embedding_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn concurrent_questions_share_one_corpus_snapshot() {
	let harness = harness(silent).await;
	let service = &harness.service;
	let (first, second, rebuilt) = tokio::join!(
		service.ask("What did I buy at Best Buy?"),
		service.ask("What did I buy at CVS?"),
		service.rebuild_corpus()
	);

	assert_eq!(receipt_ids(&first.expect("Failed to answer.")), BTreeSet::from(["bb-1124"]));
	assert_eq!(receipt_ids(&second.expect("Failed to answer.")), BTreeSet::from(["cvs-1205"]));
	assert_eq!(rebuilt.expect("Failed to rebuild corpus.").version(), 2);
	assert_eq!(service.corpus().len(), 9);
}
