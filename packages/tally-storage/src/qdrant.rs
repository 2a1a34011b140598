use std::collections::BTreeSet;

use qdrant_client::qdrant::{
	Condition, DatetimeRange, Filter, PointId, Query, QueryPointsBuilder, Range,
	ScrollPointsBuilder, Timestamp,
};
use rust_decimal::prelude::ToPrimitive;
use time::OffsetDateTime;

use tally_domain::{AmountField, AmountOp, ChunkFilter, Feature, FilterClause, ScoredChunk};

use crate::{
	BoxFuture, ChunkIndex, Result,
	payload::{
		self, CATEGORIES, CONTENT, ITEM_PRICE_VALUE, MERCHANT_NORMALIZED, PAYMENT_METHOD,
		TOTAL_VALUE, TRANSACTION_TS, VIEW,
	},
};

pub const DENSE_VECTOR_NAME: &str = "dense";

const SCROLL_PAGE: u32 = 256;

pub struct QdrantStore {
	pub client: qdrant_client::Qdrant,
	pub collection: String,
	pub vector_dim: u32,
}
impl QdrantStore {
	pub fn new(cfg: &tally_config::Qdrant) -> Result<Self> {
		let client = qdrant_client::Qdrant::from_url(&cfg.url).build()?;

		Ok(Self { client, collection: cfg.collection.clone(), vector_dim: cfg.vector_dim })
	}

	async fn run_search(
		&self,
		vector: &[f32],
		filter: &ChunkFilter,
		limit: u32,
	) -> Result<Vec<ScoredChunk>> {
		let mut search = QueryPointsBuilder::new(self.collection.clone())
			.query(Query::new_nearest(vector.to_vec()))
			.using(DENSE_VECTOR_NAME)
			.with_payload(true)
			.limit(limit as u64);

		if let Some(prefilter) = to_qdrant_filter(filter) {
			search = search.filter(prefilter);
		}

		let response = self.client.query(search).await?;
		let mut out = Vec::with_capacity(response.result.len());

		for point in response.result {
			let chunk = match payload::decode(&point.payload) {
				Ok(chunk) => chunk,
				Err(err) => {
					tracing::warn!(error = %err, "Skipping chunk with undecodable payload.");

					continue;
				},
			};

			// The index compares float mirrors; decimal bounds are rechecked here.
			if filter.matches(&chunk) {
				out.push(ScoredChunk { score: point.score, chunk });
			}
		}

		Ok(out)
	}

	async fn run_list_distinct(&self, field: &str) -> Result<Vec<String>> {
		let mut values = BTreeSet::new();
		let mut offset: Option<PointId> = None;

		loop {
			let mut scroll = ScrollPointsBuilder::new(self.collection.clone())
				.limit(SCROLL_PAGE)
				.with_payload(true)
				.with_vectors(false);

			if let Some(offset) = offset.take() {
				scroll = scroll.offset(offset);
			}

			let response = self.client.scroll(scroll).await?;

			for point in &response.result {
				if let Some(value) = payload::payload_str(&point.payload, field) {
					values.insert(value.to_string());
				}
			}

			match response.next_page_offset {
				Some(next) => offset = Some(next),
				None => break,
			}
		}

		Ok(values.into_iter().collect())
	}
}

impl ChunkIndex for QdrantStore {
	fn search<'a>(
		&'a self,
		vector: &'a [f32],
		filter: &'a ChunkFilter,
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<ScoredChunk>>> {
		Box::pin(self.run_search(vector, filter, limit))
	}

	fn list_distinct<'a>(&'a self, field: &'a str) -> BoxFuture<'a, Result<Vec<String>>> {
		Box::pin(self.run_list_distinct(field))
	}
}

/// Index-side prefilter. Never stricter than [`ChunkFilter::matches`].
pub fn to_qdrant_filter(filter: &ChunkFilter) -> Option<Filter> {
	if filter.is_empty() {
		return None;
	}

	let mut must = filter
		.clauses
		.iter()
		.map(|clause| match clause {
			FilterClause::Merchant { normalized } =>
				Condition::matches(MERCHANT_NORMALIZED, normalized.clone()),
			FilterClause::DateRange { range } => Condition::datetime_range(
				TRANSACTION_TS,
				DatetimeRange {
					lt: None,
					gt: None,
					gte: Some(timestamp(range.start)),
					lte: Some(timestamp(range.end)),
				},
			),
			FilterClause::Category { categories, keywords } => {
				let mut should = Vec::with_capacity(keywords.len() + 1);

				if !categories.is_empty() {
					let labels: Vec<String> =
						categories.iter().map(|category| category.as_str().to_string()).collect();

					should.push(Condition::matches(CATEGORIES, labels));
				}

				for keyword in keywords {
					should.push(Condition::matches_text(CONTENT, keyword.clone()));
				}

				Condition::from(Filter::should(should))
			},
			FilterClause::Amount { field, bounds } => {
				let key = match field {
					AmountField::ReceiptTotal => TOTAL_VALUE,
					AmountField::ItemPrice => ITEM_PRICE_VALUE,
				};
				let mut range = Range::default();

				for bound in bounds {
					let value = bound.value.to_f64();

					match bound.op {
						AmountOp::Lt => range.lt = value,
						AmountOp::Lte => range.lte = value,
						AmountOp::Gt => range.gt = value,
						AmountOp::Gte => range.gte = value,
					}
				}

				Condition::range(key, range)
			},
			FilterClause::Payment { method } =>
				Condition::matches(PAYMENT_METHOD, method.as_str().to_string()),
			FilterClause::Feature { feature } => Condition::matches(
				match feature {
					Feature::Warranty => payload::FLAG_HAS_WARRANTY,
					Feature::Tip => payload::FLAG_HAS_TIP,
					Feature::Discount => payload::FLAG_HAS_DISCOUNT,
					Feature::Loyalty => payload::FLAG_HAS_LOYALTY,
				},
				true,
			),
		})
		.collect::<Vec<_>>();

	if let Some(views) = filter.views() {
		let labels: Vec<String> = views.iter().map(|view| view.as_str().to_string()).collect();

		must.push(Condition::matches(VIEW, labels));
	}

	Some(Filter::must(must))
}

fn timestamp(ts: OffsetDateTime) -> Timestamp {
	Timestamp { seconds: ts.unix_timestamp(), nanos: ts.nanosecond() as i32 }
}
