pub mod audit;
pub mod chunk;
pub mod confidence;
pub mod filter;
pub mod lexicon;
pub mod merchant;
pub mod money;
pub mod normalize;
pub mod query;
pub mod receipt;
pub mod results;
pub mod temporal;
pub mod time_serde;

pub use audit::{AuditedValue, audit};
pub use chunk::{ChunkFlags, ChunkMeta, ChunkView, ItemRef, ScoredChunk};
pub use confidence::{Notice, confidence};
pub use filter::{AmountField, ChunkFilter, ClauseKind, FilterClause};
pub use merchant::{MerchantCorpus, MerchantEntry, MerchantMatch, MerchantOutcome, MerchantSource};
pub use query::{
	AggregationBasis, AggregationOp, AmountBound, AmountOp, CategoryFilter, Feature, Intent,
	QueryParameters, QuerySignals,
};
pub use receipt::{Category, InvariantViolation, LineItem, PaymentMethod, Receipt, Totals};
pub use results::{ItemHit, ReceiptHit, ResultSet};
pub use temporal::{DateRange, RuleResolution, TemporalOutcome, TemporalStrategy};
