//! Local context log: phrase extraction, bounded stores, retention, search
//! and digests for development sessions.

pub mod clock;
pub mod compose;
pub mod engine;
pub mod error;
pub mod extract;
pub mod operations;
pub mod record;
pub mod retention;
pub mod search;
pub mod store;
pub mod text;

/// Time sources.
pub use clock::{Clock, ManualClock, SystemClock};
/// Digest rendering and statistics.
pub use compose::{Composer, ContextStats, TaskFocus};
/// Engine and operation receipts.
pub use engine::{ContextEngine, EventReceipt, LevelsReceipt, SessionReceipt};
/// Context error type.
pub use error::ContextError;
/// Phrase extraction.
pub use extract::{MarkerSet, MarkerTable, PhraseExtractor};
/// String-returning operations.
pub use operations::ContextOperations;
/// Record model.
pub use record::{
    DecisionRecord, EventRecord, ExtractedPhrase, PhraseCategory, Record, SessionRecord, Stamp,
    StoreKind, StoredRecord, SummaryRecord,
};
/// Retention sweeps.
pub use retention::{Removal, RetentionReport, RetentionTarget};
/// Search types.
pub use search::{Query, Scope, SearchHit, SearchWeights};
/// Bounded store.
pub use store::{AppendOutcome, BoundedStore, StoreWarning};
