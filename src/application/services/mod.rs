pub mod collection_store;
pub mod debounce;
pub mod mutation_coordinator;
pub mod noteworthy;
pub mod selection;
pub mod sequencing;
pub mod stats_aggregator;

pub use collection_store::{PaginatedCollectionStore, PaginatedView};
pub use debounce::{Debouncer, SettleFn};
pub use mutation_coordinator::{MutationCoordinator, SyncTarget};
pub use noteworthy::{NoteworthyList, PRESET_STATUS_CODES};
pub use selection::{SelectAllScope, SelectionTracker};
pub use sequencing::{Completion, FetchOutcome, RequestSequence, Ticket};
pub use stats_aggregator::{StatsAggregator, TrendState};
