//! Service modules for the Hooktheory harvest workflow

pub mod chord_stats;
pub mod harvester;
pub mod hooktheory_client;
pub mod page_fetch;
pub mod progressions;

pub use harvester::{
    HarvestReport, HarvestSettings, Harvester, ProgressionHarvest, Sleeper, TokioSleeper,
};
pub use hooktheory_client::{HooktheoryClient, HooktheoryError, QuotaHint, RawPage, SongSource};
pub use page_fetch::{BackoffPolicy, PageContent, PageOutcome, PageResponse, PageState, StopReason};
pub use progressions::Progressions;
