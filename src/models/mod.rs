pub mod following;
pub mod lenient;
pub mod profile;
pub mod research;

pub use following::{
    extract_following_entries, merge_following, partition_batches, AnalysisBatch,
    FollowingEntry, SocialNetwork,
};
pub use profile::{EnrichmentProfile, PersonContext, UNKNOWN};
pub use research::{JobHandle, JobKind, JobResult, ResearchInput, ResearchResult, ResearchSlot};
