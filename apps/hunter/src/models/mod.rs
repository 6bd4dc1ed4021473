pub mod listing;
pub mod package;
pub mod result;

pub use listing::{ListingRecord, RankedListingRecord, RankedListings, MAX_MATCH_SCORE};
pub use package::{ColdEmail, PriorityLevels, SkillGapAnalysis, TailoredPackage};
pub use result::PipelineResult;
