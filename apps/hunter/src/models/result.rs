use serde::{Deserialize, Serialize};

use super::listing::RankedListingRecord;
use super::package::TailoredPackage;

/// Terminal artifact of one pipeline run. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineResult {
    pub best_match: RankedListingRecord,
    pub tailored_package: TailoredPackage,
    /// Up to two runners-up, highest score first. Never tailored.
    pub alternatives: Vec<RankedListingRecord>,
}
