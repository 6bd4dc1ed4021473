use serde::{Deserialize, Serialize};

/// Missing skills bucketed by priority. Exactly these three buckets; any
/// other key makes the package invalid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PriorityLevels {
    pub high: Vec<String>,
    pub medium: Vec<String>,
    pub low: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillGapAnalysis {
    pub missing_skills: Vec<String>,
    pub priority_levels: PriorityLevels,
    pub learning_recommendations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColdEmail {
    pub subject: String,
    pub body: String,
}

/// Application package produced by the tailoring stage for a single listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TailoredPackage {
    pub skill_gap_analysis: SkillGapAnalysis,
    pub cold_email: ColdEmail,
    pub tailored_summary: String,
    pub skill_emphasis_suggestions: Vec<String>,
}
