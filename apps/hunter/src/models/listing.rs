use serde::{Deserialize, Serialize};

/// Upper bound of `match_score`; anything above it is an invalid ranking record.
pub const MAX_MATCH_SCORE: u8 = 100;

/// One discovered posting, as produced by the scouting stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingRecord {
    pub title: String,
    pub company: String,
    pub description: String,
    pub source_url: String,
}

/// A listing annotated by the ranking stage. Serializes flat: the listing
/// fields sit next to `match_score` and `reason`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedListingRecord {
    #[serde(flatten)]
    pub listing: ListingRecord,
    pub match_score: u8,
    pub reason: String,
}

/// Ranked records ordered by `match_score`, highest first.
///
/// The only way to build one is `from_unordered`, which re-sorts locally.
/// The sort is stable, so equal scores keep the order the judgment returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedListings(Vec<RankedListingRecord>);

impl RankedListings {
    pub fn from_unordered(mut records: Vec<RankedListingRecord>) -> Self {
        records.sort_by(|a, b| b.match_score.cmp(&a.match_score));
        Self(records)
    }

    /// True when scores never increase from one record to the next.
    pub fn is_non_increasing(records: &[RankedListingRecord]) -> bool {
        records
            .windows(2)
            .all(|pair| pair[0].match_score >= pair[1].match_score)
    }

    pub fn as_slice(&self) -> &[RankedListingRecord] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<RankedListingRecord> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranked(title: &str, score: u8) -> RankedListingRecord {
        RankedListingRecord {
            listing: ListingRecord {
                title: title.to_string(),
                company: "Acme".to_string(),
                description: "Build things".to_string(),
                source_url: format!("https://jobs.example/{title}"),
            },
            match_score: score,
            reason: "fits".to_string(),
        }
    }

    #[test]
    fn test_from_unordered_sorts_descending() {
        let ranked = RankedListings::from_unordered(vec![
            ranked("a", 60),
            ranked("b", 95),
            ranked("c", 80),
        ]);
        let scores: Vec<u8> = ranked.as_slice().iter().map(|r| r.match_score).collect();
        assert_eq!(scores, vec![95, 80, 60]);
        assert!(RankedListings::is_non_increasing(ranked.as_slice()));
    }

    #[test]
    fn test_from_unordered_keeps_input_order_for_ties() {
        let ranked = RankedListings::from_unordered(vec![
            ranked("first", 70),
            ranked("top", 90),
            ranked("second", 70),
        ]);
        let titles: Vec<&str> = ranked
            .as_slice()
            .iter()
            .map(|r| r.listing.title.as_str())
            .collect();
        assert_eq!(titles, vec!["top", "first", "second"]);
    }

    #[test]
    fn test_is_non_increasing_detects_unsorted() {
        assert!(!RankedListings::is_non_increasing(&[ranked("a", 10), ranked("b", 20)]));
        assert!(RankedListings::is_non_increasing(&[]));
    }

    #[test]
    fn test_ranked_record_deserializes_flat_json() {
        let json = r#"{
            "title": "ML Intern",
            "company": "Example AI",
            "description": "PyTorch",
            "source_url": "https://example.com/1",
            "match_score": 88,
            "reason": "Strong PyTorch background"
        }"#;
        let record: RankedListingRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.listing.company, "Example AI");
        assert_eq!(record.match_score, 88);

        let back = serde_json::to_value(&record).unwrap();
        assert_eq!(back["title"], "ML Intern");
        assert_eq!(back["match_score"], 88);
    }

    #[test]
    fn test_ranked_record_requires_score() {
        let json = r#"{
            "title": "ML Intern",
            "company": "Example AI",
            "description": "PyTorch",
            "source_url": "https://example.com/1",
            "reason": "no score given"
        }"#;
        assert!(serde_json::from_str::<RankedListingRecord>(json).is_err());
    }

    #[test]
    fn test_listing_rejects_non_string_field() {
        let json = r#"{"title": 7, "company": "Y", "description": "Z", "source_url": "u"}"#;
        assert!(serde_json::from_str::<ListingRecord>(json).is_err());
    }
}
