use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Classification outcome of a single uploaded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Label {
    Cancer,
    #[serde(rename = "Non-cancer")]
    NonCancer,
}

impl Label {
    /// Threshold the model's scalar output. The boundary score 0.5 counts
    /// as Non-cancer.
    pub fn from_score(score: f32) -> Self {
        if score > 0.5 {
            Label::Cancer
        } else {
            Label::NonCancer
        }
    }

    /// Follow-up text shown to the user, fixed per label.
    pub fn suggestion(self) -> &'static str {
        match self {
            Label::Cancer => "Segera periksa ke dokter!",
            Label::NonCancer => "Penyakit kanker tidak terdeteksi.",
        }
    }
}

/// One persisted prediction. Created once, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub id: String,
    pub result: Label,
    pub suggestion: String,
    #[serde(rename = "createdAt")]
    pub created_at: String,
}

impl PredictionRecord {
    /// Build a record for a label. `suggestion` is derived here and nowhere
    /// else, so it cannot disagree with `result`.
    pub fn new(result: Label) -> Self {
        PredictionRecord {
            id: Uuid::new_v4().to_string(),
            result,
            suggestion: result.suggestion().to_owned(),
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_is_strictly_above_half() {
        assert_eq!(Label::from_score(0.51), Label::Cancer);
        assert_eq!(Label::from_score(1.0), Label::Cancer);
        assert_eq!(Label::from_score(0.5), Label::NonCancer);
        assert_eq!(Label::from_score(0.49), Label::NonCancer);
        assert_eq!(Label::from_score(0.0), Label::NonCancer);
    }

    #[test]
    fn suggestion_follows_label() {
        assert_eq!(Label::Cancer.suggestion(), "Segera periksa ke dokter!");
        assert_eq!(
            Label::NonCancer.suggestion(),
            "Penyakit kanker tidak terdeteksi."
        );
    }

    #[test]
    fn record_is_consistent_with_its_label() {
        let record = PredictionRecord::new(Label::Cancer);
        assert_eq!(record.result, Label::Cancer);
        assert_eq!(record.suggestion, Label::Cancer.suggestion());
        assert!(!record.id.is_empty());
    }

    #[test]
    fn record_serializes_with_api_field_names() {
        let record = PredictionRecord::new(Label::NonCancer);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["result"], "Non-cancer");
        assert_eq!(json["suggestion"], "Penyakit kanker tidak terdeteksi.");
        assert!(json.get("createdAt").is_some());
        assert!(json.get("created_at").is_none());
    }

    #[test]
    fn fresh_ids_are_unique() {
        let a = PredictionRecord::new(Label::Cancer);
        let b = PredictionRecord::new(Label::Cancer);
        assert_ne!(a.id, b.id);
    }
}
