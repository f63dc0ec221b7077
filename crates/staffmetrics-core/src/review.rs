use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::{round_tenths, tenths};
use crate::validation::{Validate, ValidationErrors};

/// The four review sub-scores and their derived overall score.
///
/// `overall` is always `round(mean(sub-scores), 1)`: it is computed by the
/// constructor and by every setter, and there is no way to set it directly.
/// Deserialization accepts the sub-scores only; an incoming `overall_score`
/// is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "SubScores")]
pub struct ReviewScores {
    #[serde(rename = "communication_score")]
    communication: Decimal,
    #[serde(rename = "teamwork_score")]
    teamwork: Decimal,
    #[serde(rename = "technical_score")]
    technical: Decimal,
    #[serde(rename = "leadership_score")]
    leadership: Decimal,
    #[serde(rename = "overall_score")]
    overall: Decimal,
}

#[derive(Deserialize)]
struct SubScores {
    communication_score: Decimal,
    teamwork_score: Decimal,
    technical_score: Decimal,
    leadership_score: Decimal,
}

impl From<SubScores> for ReviewScores {
    fn from(raw: SubScores) -> Self {
        ReviewScores::new(
            raw.communication_score,
            raw.teamwork_score,
            raw.technical_score,
            raw.leadership_score,
        )
    }
}

impl ReviewScores {
    pub fn new(
        communication: Decimal,
        teamwork: Decimal,
        technical: Decimal,
        leadership: Decimal,
    ) -> Self {
        let mut scores = Self {
            communication,
            teamwork,
            technical,
            leadership,
            overall: Decimal::ZERO,
        };
        scores.recompute();
        scores
    }

    fn recompute(&mut self) {
        let sum = self.communication + self.teamwork + self.technical + self.leadership;
        self.overall = round_tenths(sum / Decimal::from(4));
    }

    pub fn communication(&self) -> Decimal {
        self.communication
    }

    pub fn teamwork(&self) -> Decimal {
        self.teamwork
    }

    pub fn technical(&self) -> Decimal {
        self.technical
    }

    pub fn leadership(&self) -> Decimal {
        self.leadership
    }

    pub fn overall(&self) -> Decimal {
        self.overall
    }

    pub fn with_communication(mut self, value: Decimal) -> Self {
        self.communication = value;
        self.recompute();
        self
    }

    pub fn with_teamwork(mut self, value: Decimal) -> Self {
        self.teamwork = value;
        self.recompute();
        self
    }

    pub fn with_technical(mut self, value: Decimal) -> Self {
        self.technical = value;
        self.recompute();
        self
    }

    pub fn with_leadership(mut self, value: Decimal) -> Self {
        self.leadership = value;
        self.recompute();
        self
    }

    fn check(&self, errors: &mut ValidationErrors) {
        let (min, max) = (tenths(10), tenths(50));
        errors.tenths_range("communication_score", self.communication, min, max);
        errors.tenths_range("teamwork_score", self.teamwork, min, max);
        errors.tenths_range("technical_score", self.technical, min, max);
        errors.tenths_range("leadership_score", self.leadership, min, max);
    }
}

/// Stored performance review. At most one per employee and review date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceReview {
    pub id: Uuid,
    #[serde(rename = "employee")]
    pub employee_id: Uuid,
    /// Cleared when the reviewing employee is deleted.
    #[serde(rename = "reviewer")]
    pub reviewer_id: Option<Uuid>,
    pub review_date: NaiveDate,
    #[serde(flatten)]
    pub scores: ReviewScores,
    pub comments: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Review fields supplied on insert.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewPerformanceReview {
    #[serde(rename = "employee")]
    pub employee_id: Uuid,
    #[serde(rename = "reviewer", default)]
    pub reviewer_id: Option<Uuid>,
    pub review_date: NaiveDate,
    #[serde(flatten)]
    pub scores: ReviewScores,
    #[serde(default)]
    pub comments: Option<String>,
}

/// Partial update. Sub-score changes recompute the overall score.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ReviewChanges {
    #[serde(rename = "employee")]
    pub employee_id: Option<Uuid>,
    #[serde(rename = "reviewer", default, deserialize_with = "crate::patch::explicit")]
    pub reviewer_id: Option<Option<Uuid>>,
    pub review_date: Option<NaiveDate>,
    pub communication_score: Option<Decimal>,
    pub teamwork_score: Option<Decimal>,
    pub technical_score: Option<Decimal>,
    pub leadership_score: Option<Decimal>,
    #[serde(default, deserialize_with = "crate::patch::explicit")]
    pub comments: Option<Option<String>>,
}

impl NewPerformanceReview {
    /// A full replacement expressed as changes to every field.
    pub fn into_changes(self) -> ReviewChanges {
        ReviewChanges {
            employee_id: Some(self.employee_id),
            reviewer_id: Some(self.reviewer_id),
            review_date: Some(self.review_date),
            communication_score: Some(self.scores.communication()),
            teamwork_score: Some(self.scores.teamwork()),
            technical_score: Some(self.scores.technical()),
            leadership_score: Some(self.scores.leadership()),
            comments: Some(self.comments),
        }
    }
}

impl Validate for NewPerformanceReview {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        self.scores.check(&mut errors);
        if self.reviewer_id == Some(self.employee_id) {
            errors.push("reviewer", "an employee cannot review themselves");
        }
        errors.into_result()
    }
}

impl PerformanceReview {
    pub fn from_new(id: Uuid, new: NewPerformanceReview, now: DateTime<Utc>) -> Self {
        Self {
            id,
            employee_id: new.employee_id,
            reviewer_id: new.reviewer_id,
            review_date: new.review_date,
            scores: new.scores,
            comments: new.comments,
            created_at: now,
        }
    }

    /// Apply a partial update and re-validate.
    ///
    /// On failure the record is left untouched.
    pub fn apply(&mut self, changes: ReviewChanges) -> Result<(), ValidationErrors> {
        let mut scores = self.scores;
        if let Some(value) = changes.communication_score {
            scores = scores.with_communication(value);
        }
        if let Some(value) = changes.teamwork_score {
            scores = scores.with_teamwork(value);
        }
        if let Some(value) = changes.technical_score {
            scores = scores.with_technical(value);
        }
        if let Some(value) = changes.leadership_score {
            scores = scores.with_leadership(value);
        }

        let fields = NewPerformanceReview {
            employee_id: changes.employee_id.unwrap_or(self.employee_id),
            reviewer_id: changes.reviewer_id.unwrap_or(self.reviewer_id),
            review_date: changes.review_date.unwrap_or(self.review_date),
            scores,
            comments: changes.comments.unwrap_or_else(|| self.comments.clone()),
        };
        fields.validate()?;

        self.employee_id = fields.employee_id;
        self.reviewer_id = fields.reviewer_id;
        self.review_date = fields.review_date;
        self.scores = fields.scores;
        self.comments = fields.comments;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(c: i64, t: i64, te: i64, l: i64) -> ReviewScores {
        ReviewScores::new(tenths(c), tenths(t), tenths(te), tenths(l))
    }

    #[test]
    fn overall_is_rounded_mean() {
        assert_eq!(scores(40, 30, 50, 20).overall(), tenths(35));
        // 10.5 / 4 = 2.625
        assert_eq!(scores(25, 25, 25, 30).overall(), tenths(26));
        // 10.2 / 4 = 2.55
        assert_eq!(scores(25, 25, 25, 27).overall(), tenths(26));
    }

    #[test]
    fn setters_recompute_overall() {
        let base = scores(10, 10, 10, 10);
        assert_eq!(base.overall(), tenths(10));
        let raised = base.with_leadership(tenths(50));
        assert_eq!(raised.overall(), tenths(20));
    }

    #[test]
    fn incoming_overall_score_is_ignored() {
        let json = serde_json::json!({
            "employee": Uuid::new_v4(),
            "review_date": "2024-02-01",
            "communication_score": 4.0,
            "teamwork_score": 4.0,
            "technical_score": 4.0,
            "leadership_score": 2.0,
            "overall_score": 5.0,
        });
        let review: NewPerformanceReview = serde_json::from_value(json).expect("parse");
        assert_eq!(review.scores.overall(), tenths(35));
        assert_eq!(review.reviewer_id, None);
    }

    #[test]
    fn serializes_flat_score_fields() {
        let new = NewPerformanceReview {
            employee_id: Uuid::new_v4(),
            reviewer_id: None,
            review_date: NaiveDate::from_ymd_opt(2024, 2, 1).expect("date"),
            scores: scores(40, 30, 50, 20),
            comments: None,
        };
        let review = PerformanceReview::from_new(Uuid::new_v4(), new, Utc::now());
        let value = serde_json::to_value(&review).expect("serialize");
        assert_eq!(value["overall_score"], serde_json::json!(3.5));
        assert_eq!(value["communication_score"], serde_json::json!(4.0));
        assert!(value.get("scores").is_none());
    }

    #[test]
    fn patching_a_sub_score_moves_overall() {
        let new = NewPerformanceReview {
            employee_id: Uuid::new_v4(),
            reviewer_id: None,
            review_date: NaiveDate::from_ymd_opt(2024, 2, 1).expect("date"),
            scores: scores(30, 30, 30, 30),
            comments: Some("solid".to_string()),
        };
        let mut review = PerformanceReview::from_new(Uuid::new_v4(), new, Utc::now());

        review
            .apply(ReviewChanges {
                technical_score: Some(tenths(50)),
                ..ReviewChanges::default()
            })
            .expect("apply");
        assert_eq!(review.scores.overall(), tenths(35));
        assert_eq!(review.comments.as_deref(), Some("solid"));
    }

    #[test]
    fn self_review_and_out_of_range_scores_rejected() {
        let employee = Uuid::new_v4();
        let new = NewPerformanceReview {
            employee_id: employee,
            reviewer_id: Some(employee),
            review_date: NaiveDate::from_ymd_opt(2024, 2, 1).expect("date"),
            scores: scores(60, 30, 30, 5),
            comments: None,
        };
        let errors = new.validate().expect_err("invalid");
        assert!(errors.has_field("reviewer"));
        assert!(errors.has_field("communication_score"));
        assert!(errors.has_field("leadership_score"));
        assert!(!errors.has_field("teamwork_score"));
    }
}
