use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::error::ClassifyError;
use super::labels::{
    ChurnRiskLabel, EmotionLabel, IssueType, JourneyStage, ResolutionStatus, ReviewMention,
    ReviewTone, SentimentLabel, ValueForMoney,
};
use super::schema::validate_structure;

/// Half-width of the score band that counts as neutral.
pub const NEUTRAL_BAND: f64 = 0.39;

/// Validated classification of a single review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReviewInsights {
    pub sentiment_label: SentimentLabel,
    pub sentiment_score: f64,
    pub primary_emotion: EmotionLabel,
    pub primary_mention: ReviewMention,
    pub journey_stage: JourneyStage,
    pub primary_issue_type: IssueType,
    pub resolution_status: ResolutionStatus,
    pub review_tone: ReviewTone,
    pub value_for_money: ValueForMoney,
    pub churn_risk: ChurnRiskLabel,
    pub summary: String,
}

impl ReviewInsights {
    /// Semantic checks that the JSON Schema cannot express.
    pub fn check(&self) -> Result<(), ClassifyError> {
        let score = self.sentiment_score;
        if !score.is_finite() || !(-1.0..=1.0).contains(&score) {
            return Err(ClassifyError::Inconsistent(format!(
                "sentiment_score {} outside [-1, 1]",
                score
            )));
        }

        let aligned = match self.sentiment_label {
            SentimentLabel::Negative => score < 0.0,
            SentimentLabel::Neutral => score.abs() <= NEUTRAL_BAND,
            SentimentLabel::Positive => score > 0.0,
        };
        if !aligned {
            return Err(ClassifyError::Inconsistent(format!(
                "sentiment_score {} disagrees with label {}",
                score, self.sentiment_label
            )));
        }

        if self.summary.trim().is_empty() {
            return Err(ClassifyError::Inconsistent("summary is blank".into()));
        }
        Ok(())
    }

    /// Apply the fixed cross-field rules. Returns true if anything changed.
    ///
    /// Delivery problems are always reported as topic `delivery_service`,
    /// whatever topic the model picked.
    pub fn reconcile(&mut self) -> bool {
        if self.primary_issue_type == IssueType::DeliveryLogisticsIssue
            && self.primary_mention != ReviewMention::DeliveryService
        {
            debug!(
                from = %self.primary_mention,
                "delivery issue forces primary_mention=delivery_service"
            );
            self.primary_mention = ReviewMention::DeliveryService;
            return true;
        }
        false
    }

    /// Full validation of a decoded JSON value: structure, typed decode,
    /// cross-field repair, then semantic checks. All or nothing.
    pub fn from_value(value: Value) -> Result<Self, ClassifyError> {
        validate_structure(&value)?;
        let mut insights: ReviewInsights = serde_json::from_value(value)?;
        insights.reconcile();
        insights.summary = insights.summary.trim().to_string();
        insights.check()?;
        Ok(insights)
    }

    /// Validate raw model text. Tolerates code fences and chatter around a
    /// single JSON object, nothing else.
    pub fn from_model_output(content: &str) -> Result<Self, ClassifyError> {
        let object = extract_json_object(content)?;
        let value: Value = serde_json::from_str(object)
            .map_err(|e| ClassifyError::Malformed(e.to_string()))?;
        Self::from_value(value)
    }
}

/// Slice out the outermost `{ ... }` of a model response.
fn extract_json_object(content: &str) -> Result<&str, ClassifyError> {
    let trimmed = content.trim();
    let body = trimmed
        .strip_prefix("```")
        .map(|rest| rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric()))
        .unwrap_or(trimmed)
        .trim_start();
    if body.starts_with('[') {
        return Err(ClassifyError::Malformed(format!(
            "expected one JSON object, got a list: {}",
            preview(body, 80)
        )));
    }
    let start = trimmed.find('{');
    let end = trimmed.rfind('}');
    match (start, end) {
        (Some(s), Some(e)) if s < e => Ok(&trimmed[s..=e]),
        _ => Err(ClassifyError::Malformed(preview(trimmed, 80))),
    }
}

fn preview(s: &str, n: usize) -> String {
    s.chars().take(n).collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;

    pub(crate) fn refund_scam_json() -> Value {
        json!({
            "sentiment_label": "negative",
            "sentiment_score": -0.9,
            "primary_emotion": "betrayal",
            "primary_mention": "refund",
            "journey_stage": "post_exit_refund",
            "primary_issue_type": "cancellation_refund_issue",
            "resolution_status": "unresolved",
            "review_tone": "complaint",
            "value_for_money": "not_applicable",
            "churn_risk": "high",
            "summary": "Ex-customer cancelled months ago, still has no refund and calls it a scam.",
        })
    }

    pub(crate) fn app_crash_json() -> Value {
        json!({
            "sentiment_label": "positive",
            "sentiment_score": 0.3,
            "primary_emotion": "frustration",
            "primary_mention": "app_website_experience",
            "journey_stage": "payment_billing",
            "primary_issue_type": "app_website_issue",
            "resolution_status": "unresolved",
            "review_tone": "mixed",
            "value_for_money": "not_applicable",
            "churn_risk": "low",
            "summary": "Customer likes the brand but the app crashes on every top-up.",
        })
    }

    #[test]
    fn accepts_refund_example() {
        let insights = ReviewInsights::from_value(refund_scam_json()).unwrap();
        assert_eq!(insights.sentiment_label, SentimentLabel::Negative);
        assert!(insights.sentiment_score < -0.4);
        assert_eq!(insights.journey_stage, JourneyStage::PostExitRefund);
        assert_eq!(insights.churn_risk, ChurnRiskLabel::High);
    }

    #[test]
    fn accepts_fenced_output() {
        let text = format!("```json\n{}\n```", app_crash_json());
        let insights = ReviewInsights::from_model_output(&text).unwrap();
        assert_eq!(insights.primary_issue_type, IssueType::AppWebsiteIssue);
    }

    #[test]
    fn rejects_non_json() {
        let err = ReviewInsights::from_model_output("I cannot classify this.").unwrap_err();
        assert_eq!(err.kind(), "malformed");
        let err = ReviewInsights::from_model_output("{ not json }").unwrap_err();
        assert_eq!(err.kind(), "malformed");
    }

    #[test]
    fn rejects_a_list_of_objects() {
        let bare = format!("[{}]", app_crash_json());
        let err = ReviewInsights::from_model_output(&bare).unwrap_err();
        assert_eq!(err.kind(), "malformed");

        let fenced = format!("```json\n [{}]\n```", app_crash_json());
        let err = ReviewInsights::from_model_output(&fenced).unwrap_err();
        assert_eq!(err.kind(), "malformed");
    }

    #[test]
    fn label_and_score_must_agree() {
        let cases = [
            ("negative", 0.2, false),
            ("negative", 0.0, false),
            ("negative", -0.1, true),
            ("positive", -0.5, false),
            ("positive", 0.0, false),
            ("positive", 0.95, true),
            ("neutral", 0.39, true),
            ("neutral", -0.39, true),
            ("neutral", 0.0, true),
            ("neutral", 0.5, false),
            ("neutral", -0.41, false),
        ];
        for (label, score, ok) in cases {
            let mut v = refund_scam_json();
            v["sentiment_label"] = json!(label);
            v["sentiment_score"] = json!(score);
            let res = ReviewInsights::from_value(v);
            assert_eq!(res.is_ok(), ok, "{label} / {score}: {res:?}");
        }
    }

    #[test]
    fn delivery_issue_forces_delivery_mention() {
        let mut v = refund_scam_json();
        v["primary_issue_type"] = json!("delivery_logistics_issue");
        v["primary_mention"] = json!("sim_activation_porting");
        let insights = ReviewInsights::from_value(v).unwrap();
        assert_eq!(insights.primary_mention, ReviewMention::DeliveryService);
        assert_eq!(
            insights.primary_issue_type,
            IssueType::DeliveryLogisticsIssue
        );
    }

    #[test]
    fn reconcile_leaves_other_rows_alone() {
        let mut insights = ReviewInsights::from_value(app_crash_json()).unwrap();
        assert!(!insights.reconcile());
        assert_eq!(
            insights.primary_mention,
            ReviewMention::AppWebsiteExperience
        );
    }

    #[test]
    fn blank_summary_is_rejected() {
        let mut v = app_crash_json();
        v["summary"] = json!("   ");
        let err = ReviewInsights::from_value(v).unwrap_err();
        assert_eq!(err.kind(), "inconsistent");
    }

    #[test]
    fn one_bad_field_rejects_the_whole_object() {
        let mut v = app_crash_json();
        v["value_for_money"] = json!("cheap");
        assert!(ReviewInsights::from_value(v).is_err());
    }
}
