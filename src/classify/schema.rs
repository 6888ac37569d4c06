//! JSON Schema for the classification object.
//!
//! The same document is sent to the provider as the structured-output
//! contract and used to check what comes back, before typed decoding.

use jsonschema::{Draft, JSONSchema};
use once_cell::sync::Lazy;
use serde_json::{json, Map, Value};

use super::error::ClassifyError;
use super::labels::{
    ChurnRiskLabel, EmotionLabel, IssueType, JourneyStage, ResolutionStatus, ReviewMention,
    ReviewTone, SentimentLabel, ValueForMoney, Vocabulary,
};

/// Name the schema is registered under in the provider request.
pub const SCHEMA_NAME: &str = "review_insights";

/// Property names, in the order the model is asked to fill them.
pub const FIELD_NAMES: [&str; 11] = [
    "sentiment_label",
    "sentiment_score",
    "primary_emotion",
    "primary_mention",
    "journey_stage",
    "primary_issue_type",
    "resolution_status",
    "review_tone",
    "value_for_money",
    "churn_risk",
    "summary",
];

fn enum_property<V: Vocabulary>() -> Value {
    json!({
        "type": "string",
        "enum": V::wire_values(),
        "description": format!(
            "Exactly one {} value; use \"{}\" when nothing can be inferred",
            V::NAME,
            V::safe_default().as_str()
        ),
    })
}

/// The response schema, built once from the closed vocabularies.
pub static RESPONSE_SCHEMA: Lazy<Value> = Lazy::new(|| {
    let mut properties = Map::new();
    properties.insert("sentiment_label".into(), enum_property::<SentimentLabel>());
    properties.insert(
        "sentiment_score".into(),
        json!({
            "type": "number",
            "minimum": -1.0,
            "maximum": 1.0,
            "description": "Direction and intensity, negative below zero, positive above",
        }),
    );
    properties.insert("primary_emotion".into(), enum_property::<EmotionLabel>());
    properties.insert("primary_mention".into(), enum_property::<ReviewMention>());
    properties.insert("journey_stage".into(), enum_property::<JourneyStage>());
    properties.insert("primary_issue_type".into(), enum_property::<IssueType>());
    properties.insert(
        "resolution_status".into(),
        enum_property::<ResolutionStatus>(),
    );
    properties.insert("review_tone".into(), enum_property::<ReviewTone>());
    properties.insert("value_for_money".into(), enum_property::<ValueForMoney>());
    properties.insert("churn_risk".into(), enum_property::<ChurnRiskLabel>());
    properties.insert(
        "summary".into(),
        json!({
            "type": "string",
            "minLength": 1,
            "description": "One plain-English sentence describing the review",
        }),
    );

    json!({
        "type": "object",
        "properties": Value::Object(properties),
        "required": FIELD_NAMES,
        "additionalProperties": false,
    })
});

static COMPILED: Lazy<JSONSchema> = Lazy::new(|| {
    JSONSchema::options()
        .with_draft(Draft::Draft7)
        .compile(&RESPONSE_SCHEMA)
        .expect("response schema is a constant and must compile")
});

/// Check `instance` against [`RESPONSE_SCHEMA`], collecting every violation.
pub fn validate_structure(instance: &Value) -> Result<(), ClassifyError> {
    match COMPILED.validate(instance) {
        Ok(()) => Ok(()),
        Err(errors) => {
            let messages: Vec<String> = errors
                .map(|e| {
                    let path = e.instance_path.to_string();
                    if path.is_empty() {
                        e.to_string()
                    } else {
                        format!("{} at {}", e, path)
                    }
                })
                .collect();
            Err(ClassifyError::Schema(messages))
        }
    }
}
