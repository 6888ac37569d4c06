use crate::classify::{ReviewInsights, Vocabulary};
use crate::table::Table;

/// One message to classify, with the metadata carried through untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReviewRecord {
    /// Zero-based row in the country's combined source table.
    pub row_index: usize,
    pub message: String,
    pub country: String,
    pub platform: Option<String>,
    pub title: Option<String>,
    pub link: Option<String>,
    pub created_date: Option<String>,
    pub language: Option<String>,
    pub username: Option<String>,
    pub gender: Option<String>,
    pub user_rating: Option<String>,
}

impl ReviewRecord {
    /// Read row `row` of `table`, accepting normalized or raw export column
    /// names. Returns the record even when the message is blank.
    pub fn from_row(table: &Table, row: usize, country: &str) -> Self {
        let get = |names: &[&str]| table.first_value(row, names).map(str::to_string);
        Self {
            row_index: row,
            message: get(&["message", "Message"]).unwrap_or_default(),
            country: get(&["country", "Country"]).unwrap_or_else(|| country.to_string()),
            platform: get(&["platform", "Media Type"]),
            title: get(&["title", "Title"]),
            link: get(&["link", "Link"]),
            created_date: get(&["created_date", "Publish Date"]),
            language: get(&["language", "Language"]),
            username: get(&["username", "User Name"]),
            gender: get(&["gender", "Gender"]),
            user_rating: get(&["user_rating", "Star Rating"]),
        }
    }
}

/// Output columns of a classified table, in order.
pub const ENRICHED_COLUMNS: [&str; 21] = [
    "country",
    "platform",
    "title",
    "message",
    "link",
    "created_date",
    "language",
    "username",
    "gender",
    "user_rating",
    "sentiment",
    "sentiment_score",
    "emotion",
    "primary_mention",
    "journey_stage",
    "issue_type",
    "resolution_status",
    "review_tone",
    "value_for_money",
    "churn_risk",
    "summary",
];

/// Columns written as Float64 in Parquet output.
pub const FLOAT_COLUMNS: [&str; 1] = ["sentiment_score"];

/// A record together with its validated classification.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedRecord {
    pub record: ReviewRecord,
    pub insights: ReviewInsights,
}

impl EnrichedRecord {
    pub fn to_row(&self) -> Vec<String> {
        let r = &self.record;
        let i = &self.insights;
        let opt = |v: &Option<String>| v.clone().unwrap_or_default();
        vec![
            r.country.clone(),
            opt(&r.platform),
            opt(&r.title),
            r.message.clone(),
            opt(&r.link),
            opt(&r.created_date),
            opt(&r.language),
            opt(&r.username),
            opt(&r.gender),
            opt(&r.user_rating),
            i.sentiment_label.as_str().to_string(),
            i.sentiment_score.to_string(),
            i.primary_emotion.as_str().to_string(),
            i.primary_mention.as_str().to_string(),
            i.journey_stage.as_str().to_string(),
            i.primary_issue_type.as_str().to_string(),
            i.resolution_status.as_str().to_string(),
            i.review_tone.as_str().to_string(),
            i.value_for_money.as_str().to_string(),
            i.churn_risk.as_str().to_string(),
            i.summary.clone(),
        ]
    }
}

/// Build the output table; an empty slice yields headers only.
pub fn enriched_table(records: &[EnrichedRecord]) -> Table {
    let mut table = Table::new(ENRICHED_COLUMNS);
    for rec in records {
        table.push_row(rec.to_row());
    }
    table
}
