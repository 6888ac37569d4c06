use super::labels::{
    ChurnRiskLabel, EmotionLabel, IssueType, JourneyStage, ResolutionStatus, ReviewMention,
    ReviewTone, SentimentLabel, ValueForMoney, Vocabulary,
};
use super::schema::SCHEMA_NAME;

fn field_section<V: Vocabulary>(field: &str, intro: &str) -> String {
    let title = format!("{field} ({})", V::NAME);
    let values: Vec<String> = V::all()
        .iter()
        .map(|v| format!("- {}: {}", v.as_str(), v.guidance()))
        .collect();
    format!(
        "{title}\n{rule}\n{intro}\n{values}\nIf unclear, use {fallback}.\n\n",
        rule = "-".repeat(title.chars().count()),
        values = values.join("\n"),
        fallback = V::safe_default().as_str(),
    )
}

/// System instruction for classifying reviews of `subject`.
///
/// Pure function of its input; the allowed values are rendered from the
/// vocabularies so the prompt cannot drift from the schema.
pub fn system_prompt(subject: &str) -> String {
    let mut p = String::with_capacity(8 * 1024);

    p.push_str(&format!(
        "You analyze public customer reviews and social-media posts about {subject}, \
a mobile telecom operator.\n\
Read one review and fill every field of the {SCHEMA_NAME} object.\n\n\
General rules\n\
-------------\n\
- Base every decision only on what the review clearly says or implies.\n\
- Never invent facts such as dates, amounts or names that are not in the text.\n\
- When several values could apply, pick the single most dominant one. \
A strong feeling beats a weak one: weak annoyance plus strong disappointment is disappointment.\n\
- Every field holds exactly one value from its list. No lists, no nulls, no new values.\n\
- If a field cannot be inferred, use the fallback named for that field.\n\n"
    ));

    p.push_str(
        "sentiment_label and sentiment_score\n\
-----------------------------------\n\
sentiment_score is a number from -1 to 1 giving direction and intensity:\n\
- -1.00 to -0.80: extremely negative\n\
- -0.79 to -0.40: clearly negative\n\
- -0.39 to +0.39: weak, mixed or neutral (0 is perfectly neutral)\n\
- +0.40 to +0.79: clearly positive\n\
- +0.80 to +1.00: extremely positive\n\
The sign must agree with sentiment_label: negative means a score below 0, \
neutral means a score between -0.39 and 0.39, positive means a score above 0.\n\n"
    );
    p.push_str(&field_section::<SentimentLabel>(
        "sentiment_label",
        "Polarity toward the business.",
    ));
    p.push_str(&field_section::<EmotionLabel>(
        "primary_emotion",
        "The one dominant feeling. Betrayal means feeling cheated, scammed or lied to.",
    ));
    p.push_str(&field_section::<ReviewMention>(
        "primary_mention",
        "What the review is mainly about.",
    ));

    p.push_str(&format!(
        "Enum safety\n\
-----------\n\
- primary_mention takes values only from the {mention} list. \
Never put a {issue} value such as delivery_logistics_issue or billing_payment_issue in primary_mention.\n\
- If the problem is about SIM or product delivery, use primary_mention = delivery_service \
and primary_issue_type = delivery_logistics_issue.\n\n",
        mention = ReviewMention::NAME,
        issue = IssueType::NAME,
    ));

    p.push_str(&field_section::<JourneyStage>(
        "journey_stage",
        "Main stage of the customer journey.",
    ));
    p.push_str(&field_section::<IssueType>(
        "primary_issue_type",
        "Main underlying problem, or no_issue_pure_praise.",
    ));
    p.push_str(&field_section::<ResolutionStatus>(
        "resolution_status",
        "Whether the problem is solved.",
    ));
    p.push_str(&field_section::<ReviewTone>("review_tone", "Overall intent of the review."));
    p.push_str(&field_section::<ValueForMoney>(
        "value_for_money",
        "How the customer feels about price versus value.",
    ));
    p.push_str(&field_section::<ChurnRiskLabel>("churn_risk", "How likely they are to leave."));

    p.push_str(&format!(
        "summary\n\
-------\n\
One concise plain-English sentence: who the customer is if implied, what happened, \
and how they feel. No marketing language, no apologies.\n\n\
Competitor praise\n\
-----------------\n\
If the review mainly praises or recommends a competitor instead of {subject}, \
treat the sentiment toward {subject} as negative unless {subject} is also clearly praised. \
Classify every field from the point of view of {subject}. The summary must say that the \
customer is praising a competitor and comparing {subject} unfavorably. \
Do not invent competitor details.\n\n\
Output\n\
------\n\
Return exactly one JSON object matching the {SCHEMA_NAME} schema. Never return a list.\n"
    ));

    p
}

/// User turn wrapping the review text.
pub fn user_message(review_text: &str) -> String {
    format!("[REVIEW]\n{}", review_text)
}
