//! Closed vocabularies for every categorical field of a classification.
//!
//! Each vocabulary is a plain enum whose wire values are the snake_case
//! names the model is asked to emit. Decoding is exact and fails closed:
//! a value outside the vocabulary is an error, never a fallback.

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;

/// A string that is not a member of the named vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("`{value}` is not a valid {vocabulary}")]
pub struct UnknownLabel {
    pub vocabulary: &'static str,
    pub value: String,
}

/// Shared surface of the closed vocabularies, used by the prompt and the
/// JSON Schema builders so both are generated from the same definitions.
pub trait Vocabulary: Copy + Sized + 'static {
    /// Type name, used in error messages and the prompt.
    const NAME: &'static str;

    fn all() -> &'static [Self];

    /// Wire value.
    fn as_str(&self) -> &'static str;

    /// One-line meaning of the value, rendered into the prompt.
    fn guidance(&self) -> &'static str;

    /// Value to use when nothing can be inferred confidently.
    fn safe_default() -> Self;

    fn wire_values() -> Vec<&'static str> {
        Self::all().iter().map(|v| v.as_str()).collect()
    }

    fn parse_wire(s: &str) -> Result<Self, UnknownLabel> {
        Self::all()
            .iter()
            .copied()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| UnknownLabel {
                vocabulary: Self::NAME,
                value: s.to_string(),
            })
    }
}

macro_rules! closed_vocabulary {
    (
        $(#[$meta:meta])*
        pub enum $name:ident (safe = $safe:ident) {
            $( $variant:ident = $wire:literal => $guide:literal, )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $wire)]
                $variant,
            )+
        }

        impl Vocabulary for $name {
            const NAME: &'static str = stringify!($name);

            fn all() -> &'static [Self] {
                &[$($name::$variant),+]
            }

            fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire,)+
                }
            }

            fn guidance(&self) -> &'static str {
                match self {
                    $($name::$variant => $guide,)+
                }
            }

            fn safe_default() -> Self {
                $name::$safe
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownLabel;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse_wire(s)
            }
        }
    };
}

closed_vocabulary! {
    /// Overall polarity toward the subject business.
    pub enum SentimentLabel (safe = Neutral) {
        Negative = "negative" => "clear complaint, anger, threats to leave, strong dissatisfaction",
        Neutral = "neutral" => "mostly factual, balanced, or mixed without strong emotion",
        Positive = "positive" => "praise, strong satisfaction, clear recommendation",
    }
}

closed_vocabulary! {
    /// The single dominant feeling expressed.
    pub enum EmotionLabel (safe = Neutral) {
        Anger = "anger" => "hostile, furious",
        Frustration = "frustration" => "annoyed at repeated or blocked attempts",
        Disappointment = "disappointment" => "expectations not met",
        Anxiety = "anxiety" => "worried about what will happen",
        Confusion = "confusion" => "does not understand what happened or what to do",
        Fear = "fear" => "afraid of harm or loss",
        Sadness = "sadness" => "unhappy, let down without hostility",
        Betrayal = "betrayal" => "feels cheated, scammed, or lied to",
        Relief = "relief" => "problem finally fixed after trouble",
        Satisfaction = "satisfaction" => "content with the service",
        Joy = "joy" => "delighted",
        Gratitude = "gratitude" => "thankful to the company or staff",
        Pride = "pride" => "proud to be a customer or of an outcome",
        Neutral = "neutral" => "no clear emotional tone",
    }
}

closed_vocabulary! {
    /// Dominant topic of the review. Disjoint from [`IssueType`].
    pub enum ReviewMention (safe = Other) {
        CustomerService = "customer_service" => "interaction with agents, support quality",
        CustomerCommunications = "customer_communications" => "emails, SMS, notifications, clarity of information",
        ServiceGeneral = "service_general" => "generic remarks about the service with no clear detail",
        Solution = "solution" => "how a problem was solved or not",
        Cancellation = "cancellation" => "cancelling the service",
        Payment = "payment" => "making payments, top-ups",
        Staff = "staff" => "specific staff members",
        Refund = "refund" => "getting money back",
        Location = "location" => "shops or physical locations",
        DeliveryService = "delivery_service" => "SIM or product delivery, couriers",
        NetworkCoverage = "network_coverage" => "signal strength, coverage, no service in places",
        DataSpeed = "data_speed" => "data speed, throttling, slow internet",
        CallQuality = "call_quality" => "call drops, echo, voice quality",
        PricingValue = "pricing_value" => "price versus benefits",
        PlansBundles = "plans_bundles" => "bundle structure, allowances, fairness of plans",
        RoamingInternational = "roaming_international" => "roaming, international or EU usage",
        SimActivationPorting = "sim_activation_porting" => "activation delays, number porting",
        AppWebsiteExperience = "app_website_experience" => "usability or bugs in the app or website",
        AccountLoginSecurity = "account_login_security" => "login, password, security codes",
        BillingInvoicing = "billing_invoicing" => "bills, overcharges, unexpected fees",
        PromotionsDiscounts = "promotions_discounts" => "promo codes, discounts, special offers",
        FraudScamConcerns = "fraud_scam_concerns" => "scams, suspicious calls, fraud",
        ComplaintHandling = "complaint_handling" => "formal complaints and escalation",
        Other = "other" => "none of the above fits",
    }
}

closed_vocabulary! {
    /// Stage of the customer journey the review is about.
    pub enum JourneyStage (safe = Other) {
        Acquisition = "acquisition" => "marketing, sign-up decision, first impression before use",
        OnboardingActivation = "onboarding_activation" => "SIM delivery, activation, number porting, first setup",
        EverydayUsage = "everyday_usage" => "regular calls, data, texts, roaming",
        SupportContact = "support_contact" => "contacting support by chat, email or phone",
        PaymentBilling = "payment_billing" => "paying, top-ups, invoices, auto-renewal",
        CancellationExit = "cancellation_exit" => "leaving, switching provider, closing the account",
        PostExitRefund = "post_exit_refund" => "refunds or problems after leaving",
        Other = "other" => "unclear or mixed",
    }
}

closed_vocabulary! {
    /// Main underlying problem. Disjoint from [`ReviewMention`].
    pub enum IssueType (safe = Other) {
        NoIssuePurePraise = "no_issue_pure_praise" => "purely positive, no real problem",
        NetworkIssue = "network_issue" => "coverage, outages, network instability",
        ProductPlanIssue = "product_plan_issue" => "wrong plan, allowances, hidden limits",
        BillingPaymentIssue = "billing_payment_issue" => "charges, payment failures, overbilling",
        AccountLoginIssue = "account_login_issue" => "account access, passwords, security codes",
        AppWebsiteIssue = "app_website_issue" => "app or website bugs, poor UX, technical errors",
        ProcessDelayIssue = "process_delay_issue" => "very long waits, slow handling",
        StaffBehaviourIssue = "staff_behaviour_issue" => "rude or unhelpful staff",
        CommunicationIssue = "communication_issue" => "misleading or unclear information, fine print",
        CancellationRefundIssue = "cancellation_refund_issue" => "difficulty cancelling, lock-in, refunds",
        DeliveryLogisticsIssue = "delivery_logistics_issue" => "SIM or product delivery problems, couriers",
        Other = "other" => "something different or unclear",
    }
}

closed_vocabulary! {
    /// Whether the reviewer's problem has been dealt with.
    pub enum ResolutionStatus (safe = NotApplicable) {
        Resolved = "resolved" => "the review clearly says the issue is solved",
        PartiallyResolved = "partially_resolved" => "some progress, not fully solved",
        Unresolved = "unresolved" => "the issue is still not fixed",
        Pending = "pending" => "waiting for a response or outcome",
        NotApplicable = "not_applicable" => "no specific problem to resolve",
    }
}

closed_vocabulary! {
    /// Overall intent of the review.
    pub enum ReviewTone (safe = Other) {
        Complaint = "complaint" => "mainly complaining or warning others",
        Compliment = "compliment" => "mainly praising or thanking",
        Suggestion = "suggestion" => "mainly advice or ideas for improvement",
        Question = "question" => "mainly asking for information",
        Mixed = "mixed" => "clearly both strong praise and strong complaint",
        Other = "other" => "none of the above",
    }
}

closed_vocabulary! {
    /// How the reviewer rates price against what they get.
    pub enum ValueForMoney (safe = Fair) {
        VeryPoor = "very_poor" => "feels ripped off",
        Poor = "poor" => "too expensive for what they get",
        Fair = "fair" => "acceptable, average",
        Good = "good" => "clearly happy with price versus value",
        Excellent = "excellent" => "extremely happy with pricing",
        NotApplicable = "not_applicable" => "price or value is not discussed",
    }
}

closed_vocabulary! {
    /// Likelihood that the reviewer leaves.
    pub enum ChurnRiskLabel (safe = Medium) {
        High = "high" => "says they are leaving or switching, or persistent strong dissatisfaction",
        Medium = "medium" => "unhappy and may leave, not decided",
        Low = "low" => "generally satisfied, minor issues only",
        NotApplicable = "not_applicable" => "cannot judge, e.g. a generic remark or a long-gone ex-customer",
    }
}
