//! Schema-constrained review classification: vocabularies, the response
//! contract, the provider client and the retry wrapper around it.

pub mod error;
pub mod insights;
pub mod labels;
pub mod prompt;
pub mod provider;
pub mod retry;
pub mod schema;

pub use error::ClassifyError;
pub use insights::ReviewInsights;
pub use labels::Vocabulary;
pub use provider::{Classifier, LlmClassifier};
pub use retry::{classify_with_retry, Outcome, RetryPolicy};
