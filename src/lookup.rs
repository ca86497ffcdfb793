// One-shot lookup of a phone by model, with optional sentiment for a review comment.

use rand::RngCore;
use serde::Serialize;
use thiserror::Error;

use crate::phone::PhoneRecord;
use crate::provider::{LookupError, PhoneRecordProvider};
use crate::sentiment::{Sentiment, SentimentClassifier};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LookupFailure {
    #[error("Please enter a mobile model.")]
    EmptyQuery,
    #[error("Sorry, no data found for this mobile.")]
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LookupResult {
    pub record: PhoneRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_sentiment: Option<Sentiment>,
}

pub fn lookup(
    provider: &dyn PhoneRecordProvider,
    classifier: &SentimentClassifier,
    query: &str,
    review: Option<&str>,
    rng: &mut dyn RngCore,
) -> Result<LookupResult, LookupFailure> {
    if query.trim().is_empty() {
        return Err(LookupFailure::EmptyQuery);
    }
    let record = provider.resolve(query, rng).map_err(|e| match e {
        LookupError::NotFound { .. } => LookupFailure::NotFound,
    })?;
    let review_sentiment = review
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(|r| classifier.classify(r));
    Ok(LookupResult {
        record,
        review_sentiment,
    })
}
