// Coarse sentiment labels from a lexicon-based polarity score.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

const POSITIVE_THRESHOLD: f64 = 0.1;
const NEGATIVE_THRESHOLD: f64 = -0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl Sentiment {
    pub fn from_polarity(polarity: f64) -> Self {
        if polarity > POSITIVE_THRESHOLD {
            Sentiment::Positive
        } else if polarity < NEGATIVE_THRESHOLD {
            Sentiment::Negative
        } else {
            Sentiment::Neutral
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Sentiment::Positive => "Positive 😊",
            Sentiment::Negative => "Negative 😞",
            Sentiment::Neutral => "Neutral 😐",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Scores text in [-1, 1].
pub trait PolarityScorer: Send + Sync {
    fn polarity(&self, text: &str) -> f64;
}

lazy_static::lazy_static! {
    static ref LEXICON: HashMap<&'static str, f64> = [
        ("amazing", 0.6), ("awesome", 1.0), ("beautiful", 0.85), ("best", 1.0),
        ("better", 0.5), ("brilliant", 0.9), ("excellent", 1.0), ("fantastic", 0.4),
        ("fast", 0.2), ("fine", 0.4), ("friendly", 0.375), ("good", 0.7),
        ("great", 0.8), ("happy", 0.8), ("helpful", 0.5), ("impressive", 1.0),
        ("love", 0.5), ("lovely", 0.5), ("nice", 0.6), ("perfect", 1.0),
        ("pleasant", 0.7), ("powerful", 0.3), ("premium", 0.4), ("reliable", 0.4),
        ("smooth", 0.4), ("solid", 0.3), ("sleek", 0.5), ("superb", 1.0),
        ("useful", 0.3), ("wonderful", 1.0), ("worth", 0.3), ("glad", 0.5),
        ("affordable", 0.3), ("recommend", 0.4), ("intelligent", 0.8), ("realistic", 0.17),
        ("average", -0.15), ("awful", -1.0), ("bad", -0.7), ("boring", -1.0),
        ("broken", -0.4), ("cheap", -0.1), ("disappointing", -0.6), ("error", -0.4),
        ("expensive", -0.5), ("fail", -0.5), ("failed", -0.5), ("hate", -0.8),
        ("high", -0.05), ("horrible", -1.0), ("invalid", -0.4), ("laggy", -0.6),
        ("poor", -0.4), ("sad", -0.5), ("slow", -0.3), ("terrible", -1.0),
        ("ugly", -0.7), ("unreliable", -0.5), ("useless", -0.5), ("worse", -0.4),
        ("worst", -1.0), ("wrong", -0.5), ("weak", -0.4), ("overpriced", -0.6),
    ]
    .into_iter()
    .collect();

    static ref INTENSIFIERS: HashMap<&'static str, f64> = [
        ("very", 1.3), ("really", 1.3), ("extremely", 1.5), ("super", 1.3),
        ("quite", 1.1), ("so", 1.2), ("slightly", 0.7), ("somewhat", 0.7),
    ]
    .into_iter()
    .collect();
}

const NEGATIONS: &[&str] = &["not", "never", "no", "hardly", "without"];

/// Averages the polarity of every lexicon word in the text. An intensifier
/// scales the next scored word; a negation flips it and halves its strength.
#[derive(Debug, Default, Clone, Copy)]
pub struct LexiconScorer;

impl PolarityScorer for LexiconScorer {
    fn polarity(&self, text: &str) -> f64 {
        let lowered = text.to_lowercase();
        let mut total: f64 = 0.0;
        let mut scored = 0usize;
        let mut modifier: f64 = 1.0;
        let mut negated = false;

        for word in lowered
            .split(|c: char| !(c.is_alphanumeric() || c == '\''))
            .filter(|w| !w.is_empty())
        {
            if NEGATIONS.contains(&word) || word.ends_with("n't") {
                negated = true;
                continue;
            }
            if let Some(factor) = INTENSIFIERS.get(word) {
                modifier *= *factor;
                continue;
            }
            if let Some(score) = LEXICON.get(word) {
                let mut value = score * modifier;
                if negated {
                    value *= -0.5;
                }
                total += value.clamp(-1.0, 1.0);
                scored += 1;
            }
            modifier = 1.0;
            negated = false;
        }

        if scored == 0 {
            0.0
        } else {
            (total / scored as f64).clamp(-1.0, 1.0)
        }
    }
}

/// Maps text to a [`Sentiment`] through a polarity scorer.
pub struct SentimentClassifier {
    scorer: Box<dyn PolarityScorer>,
}

impl Default for SentimentClassifier {
    fn default() -> Self {
        Self::new(Box::new(LexiconScorer))
    }
}

impl SentimentClassifier {
    pub fn new(scorer: Box<dyn PolarityScorer>) -> Self {
        Self { scorer }
    }

    pub fn polarity(&self, text: &str) -> f64 {
        self.scorer.polarity(text)
    }

    pub fn classify(&self, text: &str) -> Sentiment {
        Sentiment::from_polarity(self.polarity(text))
    }
}
