use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Highest answer value ("All of the time")
pub const MAX_ANSWER: u8 = 4;
/// Stress subscore at or above which stress incontinence is present
pub const STRESS_THRESHOLD: u8 = 4;
/// Urge subscore at or above which urge incontinence is present
pub const URGE_THRESHOLD: u8 = 6;

const QUESTION_COUNT: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SymptomAnswerError {
    #[error("Answer {value} to question {question} is outside 0-{max}", max = MAX_ANSWER)]
    OutOfRange { question: usize, value: u8 },
    #[error("Unknown QUID-6 question '{0}' (expected 1-6)")]
    UnknownQuestion(String),
    #[error("Invalid QUID-6 score string '{0}': expected six digits 0-4")]
    InvalidScoreString(String),
}

/// Six QUID-6 answers keyed 1..6, each validated to 0..=4
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "BTreeMap<String, u8>", try_from = "BTreeMap<String, u8>")]
pub struct SymptomAnswers([u8; QUESTION_COUNT]);

impl SymptomAnswers {
    pub fn new(values: [u8; QUESTION_COUNT]) -> Result<Self, SymptomAnswerError> {
        for (position, &value) in values.iter().enumerate() {
            if value > MAX_ANSWER {
                return Err(SymptomAnswerError::OutOfRange {
                    question: position + 1,
                    value,
                });
            }
        }
        Ok(Self(values))
    }

    /// Answers keyed by question number. Unanswered questions count as 0.
    pub fn from_keyed<I>(answers: I) -> Result<Self, SymptomAnswerError>
    where
        I: IntoIterator<Item = (usize, u8)>,
    {
        let mut values = [0u8; QUESTION_COUNT];
        for (question, value) in answers {
            if !(1..=QUESTION_COUNT).contains(&question) {
                return Err(SymptomAnswerError::UnknownQuestion(question.to_string()));
            }
            values[question - 1] = value;
        }
        Self::new(values)
    }

    /// Parse the compact six-digit form, e.g. `"312111"`
    pub fn from_score_string(input: &str) -> Result<Self, SymptomAnswerError> {
        let trimmed = input.trim();
        let invalid = || SymptomAnswerError::InvalidScoreString(input.to_string());

        if trimmed.chars().count() != QUESTION_COUNT {
            return Err(invalid());
        }

        let mut values = [0u8; QUESTION_COUNT];
        for (slot, ch) in values.iter_mut().zip(trimmed.chars()) {
            let digit = ch.to_digit(10).ok_or_else(invalid)?;
            *slot = u8::try_from(digit).map_err(|_| invalid())?;
        }
        Self::new(values).map_err(|_| invalid())
    }

    /// Answer to question `question` (1-based)
    pub fn get(&self, question: usize) -> Option<u8> {
        question
            .checked_sub(1)
            .and_then(|index| self.0.get(index).copied())
    }

    pub fn values(&self) -> [u8; QUESTION_COUNT] {
        self.0
    }

    pub fn stress_score(&self) -> u8 {
        self.0[..3].iter().sum()
    }

    pub fn urge_score(&self) -> u8 {
        self.0[3..].iter().sum()
    }
}

impl FromStr for SymptomAnswers {
    type Err = SymptomAnswerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_score_string(s)
    }
}

impl From<SymptomAnswers> for BTreeMap<String, u8> {
    fn from(answers: SymptomAnswers) -> Self {
        answers
            .0
            .iter()
            .enumerate()
            .map(|(index, &value)| ((index + 1).to_string(), value))
            .collect()
    }
}

impl TryFrom<BTreeMap<String, u8>> for SymptomAnswers {
    type Error = SymptomAnswerError;

    fn try_from(map: BTreeMap<String, u8>) -> Result<Self, Self::Error> {
        let keyed = map
            .into_iter()
            .map(|(key, value)| {
                key.parse::<usize>()
                    .map(|question| (question, value))
                    .map_err(|_| SymptomAnswerError::UnknownQuestion(key))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_keyed(keyed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Diagnosis {
    #[serde(rename = "Stress Incontinence")]
    StressIncontinence,
    #[serde(rename = "Urge Incontinence")]
    UrgeIncontinence,
    #[serde(rename = "Stress-Predominant Mixed")]
    StressPredominantMixed,
    #[serde(rename = "Urge-Predominant Mixed")]
    UrgePredominantMixed,
    #[serde(rename = "Inconclusive")]
    Inconclusive,
}

impl Diagnosis {
    pub fn label(self) -> &'static str {
        match self {
            Diagnosis::StressIncontinence => "Stress Incontinence",
            Diagnosis::UrgeIncontinence => "Urge Incontinence",
            Diagnosis::StressPredominantMixed => "Stress-Predominant Mixed",
            Diagnosis::UrgePredominantMixed => "Urge-Predominant Mixed",
            Diagnosis::Inconclusive => "Inconclusive",
        }
    }

    pub fn clinical_label(self) -> &'static str {
        match self {
            Diagnosis::StressIncontinence => "Stress Urinary Incontinence",
            Diagnosis::UrgeIncontinence => "Urge Urinary Incontinence",
            Diagnosis::StressPredominantMixed => "Stress-Predominant Mixed Urinary Incontinence",
            Diagnosis::UrgePredominantMixed => "Urge-Predominant Mixed Urinary Incontinence",
            Diagnosis::Inconclusive => "No clear predominance; further evaluation may be needed",
        }
    }

    pub fn recommendation_text(self) -> &'static str {
        match self {
            Diagnosis::StressIncontinence | Diagnosis::StressPredominantMixed => {
                "Schedule with surgeon"
            }
            Diagnosis::UrgeIncontinence
            | Diagnosis::UrgePredominantMixed
            | Diagnosis::Inconclusive => "Schedule with APP",
        }
    }
}

impl fmt::Display for Diagnosis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymptomResult {
    pub diagnosis: Diagnosis,
    pub stress_score: u8,
    pub urge_score: u8,
    pub answers: SymptomAnswers,
}

/// Apply the QUID-6 rule. Ties between mixed subscores resolve to urge.
pub fn score(answers: &SymptomAnswers) -> SymptomResult {
    let stress_score = answers.stress_score();
    let urge_score = answers.urge_score();

    let has_stress = stress_score >= STRESS_THRESHOLD;
    let has_urge = urge_score >= URGE_THRESHOLD;

    let diagnosis = match (has_stress, has_urge) {
        (true, true) if stress_score > urge_score => Diagnosis::StressPredominantMixed,
        (true, true) => Diagnosis::UrgePredominantMixed,
        (true, false) => Diagnosis::StressIncontinence,
        (false, true) => Diagnosis::UrgeIncontinence,
        (false, false) => Diagnosis::Inconclusive,
    };

    SymptomResult {
        diagnosis,
        stress_score,
        urge_score,
        answers: *answers,
    }
}
