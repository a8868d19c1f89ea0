// QUID-6 symptom scoring
// Six questionnaire answers in, one incontinence diagnosis out.

pub mod scorer;
pub mod questionnaire;

pub use scorer::{
    score, Diagnosis, SymptomAnswerError, SymptomAnswers, SymptomResult, MAX_ANSWER,
    STRESS_THRESHOLD, URGE_THRESHOLD,
};
pub use questionnaire::{
    answer_label, detailed_report, score_string, Question, SymptomCategory, ANSWER_LABELS,
    QUESTIONS,
};
