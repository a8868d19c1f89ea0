use anyhow::Result;

use crate::quid6::{detailed_report, score, score_string, SymptomAnswers, SymptomResult};

pub struct Quid6Command {
    pub answers: String,
}

impl Quid6Command {
    pub fn new(answers: String) -> Self {
        Self { answers }
    }

    pub async fn execute(&self) -> Result<()> {
        let answers: SymptomAnswers = self.answers.parse()?;
        let result = score(&answers);
        println!("{}", render_result(&result));
        Ok(())
    }
}

/// Report block printed after a questionnaire, shared with the interactive flow
pub fn render_result(result: &SymptomResult) -> String {
    format!(
        "{}\n\n🧾 Diagnosis: {}\n   Stress score: {} | Urge score: {}\n   Score string: {}\n➡️  {}",
        detailed_report(&result.answers),
        result.diagnosis.clinical_label(),
        result.stress_score,
        result.urge_score,
        score_string(&result.answers),
        result.diagnosis.recommendation_text(),
    )
}
