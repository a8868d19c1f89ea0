// QUID-6 questionnaire content and the plain-text chart report

use std::fmt::Write;

use super::scorer::SymptomAnswers;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymptomCategory {
    Stress,
    Urge,
}

#[derive(Debug, Clone, Copy)]
pub struct Question {
    pub id: usize,
    pub text: &'static str,
    pub short_text: &'static str,
    pub category: SymptomCategory,
}

/// Answer labels indexed by answer value
pub const ANSWER_LABELS: [&str; 5] = [
    "None of the time",
    "Rarely",
    "Sometimes",
    "Most of the time",
    "All of the time",
];

pub const QUESTIONS: [Question; 6] = [
    Question {
        id: 1,
        text: "Do you leak urine (even small drops), wet yourself, or wet your pads or undergarments when you cough or sneeze?",
        short_text: "Leakage with cough/sneeze?",
        category: SymptomCategory::Stress,
    },
    Question {
        id: 2,
        text: "Do you leak urine (even small drops), wet yourself, or wet your pads or undergarments when you bend down or lift something up?",
        short_text: "Leakage with bending/lifting?",
        category: SymptomCategory::Stress,
    },
    Question {
        id: 3,
        text: "Do you leak urine (even small drops), wet yourself, or wet your pads or undergarments when you walk quickly, jog or exercise?",
        short_text: "Leakage with activity?",
        category: SymptomCategory::Stress,
    },
    Question {
        id: 4,
        text: "Do you leak urine (even small drops), wet yourself, or wet your pads or undergarments when you are on your way to the bathroom?",
        short_text: "Leakage on way to bathroom?",
        category: SymptomCategory::Urge,
    },
    Question {
        id: 5,
        text: "Do you leak urine (even small drops), wet yourself, or wet your pads or undergarments when you get such a strong and uncomfortable need to urinate that you leak urine (even small drops) or wet yourself before reaching the toilet?",
        short_text: "Leakage with strong urge?",
        category: SymptomCategory::Urge,
    },
    Question {
        id: 6,
        text: "Do you have to rush to the bathroom because you get a sudden, strong need to urinate?",
        short_text: "Rush to bathroom with urge?",
        category: SymptomCategory::Urge,
    },
];

pub fn answer_label(value: u8) -> Option<&'static str> {
    ANSWER_LABELS.get(usize::from(value)).copied()
}

/// Compact six-digit form clinicians paste between systems
pub fn score_string(answers: &SymptomAnswers) -> String {
    answers.values().iter().map(|value| value.to_string()).collect()
}

pub fn detailed_report(answers: &SymptomAnswers) -> String {
    const RULE: &str = "==================";

    let mut report = String::from("QUID-6 Questionnaire\n");
    report.push_str(RULE);
    report.push('\n');

    for question in &QUESTIONS {
        let label = answers
            .get(question.id)
            .and_then(answer_label)
            .unwrap_or("Unanswered");
        let _ = writeln!(report, "{} -> {}", question.short_text, label);
    }

    report.push_str(RULE);
    report.push('\n');
    let _ = writeln!(report, "SUI Score: {}", answers.stress_score());
    let _ = write!(report, "UUI Score: {}", answers.urge_score());
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_questions_split_by_category() {
        let stress: Vec<usize> = QUESTIONS
            .iter()
            .filter(|q| q.category == SymptomCategory::Stress)
            .map(|q| q.id)
            .collect();
        assert_eq!(stress, vec![1, 2, 3]);
        assert!(QUESTIONS.iter().enumerate().all(|(i, q)| q.id == i + 1));
    }

    #[test]
    fn test_answer_labels() {
        assert_eq!(answer_label(0), Some("None of the time"));
        assert_eq!(answer_label(4), Some("All of the time"));
        assert_eq!(answer_label(5), None);
    }

    #[test]
    fn test_score_string_round_trips() {
        let answers = SymptomAnswers::from_score_string("402113").unwrap();
        assert_eq!(score_string(&answers), "402113");
    }

    #[test]
    fn test_detailed_report_format() {
        let answers = SymptomAnswers::from_score_string("312111").unwrap();
        let report = detailed_report(&answers);
        let lines: Vec<&str> = report.lines().collect();

        assert_eq!(lines[0], "QUID-6 Questionnaire");
        assert_eq!(lines[1], "==================");
        assert_eq!(lines[2], "Leakage with cough/sneeze? -> Most of the time");
        assert_eq!(lines[3], "Leakage with bending/lifting? -> Rarely");
        assert_eq!(lines[4], "Leakage with activity? -> Sometimes");
        assert_eq!(lines[8], "==================");
        assert_eq!(lines[9], "SUI Score: 6");
        assert_eq!(lines[10], "UUI Score: 3");
        assert!(!report.ends_with('\n'));
    }
}
