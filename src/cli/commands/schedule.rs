use std::io::Write;

use anyhow::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tracing::Instrument;

use crate::cli::commands::quid6::render_result;
use crate::cli::commands::with_audit_service;
use crate::quid6::{score, SymptomAnswers, ANSWER_LABELS, MAX_ANSWER, QUESTIONS};
use crate::session::{AuditStatus, SchedulingSession};
use crate::telemetry::create_session_span;
use crate::workflow::WorkflowEngine;

/// Navigation typed at a prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    /// Zero-based option index
    Choice(usize),
    Back,
    Restart,
    Quit,
}

pub fn parse_input(line: &str) -> Option<Input> {
    match line.trim().to_ascii_lowercase().as_str() {
        "b" | "back" => Some(Input::Back),
        "r" | "restart" => Some(Input::Restart),
        "q" | "quit" | "exit" => Some(Input::Quit),
        other => other
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .map(Input::Choice),
    }
}

enum Questionnaire {
    Completed(SymptomAnswers),
    Interrupted(Input),
}

pub struct ScheduleCommand;

impl ScheduleCommand {
    pub fn new() -> Self {
        Self
    }

    pub async fn execute(&self) -> Result<()> {
        with_audit_service(|service| async move {
            let session = SchedulingSession::new(WorkflowEngine::standard(), service);
            let span = create_session_span(session.id());
            run_session(session, BufReader::new(tokio::io::stdin()))
                .instrument(span)
                .await
                .map(|_| ())
        })
        .await
    }
}

impl Default for ScheduleCommand {
    fn default() -> Self {
        Self::new()
    }
}

/// Drive a session from line-oriented input until quit or end of input
pub async fn run_session<R>(mut session: SchedulingSession, reader: R) -> Result<SchedulingSession>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();

    loop {
        let node = session.current_node().clone();
        println!();
        println!("📋 {}", node.prompt);

        if let Some(recommendation) = node.recommendation() {
            match session.settle_audit().await {
                AuditStatus::Ready(key) => println!("🔑 Audit key: {key}"),
                _ => println!("⚠️  Audit key unavailable"),
            }
            println!("🏥 {}", recommendation.guidance());
        } else if node.is_symptom_assessment() {
            match ask_questionnaire(&mut lines).await? {
                Questionnaire::Completed(answers) => {
                    let result = score(&answers);
                    println!();
                    println!("{}", render_result(&result));
                    session.complete_symptom_assessment(result)?;
                    continue;
                }
                Questionnaire::Interrupted(input) => {
                    if navigate(&mut session, input)? {
                        continue;
                    }
                    break;
                }
            }
        } else {
            for (index, option) in node.options().iter().enumerate() {
                println!("   {}. {}", index + 1, option.text);
            }
            if let Some(previous) = session.pending_selection() {
                println!("   (previous answer: {})", previous + 1);
            }
        }
        println!("   [b] back  [r] restart  [q] quit");

        let Some(line) = read_line(&mut lines, "> ").await? else {
            break;
        };
        match parse_input(&line) {
            Some(input) => {
                if !navigate(&mut session, input)? {
                    break;
                }
            }
            None => println!("❓ Enter an option number, b, r or q"),
        }
    }

    println!();
    println!("👋 Session ended");
    Ok(session)
}

/// Apply one input; false means the user asked to stop
fn navigate(session: &mut SchedulingSession, input: Input) -> Result<bool> {
    match input {
        Input::Choice(index) => {
            if let Err(e) = session
                .select_option(index)
                .and_then(|_| session.advance().map(|_| ()))
            {
                println!("❌ {e}");
            }
        }
        Input::Back => {
            if !session.back()? {
                println!("ℹ️  Already at the first question");
            }
        }
        Input::Restart => session.restart(),
        Input::Quit => return Ok(false),
    }
    Ok(true)
}

async fn ask_questionnaire<R>(lines: &mut Lines<R>) -> Result<Questionnaire>
where
    R: AsyncBufRead + Unpin,
{
    println!("   Answer each question 0-{MAX_ANSWER}:");
    for (value, label) in ANSWER_LABELS.iter().enumerate() {
        println!("     {value} = {label}");
    }

    let mut answers = [0u8; QUESTIONS.len()];
    let mut index = 0;
    while index < QUESTIONS.len() {
        let question = &QUESTIONS[index];
        println!();
        println!("   Q{}. {}", question.id, question.text);
        let Some(line) = read_line(lines, "> ").await? else {
            return Ok(Questionnaire::Interrupted(Input::Quit));
        };
        match line.trim().parse::<u8>() {
            Ok(value) if value <= MAX_ANSWER => {
                answers[index] = value;
                index += 1;
            }
            _ => match parse_input(&line) {
                // Back from the first question leaves the assessment
                Some(Input::Back) if index > 0 => {
                    index -= 1;
                    println!("   (previous answer: {})", answers[index]);
                }
                Some(Input::Choice(_)) | None => {
                    println!("❓ Enter a number 0-{MAX_ANSWER}, b, r or q")
                }
                Some(input) => return Ok(Questionnaire::Interrupted(input)),
            },
        }
    }

    Ok(Questionnaire::Completed(SymptomAnswers::new(answers)?))
}

async fn read_line<R>(lines: &mut Lines<R>, prompt: &str) -> Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    print!("{prompt}");
    std::io::stdout().flush()?;
    Ok(lines.next_line().await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::api::MockAuditApi;
    use crate::audit::AuditService;
    use crate::quid6::Diagnosis;
    use crate::session::SessionState;
    use crate::workflow::{Provider, SURGEON_RESULT_NODE_ID};
    use std::sync::Arc;

    fn session(expected_creates: usize) -> SchedulingSession {
        let mut api = MockAuditApi::new();
        api.expect_key_exists().returning(|_| Ok(false));
        api.expect_create_record()
            .times(expected_creates)
            .returning(|_| Ok(()));
        SchedulingSession::new(
            WorkflowEngine::standard(),
            Arc::new(AuditService::new(Arc::new(api))),
        )
    }

    #[test]
    fn test_parse_input() {
        assert_eq!(parse_input("1"), Some(Input::Choice(0)));
        assert_eq!(parse_input(" 9 "), Some(Input::Choice(8)));
        assert_eq!(parse_input("B"), Some(Input::Back));
        assert_eq!(parse_input("restart"), Some(Input::Restart));
        assert_eq!(parse_input("q"), Some(Input::Quit));
        assert_eq!(parse_input("0"), None);
        assert_eq!(parse_input("maybe"), None);
    }

    #[tokio::test]
    async fn test_scripted_session_reaches_app() {
        let script: &[u8] = b"1\nq\n";
        let mut session = run_session(session(1), script).await.unwrap();

        assert_eq!(
            session.state(),
            SessionState::Completed {
                recommendation: Provider::App
            }
        );
        assert!(session.audit_status().key().is_some());
    }

    #[tokio::test]
    async fn test_scripted_questionnaire_routes_to_surgeon() {
        let script: &[u8] = b"2\n1\n4\n4\n4\n0\n0\n0\n";
        let mut session = run_session(session(1), script).await.unwrap();

        assert_eq!(
            session.state(),
            SessionState::Completed {
                recommendation: Provider::Guanzon
            }
        );
        assert_eq!(
            session.symptom_result().map(|r| r.diagnosis),
            Some(Diagnosis::StressIncontinence)
        );
    }

    #[tokio::test]
    async fn test_back_during_questionnaire_returns_to_previous_question() {
        // Q1 answered 0, Q2 answered 3, back to Q1 and re-answer it
        let script: &[u8] = b"2\n1\n0\n3\nb\nb\n4\n4\n4\n0\n0\n0\n";
        let mut session = run_session(session(1), script).await.unwrap();

        assert_eq!(session.current_node().id, SURGEON_RESULT_NODE_ID);
        let result = session.symptom_result().copied().unwrap();
        assert_eq!(result.stress_score, 12);
        assert_eq!(result.urge_score, 0);
        assert!(session.audit_status().key().is_some());
    }

    #[tokio::test]
    async fn test_back_at_first_question_leaves_assessment() {
        let script: &[u8] = b"2\n1\nb\n";
        let session = run_session(session(0), script).await.unwrap();

        assert_eq!(session.current_node().id, "chiefComplaint");
        assert_eq!(session.pending_selection(), Some(0));
        assert_eq!(session.symptom_result(), None);
    }

    #[tokio::test]
    async fn test_invalid_input_is_ignored() {
        let script: &[u8] = b"7\nhello\nb\n2\n";
        let session = run_session(session(0), script).await.unwrap();
        assert_eq!(session.current_node().id, "chiefComplaint");
        assert_eq!(session.path().len(), 2);
    }
}
