//! End-to-end traversals of the standard workflow against the in-memory
//! audit store.

mod fixtures;

use std::sync::Arc;

use clinic_scheduler::audit::{is_well_formed_key, AuditKeyGenerator, AuditService};
use clinic_scheduler::quid6::{score, Diagnosis, SymptomAnswers};
use clinic_scheduler::session::{AuditStatus, SchedulingSession, SessionError, SessionState};
use clinic_scheduler::workflow::{Provider, WorkflowEngine, APP_RESULT_NODE_ID, SURGEON_RESULT_NODE_ID};
use fixtures::{FailureMode, InMemoryAuditApi};

fn session_over(api: &InMemoryAuditApi) -> SchedulingSession {
    let service = AuditService::new(Arc::new(api.clone()));
    SchedulingSession::new(WorkflowEngine::standard(), Arc::new(service))
}

fn choose(session: &mut SchedulingSession, index: usize) {
    session.select_option(index).unwrap();
    session.advance().unwrap();
}

fn walk_to_questionnaire(session: &mut SchedulingSession) {
    choose(session, 1);
    choose(session, 0);
    assert!(session.current_node().is_symptom_assessment());
}

#[tokio::test]
async fn test_direct_path_to_app_stores_record() {
    let api = InMemoryAuditApi::new();
    let mut session = session_over(&api);

    choose(&mut session, 0);
    assert_eq!(session.current_node().id, APP_RESULT_NODE_ID);

    let status = session.settle_audit().await;
    let key = status.key().expect("audit key issued").to_string();
    assert!(is_well_formed_key(&key));

    let stored = api.records();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].key, key);
    assert_eq!(stored[0].final_recommendation, Provider::App);
    assert_eq!(stored[0].path.len(), 2);
    assert_eq!(stored[0].path[0].selected_option_index, Some(0));
    assert_eq!(stored[0].symptom_result, None);
}

#[tokio::test]
async fn test_questionnaire_path_records_symptom_result() {
    let api = InMemoryAuditApi::new();
    let mut session = session_over(&api);
    walk_to_questionnaire(&mut session);

    let result = score(&SymptomAnswers::new([2, 2, 2, 3, 3, 3]).unwrap());
    assert_eq!(result.diagnosis, Diagnosis::UrgePredominantMixed);
    let next = session.complete_symptom_assessment(result).unwrap();
    assert_eq!(next.id, APP_RESULT_NODE_ID);

    session.settle_audit().await;
    let stored = api.records();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].symptom_result, Some(result));
    assert_eq!(stored[0].path.len(), 4);
    assert!(stored[0].path[2].node.prompt.contains("Urge-Predominant Mixed"));
}

#[tokio::test]
async fn test_stress_predominant_goes_to_surgeon() {
    let api = InMemoryAuditApi::new();
    let mut session = session_over(&api);
    walk_to_questionnaire(&mut session);

    let result = score(&SymptomAnswers::new([4, 4, 4, 2, 2, 2]).unwrap());
    session.complete_symptom_assessment(result).unwrap();

    assert_eq!(session.current_node().id, SURGEON_RESULT_NODE_ID);
    assert_eq!(
        session.state(),
        SessionState::Completed {
            recommendation: Provider::Guanzon
        }
    );
    session.settle_audit().await;
}

#[tokio::test]
async fn test_audit_fires_once_per_terminal_occurrence() {
    let api = InMemoryAuditApi::new();
    let mut session = session_over(&api);

    choose(&mut session, 0);
    let first = session.settle_audit().await;
    assert_eq!(api.create_calls(), 1);

    // Settling again does not create another record
    assert_eq!(session.settle_audit().await, first);
    assert_eq!(api.create_calls(), 1);

    // Leaving and re-entering the result node is a new occurrence
    assert!(session.back().unwrap());
    assert_eq!(session.audit_status(), AuditStatus::NotRequested);
    session.advance().unwrap();
    let second = session.settle_audit().await;

    assert_eq!(api.create_calls(), 2);
    assert_ne!(first.key(), second.key());
}

#[tokio::test]
async fn test_back_restores_previous_selection_at_each_step() {
    let api = InMemoryAuditApi::new();
    let mut session = session_over(&api);

    choose(&mut session, 1);
    choose(&mut session, 2);
    assert_eq!(session.current_node().id, "physicianReview");

    assert!(session.back().unwrap());
    assert_eq!(session.current_node().id, "chiefComplaint");
    assert_eq!(session.pending_selection(), Some(2));

    assert!(session.back().unwrap());
    assert_eq!(session.current_node().id, "patientAge");
    assert_eq!(session.pending_selection(), Some(1));

    assert!(!session.back().unwrap());
    assert_eq!(session.path().len(), 1);
    assert_eq!(api.create_calls(), 0);
}

#[tokio::test]
async fn test_navigation_blocked_until_audit_settles() {
    let api = InMemoryAuditApi::new();
    let mut session = session_over(&api);
    choose(&mut session, 0);

    assert!(session.is_busy());
    assert!(matches!(session.back(), Err(SessionError::AuditInFlight)));
    assert_eq!(session.audit_status(), AuditStatus::Pending);

    session.settle_audit().await;
    assert!(!session.is_busy());
    assert!(session.back().unwrap());
}

#[tokio::test]
async fn test_restart_mid_audit_detaches_task() {
    let api = InMemoryAuditApi::new();
    let mut session = session_over(&api);
    choose(&mut session, 0);

    session.restart();
    assert_eq!(session.current_node().id, "patientAge");
    assert_eq!(session.audit_status(), AuditStatus::NotRequested);
    assert!(!session.is_busy());
    assert!(session.pending_selection().is_none());
}

#[tokio::test]
async fn test_offline_store_still_issues_key() {
    let api = InMemoryAuditApi::new();
    api.set_failure(FailureMode::Offline);
    let mut session = session_over(&api);

    choose(&mut session, 0);
    let status = session.settle_audit().await;

    assert!(is_well_formed_key(status.key().unwrap()));
    assert!(api.records().is_empty());
    // Uniqueness check failed, so the first candidate is used without retrying
    assert_eq!(api.exists_calls(), 1);
    assert_eq!(api.create_calls(), 1);
}

#[tokio::test]
async fn test_key_collisions_are_retried() {
    let api = InMemoryAuditApi::new();
    api.reserve_collisions(3);
    let service = AuditService::new(Arc::new(api.clone()))
        .with_key_generator(AuditKeyGenerator::with_max_attempts(10));
    let mut session = SchedulingSession::new(WorkflowEngine::standard(), Arc::new(service));

    choose(&mut session, 0);
    session.settle_audit().await;

    assert_eq!(api.exists_calls(), 4);
    assert_eq!(api.records().len(), 1);
}

#[tokio::test]
async fn test_advance_without_selection_is_rejected() {
    let api = InMemoryAuditApi::new();
    let mut session = session_over(&api);

    assert!(matches!(session.advance(), Err(SessionError::NoSelection)));
    assert!(matches!(
        session.select_option(5),
        Err(SessionError::InvalidOption { .. })
    ));
    assert_eq!(session.current_node().id, "patientAge");
}

#[tokio::test]
async fn test_symptom_result_outside_assessment_is_rejected() {
    let api = InMemoryAuditApi::new();
    let mut session = session_over(&api);
    let result = score(&SymptomAnswers::new([0; 6]).unwrap());

    assert!(matches!(
        session.complete_symptom_assessment(result),
        Err(SessionError::NotAtSymptomAssessment { .. })
    ));
}

#[tokio::test]
async fn test_finished_audit_reports_ready_without_settling() {
    let api = InMemoryAuditApi::new();
    let mut session = session_over(&api);
    choose(&mut session, 0);

    while session.is_busy() {
        tokio::task::yield_now().await;
    }
    assert_eq!(api.records().len(), 1);

    let mut status = session.audit_status();
    while status == AuditStatus::Pending {
        tokio::task::yield_now().await;
        status = session.audit_status();
    }
    assert!(!session.is_busy());
    assert_eq!(status.key(), Some(api.records()[0].key.as_str()));
    assert!(session.back().unwrap());
}
