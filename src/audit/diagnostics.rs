// Fire-and-forget diagnostics hook for audit create/lookup events.
// Nothing here is awaited by callers and every failure is dropped.

use chrono::{DateTime, SecondsFormat, Utc};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticEventType {
    CreateAttempt,
    CreateSuccess,
    CreateFailure,
    LookupAttempt,
    LookupSuccess,
    LookupFailure,
}

impl DiagnosticEventType {
    pub fn as_str(self) -> &'static str {
        match self {
            DiagnosticEventType::CreateAttempt => "create_attempt",
            DiagnosticEventType::CreateSuccess => "create_success",
            DiagnosticEventType::CreateFailure => "create_failure",
            DiagnosticEventType::LookupAttempt => "lookup_attempt",
            DiagnosticEventType::LookupSuccess => "lookup_success",
            DiagnosticEventType::LookupFailure => "lookup_failure",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticEvent {
    pub event_type: DiagnosticEventType,
    pub audit_key: Option<String>,
    pub error: Option<String>,
    pub recommendation: Option<String>,
    pub http_status: Option<u16>,
    pub path_steps: Option<usize>,
}

impl DiagnosticEvent {
    pub fn new(event_type: DiagnosticEventType) -> Self {
        Self {
            event_type,
            audit_key: None,
            error: None,
            recommendation: None,
            http_status: None,
            path_steps: None,
        }
    }

    pub fn with_key(mut self, key: &str) -> Self {
        self.audit_key = Some(key.to_string());
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn with_recommendation(mut self, recommendation: impl Into<String>) -> Self {
        self.recommendation = Some(recommendation.into());
        self
    }

    pub fn with_http_status(mut self, status: Option<u16>) -> Self {
        self.http_status = status;
        self
    }

    pub fn with_path_steps(mut self, steps: usize) -> Self {
        self.path_steps = Some(steps);
        self
    }

    /// Query-string payload; absent fields are omitted
    pub fn query_params(&self, timestamp: DateTime<Utc>) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("eventType", self.event_type.as_str().to_string()),
            ("timestamp", timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)),
        ];
        if let Some(key) = &self.audit_key {
            params.push(("auditKey", key.clone()));
        }
        if let Some(error) = &self.error {
            params.push(("error", error.clone()));
        }
        if let Some(recommendation) = &self.recommendation {
            params.push(("recommendation", recommendation.clone()));
        }
        if let Some(status) = self.http_status {
            params.push(("httpStatus", status.to_string()));
        }
        if let Some(steps) = self.path_steps {
            params.push(("pathSteps", steps.to_string()));
        }
        params
    }
}

#[derive(Debug, Clone)]
struct DiagnosticsSink {
    endpoint: String,
    client: reqwest::Client,
}

#[derive(Debug, Clone)]
pub struct AuditDiagnostics {
    // Only built when an endpoint is configured
    sink: Option<DiagnosticsSink>,
}

impl Default for AuditDiagnostics {
    fn default() -> Self {
        Self::disabled()
    }
}

impl AuditDiagnostics {
    pub fn new(endpoint: Option<String>) -> Self {
        let sink = endpoint
            .filter(|e| !e.trim().is_empty())
            .map(|endpoint| DiagnosticsSink {
                endpoint,
                client: reqwest::Client::new(),
            });
        Self { sink }
    }

    /// Events are still traced locally, just never sent
    pub fn disabled() -> Self {
        Self::new(None)
    }

    pub fn is_enabled(&self) -> bool {
        self.sink.is_some()
    }

    pub fn log(&self, event: DiagnosticEvent) {
        debug!(
            event_type = event.event_type.as_str(),
            audit_key = ?event.audit_key,
            http_status = ?event.http_status,
            "Audit diagnostic event"
        );

        let Some(sink) = &self.sink else {
            return;
        };
        // Outside a runtime there is nowhere to run the request; skip it.
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            return;
        };

        let params = event.query_params(Utc::now());
        let DiagnosticsSink { endpoint, client } = sink.clone();
        runtime.spawn(async move {
            if let Err(e) = client.get(&endpoint).query(&params).send().await {
                debug!(error = %e, "Diagnostics event dropped");
            }
        });
    }
}
