use anyhow::Result;

use crate::audit::{normalize_key, AuditRecord};
use crate::cli::commands::with_audit_service;

pub struct LookupCommand {
    pub key: String,
}

impl LookupCommand {
    pub fn new(key: String) -> Self {
        Self { key }
    }

    pub async fn execute(&self) -> Result<()> {
        let key = self.key.clone();
        println!("🔎 Looking up audit record {}...", normalize_key(&key));
        println!();

        with_audit_service(|service| async move {
            match service.lookup_record(&key).await {
                Ok(Some(record)) => {
                    println!("{}", render_record(&record));
                    Ok(())
                }
                Ok(None) => {
                    println!("📭 No audit record found for key '{}'", normalize_key(&key));
                    println!("   💡 Keys are 8 characters; check for typos and try again");
                    Ok(())
                }
                Err(e) => {
                    println!("❌ {e}");
                    Err(e.into())
                }
            }
        })
        .await
    }
}

pub fn render_record(record: &AuditRecord) -> String {
    let mut lines = vec![
        format!("🔑 Audit key: {}", record.key),
        format!("🕒 Created: {}", record.created_at.format("%Y-%m-%d %H:%M:%S UTC")),
        format!(
            "🏥 Recommendation: {}",
            record.final_recommendation.display_name()
        ),
    ];

    if let Some(result) = &record.symptom_result {
        lines.push(format!(
            "🧮 QUID-6: {} (Stress score: {}, Urge score: {})",
            result.diagnosis, result.stress_score, result.urge_score
        ));
    }

    lines.push(String::new());
    lines.push("📋 Decision trail:".to_string());
    for (step, line) in record.decision_trail().iter().enumerate() {
        lines.push(format!("   {}. {}", step + 1, line));
    }
    lines.join("\n")
}
