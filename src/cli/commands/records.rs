use anyhow::Result;

use crate::cli::commands::with_audit_service;

pub struct RecordsCommand {
    pub limit: u32,
    pub offset: u32,
}

impl RecordsCommand {
    pub fn new(limit: u32, offset: u32) -> Self {
        Self { limit, offset }
    }

    pub async fn execute(&self) -> Result<()> {
        let (limit, offset) = (self.limit, self.offset);

        with_audit_service(|service| async move {
            let page = match service.list_records(limit, offset).await {
                Ok(page) => page,
                Err(e) => {
                    println!("❌ {e}");
                    return Err(e.into());
                }
            };

            if page.records.is_empty() {
                println!("📭 No audit records in this range ({} stored)", page.total);
                return Ok(());
            }

            println!(
                "🗂️  Audit records {}-{} of {}",
                page.offset + 1,
                u64::from(page.offset) + page.records.len() as u64,
                page.total
            );
            println!();
            for record in &page.records {
                let diagnosis = record
                    .symptom_result
                    .map(|result| format!(" | QUID-6: {}", result.diagnosis))
                    .unwrap_or_default();
                println!(
                    "   {}  {}  {}{}",
                    record.key,
                    record.created_at.format("%Y-%m-%d %H:%M"),
                    record.final_recommendation,
                    diagnosis
                );
            }
            Ok(())
        })
        .await
    }
}
