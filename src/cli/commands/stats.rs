use anyhow::Result;

use crate::cli::commands::with_audit_service;
use crate::observability::audit_api_metrics;

pub struct StatsCommand;

impl StatsCommand {
    pub fn new() -> Self {
        Self
    }

    pub async fn execute(&self) -> Result<()> {
        with_audit_service(|service| async move {
            match service.get_stats().await {
                Ok(stats) => {
                    println!("📊 AUDIT STORAGE:");
                    println!("   📋 Records: {}", stats.record_count);
                    println!("   💾 Estimated size: {} KB", stats.estimated_size_kb);
                    let metrics = audit_api_metrics();
                    for call in metrics.snapshot().used_endpoints() {
                        println!(
                            "   📡 {}: {} call(s), {} not found, {} failed, ~{} ms",
                            call.endpoint,
                            call.calls,
                            call.not_found,
                            call.failures,
                            call.mean_latency_ms()
                        );
                    }
                    metrics.log_stats();
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

impl Default for StatsCommand {
    fn default() -> Self {
        Self::new()
    }
}
