use anyhow::Result;

use crate::cli::commands::with_audit_service;

pub struct HealthCommand;

impl HealthCommand {
    pub fn new() -> Self {
        Self
    }

    pub async fn execute(&self) -> Result<()> {
        with_audit_service(|service| async move {
            if service.health_check().await {
                println!("✅ Audit API is reachable");
                Ok(())
            } else {
                println!("❌ Audit API is not reachable");
                anyhow::bail!("audit API health check failed")
            }
        })
        .await
    }
}

impl Default for HealthCommand {
    fn default() -> Self {
        Self::new()
    }
}
