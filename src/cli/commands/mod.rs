use std::sync::Arc;

use anyhow::Result;

use crate::audit::AuditService;
use crate::config::config;

pub mod config;
pub mod health;
pub mod lookup;
pub mod quid6;
pub mod records;
pub mod schedule;
pub mod stats;

/// Build the audit service from the global configuration and hand it to `f`
pub async fn with_audit_service<F, Fut, R>(f: F) -> Result<R>
where
    F: FnOnce(Arc<AuditService>) -> Fut + Send,
    Fut: std::future::Future<Output = Result<R>> + Send,
    R: Send,
{
    let settings = config()?;
    match AuditService::from_config(settings) {
        Ok(service) => f(Arc::new(service)).await,
        Err(e) => {
            println!("❌ Failed to initialize audit client: {e}");
            Err(e.into())
        }
    }
}

pub async fn show_how_to_get_started() -> Result<()> {
    println!("🏥 Clinic Scheduler - Provider routing with an audit trail");
    println!();
    println!("To get started:");
    println!("  📋 clinic-scheduler schedule         # Walk the scheduling workflow");
    println!("  🧮 clinic-scheduler quid6 <answers>  # Score a QUID-6 questionnaire");
    println!("  🔎 clinic-scheduler lookup <key>     # Retrieve a stored decision trail");
    println!();
    println!("Admin commands:");
    println!("  🗂️  clinic-scheduler records          # List stored audit records");
    println!("  📊 clinic-scheduler stats            # Audit storage statistics");
    println!("  🩺 clinic-scheduler health           # Check the audit API");
    println!("  ⚙️  clinic-scheduler config           # Show or export the configuration");
    println!();
    println!("💡 Start with 'clinic-scheduler schedule' to route your first patient!");
    Ok(())
}
