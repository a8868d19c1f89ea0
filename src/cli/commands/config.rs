use std::path::PathBuf;

use anyhow::Result;

use crate::config::{config, SchedulerConfig};

/// Print the effective configuration, or write it out as a starting config file
pub struct ConfigCommand {
    output: Option<PathBuf>,
}

impl ConfigCommand {
    pub fn new(output: Option<PathBuf>) -> Self {
        Self { output }
    }

    pub async fn execute(&self) -> Result<()> {
        let settings = config()?;
        self.export(settings)
    }

    fn export(&self, settings: &SchedulerConfig) -> Result<()> {
        match &self.output {
            Some(path) => {
                settings.save_to_file(path)?;
                tracing::info!(path = %path.display(), "Configuration written");
                println!("💾 Configuration written to {}", path.display());
            }
            None => print!("{}", settings.to_toml()?),
        }
        Ok(())
    }
}
