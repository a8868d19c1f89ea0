use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub mod commands;

#[derive(Parser)]
#[command(name = "clinic-scheduler")]
#[command(about = "Route patients to the right provider and keep an audit trail of every decision")]
#[command(long_about = "Walks schedulers through the clinic's decision workflow, scores the QUID-6 \
                       incontinence questionnaire, and stores every completed path under a short audit \
                       key. Start with 'clinic-scheduler schedule'.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Walk the scheduling workflow interactively
    Schedule,
    /// Score a QUID-6 questionnaire without running the workflow
    Quid6 {
        /// Six answers 0-4 in question order, e.g. 432100
        #[arg(help = "Score string: six digits 0-4 in question order")]
        answers: String,
    },
    /// Look up a stored audit record by key
    Lookup {
        /// Audit key as printed at the end of a session
        key: String,
    },
    /// List stored audit records
    Records {
        #[arg(long, default_value = "100", help = "Maximum number of records to show")]
        limit: u32,
        #[arg(long, default_value = "0", help = "Number of records to skip")]
        offset: u32,
    },
    /// Show audit storage statistics
    Stats,
    /// Check that the audit persistence API is reachable
    Health,
    /// Show the effective configuration as TOML
    Config {
        #[arg(long, short, help = "Write the configuration to this file instead of printing it")]
        output: Option<PathBuf>,
    },
}
