//! Common CLI types shared across actions

/// Output format options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Table format - human-readable (default)
    #[default]
    Table,
    /// JSON format - structured for scripts/APIs
    Json,
}
