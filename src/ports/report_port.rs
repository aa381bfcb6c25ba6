//! Report generation port trait.

use crate::domain::error::AnalyticsError;
use crate::domain::pipeline::PipelineOutput;
use std::path::Path;

/// Port for exporting the results of one pipeline run.
pub trait ReportPort {
    /// Write the report into `output_dir`, creating it if needed. Returns the
    /// paths written.
    fn write(
        &self,
        output: &PipelineOutput,
        output_dir: &Path,
    ) -> Result<Vec<std::path::PathBuf>, AnalyticsError>;
}
