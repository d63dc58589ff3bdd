// src/ui/mod.rs

use std::io::Write;

use crate::core::error::ReconError;
use crate::core::models::DomainReport;
use crate::core::pricing::PricingAnalysis;
use crate::core::threat::ThreatAssessment;

mod sections;

/// Presents a finished report to the user.
pub trait ReportRenderer: Send + Sync {
    fn render(
        &self,
        report: &DomainReport,
        assessment: &ThreatAssessment,
        pricing: Option<&PricingAnalysis>,
    ) -> Result<(), ReconError>;
}

/// Writes a styled block per domain to stdout.
pub struct ConsoleRenderer {
    verbose: bool,
}

impl ConsoleRenderer {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl ReportRenderer for ConsoleRenderer {
    fn render(
        &self,
        report: &DomainReport,
        assessment: &ThreatAssessment,
        pricing: Option<&PricingAnalysis>,
    ) -> Result<(), ReconError> {
        // Built in full first so concurrent domains never interleave.
        let block = sections::format_report(report, assessment, pricing, self.verbose);
        let mut stdout = std::io::stdout().lock();
        stdout
            .write_all(block.as_bytes())
            .and_then(|_| stdout.flush())
            .map_err(|e| ReconError::Render {
                domain: report.domain.clone(),
                reason: e.to_string(),
            })
    }
}

/// Renders nothing; used with `--quiet`.
pub struct QuietRenderer;

impl ReportRenderer for QuietRenderer {
    fn render(
        &self,
        _report: &DomainReport,
        _assessment: &ThreatAssessment,
        _pricing: Option<&PricingAnalysis>,
    ) -> Result<(), ReconError> {
        Ok(())
    }
}
