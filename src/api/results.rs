use crate::drift::DriftReport;
use crate::model::{Diagnostic, DiagnosticKind};
use crate::report::{exit_status, Check, ExitStatus};

/// Result of a verification run.
#[derive(Debug, Clone)]
pub struct VerifyResult {
    /// Comparison of the three snapshots, already filtered
    pub report: DriftReport,
    /// Everything the extractors skipped, in extraction order
    pub diagnostics: Vec<Diagnostic>,
    /// Comparisons the run was asked for
    pub check: Check,
}

impl VerifyResult {
    pub fn status(&self) -> ExitStatus {
        exit_status(&self.report, self.check)
    }

    pub fn passed(&self) -> bool {
        self.status() == ExitStatus::Clean
    }

    pub fn diagnostics_of(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(move |d| d.kind == kind)
    }
}
