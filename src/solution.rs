use serde::Serialize;
use std::fmt;

use crate::data::{SectionId, StudentId, SubjectId};
use crate::diagnostics::UnassignedSubject;

/// Closed set of solver status tags a planning run can end with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SolverStatus {
    Optimal,
    Feasible,
    Infeasible,
    Unknown,
    Cancelled,
    HybridOptimized,
    HybridCpBest,
    HybridCpFallback,
}

impl fmt::Display for SolverStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            SolverStatus::Optimal => "OPTIMAL",
            SolverStatus::Feasible => "FEASIBLE",
            SolverStatus::Infeasible => "INFEASIBLE",
            SolverStatus::Unknown => "UNKNOWN",
            SolverStatus::Cancelled => "CANCELLED",
            SolverStatus::HybridOptimized => "HYBRID_OPTIMIZED",
            SolverStatus::HybridCpBest => "HYBRID_CP_BEST",
            SolverStatus::HybridCpFallback => "HYBRID_CP_FALLBACK",
        };
        write!(f, "{}", tag)
    }
}

/// The final output of a planning run.
///
/// Infeasibility is reported here, not as an error: `feasible == false`
/// comes with an empty selection and at least one conflict message.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleSolution {
    pub student_id: StudentId,
    pub feasible: bool,
    pub selected_section_ids: Vec<SectionId>,
    pub covered_subject_ids: Vec<SubjectId>,
    pub unassigned_subjects: Vec<UnassignedSubject>,
    /// Wall-clock seconds from the start of the run to the result.
    pub processing_time: f64,
    pub conflicts: Vec<String>,
    pub solver_status: SolverStatus,
    /// Soft-constraint quality of the selection, lower is better. `None`
    /// when no selection was evaluated.
    pub quality_score: Option<f64>,
}

impl ScheduleSolution {
    /// A run that produced no schedule. Guarantees a non-empty conflict
    /// list so callers always see a root cause.
    pub fn infeasible(
        student_id: StudentId,
        status: SolverStatus,
        mut conflicts: Vec<String>,
    ) -> Self {
        if conflicts.is_empty() {
            conflicts.push("no feasible schedule found".to_string());
        }
        Self {
            student_id,
            feasible: false,
            selected_section_ids: Vec::new(),
            covered_subject_ids: Vec::new(),
            unassigned_subjects: Vec::new(),
            processing_time: 0.0,
            conflicts,
            solver_status: status,
            quality_score: None,
        }
    }
}
