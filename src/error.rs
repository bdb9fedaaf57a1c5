use thiserror::Error;

use crate::data::{StudentId, SubjectId};

/// Input errors raised before any solver work starts. Infeasibility is not
/// an error: it is reported inside the returned solution.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("student {0} not found")]
    StudentNotFound(StudentId),

    #[error("subjects outside the student's program: {0:?}")]
    SubjectOutsideProgram(Vec<SubjectId>),

    #[error("no active academic period")]
    NoActivePeriod,

    #[error("validation failed: {0}")]
    ValidationFailure(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn student_not_found_display() {
        let e = EngineError::StudentNotFound(42);
        assert_eq!(e.to_string(), "student 42 not found");
    }

    #[test]
    fn subject_outside_program_display() {
        let e = EngineError::SubjectOutsideProgram(vec![101, 102]);
        assert!(e.to_string().contains("101"));
        assert!(e.to_string().contains("102"));
    }

    #[test]
    fn no_active_period_display() {
        assert_eq!(
            EngineError::NoActivePeriod.to_string(),
            "no active academic period"
        );
    }

    #[test]
    fn validation_failure_display() {
        let e = EngineError::ValidationFailure("empty subject selection".to_string());
        assert_eq!(e.to_string(), "validation failed: empty subject selection");
    }
}
