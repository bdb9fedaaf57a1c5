use log::{info, warn};
use serde::Deserialize;
use std::collections::HashSet;
use std::time::Instant;

use crate::candidates::CandidatePool;
use crate::catalog::{CatalogReader, GradeStatus, StudentReader};
use crate::config::{EngineConfig, OptimizationLevel};
use crate::data::{PeriodId, SectionId, StudentContext, StudentId, SubjectId};
use crate::diagnostics;
use crate::error::EngineError;
use crate::fitness;
use crate::genetic::{GaParams, GeneticOptimizer};
use crate::solution::{ScheduleSolution, SolverStatus};
use crate::solver;

/// One planning request: the student, what they want to take, optionally a
/// period (the active one is used otherwise), and how hard to optimize.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub student_id: StudentId,
    pub desired_subject_ids: Vec<SubjectId>,
    #[serde(default)]
    pub academic_period_id: Option<PeriodId>,
    #[serde(default)]
    pub optimization_level: OptimizationLevel,
}

/// Two-phase planning engine over read-only catalog and student views.
///
/// Phase one maximizes subject coverage under the hard constraints; phase
/// two (optional) refines the weekly layout with the genetic optimizer and
/// keeps whichever solution scores better.
pub struct ScheduleEngine<'a, C: CatalogReader, S: StudentReader> {
    catalog: &'a C,
    students: &'a S,
    config: EngineConfig,
}

impl<'a, C: CatalogReader, S: StudentReader> ScheduleEngine<'a, C, S> {
    pub fn new(catalog: &'a C, students: &'a S) -> Self {
        Self {
            catalog,
            students,
            config: EngineConfig::default(),
        }
    }

    pub fn with_config(catalog: &'a C, students: &'a S, config: EngineConfig) -> Self {
        Self {
            catalog,
            students,
            config,
        }
    }

    /// Runs one planning request to completion and returns a
    /// self-contained solution. Only input problems surface as errors;
    /// everything else (infeasibility, timeouts, cancellation) is encoded
    /// in the solution itself.
    pub fn generate(&self, request: &GenerateRequest) -> Result<ScheduleSolution, EngineError> {
        let run_start = Instant::now();

        let student = self.load_student(request)?;
        let period_id = self.resolve_period(request)?;
        info!(
            "planning run: student {}, {} desired subjects, period {}, level {:?}",
            student.student_id,
            student.desired_subject_ids.len(),
            period_id,
            request.optimization_level
        );

        let pool = CandidatePool::load(self.catalog, &student, period_id);

        if pool.all().is_empty() {
            let conflicts = vec![format!(
                "no sections available for {} desired subjects",
                student.desired_subject_ids.len()
            )];
            return Ok(self.infeasible_solution(&student, &pool, run_start, conflicts));
        }
        if pool.filtered().is_empty() {
            let conflicts = vec![
                "all candidate sections were filtered out (no seats or unmet prerequisites)"
                    .to_string(),
            ];
            return Ok(self.infeasible_solution(&student, &pool, run_start, conflicts));
        }

        // phase 1: hard constraints, maximum coverage
        let cp = solver::solve_feasibility(&student, &pool, &self.config);
        if self.config.cancel.is_cancelled() {
            return Ok(self.cancelled_solution(&student, run_start));
        }
        if !cp.is_feasible() {
            let conflicts = diagnostics::infeasibility_conflicts(&student, &pool);
            let mut solution =
                ScheduleSolution::infeasible(student.student_id, cp.status, conflicts);
            solution.processing_time = run_start.elapsed().as_secs_f64();
            return Ok(solution);
        }

        let cp_fitness = fitness::score(pool.sections_by_ids(&cp.selected));
        info!(
            "phase 1 complete: {} sections selected, fitness {:.2}",
            cp.selected.len(),
            cp_fitness
        );

        if request.optimization_level == OptimizationLevel::None {
            return Ok(self.feasible_solution(&student, &pool, run_start, cp.selected, cp.status, cp_fitness));
        }

        // phase 2: soft-constraint refinement
        let params = GaParams::for_level(request.optimization_level);
        let seed = self.config.seed.unwrap_or_else(rand::random);
        let mut optimizer = GeneticOptimizer::new(&student, &pool, params, seed);
        let ga = optimizer.run(&self.config.cancel);
        if self.config.cancel.is_cancelled() {
            return Ok(self.cancelled_solution(&student, run_start));
        }

        if ga.best.is_empty() {
            warn!("genetic phase produced no feasible individual, keeping phase 1 solution");
            return Ok(self.feasible_solution(
                &student,
                &pool,
                run_start,
                cp.selected,
                SolverStatus::HybridCpFallback,
                cp_fitness,
            ));
        }

        if ga.best_fitness < cp_fitness {
            info!(
                "genetic phase improved fitness by {:.2} points",
                cp_fitness - ga.best_fitness
            );
            Ok(self.feasible_solution(
                &student,
                &pool,
                run_start,
                ga.best,
                SolverStatus::HybridOptimized,
                ga.best_fitness,
            ))
        } else {
            info!("phase 1 solution was already as good or better");
            Ok(self.feasible_solution(
                &student,
                &pool,
                run_start,
                cp.selected,
                SolverStatus::HybridCpBest,
                cp_fitness,
            ))
        }
    }

    fn load_student(&self, request: &GenerateRequest) -> Result<StudentContext, EngineError> {
        if request.desired_subject_ids.is_empty() {
            return Err(EngineError::ValidationFailure(
                "no desired subjects given".to_string(),
            ));
        }

        let record = self
            .students
            .student(request.student_id)
            .ok_or(EngineError::StudentNotFound(request.student_id))?;

        // deduplicate while keeping the caller's order
        let mut seen = HashSet::new();
        let desired: Vec<SubjectId> = request
            .desired_subject_ids
            .iter()
            .copied()
            .filter(|id| seen.insert(*id))
            .collect();

        let outside: Vec<SubjectId> = desired
            .iter()
            .copied()
            .filter(|&subject_id| {
                self.catalog
                    .subject(subject_id)
                    .is_none_or(|s| s.program_id != record.program_id)
            })
            .collect();
        if !outside.is_empty() {
            return Err(EngineError::SubjectOutsideProgram(outside));
        }

        let approved = self
            .students
            .academic_history(request.student_id)
            .into_iter()
            .filter(|r| r.status == GradeStatus::Approved)
            .map(|r| r.subject_id)
            .collect();

        Ok(StudentContext {
            student_id: record.id,
            program_id: record.program_id,
            approved_subject_ids: approved,
            desired_subject_ids: desired,
        })
    }

    fn resolve_period(&self, request: &GenerateRequest) -> Result<PeriodId, EngineError> {
        match request.academic_period_id {
            Some(period_id) => {
                if self.catalog.periods().iter().any(|p| p.id == period_id) {
                    Ok(period_id)
                } else {
                    Err(EngineError::ValidationFailure(format!(
                        "academic period {period_id} not found"
                    )))
                }
            }
            None => self
                .catalog
                .active_period()
                .map(|p| p.id)
                .ok_or(EngineError::NoActivePeriod),
        }
    }

    fn feasible_solution(
        &self,
        student: &StudentContext,
        pool: &CandidatePool,
        run_start: Instant,
        mut selected: Vec<SectionId>,
        status: SolverStatus,
        quality_score: f64,
    ) -> ScheduleSolution {
        selected.sort_unstable();
        let (covered, unassigned) = diagnostics::analyze_unassigned(student, pool, &selected);
        ScheduleSolution {
            student_id: student.student_id,
            feasible: true,
            selected_section_ids: selected,
            covered_subject_ids: covered,
            unassigned_subjects: unassigned,
            processing_time: run_start.elapsed().as_secs_f64(),
            conflicts: Vec::new(),
            solver_status: status,
            quality_score: Some(quality_score),
        }
    }

    fn infeasible_solution(
        &self,
        student: &StudentContext,
        pool: &CandidatePool,
        run_start: Instant,
        conflicts: Vec<String>,
    ) -> ScheduleSolution {
        let mut solution =
            ScheduleSolution::infeasible(student.student_id, SolverStatus::Infeasible, conflicts);
        let (covered, unassigned) = diagnostics::analyze_unassigned(student, pool, &[]);
        solution.covered_subject_ids = covered;
        solution.unassigned_subjects = unassigned;
        solution.processing_time = run_start.elapsed().as_secs_f64();
        solution
    }

    fn cancelled_solution(&self, student: &StudentContext, run_start: Instant) -> ScheduleSolution {
        warn!("planning run cancelled for student {}", student.student_id);
        let mut solution = ScheduleSolution::infeasible(
            student.student_id,
            SolverStatus::Cancelled,
            vec!["planning run cancelled".to_string()],
        );
        solution.processing_time = run_start.elapsed().as_secs_f64();
        solution
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{
        AcademicPeriod, AcademicRecord, CatalogSnapshot, InMemoryCatalog, OfferedSection,
        Prerequisite, PrerequisiteKind, StudentEntry, Subject,
    };
    use crate::data::{Section, TimeSlot};

    const PERIOD: PeriodId = 20;
    const STUDENT: StudentId = 7;

    fn subject(id: SubjectId, prerequisites: Vec<Prerequisite>) -> Subject {
        Subject {
            id,
            program_id: 1,
            code: format!("SUB{id}"),
            name: format!("Subject {id}"),
            prerequisites,
        }
    }

    fn section(id: SectionId, subject_id: SubjectId, enrolled: u32, slots: Vec<TimeSlot>) -> Section {
        Section {
            id,
            subject_id,
            subject_code: format!("SUB{subject_id}"),
            subject_name: format!("Subject {subject_id}"),
            professor_id: id,
            classroom_id: id,
            capacity: 30,
            enrolled,
            section_number: id,
            timeslots: slots,
        }
    }

    fn catalog(subjects: Vec<Subject>, sections: Vec<Section>) -> InMemoryCatalog {
        InMemoryCatalog::new(CatalogSnapshot {
            periods: vec![AcademicPeriod {
                id: PERIOD,
                name: "2026-1".to_string(),
                active: true,
            }],
            subjects,
            sections: sections
                .into_iter()
                .map(|s| OfferedSection {
                    academic_period_id: PERIOD,
                    section: s,
                })
                .collect(),
            students: vec![StudentEntry {
                id: STUDENT,
                program_id: 1,
                academic_history: vec![AcademicRecord {
                    subject_id: 100,
                    status: GradeStatus::Approved,
                }],
            }],
        })
    }

    fn request(desired: Vec<SubjectId>, level: OptimizationLevel) -> GenerateRequest {
        GenerateRequest {
            student_id: STUDENT,
            desired_subject_ids: desired,
            academic_period_id: None,
            optimization_level: level,
        }
    }

    #[test]
    fn unknown_student_is_an_input_error() {
        let catalog = catalog(vec![subject(101, vec![])], vec![]);
        let engine = ScheduleEngine::new(&catalog, &catalog);
        let mut req = request(vec![101], OptimizationLevel::None);
        req.student_id = 999;
        assert_eq!(
            engine.generate(&req).unwrap_err(),
            EngineError::StudentNotFound(999)
        );
    }

    #[test]
    fn subject_outside_program_is_an_input_error() {
        let mut foreign = subject(205, vec![]);
        foreign.program_id = 2;
        let catalog = catalog(vec![subject(101, vec![]), foreign], vec![]);
        let engine = ScheduleEngine::new(&catalog, &catalog);
        let err = engine
            .generate(&request(vec![101, 205], OptimizationLevel::None))
            .unwrap_err();
        assert_eq!(err, EngineError::SubjectOutsideProgram(vec![205]));
    }

    #[test]
    fn missing_active_period_is_an_input_error() {
        let snapshot = CatalogSnapshot {
            periods: vec![AcademicPeriod {
                id: PERIOD,
                name: "2026-1".to_string(),
                active: false,
            }],
            subjects: vec![subject(101, vec![])],
            sections: vec![],
            students: vec![StudentEntry {
                id: STUDENT,
                program_id: 1,
                academic_history: vec![],
            }],
        };
        let catalog = InMemoryCatalog::new(snapshot);
        let engine = ScheduleEngine::new(&catalog, &catalog);
        let err = engine
            .generate(&request(vec![101], OptimizationLevel::None))
            .unwrap_err();
        assert_eq!(err, EngineError::NoActivePeriod);
    }

    #[test]
    fn empty_desired_set_fails_validation() {
        let catalog = catalog(vec![subject(101, vec![])], vec![]);
        let engine = ScheduleEngine::new(&catalog, &catalog);
        let err = engine
            .generate(&request(vec![], OptimizationLevel::None))
            .unwrap_err();
        assert!(matches!(err, EngineError::ValidationFailure(_)));
    }

    #[test]
    fn no_offer_yields_infeasible_with_diagnostics() {
        let catalog = catalog(vec![subject(101, vec![])], vec![]);
        let engine = ScheduleEngine::new(&catalog, &catalog);
        let solution = engine
            .generate(&request(vec![101], OptimizationLevel::None))
            .unwrap();
        assert!(!solution.feasible);
        assert_eq!(solution.solver_status, SolverStatus::Infeasible);
        assert!(!solution.conflicts.is_empty());
        assert_eq!(solution.unassigned_subjects.len(), 1);
        assert_eq!(
            solution.unassigned_subjects[0].reason,
            diagnostics::REASON_NO_CANDIDATES
        );
    }

    #[test]
    fn unmet_prerequisite_yields_infeasible() {
        let prereq = Prerequisite {
            prerequisite_subject_id: 150,
            kind: PrerequisiteKind::Obligatory,
        };
        let catalog = catalog(
            vec![subject(101, vec![prereq])],
            vec![section(1, 101, 0, vec![TimeSlot::new(0, 480, 600)])],
        );
        let engine = ScheduleEngine::new(&catalog, &catalog);
        let solution = engine
            .generate(&request(vec![101], OptimizationLevel::None))
            .unwrap();
        assert!(!solution.feasible);
        assert_eq!(solution.solver_status, SolverStatus::Infeasible);
        assert_eq!(
            solution.unassigned_subjects[0].reason,
            diagnostics::REASON_NO_CANDIDATES
        );
    }

    #[test]
    fn level_none_returns_the_feasibility_solution() {
        let catalog = catalog(
            vec![subject(101, vec![])],
            vec![
                section(1, 101, 0, vec![TimeSlot::new(0, 480, 600)]),
                section(2, 101, 0, vec![TimeSlot::new(1, 480, 600)]),
            ],
        );
        let engine = ScheduleEngine::new(&catalog, &catalog);
        let solution = engine
            .generate(&request(vec![101], OptimizationLevel::None))
            .unwrap();
        assert!(solution.feasible);
        assert_eq!(solution.solver_status, SolverStatus::Optimal);
        assert_eq!(solution.selected_section_ids.len(), 1);
        assert_eq!(solution.covered_subject_ids, vec![101]);
        assert!(solution.unassigned_subjects.is_empty());
        let chosen = solution.selected_section_ids.clone();
        assert!(chosen == vec![1] || chosen == vec![2]);
        assert!(solution.quality_score.is_some());
    }

    #[test]
    fn hybrid_run_tags_the_winning_phase() {
        let catalog = catalog(
            vec![subject(101, vec![]), subject(102, vec![])],
            vec![
                section(1, 101, 0, vec![TimeSlot::new(0, 480, 600)]), // Mon 08-10
                section(2, 101, 0, vec![TimeSlot::new(0, 840, 960)]), // Mon 14-16
                section(3, 102, 0, vec![TimeSlot::new(0, 600, 720)]), // Mon 10-12
            ],
        );
        let mut config = EngineConfig::default();
        config.seed = Some(42);
        let engine = ScheduleEngine::with_config(&catalog, &catalog, config);
        let solution = engine
            .generate(&request(vec![101, 102], OptimizationLevel::Medium))
            .unwrap();
        assert!(solution.feasible);
        assert!(matches!(
            solution.solver_status,
            SolverStatus::HybridOptimized | SolverStatus::HybridCpBest
        ));
        assert_eq!(solution.selected_section_ids, vec![1, 3]);
        // reported score matches a recomputation over the selection
        let sections: Vec<Section> = solution
            .selected_section_ids
            .iter()
            .map(|&id| {
                crate::catalog::CatalogReader::section(&catalog, id).unwrap()
            })
            .collect();
        let recomputed = fitness::score(&sections);
        assert!((solution.quality_score.unwrap() - recomputed).abs() < 1e-9);
    }

    #[test]
    fn cancelled_before_ga_reports_cancelled() {
        let catalog = catalog(
            vec![subject(101, vec![])],
            vec![section(1, 101, 0, vec![TimeSlot::new(0, 480, 600)])],
        );
        let config = EngineConfig::default();
        config.cancel.cancel();
        let engine = ScheduleEngine::with_config(&catalog, &catalog, config);
        let solution = engine
            .generate(&request(vec![101], OptimizationLevel::Low))
            .unwrap();
        assert!(!solution.feasible);
        assert_eq!(solution.solver_status, SolverStatus::Cancelled);
        assert!(!solution.conflicts.is_empty());
    }

    #[test]
    fn identical_requests_with_a_fixed_seed_are_reproducible() {
        let catalog = catalog(
            vec![subject(101, vec![]), subject(102, vec![])],
            vec![
                section(1, 101, 0, vec![TimeSlot::new(0, 480, 600)]),
                section(2, 101, 0, vec![TimeSlot::new(2, 840, 960)]),
                section(3, 102, 0, vec![TimeSlot::new(0, 600, 720)]),
                section(4, 102, 0, vec![TimeSlot::new(3, 480, 600)]),
            ],
        );
        let mut config = EngineConfig::default();
        config.seed = Some(9);
        let engine = ScheduleEngine::with_config(&catalog, &catalog, config.clone());
        let req = request(vec![101, 102], OptimizationLevel::Low);

        let first = engine.generate(&req).unwrap();
        let second = engine.generate(&req).unwrap();
        assert_eq!(first.selected_section_ids, second.selected_section_ids);
        assert_eq!(first.covered_subject_ids, second.covered_subject_ids);
        assert_eq!(first.solver_status, second.solver_status);
        assert_eq!(first.quality_score, second.quality_score);
    }
}
