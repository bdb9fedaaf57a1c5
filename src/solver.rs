use good_lp::variable;
use good_lp::{
    Expression, ProblemVariables, ResolutionError, Solution, SolverModel, Variable, constraint,
    default_solver,
};
use log::{info, trace, warn};
use std::time::Instant;

use crate::candidates::CandidatePool;
use crate::config::EngineConfig;
use crate::data::{SectionId, StudentContext, SubjectId};
use crate::solution::SolverStatus;

/// What the feasibility phase decided, before diagnostics and scoring are
/// attached.
#[derive(Debug, Clone)]
pub struct FeasibilityOutcome {
    pub status: SolverStatus,
    /// Chosen section ids, empty unless the solve succeeded.
    pub selected: Vec<SectionId>,
}

impl FeasibilityOutcome {
    pub fn is_feasible(&self) -> bool {
        matches!(self.status, SolverStatus::Optimal | SolverStatus::Feasible)
    }
}

/// Solves the hard-constraint phase with the HiGHS ILP solver.
///
/// One binary variable per filtered candidate section decides attendance.
/// Hard constraints: at most one section per desired subject, no time
/// overlap between attended sections, none between sections sharing a
/// professor or a classroom, and no section without open seats. The
/// objective maximizes the number of desired subjects covered.
pub fn solve_feasibility(
    student: &StudentContext,
    pool: &CandidatePool,
    config: &EngineConfig,
) -> FeasibilityOutcome {
    let start_time = Instant::now();
    let sections = pool.filtered();

    if sections.is_empty() {
        return FeasibilityOutcome {
            status: SolverStatus::Infeasible,
            selected: Vec::new(),
        };
    }

    // model setup
    info!(
        "Setting up feasibility model with {} candidate sections for {} desired subjects",
        sections.len(),
        student.desired_subject_ids.len()
    );
    let mut problem = ProblemVariables::new();
    let section_vars = problem.add_vector(variable().binary(), sections.len());

    // y_g = 1 iff some section of desired subject g is attended
    let coverage_vars: Vec<(SubjectId, Variable)> = student
        .desired_subject_ids
        .iter()
        .filter(|&&subject_id| !pool.filtered_indices_for(subject_id).is_empty())
        .map(|&subject_id| (subject_id, problem.add(variable().binary())))
        .collect();

    let objective: Expression = coverage_vars.iter().map(|(_, var)| *var).sum();

    let mut model = problem
        .maximise(objective)
        .using(default_solver)
        .set_option("threads", 1) // limit to 1 thread for reproducibility
        .set_option("random_seed", 1234) //set seed for reproducibility
        .set_option("time_limit", config.solver_timeout.as_secs_f64());

    // at most one section per desired subject, linked to its coverage flag
    for (subject_id, cover) in &coverage_vars {
        let cover = *cover;
        let chosen: Expression = pool
            .filtered_indices_for(*subject_id)
            .iter()
            .map(|&i| section_vars[i])
            .sum();
        let per_subject = chosen.clone();
        model.add_constraint(constraint!(per_subject <= 1));
        model.add_constraint(constraint!(cover <= chosen));
    }

    // the student cannot attend two overlapping sections
    let mut pair_count = 0usize;
    for (i, j) in pool.overlapping_pairs() {
        let (a, b) = (section_vars[i], section_vars[j]);
        model.add_constraint(constraint!(a + b <= 1));
        pair_count += 1;
    }

    // a professor cannot teach two overlapping sections
    for (i, j) in pool.professor_conflict_pairs() {
        let (a, b) = (section_vars[i], section_vars[j]);
        model.add_constraint(constraint!(a + b <= 1));
        pair_count += 1;
    }

    // a classroom cannot host two overlapping sections
    for (i, j) in pool.classroom_conflict_pairs() {
        let (a, b) = (section_vars[i], section_vars[j]);
        model.add_constraint(constraint!(a + b <= 1));
        pair_count += 1;
    }
    trace!("added {} pairwise exclusivity constraints", pair_count);

    // redundant after pre-filtering, but the solver may be called on a
    // hand-built pool
    for (i, section) in sections.iter().enumerate() {
        if section.available_seats() == 0 {
            let var = section_vars[i];
            model.add_constraint(constraint!(var == 0));
        }
    }

    // solve
    match model.solve() {
        Ok(solution) => {
            let mut selected: Vec<SectionId> = sections
                .iter()
                .enumerate()
                .filter(|(i, _)| solution.value(section_vars[*i]) > 0.5)
                .map(|(_, s)| s.id)
                .collect();
            selected.sort_unstable();
            info!(
                "Feasibility solve finished in {:.2?}: {} of {} desired subjects covered",
                start_time.elapsed(),
                selected.len(),
                student.desired_subject_ids.len()
            );
            FeasibilityOutcome {
                status: SolverStatus::Optimal,
                selected,
            }
        }
        Err(ResolutionError::Infeasible) => {
            info!(
                "Feasibility solve proved infeasible in {:.2?}",
                start_time.elapsed()
            );
            FeasibilityOutcome {
                status: SolverStatus::Infeasible,
                selected: Vec::new(),
            }
        }
        Err(e) => {
            warn!("Feasibility solve ended without a solution: {}", e);
            FeasibilityOutcome {
                status: SolverStatus::Unknown,
                selected: Vec::new(),
            }
        }
    }
}
