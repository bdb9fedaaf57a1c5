use serde::Serialize;

use crate::candidates::CandidatePool;
use crate::data::{Section, SectionId, StudentContext, SubjectId};

pub const REASON_NO_CANDIDATES: &str = "no candidate sections";
pub const REASON_ALL_CONFLICT: &str = "all sections conflict with already-assigned";
pub const REASON_PARTIAL_CONFLICTS: &str = "partial conflicts";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    TimeOverlap,
}

/// One chosen section that an excluded candidate collides with.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictRecord {
    pub section_id: SectionId,
    pub subject_id: SubjectId,
    pub subject_code: String,
    pub subject_name: String,
    pub conflict_type: ConflictKind,
}

/// A candidate section of an unassigned subject, with every chosen section
/// it overlaps.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateConflicts {
    pub section_id: SectionId,
    pub section_number: u32,
    pub conflicts_with: Vec<ConflictRecord>,
}

/// Why a desired subject ended up without a section.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnassignedSubject {
    pub subject_id: SubjectId,
    pub subject_code: String,
    pub subject_name: String,
    pub reason: String,
    pub conflicting_sections: Vec<CandidateConflicts>,
}

/// Splits the desired subjects into covered and unassigned, explaining each
/// unassigned one.
///
/// The conflict breakdown runs against the raw offer (pre-filter-inclusive)
/// so the caller can see why a reasonable-looking section was excluded. A
/// subject with no candidates left after pre-filtering is reported as
/// having no candidate sections at all.
pub fn analyze_unassigned(
    student: &StudentContext,
    pool: &CandidatePool,
    selected: &[SectionId],
) -> (Vec<SubjectId>, Vec<UnassignedSubject>) {
    let chosen = pool.sections_by_ids(selected);

    let mut covered = Vec::new();
    let mut unassigned = Vec::new();
    for &subject_id in &student.desired_subject_ids {
        if chosen.iter().any(|s| s.subject_id == subject_id) {
            covered.push(subject_id);
        } else {
            unassigned.push(explain_subject(subject_id, pool, &chosen));
        }
    }
    (covered, unassigned)
}

fn explain_subject(
    subject_id: SubjectId,
    pool: &CandidatePool,
    chosen: &[&Section],
) -> UnassignedSubject {
    let candidates: Vec<&Section> = pool.candidates_for(subject_id).collect();
    let (subject_code, subject_name) = match candidates.first() {
        Some(section) => (section.subject_code.clone(), section.subject_name.clone()),
        None => (format!("SUB{subject_id}"), format!("subject {subject_id}")),
    };

    if pool.filtered_indices_for(subject_id).is_empty() {
        return UnassignedSubject {
            subject_id,
            subject_code,
            subject_name,
            reason: REASON_NO_CANDIDATES.to_string(),
            conflicting_sections: Vec::new(),
        };
    }

    let mut conflicting_sections = Vec::new();
    let mut all_conflict = true;
    for candidate in &candidates {
        let conflicts_with: Vec<ConflictRecord> = chosen
            .iter()
            .filter(|assigned| candidate.overlaps(assigned))
            .map(|assigned| ConflictRecord {
                section_id: assigned.id,
                subject_id: assigned.subject_id,
                subject_code: assigned.subject_code.clone(),
                subject_name: assigned.subject_name.clone(),
                conflict_type: ConflictKind::TimeOverlap,
            })
            .collect();
        if conflicts_with.is_empty() {
            all_conflict = false;
        } else {
            conflicting_sections.push(CandidateConflicts {
                section_id: candidate.id,
                section_number: candidate.section_number,
                conflicts_with,
            });
        }
    }

    let reason = if all_conflict && !conflicting_sections.is_empty() {
        REASON_ALL_CONFLICT
    } else {
        REASON_PARTIAL_CONFLICTS
    };

    UnassignedSubject {
        subject_id,
        subject_code,
        subject_name,
        reason: reason.to_string(),
        conflicting_sections,
    }
}

/// Human-readable root causes for a run with no feasible schedule at all.
pub fn infeasibility_conflicts(student: &StudentContext, pool: &CandidatePool) -> Vec<String> {
    let mut conflicts = Vec::new();

    let seatless = pool
        .all()
        .iter()
        .filter(|s| s.available_seats() == 0)
        .count();
    if seatless > 0 {
        conflicts.push(format!("{seatless} sections with no available seats"));
    }

    let missing = student
        .desired_subject_ids
        .iter()
        .filter(|&&subject_id| pool.candidates_for(subject_id).next().is_none())
        .count();
    if missing > 0 {
        conflicts.push(format!(
            "no sections available for {missing} desired subjects"
        ));
    }

    let overlapping = pool.overlapping_pairs().count();
    if overlapping > 0 {
        conflicts.push(format!(
            "{overlapping} pairs of sections have unresolvable time overlap"
        ));
    }

    if conflicts.is_empty() {
        conflicts.push("no feasible schedule found".to_string());
    }
    conflicts
}
