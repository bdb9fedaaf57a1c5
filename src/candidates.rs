use itertools::Itertools;
use log::{debug, info, trace};
use std::collections::{BTreeMap, HashMap};

use crate::catalog::{CatalogReader, PrerequisiteKind};
use crate::data::{ClassroomId, PeriodId, ProfessorId, Section, SectionId, StudentContext, SubjectId};

/// The candidate sections for one planning run.
///
/// Holds the raw offer (`all`, used for diagnostics) and the pre-filtered
/// list the solvers work on, plus groupings of the filtered list by
/// subject, professor, and classroom. Grouping values are indices into
/// `filtered`, sorted by section id.
#[derive(Debug, Clone)]
pub struct CandidatePool {
    all: Vec<Section>,
    filtered: Vec<Section>,
    by_subject: BTreeMap<SubjectId, Vec<usize>>,
    by_professor: BTreeMap<ProfessorId, Vec<usize>>,
    by_classroom: BTreeMap<ClassroomId, Vec<usize>>,
    all_by_subject: BTreeMap<SubjectId, Vec<usize>>,
    index_by_id: HashMap<SectionId, usize>,
}

impl CandidatePool {
    /// Pulls the candidate sections for the student's desired subjects and
    /// applies the pre-filter: sections with no open seats and sections
    /// whose obligatory prerequisites the student has not approved are
    /// dropped. Corequisite prerequisites never block here; they are
    /// allowed to ride along in the same run.
    pub fn load<C: CatalogReader>(
        catalog: &C,
        student: &StudentContext,
        period_id: PeriodId,
    ) -> Self {
        let mut all = Vec::new();
        for &subject_id in &student.desired_subject_ids {
            let sections = catalog.sections_for(subject_id, period_id);
            debug!(
                "subject {}: {} sections offered in period {}",
                subject_id,
                sections.len(),
                period_id
            );
            all.extend(sections);
        }

        let mut prereq_ok: HashMap<SubjectId, bool> = HashMap::new();
        let mut filtered = Vec::new();
        for section in &all {
            if section.available_seats() == 0 {
                trace!("section {} dropped: no available seats", section.id);
                continue;
            }
            let ok = *prereq_ok
                .entry(section.subject_id)
                .or_insert_with(|| prerequisites_met(catalog, student, section.subject_id));
            if !ok {
                trace!(
                    "section {} dropped: unmet obligatory prerequisite for subject {}",
                    section.id, section.subject_id
                );
                continue;
            }
            filtered.push(section.clone());
        }

        info!(
            "candidate pool: {} sections offered, {} after pre-filter",
            all.len(),
            filtered.len()
        );
        Self::new(all, filtered)
    }

    /// Builds a pool from already-loaded sections. `filtered` is the set
    /// the solvers may choose from; `all` is the raw offer kept around for
    /// diagnostics. Callers normally go through [`CandidatePool::load`].
    pub fn new(mut all: Vec<Section>, mut filtered: Vec<Section>) -> Self {
        all.sort_by_key(|s| s.id);
        filtered.sort_by_key(|s| s.id);

        let by_subject = group_sorted(filtered.iter().enumerate().map(|(i, s)| (s.subject_id, i)));
        let by_professor =
            group_sorted(filtered.iter().enumerate().map(|(i, s)| (s.professor_id, i)));
        let by_classroom =
            group_sorted(filtered.iter().enumerate().map(|(i, s)| (s.classroom_id, i)));
        let all_by_subject = group_sorted(all.iter().enumerate().map(|(i, s)| (s.subject_id, i)));
        let index_by_id = all.iter().enumerate().map(|(i, s)| (s.id, i)).collect();

        Self {
            all,
            filtered,
            by_subject,
            by_professor,
            by_classroom,
            all_by_subject,
            index_by_id,
        }
    }

    /// The raw offer, pre-filter-inclusive.
    pub fn all(&self) -> &[Section] {
        &self.all
    }

    /// The pre-filtered candidates the solvers work on.
    pub fn filtered(&self) -> &[Section] {
        &self.filtered
    }

    /// Indices into [`CandidatePool::filtered`] for one subject.
    pub fn filtered_indices_for(&self, subject_id: SubjectId) -> &[usize] {
        self.by_subject
            .get(&subject_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Filtered candidate sections of one subject, in id order.
    pub fn filtered_for(&self, subject_id: SubjectId) -> impl Iterator<Item = &Section> {
        self.filtered_indices_for(subject_id)
            .iter()
            .map(move |&i| &self.filtered[i])
    }

    /// All candidate sections of one subject (pre-filter-inclusive), in id
    /// order.
    pub fn candidates_for(&self, subject_id: SubjectId) -> impl Iterator<Item = &Section> {
        self.all_by_subject
            .get(&subject_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
            .iter()
            .map(move |&i| &self.all[i])
    }

    /// Resolves section ids against the raw offer.
    pub fn sections_by_ids(&self, ids: &[SectionId]) -> Vec<&Section> {
        ids.iter()
            .filter_map(|id| self.index_by_id.get(id).map(|&i| &self.all[i]))
            .collect()
    }

    /// Symmetric pairs of filtered candidates that overlap in time.
    pub fn overlapping_pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..self.filtered.len())
            .tuple_combinations()
            .filter(|&(i, j)| self.filtered[i].overlaps(&self.filtered[j]))
    }

    /// Overlapping pairs among candidates sharing a professor.
    pub fn professor_conflict_pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.by_professor
            .values()
            .flat_map(|indices| indices.iter().copied().tuple_combinations())
            .filter(|&(i, j)| self.filtered[i].overlaps(&self.filtered[j]))
    }

    /// Overlapping pairs among candidates sharing a classroom.
    pub fn classroom_conflict_pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.by_classroom
            .values()
            .flat_map(|indices| indices.iter().copied().tuple_combinations())
            .filter(|&(i, j)| self.filtered[i].overlaps(&self.filtered[j]))
    }
}

fn group_sorted<K: Ord + std::hash::Hash>(
    pairs: impl Iterator<Item = (K, usize)>,
) -> BTreeMap<K, Vec<usize>> {
    // into_group_map preserves push order; the inputs are id-sorted, so the
    // grouped index lists stay id-sorted too
    pairs.into_group_map().into_iter().collect()
}

fn prerequisites_met<C: CatalogReader>(
    catalog: &C,
    student: &StudentContext,
    subject_id: SubjectId,
) -> bool {
    catalog
        .prerequisites(subject_id)
        .iter()
        .all(|p| match p.kind {
            PrerequisiteKind::Obligatory => student.has_approved(p.prerequisite_subject_id),
            PrerequisiteKind::Corequisite => true,
        })
}
