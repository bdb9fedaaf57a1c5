use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::data::{PeriodId, ProgramId, Section, SectionId, StudentId, SubjectId};

/// How a prerequisite binds: obligatory prerequisites must already be
/// approved, corequisites may ride along in the same planning run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PrerequisiteKind {
    Obligatory,
    Corequisite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Prerequisite {
    pub prerequisite_subject_id: SubjectId,
    pub kind: PrerequisiteKind,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: SubjectId,
    pub program_id: ProgramId,
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub prerequisites: Vec<Prerequisite>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AcademicPeriod {
    pub id: PeriodId,
    pub name: String,
    pub active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GradeStatus {
    Approved,
    Failed,
    InProgress,
}

/// One row of a student's academic history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AcademicRecord {
    pub subject_id: SubjectId,
    pub status: GradeStatus,
}

/// Student lookup result: identity plus program membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StudentRecord {
    pub id: StudentId,
    pub program_id: ProgramId,
}

/// Read access to the course catalog for a planning run. The catalog is a
/// shared-immutable snapshot; the engine never writes through it.
pub trait CatalogReader {
    fn section(&self, id: SectionId) -> Option<Section>;
    fn sections_for(&self, subject_id: SubjectId, period_id: PeriodId) -> Vec<Section>;
    fn subject(&self, id: SubjectId) -> Option<Subject>;
    fn prerequisites(&self, subject_id: SubjectId) -> Vec<Prerequisite>;
    fn periods(&self) -> Vec<AcademicPeriod>;
    fn active_period(&self) -> Option<AcademicPeriod>;
}

/// Read access to student records and academic history.
pub trait StudentReader {
    fn student(&self, id: StudentId) -> Option<StudentRecord>;
    fn academic_history(&self, id: StudentId) -> Vec<AcademicRecord>;
}

/// A section as offered in a concrete academic period.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferedSection {
    pub academic_period_id: PeriodId,
    #[serde(flatten)]
    pub section: Section,
}

/// The complete catalog state for a planning request, as one
/// self-contained serde value.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSnapshot {
    #[serde(default)]
    pub periods: Vec<AcademicPeriod>,
    #[serde(default)]
    pub subjects: Vec<Subject>,
    #[serde(default)]
    pub sections: Vec<OfferedSection>,
    #[serde(default)]
    pub students: Vec<StudentEntry>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentEntry {
    pub id: StudentId,
    pub program_id: ProgramId,
    #[serde(default)]
    pub academic_history: Vec<AcademicRecord>,
}

/// Indexed, immutable catalog built from a [`CatalogSnapshot`]. Backs the
/// stateless HTTP surface and the test fixtures.
#[derive(Debug, Clone)]
pub struct InMemoryCatalog {
    subjects: HashMap<SubjectId, Subject>,
    sections_by_id: HashMap<SectionId, Section>,
    sections_by_offer: HashMap<(SubjectId, PeriodId), Vec<Section>>,
    periods: Vec<AcademicPeriod>,
    students: HashMap<StudentId, StudentEntry>,
}

impl InMemoryCatalog {
    pub fn new(snapshot: CatalogSnapshot) -> Self {
        let subjects = snapshot.subjects.into_iter().map(|s| (s.id, s)).collect();
        let mut sections_by_id = HashMap::new();
        let mut sections_by_offer: HashMap<(SubjectId, PeriodId), Vec<Section>> = HashMap::new();
        for offered in snapshot.sections {
            sections_by_id.insert(offered.section.id, offered.section.clone());
            sections_by_offer
                .entry((offered.section.subject_id, offered.academic_period_id))
                .or_default()
                .push(offered.section);
        }
        // deterministic per-offer ordering
        for sections in sections_by_offer.values_mut() {
            sections.sort_by_key(|s| s.id);
        }
        let students = snapshot.students.into_iter().map(|s| (s.id, s)).collect();
        Self {
            subjects,
            sections_by_id,
            sections_by_offer,
            periods: snapshot.periods,
            students,
        }
    }
}

impl CatalogReader for InMemoryCatalog {
    fn section(&self, id: SectionId) -> Option<Section> {
        self.sections_by_id.get(&id).cloned()
    }

    fn sections_for(&self, subject_id: SubjectId, period_id: PeriodId) -> Vec<Section> {
        self.sections_by_offer
            .get(&(subject_id, period_id))
            .cloned()
            .unwrap_or_default()
    }

    fn subject(&self, id: SubjectId) -> Option<Subject> {
        self.subjects.get(&id).cloned()
    }

    fn prerequisites(&self, subject_id: SubjectId) -> Vec<Prerequisite> {
        self.subjects
            .get(&subject_id)
            .map(|s| s.prerequisites.clone())
            .unwrap_or_default()
    }

    fn periods(&self) -> Vec<AcademicPeriod> {
        self.periods.clone()
    }

    fn active_period(&self) -> Option<AcademicPeriod> {
        self.periods.iter().find(|p| p.active).cloned()
    }
}

impl StudentReader for InMemoryCatalog {
    fn student(&self, id: StudentId) -> Option<StudentRecord> {
        self.students.get(&id).map(|s| StudentRecord {
            id: s.id,
            program_id: s.program_id,
        })
    }

    fn academic_history(&self, id: StudentId) -> Vec<AcademicRecord> {
        self.students
            .get(&id)
            .map(|s| s.academic_history.clone())
            .unwrap_or_default()
    }
}
