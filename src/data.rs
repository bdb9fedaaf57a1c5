use serde::{Deserialize, Serialize};
use std::collections::HashSet;

// Type aliases for clarity
pub type SectionId = u32;
pub type SubjectId = u32;
pub type ProfessorId = u32;
pub type ClassroomId = u32;
pub type StudentId = u32;
pub type ProgramId = u32;
pub type PeriodId = u32;

/// A weekly time block: day of week (0 = Monday .. 6 = Sunday) plus start
/// and end as minutes since midnight. Intervals are half-open, so a block
/// ending at 10:00 does not overlap one starting at 10:00.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlot {
    pub day_of_week: u8,
    pub start_min: u16,
    pub end_min: u16,
}

impl TimeSlot {
    pub fn new(day_of_week: u8, start_min: u16, end_min: u16) -> Self {
        Self {
            day_of_week,
            start_min,
            end_min,
        }
    }

    /// Two slots overlap iff they fall on the same day and their minute
    /// intervals intersect.
    pub fn overlaps(&self, other: &TimeSlot) -> bool {
        if self.day_of_week != other.day_of_week {
            return false;
        }
        !(self.end_min <= other.start_min || other.end_min <= self.start_min)
    }

    /// Hour of day in which the slot starts.
    pub fn start_hour(&self) -> u16 {
        self.start_min / 60
    }
}

/// One offering of a subject in an academic period: a professor, a
/// classroom, a capacity/enrollment counter, and a fixed weekly pattern of
/// timeslots. Immutable during a planning run.
///
/// Subject code and name ride along so diagnostics can be produced without
/// another catalog round trip.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub id: SectionId,
    pub subject_id: SubjectId,
    pub subject_code: String,
    pub subject_name: String,
    pub professor_id: ProfessorId,
    pub classroom_id: ClassroomId,
    pub capacity: u32,
    pub enrolled: u32,
    pub section_number: u32,
    pub timeslots: Vec<TimeSlot>,
}

impl Section {
    /// Seats still open in this section.
    pub fn available_seats(&self) -> u32 {
        self.capacity.saturating_sub(self.enrolled)
    }

    /// True if any timeslot of `self` overlaps any timeslot of `other`.
    pub fn overlaps(&self, other: &Section) -> bool {
        self.timeslots
            .iter()
            .any(|a| other.timeslots.iter().any(|b| a.overlaps(b)))
    }
}

/// Everything the engine needs to know about the student for one planning
/// run: what they already approved and what they want to take.
#[derive(Debug, Clone)]
pub struct StudentContext {
    pub student_id: StudentId,
    pub program_id: ProgramId,
    pub approved_subject_ids: HashSet<SubjectId>,
    pub desired_subject_ids: Vec<SubjectId>,
}

impl StudentContext {
    pub fn has_approved(&self, subject_id: SubjectId) -> bool {
        self.approved_subject_ids.contains(&subject_id)
    }
}
