//! Read-only views rendered by the shell

use classbook_store::{Document, DocumentStatus};
use classbook_util::{DocumentId, SessionId, SubjectName, UserId};

/// One line of the teacher's attendance overview
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceSummaryRow {
    pub subject: SubjectName,
    pub session: SessionId,
    pub present: usize,
    /// Directory students not marked present
    pub absent: usize,
}

/// Teacher's grade overview: one column per student
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradeTable {
    pub students: Vec<UserId>,
    pub rows: Vec<GradeTableRow>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradeTableRow {
    pub subject: SubjectName,
    pub session: SessionId,
    /// Aligned with [`GradeTable::students`]
    pub grades: Vec<Option<i64>>,
}

/// A student's attendance state within one session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterEntry {
    pub student: UserId,
    pub present: bool,
}

/// A student's grade within one session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradeEntry {
    pub student: UserId,
    pub grade: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentAttendanceRow {
    pub subject: SubjectName,
    pub session: SessionId,
    pub present: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentGradeRow {
    pub subject: SubjectName,
    pub session: SessionId,
    pub grade: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRow {
    pub student: UserId,
    pub name: String,
    pub status: DocumentStatus,
}

/// A document waiting for the teacher, addressed by its stable id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingReview {
    pub student: UserId,
    pub document: DocumentId,
    pub name: String,
}

impl DocumentRow {
    pub(crate) fn new(student: &UserId, doc: &Document) -> Self {
        Self {
            student: student.clone(),
            name: doc.name.clone(),
            status: doc.status,
        }
    }
}

impl PendingReview {
    pub(crate) fn new(student: &UserId, doc: &Document) -> Self {
        Self {
            student: student.clone(),
            document: doc.id,
            name: doc.name.clone(),
        }
    }
}
