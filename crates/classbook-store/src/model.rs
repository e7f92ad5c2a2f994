//! In-memory ledger model
//!
//! The ledger mirrors the persisted JSON layout one to one:
//!
//! ```json
//! {
//!   "sessions":   { "<subject>": ["<session id>"] },
//!   "attendance": { "<subject>": { "<session id>": ["<student>"] } },
//!   "grades":     { "<subject>": { "<session id>": { "<student>": 5 } } },
//!   "documents":  { "<student>": [ { "id": "...", "name": "...", "status": "pending" } ] }
//! }
//! ```
//!
//! Mutations here are pure; [`crate::LedgerStore`] pairs each one with a save.

use chrono::NaiveDateTime;
use classbook_util::{DocumentId, SessionId, SubjectName, UserId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::warn;

use crate::{StoreError, StoreResult};

/// Present students of one session, in the order they were marked
pub type AttendanceList = Vec<UserId>;

/// Grades of one session; a missing key means "ungraded"
pub type GradeMap = BTreeMap<UserId, i64>;

/// Review state of a submitted document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    Pending,
    Approved,
    Rejected,
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentStatus::Pending => write!(f, "pending"),
            DocumentStatus::Approved => write!(f, "approved"),
            DocumentStatus::Rejected => write!(f, "rejected"),
        }
    }
}

/// Outcome of a teacher's review
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewDecision {
    Approve,
    Reject,
}

impl ReviewDecision {
    fn status(self) -> DocumentStatus {
        match self {
            ReviewDecision::Approve => DocumentStatus::Approved,
            ReviewDecision::Reject => DocumentStatus::Rejected,
        }
    }
}

/// A document submitted by a student
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Files written before ids existed get a fresh one on load
    #[serde(default)]
    pub id: DocumentId,
    pub name: String,
    pub status: DocumentStatus,
}

impl Document {
    pub fn pending(name: impl Into<String>) -> Self {
        Self {
            id: DocumentId::new(),
            name: name.into(),
            status: DocumentStatus::Pending,
        }
    }
}

/// The whole persisted record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ledger {
    #[serde(default)]
    pub sessions: BTreeMap<SubjectName, Vec<SessionId>>,

    #[serde(default)]
    pub attendance: BTreeMap<SubjectName, BTreeMap<SessionId, AttendanceList>>,

    #[serde(default)]
    pub grades: BTreeMap<SubjectName, BTreeMap<SessionId, GradeMap>>,

    #[serde(default)]
    pub documents: BTreeMap<UserId, Vec<Document>>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore the container invariants after loading.
    ///
    /// Every listed session gets (possibly empty) attendance and grade
    /// containers, and duplicate attendance marks collapse to the first one.
    /// Returns the number of repairs made.
    pub fn normalize(&mut self) -> usize {
        let mut repairs = 0;

        for (subject, sessions) in &self.sessions {
            let attendance = self.attendance.entry(subject.clone()).or_default();
            let grades = self.grades.entry(subject.clone()).or_default();

            for session in sessions {
                if !attendance.contains_key(session) {
                    attendance.insert(session.clone(), Vec::new());
                    repairs += 1;
                }
                if !grades.contains_key(session) {
                    grades.insert(session.clone(), GradeMap::new());
                    repairs += 1;
                }
            }
        }

        for (subject, by_session) in self.attendance.iter_mut() {
            for (session, present) in by_session.iter_mut() {
                let before = present.len();
                let mut seen = Vec::with_capacity(before);
                present.retain(|student| {
                    if seen.contains(student) {
                        false
                    } else {
                        seen.push(student.clone());
                        true
                    }
                });
                if present.len() != before {
                    warn!(
                        subject = %subject,
                        session = %session,
                        removed = before - present.len(),
                        "Duplicate attendance marks dropped"
                    );
                    repairs += 1;
                }
            }
        }

        repairs
    }

    // Read accessors

    /// Subjects in name order
    pub fn subjects(&self) -> impl Iterator<Item = &SubjectName> {
        self.sessions.keys()
    }

    pub fn has_subject(&self, subject: &SubjectName) -> bool {
        self.sessions.contains_key(subject)
    }

    /// Sessions of a subject, in creation order
    pub fn sessions(&self, subject: &SubjectName) -> Option<&[SessionId]> {
        self.sessions.get(subject).map(Vec::as_slice)
    }

    /// Every (subject, session) pair, subjects by name, sessions by creation
    pub fn session_entries(&self) -> impl Iterator<Item = (&SubjectName, &SessionId)> {
        self.sessions
            .iter()
            .flat_map(|(subject, sessions)| sessions.iter().map(move |s| (subject, s)))
    }

    pub fn attendance(&self, subject: &SubjectName, session: &SessionId) -> Option<&[UserId]> {
        self.attendance
            .get(subject)
            .and_then(|by_session| by_session.get(session))
            .map(Vec::as_slice)
    }

    pub fn is_present(&self, subject: &SubjectName, session: &SessionId, student: &UserId) -> bool {
        self.attendance(subject, session)
            .is_some_and(|present| present.contains(student))
    }

    pub fn grades(&self, subject: &SubjectName, session: &SessionId) -> Option<&GradeMap> {
        self.grades
            .get(subject)
            .and_then(|by_session| by_session.get(session))
    }

    pub fn grade(&self, subject: &SubjectName, session: &SessionId, student: &UserId) -> Option<i64> {
        self.grades(subject, session)
            .and_then(|grades| grades.get(student))
            .copied()
    }

    /// Documents of one student, in submission order
    pub fn documents(&self, student: &UserId) -> &[Document] {
        self.documents
            .get(student)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Every document with its owner, owners by name
    pub fn all_documents(&self) -> impl Iterator<Item = (&UserId, &Document)> {
        self.documents
            .iter()
            .flat_map(|(student, docs)| docs.iter().map(move |d| (student, d)))
    }

    /// Documents awaiting review
    pub fn pending_documents(&self) -> Vec<(&UserId, &Document)> {
        self.all_documents()
            .filter(|(_, doc)| doc.status == DocumentStatus::Pending)
            .collect()
    }

    // Mutations

    /// Create an empty subject. Returns false (and changes nothing) if it exists.
    pub fn add_subject(&mut self, subject: &SubjectName) -> StoreResult<bool> {
        if subject.as_str().trim().is_empty() {
            return Err(StoreError::EmptyName);
        }
        if self.has_subject(subject) {
            return Ok(false);
        }

        self.sessions.insert(subject.clone(), Vec::new());
        self.attendance.insert(subject.clone(), BTreeMap::new());
        self.grades.insert(subject.clone(), BTreeMap::new());
        Ok(true)
    }

    /// Append a session to a subject and create its empty containers
    pub fn add_session(
        &mut self,
        subject: &SubjectName,
        label: &str,
        at: NaiveDateTime,
    ) -> StoreResult<SessionId> {
        if label.trim().is_empty() {
            return Err(StoreError::EmptyName);
        }
        let sessions = self
            .sessions
            .get_mut(subject)
            .ok_or_else(|| StoreError::subject_not_found(subject))?;

        let id = SessionId::compose(label, at);
        if sessions.contains(&id) {
            return Err(StoreError::DuplicateSession(id));
        }

        sessions.push(id.clone());
        self.attendance
            .entry(subject.clone())
            .or_default()
            .insert(id.clone(), Vec::new());
        self.grades
            .entry(subject.clone())
            .or_default()
            .insert(id.clone(), GradeMap::new());
        Ok(id)
    }

    /// Flip a student's attendance mark. Returns the new membership.
    pub fn toggle_attendance(
        &mut self,
        subject: &SubjectName,
        session: &SessionId,
        student: &UserId,
    ) -> StoreResult<bool> {
        let present = self.attendance_mut(subject, session)?;
        if let Some(pos) = present.iter().position(|s| s == student) {
            present.remove(pos);
            Ok(false)
        } else {
            present.push(student.clone());
            Ok(true)
        }
    }

    /// Mark a student present. Returns false if they already were.
    pub fn mark_present(
        &mut self,
        subject: &SubjectName,
        session: &SessionId,
        student: &UserId,
    ) -> StoreResult<bool> {
        let present = self.attendance_mut(subject, session)?;
        if present.contains(student) {
            return Ok(false);
        }
        present.push(student.clone());
        Ok(true)
    }

    /// Set a grade, or clear it with `None`. Returns the previous grade.
    pub fn set_grade(
        &mut self,
        subject: &SubjectName,
        session: &SessionId,
        student: &UserId,
        grade: Option<i64>,
    ) -> StoreResult<Option<i64>> {
        if !self.session_exists(subject, session) {
            return Err(StoreError::session_not_found(subject, session));
        }
        let grades = self
            .grades
            .entry(subject.clone())
            .or_default()
            .entry(session.clone())
            .or_default();

        Ok(match grade {
            Some(value) => grades.insert(student.clone(), value),
            None => grades.remove(student),
        })
    }

    /// Append a pending document for a student
    pub fn submit_document(&mut self, student: &UserId, name: &str) -> StoreResult<DocumentId> {
        if name.trim().is_empty() {
            return Err(StoreError::EmptyName);
        }
        let doc = Document::pending(name);
        let id = doc.id;
        self.documents.entry(student.clone()).or_default().push(doc);
        Ok(id)
    }

    /// Move a pending document to approved or rejected
    pub fn review_document(
        &mut self,
        student: &UserId,
        document: DocumentId,
        decision: ReviewDecision,
    ) -> StoreResult<DocumentStatus> {
        let doc = self
            .documents
            .get_mut(student)
            .and_then(|docs| docs.iter_mut().find(|d| d.id == document))
            .ok_or_else(|| StoreError::NotFound(format!("document {} of {}", document, student)))?;

        if doc.status != DocumentStatus::Pending {
            return Err(StoreError::InvalidTransition {
                document,
                status: doc.status,
            });
        }

        doc.status = decision.status();
        Ok(doc.status)
    }

    fn session_exists(&self, subject: &SubjectName, session: &SessionId) -> bool {
        self.sessions(subject)
            .is_some_and(|sessions| sessions.contains(session))
    }

    fn attendance_mut(
        &mut self,
        subject: &SubjectName,
        session: &SessionId,
    ) -> StoreResult<&mut AttendanceList> {
        if !self.session_exists(subject, session) {
            return Err(StoreError::session_not_found(subject, session));
        }
        Ok(self
            .attendance
            .entry(subject.clone())
            .or_default()
            .entry(session.clone())
            .or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use classbook_util::parse_session_timestamp;

    fn at(s: &str) -> NaiveDateTime {
        parse_session_timestamp(s).unwrap()
    }

    fn math_with_lecture() -> (Ledger, SubjectName, SessionId) {
        let mut ledger = Ledger::new();
        let math = SubjectName::new("Math");
        ledger.add_subject(&math).unwrap();
        let session = ledger
            .add_session(&math, "Lecture1", at("01.09.2024 09:00"))
            .unwrap();
        (ledger, math, session)
    }

    #[test]
    fn add_session_composes_id() {
        let mut ledger = Ledger::new();
        let subject = SubjectName::new("Физика");
        ledger.add_subject(&subject).unwrap();

        let id = ledger
            .add_session(&subject, "Лекция", at("01.09.2024 10:00"))
            .unwrap();
        assert_eq!(id.as_str(), "Лекция [01.09.2024 10:00]");
        assert_eq!(ledger.attendance(&subject, &id), Some(&[][..]));
        assert!(ledger.grades(&subject, &id).unwrap().is_empty());
    }

    #[test]
    fn add_subject_is_idempotent() {
        let (mut ledger, math, session) = math_with_lecture();

        assert!(!ledger.add_subject(&math).unwrap());
        assert_eq!(ledger.sessions(&math).unwrap(), &[session]);
    }

    #[test]
    fn add_subject_rejects_blank_name() {
        let mut ledger = Ledger::new();
        let err = ledger.add_subject(&SubjectName::new("  ")).unwrap_err();
        assert!(matches!(err, StoreError::EmptyName));
    }

    #[test]
    fn add_session_to_unknown_subject_fails() {
        let mut ledger = Ledger::new();
        let err = ledger
            .add_session(&SubjectName::new("Art"), "L1", at("01.09.2024 09:00"))
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn duplicate_session_rejected() {
        let (mut ledger, math, _) = math_with_lecture();
        let err = ledger
            .add_session(&math, "Lecture1", at("01.09.2024 09:00"))
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateSession(_)));
        assert_eq!(ledger.sessions(&math).unwrap().len(), 1);
    }

    #[test]
    fn sessions_keep_creation_order() {
        let (mut ledger, math, first) = math_with_lecture();
        let second = ledger
            .add_session(&math, "Seminar", at("31.08.2024 09:00"))
            .unwrap();
        assert_eq!(ledger.sessions(&math).unwrap(), &[first, second]);
    }

    #[test]
    fn toggle_attendance_is_its_own_inverse() {
        let (mut ledger, math, session) = math_with_lecture();
        let student = UserId::new("student1");

        assert!(ledger.toggle_attendance(&math, &session, &student).unwrap());
        assert!(ledger.is_present(&math, &session, &student));

        assert!(!ledger.toggle_attendance(&math, &session, &student).unwrap());
        assert!(!ledger.is_present(&math, &session, &student));
        assert_eq!(ledger.attendance(&math, &session).unwrap().len(), 0);
    }

    #[test]
    fn toggle_unknown_session_is_not_found() {
        let (mut ledger, math, _) = math_with_lecture();
        let err = ledger
            .toggle_attendance(&math, &SessionId::from("nope"), &UserId::new("s"))
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn mark_present_never_duplicates() {
        let (mut ledger, math, session) = math_with_lecture();
        let student = UserId::new("student1");

        assert!(ledger.mark_present(&math, &session, &student).unwrap());
        assert!(!ledger.mark_present(&math, &session, &student).unwrap());
        assert_eq!(ledger.attendance(&math, &session).unwrap(), &[student]);
    }

    #[test]
    fn clearing_grade_removes_key() {
        let (mut ledger, math, session) = math_with_lecture();
        let student = UserId::new("student1");

        assert_eq!(ledger.set_grade(&math, &session, &student, Some(5)).unwrap(), None);
        assert_eq!(ledger.grade(&math, &session, &student), Some(5));

        assert_eq!(ledger.set_grade(&math, &session, &student, None).unwrap(), Some(5));
        assert!(!ledger.grades(&math, &session).unwrap().contains_key(&student));
    }

    #[test]
    fn set_grade_unknown_session_is_not_found() {
        let (mut ledger, math, _) = math_with_lecture();
        let err = ledger
            .set_grade(&math, &SessionId::from("x"), &UserId::new("s1"), Some(4))
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
        assert!(ledger.grades(&math, &SessionId::from("x")).is_none());
    }

    #[test]
    fn review_happens_once() {
        let mut ledger = Ledger::new();
        let student = UserId::new("student1");
        let id = ledger.submit_document(&student, "essay.pdf").unwrap();
        assert_eq!(ledger.documents(&student)[0].status, DocumentStatus::Pending);

        let status = ledger
            .review_document(&student, id, ReviewDecision::Approve)
            .unwrap();
        assert_eq!(status, DocumentStatus::Approved);

        let err = ledger
            .review_document(&student, id, ReviewDecision::Reject)
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::InvalidTransition { status: DocumentStatus::Approved, .. }
        ));
        assert_eq!(ledger.documents(&student)[0].status, DocumentStatus::Approved);
    }

    #[test]
    fn same_name_documents_are_distinct() {
        let mut ledger = Ledger::new();
        let student = UserId::new("student1");
        let first = ledger.submit_document(&student, "essay.pdf").unwrap();
        let second = ledger.submit_document(&student, "essay.pdf").unwrap();
        assert_ne!(first, second);

        ledger
            .review_document(&student, second, ReviewDecision::Reject)
            .unwrap();
        let pending = ledger.pending_documents();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].1.id, first);
    }

    #[test]
    fn review_unknown_document_is_not_found() {
        let mut ledger = Ledger::new();
        let err = ledger
            .review_document(&UserId::new("ghost"), DocumentId::new(), ReviewDecision::Approve)
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn normalize_fills_missing_containers() {
        let json = r#"{ "sessions": { "Math": ["L1 [01.09.2024 09:00]"] } }"#;
        let mut ledger: Ledger = serde_json::from_str(json).unwrap();

        assert_eq!(ledger.normalize(), 2);
        let math = SubjectName::new("Math");
        let session = SessionId::from("L1 [01.09.2024 09:00]");
        assert!(ledger.attendance(&math, &session).unwrap().is_empty());
        assert!(ledger.grades(&math, &session).unwrap().is_empty());

        assert_eq!(ledger.normalize(), 0);
    }

    #[test]
    fn normalize_collapses_duplicate_marks() {
        let json = r#"{
            "sessions": { "Math": ["L1"] },
            "attendance": { "Math": { "L1": ["a", "b", "a"] } },
            "grades": { "Math": { "L1": {} } }
        }"#;
        let mut ledger: Ledger = serde_json::from_str(json).unwrap();

        assert_eq!(ledger.normalize(), 1);
        let present = ledger
            .attendance(&SubjectName::new("Math"), &SessionId::from("L1"))
            .unwrap();
        assert_eq!(present, &[UserId::new("a"), UserId::new("b")]);
    }

    #[test]
    fn documents_without_ids_get_one() {
        let json = r#"{ "documents": { "student1": [ { "name": "a.pdf", "status": "rejected" } ] } }"#;
        let ledger: Ledger = serde_json::from_str(json).unwrap();
        let docs = ledger.documents(&UserId::new("student1"));
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].status, DocumentStatus::Rejected);
    }

    #[test]
    fn unknown_status_is_rejected() {
        let json = r#"{ "documents": { "s": [ { "name": "a", "status": "lost" } ] } }"#;
        assert!(serde_json::from_str::<Ledger>(json).is_err());
    }
}
