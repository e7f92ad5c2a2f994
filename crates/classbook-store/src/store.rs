//! Ledger store: the ledger plus its backend, saved after every mutation

use classbook_util::{DocumentId, SessionId, SubjectName, UserId, parse_session_timestamp};
use tracing::{debug, info, warn};

use crate::{
    DocumentStatus, JsonFileBackend, Ledger, LedgerBackend, MemoryBackend, ReviewDecision,
    StoreResult,
};
use std::path::Path;

/// Owns the canonical ledger and writes it through to a backend.
///
/// Every mutation is applied in memory first and then saved. If the save
/// fails the error is returned and the in-memory change stays applied, so a
/// caller must treat an `Io` error as "not durably committed".
pub struct LedgerStore {
    ledger: Ledger,
    backend: Box<dyn LedgerBackend>,
}

impl LedgerStore {
    /// Load and normalize the ledger held by `backend`.
    ///
    /// Nothing stored yet gives an empty ledger.
    pub fn open(backend: impl LedgerBackend + 'static) -> StoreResult<Self> {
        let mut ledger = backend.load()?.unwrap_or_default();

        let repairs = ledger.normalize();
        if repairs > 0 {
            warn!(location = %backend.describe(), repairs, "Ledger normalized on load");
        }

        info!(
            location = %backend.describe(),
            subjects = ledger.sessions.len(),
            "Ledger loaded"
        );

        Ok(Self {
            ledger,
            backend: Box::new(backend),
        })
    }

    /// Open the JSON ledger at `path`
    pub fn open_file(path: impl AsRef<Path>) -> StoreResult<Self> {
        Self::open(JsonFileBackend::new(path.as_ref()))
    }

    /// Create an empty in-memory store (for testing)
    pub fn in_memory() -> Self {
        Self {
            ledger: Ledger::new(),
            backend: Box::new(MemoryBackend::new()),
        }
    }

    /// Read access to the current state
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Write the whole ledger to the backend
    pub fn save(&self) -> StoreResult<()> {
        self.backend.save(&self.ledger)
    }

    /// Create a subject. Returns false if it already existed; nothing is saved then.
    pub fn add_subject(&mut self, subject: &SubjectName) -> StoreResult<bool> {
        let created = self.ledger.add_subject(subject)?;
        if created {
            debug!(subject = %subject, "Subject added");
            self.save()?;
        } else {
            debug!(subject = %subject, "Subject already exists");
        }
        Ok(created)
    }

    /// Create a session from a label and a `DD.MM.YYYY HH:MM` timestamp
    pub fn add_session(
        &mut self,
        subject: &SubjectName,
        label: &str,
        datetime: &str,
    ) -> StoreResult<SessionId> {
        let at = parse_session_timestamp(datetime)?;
        let session = self.ledger.add_session(subject, label, at)?;
        debug!(subject = %subject, session = %session, "Session added");
        self.save()?;
        Ok(session)
    }

    /// Flip a student's attendance. Returns whether they are now present.
    pub fn toggle_attendance(
        &mut self,
        subject: &SubjectName,
        session: &SessionId,
        student: &UserId,
    ) -> StoreResult<bool> {
        let present = self.ledger.toggle_attendance(subject, session, student)?;
        debug!(subject = %subject, session = %session, student = %student, present, "Attendance toggled");
        self.save()?;
        Ok(present)
    }

    /// Student self check-in. Returns false (and saves nothing) if already marked.
    pub fn mark_present(
        &mut self,
        subject: &SubjectName,
        session: &SessionId,
        student: &UserId,
    ) -> StoreResult<bool> {
        let added = self.ledger.mark_present(subject, session, student)?;
        if added {
            debug!(subject = %subject, session = %session, student = %student, "Marked present");
            self.save()?;
        }
        Ok(added)
    }

    /// Set or clear (`None`) a grade. Returns the previous grade.
    pub fn set_grade(
        &mut self,
        subject: &SubjectName,
        session: &SessionId,
        student: &UserId,
        grade: Option<i64>,
    ) -> StoreResult<Option<i64>> {
        let previous = self.ledger.set_grade(subject, session, student, grade)?;
        debug!(
            subject = %subject,
            session = %session,
            student = %student,
            ?grade,
            ?previous,
            "Grade set"
        );
        self.save()?;
        Ok(previous)
    }

    pub fn submit_document(&mut self, student: &UserId, name: &str) -> StoreResult<DocumentId> {
        let id = self.ledger.submit_document(student, name)?;
        debug!(student = %student, document = %id, name, "Document submitted");
        self.save()?;
        Ok(id)
    }

    /// Approve or reject a pending document
    pub fn review_document(
        &mut self,
        student: &UserId,
        document: DocumentId,
        decision: ReviewDecision,
    ) -> StoreResult<DocumentStatus> {
        let status = self.ledger.review_document(student, document, decision)?;
        debug!(student = %student, document = %document, %status, "Document reviewed");
        self.save()?;
        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StoreError;

    #[test]
    fn attendance_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        let math = SubjectName::new("Math");
        let student = UserId::new("student1");

        let session = {
            let mut store = LedgerStore::open_file(&path).unwrap();
            store.add_subject(&math).unwrap();
            let session = store
                .add_session(&math, "Lecture1", "01.09.2024 09:00")
                .unwrap();
            store.toggle_attendance(&math, &session, &student).unwrap();
            store.save().unwrap();
            session
        };

        let reopened = LedgerStore::open_file(&path).unwrap();
        assert_eq!(
            reopened.ledger().attendance(&math, &session).unwrap(),
            &[student]
        );
    }

    #[test]
    fn every_mutation_is_persisted() {
        let backend = MemoryBackend::new();
        let mut store = LedgerStore::open(backend.clone()).unwrap();
        assert!(backend.contents().is_none());

        store.add_subject(&SubjectName::new("Math")).unwrap();
        assert!(backend.contents().unwrap().contains("\"Math\""));

        store
            .submit_document(&UserId::new("student1"), "essay.pdf")
            .unwrap();
        assert!(backend.contents().unwrap().contains("essay.pdf"));
    }

    #[test]
    fn bad_date_is_rejected_before_mutation() {
        let backend = MemoryBackend::new();
        let mut store = LedgerStore::open(backend.clone()).unwrap();
        let math = SubjectName::new("Math");
        store.add_subject(&math).unwrap();

        let err = store
            .add_session(&math, "Lecture1", "2024-09-01 10:00")
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidDateFormat(_)));
        assert!(store.ledger().sessions(&math).unwrap().is_empty());
    }

    #[test]
    fn failed_save_keeps_mutation_in_memory() {
        let backend = MemoryBackend::new();
        let mut store = LedgerStore::open(backend.clone()).unwrap();
        let math = SubjectName::new("Math");
        store.add_subject(&math).unwrap();
        let session = store
            .add_session(&math, "Lecture1", "01.09.2024 09:00")
            .unwrap();

        backend.set_fail_writes(true);
        let student = UserId::new("student1");
        let err = store
            .set_grade(&math, &session, &student, Some(4))
            .unwrap_err();
        assert!(matches!(err, StoreError::Io(_)));
        assert_eq!(store.ledger().grade(&math, &session, &student), Some(4));

        // What reached the backend predates the failed write
        let persisted = LedgerStore::open(backend.clone()).unwrap();
        assert_eq!(persisted.ledger().grade(&math, &session, &student), None);
    }

    #[test]
    fn corrupt_content_fails_open() {
        let backend = MemoryBackend::with_contents("[1, 2, 3]");
        let result = LedgerStore::open(backend);
        assert!(matches!(result, Err(StoreError::CorruptStore(_))));
    }

    #[test]
    fn open_normalizes_partial_ledger() {
        let backend =
            MemoryBackend::with_contents(r#"{ "sessions": { "Math": ["L1 [01.09.2024 09:00]"] } }"#);
        let store = LedgerStore::open(backend).unwrap();

        let math = SubjectName::new("Math");
        let session = SessionId::from("L1 [01.09.2024 09:00]");
        assert!(store.ledger().attendance(&math, &session).is_some());
        assert!(store.ledger().grades(&math, &session).is_some());
    }

    #[test]
    fn submit_then_review_once() {
        let mut store = LedgerStore::in_memory();
        let student = UserId::new("student1");
        let doc = store.submit_document(&student, "essay.pdf").unwrap();

        assert_eq!(
            store
                .review_document(&student, doc, ReviewDecision::Approve)
                .unwrap(),
            DocumentStatus::Approved
        );
        assert!(matches!(
            store.review_document(&student, doc, ReviewDecision::Approve),
            Err(StoreError::InvalidTransition { .. })
        ));
    }
}
