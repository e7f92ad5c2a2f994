//! Role-gated facade over the ledger store

use classbook_config::{Role, UserDirectory};
use classbook_store::{DocumentStatus, LedgerStore, ReviewDecision};
use classbook_util::{DocumentId, SessionId, SubjectName, UserId};
use tracing::{debug, info};

use crate::{
    AttendanceSummaryRow, CoreError, CoreResult, DocumentRow, GradeEntry, GradeTable,
    GradeTableRow, PendingReview, RosterEntry, Selection, StudentAttendanceRow, StudentGradeRow,
};

/// A logged-in user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: UserId,
    pub role: Role,
}

impl Account {
    pub fn can_add(&self) -> bool {
        self.role.can_add()
    }
}

/// The classbook: user directory plus ledger.
///
/// Both are constructed at startup and handed in; there is no global state.
pub struct Classbook {
    directory: UserDirectory,
    store: LedgerStore,
}

impl Classbook {
    pub fn new(directory: UserDirectory, store: LedgerStore) -> Self {
        Self { directory, store }
    }

    /// Check credentials. Plaintext comparison.
    pub fn authenticate(&self, login: &str, password: &str) -> Option<Account> {
        let account = self
            .directory
            .authenticate(login, password)
            .map(|user| Account {
                id: user.id.clone(),
                role: user.role,
            });

        match &account {
            Some(acc) => info!(user = %acc.id, role = %acc.role, "Login succeeded"),
            None => debug!(login, "Login failed"),
        }
        account
    }

    /// Directory students, in configuration order
    pub fn students(&self) -> Vec<UserId> {
        self.directory.students()
    }

    pub fn subjects(&self) -> Vec<SubjectName> {
        self.store.ledger().subjects().cloned().collect()
    }

    pub fn sessions(&self, subject: &SubjectName) -> Vec<SessionId> {
        self.store
            .ledger()
            .sessions(subject)
            .map(<[SessionId]>::to_vec)
            .unwrap_or_default()
    }

    // Mutations

    /// Create a subject, or select it if the name is already taken
    pub fn add_subject(&mut self, actor: &Account, name: &str) -> CoreResult<Selection<SubjectName>> {
        require_add(actor, "create subjects")?;
        let subject = SubjectName::new(name.trim());
        if self.store.add_subject(&subject)? {
            Ok(Selection::CreatedNew(subject))
        } else {
            Ok(Selection::Selected(subject))
        }
    }

    pub fn add_session(
        &mut self,
        actor: &Account,
        subject: &SubjectName,
        label: &str,
        datetime: &str,
    ) -> CoreResult<SessionId> {
        require_add(actor, "create sessions")?;
        Ok(self.store.add_session(subject, label.trim(), datetime)?)
    }

    /// Teacher flips a student's attendance. Returns the new state.
    pub fn toggle_attendance(
        &mut self,
        actor: &Account,
        subject: &SubjectName,
        session: &SessionId,
        student: &UserId,
    ) -> CoreResult<bool> {
        require_role(actor, Role::Teacher, "edit attendance")?;
        self.require_student(student)?;
        Ok(self.store.toggle_attendance(subject, session, student)?)
    }

    /// Student marks themselves present. Returns false if already marked.
    pub fn check_in(
        &mut self,
        actor: &Account,
        subject: &SubjectName,
        session: &SessionId,
    ) -> CoreResult<bool> {
        require_role(actor, Role::Student, "check in")?;
        Ok(self.store.mark_present(subject, session, &actor.id)?)
    }

    pub fn set_grade(
        &mut self,
        actor: &Account,
        subject: &SubjectName,
        session: &SessionId,
        student: &UserId,
        grade: Option<i64>,
    ) -> CoreResult<Option<i64>> {
        require_role(actor, Role::Teacher, "edit grades")?;
        self.require_student(student)?;
        Ok(self.store.set_grade(subject, session, student, grade)?)
    }

    pub fn submit_document(&mut self, actor: &Account, name: &str) -> CoreResult<DocumentId> {
        require_role(actor, Role::Student, "submit documents")?;
        Ok(self.store.submit_document(&actor.id, name.trim())?)
    }

    pub fn review_document(
        &mut self,
        actor: &Account,
        student: &UserId,
        document: DocumentId,
        decision: ReviewDecision,
    ) -> CoreResult<DocumentStatus> {
        require_role(actor, Role::Teacher, "review documents")?;
        Ok(self.store.review_document(student, document, decision)?)
    }

    // Views

    pub fn attendance_summary(&self) -> Vec<AttendanceSummaryRow> {
        let students = self.students();
        let ledger = self.store.ledger();

        ledger
            .session_entries()
            .map(|(subject, session)| {
                let marked = ledger.attendance(subject, session).unwrap_or_default();
                let absent = students.iter().filter(|s| !marked.contains(s)).count();
                AttendanceSummaryRow {
                    subject: subject.clone(),
                    session: session.clone(),
                    present: marked.len(),
                    absent,
                }
            })
            .collect()
    }

    pub fn roster(&self, subject: &SubjectName, session: &SessionId) -> Vec<RosterEntry> {
        let ledger = self.store.ledger();
        self.students()
            .into_iter()
            .map(|student| RosterEntry {
                present: ledger.is_present(subject, session, &student),
                student,
            })
            .collect()
    }

    pub fn grade_table(&self) -> GradeTable {
        let students = self.students();
        let ledger = self.store.ledger();

        let rows = ledger
            .session_entries()
            .map(|(subject, session)| GradeTableRow {
                subject: subject.clone(),
                session: session.clone(),
                grades: students
                    .iter()
                    .map(|s| ledger.grade(subject, session, s))
                    .collect(),
            })
            .collect();

        GradeTable { students, rows }
    }

    pub fn session_grades(&self, subject: &SubjectName, session: &SessionId) -> Vec<GradeEntry> {
        let ledger = self.store.ledger();
        self.students()
            .into_iter()
            .map(|student| GradeEntry {
                grade: ledger.grade(subject, session, &student),
                student,
            })
            .collect()
    }

    pub fn student_attendance(&self, student: &UserId) -> Vec<StudentAttendanceRow> {
        let ledger = self.store.ledger();
        ledger
            .session_entries()
            .map(|(subject, session)| StudentAttendanceRow {
                subject: subject.clone(),
                session: session.clone(),
                present: ledger.is_present(subject, session, student),
            })
            .collect()
    }

    /// Only graded sessions
    pub fn student_grades(&self, student: &UserId) -> Vec<StudentGradeRow> {
        let ledger = self.store.ledger();
        ledger
            .session_entries()
            .filter_map(|(subject, session)| {
                ledger
                    .grade(subject, session, student)
                    .map(|grade| StudentGradeRow {
                        subject: subject.clone(),
                        session: session.clone(),
                        grade,
                    })
            })
            .collect()
    }

    pub fn documents(&self) -> Vec<DocumentRow> {
        self.store
            .ledger()
            .all_documents()
            .map(|(student, doc)| DocumentRow::new(student, doc))
            .collect()
    }

    pub fn student_documents(&self, student: &UserId) -> Vec<DocumentRow> {
        self.store
            .ledger()
            .documents(student)
            .iter()
            .map(|doc| DocumentRow::new(student, doc))
            .collect()
    }

    pub fn pending_reviews(&self) -> Vec<PendingReview> {
        self.store
            .ledger()
            .pending_documents()
            .into_iter()
            .map(|(student, doc)| PendingReview::new(student, doc))
            .collect()
    }

    fn require_student(&self, student: &UserId) -> CoreResult<()> {
        match self.directory.get(student) {
            Some(user) if user.role == Role::Student => Ok(()),
            _ => Err(CoreError::UnknownStudent(student.clone())),
        }
    }
}

fn require_role(actor: &Account, role: Role, action: &str) -> CoreResult<()> {
    if actor.role == role {
        Ok(())
    } else {
        Err(CoreError::permission(format!("{} ({}) cannot {}", actor.id, actor.role, action)))
    }
}

fn require_add(actor: &Account, action: &str) -> CoreResult<()> {
    if actor.can_add() {
        Ok(())
    } else {
        Err(CoreError::permission(format!("{} ({}) cannot {}", actor.id, actor.role, action)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use classbook_config::User;
    use classbook_store::StoreError;

    fn classbook() -> Classbook {
        let directory = UserDirectory::new(vec![
            User::new("teacher1", "111", Role::Teacher),
            User::new("student1", "222", Role::Student),
            User::new("student2", "pass3", Role::Student),
        ]);
        Classbook::new(directory, LedgerStore::in_memory())
    }

    fn login(book: &Classbook, login: &str, password: &str) -> Account {
        book.authenticate(login, password).unwrap()
    }

    fn add_math(book: &mut Classbook, teacher: &Account) -> SubjectName {
        book.add_subject(teacher, "Math").unwrap().into_option().unwrap()
    }

    #[test]
    fn adding_existing_subject_selects_it() {
        let mut book = classbook();
        let teacher = login(&book, "teacher1", "111");
        assert_eq!(
            book.add_subject(&teacher, " Math ").unwrap(),
            Selection::CreatedNew(SubjectName::new("Math"))
        );
        assert_eq!(
            book.add_subject(&teacher, "Math").unwrap(),
            Selection::Selected(SubjectName::new("Math"))
        );
        assert_eq!(book.subjects().len(), 1);
    }

    #[test]
    fn authenticate_returns_role() {
        let book = classbook();
        assert_eq!(login(&book, "teacher1", "111").role, Role::Teacher);
        assert!(book.authenticate("teacher1", "222").is_none());
    }

    #[test]
    fn students_cannot_create_subjects() {
        let mut book = classbook();
        let student = login(&book, "student1", "222");
        let err = book.add_subject(&student, "Math").unwrap_err();
        assert!(matches!(err, CoreError::PermissionDenied(_)));
        assert!(book.subjects().is_empty());
    }

    #[test]
    fn attendance_overview_counts_absent_students() {
        let mut book = classbook();
        let teacher = login(&book, "teacher1", "111");
        let math = add_math(&mut book, &teacher);
        let session = book
            .add_session(&teacher, &math, "Lecture1", "01.09.2024 09:00")
            .unwrap();
        book.toggle_attendance(&teacher, &math, &session, &UserId::new("student1"))
            .unwrap();

        let rows = book.attendance_summary();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].present, 1);
        assert_eq!(rows[0].absent, 1);

        let roster = book.roster(&math, &session);
        assert!(roster[0].present);
        assert!(!roster[1].present);
    }

    #[test]
    fn teacher_cannot_mark_unknown_student() {
        let mut book = classbook();
        let teacher = login(&book, "teacher1", "111");
        let math = add_math(&mut book, &teacher);
        let session = book
            .add_session(&teacher, &math, "Lecture1", "01.09.2024 09:00")
            .unwrap();

        let err = book
            .toggle_attendance(&teacher, &math, &session, &UserId::new("teacher1"))
            .unwrap_err();
        assert!(matches!(err, CoreError::UnknownStudent(_)));
    }

    #[test]
    fn student_check_in_is_idempotent() {
        let mut book = classbook();
        let teacher = login(&book, "teacher1", "111");
        let student = login(&book, "student2", "pass3");
        let math = add_math(&mut book, &teacher);
        let session = book
            .add_session(&teacher, &math, "Lecture1", "01.09.2024 09:00")
            .unwrap();

        assert!(book.check_in(&student, &math, &session).unwrap());
        assert!(!book.check_in(&student, &math, &session).unwrap());

        let rows = book.student_attendance(&student.id);
        assert!(rows[0].present);
    }

    #[test]
    fn grade_views() {
        let mut book = classbook();
        let teacher = login(&book, "teacher1", "111");
        let math = add_math(&mut book, &teacher);
        let session = book
            .add_session(&teacher, &math, "Lecture1", "01.09.2024 09:00")
            .unwrap();
        let student2 = UserId::new("student2");
        book.set_grade(&teacher, &math, &session, &student2, Some(5))
            .unwrap();

        let table = book.grade_table();
        assert_eq!(table.rows[0].grades, vec![None, Some(5)]);

        assert!(book.student_grades(&UserId::new("student1")).is_empty());
        assert_eq!(book.student_grades(&student2)[0].grade, 5);

        book.set_grade(&teacher, &math, &session, &student2, None)
            .unwrap();
        assert!(book.student_grades(&student2).is_empty());
    }

    #[test]
    fn document_review_flow() {
        let mut book = classbook();
        let teacher = login(&book, "teacher1", "111");
        let student = login(&book, "student1", "222");

        book.submit_document(&student, "essay.pdf").unwrap();
        let pending = book.pending_reviews();
        assert_eq!(pending.len(), 1);

        let status = book
            .review_document(&teacher, &pending[0].student, pending[0].document, ReviewDecision::Approve)
            .unwrap();
        assert_eq!(status, DocumentStatus::Approved);
        assert!(book.pending_reviews().is_empty());

        let err = book
            .review_document(&teacher, &pending[0].student, pending[0].document, ReviewDecision::Reject)
            .unwrap_err();
        assert!(matches!(err, CoreError::Store(StoreError::InvalidTransition { .. })));
        assert!(!err.is_fatal());
    }

    #[test]
    fn teacher_cannot_submit_documents() {
        let mut book = classbook();
        let teacher = login(&book, "teacher1", "111");
        assert!(matches!(
            book.submit_document(&teacher, "x.pdf"),
            Err(CoreError::PermissionDenied(_))
        ));
    }
}
