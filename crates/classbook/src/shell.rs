//! Role-gated menu tree

use anyhow::Result;
use classbook_config::Role;
use classbook_core::{
    Account, Classbook, CoreError, MenuChoice, Selection, parse_choice, parse_grade,
    parse_review,
};
use classbook_store::{ReviewDecision, StoreError};
use classbook_util::{SESSION_TIMESTAMP_HINT, SessionId, SubjectName};
use std::io::{BufRead, Write};
use thiserror::Error;
use tracing::{debug, warn};

use crate::password::read_masked_password;

/// Input reached end of file. Ends the shell quietly.
#[derive(Debug, Error)]
#[error("input closed")]
pub struct InputClosed;

/// Text-menu front end over a [`Classbook`]
pub struct Shell<'a, R, W> {
    book: &'a mut Classbook,
    input: R,
    output: W,
    mask_password: bool,
}

impl<'a, R: BufRead, W: Write> Shell<'a, R, W> {
    pub fn new(book: &'a mut Classbook, input: R, output: W) -> Self {
        Self {
            book,
            input,
            output,
            mask_password: false,
        }
    }

    /// Read the password from the terminal with echo off instead of from `input`
    pub fn with_masked_password(mut self, mask: bool) -> Self {
        self.mask_password = mask;
        self
    }

    /// Log in once and run the menus for that user until they exit
    pub fn run(&mut self) -> Result<()> {
        match self.session() {
            Err(e) if e.is::<InputClosed>() => {
                debug!("Input closed, leaving shell");
                Ok(())
            }
            other => other,
        }
    }

    fn session(&mut self) -> Result<()> {
        let account = self.login()?;
        match account.role {
            Role::Teacher => self.teacher_menu(&account),
            Role::Student => self.student_menu(&account),
        }
    }

    fn read_line(&mut self, prompt: &str) -> Result<String> {
        write!(self.output, "{}", prompt)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(InputClosed.into());
        }
        Ok(line.trim_end_matches(['\n', '\r']).to_string())
    }

    fn read_password(&mut self, prompt: &str) -> Result<String> {
        if !self.mask_password {
            return self.read_line(prompt);
        }
        write!(self.output, "{}", prompt)?;
        self.output.flush()?;
        let password = read_masked_password()?;
        writeln!(self.output)?;
        password.ok_or_else(|| InputClosed.into())
    }

    /// Print a recoverable error and carry on; fatal ones are returned
    fn report(&mut self, err: CoreError) -> Result<()> {
        if err.is_fatal() {
            return Err(err.into());
        }
        warn!(error = %err, "Operation failed");
        match &err {
            CoreError::Store(StoreError::Io(_)) => {
                writeln!(self.output, "Change applied but NOT saved: {}", err)?
            }
            _ => writeln!(self.output, "Error: {}", err)?,
        }
        Ok(())
    }

    fn login(&mut self) -> Result<Account> {
        loop {
            writeln!(self.output, "====== Login ======")?;
            let login = self.read_line("Login: ")?;
            let password = self.read_password("Password: ")?;
            if let Some(account) = self.book.authenticate(login.trim(), &password) {
                return Ok(account);
            }
            writeln!(self.output, "Wrong login or password, try again.\n")?;
        }
    }

    fn choose_subject(&mut self, actor: &Account) -> Result<Selection<SubjectName>> {
        let allow_add = actor.can_add();
        loop {
            let subjects = self.book.subjects();
            writeln!(self.output, "------ Subjects ------")?;
            for (i, subject) in subjects.iter().enumerate() {
                writeln!(self.output, "{}. {}", i + 1, subject)?;
            }
            if allow_add {
                writeln!(self.output, "{}. Add a new subject", subjects.len() + 1)?;
            }
            writeln!(self.output, "0. Back")?;

            let answer = self.read_line("Choice: ")?;
            match parse_choice(&answer, subjects.len(), allow_add) {
                Ok(MenuChoice::Back) => return Ok(Selection::Cancelled),
                Ok(MenuChoice::Pick(i)) => return Ok(Selection::Selected(subjects[i].clone())),
                Ok(MenuChoice::AddNew) => {
                    let name = self.read_line("Subject name: ")?;
                    match self.book.add_subject(actor, &name) {
                        Ok(selection) => return Ok(selection),
                        Err(e) => self.report(e)?,
                    }
                }
                Err(e) => self.report(e.into())?,
            }
        }
    }

    fn choose_session(
        &mut self,
        actor: &Account,
        subject: &SubjectName,
    ) -> Result<Selection<SessionId>> {
        let allow_add = actor.can_add();
        loop {
            let sessions = self.book.sessions(subject);
            writeln!(self.output, "------ Sessions ------")?;
            for (i, session) in sessions.iter().enumerate() {
                writeln!(self.output, "{}. {}", i + 1, session)?;
            }
            if allow_add {
                writeln!(self.output, "{}. Create a new session", sessions.len() + 1)?;
            }
            writeln!(self.output, "0. Back")?;

            let answer = self.read_line("Choice: ")?;
            match parse_choice(&answer, sessions.len(), allow_add) {
                Ok(MenuChoice::Back) => return Ok(Selection::Cancelled),
                Ok(MenuChoice::Pick(i)) => return Ok(Selection::Selected(sessions[i].clone())),
                Ok(MenuChoice::AddNew) => {
                    let label = self.read_line("Session name: ")?;
                    let datetime =
                        self.read_line(&format!("Date and time ({}): ", SESSION_TIMESTAMP_HINT))?;
                    match self.book.add_session(actor, subject, &label, &datetime) {
                        Ok(session) => return Ok(Selection::CreatedNew(session)),
                        Err(e) => self.report(e)?,
                    }
                }
                Err(e) => self.report(e.into())?,
            }
        }
    }

    /// Subject then session; `None` if the operator backed out of either
    fn choose_subject_session(
        &mut self,
        actor: &Account,
    ) -> Result<Option<(SubjectName, SessionId)>> {
        let Some(subject) = self.choose_subject(actor)?.into_option() else {
            return Ok(None);
        };
        let Some(session) = self.choose_session(actor, &subject)?.into_option() else {
            return Ok(None);
        };
        Ok(Some((subject, session)))
    }

    // Teacher

    fn teacher_menu(&mut self, actor: &Account) -> Result<()> {
        loop {
            writeln!(self.output, "\n============================")?;
            writeln!(self.output, "  TEACHER MENU")?;
            writeln!(self.output, "============================")?;
            writeln!(self.output, "1. Attendance")?;
            writeln!(self.output, "2. Grades")?;
            writeln!(self.output, "3. Documents")?;
            writeln!(self.output, "0. Exit")?;

            match self.read_line("> ")?.trim() {
                "1" => self.teacher_attendance(actor)?,
                "2" => self.teacher_grades(actor)?,
                "3" => self.teacher_documents(actor)?,
                "0" => return Ok(()),
                _ => writeln!(self.output, "Unknown command.")?,
            }
        }
    }

    fn teacher_attendance(&mut self, actor: &Account) -> Result<()> {
        loop {
            writeln!(self.output, "\n=== Attendance (teacher) ===")?;
            writeln!(
                self.output,
                "{:<12} {:<25} {:<3} {:<3}",
                "Subject", "Session", "P", "A"
            )?;
            for row in self.book.attendance_summary() {
                writeln!(
                    self.output,
                    "{:<12} {:<25} {:<3} {:<3}",
                    row.subject.as_str(),
                    row.session.as_str(),
                    row.present,
                    row.absent
                )?;
            }
            writeln!(self.output, "\n1. Edit attendance")?;
            writeln!(self.output, "0. Back")?;

            match self.read_line("> ")?.trim() {
                "1" => self.edit_attendance(actor)?,
                "0" => return Ok(()),
                _ => writeln!(self.output, "Unknown command.")?,
            }
        }
    }

    fn edit_attendance(&mut self, actor: &Account) -> Result<()> {
        let Some((subject, session)) = self.choose_subject_session(actor)? else {
            return Ok(());
        };

        loop {
            let roster = self.book.roster(&subject, &session);
            writeln!(self.output, "\nAttendance:")?;
            for (i, entry) in roster.iter().enumerate() {
                let mark = if entry.present { "P" } else { "A" };
                writeln!(self.output, "{}. {:<10} [{}]", i + 1, entry.student.as_str(), mark)?;
            }
            writeln!(self.output, "0. Done")?;

            let answer = self.read_line("Student number to toggle: ")?;
            match parse_choice(&answer, roster.len(), false) {
                Ok(MenuChoice::Back | MenuChoice::AddNew) => return Ok(()),
                Ok(MenuChoice::Pick(i)) => {
                    let student = &roster[i].student;
                    match self.book.toggle_attendance(actor, &subject, &session, student) {
                        Ok(true) => writeln!(self.output, "✅ {} is now present", student)?,
                        Ok(false) => writeln!(self.output, "❌ {} is now absent", student)?,
                        Err(e) => self.report(e)?,
                    }
                }
                Err(e) => self.report(e.into())?,
            }
        }
    }

    fn teacher_grades(&mut self, actor: &Account) -> Result<()> {
        loop {
            let table = self.book.grade_table();
            writeln!(self.output, "\n=== Grades (teacher) ===")?;
            let header: Vec<String> = table
                .students
                .iter()
                .map(|s| format!("{:<8}", s.as_str()))
                .collect();
            writeln!(
                self.output,
                "{:<12} {:<25} {}",
                "Subject",
                "Session",
                header.join(" ")
            )?;
            for row in &table.rows {
                let cells: Vec<String> = row
                    .grades
                    .iter()
                    .map(|g| format!("{:<8}", display_grade(*g)))
                    .collect();
                writeln!(
                    self.output,
                    "{:<12} {:<25} {}",
                    row.subject.as_str(),
                    row.session.as_str(),
                    cells.join(" ")
                )?;
            }
            writeln!(self.output, "\n1. Edit grades")?;
            writeln!(self.output, "0. Back")?;

            match self.read_line("> ")?.trim() {
                "1" => self.edit_grades(actor)?,
                "0" => return Ok(()),
                _ => writeln!(self.output, "Unknown command.")?,
            }
        }
    }

    fn edit_grades(&mut self, actor: &Account) -> Result<()> {
        let Some((subject, session)) = self.choose_subject_session(actor)? else {
            return Ok(());
        };

        loop {
            let entries = self.book.session_grades(&subject, &session);
            writeln!(self.output, "\nCurrent grades:")?;
            for (i, entry) in entries.iter().enumerate() {
                writeln!(
                    self.output,
                    "{}. {:<10} [{}]",
                    i + 1,
                    entry.student.as_str(),
                    display_grade(entry.grade)
                )?;
            }
            writeln!(self.output, "0. Done")?;

            let answer = self.read_line("Student number to edit: ")?;
            let student = match parse_choice(&answer, entries.len(), false) {
                Ok(MenuChoice::Back | MenuChoice::AddNew) => return Ok(()),
                Ok(MenuChoice::Pick(i)) => entries[i].student.clone(),
                Err(e) => {
                    self.report(e.into())?;
                    continue;
                }
            };

            let raw = self.read_line(&format!("New grade for {} (empty to clear): ", student))?;
            let grade = match parse_grade(&raw) {
                Ok(grade) => grade,
                Err(e) => {
                    self.report(e.into())?;
                    continue;
                }
            };

            match self.book.set_grade(actor, &subject, &session, &student, grade) {
                Ok(previous) => match grade {
                    Some(value) => writeln!(self.output, "✅ {} = {}", student, value)?,
                    None if previous.is_some() => {
                        writeln!(self.output, "❌ Grade of {} removed", student)?
                    }
                    None => {}
                },
                Err(e) => self.report(e)?,
            }
        }
    }

    fn teacher_documents(&mut self, actor: &Account) -> Result<()> {
        loop {
            writeln!(self.output, "\n=== Documents (teacher) ===")?;
            writeln!(self.output, "{:<10} {:<20} Status", "Student", "Document")?;
            for row in self.book.documents() {
                writeln!(
                    self.output,
                    "{:<10} {:<20} {}",
                    row.student.as_str(),
                    row.name,
                    row.status
                )?;
            }
            writeln!(self.output, "\n1. Approve/Reject")?;
            writeln!(self.output, "0. Back")?;

            match self.read_line("> ")?.trim() {
                "1" => self.review_documents(actor)?,
                "0" => return Ok(()),
                _ => writeln!(self.output, "Unknown command.")?,
            }
        }
    }

    fn review_documents(&mut self, actor: &Account) -> Result<()> {
        let pending = self.book.pending_reviews();
        if pending.is_empty() {
            writeln!(self.output, "No pending documents.")?;
            return Ok(());
        }
        for (i, review) in pending.iter().enumerate() {
            writeln!(self.output, "{}. {} - {}", i + 1, review.student, review.name)?;
        }
        writeln!(self.output, "0. Back")?;

        let answer = self.read_line("Choice: ")?;
        let review = match parse_choice(&answer, pending.len(), false) {
            Ok(MenuChoice::Pick(i)) => &pending[i],
            Ok(_) => return Ok(()),
            Err(e) => return self.report(e.into()),
        };

        let action = self.read_line("a = approve, r = reject: ")?;
        let Some(decision) = parse_review(&action) else {
            writeln!(self.output, "Skipped")?;
            return Ok(());
        };

        match self
            .book
            .review_document(actor, &review.student, review.document, decision)
        {
            Ok(_) if decision == ReviewDecision::Approve => writeln!(self.output, "✅ Approved")?,
            Ok(_) => writeln!(self.output, "❌ Rejected")?,
            Err(e) => self.report(e)?,
        }
        Ok(())
    }

    // Student

    fn student_menu(&mut self, actor: &Account) -> Result<()> {
        loop {
            writeln!(self.output, "\n============================")?;
            writeln!(self.output, "   STUDENT MENU")?;
            writeln!(self.output, "============================")?;
            writeln!(self.output, "1. Attendance")?;
            writeln!(self.output, "2. Documents")?;
            writeln!(self.output, "3. Grades")?;
            writeln!(self.output, "0. Exit")?;

            match self.read_line("> ")?.trim() {
                "1" => self.student_attendance(actor)?,
                "2" => self.student_documents(actor)?,
                "3" => self.student_grades(actor)?,
                "0" => return Ok(()),
                _ => writeln!(self.output, "Unknown command.")?,
            }
        }
    }

    fn student_attendance(&mut self, actor: &Account) -> Result<()> {
        loop {
            writeln!(self.output, "\n=== My attendance ===")?;
            for row in self.book.student_attendance(&actor.id) {
                let mark = if row.present { "✓" } else { " " };
                writeln!(
                    self.output,
                    "{:<12} {:<25} {}",
                    row.subject.as_str(),
                    row.session.as_str(),
                    mark
                )?;
            }
            writeln!(self.output, "\n1. Check in")?;
            writeln!(self.output, "0. Back")?;

            match self.read_line("> ")?.trim() {
                "1" => {
                    let Some((subject, session)) = self.choose_subject_session(actor)? else {
                        continue;
                    };
                    match self.book.check_in(actor, &subject, &session) {
                        Ok(true) => writeln!(self.output, "✅ Checked in")?,
                        Ok(false) => writeln!(self.output, "You are already marked.")?,
                        Err(e) => self.report(e)?,
                    }
                }
                "0" => return Ok(()),
                _ => writeln!(self.output, "Unknown command.")?,
            }
        }
    }

    fn student_documents(&mut self, actor: &Account) -> Result<()> {
        loop {
            writeln!(self.output, "\n=== My documents ===")?;
            let docs = self.book.student_documents(&actor.id);
            if docs.is_empty() {
                writeln!(self.output, "No documents.")?;
            }
            for doc in docs {
                writeln!(self.output, "{:<20} {}", doc.name, doc.status)?;
            }
            writeln!(self.output, "\n1. Submit a document")?;
            writeln!(self.output, "0. Back")?;

            match self.read_line("> ")?.trim() {
                "1" => {
                    let name = self.read_line("File name: ")?;
                    match self.book.submit_document(actor, &name) {
                        Ok(_) => writeln!(self.output, "✅ Submitted")?,
                        Err(e) => self.report(e)?,
                    }
                }
                "0" => return Ok(()),
                _ => writeln!(self.output, "Unknown command.")?,
            }
        }
    }

    fn student_grades(&mut self, actor: &Account) -> Result<()> {
        writeln!(self.output, "\n=== My grades ===")?;
        let rows = self.book.student_grades(&actor.id);
        if rows.is_empty() {
            writeln!(self.output, "No grades.")?;
        }
        for row in rows {
            writeln!(
                self.output,
                "{:<12} {:<25} {}",
                row.subject.as_str(),
                row.session.as_str(),
                row.grade
            )?;
        }
        self.read_line("Press Enter to return.")?;
        Ok(())
    }
}

fn display_grade(grade: Option<i64>) -> String {
    grade.map_or_else(|| "-".to_string(), |g| g.to_string())
}

