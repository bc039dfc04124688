//! Human-readable labels for schoolbook records.
//!
//! # Responsibility
//! - Render one-line labels for admin listings and logs shown to operators.
//! - Resolve account display names through `AccountDirectory` only.
//!
//! # Invariants
//! - Cleared or dangling references render as `-`.
//! - Missing scores render as `N`.
//! - Book student names are listed alphabetically.

use crate::model::account::AccountId;
use crate::model::class_template::{ClassTemplate, ClassTemplateId, Subject, SubjectId, Term};
use crate::model::comment::{Comment, CommunicationBook};
use crate::model::profile::Profile;
use crate::model::student_result::StudentResult;
use crate::model::teacher::Teacher;
use crate::model::ticket::Ticket;
use crate::repo::account_repo::AccountDirectory;
use crate::repo::class_repo::ClassTemplateRepository;
use crate::repo::subject_repo::SubjectRepository;
use crate::repo::RepoResult;

const MISSING: &str = "-";
const NO_SCORE: &str = "N";

pub struct LabelService<'a, D, C, S>
where
    D: AccountDirectory,
    C: ClassTemplateRepository,
    S: SubjectRepository,
{
    accounts: &'a D,
    classes: &'a C,
    subjects: &'a S,
}

impl<'a, D, C, S> LabelService<'a, D, C, S>
where
    D: AccountDirectory,
    C: ClassTemplateRepository,
    S: SubjectRepository,
{
    pub fn new(accounts: &'a D, classes: &'a C, subjects: &'a S) -> Self {
        Self {
            accounts,
            classes,
            subjects,
        }
    }

    pub fn teacher_label(&self, teacher: &Teacher) -> RepoResult<String> {
        Ok(format!(
            "<Teacher: {}>",
            self.account_name(teacher.account_id)?
        ))
    }

    pub fn class_label(&self, class: &ClassTemplate) -> String {
        format!("<ClassTemplate: {} | {}>", class.name, class.session)
    }

    pub fn subject_label(&self, subject: &Subject) -> RepoResult<String> {
        let class_name = self
            .find_class(subject.class_template_id)?
            .map(|class| class.name)
            .unwrap_or_else(|| MISSING.to_string());
        Ok(format!("<Subject: {class_name} - {}>", subject.name))
    }

    pub fn term_label(&self, term: &Term) -> RepoResult<String> {
        let (name, session) = match self.find_class(Some(term.class_template_id))? {
            Some(class) => (class.name, class.session),
            None => (MISSING.to_string(), MISSING.to_string()),
        };
        Ok(format!("<Term: {} | {name} | {session}>", term.term.label()))
    }

    pub fn result_label(&self, result: &StudentResult) -> RepoResult<String> {
        let subject_name = self
            .find_subject_name(result.subject_id)?
            .unwrap_or_else(|| MISSING.to_string());
        Ok(format!(
            "<Result: {subject_name} | {} | Test:{} | Exam:{}>",
            self.account_name(result.account_id)?,
            score(result.test),
            score(result.exam)
        ))
    }

    pub fn comment_label(&self, comment: &Comment) -> String {
        format!("<Comment: {}>", comment.id)
    }

    pub fn ticket_label(&self, ticket: &Ticket) -> RepoResult<String> {
        Ok(format!(
            "<Ticket: {} | User: {}>",
            ticket.ticket,
            self.account_name(ticket.used_by)?
        ))
    }

    pub fn book_label(&self, book: &CommunicationBook) -> RepoResult<String> {
        let mut names = Vec::with_capacity(book.students.len());
        for account_id in &book.students {
            names.push(self.account_name(Some(*account_id))?);
        }
        names.sort();
        Ok(format!("<CommunicationBook: {}>", names.join(", ")))
    }

    pub fn profile_label(&self, profile: &Profile) -> RepoResult<String> {
        Ok(format!(
            "<Profile: {}>",
            self.account_name(Some(profile.account_id))?
        ))
    }

    fn account_name(&self, account_id: Option<AccountId>) -> RepoResult<String> {
        let Some(account_id) = account_id else {
            return Ok(MISSING.to_string());
        };
        Ok(self
            .accounts
            .display_name(account_id)?
            .unwrap_or_else(|| MISSING.to_string()))
    }

    fn find_class(&self, class_id: Option<ClassTemplateId>) -> RepoResult<Option<ClassTemplate>> {
        match class_id {
            Some(class_id) => self.classes.get_class_template(class_id),
            None => Ok(None),
        }
    }

    fn find_subject_name(&self, subject_id: Option<SubjectId>) -> RepoResult<Option<String>> {
        match subject_id {
            Some(subject_id) => Ok(self.subjects.get_subject(subject_id)?.map(|s| s.name)),
            None => Ok(None),
        }
    }
}

fn score(value: Option<i32>) -> String {
    value.map_or_else(|| NO_SCORE.to_string(), |value| value.to_string())
}
