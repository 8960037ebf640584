use bitflags::bitflags;
use chrono::NaiveDate;
use maud::Render;
use serde::Deserialize;
use std::fmt::{Display, Formatter};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Student {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub date_of_birth: NaiveDate,
    pub enrollment_date: NaiveDate,
    pub grade: Grade,
}

impl Student {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// School year, always within `Grade::MIN..=Grade::MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, sqlx::Type)]
#[sqlx(transparent)]
pub struct Grade(i32);

impl Grade {
    pub const MIN: i32 = 1;
    pub const MAX: i32 = 12;

    pub const fn new(grade: i32) -> Option<Self> {
        if grade >= Self::MIN && grade <= Self::MAX {
            Some(Self(grade))
        } else {
            None
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        raw.trim().parse().ok().and_then(Self::new)
    }

    pub const fn get(self) -> i32 {
        self.0
    }
}

impl Display for Grade {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Render for Grade {
    fn render_to(&self, buffer: &mut String) {
        self.0.render_to(buffer);
    }
}

/// A student that has passed validation, ready to be inserted or written over an existing row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStudent {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub date_of_birth: NaiveDate,
    pub enrollment_date: NaiveDate,
    pub grade: Grade,
}

impl NewStudent {
    pub fn with_id(self, id: i32) -> Student {
        let Self {
            first_name,
            last_name,
            email,
            date_of_birth,
            enrollment_date,
            grade,
        } = self;

        Student {
            id,
            first_name,
            last_name,
            email,
            date_of_birth,
            enrollment_date,
            grade,
        }
    }
}

/// Raw form submission, every field as typed by the user. Missing fields come through empty.
#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct StudentForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub date_of_birth: String,
    pub enrollment_date: String,
    pub grade: String,
}

impl From<&Student> for StudentForm {
    fn from(student: &Student) -> Self {
        Self {
            first_name: student.first_name.clone(),
            last_name: student.last_name.clone(),
            email: student.email.clone(),
            date_of_birth: student.date_of_birth.format(DATE_FORMAT).to_string(),
            enrollment_date: student.enrollment_date.format(DATE_FORMAT).to_string(),
            grade: student.grade.to_string(),
        }
    }
}

bitflags! {
    #[derive(Copy, Clone, Debug, Eq, PartialEq)]
    pub struct StudentFormErrors: u8 {
        const MISSING_FIRST_NAME =  0b0000_0001;
        const MISSING_LAST_NAME =   0b0000_0010;
        const MISSING_EMAIL =       0b0000_0100;
        const BAD_DATE_OF_BIRTH =   0b0000_1000;
        const BAD_ENROLLMENT_DATE = 0b0001_0000;
        const GRADE_OUT_OF_RANGE =  0b0010_0000;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StudentField {
    FirstName,
    LastName,
    Email,
    DateOfBirth,
    EnrollmentDate,
    Grade,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldErrorKind {
    RequiredField,
    Range,
    InvalidDate,
}

impl StudentFormErrors {
    pub fn describe(self) -> impl Iterator<Item = (StudentField, FieldErrorKind, &'static str)> {
        self.iter().filter_map(|e| match e {
            Self::MISSING_FIRST_NAME => Some((
                StudentField::FirstName,
                FieldErrorKind::RequiredField,
                "First name is required.",
            )),
            Self::MISSING_LAST_NAME => Some((
                StudentField::LastName,
                FieldErrorKind::RequiredField,
                "Last name is required.",
            )),
            Self::MISSING_EMAIL => Some((
                StudentField::Email,
                FieldErrorKind::RequiredField,
                "Email is required.",
            )),
            Self::BAD_DATE_OF_BIRTH => Some((
                StudentField::DateOfBirth,
                FieldErrorKind::InvalidDate,
                "Enter a valid date of birth (YYYY-MM-DD).",
            )),
            Self::BAD_ENROLLMENT_DATE => Some((
                StudentField::EnrollmentDate,
                FieldErrorKind::InvalidDate,
                "Enter a valid enrollment date (YYYY-MM-DD).",
            )),
            Self::GRADE_OUT_OF_RANGE => Some((
                StudentField::Grade,
                FieldErrorKind::Range,
                "Grade must be between 1 and 12.",
            )),
            _ => None,
        })
    }

    pub fn messages_for(self, field: StudentField) -> impl Iterator<Item = &'static str> {
        self.describe()
            .filter(move |(f, _, _)| *f == field)
            .map(|(_, _, message)| message)
    }
}

impl StudentForm {
    /// Checks every field, collecting all failures rather than stopping at the first.
    pub fn validate(&self) -> Result<NewStudent, StudentFormErrors> {
        let mut errors = StudentFormErrors::empty();

        let first_name = self.first_name.trim();
        if first_name.is_empty() {
            errors |= StudentFormErrors::MISSING_FIRST_NAME;
        }
        let last_name = self.last_name.trim();
        if last_name.is_empty() {
            errors |= StudentFormErrors::MISSING_LAST_NAME;
        }
        let email = self.email.trim();
        if email.is_empty() {
            errors |= StudentFormErrors::MISSING_EMAIL;
        }

        let date_of_birth = NaiveDate::parse_from_str(self.date_of_birth.trim(), DATE_FORMAT).ok();
        if date_of_birth.is_none() {
            errors |= StudentFormErrors::BAD_DATE_OF_BIRTH;
        }
        let enrollment_date =
            NaiveDate::parse_from_str(self.enrollment_date.trim(), DATE_FORMAT).ok();
        if enrollment_date.is_none() {
            errors |= StudentFormErrors::BAD_ENROLLMENT_DATE;
        }
        let grade = Grade::parse(&self.grade);
        if grade.is_none() {
            errors |= StudentFormErrors::GRADE_OUT_OF_RANGE;
        }

        match (date_of_birth, enrollment_date, grade) {
            (Some(date_of_birth), Some(enrollment_date), Some(grade)) if errors.is_empty() => {
                Ok(NewStudent {
                    first_name: first_name.to_string(),
                    last_name: last_name.to_string(),
                    email: email.to_string(),
                    date_of_birth,
                    enrollment_date,
                    grade,
                })
            }
            _ => Err(errors),
        }
    }
}

/// Which students a listing should include. Name matching is a case-insensitive substring
/// test against either the first or the last name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StudentFilter {
    name_contains: Option<String>,
    pub grade: Option<Grade>,
}

impl StudentFilter {
    pub fn new(query: Option<&str>, grade: Option<Grade>) -> Self {
        let name_contains = query
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(ToString::to_string);

        Self {
            name_contains,
            grade,
        }
    }

    pub fn name_contains(&self) -> Option<&str> {
        self.name_contains.as_deref()
    }

    pub fn matches(&self, student: &Student) -> bool {
        let name_matches = self.name_contains.as_ref().is_none_or(|needle| {
            let needle = needle.to_lowercase();
            student.first_name.to_lowercase().contains(&needle)
                || student.last_name.to_lowercase().contains(&needle)
        });
        let grade_matches = self.grade.is_none_or(|grade| student.grade == grade);

        name_matches && grade_matches
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;

    pub fn form(first_name: &str, last_name: &str, email: &str, grade: &str) -> StudentForm {
        StudentForm {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            email: email.to_string(),
            date_of_birth: "2010-12-10".to_string(),
            enrollment_date: "2024-09-01".to_string(),
            grade: grade.to_string(),
        }
    }

    #[test]
    fn grade_is_accepted_only_within_one_to_twelve() {
        for g in -2..=15 {
            let result = form("Ada", "Lovelace", "ada@x.com", &g.to_string()).validate();
            if (1..=12).contains(&g) {
                assert_eq!(result.unwrap().grade.get(), g);
            } else {
                let errors = result.unwrap_err();
                assert_eq!(errors, StudentFormErrors::GRADE_OUT_OF_RANGE, "grade {g}");
            }
        }
    }

    #[test]
    fn non_integer_grades_are_range_errors() {
        for raw in ["", "ten", "5.5", "1e1"] {
            let errors = form("Ada", "Lovelace", "ada@x.com", raw)
                .validate()
                .unwrap_err();
            let described: Vec<_> = errors.describe().collect();
            assert_eq!(
                described,
                vec![(
                    StudentField::Grade,
                    FieldErrorKind::Range,
                    "Grade must be between 1 and 12."
                )]
            );
        }
    }

    #[test]
    fn email_fails_only_when_empty() {
        for (email, should_pass) in [
            ("ada@x.com", true),
            ("not-an-address", true),
            ("", false),
            ("   ", false),
        ] {
            let result = form("Ada", "Lovelace", email, "10").validate();
            assert_eq!(result.is_ok(), should_pass, "email {email:?}");
            if let Err(errors) = result {
                assert_eq!(errors, StudentFormErrors::MISSING_EMAIL);
                let (_, kind, _) = errors.describe().next().unwrap();
                assert_eq!(kind, FieldErrorKind::RequiredField);
            }
        }
    }

    #[test]
    fn absent_fields_are_reported_together() {
        let errors = StudentForm::default().validate().unwrap_err();
        assert_eq!(errors, StudentFormErrors::all());
        assert_eq!(
            errors.messages_for(StudentField::Email).collect::<Vec<_>>(),
            vec!["Email is required."]
        );
    }

    #[test]
    fn values_are_trimmed() {
        let student = form("  Ada ", " Lovelace", " ada@x.com ", " 10 ")
            .validate()
            .unwrap();
        assert_eq!(student.first_name, "Ada");
        assert_eq!(student.last_name, "Lovelace");
        assert_eq!(student.email, "ada@x.com");
        assert_eq!(student.grade.get(), 10);
    }

    #[test]
    fn bad_dates_are_rejected() {
        let mut bad = form("Ada", "Lovelace", "ada@x.com", "10");
        bad.date_of_birth = "10/12/2010".to_string();
        bad.enrollment_date = "2024-02-30".to_string();

        let errors = bad.validate().unwrap_err();
        assert_eq!(
            errors,
            StudentFormErrors::BAD_DATE_OF_BIRTH | StudentFormErrors::BAD_ENROLLMENT_DATE
        );
    }

    #[test]
    fn form_round_trips_from_student() {
        let student = form("Ada", "Lovelace", "ada@x.com", "10")
            .validate()
            .unwrap()
            .with_id(3);
        assert_eq!(StudentForm::from(&student), form("Ada", "Lovelace", "ada@x.com", "10"));
    }

    #[test]
    fn filter_matches_either_name_ignoring_case() {
        let alan = form("Alan", "Turing", "a@x.com", "9")
            .validate()
            .unwrap()
            .with_id(1);
        let grace = form("Grace", "Hopper", "g@x.com", "9")
            .validate()
            .unwrap()
            .with_id(2);

        let filter = StudentFilter::new(Some("AN"), None);
        assert!(filter.matches(&alan));
        assert!(!filter.matches(&grace));

        let filter = StudentFilter::new(Some("hop"), Grade::new(9));
        assert!(filter.matches(&grace));

        let filter = StudentFilter::new(Some("hop"), Grade::new(10));
        assert!(!filter.matches(&grace));
    }

    #[test]
    fn blank_query_means_no_filter() {
        assert_eq!(StudentFilter::new(Some("   "), None), StudentFilter::default());
        assert_eq!(StudentFilter::new(None, None).name_contains(), None);
    }
}
