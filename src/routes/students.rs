use crate::{
    auth::RosterSession,
    data::student::{
        DATE_FORMAT, Grade, Student, StudentField, StudentFilter, StudentForm, StudentFormErrors,
    },
    error::{MissingStudentSnafu, RosterError, RosterResult, UnknownStudentPathSnafu},
    maud_conveniences::{
        errors_list, field_errors, form_element, form_submit_button, simple_form_element,
        subtitle, table, title,
    },
    query::{Page, parse_page_number},
    state::RosterState,
};
use axum::{
    Form,
    body::Body,
    extract::{FromRequestParts, Path, Query, State},
    http::{Response, request::Parts},
    response::{IntoResponse, Redirect},
};
use maud::{Markup, html};
use serde::Deserialize;
use snafu::OptionExt;

const STUDENT_LIST: &str = "/students/";

#[derive(Deserialize)]
pub struct StudentListQuery {
    pub q: Option<String>,
    pub page: Option<String>,
    pub grade: Option<String>,
}

pub async fn get_student_list(
    State(state): State<RosterState>,
    session: RosterSession,
    Query(StudentListQuery { q, page, grade }): Query<StudentListQuery>,
) -> RosterResult<Markup> {
    let filter = StudentFilter::new(q.as_deref(), grade.as_deref().and_then(Grade::parse));
    let page = state
        .student_query()
        .fetch_page(state.students(), &filter, parse_page_number(page.as_deref()))
        .await?;

    let rows = page
        .items
        .iter()
        .map(|student| {
            [
                html! {
                    a class="hover:text-blue-300 underline" href={"/students/" (student.id) "/"} {(student.full_name())}
                },
                html! {(student.email)},
                html! {(student.grade)},
                html! {(student.enrollment_date.format(DATE_FORMAT).to_string())},
            ]
        })
        .collect();

    Ok(state.render(session, html! {
        div class="bg-gray-800 p-8 rounded shadow-md max-w-4xl w-full flex flex-col space-y-4" {
            (search_form(&filter))
            @if page.items.is_empty() {
                (title("Students"))
                p class="italic text-gray-400" {"No students found."}
            } @else {
                (table(title("Students"), ["Name", "Email", "Grade", "Enrolled"], rows))
            }
            (pagination_controls(&page, &filter))
        }
    }))
}

fn search_form(filter: &StudentFilter) -> Markup {
    html! {
        form method="get" action=(STUDENT_LIST) class="flex flex-row space-x-2" {
            input type="search" name="q" value=[filter.name_contains()] placeholder="Search by first or last name..." class="shadow appearance-none border rounded w-full py-2 px-3 leading-tight focus:outline-none focus:shadow-outline bg-gray-700 border-gray-600";
            select name="grade" class="shadow border rounded py-2 px-3 bg-gray-700 border-gray-600" {
                option value="" {"Any grade"}
                @for grade in (Grade::MIN..=Grade::MAX).filter_map(Grade::new) {
                    option value=(grade) selected[filter.grade == Some(grade)] {"Grade " (grade)}
                }
            }
            button type="submit" class="bg-blue-500 hover:bg-blue-700 font-bold py-2 px-4 rounded" {"Search"}
        }
    }
}

fn page_button(label: &'static str, number: u64, filter: &StudentFilter) -> Markup {
    html! {
        form method="get" action=(STUDENT_LIST) {
            @if let Some(q) = filter.name_contains() {
                input type="hidden" name="q" value=(q);
            }
            @if let Some(grade) = filter.grade {
                input type="hidden" name="grade" value=(grade);
            }
            input type="hidden" name="page" value=(number);
            button type="submit" class="bg-slate-600 hover:bg-slate-800 font-bold py-1 px-3 rounded" {(label)}
        }
    }
}

fn pagination_controls(page: &Page<Student>, filter: &StudentFilter) -> Markup {
    html! {
        div class="flex flex-row items-center justify-center space-x-4" {
            @if let Some(previous) = page.previous_page_number() {
                (page_button("« first", 1, filter))
                (page_button("previous", previous, filter))
            }
            span class="text-gray-300" {"Page " (page.number) " of " (page.total_pages) " (" (page.total_items) " students)"}
            @if let Some(next) = page.next_page_number() {
                (page_button("next", next, filter))
                (page_button("last »", page.total_pages, filter))
            }
        }
    }
}

/// The `{id}` segment of a student URL. A segment that can't be any student's id is a 404, the
/// same as an id nobody has.
pub struct StudentId(pub i32);

impl<S: Send + Sync> FromRequestParts<S> for StudentId {
    type Rejection = RosterError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let raw = match Path::<String>::from_request_parts(parts, state).await {
            Ok(Path(raw)) => raw,
            Err(_) => parts.uri.path().to_string(),
        };

        raw.trim()
            .parse()
            .ok()
            .map(Self)
            .context(UnknownStudentPathSnafu { raw })
    }
}

pub async fn get_student_detail(
    State(state): State<RosterState>,
    session: RosterSession,
    StudentId(id): StudentId,
) -> RosterResult<Markup> {
    let student = state
        .students()
        .get(id)
        .await?
        .context(MissingStudentSnafu { id })?;
    let can_change = session.user.is_some();

    Ok(state.render(session, html! {
        div class="bg-gray-800 p-8 rounded shadow-md max-w-md w-full" {
            (title(student.full_name()))
            (detail_fields(&student))
            @if can_change {
                div class="flex flex-row space-x-4 pt-4" {
                    a href={"/students/" (id) "/edit/"} class="bg-blue-600 hover:bg-blue-800 font-bold py-2 px-4 rounded" {"Edit"}
                    a href={"/students/" (id) "/delete/"} class="bg-red-600 hover:bg-red-800 font-bold py-2 px-4 rounded" {"Delete"}
                }
            }
            a href=(STUDENT_LIST) class="block pt-4 text-blue-200 underline" {"Back to all students"}
        }
    }))
}

fn detail_fields(student: &Student) -> Markup {
    let row = |label: &'static str, value: String| {
        html! {
            p class="text-gray-200 font-semibold" {
                (label) ": "
                span class="font-medium" {(value)}
            }
        }
    };

    html! {
        (row("Email", student.email.clone()))
        (row("Date of Birth", student.date_of_birth.format(DATE_FORMAT).to_string()))
        (row("Enrollment Date", student.enrollment_date.format(DATE_FORMAT).to_string()))
        (row("Grade", student.grade.to_string()))
    }
}

fn student_form(
    heading: &'static str,
    submit: &'static str,
    form: &StudentForm,
    errors: StudentFormErrors,
) -> Markup {
    let field = |id: &'static str,
                 label: &'static str,
                 ty: Option<&'static str>,
                 value: &str,
                 which: StudentField| {
        html! {
            (simple_form_element(id, label, true, ty, Some(value)))
            (field_errors(errors.messages_for(which)))
        }
    };

    html! {
        div class="bg-gray-800 shadow-md rounded px-8 pt-6 pb-8 mb-4 w-full max-w-md" {
            (title(heading))
            @if !errors.is_empty() {
                (errors_list(None, errors.describe().map(|(_, _, message)| message)))
            }
            form method="post" {
                (field("first_name", "First Name", None, &form.first_name, StudentField::FirstName))
                (field("last_name", "Last Name", None, &form.last_name, StudentField::LastName))
                (field("email", "Email", Some("email"), &form.email, StudentField::Email))
                (field("date_of_birth", "Date of Birth", Some("date"), &form.date_of_birth, StudentField::DateOfBirth))
                (field("enrollment_date", "Enrollment Date", Some("date"), &form.enrollment_date, StudentField::EnrollmentDate))
                (form_element("grade", "Grade", html! {
                    input required type="number" min=(Grade::MIN) max=(Grade::MAX) id="grade" name="grade" value=(form.grade) class="shadow appearance-none border rounded w-full py-2 px-3 leading-tight focus:outline-none focus:shadow-outline bg-gray-700 border-gray-600";
                }))
                (field_errors(errors.messages_for(StudentField::Grade)))
                (form_submit_button(Some(submit)))
            }
        }
    }
}

pub async fn get_create_student(
    State(state): State<RosterState>,
    session: RosterSession,
) -> Markup {
    state.render(
        session,
        student_form(
            "Add New Student",
            "Add Student",
            &StudentForm::default(),
            StudentFormErrors::empty(),
        ),
    )
}

pub async fn post_create_student(
    State(state): State<RosterState>,
    session: RosterSession,
    Form(form): Form<StudentForm>,
) -> RosterResult<Response<Body>> {
    match form.validate() {
        Ok(student) => {
            let id = state.students().insert(student).await?;
            info!(id, "created student");
            Ok(Redirect::to(STUDENT_LIST).into_response())
        }
        Err(errors) => {
            info!(?errors, "rejected new student");
            Ok(state
                .render(
                    session,
                    student_form("Add New Student", "Add Student", &form, errors),
                )
                .into_response())
        }
    }
}

pub async fn get_edit_student(
    State(state): State<RosterState>,
    session: RosterSession,
    StudentId(id): StudentId,
) -> RosterResult<Markup> {
    let student = state
        .students()
        .get(id)
        .await?
        .context(MissingStudentSnafu { id })?;

    Ok(state.render(
        session,
        student_form(
            "Edit Student",
            "Save Changes",
            &StudentForm::from(&student),
            StudentFormErrors::empty(),
        ),
    ))
}

pub async fn post_edit_student(
    State(state): State<RosterState>,
    session: RosterSession,
    StudentId(id): StudentId,
    Form(form): Form<StudentForm>,
) -> RosterResult<Response<Body>> {
    state
        .students()
        .get(id)
        .await?
        .context(MissingStudentSnafu { id })?;

    match form.validate() {
        Ok(student) => {
            if !state.students().update(id, student).await? {
                return MissingStudentSnafu { id }.fail();
            }
            info!(id, "updated student");
            Ok(Redirect::to(STUDENT_LIST).into_response())
        }
        Err(errors) => {
            info!(id, ?errors, "rejected student edit");
            Ok(state
                .render(
                    session,
                    student_form("Edit Student", "Save Changes", &form, errors),
                )
                .into_response())
        }
    }
}

pub async fn get_delete_student(
    State(state): State<RosterState>,
    session: RosterSession,
    StudentId(id): StudentId,
) -> RosterResult<Markup> {
    let student = state
        .students()
        .get(id)
        .await?
        .context(MissingStudentSnafu { id })?;

    Ok(state.render(session, html! {
        div class="bg-gray-800 p-8 rounded shadow-md max-w-md w-full" {
            (title("Delete Student"))
            (subtitle(student.full_name()))
            (detail_fields(&student))
            p class="py-4 text-gray-300" {"Are you sure? This can't be undone."}
            form method="post" class="flex flex-row space-x-4" {
                button type="submit" class="bg-red-600 hover:bg-red-800 font-bold py-2 px-4 rounded" {"Delete"}
                a href={"/students/" (id) "/"} class="bg-slate-600 hover:bg-slate-800 font-bold py-2 px-4 rounded" {"Cancel"}
            }
        }
    }))
}

pub async fn post_delete_student(
    State(state): State<RosterState>,
    StudentId(id): StudentId,
) -> RosterResult<Redirect> {
    if !state.students().delete(id).await? {
        return MissingStudentSnafu { id }.fail();
    }
    info!(id, "deleted student");

    Ok(Redirect::to(STUDENT_LIST))
}
