use crate::{
    auth::{RosterSession, hash_password},
    data::user::AddUser,
    error::{MissingUserSnafu, RosterResult},
    maud_conveniences::{errors_list, form_submit_button, simple_form_element, title},
    state::RosterState,
};
use axum::{
    Form,
    body::Body,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use bitflags::bitflags;
use email_address::EmailAddress;
use maud::html;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use snafu::OptionExt;
//flow:
// 1. create the first account
// done :)

bitflags! {
    #[derive(Copy, Clone, Debug, Eq, PartialEq)]
    pub struct NewAccountDetailsError: u8 {
        const EMPTY_EMAIL =       0b0000_0001;
        const INVALID_EMAIL =     0b0000_0010;
        const EMPTY_PASSWORD =    0b0000_0100;
        const MISMATCH_PASSWORD = 0b0000_1000;
    }
}

impl NewAccountDetailsError {
    pub fn as_nice_list(&self) -> impl Iterator<Item = &'static str> {
        self.iter().filter_map(|x| match x {
            Self::EMPTY_EMAIL => Some("Provided email was empty"),
            Self::INVALID_EMAIL => Some("Provided email wasn't a valid address"),
            Self::EMPTY_PASSWORD => Some("Provided password was empty"),
            Self::MISMATCH_PASSWORD => Some("Passwords didn't match"),
            _ => None,
        })
    }
}

#[derive(Deserialize)]
pub struct NewAccountQuery {
    errors: Option<u8>,
}

pub async fn get_onboarding(
    State(state): State<RosterState>,
    session: RosterSession,
    Query(NewAccountQuery { errors }): Query<NewAccountQuery>,
) -> RosterResult<Response<Body>> {
    //onboarding is only for the very first account
    if state.users().any_exist().await? {
        return Ok(Redirect::to("/").into_response());
    }

    let errors = errors.map_or_else(
        NewAccountDetailsError::empty,
        NewAccountDetailsError::from_bits_truncate,
    );

    Ok(state.render(session, html! {
        div class="bg-gray-800 p-8 rounded-lg shadow-xl w-full max-w-md" {
            (title("Create the first Roster account"))

            @if !errors.is_empty() {
                (errors_list(None, errors.as_nice_list()))
            }

            form method="post" {
                (simple_form_element("email", "Email", true, Some("email"), None))
                (simple_form_element("password", "Password", true, Some("password"), None))
                (simple_form_element("confirm_password", "Confirm Password", true, Some("password"), None))
                (form_submit_button(Some("Create Account")))
            }
        }
    }).into_response())
}

#[derive(Deserialize)]
pub struct CreateAccountForm {
    email: String,
    password: SecretString,
    confirm_password: SecretString,
}

pub fn check_new_account(form: &CreateAccountForm) -> NewAccountDetailsError {
    let mut errors = NewAccountDetailsError::empty();

    let email = form.email.trim();
    if email.is_empty() {
        errors |= NewAccountDetailsError::EMPTY_EMAIL;
    } else if !EmailAddress::is_valid(email) {
        errors |= NewAccountDetailsError::INVALID_EMAIL;
    }
    if form.password.expose_secret().trim().is_empty() {
        errors |= NewAccountDetailsError::EMPTY_PASSWORD;
    }
    if form.password.expose_secret() != form.confirm_password.expose_secret() {
        errors |= NewAccountDetailsError::MISMATCH_PASSWORD;
    }

    errors
}

pub async fn post_onboarding(
    State(state): State<RosterState>,
    mut session: RosterSession,
    Form(form): Form<CreateAccountForm>,
) -> RosterResult<Redirect> {
    if state.users().any_exist().await? {
        return Ok(Redirect::to("/"));
    }

    let errors = check_new_account(&form);
    if !errors.is_empty() {
        return Ok(Redirect::to(&format!(
            "/onboarding?errors={}",
            errors.bits()
        )));
    }

    let CreateAccountForm { email, password, .. } = form;
    let bcrypt_hashed_password = hash_password(password, state.config().bcrypt_cost()).await?;
    let Some(id) = state
        .users()
        .insert_first(AddUser {
            email: email.trim().to_string(),
            bcrypt_hashed_password,
        })
        .await?
    else {
        warn!("first account was already created by another request");
        return Ok(Redirect::to("/"));
    };
    let user = state
        .users()
        .get_by_id(id)
        .await?
        .context(MissingUserSnafu { id })?;
    info!(%id, "created first account");

    session.login(&user).await?;

    Ok(Redirect::to("/"))
}


#[cfg(test)]
mod http_tests {
    use crate::test_support::{TestClient, body_text, location, memory_state, seed_admin};
    use axum::http::StatusCode;

    #[tokio::test]
    async fn first_account_is_created_and_logged_in() {
        let state = memory_state(10).await;
        let mut client = TestClient::new(state.clone());

        let page = body_text(client.get("/onboarding").await).await;
        assert!(page.contains("Create the first Roster account"));

        let response = client
            .post_form(
                "/onboarding",
                "email=first%40school.org&password=pw&confirm_password=pw",
            )
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/");

        assert!(state.users().any_exist().await.unwrap());
        assert_eq!(client.get("/students/create/").await.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn bad_details_come_back_as_errors() {
        let state = memory_state(10).await;
        let mut client = TestClient::new(state.clone());

        let response = client
            .post_form(
                "/onboarding",
                "email=nope&password=pw&confirm_password=other",
            )
            .await;
        let errors_at = location(&response).to_string();
        assert_eq!(errors_at, "/onboarding?errors=10");
        assert!(!state.users().any_exist().await.unwrap());

        let page = body_text(client.get(&errors_at).await).await;
        assert!(page.contains("Passwords didn"));
        assert!(page.contains("valid address"));
    }

    #[tokio::test]
    async fn onboarding_closes_once_someone_exists() {
        let state = memory_state(10).await;
        seed_admin(&state).await;
        let mut client = TestClient::new(state);

        assert_eq!(location(&client.get("/onboarding").await), "/");
        let response = client
            .post_form(
                "/onboarding",
                "email=second%40school.org&password=pw&confirm_password=pw",
            )
            .await;
        assert_eq!(location(&response), "/");
        assert_eq!(client.get("/students/create/").await.status(), StatusCode::SEE_OTHER);
    }
}
