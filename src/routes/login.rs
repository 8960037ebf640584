use crate::{
    auth::{RosterSession, backend::RosterAuthCredentials, login_url, sanitise_next},
    error::RosterResult,
    maud_conveniences::{form_submit_button, simple_form_element, title},
    state::RosterState,
};
use axum::{
    Form,
    body::Body,
    extract::{Query, State},
    http::Response,
    response::{IntoResponse, Redirect},
};
use maud::html;
use secrecy::SecretString;
use serde::Deserialize;

#[derive(Deserialize)]
pub struct LoginOptions {
    pub next: Option<String>,
    pub login_failed: Option<bool>,
}

pub async fn get_login(
    State(state): State<RosterState>,
    session: RosterSession,
    Query(LoginOptions { next, login_failed }): Query<LoginOptions>,
) -> RosterResult<Response<Body>> {
    if !state.users().any_exist().await? {
        return Ok(Redirect::to("/onboarding").into_response());
    }

    if session.user.is_some() {
        return Ok(Redirect::to("/").into_response());
    }

    let login_failed = login_failed.unwrap_or(false);

    Ok(state.render(session, html! {
        div class="bg-gray-800 shadow-md rounded px-8 pt-6 pb-8 mb-4 w-full max-w-sm" {
            (title("Login"))
            @if login_failed {
                div role="alert" class="bg-red-100 border border-red-400 text-red-700 px-4 py-4 rounded relative" {
                    strong class="font-bold" {"Alert!"}
                    br;
                    // avoid giving extra details for security reasons :)
                    span class="block sm:inline" {"Email/Password not found or password incorrect"}
                }
                br;
            }

            form method="post" action="/login" {
                @if let Some(next) = next {
                    input type="hidden" name="next" value=(next) {}
                }
                (simple_form_element("email", "Email", true, Some("email"), None))
                (simple_form_element("password", "Password", true, Some("password"), None))
                (form_submit_button(Some("Login")))
            }
        }
    }).into_response())
}

#[derive(Deserialize)]
pub struct LoginForm {
    email: String,
    password: SecretString,
    next: Option<String>,
}

pub async fn post_login(
    mut session: RosterSession,
    Form(LoginForm {
        email,
        password,
        next,
    }): Form<LoginForm>,
) -> RosterResult<Redirect> {
    let next = sanitise_next(next.as_deref()).to_string();

    match session
        .authenticate(RosterAuthCredentials::EmailPassword {
            email: email.clone(),
            password,
        })
        .await?
    {
        Some(user) => {
            session.login(&user).await?;
            info!(%email, "logged in");
            Ok(Redirect::to(&next))
        }
        None => {
            warn!(%email, "failed login attempt");
            Ok(Redirect::to(&login_url(Some(next.as_str()), true)?))
        }
    }
}

pub async fn post_logout(mut session: RosterSession) -> RosterResult<Redirect> {
    session.logout().await?;
    Ok(Redirect::to("/"))
}
