use crate::{
    auth::backend::RosterAuthBackend,
    error::{BcryptSnafu, JoinTaskSnafu, RosterResult, UrlEncodeSnafu},
};
use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_login::{AuthSession, tower_sessions::cookie::time::OffsetDateTime};
use secrecy::{ExposeSecret, SecretString};
use snafu::ResultExt;

pub mod backend;
pub mod memory_store;
pub mod postgres_store;
pub mod session_store;

pub type RosterSession = AuthSession<RosterAuthBackend>;

/// Sessions are usable strictly before their expiry instant.
pub fn is_live(expiry_date: OffsetDateTime) -> bool {
    expiry_date > OffsetDateTime::now_utc()
}

pub async fn hash_password(password: SecretString, cost: u32) -> RosterResult<String> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password.expose_secret(), cost))
        .await
        .context(JoinTaskSnafu)?
        .context(BcryptSnafu)
}

pub fn login_url(next: Option<&str>, login_failed: bool) -> RosterResult<String> {
    let mut params = Vec::with_capacity(2);
    if login_failed {
        params.push(("login_failed", "true"));
    }
    if let Some(next) = next {
        params.push(("next", next));
    }

    if params.is_empty() {
        return Ok("/login".to_string());
    }
    let query = serde_urlencoded::to_string(params).context(UrlEncodeSnafu)?;
    Ok(format!("/login?{query}"))
}

/// Only paths on this site are followed after login, so `next` can't bounce someone elsewhere.
pub fn sanitise_next(next: Option<&str>) -> &str {
    match next {
        Some(next)
            if next.starts_with('/')
                && !next.starts_with("//")
                && next.chars().all(|c| c.is_ascii_graphic()) =>
        {
            next
        }
        _ => "/",
    }
}

/// Route layer for everything that changes students. Without a logged-in user the handler never
/// runs, and the request is sent to the login page instead.
pub async fn require_login(session: RosterSession, request: Request, next: Next) -> Response {
    if session.user.is_some() {
        return next.run(request).await;
    }

    let attempted = request.uri().path().to_string();
    info!(%attempted, method=%request.method(), "unauthenticated request sent to login");
    match login_url(Some(&attempted), false) {
        Ok(url) => Redirect::to(&url).into_response(),
        Err(e) => e.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_must_stay_on_site() {
        assert_eq!(sanitise_next(Some("/students/3/edit/")), "/students/3/edit/");
        assert_eq!(sanitise_next(Some("https://evil.example")), "/");
        assert_eq!(sanitise_next(Some("//evil.example")), "/");
        assert_eq!(sanitise_next(Some("/bad\nheader")), "/");
        assert_eq!(sanitise_next(None), "/");
    }

    #[test]
    fn sessions_die_at_their_expiry() {
        use axum_login::tower_sessions::cookie::time::Duration;

        assert!(is_live(OffsetDateTime::now_utc() + Duration::minutes(1)));
        assert!(!is_live(OffsetDateTime::now_utc() - Duration::minutes(1)));
    }

    #[test]
    fn login_url_carries_next() {
        assert_eq!(
            login_url(Some("/students/create/"), false).unwrap(),
            "/login?next=%2Fstudents%2Fcreate%2F"
        );
        assert_eq!(login_url(None, false).unwrap(), "/login");
        assert_eq!(login_url(None, true).unwrap(), "/login?login_failed=true");
    }

    #[test]
    fn login_url_keeps_awkward_next_whole() {
        let url = login_url(Some("/students/?q=a&b#top"), true).unwrap();
        assert_eq!(url, "/login?login_failed=true&next=%2Fstudents%2F%3Fq%3Da%26b%23top");

        let query = url.trim_start_matches("/login?");
        let params: Vec<(String, String)> = serde_urlencoded::from_str(query).unwrap();
        assert_eq!(
            params,
            vec![
                ("login_failed".to_string(), "true".to_string()),
                ("next".to_string(), "/students/?q=a&b#top".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn hashed_passwords_verify() {
        let hash = hash_password(SecretString::from("hunter2"), 4)
            .await
            .unwrap();
        assert!(bcrypt::verify("hunter2", &hash).unwrap());
        assert!(!bcrypt::verify("hunter3", &hash).unwrap());
    }
}
