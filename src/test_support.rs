//! Shared fixtures for driving the whole router in-process against the in-memory stores.

use crate::{
    auth::hash_password,
    config::{PaginationConfig, RuntimeConfiguration},
    data::{student::tests::form, user::AddUser},
    routes::router,
    state::RosterState,
};
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{HeaderValue, Request, Response, StatusCode, header},
};
use secrecy::SecretString;
use std::num::NonZeroU64;
use tower::ServiceExt;

pub const ADMIN_EMAIL: &str = "head@school.org";
pub const ADMIN_PASSWORD: &str = "correct horse battery staple";

pub async fn memory_state(page_size: u64) -> RosterState {
    let config = RuntimeConfiguration::in_memory(PaginationConfig {
        page_size: NonZeroU64::new(page_size).unwrap(),
    });
    RosterState::new(sqlx::postgres::PgPoolOptions::new(), config)
        .await
        .unwrap()
}

pub async fn seed_student(state: &RosterState, first_name: &str, last_name: &str) -> i32 {
    let email = format!("{}@school.org", first_name.to_lowercase());
    let student = form(first_name, last_name, &email, "7").validate().unwrap();
    state.students().insert(student).await.unwrap()
}

pub async fn seed_admin(state: &RosterState) {
    let bcrypt_hashed_password = hash_password(SecretString::from(ADMIN_PASSWORD), 4)
        .await
        .unwrap();
    state
        .users()
        .insert_first(AddUser {
            email: ADMIN_EMAIL.to_string(),
            bcrypt_hashed_password,
        })
        .await
        .unwrap()
        .unwrap();
}

/// A browser stand-in: one router, one cookie jar holding the session cookie.
pub struct TestClient {
    app: Router,
    cookie: Option<String>,
}

impl TestClient {
    pub fn new(state: RosterState) -> Self {
        Self {
            app: router(state),
            cookie: None,
        }
    }

    pub async fn send(&mut self, mut request: Request<Body>) -> Response<Body> {
        if let Some(cookie) = &self.cookie {
            request
                .headers_mut()
                .insert(header::COOKIE, HeaderValue::from_str(cookie).unwrap());
        }

        let response = self.app.clone().oneshot(request).await.unwrap();

        if let Some(set_cookie) = response.headers().get(header::SET_COOKIE) {
            let pair = set_cookie.to_str().unwrap().split(';').next().unwrap();
            self.cookie = Some(pair.to_string());
        }

        response
    }

    pub async fn get(&mut self, uri: &str) -> Response<Body> {
        self.send(Request::get(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn post_form(&mut self, uri: &str, body: &str) -> Response<Body> {
        self.send(
            Request::post(uri)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    pub async fn log_in(&mut self) {
        let response = self
            .post_form(
                "/login",
                "email=head%40school.org&password=correct+horse+battery+staple",
            )
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/");
    }
}

pub fn location(response: &Response<Body>) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
