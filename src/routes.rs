use crate::{
    auth::{backend::RosterAuthBackend, require_login},
    routes::{
        login::{get_login, post_login, post_logout},
        onboarding::{get_onboarding, post_onboarding},
        students::{
            get_create_student, get_delete_student, get_edit_student, get_student_detail,
            get_student_list, post_create_student, post_delete_student, post_edit_student,
        },
    },
    state::RosterState,
};
use axum::{
    Router, middleware,
    routing::{get, post},
};
use axum_login::{
    AuthManagerLayerBuilder,
    tower_sessions::{Expiry, SessionManagerLayer, cookie::time::Duration},
};
use tower_http::{compression::CompressionLayer, trace::TraceLayer};

pub mod login;
pub mod onboarding;
pub mod students;

pub fn router(state: RosterState) -> Router {
    let session_layer = SessionManagerLayer::new(state.session_store())
        .with_expiry(Expiry::OnInactivity(Duration::days(5)));
    let auth_backend = RosterAuthBackend::new(state.clone());
    let auth_layer = AuthManagerLayerBuilder::new(auth_backend, session_layer).build();

    //everything that changes a student needs a logged-in user
    let changes = Router::new()
        .route(
            "/students/create/",
            get(get_create_student).post(post_create_student),
        )
        .route(
            "/students/{id}/edit/",
            get(get_edit_student).post(post_edit_student),
        )
        .route(
            "/students/{id}/delete/",
            get(get_delete_student).post(post_delete_student),
        )
        .route_layer(middleware::from_fn(require_login));

    Router::new()
        .route("/", get(get_student_list))
        .route("/students/", get(get_student_list))
        .route("/students/{id}/", get(get_student_detail))
        .merge(changes)
        .route("/login", get(get_login).post(post_login))
        .route("/login/", get(get_login).post(post_login))
        .route("/logout", post(post_logout))
        .route("/logout/", post(post_logout))
        .route("/onboarding", get(get_onboarding).post(post_onboarding))
        .layer(auth_layer)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
