/// Organization sign-up endpoints
///
/// Renders the sign-up form and runs the provisioning workflow when it is
/// submitted.
///
/// # Endpoints
///
/// - `GET /signup` - Sign-up form
/// - `POST /signup` - Provision organization, redirect to its sign-in page
/// - `GET /static/signup.js` - Client-side organization name sanitizer

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use askama::Template;
use axum::{
    extract::{rejection::FormRejection, State},
    http::header,
    response::{Html, IntoResponse, Redirect},
    Form,
};
use std::collections::BTreeMap;

const SIGNUP_SCRIPT: &str = include_str!("../../static/signup.js");

#[derive(Template)]
#[template(path = "signup.html")]
struct SignupTemplate {
    base_domain: String,
}

/// Sign-up form
///
/// # Endpoint
///
/// ```text
/// GET /signup
/// ```
///
/// Fields: `organization`, `email`, `password`, `firstName`, `lastName`.
/// The organization name is sanitized in the browser as it is typed and
/// previewed as `<slug>.<base_domain>`.
pub async fn signup_form(State(state): State<AppState>) -> ApiResult<Html<String>> {
    let template = SignupTemplate {
        base_domain: state.config.signup.base_domain.clone(),
    };

    let page = template
        .render()
        .map_err(|e| ApiError::InternalError(format!("Template render error: {}", e)))?;

    Ok(Html(page))
}

/// Client-side sanitizer script
pub async fn signup_script() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/javascript; charset=utf-8")],
        SIGNUP_SCRIPT,
    )
}

/// Sign-up submission
///
/// Provisions the organization on the identity provider and redirects the
/// browser to the organization's own sign-in page.
///
/// # Endpoint
///
/// ```text
/// POST /signup
/// Content-Type: application/x-www-form-urlencoded
///
/// organization=acme-corp&email=ada%40acme.io&password=...&firstName=Ada
/// ```
///
/// # Response
///
/// ```text
/// 303 See Other
/// Location: https://acme-corp.saasbp.io/signin
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Body is not a form
/// - `422 Unprocessable Entity`: Missing organization, email or password
/// - `4xx/5xx`: Status and body of a rejected identity provider call
/// - `502 Bad Gateway`: Identity provider unreachable or returned no ID
pub async fn submit_signup(
    State(state): State<AppState>,
    form: Result<Form<BTreeMap<String, String>>, FormRejection>,
) -> ApiResult<Redirect> {
    let Form(fields) = form.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let organization = state.workflow.provision(fields).await?;

    let location = format!(
        "{}://{}",
        state.config.signup.redirect_scheme, organization.signin_target
    );
    tracing::info!(
        organization = %organization.slug,
        location = %location,
        "Sign-up complete, redirecting"
    );

    Ok(Redirect::to(&location))
}
