//! Authentication route handlers.
//!
//! Registration, password login and logout. The logged-in user is kept in
//! the session; see [`crate::middleware::auth`].

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tower_sessions::Session;
use tracing::instrument;

use foodievent_core::ValidationErrors;
use foodievent_core::validation::{LoginInput, RegistrationInput};

use super::flash_redirect;
use super::views::CategoryLink;
use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{OptionalAuth, PageContext, clear_current_user, set_current_user};
use crate::models::{CurrentUser, FlashLevel};
use crate::services::{AuthError, AuthService};
use crate::state::AppState;

/// Shown for an unknown email or a wrong password alike.
const INVALID_CREDENTIALS: &str = "Incorrect email or password. Please try again.";

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub page: PageContext,
    pub categories: Vec<CategoryLink>,
    pub email: String,
    pub errors: ValidationErrors,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub page: PageContext,
    pub categories: Vec<CategoryLink>,
    pub input: RegistrationInput,
    pub errors: ValidationErrors,
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
pub async fn login_page(page: PageContext) -> impl IntoResponse {
    LoginTemplate {
        page,
        categories: CategoryLink::all(None),
        email: String::new(),
        errors: ValidationErrors::new(),
    }
}

/// Handle login form submission.
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    mut page: PageContext,
    Form(form): Form<LoginInput>,
) -> Result<Response> {
    let rejected = |page: PageContext, errors: ValidationErrors| {
        (
            StatusCode::UNPROCESSABLE_ENTITY,
            LoginTemplate {
                page,
                categories: CategoryLink::all(None),
                email: form.email.clone(),
                errors,
            },
        )
            .into_response()
    };

    let email = match form.validate() {
        Ok(email) => email,
        Err(errors) => return Ok(rejected(page, errors)),
    };

    let user = match AuthService::new(state.pool()).login(&email, &form.password).await {
        Ok(user) => user,
        Err(AuthError::InvalidCredentials) => {
            tracing::warn!("Login failed");
            page.flash(FlashLevel::Danger, INVALID_CREDENTIALS);
            return Ok(rejected(page, ValidationErrors::new()));
        }
        Err(e) => return Err(e.into()),
    };

    let current = CurrentUser::from(&user);
    set_current_user(&session, &current).await?;
    set_sentry_user(&user.id, Some(user.email.as_str()));
    tracing::info!(user_id = %user.id, "User logged in");

    Ok(flash_redirect(
        &session,
        FlashLevel::Success,
        format!(
            "{} has logged-in successfully. Welcome to FoodieVent!",
            current.full_name()
        ),
        "/",
    )
    .await)
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page.
pub async fn register_page(page: PageContext) -> impl IntoResponse {
    RegisterTemplate {
        page,
        categories: CategoryLink::all(None),
        input: RegistrationInput::default(),
        errors: ValidationErrors::new(),
    }
}

/// Handle registration form submission.
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    page: PageContext,
    Form(mut form): Form<RegistrationInput>,
) -> Result<Response> {
    let account = form.validate();
    let result = match account {
        Ok(account) => AuthService::new(state.pool()).register(account).await,
        Err(errors) => Err(AuthError::Validation(errors)),
    };

    match result {
        Ok(user) => Ok(flash_redirect(
            &session,
            FlashLevel::Success,
            format!(
                "{} has successfully registered an account for FoodieVent.",
                user.full_name()
            ),
            "/auth/login",
        )
        .await),
        Err(AuthError::Validation(errors)) => {
            // Never echo passwords back into the form
            form.password.clear();
            form.confirm.clear();
            Ok((
                StatusCode::UNPROCESSABLE_ENTITY,
                RegisterTemplate {
                    page,
                    categories: CategoryLink::all(None),
                    input: form,
                    errors,
                },
            )
                .into_response())
        }
        Err(e) => Err(e.into()),
    }
}

// =============================================================================
// Logout
// =============================================================================

/// Handle logout.
pub async fn logout(session: Session, OptionalAuth(user): OptionalAuth) -> Result<Response> {
    clear_current_user(&session).await?;
    clear_sentry_user();

    let Some(user) = user else {
        return Ok(flash_redirect(&session, FlashLevel::Info, "You are not logged in.", "/").await);
    };

    tracing::info!(user_id = %user.id, "User logged out");
    Ok(flash_redirect(
        &session,
        FlashLevel::Info,
        format!("{} has logged out.", user.full_name()),
        "/",
    )
    .await)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_login_page_renders_field_errors() {
        let html = LoginTemplate {
            page: PageContext::default(),
            categories: CategoryLink::all(None),
            email: "ana@example.com".to_string(),
            errors: ValidationErrors::single("password", "Please enter your password"),
        }
        .render()
        .unwrap();

        assert!(html.contains(r#"<p class="field-error">Please enter your password</p>"#));
        assert!(html.contains(r#"value="ana@example.com""#));
    }

    #[test]
    fn test_register_page_renders_field_errors() {
        let mut errors = ValidationErrors::new();
        errors.add("phone", "Please enter a 10 digit mobile number starting with 04");
        errors.add("address", "Please enter a street address");

        let html = RegisterTemplate {
            page: PageContext::default(),
            categories: CategoryLink::all(None),
            input: RegistrationInput::default(),
            errors,
        }
        .render()
        .unwrap();

        assert!(html.contains("Please enter a 10 digit mobile number starting with 04"));
        assert!(html.contains(r#"<p class="field-error">Please enter a street address</p>"#));
        assert_eq!(html.matches("field-error").count(), 2);
    }
}
