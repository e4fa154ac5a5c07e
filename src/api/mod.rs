//! HTTP surface: application state, router and the JSON handlers.

pub mod auth;
pub mod forms;
pub mod health;
pub mod invitations;
pub mod responses;
pub mod templates;

use axum::{
    extract::{FromRef, FromRequest, Request},
    routing::{get, post, put},
    Json, Router,
};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::auth::{AuthUser, TokenService};
use crate::config::AppConfig;
use crate::database::models::Form;
use crate::database::Database;
use crate::error::FormFlowError;
use crate::mail::Mailer;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub database: Database,
    pub tokens: TokenService,
    pub mailer: Arc<dyn Mailer>,
}

impl AppState {
    pub fn new(config: AppConfig, database: Database, mailer: Arc<dyn Mailer>) -> Self {
        let tokens = TokenService::from_config(&config.auth);
        Self {
            config: Arc::new(config),
            database,
            tokens,
            mailer,
        }
    }

    /// The form, if it exists and belongs to `user`. A missing form is
    /// reported as forbidden too.
    pub async fn owned_form(&self, form_id: i64, user: &AuthUser) -> Result<Form, FormFlowError> {
        match self.database.get_form(form_id).await? {
            Some(form) if form.is_owned_by(user.id) => Ok(form),
            _ => Err(FormFlowError::forbidden()),
        }
    }
}

/// JSON request body whose rejection renders as a `FormFlowError`.
pub struct JsonBody<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = FormFlowError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

impl FromRef<AppState> for TokenService {
    fn from_ref(state: &AppState) -> Self {
        state.tokens.clone()
    }
}

pub fn build_router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
        .route("/profile", put(auth::update_profile))
        .route("/password", put(auth::change_password));

    let form_routes = Router::new()
        .route("/", get(forms::list_forms).post(forms::create_form))
        .route(
            "/:id",
            get(forms::get_form)
                .put(forms::update_form)
                .delete(forms::delete_form),
        )
        .route("/:id/duplicate", post(forms::duplicate_form))
        .route("/:id/visibility", post(forms::preview_visibility))
        .route("/:id/submit", post(responses::submit_response))
        .route("/:id/responses", get(responses::list_responses))
        .route("/:id/results", get(responses::form_results))
        .route("/:id/export", get(responses::export_responses))
        .route(
            "/:id/invitations",
            get(invitations::list_invitations)
                .post(invitations::send_invitations)
                .put(invitations::send_reminders)
                .delete(invitations::delete_invitation),
        );

    let template_routes = Router::new()
        .route("/", get(templates::list_templates).post(templates::create_template))
        .route(
            "/:id",
            get(templates::get_template).delete(templates::delete_template),
        );

    Router::new()
        .route("/health", get(health::health_check))
        .route("/status", get(health::status))
        .nest("/api/auth", auth_routes)
        .nest("/api/forms", form_routes)
        .nest("/api/templates", template_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .into_inner(),
        )
        .with_state(state)
}
