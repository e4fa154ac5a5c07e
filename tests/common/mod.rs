#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, HeaderMap, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

use formflow::api::{build_router, AppState};
use formflow::config::AppConfig;
use formflow::database::Database;
use formflow::mail::{Mailer, OutgoingEmail};
use formflow::FormFlowError;

/// Setup an in-memory SQLite database for testing
pub async fn setup_test_db() -> Database {
    Database::new_in_memory().await.expect("Failed to create test database")
}

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.auth.jwt_secret = "test-secret".to_string();
    config.public_base_url = "http://forms.test".to_string();
    config.seed_templates = false;
    config
}

/// Records outgoing mail. Recipients whose address starts with `bounce`
/// fail to deliver.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<OutgoingEmail>>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), FormFlowError> {
        if email.to.starts_with("bounce") {
            return Err(FormFlowError::MailError("mailbox unavailable".to_string()));
        }
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

pub struct TestApp {
    pub router: Router,
    pub database: Database,
    pub mailer: Arc<RecordingMailer>,
}

pub struct RawResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl TestApp {
    pub async fn new() -> Self {
        let database = setup_test_db().await;
        let mailer = Arc::new(RecordingMailer::default());
        let state = AppState::new(test_config(), database.clone(), mailer.clone());
        Self {
            router: build_router(state),
            database,
            mailer,
        }
    }

    pub async fn raw(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> RawResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec();

        RawResponse {
            status,
            headers,
            body,
        }
    }

    /// Send a request and decode the JSON body (`Null` when there is none).
    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let response = self.raw(method, uri, token, body).await;
        let json = serde_json::from_slice(&response.body).unwrap_or(Value::Null);
        (response.status, json)
    }

    /// Register an account and return a session token for it.
    pub async fn register_and_login(&self, email: &str) -> String {
        let (status, _) = self
            .request(
                "POST",
                "/api/auth/register",
                None,
                Some(json!({ "email": email, "password": "password123", "name": "Tester" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = self
            .request(
                "POST",
                "/api/auth/login",
                None,
                Some(json!({ "email": email, "password": "password123" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        body["token"].as_str().unwrap().to_string()
    }

    /// Create a form and return `(form_id, question_ids)`.
    pub async fn create_form(&self, token: &str, form: Value) -> (i64, Vec<i64>) {
        let (status, body) = self.request("POST", "/api/forms", Some(token), Some(form)).await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        let form_id = body["form"]["id"].as_i64().unwrap();
        (form_id, self.question_ids(form_id).await)
    }

    pub async fn question_ids(&self, form_id: i64) -> Vec<i64> {
        let (_, body) = self
            .request("GET", &format!("/api/forms/{}", form_id), None, None)
            .await;
        body["form"]["questions"]
            .as_array()
            .unwrap()
            .iter()
            .map(|q| q["id"].as_i64().unwrap())
            .collect()
    }

    pub async fn submit(&self, form_id: i64, body: Value) -> (StatusCode, Value) {
        self.request(
            "POST",
            &format!("/api/forms/{}/submit", form_id),
            None,
            Some(body),
        )
        .await
    }
}

/// Lunch survey: attendance (single, required), then a required menu
/// question (multiple) and a dietary note (short text) shown only to
/// people who attend, then an optional rating.
pub fn lunch_form() -> Value {
    json!({
        "title": "Team lunch",
        "description": "Friday lunch planning",
        "questions": [
            {
                "id": "attend",
                "type": "single",
                "title": "Will you join?",
                "options": ["Yes", "No"],
                "required": true
            },
            {
                "id": "menu",
                "type": "multiple",
                "title": "What would you like?",
                "options": ["Pizza", "Salad", "Sushi"],
                "required": true,
                "condition": { "question_id": "attend", "operator": "equals", "value": "Yes" }
            },
            {
                "id": "diet",
                "type": "short_text",
                "title": "Dietary needs",
                "required": false,
                "condition": { "questionId": "attend", "value": "Yes" }
            },
            {
                "id": "mood",
                "type": "rating",
                "title": "How excited are you?",
                "required": false
            }
        ]
    })
}
