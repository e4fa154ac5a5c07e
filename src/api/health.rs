use axum::{extract::State, response::Json};
use serde_json::{json, Value};

use super::AppState;

pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "formflow",
        "timestamp": chrono::Utc::now()
    }))
}

pub async fn status(State(state): State<AppState>) -> Json<Value> {
    let mut status = json!({
        "status": "healthy",
        "service": "formflow",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now(),
        "features": {
            "mail": state.config.mail.enabled,
            "seed_templates": state.config.seed_templates
        }
    });

    status["database"] = match state.database.ping().await {
        Ok(()) => json!({ "status": "healthy" }),
        Err(_) => json!({ "status": "error" }),
    };

    Json(status)
}
