use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Map, Value};

use scribe_types::api::Rendered;

use crate::error::ApiError;

/// Named values handed to the template renderer.
#[derive(Debug, Default)]
pub struct Context(Map<String, Value>);

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> Result<(), ApiError> {
        let value = serde_json::to_value(value).map_err(|e| ApiError::Internal(e.into()))?;
        self.0.insert(key.to_string(), value);
        Ok(())
    }

    pub fn extend(&mut self, other: Context) {
        self.0.extend(other.0);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }
}

pub fn render(template: &str, context: Context) -> Response {
    Json(Rendered {
        template: template.to_string(),
        context: Value::Object(context.0),
    })
    .into_response()
}

/// 302 Found, the status browsers follow after a form post.
pub fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}
