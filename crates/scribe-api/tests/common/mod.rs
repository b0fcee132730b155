#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, Response, StatusCode, header},
};
use scribe_api::{AppState, AppStateInner, Config, auth::create_token};
use scribe_db::{BlogStore, Database, NewPost};
use scribe_types::api::Rendered;
use tower::ServiceExt;

pub const SECRET: &str = "integration-secret";

pub struct TestApp {
    pub state: AppState,
    pub db: Arc<Database>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let config = Config { jwt_secret: SECRET.into(), ..config };
        let state = AppStateInner::new(db.clone(), config);
        Self { state, db }
    }

    pub fn router(&self) -> Router {
        scribe_api::router(self.state.clone())
    }

    /// Creates a user and returns `(id, bearer token)`.
    pub fn user(&self, username: &str) -> (i64, String) {
        let id = self.db.create_user(username, "not-a-real-hash").unwrap();
        (id, create_token(SECRET, id, username).unwrap())
    }

    pub fn group(&self, title: &str, slug: &str) -> i64 {
        self.db.create_group(title, slug, "Test description").unwrap()
    }

    pub fn post(&self, author_id: i64, text: &str, group_id: Option<i64>) -> i64 {
        self.db
            .insert_post(&NewPost { text: text.into(), author_id, group_id })
            .unwrap()
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> Response<Body> {
        let mut req = Request::builder().uri(uri);
        if let Some(token) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        self.router().oneshot(req.body(Body::empty()).unwrap()).await.unwrap()
    }

    pub async fn post_form(&self, uri: &str, fields: &[(&str, &str)], token: Option<&str>) -> Response<Body> {
        let body = fields
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        let mut req = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(token) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        self.router().oneshot(req.body(Body::from(body)).unwrap()).await.unwrap()
    }

    pub async fn post_json(&self, uri: &str, json: serde_json::Value) -> Response<Body> {
        let req = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap();
        self.router().oneshot(req).await.unwrap()
    }
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Asserts a 200 page render and returns it.
pub async fn rendered(response: Response<Body>) -> Rendered {
    assert_eq!(response.status(), StatusCode::OK);
    serde_json::from_value(body_json(response).await).unwrap()
}

pub fn location(response: &Response<Body>) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .expect("redirect without Location")
        .to_str()
        .unwrap()
        .to_string()
}

pub fn page_texts(page: &Rendered) -> Vec<String> {
    page.context["page_obj"]["object_list"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["text"].as_str().unwrap().to_string())
        .collect()
}
