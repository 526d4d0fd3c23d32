//! Shared helpers for the HTTP integration tests.

#![allow(dead_code)]

use axum::http::{header, HeaderName, HeaderValue};
use axum_test::TestServer;
use serde_json::{json, Value};
use taskgate::{
    build_app,
    types::{NewPrincipal, Role},
    AppState, Stores, TaskgateConfig,
};

pub const TEST_SECRET: &str = "integration-test-secret-of-32-chars";

/// A running test server plus direct access to its state.
pub struct Harness {
    pub server: TestServer,
    pub state: AppState,
}

pub fn harness() -> Harness {
    let state = AppState::new(TaskgateConfig::default(), TEST_SECRET, Stores::in_memory());
    let server = TestServer::new(build_app(state.clone())).expect("Failed to create test server");
    Harness { server, state }
}

pub fn bearer(token: &str) -> (HeaderName, HeaderValue) {
    (
        header::AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", token)).expect("valid header"),
    )
}

impl Harness {
    /// Registers a principal through the API and returns its credential.
    pub async fn register(&self, username: &str) -> String {
        let response = self
            .server
            .post("/auth/registration")
            .json(&json!({
                "username": username,
                "email": format!("{}@example.com", username),
                "password": format!("{}-password", username),
            }))
            .await;
        response.assert_status_ok();

        let body: Value = response.json();
        body["jwt-token"]
            .as_str()
            .expect("registration returns a token")
            .to_string()
    }

    /// Stores an administrator directly and issues a credential for it.
    pub async fn admin(&self, name: &str) -> String {
        self.state
            .stores
            .principals
            .save(NewPrincipal {
                name: name.to_string(),
                password_hash: "not-used".to_string(),
                role: Role::Admin,
                email: format!("{}@example.com", name),
            })
            .await
            .expect("admin saved");
        self.state.codec.issue(name).expect("token issued")
    }

    /// Looks up a principal id by name.
    pub async fn id_of(&self, name: &str) -> i64 {
        self.state
            .stores
            .principals
            .find_by_name(name)
            .await
            .expect("lookup")
            .expect("principal exists")
            .id
    }

    /// Creates a task through the API and returns its id.
    pub async fn create_task(
        &self,
        token: &str,
        author_id: i64,
        executor_id: Option<i64>,
    ) -> i64 {
        let (name, value) = bearer(token);
        let response = self
            .server
            .post("/tasks")
            .add_header(name, value)
            .json(&json!({
                "title": "Prepare release",
                "description": "Tag and publish",
                "status": "OPEN",
                "priority": "MEDIUM",
                "authorId": author_id,
                "executorId": executor_id,
            }))
            .await;
        response.assert_status_ok();

        let body: Value = response.json();
        body["id"].as_i64().expect("task id")
    }
}
