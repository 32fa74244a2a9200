//! End-to-end test helpers for the CRM backend.
//!
//! # Running Tests
//!
//! ```bash
//! # Apply migrations and bootstrap an admin
//! cargo run -p crm-cli -- migrate
//! cargo run -p crm-cli -- user create -e root@crm.test -n Root -r admin --password "$CRM_TEST_ADMIN_PASSWORD"
//!
//! # Start the server, then
//! cargo test -p crm-integration-tests -- --ignored
//! ```
//!
//! # Environment Variables
//!
//! - `CRM_TEST_BASE_URL` - server under test (default `http://localhost:5000`)
//! - `CRM_TEST_ADMIN_EMAIL` / `CRM_TEST_ADMIN_PASSWORD` - the bootstrapped admin

#![allow(clippy::missing_panics_doc, clippy::expect_used)]

use crm_core::Role;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use uuid::Uuid;

/// Base URL of the server under test.
#[must_use]
pub fn base_url() -> String {
    std::env::var("CRM_TEST_BASE_URL").unwrap_or_else(|_| "http://localhost:5000".to_owned())
}

/// A unique address so reruns never collide on the users email constraint.
#[must_use]
pub fn unique_email(prefix: &str) -> String {
    format!("{prefix}-{}@crm.test", Uuid::new_v4().simple())
}

/// An HTTP client, optionally carrying a bearer token.
#[derive(Debug, Clone)]
pub struct Session {
    client: Client,
    base_url: String,
    token: Option<String>,
    /// The signed-in user as returned by login.
    pub user: Value,
}

impl Session {
    /// Unauthenticated client.
    #[must_use]
    pub fn anonymous() -> Self {
        Self {
            client: Client::new(),
            base_url: base_url(),
            token: None,
            user: Value::Null,
        }
    }

    /// Register a fresh account with `role` and log it in.
    pub async fn register(role: Option<Role>) -> Self {
        let anon = Self::anonymous();
        let email = unique_email(role.map_or("user", Role::as_str));
        let password = format!("pw-{}", Uuid::new_v4());

        let mut body = json!({ "email": email, "password": password, "name": "Test User" });
        if let Some(role) = role {
            body["role"] = json!(role.as_str());
        }

        let resp = anon.post("/api/users/register", &body).await;
        assert_eq!(resp.status(), StatusCode::CREATED, "register {email}");

        anon.login(&email, &password).await
    }

    /// Log in as the admin bootstrapped with `crm-cli user create`.
    pub async fn admin() -> Self {
        let email = std::env::var("CRM_TEST_ADMIN_EMAIL").expect("CRM_TEST_ADMIN_EMAIL not set");
        let password =
            std::env::var("CRM_TEST_ADMIN_PASSWORD").expect("CRM_TEST_ADMIN_PASSWORD not set");
        Self::anonymous().login(&email, &password).await
    }

    /// Log in and return a session holding the issued token.
    pub async fn login(&self, email: &str, password: &str) -> Self {
        let resp = self
            .post(
                "/api/users/login",
                &json!({ "email": email, "password": password }),
            )
            .await;
        assert_eq!(resp.status(), StatusCode::OK, "login {email}");

        let body: Value = resp.json().await.expect("login body");
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            token: body["token"].as_str().map(str::to_owned),
            user: body["user"].clone(),
        }
    }

    /// Numeric id of the signed-in user.
    #[must_use]
    pub fn user_id(&self) -> i64 {
        self.user["id"].as_i64().expect("user id")
    }

    fn request(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    pub async fn get(&self, path: &str) -> Response {
        self.request(self.client.get(self.url(path)))
            .send()
            .await
            .expect("GET failed")
    }

    pub async fn post(&self, path: &str, body: &Value) -> Response {
        self.request(self.client.post(self.url(path)).json(body))
            .send()
            .await
            .expect("POST failed")
    }

    pub async fn put(&self, path: &str, body: &Value) -> Response {
        self.request(self.client.put(self.url(path)).json(body))
            .send()
            .await
            .expect("PUT failed")
    }

    pub async fn delete(&self, path: &str) -> Response {
        self.request(self.client.delete(self.url(path)))
            .send()
            .await
            .expect("DELETE failed")
    }

    /// GET `path` expecting 200 and decode the body.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> T {
        let resp = self.get(path).await;
        assert_eq!(resp.status(), StatusCode::OK, "GET {path}");
        resp.json().await.expect("JSON body")
    }

    /// Rows of `GET path` whose `field` equals `value`.
    pub async fn find(&self, path: &str, field: &str, value: &str) -> Vec<Value> {
        let rows: Vec<Value> = self.get_json(path).await;
        rows.into_iter()
            .filter(|row| row[field].as_str() == Some(value))
            .collect()
    }

    /// Create a customer named `name` and return its row.
    pub async fn create_customer(&self, name: &str) -> Value {
        let resp = self
            .post("/api/customers", &json!({ "name": name, "email": "ops@acme.test" }))
            .await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        self.find("/api/customers", "name", name)
            .await
            .pop()
            .expect("created customer is listed")
    }
}

/// Read `{"error": ...}` from a failed response.
pub async fn error_message(resp: Response) -> String {
    let body: Value = resp.json().await.expect("error body");
    body["error"].as_str().unwrap_or_default().to_owned()
}
