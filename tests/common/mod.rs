#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use chrono::Utc;
use donorlift_api::{
    auth::{hash_password, AuthConfig, AuthService},
    config::AppConfig,
    db,
    entities::contact,
    events::{self, EventSender},
    handlers::AppServices,
    AppState,
};
use http_body_util::BodyExt;
use sea_orm::{EntityTrait, Set};
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

const TEST_JWT_SECRET: &str =
    "test_secret_key_for_testing_purposes_only_that_is_at_least_64_characters_long";

/// Helper harness spinning up the full router against a throwaway SQLite
/// database.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    auth_service: Arc<AuthService>,
    db_file: std::path::PathBuf,
    _event_task: tokio::task::JoinHandle<()>,
}

/// A seeded login: the contact row plus a ready-to-use bearer token.
pub struct TestUser {
    pub contact: contact::Model,
    pub token: String,
}

impl TestApp {
    pub async fn new() -> Self {
        let db_file = std::env::temp_dir().join(format!("donorlift_test_{}.db", Uuid::new_v4()));

        let mut cfg = AppConfig::new(
            format!("sqlite://{}?mode=rwc", db_file.display()),
            TEST_JWT_SECRET.to_string(),
            3600,
            86_400,
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.auto_migrate = true;
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let db_arc = Arc::new(pool);
        let (event_tx, event_rx) = mpsc::channel(256);
        let event_sender = EventSender::new(event_tx);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let auth_cfg = AuthConfig::new(
            cfg.jwt_secret.clone(),
            "donorlift-auth".to_string(),
            "donorlift-api".to_string(),
            Duration::from_secs(cfg.jwt_expiration as u64),
            Duration::from_secs(cfg.refresh_token_expiration as u64),
        )
        .expect("valid auth config for tests");
        let auth_service = Arc::new(AuthService::new(auth_cfg, db_arc.clone()));

        let services = AppServices::new(db_arc.clone(), event_sender.clone());

        let state = AppState {
            db: db_arc,
            config: cfg,
            event_sender,
            services,
        };

        let auth_for_layer = auth_service.clone();
        let router = Router::new()
            .nest("/api/v1", donorlift_api::api_v1_routes())
            .nest_service(
                "/auth",
                donorlift_api::auth::auth_routes().with_state(auth_service.clone()),
            )
            .layer(axum::middleware::from_fn_with_state(
                auth_for_layer,
                |axum::extract::State(auth): axum::extract::State<Arc<AuthService>>,
                 mut req: Request<Body>,
                 next: axum::middleware::Next| async move {
                    req.extensions_mut().insert(auth);
                    next.run(req).await
                },
            ))
            .with_state(state.clone());

        Self {
            router,
            state,
            auth_service,
            db_file,
            _event_task: event_task,
        }
    }

    /// Seed a contact with the given role flags and hand back a token.
    pub async fn seed_user(
        &self,
        email: &str,
        organisation_id: Option<i32>,
        is_superuser: bool,
        is_donor: bool,
        is_requester: bool,
    ) -> TestUser {
        let now = Utc::now();
        let model = contact::ActiveModel {
            first_name: Set("Test".to_string()),
            last_name: Set(email.split('@').next().unwrap_or("User").to_string()),
            email: Set(email.to_string()),
            phone: Set(None),
            organisation_id: Set(organisation_id),
            password_hash: Set(hash_password("hunter2hunter2").expect("hash password")),
            is_superuser: Set(is_superuser),
            is_donor: Set(is_donor),
            is_requester: Set(is_requester),
            active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        let row = contact::Entity::insert(model)
            .exec_with_returning(&*self.state.db)
            .await
            .expect("seed contact");

        let token = self
            .auth_service
            .generate_token(&row)
            .expect("token for seeded contact")
            .access_token;

        TestUser {
            contact: row,
            token,
        }
    }

    /// Seed a staff (superuser) login.
    pub async fn seed_staff(&self) -> TestUser {
        self.seed_user("staff@example.org", None, true, false, false)
            .await
    }

    /// Send a request against the router with an optional bearer token.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(tok) = token {
            builder = builder.header("authorization", format!("Bearer {}", tok));
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Send a raw-body request (CSV import) with a bearer token.
    pub async fn request_raw(
        &self,
        method: Method,
        uri: &str,
        body: &str,
        content_type: &str,
        token: &str,
    ) -> axum::response::Response {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("authorization", format!("Bearer {}", token))
            .header("content-type", content_type)
            .body(Body::from(body.to_string()))
            .expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Read a response body as JSON.
    pub async fn json_body(response: axum::response::Response) -> Value {
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("read response body")
            .to_bytes();
        serde_json::from_slice(&bytes).expect("response body should be JSON")
    }

    /// Read a response body as text.
    pub async fn text_body(response: axum::response::Response) -> String {
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("read response body")
            .to_bytes();
        String::from_utf8(bytes.to_vec()).expect("response body should be UTF-8")
    }

    /// Assert a JSON request succeeded and unwrap the `data` envelope.
    pub async fn expect_data(response: axum::response::Response) -> Value {
        assert_eq!(
            response.status(),
            StatusCode::OK,
            "expected 200 from request"
        );
        let body = Self::json_body(response).await;
        assert_eq!(body["success"], Value::Bool(true), "body: {body}");
        body["data"].clone()
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self._event_task.abort();
        let _ = std::fs::remove_file(&self.db_file);
    }
}
