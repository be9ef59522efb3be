//! # End-to-end tests for the Pactoria HTTP API
//!
//! Each test starts the real router on an ephemeral port with an in-memory
//! database, the mock AI provider, and a recording email sender, then drives
//! it over HTTP with reqwest.
//!
//! ```bash
//! cargo test -p pactoria-server --test api
//! ```

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use pretty_assertions::assert_eq;
use reqwest::StatusCode;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio_tungstenite::tungstenite::{self, Message};

use pactoria_ai::AiService;
use pactoria_auth::TokenIssuer;
use pactoria_config::PactoriaConfig;
use pactoria_db::service::PactoriaService;
use pactoria_notify::LogEmailSender;
use pactoria_server::AppState;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const PASSWORD: &str = "Sup3rSecret";

type WsClient = tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

struct TestApp {
    base: String,
    client: reqwest::Client,
    outbox: Arc<LogEmailSender>,
    _shutdown: oneshot::Sender<()>,
}

async fn spawn_app() -> TestApp {
    let mut config = PactoriaConfig::default();
    config.database.path = ":memory:".to_string();
    config.ai.use_mock = true;
    config.ai.base_delay_ms = 1;
    config.ai.max_delay_ms = 5;
    config.auth.jwt_secret = "test-signing-secret-0123456789abcdef".to_string();

    let service = PactoriaService::new_local(":memory:").await.unwrap();
    let tokens = TokenIssuer::from_config(&config.auth).unwrap();
    let ai = AiService::from_config(&config.ai).unwrap();
    let outbox = Arc::new(LogEmailSender::new("noreply@pactoria.test"));
    let state = AppState::new(config, service, tokens, ai, outbox.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel::<()>();
    tokio::spawn(pactoria_server::serve(state, listener, async move {
        let _ = rx.await;
    }));

    TestApp {
        base: format!("http://{addr}"),
        client: reqwest::Client::new(),
        outbox,
        _shutdown: tx,
    }
}

impl TestApp {
    fn url(&self, path: &str) -> String {
        format!("{}/api/v1{path}", self.base)
    }

    async fn post(&self, path: &str, token: Option<&str>, body: &Value) -> (StatusCode, Value) {
        let mut req = self.client.post(self.url(path)).json(body);
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        read(req.send().await.unwrap()).await
    }

    async fn put(&self, path: &str, token: &str, body: &Value) -> (StatusCode, Value) {
        let req = self.client.put(self.url(path)).json(body).bearer_auth(token);
        read(req.send().await.unwrap()).await
    }

    async fn get(&self, path: &str, token: Option<&str>) -> (StatusCode, Value) {
        let mut req = self.client.get(self.url(path));
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        read(req.send().await.unwrap()).await
    }

    /// Register a company and return its admin's bearer token.
    async fn register(&self, company: &str, email: &str) -> String {
        let (status, body) = self
            .post(
                "/auth/register",
                None,
                &json!({
                    "email": email,
                    "password": PASSWORD,
                    "full_name": "Alex Admin",
                    "company": {"name": company}
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["token"].as_str().unwrap().to_string()
    }

    fn ws_url(&self, token: &str) -> String {
        let base = self.base.replacen("http://", "ws://", 1);
        format!("{base}/api/v1/notifications/ws?token={token}")
    }

    async fn connect_ws(&self, token: &str) -> WsClient {
        let (socket, _) = tokio_tungstenite::connect_async(self.ws_url(token)).await.unwrap();
        socket
    }

    /// Invite `email` with `role`, accept from the emailed link, and return
    /// the new member's bearer token.
    async fn invite_and_accept(&self, admin: &str, email: &str, role: &str, name: &str) -> String {
        let (status, body) = self
            .post("/team/invitations", Some(admin), &json!({"email": email, "role": role}))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        let message = self.outbox.outbox().into_iter().rfind(|m| m.to == email).unwrap();
        let (status, accepted) = self
            .post(
                "/team/invitations/accept",
                None,
                &json!({"token": token_from_email(&message.body), "full_name": name, "password": PASSWORD}),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{accepted}");
        accepted["token"].as_str().unwrap().to_string()
    }

    /// Notifications of `notification_type` visible to the token's user.
    async fn notifications_of(&self, token: &str, notification_type: &str) -> Vec<Value> {
        let (status, page) = self.get("/notifications?size=100", Some(token)).await;
        assert_eq!(status, StatusCode::OK, "{page}");
        page["items"]
            .as_array()
            .unwrap()
            .iter()
            .filter(|n| n["notification_type"] == notification_type)
            .cloned()
            .collect()
    }

    async fn create_contract(&self, token: &str, title: &str) -> Value {
        let (status, body) = self
            .post(
                "/contracts",
                Some(token),
                &json!({
                    "title": title,
                    "contract_type": "service_agreement",
                    "client_name": "Globex Ltd",
                    "contract_value": 12000.0
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body
    }
}

async fn read(resp: reqwest::Response) -> (StatusCode, Value) {
    let status = resp.status();
    let text = resp.text().await.unwrap();
    let body = if text.is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&text).unwrap()
    };
    (status, body)
}

/// Next JSON text frame from the server, skipping control frames.
async fn next_event(socket: &mut WsClient) -> Value {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(5), socket.next())
            .await
            .expect("no websocket frame within 5s")
            .expect("websocket closed")
            .unwrap();
        if let Message::Text(text) = frame {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

async fn send_event(socket: &mut WsClient, message: &Value) {
    socket.send(Message::text(message.to_string())).await.unwrap();
}

fn error_code(body: &Value) -> &str {
    body["error"]["code"].as_str().unwrap_or_default()
}

/// Pull the invitation token out of the accept link in an email body.
fn token_from_email(body: &str) -> String {
    let start = body.find("token=").unwrap() + "token=".len();
    body[start..]
        .chars()
        .take_while(char::is_ascii_hexdigit)
        .collect()
}

// ---------------------------------------------------------------------------
// Health and middleware
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_reports_database_and_echoes_request_id() {
    let app = spawn_app().await;

    let resp = app
        .client
        .get(format!("{}/health", app.base))
        .header("x-request-id", "trace-abc-123")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["x-request-id"], "trace-abc-123");
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["database"], "ok");
    assert_eq!(body["ai_configured"], true);

    let (status, _) = app.get("/health", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn unknown_route_is_a_json_404_with_request_id() {
    let app = spawn_app().await;
    let resp = app.client.get(app.url("/nope")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let generated = resp.headers()["x-request-id"].to_str().unwrap().to_string();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(error_code(&body), "not_found");
    assert_eq!(body["error"]["request_id"], generated.as_str());
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

#[tokio::test]
async fn register_login_and_me() {
    let app = spawn_app().await;
    let token = app.register("Acme Widgets Ltd", "owner@acme.co.uk").await;

    let (status, me) = app.get("/auth/me", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["user"]["email"], "owner@acme.co.uk");
    assert_eq!(me["user"]["role"], "admin");
    assert_eq!(me["company"]["name"], "Acme Widgets Ltd");

    let (status, login) = app
        .post(
            "/auth/login",
            None,
            &json!({"email": "owner@acme.co.uk", "password": PASSWORD}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(login["token_type"], "bearer");
}

#[tokio::test]
async fn bad_credentials_and_missing_token_are_401() {
    let app = spawn_app().await;
    app.register("Acme Widgets Ltd", "owner@acme.co.uk").await;

    let (status, body) = app
        .post(
            "/auth/login",
            None,
            &json!({"email": "owner@acme.co.uk", "password": "wrong-password-1"}),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(&body), "unauthorized");

    let (status, _) = app.get("/contracts", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.get("/contracts", Some("not.a.jwt")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn duplicate_registration_is_rejected() {
    let app = spawn_app().await;
    app.register("Acme Widgets Ltd", "owner@acme.co.uk").await;
    let (status, _) = app
        .post(
            "/auth/register",
            None,
            &json!({
                "email": "owner@acme.co.uk",
                "password": PASSWORD,
                "full_name": "Someone Else",
                "company": {"name": "Other Ltd"}
            }),
        )
        .await;
    assert!(status.is_client_error());
}

// ---------------------------------------------------------------------------
// Contracts
// ---------------------------------------------------------------------------

#[tokio::test]
async fn invalid_contract_type_is_422() {
    let app = spawn_app().await;
    let token = app.register("Acme Widgets Ltd", "owner@acme.co.uk").await;
    let (status, body) = app
        .post(
            "/contracts",
            Some(&token),
            &json!({"title": "Mystery", "contract_type": "handshake"}),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error_code(&body), "validation_failed");
}

#[tokio::test]
async fn other_companies_contracts_are_not_found() {
    let app = spawn_app().await;
    let acme = app.register("Acme Widgets Ltd", "owner@acme.co.uk").await;
    let globex = app.register("Globex Ltd", "owner@globex.co.uk").await;

    let contract = app.create_contract(&acme, "Website build").await;
    let id = contract["id"].as_str().unwrap();

    let (status, body) = app.get(&format!("/contracts/{id}"), Some(&globex)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_code(&body), "not_found");

    let (_, page) = app.get("/contracts", Some(&globex)).await;
    assert_eq!(page["total"], 0);
}

#[tokio::test]
async fn status_changes_follow_the_lifecycle() {
    let app = spawn_app().await;
    let token = app.register("Acme Widgets Ltd", "owner@acme.co.uk").await;
    let contract = app.create_contract(&token, "Website build").await;
    let id = contract["id"].as_str().unwrap();

    let (status, body) = app
        .post(&format!("/contracts/{id}/status"), Some(&token), &json!({"status": "completed"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "invalid_transition");

    let (status, body) = app
        .post(&format!("/contracts/{id}/status"), Some(&token), &json!({"status": "review"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "review");
}

#[tokio::test]
async fn generate_and_analyze_with_the_mock_provider() {
    let app = spawn_app().await;
    let token = app.register("Acme Widgets Ltd", "owner@acme.co.uk").await;
    let contract = app.create_contract(&token, "Website build").await;
    let id = contract["id"].as_str().unwrap();

    let (status, generated) = app
        .post(&format!("/contracts/{id}/generate"), Some(&token), &json!({}))
        .await;
    assert_eq!(status, StatusCode::OK, "{generated}");
    assert_eq!(generated["provider"], "mock");
    assert!(
        generated["contract"]["generated_content"]
            .as_str()
            .is_some_and(|c| !c.is_empty())
    );
    assert!(generated["compliance"]["overall_score"].is_number());

    let (status, analysis) = app
        .post(&format!("/contracts/{id}/analyze"), Some(&token), &json!({}))
        .await;
    assert_eq!(status, StatusCode::OK, "{analysis}");
    assert!(analysis["compliance_score"].is_number());
    assert!(analysis["contract"]["risk_score"].is_number());

    let (_, versions) = app.get(&format!("/contracts/{id}/versions"), Some(&token)).await;
    assert!(!versions.as_array().unwrap().is_empty());

    let (_, unread) = app.get("/notifications/unread-count", Some(&token)).await;
    assert!(unread["count"].as_u64().unwrap() >= 2);
}

#[tokio::test]
async fn analyze_without_content_is_a_business_rule() {
    let app = spawn_app().await;
    let token = app.register("Acme Widgets Ltd", "owner@acme.co.uk").await;
    let contract = app.create_contract(&token, "Website build").await;
    let id = contract["id"].as_str().unwrap();

    let (status, body) = app
        .post(&format!("/contracts/{id}/analyze"), Some(&token), &json!({}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "business_rule");
}

// ---------------------------------------------------------------------------
// Team
// ---------------------------------------------------------------------------

#[tokio::test]
async fn invited_viewer_can_read_but_not_write() {
    let app = spawn_app().await;
    let admin = app.register("Acme Widgets Ltd", "owner@acme.co.uk").await;

    let (status, invitation) = app
        .post(
            "/team/invitations",
            Some(&admin),
            &json!({"email": "viewer@acme.co.uk", "role": "viewer"}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{invitation}");
    assert!(invitation.get("token").is_none_or(Value::is_null));

    let email = app
        .outbox
        .outbox()
        .into_iter()
        .rfind(|m| m.to == "viewer@acme.co.uk")
        .unwrap();
    let invite_token = token_from_email(&email.body);
    assert_eq!(invite_token.len(), 64);

    let (status, accepted) = app
        .post(
            "/team/invitations/accept",
            None,
            &json!({"token": invite_token, "full_name": "Vera Viewer", "password": PASSWORD}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{accepted}");
    assert_eq!(accepted["user"]["role"], "viewer");
    let viewer = accepted["token"].as_str().unwrap();

    let (status, _) = app.get("/contracts", Some(viewer)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .post(
            "/contracts",
            Some(viewer),
            &json!({"title": "Sneaky", "contract_type": "nda"}),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(error_code(&body), "forbidden");

    let (_, members) = app.get("/team/members", Some(&admin)).await;
    assert_eq!(members.as_array().unwrap().len(), 2);

    let (_, unread) = app.get("/notifications/unread-count", Some(&admin)).await;
    assert_eq!(unread["count"], 1);
}

#[tokio::test]
async fn invitation_token_is_single_use() {
    let app = spawn_app().await;
    let admin = app.register("Acme Widgets Ltd", "owner@acme.co.uk").await;
    app.post(
        "/team/invitations",
        Some(&admin),
        &json!({"email": "member@acme.co.uk"}),
    )
    .await;
    let email = app.outbox.outbox().pop().unwrap();
    let invite_token = token_from_email(&email.body);
    let accept = json!({"token": invite_token, "full_name": "Max Member", "password": PASSWORD});

    let (status, _) = app.post("/team/invitations/accept", None, &accept).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = app.post("/team/invitations/accept", None, &accept).await;
    assert!(status.is_client_error());
}

// ---------------------------------------------------------------------------
// Search, analytics, wizard, integrations
// ---------------------------------------------------------------------------

#[tokio::test]
async fn contract_search_filters_and_rejects_bad_sort() {
    let app = spawn_app().await;
    let token = app.register("Acme Widgets Ltd", "owner@acme.co.uk").await;
    app.create_contract(&token, "Website build").await;
    app.create_contract(&token, "Office cleaning").await;

    let (status, page) = app
        .post("/search/contracts", Some(&token), &json!({"query": "cleaning"}))
        .await;
    assert_eq!(status, StatusCode::OK, "{page}");
    assert_eq!(page["total"], 1);
    assert_eq!(page["items"][0]["title"], "Office cleaning");

    let (status, _) = app
        .post("/search/contracts", Some(&token), &json!({"sort_by": "password_hash"}))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn dashboard_counts_contracts() {
    let app = spawn_app().await;
    let token = app.register("Acme Widgets Ltd", "owner@acme.co.uk").await;
    app.create_contract(&token, "Website build").await;

    let (status, stats) = app.get("/analytics/dashboard", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["total_contracts"], 1);

    let (status, _) = app.get("/analytics/compliance", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn integrations_connect_and_sync() {
    let app = spawn_app().await;
    let token = app.register("Acme Widgets Ltd", "owner@acme.co.uk").await;

    let (status, catalog) = app.get("/integrations", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(catalog.as_array().unwrap().len() >= 5);

    let (status, _) = app.post("/integrations/xero/sync", Some(&token), &json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, connection) = app
        .post("/integrations/xero/connect", Some(&token), &json!({}))
        .await;
    assert_eq!(status, StatusCode::OK, "{connection}");
    assert_eq!(connection["status"], "connected");

    let (status, synced) = app.post("/integrations/xero/sync", Some(&token), &json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert!(synced["last_sync_at"].is_string());

    let (status, _) = app
        .post("/integrations/fax-machine/connect", Some(&token), &json!({}))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn compliance_check_scores_text() {
    let app = spawn_app().await;
    let token = app.register("Acme Widgets Ltd", "owner@acme.co.uk").await;
    let (status, report) = app
        .post(
            "/compliance/check",
            Some(&token),
            &json!({
                "content": "This agreement is governed by the laws of England and Wales. \
                            Personal data is processed under UK GDPR.",
                "contract_type": "service_agreement"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{report}");
    let score = report["overall_score"].as_f64().unwrap();
    assert!((0.0..=1.0).contains(&score));
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

#[tokio::test]
async fn websocket_pushes_notifications_and_answers_client_messages() {
    let app = spawn_app().await;
    let token = app.register("Acme Widgets Ltd", "owner@acme.co.uk").await;
    app.create_contract(&token, "Website build").await;

    let mut socket = app.connect_ws(&token).await;
    assert_eq!(
        next_event(&mut socket).await,
        json!({"type": "unread_count", "data": {"count": 1}})
    );

    send_event(&mut socket, &json!({"type": "ping"})).await;
    assert_eq!(next_event(&mut socket).await, json!({"type": "pong"}));

    let contract = app.create_contract(&token, "Office lease").await;
    let pushed = next_event(&mut socket).await;
    assert_eq!(pushed["type"], "notification");
    assert_eq!(pushed["data"]["notification_type"], "contract_created");
    assert_eq!(pushed["data"]["entity_id"], contract["id"]);
    assert_eq!(
        next_event(&mut socket).await,
        json!({"type": "unread_count", "data": {"count": 2}})
    );

    let notification_id = pushed["data"]["id"].as_str().unwrap();
    send_event(
        &mut socket,
        &json!({"type": "mark_read", "notification_id": notification_id}),
    )
    .await;
    assert_eq!(
        next_event(&mut socket).await,
        json!({"type": "unread_count", "data": {"count": 1}})
    );
    let (_, unread) = app.get("/notifications/unread-count", Some(&token)).await;
    assert_eq!(unread["count"], 1);

    send_event(&mut socket, &json!({"type": "subscribe"})).await;
    assert_eq!(next_event(&mut socket).await["type"], "error");
}

#[tokio::test]
async fn websocket_rejects_a_bad_token() {
    let app = spawn_app().await;
    match tokio_tungstenite::connect_async(app.ws_url("not-a-token")).await {
        Err(tungstenite::Error::Http(response)) => assert_eq!(response.status().as_u16(), 401),
        Err(error) => panic!("expected a 401 handshake, got {error}"),
        Ok(_) => panic!("handshake with a bad token should fail"),
    }
}

#[tokio::test]
async fn low_compliance_raises_an_emailed_alert() {
    let app = spawn_app().await;
    let token = app.register("Acme Widgets Ltd", "owner@acme.co.uk").await;
    let contract = app.create_contract(&token, "Widget supply").await;
    let id = contract["id"].as_str().unwrap();

    let (status, body) = app
        .put(
            &format!("/contracts/{id}"),
            &token,
            &json!({"final_content": "The supplier delivers widgets. The buyer pays for them."}),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let (status, analysis) = app
        .post(&format!("/contracts/{id}/analyze"), Some(&token), &json!({}))
        .await;
    assert_eq!(status, StatusCode::OK, "{analysis}");
    assert!(analysis["compliance_score"].as_f64().unwrap() < 0.6, "{analysis}");

    let alerts = app.notifications_of(&token, "compliance_alert").await;
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0]["priority"], "high");
    assert_eq!(alerts[0]["entity_id"], id);

    // Only the high-priority alert is emailed; contract_created is low.
    let sent = app.outbox.outbox();
    assert_eq!(sent.len(), 1, "{sent:?}");
    assert_eq!(sent[0].to, "owner@acme.co.uk");
    assert!(sent[0].subject.starts_with("[Pactoria] Low compliance score"), "{}", sent[0].subject);
}

#[tokio::test]
async fn new_members_are_announced_to_every_admin() {
    let app = spawn_app().await;
    let owner = app.register("Acme Widgets Ltd", "owner@acme.co.uk").await;
    let second_admin = app
        .invite_and_accept(&owner, "ops@acme.co.uk", "admin", "Olive Ops")
        .await;
    let member = app
        .invite_and_accept(&owner, "member@acme.co.uk", "member", "Max Member")
        .await;

    let owner_joined = app.notifications_of(&owner, "team_member_joined").await;
    assert_eq!(owner_joined.len(), 2);
    assert!(owner_joined.iter().all(|n| n["priority"] == "medium"));

    let second_joined = app.notifications_of(&second_admin, "team_member_joined").await;
    assert_eq!(second_joined.len(), 1);
    assert_eq!(second_joined[0]["title"], "Max Member joined your team");

    assert!(app.notifications_of(&member, "team_member_joined").await.is_empty());

    // Medium priority stays in-app: the outbox holds only the two invitations.
    let sent = app.outbox.outbox();
    assert_eq!(sent.len(), 2, "{sent:?}");
    assert!(sent.iter().all(|m| m.body.contains("token=")));
}
