use std::net::SocketAddr;

use reqwest::StatusCode as HttpStatusCode;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use uuid::Uuid;

use configs::AppConfig;

struct TestApp {
    base_url: String,
    client: reqwest::Client,
    token: String,
}

impl TestApp {
    fn url(&self, path: &str) -> String { format!("{}{}", self.base_url, path) }

    async fn send(&self, method: reqwest::Method, path: &str, body: Option<Value>) -> anyhow::Result<(HttpStatusCode, Value)> {
        let mut req = self.client.request(method, self.url(path)).bearer_auth(&self.token);
        if let Some(b) = body {
            req = req.json(&b);
        }
        let resp = req.send().await?;
        let status = resp.status();
        let body = resp.json::<Value>().await.unwrap_or(Value::Null);
        Ok((status, body))
    }
}

async fn start_server() -> anyhow::Result<TestApp> {
    let db = models::db::connect().await?;
    let email = format!("e2e_{}@example.com", Uuid::new_v4().simple());
    let mut cfg = AppConfig::default();
    cfg.auth.jwt_secret = "e2e-secret".into();
    cfg.auth.card_secret = "e2e-card".into();
    cfg.auth.admin_email = email.clone();
    cfg.auth.admin_password = "e2e-pass".into();
    server::startup::prepare_database(&db, &cfg).await?;

    let app = server::startup::build_app(db, &cfg);
    let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
    let addr: SocketAddr = listener.local_addr()?;
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await { eprintln!("server error: {}", e); }
    });

    let base_url = format!("http://{}:{}", addr.ip(), addr.port());
    let client = reqwest::Client::builder().cookie_store(true).build()?;
    let login: Value = client
        .post(format!("{base_url}/api/v1/auth/login"))
        .json(&json!({"email": email, "password": "e2e-pass"}))
        .send()
        .await?
        .json()
        .await?;
    let token = login["data"]["token"].as_str().unwrap_or_default().to_string();
    Ok(TestApp { base_url, client, token })
}

#[tokio::test]
async fn payer_lifecycle() -> anyhow::Result<()> {
    if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
    let app = start_server().await?;
    let payer_id = format!("p-{}", &Uuid::new_v4().simple().to_string()[..12]);

    let (status, body) = app
        .send(reqwest::Method::POST, "/api/v1/payers", Some(json!({"payer_name": "E2E Payer", "payer_id": payer_id})))
        .await?;
    assert_eq!(status, HttpStatusCode::OK);
    let internal = body["data"]["payer_internal_id"].as_str().unwrap_or_default().to_string();
    assert!(internal.starts_with("payer_"));

    let (status, body) = app
        .send(reqwest::Method::POST, "/api/v1/payers", Some(json!({"payer_name": "Again", "payer_id": payer_id})))
        .await?;
    assert_eq!(status, HttpStatusCode::CONFLICT);
    assert_eq!(body["code"], 409);

    let (status, body) = app
        .send(reqwest::Method::PUT, &format!("/api/v1/payers/{internal}"), Some(json!({"remarks": "updated"})))
        .await?;
    assert_eq!(status, HttpStatusCode::OK);
    assert_eq!(body["data"]["remarks"], "updated");
    assert_eq!(body["data"]["payer_name"], "E2E Payer");

    let (status, body) = app
        .send(reqwest::Method::GET, &format!("/api/v1/operation-logs?target_type=payer&search={payer_id}"), None)
        .await?;
    assert_eq!(status, HttpStatusCode::OK);
    assert!(body["data"]["total"].as_u64().unwrap_or_default() >= 1);
    Ok(())
}

#[tokio::test]
async fn invoice_draft_post_and_delete() -> anyhow::Result<()> {
    if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
    let app = start_server().await?;
    let customer = format!("E2E Customer {}", Uuid::new_v4().simple());

    let (status, body) = app
        .send(
            reqwest::Method::POST,
            "/api/v1/invoices",
            Some(json!({
                "customer_name": customer,
                "invoice_date": "2031-05-10",
                "items": [{"label": "Support", "quantity": 2, "price": 100.0}]
            })),
        )
        .await?;
    assert_eq!(status, HttpStatusCode::OK);
    let inv = &body["data"];
    assert_eq!(inv["status"], "DRAFT");
    assert!(inv["invoice_number"].as_str().unwrap_or_default().starts_with("INV-203105-"));
    assert_eq!(inv["grand_total"], 200.0);
    let id = inv["id"].as_str().unwrap_or_default().to_string();

    let (status, body) = app.send(reqwest::Method::POST, &format!("/api/v1/invoices/{id}/post"), None).await?;
    assert_eq!(status, HttpStatusCode::OK);
    assert_eq!(body["data"]["status"], "POSTED");
    assert!(body["data"]["payment_reference"].as_str().unwrap_or_default().starts_with("PR-"));

    let (status, _) = app.send(reqwest::Method::POST, &format!("/api/v1/invoices/{id}/post"), None).await?;
    assert_eq!(status, HttpStatusCode::CONFLICT);

    let (status, _) = app.send(reqwest::Method::DELETE, "/api/v1/invoices", Some(json!({"ids": []}))).await?;
    assert_eq!(status, HttpStatusCode::BAD_REQUEST);

    let (status, body) = app.send(reqwest::Method::DELETE, "/api/v1/invoices", Some(json!({"ids": [id]}))).await?;
    assert_eq!(status, HttpStatusCode::OK);
    assert_eq!(body["data"]["deleted"], 1);

    let (status, _) = app.send(reqwest::Method::GET, &format!("/api/v1/invoices/{id}"), None).await?;
    assert_eq!(status, HttpStatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn monthly_payments_require_month() -> anyhow::Result<()> {
    if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
    let app = start_server().await?;
    let (status, _) = app.send(reqwest::Method::GET, "/api/v1/finance/monthly-payments", None).await?;
    assert_eq!(status, HttpStatusCode::BAD_REQUEST);
    let (status, body) = app.send(reqwest::Method::GET, "/api/v1/finance/monthly-payments?month=2031-13", None).await?;
    assert_eq!(status, HttpStatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 400);
    Ok(())
}
