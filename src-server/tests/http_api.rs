use std::path::PathBuf;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    response::Response,
    Router,
};
use tower::ServiceExt;

use atm_core::{Atm, Config, Database};
use atm_server::{build_router, AppState};

struct TestApp {
    atm: Atm,
    router: Router,
}

impl TestApp {
    fn new(allow_overdraft: bool) -> Self {
        let mut config = Config::new(PathBuf::from(":memory:"));
        config.allow_overdraft = allow_overdraft;
        let atm = Atm::with_database(config, Database::open_in_memory().unwrap()).unwrap();
        let router = build_router(AppState::new(atm.clone()));
        Self { atm, router }
    }

    async fn send(&self, req: Request<Body>) -> Response {
        self.router.clone().oneshot(req).await.unwrap()
    }

    async fn login(&self, pin: &str) -> String {
        let res = self
            .send(
                Request::builder()
                    .uri("/login")
                    .header("nip", pin)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await;
        assert_eq!(res.status(), StatusCode::OK);
        res.headers()
            .get("sessionid")
            .expect("login must return a SessionID header")
            .to_str()
            .unwrap()
            .to_string()
    }

    async fn balance(&self, token: &str) -> (StatusCode, String) {
        let res = self
            .send(
                Request::builder()
                    .uri("/balance")
                    .header("Authorization", token)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await;
        let status = res.status();
        (status, body_text(res).await)
    }

    async fn post(&self, path: &str, token: &str, body: &str) -> (StatusCode, String) {
        let res = self
            .send(
                Request::builder()
                    .method("POST")
                    .uri(path)
                    .header("Authorization", token)
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await;
        let status = res.status();
        (status, body_text(res).await)
    }
}

async fn body_text(res: Response) -> String {
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn login_deposit_withdraw_flow() {
    let app = TestApp::new(false);
    app.atm.ledger().open_account("4623", 0).unwrap();

    let token = app.login("4623").await;

    assert_eq!(app.post("/deposit", &token, "100").await, (StatusCode::OK, "ok".to_string()));
    assert_eq!(app.balance(&token).await, (StatusCode::OK, "100".to_string()));

    let (status, body) = app.post("/withdraw", &token, "150").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body, "insufficient funds");
    assert_eq!(app.balance(&token).await, (StatusCode::OK, "100".to_string()));

    assert_eq!(app.post("/withdraw", &token, "30").await.0, StatusCode::OK);
    assert_eq!(app.balance(&token).await.1, "70");
}

#[tokio::test]
async fn overdraft_allowed_goes_negative() {
    let app = TestApp::new(true);
    app.atm.ledger().open_account("4623", 0).unwrap();
    let token = app.login("4623").await;

    app.post("/deposit", &token, "100").await;
    assert_eq!(app.post("/withdraw", &token, "150").await.0, StatusCode::OK);
    assert_eq!(app.balance(&token).await.1, "-50");
}

#[tokio::test]
async fn login_rejections() {
    let app = TestApp::new(false);
    app.atm.ledger().open_account("4623", 0).unwrap();

    let res = app
        .send(Request::builder().uri("/login").body(Body::empty()).unwrap())
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_text(res).await, "missing header: 'nip'");

    let res = app
        .send(
            Request::builder()
                .uri("/login")
                .header("nip", "9999")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(res.headers().get("sessionid").is_none());
    assert_eq!(body_text(res).await, "invalid nip");
    assert!(app.atm.session_manager().is_empty());
}

#[tokio::test]
async fn authorization_rejections() {
    let app = TestApp::new(false);

    let res = app
        .send(Request::builder().uri("/balance").body(Body::empty()).unwrap())
        .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_text(res).await, "unauthorized");

    assert_eq!(
        app.balance("not-a-uuid").await,
        (StatusCode::BAD_REQUEST, "invalid authorization".to_string())
    );
    assert_eq!(
        app.balance("8f14e45f-ceea-467f-a0e5-6f8e3a1b2c3d").await,
        (StatusCode::UNAUTHORIZED, "invalid authorization".to_string())
    );
}

#[tokio::test]
async fn expired_session_is_rejected() {
    let app = TestApp::new(false);
    let account = app.atm.ledger().open_account("4623", 0).unwrap();

    let past = chrono::Utc::now() - chrono::Duration::minutes(11);
    let session = app
        .atm
        .session_manager()
        .create_session_at(account, past);

    assert_eq!(
        app.balance(&session.id.to_string()).await,
        (StatusCode::UNAUTHORIZED, "session expired".to_string())
    );
}

#[tokio::test]
async fn malformed_amount_is_rejected_without_side_effects() {
    let app = TestApp::new(false);
    let account = app.atm.ledger().open_account("4623", 10).unwrap();
    let token = app.login("4623").await;

    for body in ["", "abc", "-5", "1.5"] {
        let (status, text) = app.post("/deposit", &token, body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body {body:?}");
        assert_eq!(text, "invalid amount");
    }

    assert_eq!(app.atm.ledger().balance(account).unwrap(), 10);
    assert!(app.atm.ledger().transactions(account).unwrap().is_empty());
}

#[tokio::test]
async fn wrong_method_is_not_allowed() {
    let app = TestApp::new(false);
    app.atm.ledger().open_account("4623", 0).unwrap();
    let token = app.login("4623").await;

    let res = app
        .send(
            Request::builder()
                .uri("/deposit")
                .header("Authorization", &token)
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn wrong_method_is_rejected_before_authorization() {
    let app = TestApp::new(false);
    let account = app.atm.ledger().open_account("4623", 10).unwrap();

    for uri in ["/deposit", "/withdraw"] {
        let res = app
            .send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await;
        assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
    assert_eq!(app.atm.ledger().balance(account).unwrap(), 10);
}

#[tokio::test]
async fn transactions_lists_committed_entries() {
    let app = TestApp::new(false);
    app.atm.ledger().open_account("4623", 0).unwrap();
    let token = app.login("4623").await;

    app.post("/deposit", &token, "100").await;
    app.post("/withdraw", &token, "40").await;

    let res = app
        .send(
            Request::builder()
                .uri("/transactions")
                .header("Authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(res.status(), StatusCode::OK);

    let entries: serde_json::Value = serde_json::from_str(&body_text(res).await).unwrap();
    let entries = entries.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["kind"], "deposit");
    assert_eq!(entries[0]["amount"], 100);
    assert_eq!(entries[1]["kind"], "withdrawal");
    assert_eq!(entries[1]["amount"], -40);
}

#[tokio::test]
async fn storage_failure_reports_failed_transaction() {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open(dir.path().join("atm.db")).unwrap();
    let atm = Atm::with_database(Config::new(dir.path().to_path_buf()), db.clone()).unwrap();
    let account = atm.ledger().open_account("4623", 50).unwrap();
    let app = TestApp {
        router: build_router(AppState::new(atm.clone())),
        atm,
    };
    let token = app.login("4623").await;

    db.with_connection(|conn| {
        conn.execute_batch(
            "CREATE TRIGGER fail_log BEFORE INSERT ON transactions
             BEGIN SELECT RAISE(ABORT, 'log unavailable'); END;",
        )?;
        Ok(())
    })
    .unwrap();

    assert_eq!(
        app.post("/deposit", &token, "100").await,
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "failed to perform deposit".to_string()
        )
    );
    assert_eq!(app.atm.ledger().balance(account).unwrap(), 50);
    assert!(app.atm.ledger().transactions(account).unwrap().is_empty());
}
