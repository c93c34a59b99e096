use fibcalc_infra::AppConfig;
use reqwest::StatusCode;
use serde_json::json;

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        fibcalc_observability::tracing::init_pretty();

        // Same router as prod (in-memory stores + in-process worker), ephemeral port.
        let config = AppConfig::default();
        let app = fibcalc_api::app::build_app(&config)
            .await
            .expect("failed to build app");
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn current(client: &reqwest::Client, srv: &TestServer) -> serde_json::Value {
    client
        .get(srv.url("/values/current"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

async fn current_value_eventually(
    client: &reqwest::Client,
    srv: &TestServer,
    index: &str,
    expected: &str,
) {
    // The worker is out of band: poll until it writes the result.
    for _ in 0..100 {
        let body = current(client, srv).await;
        if body[index] == expected {
            return;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    panic!("index {index} never reached {expected}");
}

#[tokio::test]
async fn root_says_hi() {
    let srv = TestServer::spawn().await;
    let res = reqwest::get(srv.url("/")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "Hi");
}

#[tokio::test]
async fn empty_stores_return_empty_collections() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let all: serde_json::Value = client.get(srv.url("/values/all")).send().await.unwrap().json().await.unwrap();
    assert_eq!(all, json!([]));
    assert_eq!(current(&client, &srv).await, json!({}));
}

#[tokio::test]
async fn submit_then_poll_until_computed() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/values"))
        .json(&json!({ "index": "7" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body, json!({ "working": true }));

    // Either still pending or already done, never missing.
    let snapshot = current(&client, &srv).await;
    assert!(snapshot["7"] == "Nothing yet!" || snapshot["7"] == "13", "got {snapshot}");

    current_value_eventually(&client, &srv, "7", "13").await;

    let all: serde_json::Value = client.get(srv.url("/values/all")).send().await.unwrap().json().await.unwrap();
    assert_eq!(all, json!([{ "number": 7 }]));
}

#[tokio::test]
async fn numeric_body_is_accepted_and_duplicates_are_recorded() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    for body in [json!({ "index": 5 }), json!({ "index": "5" }), json!({ "index": 0 })] {
        let res = client.post(srv.url("/values")).json(&body).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    current_value_eventually(&client, &srv, "5", "5").await;
    current_value_eventually(&client, &srv, "0", "0").await;

    let all: serde_json::Value = client.get(srv.url("/values/all")).send().await.unwrap().json().await.unwrap();
    assert_eq!(all, json!([{ "number": 5 }, { "number": 5 }, { "number": 0 }]));
    assert_eq!(current(&client, &srv).await.as_object().unwrap().len(), 2);
}

#[tokio::test]
async fn invalid_indices_are_rejected_without_side_effects() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    for body in [
        json!({ "index": "41" }),
        json!({ "index": 41 }),
        json!({ "index": "-1" }),
        json!({ "index": "abc" }),
        json!({ "index": 2.5 }),
        json!({}),
    ] {
        let res = client.post(srv.url("/values")).json(&body).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY, "body {body}");
        let err: serde_json::Value = res.json().await.unwrap();
        assert_eq!(err["error"], "validation_error");
    }

    let all: serde_json::Value = client.get(srv.url("/values/all")).send().await.unwrap().json().await.unwrap();
    assert_eq!(all, json!([]));
    assert_eq!(current(&client, &srv).await, json!({}));
}

#[tokio::test]
async fn health_reports_in_process_worker() {
    let srv = TestServer::spawn().await;
    let body: serde_json::Value = reqwest::get(srv.url("/health")).await.unwrap().json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["worker"]["jobs_received"], 0);
}
