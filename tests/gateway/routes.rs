use super::support::{Harness, SYSTEM_PROMPT, ScriptedNarrative, png_for, reply};
use infinite_adventure::Config;
use infinite_adventure::cache::Fingerprint;
use infinite_adventure::game::OPENING_ACTION;
use infinite_adventure::gateway;
use reqwest::StatusCode;
use serde_json::{Value, json};

struct TestServer {
    base: String,
    client: reqwest::Client,
    harness: Harness,
}

impl TestServer {
    async fn spawn(narrative: ScriptedNarrative) -> Self {
        let harness = Harness::new(narrative);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let services = harness.services.clone();
        tokio::spawn(async move {
            gateway::serve(listener, services, &Config::default())
                .await
                .unwrap();
        });

        Self {
            base: format!("http://{addr}"),
            client: reqwest::Client::new(),
            harness,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base, path.trim_start_matches('/'))
    }

    async fn start(&self) -> Value {
        let resp = self.client.post(self.url("/start")).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        resp.json().await.unwrap()
    }

    async fn act(&self, body: Value) -> reqwest::Response {
        self.client
            .post(self.url("/act"))
            .json(&body)
            .send()
            .await
            .unwrap()
    }
}

#[tokio::test]
async fn health_reports_ok() {
    let server = TestServer::spawn(ScriptedNarrative::new()).await;

    let resp = server.client.get(server.url("/health")).send().await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn start_returns_a_flat_turn_outcome() {
    let server = TestServer::spawn(ScriptedNarrative::new()).await;

    let body = server.start().await;

    let session_id = body["session_id"].as_str().unwrap();
    assert!(!session_id.is_empty());
    assert_eq!(body["new_scene"], true);
    assert_eq!(body["objects"], json!(["barrel", "door"]));
    assert_eq!(body["inventory"], json!(["key"]));
    assert!(body["story_text"].as_str().unwrap().contains("<object>door</object>"));
    let image_url = body["image_url"].as_str().unwrap();
    assert!(image_url.ends_with(&format!("?session={session_id}")));
}

#[tokio::test]
async fn act_advances_the_story() {
    let server = TestServer::spawn(ScriptedNarrative::new().with_reply(
        "use key on door",
        reply("The <object>door</object> opens.").build(),
    ))
    .await;
    let started = server.start().await;

    let resp = server
        .act(json!({
            "session_id": started["session_id"],
            "item": "key",
            "object": "door",
        }))
        .await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["story_text"], "The <object>door</object> opens.");
    assert_eq!(body["new_scene"], false);
    assert_eq!(body["image_url"], Value::Null);
}

#[tokio::test]
async fn guard_rejection_is_a_normal_response() {
    let server = TestServer::spawn(ScriptedNarrative::new()).await;
    let started = server.start().await;

    let resp = server
        .act(json!({
            "session_id": started["session_id"],
            "item": "sword",
            "object": "door",
        }))
        .await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["story_text"], "You have no sword.");
    assert_eq!(server.harness.narrative.calls(), 1);
}

#[tokio::test]
async fn act_validates_its_body() {
    let server = TestServer::spawn(ScriptedNarrative::new()).await;
    let started = server.start().await;

    let garbled = server
        .client
        .post(server.url("/act"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(garbled.status(), StatusCode::BAD_REQUEST);

    let blank = server
        .act(json!({
            "session_id": started["session_id"],
            "item": "  ",
            "object": "door",
        }))
        .await;
    assert_eq!(blank.status(), StatusCode::BAD_REQUEST);
    let body: Value = blank.json().await.unwrap();
    assert!(body["error"].as_str().is_some());
}

#[tokio::test]
async fn unknown_session_is_not_found() {
    let server = TestServer::spawn(ScriptedNarrative::new()).await;

    let resp = server
        .act(json!({"session_id": "nope", "item": "key", "object": "door"}))
        .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = server.client.get(server.url("/state/nope")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_reply_is_a_bad_gateway() {
    let server = TestServer::spawn(
        ScriptedNarrative::new().with_reply("use key on door", "not json at all"),
    )
    .await;
    let started = server.start().await;

    let resp = server
        .act(json!({
            "session_id": started["session_id"],
            "item": "key",
            "object": "door",
        }))
        .await;

    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn state_replays_the_latest_outcome() {
    let server = TestServer::spawn(ScriptedNarrative::new()).await;
    let started = server.start().await;
    let id = started["session_id"].as_str().unwrap();

    let resp = server
        .client
        .get(server.url(&format!("/state/{id}")))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["story_text"], started["story_text"]);
    assert_eq!(body["objects"], started["objects"]);
    assert_eq!(body["image_url"], Value::Null);
}

#[tokio::test]
async fn image_is_rendered_on_first_request() {
    let server = TestServer::spawn(ScriptedNarrative::new()).await;
    let started = server.start().await;
    let image_url = started["image_url"].as_str().unwrap();

    let resp = server.client.get(server.url(image_url)).send().await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get("content-type").unwrap(),
        "image/png"
    );
    let bytes = resp.bytes().await.unwrap();
    assert_eq!(&bytes[..], png_for("a dim cellar with a locked door").as_slice());

    let again = server.client.get(server.url(image_url)).send().await.unwrap();
    assert_eq!(again.status(), StatusCode::OK);
    assert_eq!(server.harness.images.calls(), 1);
}

#[tokio::test]
async fn unknown_or_invalid_images_are_rejected() {
    let server = TestServer::spawn(ScriptedNarrative::new()).await;
    server.start().await;

    let unknown = Fingerprint::image("never scheduled");
    let resp = server
        .client
        .get(server.url(&format!("/image/{unknown}.png")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = server
        .client
        .get(server.url("/image/not-a-digest.png"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn continuation_returns_the_cached_reply() {
    let server = TestServer::spawn(ScriptedNarrative::new()).await;
    server.start().await;
    let fp = Fingerprint::narrative(SYSTEM_PROMPT, &[], &[OPENING_ACTION.to_string()]);

    let resp = server
        .client
        .get(server.url(&format!("/api/continuations/{fp}")))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["fingerprint"], fp.as_str());
    let cached: Value = serde_json::from_str(body["response"].as_str().unwrap()).unwrap();
    assert_eq!(cached["new_scene"], true);

    let missing = Fingerprint::narrative(SYSTEM_PROMPT, &[], &["dance".to_string()]);
    let resp = server
        .client
        .get(server.url(&format!("/api/continuations/{missing}")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn stats_count_sessions_and_cache_entries() {
    let server = TestServer::spawn(ScriptedNarrative::new()).await;
    server.start().await;
    server.start().await;

    let resp = server.client.get(server.url("/stats")).send().await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["sessions"], 2);
    assert_eq!(body["session_backend"], "memory");
    assert_eq!(body["narrative_cache"]["entries"], 1);
    assert_eq!(body["image_cache"]["entries"], 0);
}
