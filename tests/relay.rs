//! End-to-end relay behaviour against stub upstreams.

use std::time::Duration;

use reqwest::StatusCode;
use tts_relay::config::LimitLevelConfig;

mod common;

use common::{client, relay_config, relay_url, start_relay, start_stub_upstream, StubReply, CREDENTIAL, QUERY};

const UPSTREAM_MESSAGE: &str = r#"{"message":"Cannot communicate with upstream service"}"#;

#[tokio::test]
async fn test_audio_passes_through_unmodified() {
    let audio = b"RIFF\x24\x00\x00\x00WAVEfmt \x10\x00\x00\x00".to_vec();
    let (upstream, captured) = start_stub_upstream(StubReply::audio(&audio)).await;
    let (relay, shutdown) = start_relay(relay_config(upstream)).await;

    let res = client().get(relay_url(relay, QUERY)).send().await.expect("Relay unreachable");

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["content-type"], "audio/wav");
    assert_eq!(res.bytes().await.unwrap().to_vec(), audio);

    // One call, credentialed, with the query string as its body.
    let captured = captured.lock().unwrap().clone();
    assert_eq!(captured.len(), 1);
    let head = captured[0].head.to_ascii_lowercase();
    assert!(head.starts_with("post /v1/tts "));
    assert!(head.contains(&format!("authorization: {}", CREDENTIAL.to_ascii_lowercase())));
    assert_eq!(captured[0].body, QUERY.as_bytes());

    shutdown.trigger();
}

#[tokio::test]
async fn test_upstream_error_status_is_bad_gateway() {
    let reply = StubReply {
        status: 500,
        content_type: "text/plain",
        body: b"secret internal failure".to_vec(),
        delay: Duration::ZERO,
    };
    let (upstream, _) = start_stub_upstream(reply).await;
    let (relay, shutdown) = start_relay(relay_config(upstream)).await;

    let res = client().get(relay_url(relay, QUERY)).send().await.unwrap();

    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(res.text().await.unwrap(), UPSTREAM_MESSAGE);

    shutdown.trigger();
}

#[tokio::test]
async fn test_upstream_json_body_is_bad_gateway() {
    let reply = StubReply {
        status: 200,
        content_type: "application/json",
        body: br#"{"error":{"message":"Unauthorized"}}"#.to_vec(),
        delay: Duration::ZERO,
    };
    let (upstream, _) = start_stub_upstream(reply).await;
    let (relay, shutdown) = start_relay(relay_config(upstream)).await;

    let res = client().get(relay_url(relay, QUERY)).send().await.unwrap();

    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(res.text().await.unwrap(), UPSTREAM_MESSAGE);

    shutdown.trigger();
}

#[tokio::test]
async fn test_upstream_timeout_is_bad_gateway() {
    let reply = StubReply {
        delay: Duration::from_secs(5),
        ..StubReply::audio(b"late")
    };
    let (upstream, _) = start_stub_upstream(reply).await;
    let mut config = relay_config(upstream);
    config.upstream.timeout_secs = 1;
    let (relay, shutdown) = start_relay(config).await;

    let started = std::time::Instant::now();
    let res = client().get(relay_url(relay, QUERY)).send().await.unwrap();

    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    assert!(started.elapsed() < Duration::from_secs(4), "timeout not enforced");
    assert_eq!(res.text().await.unwrap(), UPSTREAM_MESSAGE);

    shutdown.trigger();
}

#[tokio::test]
async fn test_unreachable_upstream_is_bad_gateway() {
    // Bind then drop to get a port nothing listens on.
    let closed = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let upstream = closed.local_addr().unwrap();
    drop(closed);

    let (relay, shutdown) = start_relay(relay_config(upstream)).await;
    let res = client().get(relay_url(relay, QUERY)).send().await.unwrap();

    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(res.text().await.unwrap(), UPSTREAM_MESSAGE);

    shutdown.trigger();
}

#[tokio::test]
async fn test_rejections_never_reach_upstream() {
    let (upstream, captured) = start_stub_upstream(StubReply::audio(b"RIFF")).await;
    let (relay, shutdown) = start_relay(relay_config(upstream)).await;

    let res = client().post(relay_url(relay, QUERY)).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(res.text().await.unwrap(), r#"{"message":"Your request is unacceptable"}"#);

    let res = reqwest::Client::builder()
        .user_agent("Mozilla/5.0")
        .no_proxy()
        .build()
        .unwrap()
        .get(relay_url(relay, QUERY))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let without_text = QUERY.replace("text=hello", "words=hello");
    let res = client().get(relay_url(relay, &without_text)).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    assert!(captured.lock().unwrap().is_empty());

    shutdown.trigger();
}

#[tokio::test]
async fn test_caller_quota_enforced() {
    let (upstream, captured) = start_stub_upstream(StubReply::audio(b"RIFF")).await;
    let mut config = relay_config(upstream);
    config.limits.0 = vec![
        LimitLevelConfig {
            window_secs: 60,
            max_calls_per_caller: 2,
            max_total_callers: 5,
        },
        LimitLevelConfig {
            window_secs: 86_400,
            max_calls_per_caller: 10,
            max_total_callers: 5,
        },
    ];
    let (relay, shutdown) = start_relay(config).await;
    let client = client();

    for _ in 0..2 {
        let res = client.get(relay_url(relay, QUERY)).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    let res = client.get(relay_url(relay, QUERY)).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(
        res.text().await.unwrap(),
        r#"{"message":"You have made too many calls to the service"}"#
    );
    assert_eq!(captured.lock().unwrap().len(), 2);

    shutdown.trigger();
}

#[tokio::test]
async fn test_mangled_path_redirects() {
    let (upstream, _) = start_stub_upstream(StubReply::audio(b"RIFF")).await;
    let (relay, shutdown) = start_relay(relay_config(upstream)).await;

    let no_redirect = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .no_proxy()
        .build()
        .unwrap();
    let res = no_redirect
        .get(format!("http://{}/API/Voice--Text/", relay))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(res.headers()["location"], "/api/voice-text");

    shutdown.trigger();
}
