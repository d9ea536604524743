//! Pipeline integration tests against mocked upstream APIs.

use std::time::Duration;

use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use reel_models::Stage;
use reel_pipeline::images::BatchOptions;
use reel_pipeline::{ImageClient, Pipeline, PipelineConfig, PipelineError, ScriptClient};

fn config_for(server: &MockServer) -> PipelineConfig {
    PipelineConfig {
        openai_api_key: "test-key".to_string(),
        openai_base_url: format!("{}/v1", server.uri()),
        ..PipelineConfig::default()
    }
}

fn chat_body(bundle: serde_json::Value) -> serde_json::Value {
    serde_json::json!({
        "choices": [{"message": {"content": bundle.to_string()}}]
    })
}

fn image_body(url: &str) -> serde_json::Value {
    serde_json::json!({"data": [{"url": url}]})
}

#[tokio::test]
async fn script_client_parses_bundle_and_pads_captions() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_body(serde_json::json!({
            "script": "Rome rose from a village on the Tiber.",
            "image_prompts": ["forum at dawn", "legion on the march", "the senate floor"],
            "text_overlays": ["Rome, 753 BC"],
            "duration": 62.4
        }))))
        .mount(&server)
        .await;

    let client = ScriptClient::new(&config_for(&server));
    let bundle = client.generate_script("The rise of Rome").await.unwrap();

    assert_eq!(bundle.image_prompts.len(), 3);
    assert_eq!(bundle.captions.len(), 3);
    assert_eq!(bundle.captions[0], "Rome, 753 BC");
    assert_eq!(bundle.captions[1], "Historical Scene");
    assert_eq!(bundle.duration_secs, 62);
}

#[tokio::test]
async fn script_client_rejects_bundle_missing_prompts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_body(serde_json::json!({
            "script": "narration only",
            "image_prompts": [],
            "duration": 60.0
        }))))
        .mount(&server)
        .await;

    let client = ScriptClient::new(&config_for(&server));
    let err = client.generate_script("topic").await.unwrap_err();
    assert!(matches!(err, PipelineError::GenerationFailed(_)));
}

#[tokio::test]
async fn script_client_surfaces_upstream_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream down"))
        .mount(&server)
        .await;

    let client = ScriptClient::new(&config_for(&server));
    let err = client.generate_script("topic").await.unwrap_err();
    assert!(matches!(err, PipelineError::GenerationFailed(_)));
}

#[tokio::test]
async fn batching_skips_failures_and_preserves_index_order() {
    let server = MockServer::start().await;

    // The poisoned prompt fails; everything else succeeds.
    Mock::given(method("POST"))
        .and(path("/v1/images/generations"))
        .and(body_string_contains("prompt three"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/images/generations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(image_body("http://img/x.png")))
        .mount(&server)
        .await;

    let client = ImageClient::new(&config_for(&server));
    let prompts: Vec<String> = [
        "prompt one",
        "prompt two",
        "prompt three",
        "prompt four",
        "prompt five",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();

    let options = BatchOptions {
        batch_size: 2,
        timeout: Duration::from_secs(30),
        delay: Duration::from_millis(0),
    };
    let candidates = client.generate_batched(&prompts, &options).await;

    // Prompt 3 is lost; survivors keep their original 1-based indices
    // in increasing order.
    let indices: Vec<usize> = candidates.iter().map(|c| c.index).collect();
    assert_eq!(indices, vec![1, 2, 4, 5]);
}

#[tokio::test]
async fn batch_timeout_drops_the_whole_batch() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/images/generations"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(image_body("http://img/slow.png"))
                .set_delay(Duration::from_secs(30)),
        )
        .mount(&server)
        .await;

    let client = ImageClient::new(&config_for(&server));
    let prompts = vec!["a".to_string(), "b".to_string()];
    let options = BatchOptions {
        batch_size: 3,
        timeout: Duration::from_millis(200),
        delay: Duration::from_millis(0),
    };

    let start = std::time::Instant::now();
    let candidates = client.generate_batched(&prompts, &options).await;

    assert!(candidates.is_empty());
    // The timeout bounds the batch; we never wait out the slow mock.
    assert!(start.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn timed_out_batch_discards_early_finishers() {
    let server = MockServer::start().await;

    // One instant response, one that hangs past the deadline. The
    // deadline applies to the batch as a unit, so the fast result is
    // discarded along with the slow one.
    Mock::given(method("POST"))
        .and(path("/v1/images/generations"))
        .and(body_string_contains("slow prompt"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(image_body("http://img/slow.png"))
                .set_delay(Duration::from_secs(30)),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/images/generations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(image_body("http://img/fast.png")))
        .mount(&server)
        .await;

    let client = ImageClient::new(&config_for(&server));
    let prompts = vec!["fast prompt".to_string(), "slow prompt".to_string()];
    let options = BatchOptions {
        batch_size: 2,
        timeout: Duration::from_millis(500),
        delay: Duration::from_millis(0),
    };

    let candidates = client.generate_batched(&prompts, &options).await;
    assert!(candidates.is_empty());
}

#[tokio::test]
async fn timed_out_batch_loses_only_its_own_prompts() {
    let server = MockServer::start().await;

    // Fourteen prompts in batches of three: the fourth batch (prompts
    // 10..=12) hangs past the deadline, everything else is instant.
    for slow in ["prompt 10", "prompt 11", "prompt 12"] {
        Mock::given(method("POST"))
            .and(path("/v1/images/generations"))
            .and(body_string_contains(slow))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(image_body("http://img/slow.png"))
                    .set_delay(Duration::from_secs(30)),
            )
            .mount(&server)
            .await;
    }
    Mock::given(method("POST"))
        .and(path("/v1/images/generations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(image_body("http://img/ok.png")))
        .mount(&server)
        .await;

    let client = ImageClient::new(&config_for(&server));
    let prompts: Vec<String> = (1..=14).map(|i| format!("prompt {}", i)).collect();
    let options = BatchOptions {
        batch_size: 3,
        timeout: Duration::from_millis(300),
        delay: Duration::from_millis(0),
    };

    let candidates = client.generate_batched(&prompts, &options).await;

    let indices: Vec<usize> = candidates.iter().map(|c| c.index).collect();
    assert_eq!(indices, vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 13, 14]);
    assert_eq!(candidates.len(), 11);
}

#[tokio::test]
async fn downloads_are_best_effort() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/images/2.png"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"png-bytes".to_vec()))
        .mount(&server)
        .await;

    let candidates = vec![
        reel_pipeline::ImageCandidate {
            index: 1,
            url: format!("{}/images/1.png", server.uri()),
        },
        reel_pipeline::ImageCandidate {
            index: 2,
            url: format!("{}/images/2.png", server.uri()),
        },
        reel_pipeline::ImageCandidate {
            index: 4,
            url: format!("{}/images/4.png", server.uri()),
        },
    ];

    let dir = tempfile::tempdir().unwrap();
    let client = reqwest::Client::new();
    let mut progress = Vec::new();
    let assets = reel_pipeline::downloads::download_many(
        &client,
        &candidates,
        dir.path(),
        |done| progress.push(done),
    )
    .await;

    let indices: Vec<usize> = assets.iter().map(|a| a.index).collect();
    assert_eq!(indices, vec![1, 4]);
    assert!(dir.path().join("image_01.png").exists());
    assert!(dir.path().join("image_04.png").exists());
    assert!(!dir.path().join("image_02.png").exists());

    // Progress counts successes only; the 404 never advances it.
    assert_eq!(progress, vec![1, 2]);
}

#[tokio::test]
async fn session_with_zero_surviving_images_ends_in_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_body(serde_json::json!({
            "script": "A short history of nothing surviving.",
            "image_prompts": ["scene one", "scene two"],
            "text_overlays": ["One", "Two"],
            "duration": 60.0
        }))))
        .mount(&server)
        .await;
    // Every image generation fails, so nothing reaches assembly.
    Mock::given(method("POST"))
        .and(path("/v1/images/generations"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    // Narration comes back fine; duration probing falls back to the
    // word-count estimate for the fake bytes.
    Mock::given(method("POST"))
        .and(path("/text-to-speech/21m00Tcm4TlvDq8ikWAM"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"mp3-bytes".to_vec()))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut config = config_for(&server);
    config.output_dir = dir.path().to_path_buf();
    config.elevenlabs_api_key = Some("test-key".to_string());
    config.elevenlabs_base_url = server.uri();
    let pipeline = Pipeline::new(config);

    let session = pipeline.start("Nothing survives").unwrap();

    let final_session = loop {
        let snapshot = pipeline.status(&session.session_id).unwrap();
        if snapshot.is_terminal() {
            break snapshot;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    };

    assert_eq!(final_session.stage, Stage::Error);
    assert_eq!(final_session.error.as_deref(), Some("No images to stitch"));
    // Failure happened at assembly, after the voiceover checkpoint.
    assert_eq!(final_session.progress, 85);
    assert!(final_session.video_path.is_none());
}

#[tokio::test]
async fn failed_script_generation_moves_session_to_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("no capacity"))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut config = config_for(&server);
    config.output_dir = dir.path().to_path_buf();
    let pipeline = Pipeline::new(config);

    let session = pipeline.start("Doomed topic").unwrap();

    // Poll until the background task lands in a terminal state.
    let mut observed_progress = 0u8;
    let final_session = loop {
        let snapshot = pipeline.status(&session.session_id).unwrap();
        assert!(snapshot.progress >= observed_progress, "progress went backwards");
        observed_progress = snapshot.progress;
        if snapshot.is_terminal() {
            break snapshot;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    };

    assert_eq!(final_session.stage, Stage::Error);
    assert!(final_session.error.is_some());
    assert!(final_session.message.starts_with("Error:"));
    assert!(final_session.video_path.is_none());
}
