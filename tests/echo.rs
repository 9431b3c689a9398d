use llm_inference_core::{runtime::EchoEngineLoader, Session, SessionOptions, SummaryMode};
use std::time::Duration;

fn options(model: &tempfile::NamedTempFile, summary: SummaryMode) -> SessionOptions {
    SessionOptions {
        model_path: model.path().to_path_buf(),
        max_tokens: 1024,
        prompt_suffix: "<start_of_turn>model\n".to_string(),
        summary,
    }
}

#[tokio::test(start_paused = true)]
async fn test_echo_session_end_to_end() {
    let model = tempfile::NamedTempFile::new().unwrap();
    let loader = EchoEngineLoader::new(Duration::from_millis(25));
    let session = Session::open(options(&model, SummaryMode::OnDemand), &loader)
        .await
        .unwrap();
    let mut results = session.subscribe();

    let request_id = session.generate("hello brave new world").await.unwrap();
    let text = results.collect_request(request_id).await.unwrap();

    assert_eq!(text, "hello brave new world");
    let metrics = session.metrics();
    assert_eq!(metrics.token_count, 4);
    assert_eq!(metrics.ttft_ms, 25);
    assert_eq!(metrics.latency_ms, 100);
    assert_eq!(metrics.tpot_ms, 25);
}

#[tokio::test(start_paused = true)]
async fn test_echo_session_emits_summary() {
    let model = tempfile::NamedTempFile::new().unwrap();
    let loader = EchoEngineLoader::new(Duration::from_millis(10));
    let session = Session::open(options(&model, SummaryMode::Emit), &loader)
        .await
        .unwrap();
    let mut results = session.subscribe();

    let first = session.generate("ping pong").await.unwrap();
    let text = results.collect_request(first).await.unwrap();
    assert!(text.starts_with("ping pong\nTTFT: 10ms\nTPOT: 10ms\nLatency: 20ms"));

    let second = session.generate("again").await.unwrap();
    assert_eq!(second, first + 1);
    let text = results.collect_request(second).await.unwrap();
    assert!(text.starts_with("again\nTTFT: 10ms"));
}
