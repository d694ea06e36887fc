use crate::{closed_port, init_logging, start_server, FILE_SIZE, FLAKY_FAILURES, SLOW_CHUNK};
use manic_fetch::progress::ProgressSample;
use manic_fetch::{Client, FetchError, StatusCode};
use std::time::Duration;

#[tokio::test]
async fn downloads_whole_file() -> manic_fetch::Result<()> {
    init_logging();
    let addr = start_server().await;
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<ProgressSample>();
    let body = Client::new()?
        .get(&format!("http://{}/file", addr))
        .progress(tx)
        .bytes()
        .await?;
    assert_eq!(body.len(), FILE_SIZE);
    assert!(body.iter().all(|b| *b == 7));
    while let Ok(sample) = rx.try_recv() {
        assert!(sample.completed <= FILE_SIZE as u64);
    }
    Ok(())
}

#[tokio::test]
async fn slow_body_reports_progress() -> manic_fetch::Result<()> {
    init_logging();
    let addr = start_server().await;
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<ProgressSample>();
    let body = Client::new()?
        .get(&format!("http://{}/slow", addr))
        .progress_every(tx, Duration::ZERO)
        .bytes()
        .await?;
    assert_eq!(body.len(), 3 * SLOW_CHUNK);

    let mut samples = Vec::new();
    while let Ok(sample) = rx.try_recv() {
        samples.push(sample);
    }
    assert!(!samples.is_empty());
    for pair in samples.windows(2) {
        assert!(pair[1].completed > pair[0].completed);
    }
    for sample in &samples {
        assert!(sample.speed > 0);
        assert!(sample.elapsed >= Duration::from_secs(1));
        assert!(sample.completed <= 3 * SLOW_CHUNK as u64);
    }
    Ok(())
}

#[tokio::test]
async fn retries_until_flaky_endpoint_recovers() -> manic_fetch::Result<()> {
    init_logging();
    let addr = start_server().await;
    let (log, lines) = std::sync::mpsc::channel::<String>();
    let text = Client::new()?
        .get(&format!("http://{}/flaky", addr))
        .retry(FLAKY_FAILURES + 1, Duration::from_millis(50))
        .log(log)
        .text()
        .await?;
    assert_eq!(text, "ok");
    let lines = lines.try_iter().collect::<Vec<_>>();
    assert_eq!(lines.len(), FLAKY_FAILURES as usize);
    assert!(lines[0].contains("response status code 503"), "{}", lines[0]);
    assert!(lines[0].ends_with("(remain 3 times)"), "{}", lines[0]);
    Ok(())
}

#[tokio::test]
async fn gives_up_after_retries() -> manic_fetch::Result<()> {
    init_logging();
    let addr = start_server().await;
    let err = Client::new()?
        .get(&format!("http://{}/flaky", addr))
        .retry(FLAKY_FAILURES - 1, Duration::from_millis(10))
        .send()
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::SERVICE_UNAVAILABLE));
    assert_eq!(err.attempts(), Some(FLAKY_FAILURES));
    Ok(())
}

#[tokio::test]
async fn not_found_handling() -> manic_fetch::Result<()> {
    init_logging();
    let addr = start_server().await;
    let client = Client::new()?;
    let url = format!("http://{}/missing", addr);

    let err = client
        .get(&url)
        .tolerant()
        .retry(5, Duration::from_secs(1))
        .send()
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::NotFound { attempts: 1, .. }));

    let response = client
        .post(&url)
        .accept(vec![200, 404])
        .retry(5, Duration::from_secs(1))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response.text().await?, "nothing here");
    Ok(())
}

#[tokio::test]
async fn form_is_encoded() -> manic_fetch::Result<()> {
    init_logging();
    let addr = start_server().await;
    let client = Client::new()?;
    let echoed = client
        .post(&format!("http://{}/form", addr))
        .form(vec![("a", "1"), ("b", "two words")])
        .text()
        .await?;
    assert_eq!(echoed, "application/x-www-form-urlencoded|a=1&b=two+words");

    let query = client
        .get(&format!("http://{}/query", addr))
        .form(vec![("q", "rust")])
        .text()
        .await?;
    assert_eq!(query, "q=rust");
    Ok(())
}

#[tokio::test]
async fn connection_refused_is_retried() -> manic_fetch::Result<()> {
    init_logging();
    let addr = closed_port();
    let err = Client::new()?
        .get(&format!("http://{}/file", addr))
        .retry(2, Duration::from_millis(10))
        .send()
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Transport { attempts: 3, .. }));
    Ok(())
}

#[cfg(feature = "json")]
#[tokio::test]
async fn json_body() -> manic_fetch::Result<()> {
    #[derive(serde::Deserialize)]
    struct Payload {
        name: String,
        chunks: u32,
    }
    init_logging();
    let addr = start_server().await;
    let payload: Payload = manic_fetch::get(&format!("http://{}/json", addr))?
        .json()
        .await?;
    assert_eq!(payload.name, "manic");
    assert_eq!(payload.chunks, 3);
    Ok(())
}
