use crate::{closed_port, init_logging, start_threaded, FILE_SIZE, FLAKY_FAILURES, SLOW_CHUNK};
use manic_fetch::progress::ProgressSample;
use manic_fetch::threaded::Client;
use manic_fetch::{FetchError, FnSink, StatusCode};
use std::io::Read;
use std::sync::{mpsc, Arc, Mutex};
use std::time::Duration;

#[test]
fn downloads_whole_file() -> manic_fetch::Result<()> {
    init_logging();
    let addr = start_threaded();
    let mut response = Client::new()?
        .get(&format!("http://{}/file", addr))
        .send()?;
    assert_eq!(response.content_length(), Some(FILE_SIZE as u64));
    let mut body = Vec::new();
    response.read_to_end(&mut body).map_err(FetchError::Read)?;
    assert_eq!(body.len(), FILE_SIZE);
    Ok(())
}

#[test]
fn slow_body_reports_progress() -> manic_fetch::Result<()> {
    init_logging();
    let addr = start_threaded();
    let seen = Arc::new(Mutex::new(Vec::<ProgressSample>::new()));
    let sink = {
        let seen = seen.clone();
        FnSink(move |sample: ProgressSample| seen.lock().unwrap().push(sample))
    };
    let body = Client::new()?
        .get(&format!("http://{}/slow", addr))
        .progress_every(sink, Duration::ZERO)
        .bytes()?;
    assert_eq!(body.len(), 3 * SLOW_CHUNK);
    let samples = seen.lock().unwrap();
    assert!(!samples.is_empty());
    assert!(samples.iter().all(|s| s.speed > 0));
    Ok(())
}

#[test]
fn retries_until_flaky_endpoint_recovers() -> manic_fetch::Result<()> {
    init_logging();
    let addr = start_threaded();
    let (log, lines) = mpsc::sync_channel::<String>(16);
    let text = Client::new()?
        .get(&format!("http://{}/flaky", addr))
        .retry(FLAKY_FAILURES, Duration::from_millis(50))
        .log(log)
        .text()?;
    assert_eq!(text, "ok");
    let lines = lines.try_iter().collect::<Vec<_>>();
    assert_eq!(lines.len(), FLAKY_FAILURES as usize);
    assert!(lines[1].ends_with("(remain 1 times)"), "{}", lines[1]);
    Ok(())
}

#[test]
fn tolerant_not_found() -> manic_fetch::Result<()> {
    init_logging();
    let addr = start_threaded();
    let err = Client::new()?
        .get(&format!("http://{}/missing", addr))
        .tolerant()
        .retry(3, Duration::from_secs(5))
        .send()
        .unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
    Ok(())
}

#[test]
fn form_is_encoded() -> manic_fetch::Result<()> {
    init_logging();
    let addr = start_threaded();
    let echoed = manic_fetch::threaded::post(&format!("http://{}/form", addr))?
        .header("content-type", "text/plain")
        .form(vec![("k", "v")])
        .text()?;
    assert_eq!(echoed, "text/plain|k=v");
    Ok(())
}

#[test]
fn connection_refused_is_retried() -> manic_fetch::Result<()> {
    init_logging();
    let addr = closed_port();
    let err = Client::new()?
        .get(&format!("http://{}/", addr))
        .retry(1, Duration::from_millis(10))
        .send()
        .unwrap_err();
    assert!(matches!(err, FetchError::Transport { attempts: 2, .. }));
    Ok(())
}
