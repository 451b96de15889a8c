//! Process runner tests: the first fatal error ends `run`.

use std::time::Duration;

use tokio::net::TcpListener;

use jail_proxy::lifecycle::{self, FatalError};
use jail_proxy::net::ListenerError;
use jail_proxy::ProxyConfig;

mod common;

fn config(port: u16, difficulty: u32, command: &[&str]) -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.listener.bind_host = "127.0.0.1".into();
    config.listener.port = port;
    config.pow.difficulty = difficulty;
    config.backend.command = command.iter().map(|arg| arg.to_string()).collect();
    config
}

async fn run_with_deadline(config: ProxyConfig) -> Result<(), FatalError> {
    tokio::time::timeout(Duration::from_secs(10), lifecycle::run(config, None))
        .await
        .expect("run returns")
}

#[tokio::test]
async fn backend_exit_ends_run() {
    let port = common::closed_port().await.port();
    let result = run_with_deadline(config(port, 1, &["sh", "-c", "exit 3"])).await;

    match result {
        Err(FatalError::BackendExited(status)) => assert_eq!(status.code(), Some(3)),
        other => panic!("expected backend exit, got {other:?}"),
    }
}

#[tokio::test]
async fn occupied_front_port_ends_run() {
    let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = taken.local_addr().unwrap().port();

    let result = run_with_deadline(config(port, 1, &[])).await;
    assert!(matches!(
        result,
        Err(FatalError::Listener(ListenerError::Bind { .. }))
    ));
}

#[tokio::test]
async fn zero_difficulty_binds_no_listener() {
    let port = common::closed_port().await.port();
    let run = tokio::spawn(lifecycle::run(
        config(port, 0, &["sh", "-c", "sleep 1"]),
        None,
    ));

    tokio::time::sleep(Duration::from_millis(300)).await;
    // the front port belongs to the backend, so the runner must leave it free
    let rebind = TcpListener::bind(("127.0.0.1", port)).await;
    assert!(rebind.is_ok(), "front port was bound without proof of work");
    drop(rebind);

    let result = tokio::time::timeout(Duration::from_secs(10), run)
        .await
        .expect("run returns")
        .unwrap();
    assert!(matches!(result, Err(FatalError::BackendExited(_))));
}

#[tokio::test]
async fn nothing_to_run_returns_cleanly() {
    let port = common::closed_port().await.port();
    assert!(run_with_deadline(config(port, 0, &[])).await.is_ok());
}
