//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

use jail_proxy::config::ProxySettings;
use jail_proxy::lifecycle::{fatal_channel, FatalReceiver, Shutdown};
use jail_proxy::net::{Listener, ProxyServer};
use jail_proxy::pow::Challenge;
use jail_proxy::security::AdmissionController;

/// Start an echo backend on an ephemeral port.
pub async fn start_echo_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let (mut reader, mut writer) = socket.split();
                let _ = tokio::io::copy(&mut reader, &mut writer).await;
            });
        }
    });
    addr
}

/// Reserve an address nothing listens on.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

pub fn settings(difficulty: u32, max_connections: u32, max_connections_per_ip: u32) -> ProxySettings {
    ProxySettings {
        difficulty,
        max_connections,
        max_connections_per_ip,
        solution_timeout: None,
    }
}

pub struct TestProxy {
    pub addr: SocketAddr,
    pub admission: Arc<AdmissionController>,
    pub fatal: FatalReceiver,
    pub shutdown: Shutdown,
    pub task: JoinHandle<()>,
}

/// Run a proxy on an ephemeral port in front of `backend`.
pub async fn start_proxy(backend: SocketAddr, settings: ProxySettings) -> TestProxy {
    let (fatal_tx, fatal) = fatal_channel();
    let shutdown = Shutdown::new();
    let server = ProxyServer::new(
        backend.to_string(),
        Arc::new(ArcSwap::from_pointee(settings)),
        fatal_tx,
    );
    let admission = server.admission();

    let listener = Listener::from(TcpListener::bind("127.0.0.1:0").await.unwrap());
    let addr = listener.local_addr().unwrap();
    let task = tokio::spawn(server.run(listener, shutdown.signal()));

    TestProxy {
        addr,
        admission,
        fatal,
        shutdown,
        task,
    }
}

/// Read the banner and return the challenge it carries.
pub async fn read_challenge(reader: &mut BufReader<TcpStream>) -> Challenge {
    let mut line = String::new();
    reader.read_line(&mut line).await.unwrap();
    let encoded = line
        .trim_end()
        .rsplit(' ')
        .next()
        .expect("banner ends with the challenge");
    assert!(line.starts_with("proof of work: curl -sSfL https://pwn.red/pow | sh -s "));

    let mut prompt = [0u8; 10];
    reader.read_exact(&mut prompt).await.unwrap();
    assert_eq!(&prompt, b"solution: ");

    Challenge::decode(encoded).unwrap()
}

/// Connect and pass the puzzle, returning the stream ready for relaying.
pub async fn connect_solved(proxy: SocketAddr) -> BufReader<TcpStream> {
    let mut reader = BufReader::new(TcpStream::connect(proxy).await.unwrap());
    let challenge = read_challenge(&mut reader).await;
    let line = format!("{}\n", challenge.solve());
    reader.get_mut().write_all(line.as_bytes()).await.unwrap();
    reader
}

/// Poll until `check` holds or the deadline passes.
pub async fn eventually<F: Fn() -> bool>(check: F) -> bool {
    for _ in 0..200 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}
