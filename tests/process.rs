//! The compiled binary: exit codes for signals and bad configuration.

use std::net::TcpListener as StdListener;
use std::process::Stdio;
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::process::{Child, Command};

const BINARY: &str = env!("CARGO_BIN_EXE_user-frontend");

fn free_port() -> u16 {
    let listener = StdListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

fn frontend(port: &str) -> Command {
    let mut command = Command::new(BINARY);
    command
        .env_clear()
        .env("PORT", port)
        .env("APP_ENV", "test")
        .env("LOG_LEVEL", "error")
        .env("API_URL", "http://127.0.0.1:9")
        .env("SHUTDOWN_TIMEOUT_MS", "10000")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true);
    command
}

async fn wait_until_listening(port: u16) {
    for _ in 0..100 {
        if TcpStream::connect(("127.0.0.1", port)).await.is_ok() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("frontend never started listening on {port}");
}

#[cfg(unix)]
async fn send_signal(child: &Child, signal: &str) {
    let pid = child.id().expect("child still running").to_string();
    let status = Command::new("kill")
        .args([signal, pid.as_str()])
        .status()
        .await
        .unwrap();
    assert!(status.success());
}

#[cfg(unix)]
async fn exits_cleanly_on(signal: &str) {
    let port = free_port();
    let mut child = frontend(&port.to_string()).spawn().unwrap();
    wait_until_listening(port).await;

    send_signal(&child, signal).await;
    let status = tokio::time::timeout(Duration::from_secs(5), child.wait())
        .await
        .expect("drain should finish well before the deadline")
        .unwrap();
    assert_eq!(status.code(), Some(0), "{signal}: {status:?}");
}

#[cfg(unix)]
#[tokio::test]
async fn sigterm_drains_and_exits_zero() {
    exits_cleanly_on("-TERM").await;
}

#[cfg(unix)]
#[tokio::test]
async fn sigint_drains_and_exits_zero() {
    exits_cleanly_on("-INT").await;
}

#[tokio::test]
async fn invalid_port_exits_one() {
    let status = tokio::time::timeout(Duration::from_secs(5), frontend("70000").status())
        .await
        .expect("invalid configuration should stop startup immediately")
        .unwrap();
    assert_eq!(status.code(), Some(1));
}
