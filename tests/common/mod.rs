//! Shared utilities for integration testing.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use proxy_core::config::{RoutingConfig, TargetConfig};

#[allow(dead_code)]
pub fn init_logging() {
    proxy_core::observability::logging::init_logging("proxy_core=debug");
}

/// Start a programmable mock backend on an ephemeral port and return
/// its address. The closure decides status and body per request.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        // Drain the request head before answering.
                        let mut buf = [0u8; 1024];
                        let _ = socket.read(&mut buf).await;

                        let (status, body) = f().await;
                        let reason = match status {
                            200 => "OK",
                            404 => "Not Found",
                            500 => "Internal Server Error",
                            503 => "Service Unavailable",
                            _ => "OK",
                        };
                        let response = format!(
                            "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status,
                            reason,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// Config with the given backends and probing disabled; tests enable
/// the pieces they exercise.
#[allow(dead_code)]
pub fn base_config(addrs: &[SocketAddr]) -> RoutingConfig {
    let mut config = RoutingConfig::default();
    config.targets = addrs
        .iter()
        .map(|addr| TargetConfig {
            url: format!("http://{}", addr),
        })
        .collect();
    config.health_check.enabled = false;
    config
}
