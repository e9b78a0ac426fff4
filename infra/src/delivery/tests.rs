//! Tests for delivery providers

use async_trait::async_trait;
use reqwest::StatusCode;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use og_core::services::verification::{DeliveryError, DeliveryProvider, DeliveryReceipt};
use og_shared::config::{DeliveryConfig, DeliveryProviderKind, GatewayConfig};

use super::gateway::classify_status;
use super::{build_delivery_provider, FailoverDeliveryProvider, HttpGatewayProvider, LogDeliveryProvider};

// Provider whose availability can be switched during a test
struct SwitchableProvider {
    name: &'static str,
    healthy: AtomicBool,
    calls: AtomicU32,
}

impl SwitchableProvider {
    fn new(name: &'static str, healthy: bool) -> Arc<Self> {
        Arc::new(Self {
            name,
            healthy: AtomicBool::new(healthy),
            calls: AtomicU32::new(0),
        })
    }
}

#[async_trait]
impl DeliveryProvider for SwitchableProvider {
    async fn send(&self, _destination: &str, _message: &str) -> Result<DeliveryReceipt, DeliveryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.healthy.load(Ordering::SeqCst) {
            Ok(DeliveryReceipt {
                message_id: format!("{}-msg", self.name),
                provider: self.name.to_string(),
            })
        } else {
            Err(DeliveryError::Transport(format!("{} down", self.name)))
        }
    }

    fn provider_name(&self) -> &str {
        self.name
    }
}

fn gateway_config(base_url: &str) -> GatewayConfig {
    GatewayConfig {
        base_url: base_url.to_string(),
        account_sid: "AC123".to_string(),
        auth_token: "secret".to_string(),
        from: "+15005550006".to_string(),
        request_timeout_secs: 5,
    }
}

/// Serve one canned HTTP response and hand back the raw request
async fn serve_once(status_line: &'static str, body: &'static str) -> (String, tokio::task::JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = format!("http://{}", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
            let text = String::from_utf8_lossy(&request).to_lowercase();
            if let Some(header_end) = text.find("\r\n\r\n") {
                let content_length = text[..header_end]
                    .lines()
                    .find_map(|line| line.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if request.len() >= header_end + 4 + content_length {
                    break;
                }
            }
        }

        let response = format!(
            "{}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
            status_line,
            body.len(),
            body
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        String::from_utf8_lossy(&request).to_string()
    });

    (address, handle)
}

#[tokio::test]
async fn test_log_provider_counts_messages() {
    let provider = LogDeliveryProvider::new();

    let first = provider.send("+97612345678", "Your code is 123456").await.unwrap();
    let second = provider.send("jane@example.com", "Your code is 654321").await.unwrap();

    assert_eq!(first.message_id, "log-1");
    assert_eq!(second.message_id, "log-2");
    assert_eq!(first.provider, "log");
    assert_eq!(provider.sent_count(), 2);
}

#[tokio::test]
async fn test_failover_switches_to_backup_and_recovers() {
    let primary = SwitchableProvider::new("primary", false);
    let backup = SwitchableProvider::new("backup", true);
    let failover = FailoverDeliveryProvider::new(primary.clone(), backup.clone(), Duration::from_millis(50));

    let receipt = failover.send("+97612345678", "code").await.unwrap();
    assert_eq!(receipt.provider, "backup");
    assert!(failover.is_using_backup().await);

    // Inside the recovery timeout the primary is skipped
    failover.send("+97612345678", "code").await.unwrap();
    assert_eq!(primary.calls.load(Ordering::SeqCst), 1);

    primary.healthy.store(true, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(80)).await;

    let receipt = failover.send("+97612345678", "code").await.unwrap();
    assert_eq!(receipt.provider, "primary");
    assert!(!failover.is_using_backup().await);
}

#[tokio::test]
async fn test_failover_reports_backup_error_when_both_fail() {
    let primary = SwitchableProvider::new("primary", false);
    let backup = SwitchableProvider::new("backup", false);
    let failover = FailoverDeliveryProvider::new(primary, backup, Duration::from_secs(30));

    let err = failover.send("+97612345678", "code").await.unwrap_err();
    assert_eq!(err, DeliveryError::Transport("backup down".to_string()));
    assert!(err.is_retriable());
}

#[test]
fn test_classify_status() {
    assert!(classify_status(StatusCode::TOO_MANY_REQUESTS, "slow down").is_retriable());
    assert!(classify_status(StatusCode::BAD_GATEWAY, "").is_retriable());
    assert!(matches!(
        classify_status(StatusCode::BAD_REQUEST, "invalid To number"),
        DeliveryError::Rejected(_)
    ));
    assert!(!classify_status(StatusCode::UNAUTHORIZED, "").is_retriable());
}

#[test]
fn test_gateway_requires_credentials() {
    let mut config = gateway_config("https://api.twilio.com/2010-04-01");
    config.auth_token.clear();
    assert!(HttpGatewayProvider::new("gateway", config).is_err());
}

#[test]
fn test_build_delivery_provider() {
    let log = build_delivery_provider(&DeliveryConfig::default()).unwrap();
    assert_eq!(log.provider_name(), "log");

    let failover_without_backup = DeliveryConfig {
        provider: DeliveryProviderKind::Failover,
        gateway: gateway_config("https://api.twilio.com/2010-04-01"),
        ..Default::default()
    };
    assert!(build_delivery_provider(&failover_without_backup).is_err());

    let failover = DeliveryConfig {
        backup_gateway: Some(gateway_config("https://backup.example.com")),
        ..failover_without_backup
    };
    assert_eq!(build_delivery_provider(&failover).unwrap().provider_name(), "failover");
}

#[tokio::test]
async fn test_gateway_posts_form_with_basic_auth() {
    let (address, server) = serve_once("HTTP/1.1 201 Created", r#"{"sid":"SM42","status":"queued"}"#).await;
    let provider = HttpGatewayProvider::new("gateway", gateway_config(&address)).unwrap();

    let receipt = provider.send("+97612345678", "Your code is 123456").await.unwrap();
    assert_eq!(receipt.message_id, "SM42");
    assert_eq!(receipt.provider, "gateway");

    let request = server.await.unwrap();
    assert!(request.starts_with("POST /Accounts/AC123/Messages.json"));
    let lowered = request.to_lowercase();
    assert!(lowered.contains("authorization: basic"));
    assert!(request.contains("To=%2B97612345678"));
    assert!(request.contains("From=%2B15005550006"));
}

#[tokio::test]
async fn test_gateway_maps_server_error_to_retriable() {
    let (address, _server) = serve_once("HTTP/1.1 503 Service Unavailable", r#"{"message":"busy"}"#).await;
    let provider = HttpGatewayProvider::new("gateway", gateway_config(&address)).unwrap();

    let err = provider.send("+97612345678", "Your code is 123456").await.unwrap_err();
    assert!(err.is_retriable());
}

#[tokio::test]
async fn test_gateway_rejects_email_destination() {
    let provider = HttpGatewayProvider::new("gateway", gateway_config("http://127.0.0.1:9")).unwrap();
    let err = provider.send("jane@example.com", "code").await.unwrap_err();
    assert!(matches!(err, DeliveryError::Rejected(_)));
}
