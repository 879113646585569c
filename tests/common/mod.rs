//! Shared utilities for integration testing against a mock ledger RPC.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use contract_caller::blockchain::{FixedClock, RpcClient, Timestamp};
use contract_caller::config::BackoffStrategy;
use contract_caller::resilience::RetryPolicy;
use contract_caller::ContractExecutor;

/// A request as seen by the mock RPC.
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct MockRequest {
    pub method: String,
    pub path: String,
    pub body: String,
}

#[allow(dead_code)]
impl MockRequest {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).unwrap()
    }
}

/// Handle to a running mock RPC.
#[derive(Clone)]
pub struct MockRpc {
    pub addr: SocketAddr,
    requests: Arc<Mutex<Vec<MockRequest>>>,
}

#[allow(dead_code)]
impl MockRpc {
    pub fn endpoint(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<MockRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<MockRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.path == path)
            .collect()
    }
}

/// Start a programmable mock RPC on an ephemeral port.
///
/// `f` maps each request to `(status, body)`.
pub async fn start_mock_rpc<F>(f: F) -> MockRpc
where
    F: Fn(&MockRequest) -> (u16, String) + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let f = Arc::new(f);

    let recorded = requests.clone();
    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((socket, _)) => {
                    let f = f.clone();
                    let recorded = recorded.clone();
                    tokio::spawn(async move {
                        handle_connection(socket, f, recorded).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    MockRpc { addr, requests }
}

async fn handle_connection<F>(
    mut socket: TcpStream,
    f: Arc<F>,
    recorded: Arc<Mutex<Vec<MockRequest>>>,
) where
    F: Fn(&MockRequest) -> (u16, String) + Send + Sync + 'static,
{
    let Some(request) = read_request(&mut socket).await else {
        return;
    };
    recorded.lock().unwrap().push(request.clone());

    let (status, body) = f(&request);
    let status_text = match status {
        200 => "200 OK",
        400 => "400 Bad Request",
        404 => "404 Not Found",
        429 => "429 Too Many Requests",
        500 => "500 Internal Server Error",
        502 => "502 Bad Gateway",
        503 => "503 Service Unavailable",
        _ => "200 OK",
    };

    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status_text,
        body.len(),
        body
    );
    let _ = socket.write_all(response.as_bytes()).await;
    let _ = socket.shutdown().await;
    tokio::time::sleep(Duration::from_millis(10)).await;
}

async fn read_request(socket: &mut TcpStream) -> Option<MockRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.lines();
    let mut request_line = lines.next()?.split_whitespace();
    let method = request_line.next()?.to_string();
    let path = request_line.next()?.to_string();

    let content_length = lines
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let body_end = (header_end + content_length).min(buf.len());
    let body = String::from_utf8_lossy(&buf[header_end..body_end]).to_string();
    Some(MockRequest { method, path, body })
}

/// Retry policy with no delay between attempts.
#[allow(dead_code)]
pub fn fast_policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        base_delay_ms: 0,
        max_delay_ms: 0,
        strategy: BackoffStrategy::Fixed,
    }
}

#[allow(dead_code)]
pub fn client(mock: &MockRpc, max_attempts: u32) -> RpcClient {
    RpcClient::with_policy(&mock.endpoint(), Duration::from_secs(5), fast_policy(max_attempts)).unwrap()
}

/// Executor with a fixed clock at 1700000000.123456 and fast polling.
#[allow(dead_code)]
pub fn executor(mock: &MockRpc, max_concurrent_wallets: usize) -> ContractExecutor {
    ContractExecutor::from_parts(
        client(mock, 3),
        Arc::new(FixedClock(Timestamp::from_micros(1_700_000_000_123_456))),
        Duration::from_millis(20),
        Duration::from_millis(500),
        max_concurrent_wallets,
    )
}

/// Wallet with a deterministic key derived from `seed`.
#[allow(dead_code)]
pub fn wallet(address: &str, seed: u8) -> contract_caller::Wallet {
    use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
    contract_caller::Wallet::from_base64_key(address, &BASE64.encode([seed; 32])).unwrap()
}
