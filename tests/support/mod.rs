#![allow(dead_code)]

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

use agentdeck::api::{AgentApiClient, AgentApiConfig};
use agentdeck::AgentsApi;
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

#[derive(Clone)]
pub struct Scripted {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl Scripted {
    pub fn json(status: u16, body: &str) -> Self {
        Self {
            status,
            content_type: "application/json",
            body: body.as_bytes().to_vec(),
        }
    }

    pub fn frames(frames: &[&str]) -> Self {
        let mut body = String::new();
        for frame in frames {
            body.push_str("data: ");
            body.push_str(frame);
            body.push_str("\n\n");
        }
        Self {
            status: 200,
            content_type: "text/event-stream",
            body: body.into_bytes(),
        }
    }

    pub fn no_content() -> Self {
        Self {
            status: 204,
            content_type: "application/json",
            body: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Captured {
    pub method: String,
    pub target: String,
    pub body: Vec<u8>,
}

impl Captured {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("request body should be JSON")
    }
}

pub struct Backend {
    pub base_url: String,
    captured: Arc<Mutex<Vec<Captured>>>,
    handle: JoinHandle<()>,
}

impl Backend {
    pub async fn start(scripts: Vec<Scripted>) -> Self {
        let scripts = Arc::new(scripts);
        let next = Arc::new(AtomicUsize::new(0));
        let captured = Arc::new(Mutex::new(Vec::new()));
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("local TCP listener should bind");
        let base_url = format!(
            "http://{}",
            listener.local_addr().expect("resolved local listener address")
        );

        let handle = tokio::spawn({
            let captured = Arc::clone(&captured);
            async move {
                while let Ok((socket, _)) = listener.accept().await {
                    let scripts = Arc::clone(&scripts);
                    let next = Arc::clone(&next);
                    let captured = Arc::clone(&captured);
                    tokio::spawn(async move {
                        serve_one(socket, scripts, next, captured).await;
                    });
                }
            }
        });

        Self {
            base_url,
            captured,
            handle,
        }
    }

    pub fn api(&self) -> AgentsApi {
        let client = AgentApiClient::new(AgentApiConfig::new(&self.base_url)).expect("client");
        AgentsApi::new(client)
    }

    pub fn captured(&self) -> Vec<Captured> {
        self.captured.lock().expect("capture log").clone()
    }
}

impl Drop for Backend {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn serve_one(
    mut socket: TcpStream,
    scripts: Arc<Vec<Scripted>>,
    next: Arc<AtomicUsize>,
    captured: Arc<Mutex<Vec<Captured>>>,
) {
    let Ok(request) = read_request(&mut socket).await else {
        return;
    };
    captured.lock().expect("capture log").push(request);

    let index = next.fetch_add(1, Ordering::AcqRel);
    let response = scripts
        .get(index)
        .cloned()
        .unwrap_or_else(|| Scripted::json(500, r#"{"detail":"unexpected request"}"#));

    let head = if response.status == 204 {
        "HTTP/1.1 204 No Content\r\nConnection: close\r\n\r\n".to_owned()
    } else {
        format!(
            "HTTP/1.1 {} Scripted\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            response.status,
            response.content_type,
            response.body.len(),
        )
    };

    if socket.write_all(head.as_bytes()).await.is_err() {
        return;
    }
    let _ = socket.write_all(&response.body).await;
    let _ = socket.shutdown().await;
}

async fn read_request(socket: &mut TcpStream) -> std::io::Result<Captured> {
    let mut raw = Vec::new();
    let mut buffer = [0_u8; 2048];

    let head_end = loop {
        let n = socket.read(&mut buffer).await?;
        if n == 0 {
            return Err(std::io::ErrorKind::UnexpectedEof.into());
        }
        raw.extend_from_slice(&buffer[..n]);
        if let Some(position) = raw.windows(4).position(|window| window == b"\r\n\r\n") {
            break position + 4;
        }
    };

    let head = String::from_utf8_lossy(&raw[..head_end]).into_owned();
    let mut request_line = head.lines().next().unwrap_or_default().split(' ');
    let method = request_line.next().unwrap_or_default().to_owned();
    let target = request_line.next().unwrap_or_default().to_owned();
    let content_length = head
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while raw.len() < head_end + content_length {
        let n = socket.read(&mut buffer).await?;
        if n == 0 {
            break;
        }
        raw.extend_from_slice(&buffer[..n]);
    }

    let body_end = raw.len().min(head_end + content_length);
    Ok(Captured {
        method,
        target,
        body: raw[head_end..body_end].to_vec(),
    })
}
