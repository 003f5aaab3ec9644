//! Minimal HTTP store endpoint recording every action envelope.

use std::sync::{Arc, Mutex};

use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// One request as seen by the server.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub head: String,
    pub body: Value,
}

impl RecordedRequest {
    pub fn action(&self) -> &str {
        self.body["action"].as_str().unwrap_or_default()
    }
}

/// A store answering every action with 200, `get_blacklist` with the
/// configured pairs.
pub struct StoreServer {
    pub url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    task: JoinHandle<()>,
}

impl StoreServer {
    pub async fn start(blacklist: &[&str]) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/store", listener.local_addr().unwrap());
        let requests = Arc::new(Mutex::new(Vec::new()));
        let blacklist = json!({ "data": blacklist });

        let recorded = requests.clone();
        let task = tokio::spawn(async move {
            loop {
                let Ok((socket, _)) = listener.accept().await else {
                    return;
                };
                let recorded = recorded.clone();
                let blacklist = blacklist.clone();
                tokio::spawn(async move {
                    serve(socket, recorded, blacklist).await;
                });
            }
        });

        Self {
            url,
            requests,
            task,
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn actions(&self) -> Vec<String> {
        self.requests()
            .iter()
            .map(|r| r.action().to_string())
            .collect()
    }
}

impl Drop for StoreServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn serve(mut socket: TcpStream, recorded: Arc<Mutex<Vec<RecordedRequest>>>, blacklist: Value) {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 8192];
    loop {
        let Some((head, body)) = split_request(&buffer) else {
            match socket.read(&mut chunk).await {
                Ok(0) | Err(_) => return,
                Ok(n) => buffer.extend_from_slice(&chunk[..n]),
            }
            continue;
        };
        let consumed = head.len() + 4 + body.len();
        let body_json: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
        let request = RecordedRequest {
            head: String::from_utf8_lossy(&head).into_owned(),
            body: body_json,
        };
        let reply = if request.action() == "get_blacklist" {
            blacklist.to_string()
        } else {
            r#"{"ok":true}"#.to_string()
        };
        recorded.lock().unwrap().push(request);

        let response = format!(
            "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\n\r\n{reply}",
            reply.len()
        );
        if socket.write_all(response.as_bytes()).await.is_err() {
            return;
        }
        buffer.drain(..consumed);
    }
}

/// Split a complete request into head and body, if fully buffered.
fn split_request(buffer: &[u8]) -> Option<(Vec<u8>, Vec<u8>)> {
    let head_end = buffer.windows(4).position(|w| w == b"\r\n\r\n")?;
    let head = &buffer[..head_end];
    let length = String::from_utf8_lossy(head)
        .lines()
        .find_map(|line| {
            line.to_ascii_lowercase()
                .strip_prefix("content-length:")
                .and_then(|v| v.trim().parse::<usize>().ok())
        })
        .unwrap_or(0);
    let body_start = head_end + 4;
    if buffer.len() < body_start + length {
        return None;
    }
    Some((head.to_vec(), buffer[body_start..body_start + length].to_vec()))
}
