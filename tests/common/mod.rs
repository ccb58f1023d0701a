#![allow(dead_code)]

use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

pub const TWO_RECORDS: &str = include_str!("../fixtures/search_two.json");

/// A canned HTTP response.
pub struct Reply {
    pub status: u16,
    pub body: Vec<u8>,
}

impl Reply {
    pub fn json(value: &Value) -> Self {
        Self {
            status: 200,
            body: serde_json::to_vec(value).unwrap(),
        }
    }

    pub fn raw(status: u16, body: &[u8]) -> Self {
        Self {
            status,
            body: body.to_vec(),
        }
    }
}

/// Serve `replies` in order, one connection each, then stop. The handle
/// yields the request line (`GET /path?query HTTP/1.1`) of every request.
pub async fn serve(replies: Vec<Reply>) -> (String, JoinHandle<Vec<String>>) {
    serve_with(|_| replies).await
}

/// Like [`serve`], for replies that need to know the server's own base url.
pub async fn serve_with<F>(make_replies: F) -> (String, JoinHandle<Vec<String>>)
where
    F: FnOnce(&str) -> Vec<Reply>,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let base = format!("http://{}", addr);
    let replies = make_replies(&base);

    let handle = tokio::spawn(async move {
        let mut seen = Vec::new();
        for reply in replies {
            let (mut socket, _) = listener.accept().await.unwrap();

            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let text = String::from_utf8_lossy(&request);
            seen.push(text.lines().next().unwrap_or_default().to_string());

            let head = format!(
                "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                reply.status,
                reason(reply.status),
                reply.body.len()
            );
            socket.write_all(head.as_bytes()).await.unwrap();
            socket.write_all(&reply.body).await.unwrap();
            socket.shutdown().await.ok();
        }
        seen
    });

    (base, handle)
}

/// Decoded query pairs of a recorded request line.
pub fn request_params(request_line: &str) -> Vec<(String, String)> {
    let target = request_line.split_whitespace().nth(1).unwrap();
    let url = reqwest::Url::parse(&format!("http://localhost{}", target)).unwrap();
    url.query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

pub fn request_path(request_line: &str) -> String {
    let target = request_line.split_whitespace().nth(1).unwrap();
    target.split('?').next().unwrap().to_string()
}

pub fn two_records() -> Value {
    serde_json::from_str(TWO_RECORDS).unwrap()
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        401 => "Unauthorized",
        404 => "Not Found",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        _ => "Status",
    }
}
