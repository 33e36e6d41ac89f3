/*
[INPUT]:  Test configuration and mock server requirements
[OUTPUT]: Shared test utilities, fixtures, and mock helpers
[POS]:    Test infrastructure - shared across all test modules
[UPDATE]: When adding new test patterns or fixtures
*/

//! Common test utilities for wallex-adapter tests

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;
use wallex_adapter::{ClientConfig, WallexClient};
use wiremock::MockServer;

/// Engine.io open packet sent by the fake server
pub const OPEN_FRAME: &str = concat!(
    r#"0{"sid":"eio-test","upgrades":[],"#,
    r#""pingInterval":25000,"pingTimeout":20000,"maxPayload":1000000}"#
);

/// Setup a mock HTTP server for testing
pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

/// Transport pointed at a mock server
pub fn client_for(server: &MockServer) -> WallexClient {
    WallexClient::with_config(ClientConfig {
        base_url: server.uri(),
        ..ClientConfig::default()
    })
    .expect("client init")
}

/// Mock API key for testing
pub fn mock_api_key() -> String {
    "test-api-key-0123456789".to_string()
}

/// One scripted action of the fake socket.io server
#[derive(Debug, Clone)]
pub enum Step {
    /// Send engine.io open, record the client's namespace connect, ack it
    Handshake,
    /// Record the next text frame from the client
    Record,
    /// `42["Broadcaster", channel, payload]`
    Broadcast(String, Value),
    /// Send a raw text frame
    Raw(String),
    /// Engine.io ping; the client's reply is recorded
    Ping,
    Sleep(Duration),
    /// Record frames until the client goes away
    AwaitClose,
    /// Drop the socket without a close handshake
    Drop,
}

/// Fake socket.io endpoint driven by one script per accepted connection
pub struct FakeSocketIo {
    pub base_url: String,
    frames: Arc<Mutex<Vec<Vec<String>>>>,
}

impl FakeSocketIo {
    pub async fn start(scripts: Vec<Vec<Step>>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind listener");
        let addr = listener.local_addr().expect("local addr");
        let frames = Arc::new(Mutex::new(vec![Vec::new(); scripts.len()]));
        let frames_task = frames.clone();

        tokio::spawn(async move {
            for (index, script) in scripts.into_iter().enumerate() {
                let Ok((tcp, _)) = listener.accept().await else {
                    return;
                };
                tokio::spawn(run_script(tcp, index, script, frames_task.clone()));
            }
        });

        Self {
            base_url: format!("http://{addr}/"),
            frames,
        }
    }

    /// Frames received from the client on connection `index`
    pub fn frames(&self, index: usize) -> Vec<String> {
        self.frames.lock().expect("frames lock")[index].clone()
    }

    /// Poll until connection `index` has recorded at least `count` frames
    pub async fn wait_for_frames(&self, index: usize, count: usize) -> Vec<String> {
        for _ in 0..200 {
            let frames = self.frames(index);
            if frames.len() >= count {
                return frames;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.frames(index)
    }
}

/// Base URL on which nothing is listening
pub async fn unused_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    format!("http://{addr}/")
}

pub fn broadcast(channel: &str, payload: Value) -> Step {
    Step::Broadcast(channel.to_string(), payload)
}

async fn run_script(
    tcp: TcpStream,
    index: usize,
    script: Vec<Step>,
    frames: Arc<Mutex<Vec<Vec<String>>>>,
) {
    let Ok(mut ws) = tokio_tungstenite::accept_async(tcp).await else {
        return;
    };
    let record = |frame: String| frames.lock().expect("frames lock")[index].push(frame);

    for step in script {
        match step {
            Step::Handshake => {
                if send_text(&mut ws, OPEN_FRAME).await.is_err() {
                    return;
                }
                match next_text(&mut ws).await {
                    Some(frame) => record(frame),
                    None => return,
                }
                if send_text(&mut ws, r#"40{"sid":"sio-test"}"#).await.is_err() {
                    return;
                }
            }
            Step::Record => match next_text(&mut ws).await {
                Some(frame) => record(frame),
                None => return,
            },
            Step::Broadcast(channel, payload) => {
                let frame = serde_json::json!(["Broadcaster", channel, payload]);
                let _ = send_text(&mut ws, &format!("42{frame}")).await;
            }
            Step::Raw(frame) => {
                let _ = send_text(&mut ws, &frame).await;
            }
            Step::Ping => {
                if send_text(&mut ws, "2").await.is_err() {
                    return;
                }
                match next_text(&mut ws).await {
                    Some(frame) => record(frame),
                    None => return,
                }
            }
            Step::Sleep(duration) => tokio::time::sleep(duration).await,
            Step::AwaitClose => {
                while let Some(frame) = next_text(&mut ws).await {
                    record(frame);
                }
                return;
            }
            Step::Drop => return,
        }
    }
}

async fn send_text(
    ws: &mut WebSocketStream<TcpStream>,
    frame: &str,
) -> Result<(), tokio_tungstenite::tungstenite::Error> {
    ws.send(Message::Text(frame.to_string().into())).await
}

async fn next_text(ws: &mut WebSocketStream<TcpStream>) -> Option<String> {
    while let Some(message) = ws.next().await {
        match message {
            Ok(Message::Text(text)) => return Some(text.as_str().to_string()),
            Ok(Message::Close(_)) | Err(_) => return None,
            Ok(_) => continue,
        }
    }
    None
}
