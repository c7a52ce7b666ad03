use std::collections::{HashMap, VecDeque};
use std::io::Read as _;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use serde_json::Value;

#[derive(Debug, Clone)]
pub struct LoggedRequest {
    pub method: String,
    pub path: String,
    pub body: Value,
}

#[derive(Default)]
struct StubState {
    // (method, path) -> queued responses; the last one repeats.
    responses: Mutex<HashMap<(String, String), VecDeque<(u16, Value)>>>,
    requests: Mutex<Vec<LoggedRequest>>,
}

/// Scriptable stand-in for the generation service. Routes are exact
/// (method, path) pairs; every incoming request is logged so tests can
/// assert call order and bodies.
pub struct PipelineStub {
    pub base_url: String,
    state: Arc<StubState>,
    shutdown_tx: Option<mpsc::Sender<()>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl PipelineStub {
    pub fn spawn() -> Self {
        let server = tiny_http::Server::http("127.0.0.1:0").expect("start pipeline stub server");
        let addr = server.server_addr();
        let base_url = format!("http://{addr}/api");

        let state = Arc::new(StubState::default());
        let serve_state = Arc::clone(&state);
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let handle = thread::spawn(move || {
            loop {
                if shutdown_rx.try_recv().is_ok() {
                    break;
                }
                let mut request = match server.recv_timeout(Duration::from_millis(50)) {
                    Ok(Some(req)) => req,
                    Ok(None) => continue,
                    Err(_) => break,
                };

                let method = request.method().to_string().to_ascii_uppercase();
                let path = request
                    .url()
                    .split('?')
                    .next()
                    .unwrap_or(request.url())
                    .to_string();

                let mut raw_body = String::new();
                let _ = request.as_reader().read_to_string(&mut raw_body);
                let body: Value = serde_json::from_str(&raw_body).unwrap_or(Value::Null);

                serve_state
                    .requests
                    .lock()
                    .expect("requests lock")
                    .push(LoggedRequest {
                        method: method.clone(),
                        path: path.clone(),
                        body,
                    });

                let response = {
                    let mut responses = serve_state.responses.lock().expect("responses lock");
                    match responses.get_mut(&(method.clone(), path.clone())) {
                        Some(queue) if !queue.is_empty() => {
                            if queue.len() > 1 {
                                queue.pop_front().expect("non-empty queue")
                            } else {
                                queue.front().expect("non-empty queue").clone()
                            }
                        }
                        _ => (
                            404,
                            serde_json::json!({ "detail": format!("no stub route: {method} {path}") }),
                        ),
                    }
                };

                let (status, payload) = response;
                let mut resp = tiny_http::Response::from_string(payload.to_string())
                    .with_status_code(status);
                let header =
                    tiny_http::Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
                        .expect("content-type header");
                resp.add_header(header);
                let _ = request.respond(resp);
            }
        });

        Self {
            base_url,
            state,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        }
    }

    /// Queue a 200 response for `(method, path)`. Queued responses are
    /// served in order; the final one repeats for later requests.
    pub fn route(&self, method: &str, path: &str, body: Value) {
        self.route_with_status(method, path, 200, body);
    }

    pub fn route_with_status(&self, method: &str, path: &str, status: u16, body: Value) {
        self.state
            .responses
            .lock()
            .expect("responses lock")
            .entry((method.to_ascii_uppercase(), path.to_owned()))
            .or_default()
            .push_back((status, body));
    }

    pub fn requests(&self) -> Vec<LoggedRequest> {
        self.state.requests.lock().expect("requests lock").clone()
    }

    pub fn requests_to(&self, method: &str, path: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.method == method.to_ascii_uppercase() && r.path == path)
            .count()
    }
}

impl Drop for PipelineStub {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
