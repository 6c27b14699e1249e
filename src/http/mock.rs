//! Canned-response transport for tests.

use crate::http::error::FetchError;
use crate::http::transport::{JsonTransport, Pairs};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone)]
pub enum Reply {
    Json(Value),
    /// Behaves like a body that fails to decode.
    Fail,
}

impl Reply {
    pub fn json(value: Value) -> Self {
        Reply::Json(value)
    }
}

struct Route {
    url: String,
    required: Vec<(String, String)>,
    replies: VecDeque<Reply>,
}

impl Route {
    fn matches(&self, url: &str, params: &Pairs) -> bool {
        self.url == url
            && self
                .required
                .iter()
                .all(|pair| params.iter().any(|p| p == pair))
    }

    /// Replies are consumed in order; the last one repeats forever.
    fn next_reply(&mut self) -> Reply {
        if self.replies.len() > 1 {
            self.replies.pop_front().unwrap_or(Reply::Fail)
        } else {
            self.replies.front().cloned().unwrap_or(Reply::Fail)
        }
    }
}

/// Requests that match no route fail like a malformed body would.
#[derive(Default)]
pub struct MockTransport {
    routes: Mutex<Vec<Route>>,
    calls: Mutex<Vec<(String, Vec<(String, String)>)>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a route; the first route whose url matches and whose required query
    /// pairs are all present answers the request.
    pub fn route(
        self,
        url: &str,
        required: &[(&str, &str)],
        replies: impl IntoIterator<Item = Reply>,
    ) -> Self {
        self.routes.lock().unwrap().push(Route {
            url: url.to_string(),
            required: required
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            replies: replies.into_iter().collect(),
        });
        self
    }

    pub fn calls(&self) -> Vec<(String, Vec<(String, String)>)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, url: &str) -> usize {
        self.calls().iter().filter(|(u, _)| u == url).count()
    }
}

fn malformed(url: &str) -> FetchError {
    let source = serde_json::from_str::<Value>("<html>").unwrap_err();
    FetchError::MalformedBody {
        url: url.to_string(),
        source,
    }
}

#[async_trait]
impl JsonTransport for MockTransport {
    async fn get_json(
        &self,
        url: &str,
        params: &Pairs,
        _headers: &Pairs,
        _timeout: Duration,
    ) -> Result<Value, FetchError> {
        self.calls
            .lock()
            .unwrap()
            .push((url.to_string(), params.to_vec()));

        let reply = {
            let mut routes = self.routes.lock().unwrap();
            routes
                .iter_mut()
                .find(|r| r.matches(url, params))
                .map(Route::next_reply)
        };

        match reply {
            Some(Reply::Json(value)) => Ok(value),
            Some(Reply::Fail) | None => Err(malformed(url)),
        }
    }
}
