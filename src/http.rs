use std::{collections::BTreeMap, fmt, time::Duration};

use serde_json::Value;
use ureq::{Agent, AgentBuilder};

use crate::retailers::Unavailable;

pub const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36";

pub fn agent(timeout: Duration) -> Agent {
    AgentBuilder::new()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Get => "GET",
            Self::Post => "POST",
        })
    }
}

/// Everything needed to ask one retailer for one price.
#[derive(Clone, PartialEq)]
pub struct Request {
    pub method: Method,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: BTreeMap<String, String>,
    pub body: Option<Value>,
}

// headers can carry api keys
impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("query", &self.query)
            .field("headers", &self.headers.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl Request {
    fn new(method: Method, url: String, body: Option<Value>) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert("User-Agent".to_string(), USER_AGENT.to_string());
        headers.insert("Accept".to_string(), "application/json".to_string());
        Self {
            method,
            url,
            query: Vec::new(),
            headers,
            body,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url.into(), None)
    }

    pub fn post_json(url: impl Into<String>, body: Value) -> Self {
        Self::new(Method::Post, url.into(), Some(body))
    }

    /// Sets a header, replacing any existing one regardless of case.
    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.retain(|k, _| !k.eq_ignore_ascii_case(name));
        self.headers.insert(name.to_string(), value.into());
        self
    }

    /// Sets a header only when nothing has set it yet.
    pub fn default_header(self, name: &str, value: impl Into<String>) -> Self {
        if self.header_value(name).is_some() {
            self
        } else {
            self.header(name, value)
        }
    }

    pub fn headers(self, overrides: &BTreeMap<String, String>) -> Self {
        overrides
            .iter()
            .fold(self, |request, (k, v)| request.header(k, v.as_str()))
    }

    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn query(mut self, name: &str, value: impl Into<String>) -> Self {
        self.query.push((name.to_string(), value.into()));
        self
    }

    pub fn queries(self, extra: &BTreeMap<String, String>) -> Self {
        extra
            .iter()
            .fold(self, |request, (k, v)| request.query(k, v.as_str()))
    }
}

/// Sends a request and hands back the response body.
pub trait Fetch: Sync {
    fn fetch(&self, request: &Request) -> Result<String, Unavailable>;
}

impl Fetch for Agent {
    fn fetch(&self, request: &Request) -> Result<String, Unavailable> {
        let mut call = self.request(&request.method.to_string(), &request.url);
        for (k, v) in &request.query {
            call = call.query(k, v);
        }
        for (k, v) in &request.headers {
            call = call.set(k, v);
        }

        let response = match &request.body {
            Some(body) => call.send_json(body),
            None => call.call(),
        }?;
        response
            .into_string()
            .map_err(|e| Unavailable::Network(format!("failed to read body: {e}")))
    }
}

impl From<ureq::Error> for Unavailable {
    fn from(e: ureq::Error) -> Self {
        match e {
            ureq::Error::Status(code, _) => Self::Status(code),
            ureq::Error::Transport(x) => Self::Network(x.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::sync::mpsc::{self, Receiver};
    use std::thread;
    use std::time::Instant;

    use serde_json::json;

    use super::*;

    /// Answers one connection with `response` and hands back the request it read.
    fn serve_once(response: &'static str) -> (String, Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream);
            let mut request = String::new();
            let mut length = 0;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                if let Some((name, value)) = line.split_once(':') {
                    if name.eq_ignore_ascii_case("content-length") {
                        length = value.trim().parse().unwrap();
                    }
                }
                request.push_str(&line);
                if line == "\r\n" || line.is_empty() {
                    break;
                }
            }
            let mut body = vec![0; length];
            reader.read_exact(&mut body).unwrap();
            request.push_str(&String::from_utf8_lossy(&body));
            tx.send(request).unwrap();
            reader.into_inner().write_all(response.as_bytes()).unwrap();
        });
        (addr, rx)
    }

    #[test]
    fn defaults_and_overrides() {
        let overrides = BTreeMap::from([
            ("user-agent".to_string(), "curl/8".to_string()),
            ("X-Test".to_string(), "1".to_string()),
        ]);
        let request = Request::get("https://example.com")
            .headers(&overrides)
            .default_header("x-test", "2")
            .default_header("Origin", "https://example.com");

        assert_eq!(request.header_value("User-Agent"), Some("curl/8"));
        assert_eq!(request.header_value("Accept"), Some("application/json"));
        assert_eq!(request.header_value("X-TEST"), Some("1"));
        assert_eq!(request.header_value("origin"), Some("https://example.com"));
        // no duplicate user agent under another case
        assert_eq!(request.headers.len(), 4);
    }

    #[test]
    fn debug_hides_header_values() {
        let request = Request::get("https://example.com").header("Secret-Key", "hunter2");
        let debug = format!("{request:?}");
        assert!(debug.contains("Secret-Key"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn sends_query_headers_and_body() {
        let (addr, rx) =
            serve_once("HTTP/1.1 200 OK\r\nContent-Length: 2\r\nConnection: close\r\n\r\nok");
        let request = Request::post_json(format!("http://{addr}/graphql"), json!({"id": "1"}))
            .query("storeId", "NSW123")
            .default_header("Origin", "https://bws.com.au");

        let body = agent(Duration::from_secs(5)).fetch(&request).unwrap();
        assert_eq!(body, "ok");

        let seen = rx.recv().unwrap();
        assert!(seen.starts_with("POST /graphql?storeId=NSW123 "), "{seen}");
        let seen = seen.to_lowercase();
        assert!(seen.contains("origin: https://bws.com.au\r\n"), "{seen}");
        assert!(seen.contains("accept: application/json\r\n"), "{seen}");
        assert!(seen.ends_with(r#"{"id":"1"}"#), "{seen}");
    }

    #[test]
    fn error_status() {
        let (addr, _rx) = serve_once(
            "HTTP/1.1 500 Internal Server Error\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        );
        let result = agent(Duration::from_secs(5)).fetch(&Request::get(format!("http://{addr}/x")));
        assert!(matches!(result, Err(Unavailable::Status(500))), "{result:?}");
    }

    #[test]
    fn silent_server_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            // hold the connection open without answering
            let _stream = listener.accept().unwrap();
            thread::sleep(Duration::from_secs(10));
        });

        let started = Instant::now();
        let result = agent(Duration::from_secs(1)).fetch(&Request::get(format!("http://{addr}/x")));
        assert!(matches!(result, Err(Unavailable::Network(_))), "{result:?}");
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
