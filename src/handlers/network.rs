//! Network handler for `http:`/`https:` URIs

use bytes::Bytes;
use reqwest::Client;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use thiserror::Error;
use tokio::runtime::Handle;
use tracing::{debug, warn};

use super::chain::{Next, delegate, forward};
use super::traits::UriHandler;
use super::types::{HeadersMap, JobResponse, RequestJob, Responder, ResponseCallback, RetCode};
use crate::config::NetworkConfig;
use crate::uri::Uri;

#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// GET-only handler running requests on a tokio runtime
///
/// Redirects are not followed. The runtime must be multi-threaded when the
/// synchronous path is used, since that path blocks a helper thread on it.
#[derive(Debug)]
pub struct NetworkHandler {
    client: Client,
    runtime: Handle,
    schemes: Vec<String>,
}

impl NetworkHandler {
    pub fn new(config: &NetworkConfig, runtime: Handle) -> Result<Self, NetworkError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .user_agent(&config.user_agent)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self {
            client,
            runtime,
            schemes: config
                .schemes
                .iter()
                .map(|s| s.to_ascii_lowercase())
                .collect(),
        })
    }

    fn claims(&self, scheme: &str) -> bool {
        self.schemes.iter().any(|s| s == scheme)
    }
}

/// GET `url`, sending the request metadata as headers
async fn get(client: Client, url: String, headers: HeadersMap) -> JobResponse {
    debug!(url = %url, headers = headers.len(), "Starting download");

    let mut builder = client.get(&url);
    for (name, value) in &headers {
        builder = builder.header(name.as_str(), value.as_str());
    }

    let response = match builder.send().await {
        Ok(response) => response,
        Err(e) => {
            warn!(url = %url, error = %e, "Request failed");
            let code = if e.is_timeout() {
                RetCode::Timeout
            } else {
                RetCode::Failed
            };
            let mut failed = JobResponse::with_code(code);
            failed.set_error_msg(e.to_string());
            return failed;
        }
    };

    let status = response.status();
    let mut meta = HeadersMap::new();
    meta.insert("status".to_string(), status.as_u16().to_string());
    for (name, value) in response.headers() {
        if let Ok(value) = value.to_str() {
            meta.insert(name.as_str().to_string(), value.to_string());
        }
    }

    if status.is_redirection() {
        return JobResponse::from_parts(
            RetCode::RedirectUnsupported,
            "redirect not followed",
            meta,
            Bytes::new(),
        );
    }

    if !status.is_success() {
        let message = format!(
            "HTTP {}: {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("Unknown")
        );
        return JobResponse::from_parts(RetCode::Failed, message, meta, Bytes::new());
    }

    match response.bytes().await {
        Ok(bytes) => {
            debug!(url = %url, size = bytes.len(), "Download completed");
            JobResponse::from_parts(RetCode::Success, "", meta, bytes)
        }
        Err(e) => {
            warn!(url = %url, error = %e, "Failed to read body");
            let code = if e.is_timeout() {
                RetCode::Timeout
            } else {
                RetCode::Failed
            };
            JobResponse::from_parts(code, format!("Failed to read body: {}", e), meta, Bytes::new())
        }
    }
}

impl UriHandler for NetworkHandler {
    fn name(&self) -> &str {
        "network"
    }

    fn fetch(&self, request: &Arc<RequestJob>, response: &mut JobResponse, next: &mut Next) {
        let uri = Uri::parse(request.uri());
        if !uri.is_valid() {
            response.clear_content();
            response.set_code(RetCode::PathError);
            return;
        }

        if self.claims(uri.scheme()) {
            let future = get(
                self.client.clone(),
                request.uri().to_string(),
                request.meta().clone(),
            );
            // A fresh thread has no runtime context, so blocking on the handle is allowed
            let result = thread::scope(|scope| {
                scope
                    .spawn(|| self.runtime.block_on(future))
                    .join()
                    .unwrap_or_else(|_| JobResponse::with_code(RetCode::Failed))
            });
            *response = result;
        }

        forward(request, response, next);
    }

    fn fetch_async(&self, request: Arc<RequestJob>, callback: ResponseCallback, next: Next) {
        let uri = Uri::parse(request.uri());
        if !uri.is_valid() {
            callback(JobResponse::with_code(RetCode::PathError));
            return;
        }

        if !self.claims(uri.scheme()) {
            delegate(request, callback, next);
            return;
        }

        // Dropped unanswered if the runtime shuts down, answering Failed
        let responder = Responder::new(callback);
        let client = self.client.clone();
        let url = request.uri().to_string();
        let headers = request.meta().clone();
        self.runtime.spawn(async move {
            responder.respond(get(client, url, headers).await);
        });
    }
}
