use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

use crate::worker::WorkerManager;

pub type HeadersMap = BTreeMap<String, String>;

/// Completion callback for the asynchronous call shape.
///
/// `FnOnce` rules out a second invocation; [`Responder`] rules out none.
pub type ResponseCallback = Box<dyn FnOnce(JobResponse) + Send + 'static>;

/// Result code carried by every [`JobResponse`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetCode {
    #[default]
    Unknown,
    Success,
    /// Resolution was attempted but the read did not succeed
    Failed,
    /// The URI could not be parsed or decoded; never retried
    PathError,
    SchemeNotRegister,
    RedirectUnsupported,
    NotAssetFile,
    DelegateError,
    Timeout,
}

impl RetCode {
    /// Codes after which a handler's contribution is final
    pub fn is_terminal(self) -> bool {
        matches!(self, RetCode::Success | RetCode::Failed | RetCode::PathError)
    }
}

impl fmt::Display for RetCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RetCode::Unknown => "unknown",
            RetCode::Success => "success",
            RetCode::Failed => "failed",
            RetCode::PathError => "path_error",
            RetCode::SchemeNotRegister => "scheme_not_register",
            RetCode::RedirectUnsupported => "redirect_unsupported",
            RetCode::NotAssetFile => "not_asset_file",
            RetCode::DelegateError => "delegate_error",
            RetCode::Timeout => "timeout",
        };
        f.write_str(name)
    }
}

/// Mutable result container shared along a synchronous chain
///
/// Code and payload are set independently; handlers keep them consistent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobResponse {
    code: RetCode,
    error_msg: String,
    meta: HeadersMap,
    content: Bytes,
}

impl JobResponse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_code(code: RetCode) -> Self {
        Self {
            code,
            ..Self::default()
        }
    }

    pub fn from_parts(
        code: RetCode,
        error_msg: impl Into<String>,
        meta: HeadersMap,
        content: impl Into<Bytes>,
    ) -> Self {
        Self {
            code,
            error_msg: error_msg.into(),
            meta,
            content: content.into(),
        }
    }

    pub fn success(content: impl Into<Bytes>) -> Self {
        Self::from_parts(RetCode::Success, "", HeadersMap::new(), content)
    }

    pub fn code(&self) -> RetCode {
        self.code
    }

    pub fn set_code(&mut self, code: RetCode) {
        self.code = code;
    }

    pub fn error_msg(&self) -> &str {
        &self.error_msg
    }

    pub fn set_error_msg(&mut self, msg: impl Into<String>) {
        self.error_msg = msg.into();
    }

    pub fn meta(&self) -> &HeadersMap {
        &self.meta
    }

    pub fn insert_meta(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.meta.insert(key.into(), value.into());
    }

    pub fn content(&self) -> &Bytes {
        &self.content
    }

    pub fn set_content(&mut self, content: impl Into<Bytes>) {
        self.content = content.into();
    }

    pub fn clear_content(&mut self) {
        self.content = Bytes::new();
    }

    pub fn into_content(self) -> Bytes {
        self.content
    }
}

/// One fetch: what is requested and which workers may run it
///
/// Immutable once built; shared read-only with handlers and queued tasks.
#[derive(Debug, bon::Builder)]
pub struct RequestJob {
    #[builder(default = Uuid::now_v7())]
    id: Uuid,
    #[builder(into)]
    uri: String,
    #[builder(default)]
    meta: HeadersMap,
    worker_manager: Arc<WorkerManager>,
}

impl RequestJob {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn meta(&self) -> &HeadersMap {
        &self.meta
    }

    pub fn worker_manager(&self) -> &Arc<WorkerManager> {
        &self.worker_manager
    }
}

/// Delivers exactly one response to a [`ResponseCallback`]
///
/// Dropping an unanswered responder (a rejected or panicked task) answers
/// with [`RetCode::Failed`].
pub struct Responder {
    callback: Option<ResponseCallback>,
}

impl Responder {
    pub fn new(callback: ResponseCallback) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    pub fn respond(mut self, response: JobResponse) {
        if let Some(callback) = self.callback.take() {
            callback(response);
        }
    }
}

impl Drop for Responder {
    fn drop(&mut self) {
        if let Some(callback) = self.callback.take() {
            tracing::warn!("Responder dropped without a response, answering failed");
            callback(JobResponse::with_code(RetCode::Failed));
        }
    }
}

impl fmt::Debug for Responder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Responder")
            .field("pending", &self.callback.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_empty_response_is_unknown() {
        let response = JobResponse::new();
        assert_eq!(response.code(), RetCode::Unknown);
        assert!(response.content().is_empty());
        assert!(response.meta().is_empty());
    }

    #[test]
    fn test_code_and_content_are_independent() {
        let mut response = JobResponse::with_code(RetCode::Failed);
        response.set_content(vec![1u8, 2, 3]);
        assert_eq!(response.code(), RetCode::Failed);
        assert_eq!(response.content().len(), 3);

        response.set_code(RetCode::Success);
        response.clear_content();
        assert_eq!(response.code(), RetCode::Success);
        assert!(response.content().is_empty());
    }

    #[test]
    fn test_from_parts() {
        let meta: HeadersMap = [("content-type".to_string(), "text/plain".to_string())].into();
        let response = JobResponse::from_parts(RetCode::Success, "", meta, b"hello".to_vec());
        assert_eq!(response.code(), RetCode::Success);
        assert_eq!(response.meta()["content-type"], "text/plain");
        assert_eq!(response.into_content().as_ref(), b"hello");
    }

    #[test]
    fn test_terminal_codes() {
        assert!(RetCode::Success.is_terminal());
        assert!(RetCode::Failed.is_terminal());
        assert!(RetCode::PathError.is_terminal());
        assert!(!RetCode::Unknown.is_terminal());
        assert!(!RetCode::SchemeNotRegister.is_terminal());
    }

    #[test]
    fn test_request_job_builder() {
        let workers = Arc::new(WorkerManager::new());
        let request = RequestJob::builder()
            .uri("asset:/logo.png")
            .worker_manager(workers.clone())
            .build();

        assert_eq!(request.uri(), "asset:/logo.png");
        assert!(request.meta().is_empty());
        assert!(Arc::ptr_eq(request.worker_manager(), &workers));
    }

    #[test]
    fn test_responder_dropped_answers_failed() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let responder = Responder::new(Box::new(move |r: JobResponse| {
            sink.lock().unwrap().push(r.code());
        }));
        drop(responder);

        assert_eq!(*seen.lock().unwrap(), vec![RetCode::Failed]);
    }

    #[test]
    fn test_responder_responds_once() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let responder = Responder::new(Box::new(move |r: JobResponse| {
            sink.lock().unwrap().push(r.code());
        }));
        responder.respond(JobResponse::with_code(RetCode::Success));

        assert_eq!(*seen.lock().unwrap(), vec![RetCode::Success]);
    }
}
