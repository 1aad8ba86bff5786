use std::fmt;
use std::sync::Arc;

use super::traits::UriHandler;
use super::types::{JobResponse, RequestJob, Responder, ResponseCallback, RetCode};

/// Continuation over the driver-owned handler sequence
///
/// Handlers never hold their siblings; they only advance the cursor they are
/// handed for the current request. Cloning is cheap and shares the list.
#[derive(Clone)]
pub struct Next {
    handlers: Arc<[Arc<dyn UriHandler>]>,
    cursor: usize,
}

impl Next {
    pub fn new(handlers: impl Into<Arc<[Arc<dyn UriHandler>]>>) -> Self {
        Self {
            handlers: handlers.into(),
            cursor: 0,
        }
    }

    /// A continuation with no further handlers
    pub fn empty() -> Self {
        Self::new(Vec::<Arc<dyn UriHandler>>::new())
    }

    pub fn remaining(&self) -> usize {
        self.handlers.len().saturating_sub(self.cursor)
    }
}

impl Iterator for Next {
    type Item = Arc<dyn UriHandler>;

    fn next(&mut self) -> Option<Self::Item> {
        let handler = self.handlers.get(self.cursor).cloned()?;
        self.cursor += 1;
        Some(handler)
    }
}

impl fmt::Debug for Next {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<_> = self.handlers.iter().map(|h| h.name()).collect();
        f.debug_struct("Next")
            .field("handlers", &names)
            .field("cursor", &self.cursor)
            .finish()
    }
}

/// Hand the same request/response pair to the next handler, if any
pub fn forward(request: &Arc<RequestJob>, response: &mut JobResponse, next: &mut Next) {
    if let Some(handler) = next.next() {
        handler.fetch(request, response, next);
    }
}

/// Let the next handler answer `callback`; with none left the request was
/// not claimed by any handler
pub fn delegate(request: Arc<RequestJob>, callback: ResponseCallback, mut next: Next) {
    match next.next() {
        Some(handler) => handler.fetch_async(request, callback, next),
        None => Responder::new(callback).respond(JobResponse::with_code(RetCode::SchemeNotRegister)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worker::WorkerManager;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;

    /// Sets a fixed code, or reports `PathError` for URIs containing `%FF`
    struct Stub {
        code: RetCode,
        calls: AtomicUsize,
    }

    impl Stub {
        fn new(code: RetCode) -> Arc<Self> {
            Arc::new(Self {
                code,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl UriHandler for Stub {
        fn name(&self) -> &str {
            "stub"
        }

        fn fetch(&self, request: &Arc<RequestJob>, response: &mut JobResponse, next: &mut Next) {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if request.uri().contains("%FF") {
                response.set_code(RetCode::PathError);
                return;
            }
            response.set_code(self.code);
            forward(request, response, next);
        }

        fn fetch_async(&self, request: Arc<RequestJob>, callback: ResponseCallback, next: Next) {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.code == RetCode::Unknown {
                delegate(request, callback, next);
            } else {
                callback(JobResponse::with_code(self.code));
            }
        }
    }

    fn request(uri: &str) -> Arc<RequestJob> {
        Arc::new(
            RequestJob::builder()
                .uri(uri)
                .worker_manager(Arc::new(WorkerManager::new()))
                .build(),
        )
    }

    #[test]
    fn test_forward_lets_later_handler_override() {
        let first = Stub::new(RetCode::Failed);
        let second = Stub::new(RetCode::Success);
        let mut next = Next::new(vec![
            first.clone() as Arc<dyn UriHandler>,
            second.clone() as Arc<dyn UriHandler>,
        ]);
        let mut response = JobResponse::new();

        forward(&request("asset:/a.js"), &mut response, &mut next);

        assert_eq!(response.code(), RetCode::Success);
        assert_eq!((first.calls(), second.calls()), (1, 1));
        assert_eq!(next.remaining(), 0);
    }

    #[test]
    fn test_path_error_ends_the_chain() {
        let first = Stub::new(RetCode::Failed);
        let second = Stub::new(RetCode::Success);
        let mut next = Next::new(vec![
            first.clone() as Arc<dyn UriHandler>,
            second.clone() as Arc<dyn UriHandler>,
        ]);
        let mut response = JobResponse::new();

        forward(&request("asset:/bad%FF"), &mut response, &mut next);

        assert_eq!(response.code(), RetCode::PathError);
        assert_eq!(second.calls(), 0);
    }

    #[test]
    fn test_delegate_walks_to_first_answer() {
        let passing = Stub::new(RetCode::Unknown);
        let answering = Stub::new(RetCode::Success);
        let next = Next::new(vec![
            passing.clone() as Arc<dyn UriHandler>,
            answering.clone() as Arc<dyn UriHandler>,
        ]);
        let (tx, rx) = mpsc::channel();

        delegate(request("asset:/a.js"), Box::new(move |r| tx.send(r).unwrap()), next);

        assert_eq!(rx.recv().unwrap().code(), RetCode::Success);
        assert!(rx.try_recv().is_err());
        assert_eq!((passing.calls(), answering.calls()), (1, 1));
    }

    #[test]
    fn test_delegate_without_handlers() {
        let (tx, rx) = mpsc::channel();

        delegate(request("asset:/a.js"), Box::new(move |r| tx.send(r).unwrap()), Next::empty());

        assert_eq!(rx.recv().unwrap().code(), RetCode::SchemeNotRegister);
    }
}
