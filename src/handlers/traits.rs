use std::sync::Arc;

use super::chain::Next;
use super::types::{JobResponse, RequestJob, ResponseCallback};

/// Content handler in a resolution chain
///
/// Every handler supports both call shapes:
///
/// - [`fetch`](Self::fetch) fills a shared response and forwards it. An
///   unparseable URI sets `PathError` and ends the whole chain. Otherwise
///   the handler records `Success` or `Failed` and then always forwards to
///   the next handler, which may override the outcome.
/// - [`fetch_async`](Self::fetch_async) answers through `callback` exactly
///   once. An unparseable URI is answered with `PathError` right away and
///   `next` is never consulted; `next` is otherwise only a last-resort
///   continuation for requests the handler cannot take.
///
/// The callback may run on a worker thread, not the caller's.
pub trait UriHandler: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    fn fetch(&self, request: &Arc<RequestJob>, response: &mut JobResponse, next: &mut Next);

    fn fetch_async(&self, request: Arc<RequestJob>, callback: ResponseCallback, next: Next);
}
