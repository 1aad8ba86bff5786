use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, warn};

use super::chain::{Next, delegate, forward};
use super::traits::UriHandler;
use super::types::{JobResponse, RequestJob, Responder, ResponseCallback, RetCode};
use crate::config::Config;
use crate::uri::Uri;
use crate::worker::LazyRunner;

const DEFAULT_RUNNER_NAME: &str = "file_handler_runner";

/// Resolves `file:` URIs against the local filesystem
#[derive(Debug)]
pub struct FileHandler {
    root: Option<PathBuf>,
    runner: LazyRunner,
}

impl FileHandler {
    pub fn new() -> Self {
        Self {
            root: None,
            runner: LazyRunner::new(DEFAULT_RUNNER_NAME),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            root: config.file.root.clone(),
            runner: LazyRunner::new(config.worker.file_runner_name.clone()),
        }
    }

    /// Confine lookups below `root`
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    /// Map a URI path onto the filesystem; `None` if it escapes the root
    fn resolve(&self, path: &str) -> Option<PathBuf> {
        let Some(root) = &self.root else {
            return Some(PathBuf::from(path));
        };

        let relative = Path::new(path.trim_start_matches('/'));
        let contained = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        contained.then(|| root.join(relative))
    }
}

impl Default for FileHandler {
    fn default() -> Self {
        Self::new()
    }
}

fn read_file(path: &Path) -> Option<Vec<u8>> {
    match std::fs::read(path) {
        Ok(bytes) => {
            debug!(path = %path.display(), len = bytes.len(), "File read");
            Some(bytes)
        }
        Err(e) => {
            debug!(path = %path.display(), error = %e, "File read failed");
            None
        }
    }
}

impl UriHandler for FileHandler {
    fn name(&self) -> &str {
        "file"
    }

    fn fetch(&self, request: &Arc<RequestJob>, response: &mut JobResponse, next: &mut Next) {
        let uri = Uri::parse(request.uri());
        if !uri.is_valid() {
            response.clear_content();
            response.set_code(RetCode::PathError);
            return;
        }

        if uri.scheme() == "file" {
            let Some(path) = self.resolve(uri.path()) else {
                response.clear_content();
                response.set_code(RetCode::PathError);
                return;
            };
            match read_file(&path) {
                Some(content) => {
                    response.set_content(content);
                    response.set_code(RetCode::Success);
                }
                None => {
                    response.clear_content();
                    response.set_code(RetCode::Failed);
                }
            }
        }

        forward(request, response, next);
    }

    fn fetch_async(&self, request: Arc<RequestJob>, callback: ResponseCallback, next: Next) {
        let uri = Uri::parse(request.uri());
        if !uri.is_valid() {
            callback(JobResponse::with_code(RetCode::PathError));
            return;
        }

        if uri.scheme() != "file" {
            delegate(request, callback, next);
            return;
        }

        let Some(path) = self.resolve(uri.path()) else {
            callback(JobResponse::with_code(RetCode::PathError));
            return;
        };

        let responder = Responder::new(callback);
        let runner = match self.runner.get_or_create(request.worker_manager()) {
            Ok(runner) => runner,
            Err(e) => {
                error!(runner = self.runner.name(), error = %e, "Failed to create file runner");
                responder.respond(JobResponse::with_code(RetCode::Failed));
                return;
            }
        };

        let posted = runner.post_task(move || {
            let response = match read_file(&path) {
                Some(content) => JobResponse::success(content),
                None => JobResponse::with_code(RetCode::Failed),
            };
            responder.respond(response);
        });
        if let Err(e) = posted {
            warn!(error = %e, "File read was not queued");
        }
    }
}
