use std::sync::{Arc, OnceLock};
use tracing::{debug, error, warn};

use super::chain::{Next, delegate, forward};
use super::traits::UriHandler;
use super::types::{JobResponse, RequestJob, Responder, ResponseCallback, RetCode};
use crate::config::Config;
use crate::platform::{NativeResourceManager, PlatformEnv, read_asset};
use crate::uri::Uri;
use crate::worker::LazyRunner;

const DEFAULT_RUNNER_NAME: &str = "asset_handler_runner";

/// Resolves packaged application assets
///
/// The synchronous path reads on the caller's thread. The asynchronous path
/// reads on a runner created on first use and shared by every later
/// asynchronous request of this instance.
///
/// The resource manager is shared read-only with in-flight reads and
/// released once the handler and all of them are gone.
#[derive(Debug)]
pub struct AssetHandler {
    schemes: Vec<String>,
    resource_manager: OnceLock<Arc<NativeResourceManager>>,
    runner: LazyRunner,
}

impl AssetHandler {
    pub fn new() -> Self {
        Self {
            schemes: vec!["asset".to_string()],
            resource_manager: OnceLock::new(),
            runner: LazyRunner::new(DEFAULT_RUNNER_NAME),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            schemes: config
                .asset
                .schemes
                .iter()
                .map(|s| s.to_ascii_lowercase())
                .collect(),
            resource_manager: OnceLock::new(),
            runner: LazyRunner::new(config.worker.asset_runner_name.clone()),
        }
    }

    /// Handler that is already bound to `manager`
    pub fn with_resource_manager(manager: NativeResourceManager) -> Self {
        Self {
            resource_manager: OnceLock::from(Arc::new(manager)),
            ..Self::new()
        }
    }

    /// Bind the platform resource manager
    ///
    /// Must run on the thread owning the platform context. On failure the
    /// handler stays unbound and answers `Failed` to every request.
    pub fn initialize<E: PlatformEnv>(&self, env: &E, descriptor: &E::Descriptor) -> bool {
        if self.resource_manager.get().is_some() {
            warn!("AssetHandler already initialized, ignoring");
            return true;
        }

        match env.init_resource_manager(descriptor) {
            Some(manager) => {
                if self.resource_manager.set(Arc::new(manager)).is_err() {
                    warn!("AssetHandler initialized concurrently, keeping the first manager");
                }
                true
            }
            None => {
                error!("AssetHandler::initialize, init resource manager failed");
                false
            }
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.resource_manager.get().is_some()
    }

    fn claims(&self, scheme: &str) -> bool {
        self.schemes.iter().any(|s| s == scheme)
    }

    fn read(&self, path: &str, auto_fill: bool) -> Option<Vec<u8>> {
        read(self.resource_manager.get().map(Arc::as_ref), path, auto_fill)
    }

    /// Read `path` on the handler's runner and answer through `callback`
    ///
    /// With `auto_fill` the payload ends with one extra `0` byte.
    pub fn load_by_asset(
        &self,
        path: &str,
        request: &RequestJob,
        callback: ResponseCallback,
        auto_fill: bool,
    ) {
        debug!(request_id = %request.id(), path, "Loading asset off thread");
        let responder = Responder::new(callback);

        let runner = match self.runner.get_or_create(request.worker_manager()) {
            Ok(runner) => runner,
            Err(e) => {
                error!(runner = self.runner.name(), error = %e, "Failed to create asset runner");
                responder.respond(JobResponse::with_code(RetCode::Failed));
                return;
            }
        };

        let path = path.to_string();
        let manager = self.resource_manager.get().cloned();
        let posted = runner.post_task(move || {
            let response = match read(manager.as_deref(), &path, auto_fill) {
                Some(content) => JobResponse::success(content),
                None => JobResponse::with_code(RetCode::Failed),
            };
            responder.respond(response);
        });

        // A rejected task is dropped with its responder, which answers Failed
        if let Err(e) = posted {
            warn!(error = %e, "Asset read was not queued");
        }
    }
}

impl Default for AssetHandler {
    fn default() -> Self {
        Self::new()
    }
}

fn read(manager: Option<&NativeResourceManager>, path: &str, auto_fill: bool) -> Option<Vec<u8>> {
    let Some(manager) = manager else {
        warn!(path, "AssetHandler has no resource manager");
        return None;
    };
    read_asset(path, manager, auto_fill)
}

impl UriHandler for AssetHandler {
    fn name(&self) -> &str {
        "asset"
    }

    fn fetch(&self, request: &Arc<RequestJob>, response: &mut JobResponse, next: &mut Next) {
        let uri = Uri::parse(request.uri());
        if !uri.is_valid() {
            response.clear_content();
            response.set_code(RetCode::PathError);
            return;
        }

        if self.claims(uri.scheme()) {
            match self.read(uri.path(), false) {
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

        if !self.claims(uri.scheme()) {
            delegate(request, callback, next);
            return;
        }

        self.load_by_asset(uri.path(), &request, callback, false);
    }
}
