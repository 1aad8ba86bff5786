//! Handler chain driver
//!
//! The loader owns the handler lists. A request is routed by scheme to the
//! handlers registered for it, followed by the default handlers; the chain
//! is handed to the first handler as a [`Next`] continuation.

use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::handlers::{
    AssetHandler, FileHandler, JobResponse, NetworkError, NetworkHandler, Next, RequestJob,
    ResponseCallback, RetCode, UriHandler,
};
use crate::observability::Metrics;
use crate::platform::LocalPlatform;
use crate::uri::Uri;

#[derive(Clone, Default)]
pub struct UriLoader {
    scheme_handlers: BTreeMap<String, Vec<Arc<dyn UriHandler>>>,
    default_handlers: Vec<Arc<dyn UriHandler>>,
    metrics: Arc<Metrics>,
}

impl UriLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `handler` to the chain of `scheme`
    pub fn register_handler(&mut self, scheme: impl Into<String>, handler: Arc<dyn UriHandler>) {
        let scheme = scheme.into().to_ascii_lowercase();
        debug!(scheme = %scheme, handler = handler.name(), "Registering handler");
        self.scheme_handlers.entry(scheme).or_default().push(handler);
    }

    /// Append `handler` to the chain tried after every scheme chain
    pub fn register_default_handler(&mut self, handler: Arc<dyn UriHandler>) {
        debug!(handler = handler.name(), "Registering default handler");
        self.default_handlers.push(handler);
    }

    pub fn has_handler(&self, scheme: &str) -> bool {
        self.scheme_handlers
            .get(&scheme.to_ascii_lowercase())
            .is_some_and(|chain| !chain.is_empty())
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    /// Loader with the asset, file and network handlers from `config`
    ///
    /// When `asset.root` is set the asset handler is bound to that directory.
    pub fn with_defaults(config: &Config, runtime: Handle) -> Result<Self, NetworkError> {
        let mut loader = Self::new();

        let asset = AssetHandler::from_config(config);
        if let Some(root) = &config.asset.root {
            if !asset.initialize(&LocalPlatform, root) {
                warn!(root = %root.display(), "Asset root unavailable, asset requests will fail");
            }
        }
        let asset: Arc<dyn UriHandler> = Arc::new(asset);
        for scheme in &config.asset.schemes {
            loader.register_handler(scheme.clone(), asset.clone());
        }

        loader.register_handler("file", Arc::new(FileHandler::from_config(config)));

        let network: Arc<dyn UriHandler> = Arc::new(NetworkHandler::new(&config.network, runtime)?);
        for scheme in &config.network.schemes {
            loader.register_handler(scheme.clone(), network.clone());
        }

        info!(schemes = ?loader.scheme_handlers.keys().collect::<Vec<_>>(), "URI loader ready");
        Ok(loader)
    }

    fn chain_for(&self, scheme: &str) -> Next {
        let handlers: Vec<Arc<dyn UriHandler>> = self
            .scheme_handlers
            .get(scheme)
            .into_iter()
            .flatten()
            .chain(&self.default_handlers)
            .cloned()
            .collect();
        Next::new(handlers)
    }

    /// Resolve on the calling thread
    ///
    /// Every handler of the chain runs unless one reports `PathError`; later
    /// handlers may overwrite earlier results. A chain that leaves the code
    /// `Unknown` answers `SchemeNotRegister`.
    pub fn request_untrusted_content(&self, request: &Arc<RequestJob>) -> JobResponse {
        let mut response = JobResponse::new();
        let uri = Uri::parse(request.uri());

        if !uri.is_valid() {
            response.set_code(RetCode::PathError);
        } else {
            let mut next = self.chain_for(uri.scheme());
            if let Some(handler) = next.next() {
                handler.fetch(request, &mut response, &mut next);
            }
            if response.code() == RetCode::Unknown {
                response.set_code(RetCode::SchemeNotRegister);
            }
        }

        debug!(request_id = %request.id(), code = %response.code(), "Request resolved");
        self.metrics.record(response.code());
        response
    }

    /// Resolve through the handlers' asynchronous path
    ///
    /// `callback` runs exactly once, possibly on a worker thread.
    pub fn request_untrusted_content_async(
        &self,
        request: Arc<RequestJob>,
        callback: ResponseCallback,
    ) {
        let metrics = self.metrics.clone();
        let request_id = request.id();
        let callback: ResponseCallback = Box::new(move |response: JobResponse| {
            debug!(request_id = %request_id, code = %response.code(), "Request resolved");
            metrics.record(response.code());
            callback(response);
        });

        let uri = Uri::parse(request.uri());
        if !uri.is_valid() {
            callback(JobResponse::with_code(RetCode::PathError));
            return;
        }

        let mut next = self.chain_for(uri.scheme());
        match next.next() {
            Some(handler) => handler.fetch_async(request, callback, next),
            None => callback(JobResponse::with_code(RetCode::SchemeNotRegister)),
        }
    }

    /// Await the asynchronous path
    pub async fn load(&self, request: Arc<RequestJob>) -> JobResponse {
        let (tx, rx) = oneshot::channel();
        self.request_untrusted_content_async(
            request,
            Box::new(move |response| {
                let _ = tx.send(response);
            }),
        );
        rx.await
            .unwrap_or_else(|_| JobResponse::with_code(RetCode::Failed))
    }
}
