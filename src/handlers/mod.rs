//! Content handlers for the resolution chain
//!
//! Every backend implements [`UriHandler`]; a driver such as
//! [`UriLoader`](crate::loader::UriLoader) walks an ordered list of them,
//! handing each a [`Next`] continuation for the rest of the list.
//!
//! ## Key Components
//!
//! - [`UriHandler`] - Trait implemented by every backend
//! - [`AssetHandler`] - Packaged application assets (`asset:`)
//! - [`FileHandler`] - Local files (`file:`)
//! - [`NetworkHandler`] - `http:`/`https:` GET
//! - [`RequestJob`] / [`JobResponse`] - What is fetched and what came back
//!
//! ## Example
//!
//! ```rust,ignore
//! use vfsbox::handlers::{AssetHandler, JobResponse, Next, RequestJob, UriHandler};
//!
//! let handler: Arc<dyn UriHandler> = Arc::new(AssetHandler::new());
//! let request = Arc::new(RequestJob::builder().uri("asset:/index.js").worker_manager(workers).build());
//! let mut response = JobResponse::new();
//! handler.fetch(&request, &mut response, &mut Next::empty());
//! ```

mod asset;
mod chain;
mod file;
mod network;
mod traits;
pub(crate) mod types;

pub use asset::AssetHandler;
pub use chain::{Next, delegate, forward};
pub use file::FileHandler;
pub use network::{NetworkError, NetworkHandler};
pub use traits::UriHandler;
pub use types::{HeadersMap, JobResponse, RequestJob, Responder, ResponseCallback, RetCode};
