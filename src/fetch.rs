use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::runtime::Handle;
use tracing::info;
use uuid::Uuid;

use crate::cli::FetchArgs;
use vfsbox::config::Config;
use vfsbox::handlers::{HeadersMap, JobResponse, RequestJob, RetCode};
use vfsbox::loader::UriLoader;
use vfsbox::worker::WorkerManager;

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
#[error("{uri} resolved to {code}")]
pub struct Unresolved {
    uri: String,
    code: RetCode,
}

#[derive(Debug, Serialize)]
struct FetchSummary<'a> {
    request_id: Uuid,
    uri: &'a str,
    code: RetCode,
    size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_msg: Option<&'a str>,
    meta: &'a HeadersMap,
    elapsed_ms: u64,
}

pub async fn run(args: FetchArgs, mut config: Config) -> Result<(), AnyError> {
    if let Some(root) = args.asset_root {
        config.asset.root = Some(root);
    }
    config.validate()?;

    let loader = UriLoader::with_defaults(&config, Handle::current())?;
    let workers = Arc::new(WorkerManager::new());
    let request = Arc::new(
        RequestJob::builder()
            .uri(args.uri.as_str())
            .meta(args.headers.iter().cloned().collect())
            .worker_manager(workers.clone())
            .build(),
    );
    info!(request_id = %request.id(), uri = %args.uri, use_async = args.use_async, "Fetching");

    let started = Instant::now();
    let response = if args.use_async {
        loader.load(request.clone()).await
    } else {
        let blocking_loader = loader.clone();
        let blocking_request = request.clone();
        tokio::task::spawn_blocking(move || {
            blocking_loader.request_untrusted_content(&blocking_request)
        })
        .await?
    };
    let elapsed = started.elapsed();

    report(&args.uri, &request, &response, elapsed.as_millis() as u64, args.json)?;

    if let Some(output) = &args.output {
        tokio::fs::write(output, response.content()).await?;
        info!(path = %output.display(), size = response.content().len(), "Payload written");
    }

    drop(request);
    workers.terminate();

    if response.code() != RetCode::Success {
        return Err(Unresolved {
            uri: args.uri,
            code: response.code(),
        }
        .into());
    }
    Ok(())
}

fn report(
    uri: &str,
    request: &RequestJob,
    response: &JobResponse,
    elapsed_ms: u64,
    json: bool,
) -> Result<(), AnyError> {
    if json {
        let summary = FetchSummary {
            request_id: request.id(),
            uri,
            code: response.code(),
            size: response.content().len(),
            error_msg: Some(response.error_msg()).filter(|msg| !msg.is_empty()),
            meta: response.meta(),
            elapsed_ms,
        };
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{uri}: {} ({} bytes, {elapsed_ms} ms)", response.code(), response.content().len());
        if !response.error_msg().is_empty() {
            println!("  {}", response.error_msg());
        }
    }
    Ok(())
}
