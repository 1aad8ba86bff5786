use std::collections::HashMap;
use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, mpsc};
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

use vfsbox::config::Config;
use vfsbox::handlers::{AssetHandler, JobResponse, RequestJob, RetCode};
use vfsbox::loader::UriLoader;
use vfsbox::platform::{NativeResourceManager, RawFile, ResourceBackend};
use vfsbox::worker::WorkerManager;

const LOGO: &[u8] = b"\x89PNG\r\n\x1a\nlogo-bytes";

/// In-memory asset store that counts every native call
#[derive(Default)]
struct CountingStore {
    assets: HashMap<String, Vec<u8>>,
    opened: Arc<AtomicUsize>,
    closed: Arc<AtomicUsize>,
}

struct CountingFile {
    content: Vec<u8>,
    closed: Arc<AtomicUsize>,
}

impl RawFile for CountingFile {
    fn size(&self) -> u64 {
        self.content.len() as u64
    }

    fn read(&mut self, buf: &mut [u8]) -> usize {
        let n = buf.len().min(self.content.len());
        buf[..n].copy_from_slice(&self.content[..n]);
        n
    }

    fn close(&mut self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

impl ResourceBackend for CountingStore {
    fn open_raw_file(&self, path: &str) -> Option<Box<dyn RawFile>> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        let content = self.assets.get(path)?.clone();
        Some(Box::new(CountingFile {
            content,
            closed: self.closed.clone(),
        }))
    }
}

struct Fixture {
    loader: UriLoader,
    workers: Arc<WorkerManager>,
    opened: Arc<AtomicUsize>,
    closed: Arc<AtomicUsize>,
}

impl Fixture {
    fn new() -> Self {
        let mut store = CountingStore::default();
        store.assets.insert("logo.png".to_string(), LOGO.to_vec());
        let opened = store.opened.clone();
        let closed = store.closed.clone();

        let mut loader = UriLoader::new();
        loader.register_handler(
            "asset",
            Arc::new(AssetHandler::with_resource_manager(NativeResourceManager::new(store))),
        );

        Self {
            loader,
            workers: Arc::new(WorkerManager::new()),
            opened,
            closed,
        }
    }

    fn request(&self, uri: &str) -> Arc<RequestJob> {
        Arc::new(
            RequestJob::builder()
                .uri(uri)
                .worker_manager(self.workers.clone())
                .build(),
        )
    }

    fn fetch_async(&self, uri: &str) -> JobResponse {
        let (tx, rx) = mpsc::channel();
        self.loader.request_untrusted_content_async(
            self.request(uri),
            Box::new(move |r| tx.send(r).unwrap()),
        );
        rx.recv_timeout(Duration::from_secs(5)).unwrap()
    }
}

#[test]
fn test_logo_resolves_on_both_paths() {
    let fixture = Fixture::new();

    let sync_response = fixture
        .loader
        .request_untrusted_content(&fixture.request("asset:/logo.png"));
    let async_response = fixture.fetch_async("asset:/logo.png");

    assert_eq!(sync_response.code(), RetCode::Success);
    assert_eq!(async_response.code(), RetCode::Success);
    assert_eq!(sync_response.content().as_ref(), LOGO);
    assert_eq!(async_response.content(), sync_response.content());
    assert_eq!(
        fixture.opened.load(Ordering::SeqCst),
        fixture.closed.load(Ordering::SeqCst)
    );
}

#[test]
fn test_authority_forms_resolve_the_same_asset() {
    let fixture = Fixture::new();

    for uri in ["asset:/logo.png", "asset://logo.png", "asset:///logo.png"] {
        let response = fixture.loader.request_untrusted_content(&fixture.request(uri));
        assert_eq!(response.code(), RetCode::Success, "{uri}");
        assert_eq!(response.content().as_ref(), LOGO, "{uri}");
    }
}

#[test]
fn test_missing_asset_fails_and_closes_nothing() {
    let fixture = Fixture::new();

    let response = fixture.fetch_async("asset:/missing.png");
    assert_eq!(response.code(), RetCode::Failed);
    assert!(response.content().is_empty());
    assert_eq!(fixture.opened.load(Ordering::SeqCst), 1);
    assert_eq!(fixture.closed.load(Ordering::SeqCst), 0);
}

#[test]
fn test_path_error_touches_neither_store_nor_workers() {
    let fixture = Fixture::new();

    let sync_response = fixture
        .loader
        .request_untrusted_content(&fixture.request("asset:/bad%FF.png"));
    let async_response = fixture.fetch_async("asset:/bad%G1.png");

    assert_eq!(sync_response.code(), RetCode::PathError);
    assert_eq!(async_response.code(), RetCode::PathError);
    assert_eq!(fixture.opened.load(Ordering::SeqCst), 0);
    assert_eq!(fixture.workers.runner_count(), 0);
}

#[test]
fn test_concurrent_first_requests_share_one_runner() {
    const THREADS: usize = 16;

    let fixture = Arc::new(Fixture::new());
    let barrier = Arc::new(Barrier::new(THREADS));
    let callbacks = Arc::new(AtomicUsize::new(0));
    let (tx, rx) = mpsc::channel();

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let fixture = fixture.clone();
            let barrier = barrier.clone();
            let callbacks = callbacks.clone();
            let tx = tx.clone();
            thread::spawn(move || {
                let request = fixture.request("asset:/logo.png");
                barrier.wait();
                fixture.loader.request_untrusted_content_async(
                    request,
                    Box::new(move |response| {
                        callbacks.fetch_add(1, Ordering::SeqCst);
                        tx.send(response.code()).unwrap();
                    }),
                );
            })
        })
        .collect();
    drop(tx);

    for handle in handles {
        handle.join().unwrap();
    }
    let codes: Vec<_> = (0..THREADS)
        .map(|_| rx.recv_timeout(Duration::from_secs(5)).unwrap())
        .collect();

    assert!(codes.iter().all(|code| *code == RetCode::Success));
    assert_eq!(callbacks.load(Ordering::SeqCst), THREADS);
    assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
    assert_eq!(fixture.workers.runner_count(), 1);
    assert_eq!(fixture.loader.metrics().snapshot().succeeded, THREADS as u64);
}

#[test]
fn test_terminated_workers_still_answer_once() {
    let fixture = Fixture::new();
    assert_eq!(fixture.fetch_async("asset:/logo.png").code(), RetCode::Success);

    fixture.workers.terminate();

    assert_eq!(fixture.fetch_async("asset:/logo.png").code(), RetCode::Failed);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_with_defaults_serves_asset_root_and_files() {
    let temp_dir = TempDir::new().unwrap();
    let asset_root = temp_dir.path().join("rawfile");
    fs::create_dir_all(asset_root.join("vue2")).unwrap();
    fs::write(asset_root.join("vue2/index.js"), b"var a = 1;").unwrap();
    let plain = temp_dir.path().join("plain.txt");
    fs::write(&plain, b"plain").unwrap();

    let mut config = Config::default();
    config.asset.root = Some(asset_root);
    let loader = UriLoader::with_defaults(&config, tokio::runtime::Handle::current()).unwrap();
    let workers = Arc::new(WorkerManager::new());
    let request = |uri: String| {
        Arc::new(
            RequestJob::builder()
                .uri(uri)
                .worker_manager(workers.clone())
                .build(),
        )
    };

    let asset = loader.load(request("asset:/vue2/index.js".to_string())).await;
    assert_eq!(asset.code(), RetCode::Success);
    assert_eq!(asset.content().as_ref(), b"var a = 1;");

    let file = loader
        .load(request(format!("file://{}", plain.display())))
        .await;
    assert_eq!(file.code(), RetCode::Success);
    assert_eq!(file.content().as_ref(), b"plain");

    let unknown = loader.load(request("res:/vue2/index.js".to_string())).await;
    assert_eq!(unknown.code(), RetCode::SchemeNotRegister);
}
