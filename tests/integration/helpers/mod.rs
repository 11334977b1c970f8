//! Test helper utilities

#![allow(dead_code)]

use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use tempfile::TempDir;
use zip::write::SimpleFileOptions;

use vlmweave::analyzer::{AnalysisSession, InjectionTimeouts, SessionOptions, WorkerPool};
use vlmweave::provider::{Analysis, AnalysisProvider, ProviderError, ProviderResult};
use vlmweave::ResourceMetadata;
use vlmweave::ResourceHints;

/// Bytes that pass for an image; providers under test never decode them.
pub const FAKE_PNG: &[u8] = b"\x89PNG\r\n\x1a\nfake";

/// Provider that answers from a table keyed by image bytes.
///
/// Unknown bytes get `"analysis of <bytes>"`. Bytes registered with
/// [`fail_on`](Self::fail_on) return an HTTP status error, and bytes
/// registered with [`stall_on`](Self::stall_on) block until
/// [`release`](Self::release) is called.
pub struct ScriptedProvider {
    answers: HashMap<Vec<u8>, String>,
    failing: Vec<Vec<u8>>,
    stalling: Vec<Vec<u8>>,
    delay: Duration,
    calls: AtomicUsize,
    released: Mutex<bool>,
    release: Condvar,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self {
            answers: HashMap::new(),
            failing: Vec::new(),
            stalling: Vec::new(),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            released: Mutex::new(false),
            release: Condvar::new(),
        }
    }

    pub fn answer(mut self, bytes: &[u8], text: &str) -> Self {
        self.answers.insert(bytes.to_vec(), text.to_string());
        self
    }

    pub fn fail_on(mut self, bytes: &[u8]) -> Self {
        self.failing.push(bytes.to_vec());
        self
    }

    pub fn stall_on(mut self, bytes: &[u8]) -> Self {
        self.stalling.push(bytes.to_vec());
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Let stalled calls finish.
    pub fn release(&self) {
        *self.released.lock().unwrap() = true;
        self.release.notify_all();
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl AnalysisProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> Option<&str> {
        Some("test-model")
    }

    fn analyze(&self, bytes: &[u8], _mime_type: &str) -> ProviderResult<Analysis> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        if self.stalling.iter().any(|s| s == bytes) {
            let released = self.released.lock().unwrap();
            let _released = self.release.wait_while(released, |r| !*r).unwrap();
            return Ok(Analysis::new("late result"));
        }
        if self.failing.iter().any(|f| f == bytes) {
            return Err(ProviderError::Status {
                code: 500,
                body: "internal error".to_string(),
            });
        }
        let text = self
            .answers
            .get(bytes)
            .cloned()
            .unwrap_or_else(|| format!("analysis of {}", String::from_utf8_lossy(bytes)));
        Ok(Analysis::new(text))
    }
}

pub fn timeouts(reference_ms: u64, drain_ms: u64) -> SessionOptions {
    SessionOptions {
        timeouts: InjectionTimeouts {
            reference: Duration::from_millis(reference_ms),
            drain: Duration::from_millis(drain_ms),
        },
        ..Default::default()
    }
}

/// Session over a pool of `workers` threads.
pub fn session_with(
    provider: Arc<dyn AnalysisProvider>,
    workers: usize,
    options: SessionOptions,
) -> AnalysisSession {
    let pool = Arc::new(WorkerPool::with_size(workers).expect("Failed to start pool"));
    AnalysisSession::new(pool, provider, options)
}

/// Metadata as an archive parser would produce it for `embedded:/<name>`.
pub fn embedded(name: &str) -> ResourceMetadata {
    ResourceMetadata::new(ResourceHints::new().final_path(format!("embedded:/{}", name)))
}

/// Write a ZIP archive with the given entries into `dir`.
pub fn write_zip(dir: &Path, file_name: &str, entries: &[(&str, &[u8])]) -> PathBuf {
    let path = dir.join(file_name);
    let file = File::create(&path).expect("Failed to create zip");
    let mut zip = zip::ZipWriter::new(file);
    let options = SimpleFileOptions::default();
    for (name, bytes) in entries {
        zip.start_file(*name, options).expect("Failed to start entry");
        zip.write_all(bytes).expect("Failed to write entry");
    }
    zip.finish().expect("Failed to finish zip");
    path
}

/// Temp dir holding a small document with two images and one text entry.
pub fn sample_document() -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = write_zip(
        dir.path(),
        "sample.zip",
        &[
            ("notes.txt", b"First paragraph.\n\nSecond paragraph."),
            ("media/a.png", b"image-a"),
            ("media/b.png", b"image-b"),
        ],
    );
    (dir, path)
}
