//! Progress-callback trait for per-image conversion events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to receive
//! events as a batch moves through OCR and conversion. The CLI uses this to
//! drive its progress bar.
//!
//! # Example
//!
//! ```rust
//! use edgequake_img2tex::{ConversionProgressCallback, ConversionConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     completed: Arc<AtomicUsize>,
//! }
//!
//! impl ConversionProgressCallback for CountingCallback {
//!     fn on_image_complete(&self, index: usize, total: usize, latex_len: usize) {
//!         self.completed.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("Image {}/{} done ({} bytes)", index + 1, total, latex_len);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback {
//!     completed: Arc::new(AtomicUsize::new(0)),
//! });
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(counter as Arc<dyn ConversionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the batch pipeline as it processes each image.
///
/// With `concurrency > 1` the per-image methods may be called concurrently
/// from different tasks, so shared mutable state needs a `Mutex` or atomics.
/// All methods default to no-ops.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once before any image is processed.
    fn on_batch_start(&self, total: usize) {
        let _ = total;
    }

    /// Called before OCR starts on an image. `index` is 0-based.
    fn on_image_start(&self, index: usize, total: usize) {
        let _ = (index, total);
    }

    /// Called when OCR failed and the placeholder text is used instead.
    fn on_image_fallback(&self, index: usize, total: usize, reason: &str) {
        let _ = (index, total, reason);
    }

    /// Called when an image converted; `latex_len` is the body length in bytes.
    fn on_image_complete(&self, index: usize, total: usize, latex_len: usize) {
        let _ = (index, total, latex_len);
    }

    /// Called when an image failed.
    fn on_image_error(&self, index: usize, total: usize, error: &str) {
        let _ = (index, total, error);
    }

    /// Called once after every image has been attempted.
    fn on_batch_complete(&self, total: usize, success_count: usize) {
        let _ = (total, success_count);
    }
}

/// A no-op implementation, the default when no callback is configured.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct TrackingCallback {
        starts: AtomicUsize,
        completes: AtomicUsize,
        fallbacks: AtomicUsize,
        errors: Mutex<Vec<String>>,
        success: AtomicUsize,
    }

    impl ConversionProgressCallback for TrackingCallback {
        fn on_image_start(&self, _index: usize, _total: usize) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_image_fallback(&self, _index: usize, _total: usize, _reason: &str) {
            self.fallbacks.fetch_add(1, Ordering::SeqCst);
        }

        fn on_image_complete(&self, _index: usize, _total: usize, _latex_len: usize) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_image_error(&self, _index: usize, _total: usize, error: &str) {
            self.errors.lock().unwrap().push(error.to_string());
        }

        fn on_batch_complete(&self, _total: usize, success_count: usize) {
            self.success.store(success_count, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_batch_start(2);
        cb.on_image_start(0, 2);
        cb.on_image_fallback(0, 2, "tesseract missing");
        cb.on_image_complete(0, 2, 42);
        cb.on_image_error(1, 2, "not an image");
        cb.on_batch_complete(2, 1);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();
        tracker.on_image_start(0, 2);
        tracker.on_image_fallback(0, 2, "exit status 1");
        tracker.on_image_complete(0, 2, 100);
        tracker.on_image_start(1, 2);
        tracker.on_image_error(1, 2, "not found");
        tracker.on_batch_complete(2, 1);

        assert_eq!(tracker.starts.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.fallbacks.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.errors.lock().unwrap().as_slice(), ["not found"]);
        assert_eq!(tracker.success.load(Ordering::SeqCst), 1);
    }
}
