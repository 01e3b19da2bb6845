//! Progress-callback trait for per-label render events.
//!
//! Inject an [`Arc<dyn RenderProgressCallback>`] via
//! [`crate::config::LabelConfigBuilder::progress_callback`] to receive events
//! while a renderer lays out each page.
//!
//! # Example
//!
//! ```rust
//! use pallet_labels::{LabelConfig, RenderProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     labels: AtomicUsize,
//! }
//!
//! impl RenderProgressCallback for CountingCallback {
//!     fn on_label_rendered(&self, index: usize, total: usize) {
//!         self.labels.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("label {}/{}", index + 1, total);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { labels: AtomicUsize::new(0) });
//!
//! let config = LabelConfig::builder()
//!     .progress_callback(counter as Arc<dyn RenderProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::output::OutputFormat;
use std::sync::Arc;

/// Called by the renderers as they lay out each page.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Rendering is single-threaded, but the trait is
/// `Send + Sync` so a callback can be shared with a UI thread.
pub trait RenderProgressCallback: Send + Sync {
    /// Called once before the first page of a document.
    fn on_render_start(&self, format: OutputFormat, total_labels: usize) {
        let _ = (format, total_labels);
    }

    /// Called after the label page for record `index` (0-based) is committed.
    fn on_label_rendered(&self, index: usize, total_labels: usize) {
        let _ = (index, total_labels);
    }

    /// Called after a pallet summary page is committed (PDF only).
    ///
    /// `pallet_no` is 1-based, in emission order.
    fn on_pallet_summary(&self, pallet_no: usize) {
        let _ = pallet_no;
    }

    /// Called once after the document bytes are assembled.
    fn on_render_complete(&self, format: OutputFormat, total_pages: usize) {
        let _ = (format, total_pages);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl RenderProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::LabelConfig`].
pub type ProgressCallback = Arc<dyn RenderProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct TrackingCallback {
        started_total: AtomicUsize,
        labels: AtomicUsize,
        last_pallet: AtomicUsize,
        pages: AtomicUsize,
    }

    impl RenderProgressCallback for TrackingCallback {
        fn on_render_start(&self, _format: OutputFormat, total_labels: usize) {
            self.started_total.store(total_labels, Ordering::SeqCst);
        }

        fn on_label_rendered(&self, _index: usize, _total_labels: usize) {
            self.labels.fetch_add(1, Ordering::SeqCst);
        }

        fn on_pallet_summary(&self, pallet_no: usize) {
            self.last_pallet.store(pallet_no, Ordering::SeqCst);
        }

        fn on_render_complete(&self, _format: OutputFormat, total_pages: usize) {
            self.pages.store(total_pages, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_render_start(OutputFormat::Pdf, 5);
        cb.on_label_rendered(0, 5);
        cb.on_pallet_summary(1);
        cb.on_render_complete(OutputFormat::Pdf, 6);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();

        tracker.on_render_start(OutputFormat::Word, 3);
        assert_eq!(tracker.started_total.load(Ordering::SeqCst), 3);

        for i in 0..3 {
            tracker.on_label_rendered(i, 3);
        }
        tracker.on_pallet_summary(2);
        tracker.on_render_complete(OutputFormat::Word, 3);

        assert_eq!(tracker.labels.load(Ordering::SeqCst), 3);
        assert_eq!(tracker.last_pallet.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.pages.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_render_start(OutputFormat::Pdf, 10);
        cb.on_label_rendered(0, 10);
    }
}
