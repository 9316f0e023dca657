//! Shared state handed to every endpoint handler.

use std::sync::Arc;

use crate::workflow::{NotifyWorkflow, OcrWorkflow, TrackerWorkflow};

/// Cheap-to-clone bundle of the three workflows. One instance is built at
/// startup and shared across requests; workflows themselves are stateless
/// between runs.
#[derive(Clone)]
pub struct AppContext {
    pub ocr: Arc<OcrWorkflow>,
    pub notifier: Arc<NotifyWorkflow>,
    pub tracker: Arc<TrackerWorkflow>,
}

impl AppContext {
    pub fn new(
        ocr: Arc<OcrWorkflow>,
        notifier: Arc<NotifyWorkflow>,
        tracker: Arc<TrackerWorkflow>,
    ) -> Self {
        Self {
            ocr,
            notifier,
            tracker,
        }
    }
}
