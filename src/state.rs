use std::sync::Arc;

use crate::service::exporter::ExportSink;
use crate::service::period_filter::ReportingZone;
use crate::service::reconciler::AttendanceReconciler;
use crate::store::Store;

/// Shared handles for request handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub reconciler: AttendanceReconciler,
    pub zone: ReportingZone,
    pub sink: Arc<dyn ExportSink>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, zone: ReportingZone, sink: Arc<dyn ExportSink>) -> Self {
        Self {
            reconciler: AttendanceReconciler::new(store.clone()),
            store,
            zone,
            sink,
        }
    }
}
