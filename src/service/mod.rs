pub mod aggregator;
pub mod exporter;
pub mod period_filter;
pub mod reconciler;
