use tracing::trace;

/// A category/action pair with an optional label, mirroring classic GA events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyticsEvent {
    pub category: String,
    pub action: String,
    pub label: Option<String>,
}

impl AnalyticsEvent {
    pub fn new(category: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            action: action.into(),
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// Fire-and-forget event delivery. Implementations swallow their own failures.
pub trait AnalyticsSink {
    fn send(&self, event: AnalyticsEvent);
}

/// Used when no tracker is present on the page.
pub struct TraceAnalytics;

impl AnalyticsSink for TraceAnalytics {
    fn send(&self, event: AnalyticsEvent) {
        trace!(
            category = %event.category,
            action = %event.action,
            label = ?event.label,
            "analytics event"
        );
    }
}
