use montage_core::types::Timeline;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;

/// Outcome of an export run. Failures are values, never panics; the session
/// controller clears its in-flight state on every variant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ExportResult {
    Success { output_uri: String },
    Failure { message: String },
    Cancelled,
}

/// Encoder-side collaborator consuming a finished timeline.
///
/// Implementations report whole percentages on `progress`; reported values
/// must be non-decreasing. Reporting nothing at all is allowed.
pub trait ExportEngine: Send + Sync + 'static {
    fn export(
        &self,
        timeline: Timeline,
        progress: watch::Sender<u8>,
    ) -> impl Future<Output = ExportResult> + Send;
}

/// Stand-in engine that walks progress to 100% in fixed steps and succeeds.
/// Used by tests and by embedders that have no real encoder wired up yet.
#[derive(Debug, Clone)]
pub struct SimulatedExportEngine {
    output_uri: String,
    step_delay: Duration,
}

impl SimulatedExportEngine {
    pub fn new(output_uri: impl Into<String>) -> Self {
        Self {
            output_uri: output_uri.into(),
            step_delay: Duration::from_millis(10),
        }
    }

    pub fn with_step_delay(mut self, step_delay: Duration) -> Self {
        self.step_delay = step_delay;
        self
    }
}

impl ExportEngine for SimulatedExportEngine {
    async fn export(&self, _timeline: Timeline, progress: watch::Sender<u8>) -> ExportResult {
        for percent in (0..=100u8).step_by(20) {
            progress.send_replace(percent);
            tokio::time::sleep(self.step_delay).await;
        }
        ExportResult::Success {
            output_uri: self.output_uri.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use montage_core::types::Timeline;

    fn timeline() -> Timeline {
        Timeline::build_from_selection(&["content://video/1".to_string()], 2_000).unwrap()
    }

    #[tokio::test]
    async fn simulated_engine_reports_monotonic_progress_and_succeeds() {
        let engine = SimulatedExportEngine::new("file:///out/result.mp4")
            .with_step_delay(Duration::from_millis(1));
        let (tx, rx) = watch::channel(0u8);

        let reporter = tokio::spawn({
            let mut rx = rx;
            async move {
                let mut seen = vec![*rx.borrow()];
                while rx.changed().await.is_ok() {
                    seen.push(*rx.borrow());
                }
                seen
            }
        });

        let result = engine.export(timeline(), tx).await;
        assert_eq!(
            result,
            ExportResult::Success {
                output_uri: "file:///out/result.mp4".into()
            }
        );

        let seen = reporter.await.unwrap();
        assert_eq!(*seen.last().unwrap(), 100);
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn export_result_serde_uses_status_discriminator() {
        let json = serde_json::to_string(&ExportResult::Cancelled).unwrap();
        assert_eq!(json, r#"{"status":"cancelled"}"#);

        let back: ExportResult =
            serde_json::from_str(r#"{"status":"failure","message":"no space left"}"#).unwrap();
        assert_eq!(
            back,
            ExportResult::Failure {
                message: "no space left".into()
            }
        );
    }
}
