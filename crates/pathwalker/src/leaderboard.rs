//! Fire-and-forget leaderboard submission.
//!
//! Every request runs as a task on the tokio runtime the client was created
//! in. Outcomes are only logged (and, for the personal best lookup, shown on
//! the record time display); nothing is retried and session progress never
//! waits on the backend.

use std::sync::Arc;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::{runtime::Handle, task::JoinHandle};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    collaborators::RecordTimeDisplay,
    config::LeaderboardConfig,
    errors::LeaderboardError,
    models::{BoardOptions, LeaderboardCategory, ScoreRecord, ScoreSubmission},
};

/// Remote leaderboard backend.
#[async_trait]
pub trait LeaderboardSink: Send + Sync {
    async fn submit_score(
        &self,
        submission: &ScoreSubmission,
    ) -> Result<Option<ScoreRecord>, LeaderboardError>;

    async fn personal_best(
        &self,
        board: &BoardOptions,
    ) -> Result<Option<ScoreRecord>, LeaderboardError>;
}

pub struct LeaderboardClient {
    sink: Arc<dyn LeaderboardSink>,
    config: LeaderboardConfig,
    session_id: Uuid,
    handle: Option<Handle>,
    pending: Vec<JoinHandle<()>>,
}

impl LeaderboardClient {
    /// Binds to the current tokio runtime if there is one.
    pub fn new(sink: Arc<dyn LeaderboardSink>, config: LeaderboardConfig) -> Self {
        let handle = Handle::try_current().ok();
        if handle.is_none() {
            warn!("No tokio runtime available, leaderboard submissions will be dropped");
        }
        Self {
            sink,
            config,
            session_id: Uuid::new_v4(),
            handle,
            pending: Vec::new(),
        }
    }

    pub fn with_handle(mut self, handle: Handle) -> Self {
        self.handle = Some(handle);
        self
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Starts tagging submissions with a fresh session id.
    pub fn begin_session(&mut self) -> Uuid {
        self.session_id = Uuid::new_v4();
        self.session_id
    }

    pub fn submit_lap_time(&mut self, time_ms: u64) {
        let score = i64::try_from(time_ms).unwrap_or(i64::MAX);
        self.submit(LeaderboardCategory::LapTime, score);
    }

    pub fn submit_distance(&mut self, distance: i64) {
        self.submit(LeaderboardCategory::Distance, distance);
    }

    fn submit(&mut self, category: LeaderboardCategory, score: i64) {
        let submission = ScoreSubmission {
            session_id: self.session_id,
            board: self.config.board(category),
            score,
            submitted_at: OffsetDateTime::now_utc(),
        };
        let sink = self.sink.clone();

        self.spawn(async move {
            match sink.submit_score(&submission).await {
                Ok(record) => {
                    info!(
                        board = %submission.board.name,
                        score = submission.score,
                        "Score submitted successfully"
                    );
                    if let Some(record) = record {
                        debug!(
                            "User: {}, score: {}",
                            record.display_name.unwrap_or_default(),
                            record.score
                        );
                    }
                }
                Err(e) => {
                    warn!(board = %submission.board.name, "Submit score failed: {e}");
                }
            }
        });
    }

    /// Looks up the personal best lap time and writes it to `display`,
    /// falling back to the placeholder.
    pub fn refresh_record_time(&mut self, display: Arc<dyn RecordTimeDisplay>) {
        let board = self.config.board(LeaderboardCategory::LapTime);
        let placeholder = self.config.placeholder.clone();
        if self.handle.is_none() {
            warn!("No tokio runtime, showing placeholder record time");
            display.set_record_time(&placeholder);
            return;
        }
        let sink = self.sink.clone();

        self.spawn(async move {
            match sink.personal_best(&board).await {
                Ok(Some(record)) if record.score > 0 => {
                    display.set_record_time(&format_lap_time(record.score as u64));
                }
                Ok(_) => display.set_record_time(&placeholder),
                Err(e) => {
                    warn!(board = %board.name, "Personal best lookup failed: {e}");
                    display.set_record_time(&placeholder);
                }
            }
        });
    }

    /// Waits for every request issued so far.
    pub async fn flush(&mut self) {
        for task in self.pending.drain(..) {
            if let Err(e) = task.await {
                warn!("Leaderboard task failed: {e}");
            }
        }
    }

    fn spawn<F>(&mut self, task: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let Some(handle) = &self.handle else {
            warn!("Dropping leaderboard request, no tokio runtime");
            return;
        };
        self.pending.retain(|task| !task.is_finished());
        self.pending.push(handle.spawn(task));
    }
}

/// Lap time as seconds with two decimals, e.g. `12.35s`.
pub fn format_lap_time(time_ms: u64) -> String {
    format!("{:.2}s", time_ms as f64 / 1000.0)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct MemorySink {
        submissions: Mutex<Vec<ScoreSubmission>>,
        best: Option<i64>,
        fail: bool,
    }

    #[async_trait]
    impl LeaderboardSink for MemorySink {
        async fn submit_score(
            &self,
            submission: &ScoreSubmission,
        ) -> Result<Option<ScoreRecord>, LeaderboardError> {
            if self.fail {
                return Err(LeaderboardError::Unavailable("offline".to_string()));
            }
            self.submissions.lock().unwrap().push(submission.clone());
            Ok(None)
        }

        async fn personal_best(
            &self,
            _board: &BoardOptions,
        ) -> Result<Option<ScoreRecord>, LeaderboardError> {
            if self.fail {
                return Err(LeaderboardError::Rejected { status: 500 });
            }
            Ok(self.best.map(|score| ScoreRecord {
                display_name: None,
                score,
            }))
        }
    }

    #[derive(Default)]
    struct Label(Mutex<String>);

    impl RecordTimeDisplay for Label {
        fn set_record_time(&self, text: &str) {
            *self.0.lock().unwrap() = text.to_string();
        }
    }

    #[test]
    fn test_format_lap_time() {
        assert_eq!(format_lap_time(12_346), "12.35s");
        assert_eq!(format_lap_time(0), "0.00s");
    }

    #[tokio::test]
    async fn test_submissions_reach_sink() {
        let sink = Arc::new(MemorySink::default());
        let mut client = LeaderboardClient::new(sink.clone(), LeaderboardConfig::default());

        client.submit_lap_time(4_200);
        client.submit_distance(1_000);
        client.flush().await;

        let submissions = sink.submissions.lock().unwrap();
        assert_eq!(submissions.len(), 2);
        assert_eq!(submissions[0].board.category, LeaderboardCategory::LapTime);
        assert_eq!(submissions[0].score, 4_200);
        assert_eq!(submissions[1].board.name, "RUNNING_BUDDIES_DISTANCE");
        assert_eq!(submissions[0].session_id, client.session_id());
    }

    #[tokio::test]
    async fn test_record_time_from_personal_best() {
        let sink = Arc::new(MemorySink {
            best: Some(9_870),
            ..Default::default()
        });
        let label = Arc::new(Label::default());
        let mut client = LeaderboardClient::new(sink, LeaderboardConfig::default());

        client.refresh_record_time(label.clone());
        client.flush().await;

        assert_eq!(*label.0.lock().unwrap(), "9.87s");
    }

    #[tokio::test]
    async fn test_failures_fall_back_to_placeholder() {
        let sink = Arc::new(MemorySink {
            fail: true,
            ..Default::default()
        });
        let label = Arc::new(Label::default());
        let mut client = LeaderboardClient::new(sink.clone(), LeaderboardConfig::default());

        client.submit_lap_time(1_000);
        client.refresh_record_time(label.clone());
        client.flush().await;

        assert!(sink.submissions.lock().unwrap().is_empty());
        assert_eq!(*label.0.lock().unwrap(), "N/A");
    }

    #[test]
    fn test_without_runtime_requests_are_dropped() {
        let sink = Arc::new(MemorySink::default());
        let mut client = LeaderboardClient::new(sink.clone(), LeaderboardConfig::default());
        client.submit_distance(10);
        assert!(client.pending.is_empty());
    }
}
