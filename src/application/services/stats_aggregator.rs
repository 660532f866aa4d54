use crate::application::services::sequencing::{FetchOutcome, RequestSequence, Ticket};
use crate::domain::entities::{StatsDetails, StatsSnapshot, TimeRange, TrendPoint, TrendSeries};
use crate::domain::errors::ServiceResult;
use tokio_util::sync::CancellationToken;

/// What the trend chart should show
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrendState {
    /// No response for the selected range yet
    Loading,
    /// The service answered with no buckets
    Empty,
    Ready(Vec<TrendPoint>),
}

/// Aggregate counters and the trend series.
///
/// Both read paths use `/api/stats/details`; the snapshot with `period=all`,
/// the trend with the selected range. Each path has its own request sequence.
#[derive(Debug)]
pub struct StatsAggregator {
    snapshot: Option<StatsSnapshot>,
    snapshot_sequence: RequestSequence,
    snapshot_error: Option<String>,
    range: TimeRange,
    trend: Option<TrendSeries>,
    trend_sequence: RequestSequence,
    trend_error: Option<String>,
}

impl StatsAggregator {
    pub fn new(range: TimeRange) -> Self {
        Self {
            snapshot: None,
            snapshot_sequence: RequestSequence::new(),
            snapshot_error: None,
            range,
            trend: None,
            trend_sequence: RequestSequence::new(),
            trend_error: None,
        }
    }

    pub fn snapshot(&self) -> Option<&StatsSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn snapshot_error(&self) -> Option<&str> {
        self.snapshot_error.as_deref()
    }

    pub fn range(&self) -> TimeRange {
        self.range
    }

    pub fn trend_error(&self) -> Option<&str> {
        self.trend_error.as_deref()
    }

    pub fn begin_snapshot(&mut self, parent: &CancellationToken) -> Ticket {
        self.snapshot_sequence.issue(parent)
    }

    /// Replace the snapshot wholesale; failures keep the previous one
    pub fn apply_snapshot(&mut self, seq: u64, result: ServiceResult<StatsDetails>) -> FetchOutcome {
        if !self.snapshot_sequence.complete(seq) {
            return FetchOutcome::Stale;
        }
        match result {
            Ok(details) => {
                self.snapshot = Some(details.snapshot);
                self.snapshot_error = None;
                FetchOutcome::Applied
            }
            Err(err) => {
                self.snapshot_error = Some(err.to_string());
                FetchOutcome::Failed(err)
            }
        }
    }

    /// Select a trend range. Returns true when it changed.
    pub fn set_range(&mut self, range: TimeRange) -> bool {
        if range == self.range {
            return false;
        }
        self.range = range;
        self.trend_error = None;
        true
    }

    pub fn begin_trend(&mut self, parent: &CancellationToken) -> (Ticket, TimeRange) {
        (self.trend_sequence.issue(parent), self.range)
    }

    /// Replace the series for `range` wholesale
    pub fn apply_trend(
        &mut self,
        seq: u64,
        range: TimeRange,
        result: ServiceResult<StatsDetails>,
    ) -> FetchOutcome {
        if !self.trend_sequence.complete(seq) || range != self.range {
            return FetchOutcome::Stale;
        }
        match result {
            Ok(details) => {
                self.trend = Some(TrendSeries {
                    range,
                    points: details.timeline,
                });
                self.trend_error = None;
                FetchOutcome::Applied
            }
            Err(err) => {
                self.trend_error = Some(err.to_string());
                FetchOutcome::Failed(err)
            }
        }
    }

    pub fn trend_state(&self) -> TrendState {
        match &self.trend {
            Some(series) if series.range == self.range => {
                if series.points.is_empty() {
                    TrendState::Empty
                } else {
                    TrendState::Ready(series.points.clone())
                }
            }
            _ => TrendState::Loading,
        }
    }

    pub fn cancel(&mut self) {
        self.snapshot_sequence.cancel();
        self.trend_sequence.cancel();
    }
}
