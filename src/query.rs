//! Historical queries against the REST backend.
//!
//! [`HistoryClient`] issues one paginated range query per metric
//! (`POST /farm/{segment}`) and normalizes the page into a [`Series`].
//! [`HistoryLoader`] fans the queries out as independent tasks and applies
//! each result to a sink as it arrives.
//!
//! ## Example
//!
//! ```rust,no_run
//! use farmwatch::query::{HistoryClient, HistoryQuery, HistorySource, TimeRange};
//! use farmwatch_types::MetricId;
//! use std::time::Duration;
//!
//! # tokio_test::block_on(async {
//! let client = HistoryClient::new("http://localhost:8080", Duration::from_secs(10)).unwrap();
//! let range = TimeRange::parse("2024-01-01T09:00", "2024-01-01T10:00").unwrap();
//! let query = HistoryQuery::default().with_range(range);
//!
//! let series = client.query(MetricId::Humidity, &query).await.unwrap();
//! println!("{} points", series.len());
//! # });
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{self, Debug};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use farmwatch_types::{parse_value, MetricId, SamplePoint, Series};

use crate::error::QueryError;
use crate::sink::RenderSink;

/// Default page size for historical queries.
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Timestamp format the backend expects for range bounds.
const RANGE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Sort order requested from the backend. Results are never re-sorted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(format!("invalid sort order '{}': expected asc or desc", other)),
        }
    }
}

/// Inclusive local-time range. Start never follows end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl TimeRange {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Result<Self, QueryError> {
        if end < start {
            return Err(QueryError::InvalidRange {
                start: start.format(RANGE_FORMAT).to_string(),
                end: end.format(RANGE_FORMAT).to_string(),
            });
        }
        Ok(Self { start, end })
    }

    /// Parse both bounds with [`parse_local_datetime`].
    pub fn parse(start: &str, end: &str) -> Result<Self, QueryError> {
        let start = parse_local_datetime(start)
            .ok_or_else(|| QueryError::Parse(format!("invalid start time '{}'", start)))?;
        let end = parse_local_datetime(end)
            .ok_or_else(|| QueryError::Parse(format!("invalid end time '{}'", end)))?;
        Self::new(start, end)
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} .. {}",
            self.start.format("%Y-%m-%d %H:%M"),
            self.end.format("%Y-%m-%d %H:%M")
        )
    }
}

/// Parameters of one historical query.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryQuery {
    /// `None` lets the backend apply its default window.
    pub range: Option<TimeRange>,
    pub page: u32,
    pub size: u32,
    pub sort: SortOrder,
}

impl Default for HistoryQuery {
    fn default() -> Self {
        Self {
            range: None,
            page: 0,
            size: DEFAULT_PAGE_SIZE,
            sort: SortOrder::Asc,
        }
    }
}

impl HistoryQuery {
    pub fn with_range(mut self, range: TimeRange) -> Self {
        self.range = Some(range);
        self
    }

    pub fn with_page(mut self, page: u32, size: u32) -> Self {
        self.page = page;
        self.size = size;
        self
    }

    pub fn with_sort(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }
}

/// JSON body of `POST /farm/{segment}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryRequest {
    pub page: u32,
    pub size: u32,
    pub sort: SortOrder,
    #[serde(rename = "startTime", skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(rename = "endTime", skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
}

impl From<&HistoryQuery> for HistoryRequest {
    fn from(query: &HistoryQuery) -> Self {
        Self {
            page: query.page,
            size: query.size,
            sort: query.sort,
            start_time: query
                .range
                .map(|r| r.start.format(RANGE_FORMAT).to_string()),
            end_time: query.range.map(|r| r.end.format(RANGE_FORMAT).to_string()),
        }
    }
}

/// Page of measurements returned by the backend.
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryResponse {
    #[serde(default)]
    pub content: Vec<MeasurementRecord>,
    #[serde(rename = "totalElements", default)]
    pub total_elements: Option<u64>,
    #[serde(rename = "totalPages", default)]
    pub total_pages: Option<u32>,
}

/// One measurement record. The value may arrive as a number or a numeric
/// string.
#[derive(Debug, Clone, Deserialize)]
pub struct MeasurementRecord {
    #[serde(rename = "measuredAt")]
    pub measured_at: String,
    #[serde(default)]
    pub value: Value,
}

impl MeasurementRecord {
    fn to_point(&self) -> Option<SamplePoint> {
        let value = match &self.value {
            Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
            Value::String(s) => parse_value(s),
            _ => None,
        }?;
        let timestamp = parse_measured_at(&self.measured_at)?;
        Some(SamplePoint::new(timestamp, value))
    }
}

/// A normalized page for one metric.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryPage {
    pub metric: MetricId,
    pub page: u32,
    pub series: Series,
    pub total_elements: Option<u64>,
    pub total_pages: Option<u32>,
}

impl HistoryResponse {
    /// Map records 1:1 into a series in the order returned.
    ///
    /// Records with a missing or non-finite value or an unparsable
    /// timestamp are skipped.
    pub fn into_page(self, metric: MetricId, page: u32) -> HistoryPage {
        let mut series = Series::with_capacity(self.content.len());
        for record in &self.content {
            match record.to_point() {
                Some(point) => series.push(point),
                None => warn!(
                    "Skipping {} record at {:?} with value {}",
                    metric, record.measured_at, record.value
                ),
            }
        }
        HistoryPage {
            metric,
            page,
            series,
            total_elements: self.total_elements,
            total_pages: self.total_pages,
        }
    }
}

/// Parse a user-supplied local time, `YYYY-MM-DDTHH:MM` or
/// `YYYY-MM-DDTHH:MM:SS` (a space may replace the `T`).
pub fn parse_local_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
    ]
    .iter()
    .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
}

/// Parse a backend `measuredAt`: RFC 3339 with an offset, or a naive
/// timestamp in local time.
pub fn parse_measured_at(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Anything that can answer a historical query.
#[async_trait]
pub trait HistorySource: Send + Sync + Debug {
    /// Fetch one page for `metric`.
    async fn fetch_page(&self, metric: MetricId, query: &HistoryQuery)
        -> Result<HistoryPage, QueryError>;

    /// Fetch one page and keep only the series.
    async fn query(&self, metric: MetricId, query: &HistoryQuery) -> Result<Series, QueryError> {
        Ok(self.fetch_page(metric, query).await?.series)
    }
}

/// HTTP client for the historical query endpoints.
#[derive(Debug, Clone)]
pub struct HistoryClient {
    client: Client,
    base_url: String,
}

impl HistoryClient {
    /// Create a client with a per-request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, QueryError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url))
    }

    /// Create a client sharing an existing HTTP client.
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    /// Endpoint URL for `metric`.
    pub fn endpoint(&self, metric: MetricId) -> String {
        format!("{}/farm/{}", self.base_url, metric.history_segment())
    }
}

#[async_trait]
impl HistorySource for HistoryClient {
    async fn fetch_page(
        &self,
        metric: MetricId,
        query: &HistoryQuery,
    ) -> Result<HistoryPage, QueryError> {
        let url = self.endpoint(metric);
        let body = HistoryRequest::from(query);
        debug!("POST {} {:?}", url, body);

        let response = self.client.post(&url).json(&body).send().await?;

        if !response.status().is_success() {
            return Err(QueryError::Status(response.status().as_u16()));
        }

        let page: HistoryResponse = response
            .json()
            .await
            .map_err(|e| QueryError::Parse(e.to_string()))?;

        Ok(page.into_page(metric, query.page))
    }
}

/// Result of one fanned-out query.
#[derive(Debug)]
struct Outcome {
    generation: u64,
    metric: MetricId,
    result: Result<HistoryPage, QueryError>,
}

/// Pagination details of the last successful page per metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageInfo {
    pub page: u32,
    pub points: usize,
    pub total_elements: Option<u64>,
    pub total_pages: Option<u32>,
}

/// Concurrent, cancellable fan-out of historical queries.
///
/// Each metric's query runs as its own task. Results are applied in
/// [`HistoryLoader::poll`] as they arrive; a slow or failing metric never
/// holds back the others. Cancelling (or starting a new round) discards
/// anything still in flight.
#[derive(Debug)]
pub struct HistoryLoader {
    source: Arc<dyn HistorySource>,
    generation: u64,
    tasks: Vec<JoinHandle<()>>,
    pending: BTreeSet<MetricId>,
    pages: BTreeMap<MetricId, PageInfo>,
    errors: BTreeMap<MetricId, String>,
    tx: mpsc::UnboundedSender<Outcome>,
    rx: mpsc::UnboundedReceiver<Outcome>,
}

impl HistoryLoader {
    pub fn new(source: Arc<dyn HistorySource>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            source,
            generation: 0,
            tasks: Vec::new(),
            pending: BTreeSet::new(),
            pages: BTreeMap::new(),
            errors: BTreeMap::new(),
            tx,
            rx,
        }
    }

    /// Start one query per metric, cancelling the previous round.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&mut self, metrics: &[MetricId], query: &HistoryQuery) {
        self.cancel();
        let generation = self.generation;

        for &metric in metrics {
            let source = self.source.clone();
            let tx = self.tx.clone();
            let query = query.clone();
            self.pending.insert(metric);
            self.tasks.push(tokio::spawn(async move {
                let result = source.fetch_page(metric, &query).await;
                let _ = tx.send(Outcome {
                    generation,
                    metric,
                    result,
                });
            }));
        }

        info!(
            "Started historical queries for {:?} (page {}, size {}, sort {})",
            metrics, query.page, query.size, query.sort
        );
    }

    /// Abort in-flight queries; their results will never be applied.
    pub fn cancel(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
        if !self.pending.is_empty() {
            debug!("Cancelled historical queries for {:?}", self.pending);
        }
        self.pending.clear();
        self.generation += 1;
        while self.rx.try_recv().is_ok() {}
    }

    /// Apply every result received so far. Returns how many charts changed.
    pub fn poll<S: RenderSink>(&mut self, sink: &mut S) -> usize {
        let mut updated = 0;
        while let Ok(outcome) = self.rx.try_recv() {
            if self.apply(outcome, sink) {
                updated += 1;
            }
        }
        updated
    }

    /// Wait for the next result and apply it.
    pub async fn next<S: RenderSink>(&mut self, sink: &mut S) -> bool {
        match self.rx.recv().await {
            Some(outcome) => self.apply(outcome, sink),
            None => false,
        }
    }

    fn apply<S: RenderSink>(&mut self, outcome: Outcome, sink: &mut S) -> bool {
        if outcome.generation != self.generation {
            debug!("Discarding stale historical result for {}", outcome.metric);
            return false;
        }
        let metric = outcome.metric;
        self.pending.remove(&metric);

        match outcome.result {
            Ok(page) => {
                self.errors.remove(&metric);
                self.pages.insert(
                    metric,
                    PageInfo {
                        page: page.page,
                        points: page.series.len(),
                        total_elements: page.total_elements,
                        total_pages: page.total_pages,
                    },
                );
                debug!("Received {} historical points for {}", page.series.len(), metric);
                match sink.update(metric, &page.series) {
                    Ok(()) => true,
                    Err(e) => {
                        warn!("Chart update failed for {}: {}", metric, e);
                        false
                    }
                }
            }
            Err(e) => {
                error!("Historical query for {} failed: {}", metric, e);
                self.errors.insert(metric, e.to_string());
                false
            }
        }
    }

    /// True while any query of the current round is outstanding.
    pub fn is_loading(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn page_info(&self, metric: MetricId) -> Option<&PageInfo> {
        self.pages.get(&metric)
    }

    pub fn last_error(&self, metric: MetricId) -> Option<&str> {
        self.errors.get(&metric).map(String::as_str)
    }
}

impl Drop for HistoryLoader {
    fn drop(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::recording::RecordingSink;
    use chrono::{NaiveDate, Timelike};
    use std::sync::Mutex;
    use tokio::time::sleep;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn test_request_body_with_range() {
        let query = HistoryQuery::default()
            .with_range(TimeRange::new(at(9, 0), at(10, 0)).unwrap())
            .with_page(0, 50);
        let body = serde_json::to_value(HistoryRequest::from(&query)).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "page": 0,
                "size": 50,
                "sort": "asc",
                "startTime": "2024-01-01T09:00:00",
                "endTime": "2024-01-01T10:00:00"
            })
        );
    }

    #[test]
    fn test_request_body_without_range() {
        let query = HistoryQuery::default().with_sort(SortOrder::Desc);
        let body = serde_json::to_value(HistoryRequest::from(&query)).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"page": 0, "size": 50, "sort": "desc"})
        );
    }

    #[test]
    fn test_range_validation() {
        assert!(TimeRange::new(at(10, 0), at(9, 0)).is_err());
        assert!(TimeRange::new(at(9, 0), at(9, 0)).is_ok());

        let range = TimeRange::parse("2024-01-01T09:00", "2024-01-01 10:00:30").unwrap();
        assert_eq!(range.start(), at(9, 0));
        assert_eq!(range.end().second(), 30);
        assert!(TimeRange::parse("yesterday", "2024-01-01T10:00").is_err());
    }

    #[test]
    fn test_humidity_page_normalization() {
        let response: HistoryResponse = serde_json::from_str(
            r#"{"content":[{"measuredAt":"2024-01-01T09:10:00Z","value":55}]}"#,
        )
        .unwrap();
        let page = response.into_page(MetricId::Humidity, 0);

        let expected = Utc.with_ymd_and_hms(2024, 1, 1, 9, 10, 0).unwrap();
        assert_eq!(page.series, vec![SamplePoint::new(expected, 55.0)]);
        assert_eq!(page.total_pages, None);
    }

    #[test]
    fn test_normalization_keeps_backend_order() {
        let response: HistoryResponse = serde_json::from_str(
            r#"{
                "content": [
                    {"measuredAt": "2024-01-01T09:30:00Z", "value": 3},
                    {"measuredAt": "2024-01-01T09:10:00Z", "value": "1.5"},
                    {"measuredAt": "garbage", "value": 9},
                    {"measuredAt": "2024-01-01T09:20:00Z", "value": null},
                    {"measuredAt": "2024-01-01T09:40:00Z", "value": 4}
                ],
                "totalElements": 5,
                "totalPages": 1
            }"#,
        )
        .unwrap();
        let page = response.into_page(MetricId::Temperature, 0);

        let values: Vec<f64> = page.series.iter().map(|p| p.value).collect();
        assert_eq!(values, vec![3.0, 1.5, 4.0]);
        assert_eq!(page.total_elements, Some(5));
        assert_eq!(page.total_pages, Some(1));
    }

    #[test]
    fn test_missing_content_is_empty() {
        let response: HistoryResponse = serde_json::from_str("{}").unwrap();
        assert!(response.into_page(MetricId::SoilMoisture, 2).series.is_empty());
    }

    #[test]
    fn test_parse_measured_at_local() {
        let parsed = parse_measured_at("2024-01-01T09:10:00.250").unwrap();
        let local = parsed.with_timezone(&Local);
        assert_eq!(local.hour(), 9);
        assert_eq!(local.minute(), 10);
        assert!(parse_measured_at("09:10").is_none());
    }

    #[test]
    fn test_endpoint() {
        let client = HistoryClient::with_client(Client::new(), "http://farm:8080/");
        assert_eq!(
            client.endpoint(MetricId::SoilMoisture),
            "http://farm:8080/farm/soil"
        );
        assert_eq!(
            client.endpoint(MetricId::Temperature),
            "http://farm:8080/farm/temperature"
        );
    }

    #[test]
    fn test_sort_order_parse() {
        assert_eq!("ASC".parse::<SortOrder>(), Ok(SortOrder::Asc));
        assert_eq!("desc".parse::<SortOrder>(), Ok(SortOrder::Desc));
        assert!("up".parse::<SortOrder>().is_err());
        assert_eq!(SortOrder::Asc.toggled(), SortOrder::Desc);
    }

    /// Source answering each metric after a configurable delay.
    #[derive(Debug, Default)]
    struct FakeSource {
        delays: BTreeMap<MetricId, u64>,
        failing: BTreeSet<MetricId>,
        seen: Mutex<Vec<(MetricId, u32)>>,
    }

    #[async_trait]
    impl HistorySource for FakeSource {
        async fn fetch_page(
            &self,
            metric: MetricId,
            query: &HistoryQuery,
        ) -> Result<HistoryPage, QueryError> {
            self.seen.lock().unwrap().push((metric, query.page));
            if let Some(ms) = self.delays.get(&metric) {
                sleep(Duration::from_millis(*ms)).await;
            }
            if self.failing.contains(&metric) {
                return Err(QueryError::Status(500));
            }
            let value = match metric {
                MetricId::Temperature => 21.0,
                MetricId::Humidity => 55.0,
                MetricId::SoilMoisture => 33.0,
            };
            Ok(HistoryPage {
                metric,
                page: query.page,
                series: vec![SamplePoint::now(value)],
                total_elements: Some(1),
                total_pages: Some(1),
            })
        }
    }

    fn attached_sink() -> RecordingSink {
        let mut sink = RecordingSink::default();
        for metric in MetricId::ALL {
            sink.attach(metric, metric.label()).unwrap();
        }
        sink
    }

    #[tokio::test]
    async fn test_fan_out_independent_results() {
        let mut source = FakeSource::default();
        source.delays.insert(MetricId::Temperature, 200);
        source.failing.insert(MetricId::SoilMoisture);
        let mut loader = HistoryLoader::new(Arc::new(source));
        let mut sink = attached_sink();

        loader.start(&MetricId::ALL, &HistoryQuery::default());
        assert!(loader.is_loading());
        sleep(Duration::from_millis(50)).await;

        // Humidity is in, soil failed, temperature is still loading
        assert_eq!(loader.poll(&mut sink), 1);
        assert_eq!(sink.updates(MetricId::Humidity), vec![vec![55.0]]);
        assert!(sink.updates(MetricId::SoilMoisture).is_empty());
        assert!(loader.last_error(MetricId::SoilMoisture).is_some());
        assert!(loader.is_loading());

        sleep(Duration::from_millis(250)).await;
        assert_eq!(loader.poll(&mut sink), 1);
        assert_eq!(sink.updates(MetricId::Temperature), vec![vec![21.0]]);
        assert!(!loader.is_loading());
        assert_eq!(loader.page_info(MetricId::Temperature).unwrap().points, 1);
    }

    #[tokio::test]
    async fn test_cancel_discards_late_results() {
        let mut source = FakeSource::default();
        source.delays.insert(MetricId::Humidity, 100);
        let mut loader = HistoryLoader::new(Arc::new(source));
        let mut sink = attached_sink();

        loader.start(&[MetricId::Humidity], &HistoryQuery::default());
        loader.cancel();
        assert!(!loader.is_loading());

        sleep(Duration::from_millis(150)).await;
        assert_eq!(loader.poll(&mut sink), 0);
        assert_eq!(sink.update_count(), 0);
    }

    #[tokio::test]
    async fn test_new_round_supersedes_old() {
        let mut source = FakeSource::default();
        source.delays.insert(MetricId::Humidity, 30);
        let source = Arc::new(source);
        let mut loader = HistoryLoader::new(source.clone());
        let mut sink = attached_sink();

        loader.start(&[MetricId::Humidity], &HistoryQuery::default());
        loader.start(
            &[MetricId::Humidity],
            &HistoryQuery::default().with_page(1, 50),
        );
        sleep(Duration::from_millis(100)).await;

        assert_eq!(loader.poll(&mut sink), 1);
        assert_eq!(loader.page_info(MetricId::Humidity).unwrap().page, 1);
    }

    #[tokio::test]
    async fn test_failure_leaves_previous_chart() {
        let mut sink = attached_sink();
        let mut ok_loader = HistoryLoader::new(Arc::new(FakeSource::default()));
        ok_loader.start(&[MetricId::Humidity], &HistoryQuery::default());
        assert!(ok_loader.next(&mut sink).await);

        let mut failing = FakeSource::default();
        failing.failing.insert(MetricId::Humidity);
        let mut failing_loader = HistoryLoader::new(Arc::new(failing));
        failing_loader.start(&[MetricId::Humidity], &HistoryQuery::default());
        assert!(!failing_loader.next(&mut sink).await);

        assert_eq!(sink.updates(MetricId::Humidity).len(), 1);
    }

    #[tokio::test]
    async fn test_result_after_detach_is_not_drawn() {
        let mut source = FakeSource::default();
        source.delays.insert(MetricId::Temperature, 50);
        let mut loader = HistoryLoader::new(Arc::new(source));
        let mut sink = attached_sink();

        loader.start(&[MetricId::Temperature], &HistoryQuery::default());
        loader.cancel();
        sink.detach(MetricId::Temperature).unwrap();

        sleep(Duration::from_millis(100)).await;
        loader.poll(&mut sink);
        assert!(sink.updates(MetricId::Temperature).is_empty());
    }
}
