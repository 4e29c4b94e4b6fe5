//! Series loading
//!
//! Drives fetch → normalize → aggregate for one series kind. Every request
//! carries a [`RequestTicket`]; a response whose ticket is no longer current
//! (a newer request was issued, or the loader was cancelled) is discarded
//! instead of overwriting newer state.

use crate::adapters::parse_envelope;
use crate::chart::TimeSeriesChart;
use crate::error::ChartError;
use crate::types::{NormalizeReport, SeriesKind, UpstreamRecord};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Source of relay records for a series kind
pub trait SeriesSource {
    /// Fetch the raw records of `kind`, authenticated with `token`
    fn fetch_series(&self, kind: SeriesKind, token: &str)
        -> Result<Vec<UpstreamRecord>, ChartError>;
}

/// Bearer token handed to the loader by the caller's session
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    token: Option<String>,
}

impl Credentials {
    pub fn new(token: impl Into<String>) -> Self {
        let token = token.into();
        Self {
            token: (!token.trim().is_empty()).then_some(token),
        }
    }

    /// No token; every fetch fails with [`ChartError::MissingCredential`]
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn token(&self) -> Result<&str, ChartError> {
        self.token.as_deref().ok_or(ChartError::MissingCredential)
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}

// Never print the token itself
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &self.token.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Identifies one in-flight request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestTicket {
    kind: SeriesKind,
    generation: u64,
}

impl RequestTicket {
    pub fn kind(&self) -> SeriesKind {
        self.kind
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Issues request tickets for one series kind and applies responses
#[derive(Debug)]
pub struct SeriesLoader {
    kind: SeriesKind,
    generation: u64,
}

impl SeriesLoader {
    pub fn new(kind: SeriesKind) -> Self {
        Self {
            kind,
            generation: 0,
        }
    }

    pub fn kind(&self) -> SeriesKind {
        self.kind
    }

    /// Start a request; earlier tickets become stale
    pub fn begin(&mut self) -> RequestTicket {
        self.generation += 1;
        RequestTicket {
            kind: self.kind,
            generation: self.generation,
        }
    }

    /// Invalidate every outstanding ticket
    pub fn cancel(&mut self) {
        self.generation += 1;
        debug!(kind = self.kind.as_str(), generation = self.generation, "cancelled requests");
    }

    pub fn is_current(&self, ticket: &RequestTicket) -> bool {
        ticket.kind == self.kind && ticket.generation == self.generation
    }

    /// Pass `response` through only if `ticket` is still current
    pub fn accept<T>(&self, ticket: &RequestTicket, response: T) -> Option<T> {
        if self.is_current(ticket) {
            Some(response)
        } else {
            debug!(
                kind = self.kind.as_str(),
                ticket = ticket.generation,
                current = self.generation,
                "discarding stale response"
            );
            None
        }
    }

    /// Apply a completed fetch to every chart showing this series.
    ///
    /// Returns `None` when the response is stale and was discarded. Fetch
    /// errors put the charts into the error state and are returned as well.
    pub fn complete(
        &self,
        ticket: &RequestTicket,
        response: Result<Vec<UpstreamRecord>, ChartError>,
        charts: &mut [TimeSeriesChart],
    ) -> Option<Result<Vec<NormalizeReport>, ChartError>> {
        let response = self.accept(ticket, response)?;
        match response {
            Ok(records) => {
                debug!(kind = self.kind.as_str(), records = records.len(), "fetched series");
                Some(Ok(charts
                    .iter_mut()
                    .map(|chart| chart.set_records(self.kind, &records))
                    .collect()))
            }
            Err(err) => {
                warn!(kind = self.kind.as_str(), error = %err, "series fetch failed");
                let message = err.to_string();
                for chart in charts.iter_mut() {
                    chart.set_error(message.clone());
                }
                Some(Err(err))
            }
        }
    }

    /// Fetch once and feed every chart in `charts`
    pub fn load(
        &mut self,
        source: &dyn SeriesSource,
        credentials: &Credentials,
        charts: &mut [TimeSeriesChart],
    ) -> Result<Vec<NormalizeReport>, ChartError> {
        let ticket = self.begin();
        for chart in charts.iter_mut() {
            chart.set_loading();
        }

        let response = credentials
            .token()
            .and_then(|token| source.fetch_series(self.kind, token));

        // A synchronous fetch cannot be overtaken
        self.complete(&ticket, response, charts)
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

/// Reads relay responses saved as `<dir>/heartrate.json` and `<dir>/sleep.json`
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    dir: PathBuf,
}

impl JsonFileSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, kind: SeriesKind) -> PathBuf {
        self.dir.join(format!("{}.json", kind.as_str()))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl SeriesSource for JsonFileSource {
    fn fetch_series(
        &self,
        kind: SeriesKind,
        _token: &str,
    ) -> Result<Vec<UpstreamRecord>, ChartError> {
        let path = self.path_for(kind);
        let body = fs::read_to_string(&path)
            .map_err(|e| ChartError::FetchFailure(format!("{}: {}", path.display(), e)))?;
        parse_envelope(&body)
    }
}
