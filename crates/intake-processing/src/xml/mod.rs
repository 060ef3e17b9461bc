//! Sandboxed XML parsing
//!
//! A parse runs on its own blocking worker with only owned inputs and a
//! budget: a wall-clock deadline plus ceilings on entity nesting depth and
//! expanded output size. The worker polls the deadline and a cancellation flag
//! inside the expansion loop, and the caller additionally bounds the wait with
//! `tokio::time::timeout`, so a hostile document cannot hold the request
//! beyond the budget plus a small scheduling margin.

mod detect;
mod entities;
mod serialize;

pub use detect::DisclosureDetector;

use anyhow::Context;
use entities::{Abort, Budget, ENTITY_DECLARATION_PATTERN};
use regex::Regex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Extra wait granted to the worker before the caller gives up on it
const SCHEDULING_MARGIN: Duration = Duration::from_millis(250);

/// Longest budget a parser accepts; larger timeouts are clamped to it
pub const MAX_PARSE_TIMEOUT: Duration = Duration::from_secs(600);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum XmlParseError {
    #[error("XML parse exceeded its {budget_ms} ms budget")]
    Timeout { budget_ms: u64 },

    #[error("{0}")]
    Parse(String),
}

#[derive(Debug, Clone)]
pub struct XmlParseOptions {
    pub timeout: Duration,
    pub max_entity_depth: usize,
    pub max_expanded_bytes: usize,
}

impl Default for XmlParseOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(2000),
            max_entity_depth: 64,
            max_expanded_bytes: 16 * 1024 * 1024,
        }
    }
}

/// Serialized form of a successfully parsed document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedDocument {
    serialized: String,
}

impl ParsedDocument {
    pub fn as_str(&self) -> &str {
        &self.serialized
    }

    pub fn into_string(self) -> String {
        self.serialized
    }
}

#[derive(Debug, Clone)]
pub struct SandboxedXmlParser {
    options: XmlParseOptions,
    declarations: Regex,
}

impl SandboxedXmlParser {
    pub fn new(mut options: XmlParseOptions) -> anyhow::Result<Self> {
        options.timeout = options.timeout.min(MAX_PARSE_TIMEOUT);
        let declarations = Regex::new(ENTITY_DECLARATION_PATTERN)
            .context("Failed to compile entity declaration regex")?;
        Ok(Self {
            options,
            declarations,
        })
    }

    pub fn options(&self) -> &XmlParseOptions {
        &self.options
    }

    fn budget_ms(&self) -> u64 {
        self.options.timeout.as_millis() as u64
    }

    /// Parse `text` on a blocking worker within the configured budget.
    pub async fn parse(&self, text: String) -> Result<ParsedDocument, XmlParseError> {
        let cancel = Arc::new(AtomicBool::new(false));
        let parser = self.clone();
        let worker_cancel = cancel.clone();
        let started = Instant::now();

        let worker = tokio::task::spawn_blocking(move || {
            parser.parse_with_cancel(&text, started, worker_cancel)
        });

        let wait = self.options.timeout.saturating_add(SCHEDULING_MARGIN);
        match tokio::time::timeout(wait, worker).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => Err(XmlParseError::Parse(format!("XML parser failed: {}", e))),
            Err(_) => {
                cancel.store(true, Ordering::Relaxed);
                tracing::warn!(
                    budget_ms = self.budget_ms(),
                    "XML parse worker did not finish in time"
                );
                Err(XmlParseError::Timeout {
                    budget_ms: self.budget_ms(),
                })
            }
        }
    }

    /// Parse on the current thread. The deadline starts now.
    pub fn parse_blocking(&self, text: &str) -> Result<ParsedDocument, XmlParseError> {
        self.parse_with_cancel(text, Instant::now(), Arc::new(AtomicBool::new(false)))
    }

    fn parse_with_cancel(
        &self,
        text: &str,
        started: Instant,
        cancel: Arc<AtomicBool>,
    ) -> Result<ParsedDocument, XmlParseError> {
        let mut budget = Budget::new(
            started + self.options.timeout,
            cancel,
            self.options.max_entity_depth,
            self.options.max_expanded_bytes,
        );

        match serialize::render(text, &self.declarations, &mut budget) {
            Ok(serialized) => Ok(ParsedDocument { serialized }),
            Err(Abort::Exhausted(limit)) => {
                tracing::warn!(
                    limit = limit,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "XML parse budget exhausted"
                );
                Err(XmlParseError::Timeout {
                    budget_ms: self.budget_ms(),
                })
            }
            Err(Abort::Malformed(message)) => Err(XmlParseError::Parse(message)),
        }
    }
}
