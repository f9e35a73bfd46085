//! Import step: external graph builder supervision
//!
//! The graph builder's combined output is scanned line by line. Progress is
//! guessed from a handful of log markers and never reaches 100 before the
//! process exits; a zero exit status is only trusted once the expected
//! artifacts are on disk.

use std::collections::VecDeque;
use std::path::Path;
use std::process::Stdio;
use std::sync::OnceLock;
use std::time::Instant;

use indicatif::HumanCount;
use regex::Regex;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use super::{RegionPaths, RegionProcessor, StepReporter};
use crate::constants::processor;
use crate::errors::{ImportError, ImportResult};

/// Lines buffered between the pipe readers and the supervisor
const LINE_BUFFER: usize = 256;

/// Progress derived from one output line
#[derive(Debug, Clone, PartialEq)]
pub struct ImportProgress {
    /// 0 to the cap
    pub progress: f64,
    pub description: String,
}

struct Patterns {
    count: Regex,
    edges: Regex,
    graph: Regex,
    finished: Regex,
}

fn patterns() -> Option<&'static Patterns> {
    static PATTERNS: OnceLock<Option<Patterns>> = OnceLock::new();
    PATTERNS
        .get_or_init(|| {
            Some(Patterns {
                count: Regex::new(r"(?i)processed\s+([\d,]+)\s+(ways|nodes|relations)").ok()?,
                edges: Regex::new(r"(?i)\bedges[:=\s]+([\d,]+)").ok()?,
                graph: Regex::new(r"(?i)\b(creating|building|writing)\s+graph").ok()?,
                finished: Regex::new(r"(?i)\b(finished|completed|done|success)\b").ok()?,
            })
        })
        .as_ref()
}

fn format_count(digits: &str) -> String {
    digits
        .replace(',', "")
        .parse::<u64>()
        .map(|n| HumanCount(n).to_string())
        .unwrap_or_else(|_| digits.to_string())
}

/// Heuristic mapping from graph builder log lines to step progress
///
/// Starts at 10, only moves forward, and stops at 95 until the process has
/// exited and its output has been validated.
#[derive(Debug, Clone)]
pub struct ImportProgressParser {
    progress: f64,
    cap: f64,
}

impl Default for ImportProgressParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ImportProgressParser {
    pub fn new() -> Self {
        Self {
            progress: processor::IMPORT_PROGRESS_START,
            cap: processor::IMPORT_PROGRESS_CAP,
        }
    }

    /// Current progress
    pub fn progress(&self) -> f64 {
        self.progress
    }

    /// Inspect one line; `None` if it carries no recognised marker
    pub fn parse_line(&mut self, line: &str) -> Option<ImportProgress> {
        let patterns = patterns()?;
        let lower = line.to_lowercase();

        let (increment, description) = if let Some(caps) = patterns.count.captures(line) {
            let kind = caps[2].to_lowercase();
            let increment = match kind.as_str() {
                "relations" => 3.0,
                _ => 2.0,
            };
            (increment, format!("Processed {} {}", format_count(&caps[1]), kind))
        } else if lower.contains("reading osm") {
            (5.0, "Reading OSM data".to_string())
        } else if patterns.graph.is_match(line) {
            (10.0, "Building routing graph".to_string())
        } else if let Some(caps) = patterns.edges.captures(line) {
            (5.0, format!("Created {} edges", format_count(&caps[1])))
        } else if patterns.finished.is_match(line) {
            self.progress = self.cap;
            return Some(ImportProgress {
                progress: self.progress,
                description: "Import finished, validating output".to_string(),
            });
        } else {
            return None;
        };

        self.progress = (self.progress + increment).min(self.cap);
        Some(ImportProgress {
            progress: self.progress,
            description,
        })
    }
}

/// Bounded buffer of the most recent output lines
#[derive(Debug, Clone)]
struct OutputTail {
    lines: VecDeque<String>,
    limit: usize,
}

impl OutputTail {
    fn new(limit: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(limit),
            limit,
        }
    }

    fn push(&mut self, line: String) {
        if self.limit == 0 {
            return;
        }
        if self.lines.len() == self.limit {
            self.lines.pop_front();
        }
        self.lines.push_back(line);
    }

    fn into_lines(self) -> Vec<String> {
        self.lines.into()
    }
}

enum OutputEvent {
    Line(String),
    Closed,
    Cancelled,
}

/// Forward lines from a child pipe, tolerating non-UTF-8 output
async fn forward_lines<R>(reader: R, tx: mpsc::Sender<String>)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buffer = Vec::new();
    loop {
        buffer.clear();
        match reader.read_until(b'\n', &mut buffer).await {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buffer).trim_end().to_string();
                if tx.send(line).await.is_err() {
                    break;
                }
            }
            Err(e) => {
                debug!("Stopped reading graph builder output: {}", e);
                break;
            }
        }
    }
}

async fn terminate(child: &mut Child) {
    if let Err(e) = child.kill().await {
        warn!("Failed to stop graph builder: {}", e);
    }
}

/// Expected artifacts missing from `graph_dir`
async fn missing_artifacts(graph_dir: &Path, expected: &[String]) -> Vec<String> {
    let mut missing = Vec::new();
    for name in expected {
        if tokio::fs::metadata(graph_dir.join(name)).await.is_err() {
            missing.push(name.clone());
        }
    }
    missing
}

impl RegionProcessor {
    pub(super) async fn run_import(
        &self,
        paths: &RegionPaths,
        reporter: &StepReporter<'_>,
        cancel: &CancellationToken,
    ) -> ImportResult<String> {
        let config = &self.config;

        // A previous run's graph would be loaded instead of rebuilt
        if tokio::fs::metadata(&paths.graph_dir).await.is_ok() {
            debug!("Removing stale graph directory {}", paths.graph_dir.display());
            tokio::fs::remove_dir_all(&paths.graph_dir).await?;
        }
        tokio::fs::create_dir_all(&paths.graph_dir).await?;

        let (program, args) =
            config
                .import_command
                .render(&paths.extract, &paths.graph_dir, config.memory_mb)?;
        debug!(program = %program, ?args, "Starting graph builder");

        let mut command = Command::new(&program);
        command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &config.import_working_dir {
            command.current_dir(dir);
        }

        let mut child = command.spawn().map_err(|source| ImportError::Spawn {
            program: program.clone(),
            source,
        })?;

        let (line_tx, mut line_rx) = mpsc::channel(LINE_BUFFER);
        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(forward_lines(stdout, line_tx.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(forward_lines(stderr, line_tx.clone()));
        }
        drop(line_tx);

        let mut parser = ImportProgressParser::new();
        let mut tail = OutputTail::new(config.tail_lines);
        let mut last_progress = parser.progress();
        let mut last_emit = Instant::now();
        reporter.running(last_progress, format!("Started {}", program));

        loop {
            let event = tokio::select! {
                biased;
                _ = cancel.cancelled() => OutputEvent::Cancelled,
                line = line_rx.recv() => line.map_or(OutputEvent::Closed, OutputEvent::Line),
            };

            let line = match event {
                OutputEvent::Line(line) => line,
                OutputEvent::Closed => break,
                OutputEvent::Cancelled => {
                    terminate(&mut child).await;
                    return Err(ImportError::Cancelled);
                }
            };

            trace!("graph builder: {}", line);
            if let Some(update) = parser.parse_line(&line) {
                let now = Instant::now();
                if update.progress != last_progress
                    || now.duration_since(last_emit) >= processor::PROGRESS_INTERVAL
                {
                    reporter.running(update.progress, update.description);
                    last_progress = update.progress;
                    last_emit = now;
                }
            }
            tail.push(line);
        }

        let waited = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            status = child.wait() => Some(status),
        };
        let status = match waited {
            Some(status) => status?,
            None => {
                terminate(&mut child).await;
                return Err(ImportError::Cancelled);
            }
        };

        if !status.success() {
            let code = status
                .code()
                .map(|code| format!("exit code {}", code))
                .unwrap_or_else(|| status.to_string());
            warn!(code = %code, "Graph builder failed");
            return Err(ImportError::ExitStatus {
                code,
                tail: tail.into_lines(),
            });
        }

        let missing = missing_artifacts(&paths.graph_dir, &config.expected_artifacts).await;
        if !missing.is_empty() {
            return Err(ImportError::MissingArtifacts {
                missing,
                tail: tail.into_lines(),
            });
        }

        info!(graph_dir = %paths.graph_dir.display(), "Graph builder finished");
        Ok(format!(
            "Graph built, {} artifact(s) verified",
            config.expected_artifacts.len()
        ))
    }
}
