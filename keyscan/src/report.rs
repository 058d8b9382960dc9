use colored::{ColoredString, Colorize};
use serde::Serialize;
use std::io::{self, Write};
use std::path::PathBuf;
use std::str::FromStr;

use crate::config::ScanMode;
use crate::errors::SearchError;
use crate::metrics::ScanStats;
use crate::results::{KeywordHits, SkippedFile};
use crate::search::ScanReport;

/// Marker printed for a keyword without hits
pub const NOT_FOUND: &str = "not found";

/// Output format of the report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for ReportFormat {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" => Ok(ReportFormat::Text),
            "json" => Ok(ReportFormat::Json),
            other => Err(SearchError::config_error(format!(
                "unknown report format '{}', expected text or json",
                other
            ))),
        }
    }
}

/// Paths are rendered the way the text report prints them, so a file name
/// that is not valid UTF-8 still yields a readable document
#[derive(Serialize)]
struct JsonReport<'a> {
    mode: ScanMode,
    workers: usize,
    keywords: Vec<JsonHits<'a>>,
    stats: ScanStats,
    skipped: Vec<JsonSkipped<'a>>,
    elapsed_secs: f64,
}

#[derive(Serialize)]
struct JsonHits<'a> {
    keyword: &'a str,
    files: Vec<String>,
}

#[derive(Serialize)]
struct JsonSkipped<'a> {
    path: String,
    reason: &'a str,
}

impl<'a> From<&'a KeywordHits> for JsonHits<'a> {
    fn from(hits: &'a KeywordHits) -> Self {
        Self {
            keyword: &hits.keyword,
            files: hits.files.iter().map(|f| f.display().to_string()).collect(),
        }
    }
}

impl<'a> From<&'a SkippedFile> for JsonSkipped<'a> {
    fn from(skipped: &'a SkippedFile) -> Self {
        Self {
            path: skipped.path.display().to_string(),
            reason: &skipped.reason,
        }
    }
}

/// Writes a finished scan for humans or machines
#[derive(Debug, Clone, Copy, Default)]
pub struct Reporter {
    format: ReportFormat,
    color: bool,
}

impl Reporter {
    pub fn new(format: ReportFormat, color: bool) -> Self {
        Self { format, color }
    }

    fn paint(&self, text: &str, style: fn(&str) -> ColoredString) -> String {
        if self.color {
            style(text).to_string()
        } else {
            text.to_string()
        }
    }

    pub fn write<W: Write>(&self, report: &ScanReport, out: &mut W) -> io::Result<()> {
        match self.format {
            ReportFormat::Text => self.write_text(report, out),
            ReportFormat::Json => self.write_json(report, out),
        }
    }

    /// Keywords in keyword-set order, each with its files or a "not found" line,
    /// followed by the elapsed time
    fn write_text<W: Write>(&self, report: &ScanReport, out: &mut W) -> io::Result<()> {
        writeln!(
            out,
            "\nResults of the {} scan ({} workers):",
            report.mode, report.worker_count
        )?;

        for hits in &report.result.hits {
            writeln!(
                out,
                "\nKeyword '{}' found in files:",
                self.paint(&hits.keyword, |s| s.bold())
            )?;
            if hits.files.is_empty() {
                writeln!(out, " - {}", self.paint(NOT_FOUND, |s| s.yellow()))?;
            }
            for file in &hits.files {
                writeln!(
                    out,
                    " - {}",
                    self.paint(&file.display().to_string(), |s| s.blue())
                )?;
            }
        }

        let skipped = report.result.skipped.len();
        if skipped > 0 {
            writeln!(
                out,
                "\n{}",
                self.paint(&format!("Skipped {} unreadable file(s)", skipped), |s| s.red())
            )?;
        }

        writeln!(
            out,
            "\nElapsed time: {:.6} seconds",
            report.elapsed.as_secs_f64()
        )
    }

    fn write_json<W: Write>(&self, report: &ScanReport, out: &mut W) -> io::Result<()> {
        let json = JsonReport {
            mode: report.mode,
            workers: report.worker_count.get(),
            keywords: report.result.hits.iter().map(JsonHits::from).collect(),
            stats: report.result.stats,
            skipped: report.result.skipped.iter().map(JsonSkipped::from).collect(),
            elapsed_secs: report.elapsed.as_secs_f64(),
        };
        serde_json::to_writer_pretty(&mut *out, &json)?;
        writeln!(out)
    }
}

/// All files listed in a JSON report for one keyword; used by tests and tools
/// that read the report back
pub fn files_in_json_report(json: &serde_json::Value, keyword: &str) -> Option<Vec<PathBuf>> {
    json.get("keywords")?
        .as_array()?
        .iter()
        .find(|entry| entry.get("keyword").and_then(|k| k.as_str()) == Some(keyword))?
        .get("files")?
        .as_array()?
        .iter()
        .map(|f| f.as_str().map(PathBuf::from))
        .collect()
}
