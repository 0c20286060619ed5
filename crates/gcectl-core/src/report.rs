//! Creation timing report

use serde::{Serialize, Serializer};
use std::fmt;
use std::path::Path;
use std::time::Duration;

use crate::error::Result;

/// One created resource and how long its creation took
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimingRow {
    pub name: String,
    #[serde(rename = "seconds", serialize_with = "serialize_secs")]
    pub duration: Duration,
}

/// Timing rows in creation order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TimingReport {
    rows: Vec<TimingRow>,
}

fn serialize_secs<S: Serializer>(duration: &Duration, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_f64(round2(duration.as_secs_f64()))
}

fn round2(secs: f64) -> f64 {
    (secs * 100.0).round() / 100.0
}

impl TimingReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, duration: Duration) {
        self.rows.push(TimingRow {
            name: name.into(),
            duration,
        });
    }

    pub fn rows(&self) -> &[TimingRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn total(&self) -> Duration {
        self.rows.iter().map(|r| r.duration).sum()
    }

    /// Markdown table with one row per resource, seconds to two decimals
    pub fn render_markdown(&self) -> String {
        let mut out = String::from("# Creation Timing Results\n\n");
        out.push_str("| Instance Name | Time (seconds) |\n");
        out.push_str("| --- | --- |\n");
        for row in &self.rows {
            out.push_str(&format!(
                "| {} | {:.2} |\n",
                row.name,
                row.duration.as_secs_f64()
            ));
        }
        out
    }

    /// Rows of a table produced by [`render_markdown`](Self::render_markdown)
    ///
    /// Lines that are not `| name | seconds |` rows are ignored.
    pub fn parse_markdown(markdown: &str) -> Self {
        markdown
            .lines()
            .filter_map(|line| {
                let line = line.trim();
                let cells: Vec<&str> = line
                    .strip_prefix('|')?
                    .strip_suffix('|')?
                    .split('|')
                    .map(str::trim)
                    .collect();
                let [name, secs] = cells.as_slice() else {
                    return None;
                };
                let secs: f64 = secs.parse().ok()?;
                let duration = Duration::try_from_secs_f64(secs).ok()?;
                Some((name.to_string(), duration))
            })
            .collect()
    }

    /// Take every row of `newer`, replacing rows with the same name
    pub fn merge(&mut self, newer: &TimingReport) {
        for row in &newer.rows {
            match self.rows.iter_mut().find(|r| r.name == row.name) {
                Some(existing) => existing.duration = row.duration,
                None => self.rows.push(row.clone()),
            }
        }
    }

    /// Stable sort of the rows
    pub fn sort_by_key<K: Ord>(&mut self, f: impl FnMut(&TimingRow) -> K) {
        self.rows.sort_by_key(f);
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.render_markdown())?;
        Ok(())
    }
}

impl fmt::Display for TimingReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render_markdown())
    }
}

impl FromIterator<(String, Duration)> for TimingReport {
    fn from_iter<I: IntoIterator<Item = (String, Duration)>>(iter: I) -> Self {
        let mut report = TimingReport::new();
        for (name, duration) in iter {
            report.push(name, duration);
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_three_clone_report() {
        let report: TimingReport = [
            ("clone-1-web".to_string(), Duration::from_secs(40)),
            ("clone-2-web".to_string(), Duration::from_secs(42)),
            ("clone-3-web".to_string(), Duration::from_secs(39)),
        ]
        .into_iter()
        .collect();

        assert_eq!(
            report.render_markdown(),
            "# Creation Timing Results\n\n\
             | Instance Name | Time (seconds) |\n\
             | --- | --- |\n\
             | clone-1-web | 40.00 |\n\
             | clone-2-web | 42.00 |\n\
             | clone-3-web | 39.00 |\n"
        );
        assert_eq!(report.total(), Duration::from_secs(121));
    }

    #[test]
    fn test_fractional_seconds_rounded() {
        let mut report = TimingReport::new();
        report.push("vm", Duration::from_millis(41_237));
        assert!(report.render_markdown().contains("| vm | 41.24 |"));

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["rows"][0]["seconds"], 41.24);
        assert_eq!(json["rows"][0]["name"], "vm");
    }

    #[test]
    fn test_empty_report_has_header() {
        let report = TimingReport::new();
        assert!(report.is_empty());
        assert!(report.render_markdown().contains("| Instance Name | Time (seconds) |"));
    }

    #[test]
    fn test_parse_rendered_table() {
        let mut report = TimingReport::new();
        report.push("clone-1-web", Duration::from_millis(40_250));
        report.push("clone-2-web", Duration::from_secs(42));

        let parsed = TimingReport::parse_markdown(&report.render_markdown());
        assert_eq!(parsed, report);
    }

    #[test]
    fn test_parse_skips_foreign_lines() {
        let parsed = TimingReport::parse_markdown(
            "# Creation Timing Results\n\nnotes\n| a | b | c |\n| vm | -1 |\n| vm | 2.5 |\n",
        );
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed.rows()[0].duration, Duration::from_millis(2_500));
    }

    #[test]
    fn test_merge_replaces_by_name() {
        let mut report = TimingReport::new();
        report.push("clone-1", Duration::from_secs(10));
        report.push("clone-2", Duration::from_secs(20));

        let mut newer = TimingReport::new();
        newer.push("clone-2", Duration::from_secs(25));
        newer.push("clone-3", Duration::from_secs(30));
        report.merge(&newer);

        let rows: Vec<_> = report
            .rows()
            .iter()
            .map(|r| (r.name.as_str(), r.duration.as_secs()))
            .collect();
        assert_eq!(rows, vec![("clone-1", 10), ("clone-2", 25), ("clone-3", 30)]);
    }

    #[test]
    fn test_write_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("TIMING.md");
        let mut report = TimingReport::new();
        report.push("clone-1", Duration::from_secs(1));
        report.write_to(&path).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.ends_with("| clone-1 | 1.00 |\n"));
    }
}
