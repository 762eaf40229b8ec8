//! Report lines and summaries for the CLI.
//!
//! Per-fragment lines come from the `Display` impls of the report types; the
//! functions here add the run summaries and the optional JSON export.

use crate::fragment::{DetectReport, FragmentMatch, FragmentMove, RepairReport};
use crate::replay::ReplayStats;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

pub fn print_match(m: &FragmentMatch) {
    println!("{}", m);
}

pub fn print_move(m: &FragmentMove) {
    println!("{}", m);
}

pub fn detect_summary(report: &DetectReport) -> String {
    format!(
        "Done. Processed {} packets. Found {} fragmented packets, with {} being broken up.",
        report.total, report.fragments, report.broken
    )
}

pub fn repair_summary(report: &RepairReport, out: &Path) -> String {
    format!(
        "Done. Processed {} packets. Found {} fragmented packets, reordered {}. Writing to {}.",
        report.total,
        report.fragments,
        report.reordered,
        out.display()
    )
}

pub fn replay_summary(stats: &ReplayStats) -> String {
    format!(
        "Done. Sent {} application layer packets. Ignored {} packets from trace without payload",
        stats.sent, stats.ignored
    )
}

/// Write a report as pretty-printed JSON.
pub fn write_report_json<T: Serialize>(
    path: &Path,
    report: &T,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, report)?;
    writer.flush()?;
    Ok(())
}
