//! Collects JSON log records from a device console stream into a JSON array.
//!
//! The console prints free text before the first record and may print
//! garbage after the last complete one (for example when the serial bridge
//! is killed). Every input line is echoed; from the first line starting with
//! `{` lines are copied into the file, and at end of input the file is cut
//! back to the last line that closed a record with `},` and terminated with
//! an `end` marker record.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Marker record closing the array.
pub const LOG_FOOTER: &str = "\t{\n\t\t\"type\": \"end\"\n\t}\n]";

const LOG_HEADER: &str = "[\n";

#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("cannot create log file {}: {source}", path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("log i/o error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogStats {
    /// Lines read from the input.
    pub lines: u64,
    /// Lines kept in the file after trimming.
    pub kept: u64,
}

/// Copy `input` to `echo` and collect its JSON section into a new file at
/// `path`. An existing file is never overwritten.
pub fn collect_logs<R: BufRead, E: Write>(
    input: R,
    echo: E,
    path: &Path,
) -> Result<LogStats, LogError> {
    let file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|source| LogError::Create {
            path: path.to_path_buf(),
            source,
        })?;
    let stats = collect_into(input, echo, file)?;
    tracing::info!(path = %path.display(), lines = stats.lines, kept = stats.kept, "log collected");
    Ok(stats)
}

fn collect_into<R: BufRead, E: Write>(
    mut input: R,
    mut echo: E,
    file: File,
) -> Result<LogStats, LogError> {
    let mut out = BufWriter::new(file);
    let mut stats = LogStats::default();
    let mut started = false;
    let mut written: u64 = 0;
    let mut end_of_json: u64 = 0;
    let mut lines_at_end: u64 = 0;
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if input.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        let line = decode_line(&buf);
        stats.lines += 1;
        echo.write_all(line.as_bytes())?;

        if !started && line.starts_with('{') {
            out.write_all(LOG_HEADER.as_bytes())?;
            written += LOG_HEADER.len() as u64;
            // An empty array still gets its opening bracket.
            end_of_json = written;
            started = true;
        }

        if started {
            out.write_all(b"\t")?;
            out.write_all(line.as_bytes())?;
            written += 1 + line.len() as u64;
            stats.kept += 1;
            if line.contains("},") {
                end_of_json = written;
                lines_at_end = stats.kept;
            }
        }
    }
    echo.flush()?;

    let mut file = out.into_inner().map_err(|e| e.into_error())?;
    if !started {
        file.write_all(LOG_HEADER.as_bytes())?;
        end_of_json = LOG_HEADER.len() as u64;
    }
    file.set_len(end_of_json)?;
    file.seek(SeekFrom::Start(end_of_json))?;
    file.write_all(LOG_FOOTER.as_bytes())?;
    file.flush()?;

    stats.kept = lines_at_end;
    Ok(stats)
}

/// Decode a console line, dropping bytes that are not valid UTF-8.
fn decode_line(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).replace('\u{FFFD}', "")
}
