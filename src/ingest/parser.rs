// src/ingest/parser.rs

//! Positional parsers for the pipeline's result tables.
//!
//! Every table has a header row followed by rows with a fixed column order.
//! A row with the wrong number of columns makes the whole file unusable;
//! a bad cell inside an otherwise well-formed row is defaulted with a
//! warning and parsing carries on.

use std::io::{BufRead, BufReader};
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::{debug, warn};

use crate::errors::{EpitrackError, Result};
use crate::fs::FileSystem;
use crate::model::{
    AntigenicityScores, BlastHitRecord, EpitopeRecord, Method, Ordinal, TopologyRecord,
};

pub const EPITOPE_COLUMNS: usize = 20;
pub const TOPOLOGY_COLUMNS: usize = 7;
pub const BLAST_COLUMNS: usize = 6;

/// Where a cell came from, for warnings.
#[derive(Debug, Clone, Copy)]
struct Cell<'a> {
    path: &'a Path,
    line: u64,
    column: &'static str,
}

/// Parse `epitope-detail.tsv`.
///
/// Rows whose `N` cell is not a number are skipped.
pub fn parse_epitopes(fs: &dyn FileSystem, path: &Path) -> Result<Vec<EpitopeRecord>> {
    let mut out = Vec::new();

    for_each_row(fs, path, EPITOPE_COLUMNS, |line, row| {
        let cell = |column| Cell { path, line, column };

        let Some(ordinal) = parse_ordinal(&row[0]) else {
            warn!(path = ?path, line, value = &row[0], "epitope row without a usable N; skipping");
            return;
        };

        out.push(EpitopeRecord {
            ordinal,
            epitope_id: row[1].to_string(),
            sequence: row[2].to_string(),
            start: lenient_u32(&row[3], cell("start")),
            end: lenient_u32(&row[4], cell("end")),
            n_glyc: row[5].to_string(),
            n_glyc_count: lenient_u32(&row[6], cell("n_glyc_count")),
            length: lenient_u32(&row[8], cell("length")),
            molecular_weight: lenient_f64(&row[9], cell("molecular_weight")),
            isoelectric_point: lenient_f64(&row[10], cell("isoelectric_point")),
            hydropathy: lenient_f64(&row[11], cell("hydropathy")),
            scores: AntigenicityScores {
                bepipred3: lenient_f64(&row[14], cell("bepipred3")),
                emini: lenient_f64(&row[15], cell("emini")),
                kolaskar: lenient_f64(&row[16], cell("kolaskar")),
                chou_fasman: lenient_f64(&row[17], cell("chou_fasman")),
                karplus_schulz: lenient_f64(&row[18], cell("karplus_schulz")),
                parker: lenient_f64(&row[19], cell("parker")),
            },
            topologies: Vec::new(),
            blast_hits: Vec::new(),
        });
    })?;

    debug!(path = ?path, records = out.len(), "parsed epitope table");
    Ok(out)
}

/// Parse `topology.tsv`.
///
/// A blank `N` means "same epitope as the row above". A non-blank but
/// unreadable `N` drops the row and every continuation row after it, since
/// there is no epitope to carry forward.
pub fn parse_topologies(fs: &dyn FileSystem, path: &Path) -> Result<Vec<TopologyRecord>> {
    let mut out = Vec::new();
    let mut current: Option<Ordinal> = None;

    for_each_row(fs, path, TOPOLOGY_COLUMNS, |line, row| {
        let cell = |column| Cell { path, line, column };

        let raw_n = &row[0];
        if !raw_n.is_empty() {
            current = parse_ordinal(raw_n);
            if current.is_none() {
                warn!(path = ?path, line, value = raw_n, "topology row with unreadable N; skipping");
                return;
            }
        }
        let Some(ordinal) = current else {
            warn!(path = ?path, line, "topology continuation row before any N; skipping");
            return;
        };

        out.push(TopologyRecord {
            ordinal,
            method: Method::normalize(&row[2]),
            threshold: lenient_f64(&row[3], cell("threshold")),
            avg_score: lenient_f64(&row[4], cell("avg_score")),
            cover: lenient_f64(&row[5], cell("cover")),
            topology: row[6].to_string(),
        });
    })?;

    debug!(path = ?path, records = out.len(), "parsed topology table");
    Ok(out)
}

/// Parse one `blast-<alias>.csv` table. `database` is stamped on every hit.
///
/// The query accession has the form `<N>-<suffix>`.
pub fn parse_blast_hits(
    fs: &dyn FileSystem,
    path: &Path,
    database: &str,
) -> Result<Vec<BlastHitRecord>> {
    let mut out = Vec::new();

    for_each_row(fs, path, BLAST_COLUMNS, |line, row| {
        let cell = |column| Cell { path, line, column };

        let query = &row[0];
        let head = query.split('-').next().unwrap_or_default();
        let Some(ordinal) = parse_ordinal(head) else {
            warn!(path = ?path, line, value = query, "BLAST row with unreadable query accession; skipping");
            return;
        };

        out.push(BlastHitRecord {
            ordinal,
            subject_accession: row[1].to_string(),
            percent_identity: lenient_f64(&row[2], cell("percent_identity")),
            query_coverage: lenient_f64(&row[3], cell("query_coverage")),
            query_sequence: row[4].to_string(),
            subject_sequence: row[5].to_string(),
            database: database.to_string(),
        });
    })?;

    debug!(path = ?path, database, records = out.len(), "parsed BLAST table");
    Ok(out)
}

/// Number of non-blank lines after the header of `protein-summary.tsv`.
pub fn count_proteins(fs: &dyn FileSystem, path: &Path) -> Result<usize> {
    let reader = BufReader::new(fs.open_read(path)?);
    let mut count = 0;
    for line in reader.lines().skip(1) {
        let line = line.map_err(|e| malformed(path, format!("unreadable line: {e}")))?;
        if !line.trim().is_empty() {
            count += 1;
        }
    }
    Ok(count)
}

/// Stream every data row of a delimited table into `on_row`.
///
/// The delimiter is taken from the header: tab if it contains one,
/// otherwise comma if it contains one, otherwise tab.
fn for_each_row<F>(fs: &dyn FileSystem, path: &Path, columns: usize, mut on_row: F) -> Result<()>
where
    F: FnMut(u64, &StringRecord),
{
    let mut reader = BufReader::new(fs.open_read(path)?);
    let mut header = String::new();
    reader
        .read_line(&mut header)
        .map_err(|e| malformed(path, format!("unreadable header: {e}")))?;

    let delimiter = sniff_delimiter(&header);
    let mut rows = ReaderBuilder::new()
        .has_headers(false)
        .delimiter(delimiter)
        .flexible(true)
        .quoting(false)
        .trim(Trim::All)
        .from_reader(reader);

    let mut record = StringRecord::new();
    loop {
        let more = rows
            .read_record(&mut record)
            .map_err(|e| malformed(path, e.to_string()))?;
        if !more {
            break;
        }
        // The header was consumed before the csv reader saw the stream.
        let line = record.position().map(|p| p.line() + 1).unwrap_or_default();

        if record.len() == 1 && record[0].is_empty() {
            continue;
        }
        if record.len() != columns {
            return Err(malformed(
                path,
                format!("line {line}: expected {columns} columns, found {}", record.len()),
            ));
        }
        on_row(line, &record);
    }
    Ok(())
}

fn sniff_delimiter(header: &str) -> u8 {
    if header.contains('\t') {
        b'\t'
    } else if header.contains(',') {
        b','
    } else {
        b'\t'
    }
}

fn malformed(path: &Path, message: String) -> EpitrackError {
    EpitrackError::MalformedFile {
        path: path.to_path_buf(),
        message,
    }
}

/// The `N` join key. `None` for blank, placeholder or non-numeric cells.
pub fn parse_ordinal(raw: &str) -> Option<Ordinal> {
    raw.trim().parse().ok()
}

/// Numeric cell with defaulting: characters outside `[0-9.-]` are dropped
/// first, and blank or `-` cells are 0 without a warning.
fn lenient_f64(raw: &str, cell: Cell<'_>) -> f64 {
    match parse_number(raw) {
        Ok(v) => v,
        Err(()) => {
            warn!(
                path = ?cell.path,
                line = cell.line,
                column = cell.column,
                value = raw,
                "unparsable numeric value; using 0"
            );
            0.0
        }
    }
}

/// Integer cell: defaulted like [`lenient_f64`]. A fractional value is
/// truncated with a warning.
fn lenient_u32(raw: &str, cell: Cell<'_>) -> u32 {
    let v = lenient_f64(raw, cell);
    if let Some(n) = whole_u32(v) {
        n
    } else if v.is_finite() && v >= 0.0 && v <= u32::MAX as f64 {
        warn!(
            path = ?cell.path,
            line = cell.line,
            column = cell.column,
            value = raw,
            "non-integral value in integer column; truncating"
        );
        v.trunc() as u32
    } else {
        warn!(
            path = ?cell.path,
            line = cell.line,
            column = cell.column,
            value = raw,
            "value out of range; using 0"
        );
        0
    }
}

/// `v` as a `u32` when it is a whole number in range.
fn whole_u32(v: f64) -> Option<u32> {
    (v.fract() == 0.0 && v >= 0.0 && v <= u32::MAX as f64).then_some(v as u32)
}

/// `Err` only for content that is neither blank, a placeholder, nor a
/// number once stripped.
pub fn parse_number(raw: &str) -> std::result::Result<f64, ()> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | '-'))
        .collect();
    if cleaned.is_empty() || cleaned == "-" {
        return if raw.trim().is_empty() || raw.trim() == "-" {
            Ok(0.0)
        } else {
            Err(())
        };
    }
    cleaned.parse::<f64>().map_err(|_| ())
}
