//! CSV pole loader.
//!
//! # CSV format
//!
//! One row per pole.  Only three columns are required; everything else is
//! carried through untouched.
//!
//! ```csv
//! BLOCK,NUMBER,POLE_LOC,STREET
//! 12,3,"40.7128, -74.0060",MAIN ST
//! 12,4, "40.7131, -74.0058",MAIN ST
//! ```
//!
//! Whitespace directly after a delimiter is skipped before parsing, so a
//! quoted field may be preceded by spaces.  Some exports write the block
//! header as `"BLOCK "`; it is renamed to `BLOCK`.
//!
//! # Failure policy
//!
//! | Situation                         | Outcome                             |
//! |-----------------------------------|-------------------------------------|
//! | input directory absent            | `IngestError::MissingDirectory`     |
//! | one file missing or unreadable    | logged with `warn!`, skipped        |
//! | every file missing or unreadable  | `IngestError::NoFilesLoaded`        |

use std::io::Read;
use std::path::Path;

use log::{info, warn};

use crate::pole::{BLOCK, NUMBER, POLE_LOC, RawRecord};
use crate::{IngestError, IngestResult};

/// Header variant written by some exports, renamed to [`BLOCK`].
const BLOCK_TRAILING_SPACE: &str = "BLOCK ";

// ── Public API ────────────────────────────────────────────────────────────────

/// `"{stem}1.csv"` … `"{stem}{count}.csv"`.
pub fn expected_files(stem: &str, count: u32) -> Vec<String> {
    (1..=count).map(|i| format!("{stem}{i}.csv")).collect()
}

/// Rows from every file that loaded, in file-list order.
#[derive(Debug, Default)]
pub struct LoadedRecords {
    pub records:       Vec<RawRecord>,
    pub files_loaded:  Vec<String>,
    pub files_skipped: Vec<String>,
}

/// Load and concatenate `file_names` from `dir`.
///
/// Rows keep file-list order, then per-file order.
pub fn load_directory(dir: &Path, file_names: &[String]) -> IngestResult<LoadedRecords> {
    if !dir.is_dir() {
        return Err(IngestError::MissingDirectory(dir.to_path_buf()));
    }
    info!("checking for {} pole files in {}", file_names.len(), dir.display());

    let mut loaded = LoadedRecords::default();
    for name in file_names {
        let path = dir.join(name);
        match std::fs::File::open(&path).map_err(IngestError::Io).and_then(|f| load_reader(f, name)) {
            Ok(rows) => {
                info!("{name}: {} rows", rows.len());
                loaded.records.extend(rows);
                loaded.files_loaded.push(name.clone());
            }
            Err(IngestError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("file not found: {}", path.display());
                loaded.files_skipped.push(name.clone());
            }
            Err(e) => {
                warn!("could not read {name}: {e}");
                loaded.files_skipped.push(name.clone());
            }
        }
    }

    if loaded.files_loaded.is_empty() {
        return Err(IngestError::NoFilesLoaded {
            dir:       dir.to_path_buf(),
            attempted: file_names.len(),
        });
    }
    info!(
        "loaded {} rows from {} of {} files",
        loaded.records.len(),
        loaded.files_loaded.len(),
        file_names.len()
    );
    Ok(loaded)
}

/// Parse one pole CSV from any `Read` source.
///
/// `source` is recorded on every row and used in error messages.
pub fn load_reader<R: Read>(mut reader: R, source: &str) -> IngestResult<Vec<RawRecord>> {
    let mut raw = String::new();
    reader.read_to_string(&mut raw)?;
    let text = skip_initial_space(&raw);

    let mut csv_reader = csv::Reader::from_reader(text.as_bytes());
    let headers: Vec<String> = csv_reader
        .headers()?
        .iter()
        .map(canonical_header)
        .collect();

    let column = |name: &'static str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| IngestError::MissingColumn { file: source.to_owned(), column: name })
    };
    let (block_col, number_col, loc_col) = (column(BLOCK)?, column(NUMBER)?, column(POLE_LOC)?);

    let mut rows = Vec::new();
    for result in csv_reader.records() {
        let record = result?;
        let field = |i: usize| record.get(i).unwrap_or_default().to_owned();

        let extra = headers
            .iter()
            .enumerate()
            .filter(|(i, _)| ![block_col, number_col, loc_col].contains(i))
            .map(|(i, h)| (h.clone(), field(i)))
            .collect();

        rows.push(RawRecord {
            source_file: source.to_owned(),
            block:       field(block_col).trim_end().to_owned(),
            number:      field(number_col).trim_end().to_owned(),
            pole_loc:    field(loc_col),
            extra,
        });
    }
    Ok(rows)
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn canonical_header(h: &str) -> String {
    if h == BLOCK_TRAILING_SPACE { BLOCK.to_owned() } else { h.to_owned() }
}

/// Drop spaces and tabs that directly follow a delimiter or start a line,
/// outside quoted fields.
///
/// A field is quoted only if it opens with `"`; a quote in the middle of an
/// unquoted field is plain text.
pub(crate) fn skip_initial_space(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_quotes = false;
    let mut quoted_field = false;
    let mut at_field_start = true;

    for c in input.chars() {
        if !in_quotes && at_field_start && (c == ' ' || c == '\t') {
            continue;
        }
        let field_start = at_field_start;
        at_field_start = false;
        match c {
            '"' if field_start => {
                in_quotes = true;
                quoted_field = true;
            }
            // Closing quote, or the second half of a `""` escape.
            '"' if quoted_field => in_quotes = !in_quotes,
            ',' | '\n' | '\r' if !in_quotes => {
                at_field_start = true;
                quoted_field = false;
            }
            _ => {}
        }
        out.push(c);
    }
    out
}
