use rustc_hash::FxHashMap;
use std::fmt;

use crate::error::ParseError;

/// The VCF missing-value token.
pub const MISSING: &str = ".";
pub const PASS: &str = "PASS";

const INFO_SEP: char = ';';
const FORMAT_SEP: char = ':';

/// The FILTER column. `Unknown` (the `.` token) is distinct from an explicit PASS
/// and from a list of failure codes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterStatus {
    Pass,
    Unknown,
    /// Failure codes, kept verbatim (semicolon-joined).
    Failed(String),
}

impl FilterStatus {
    fn parse(s: &str) -> Self {
        match s {
            PASS => FilterStatus::Pass,
            MISSING | "" => FilterStatus::Unknown,
            other => FilterStatus::Failed(other.to_string()),
        }
    }

    pub fn is_pass(&self) -> bool {
        matches!(self, FilterStatus::Pass)
    }
}

impl fmt::Display for FilterStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterStatus::Pass => f.write_str(PASS),
            FilterStatus::Unknown => f.write_str(MISSING),
            FilterStatus::Failed(codes) => f.write_str(codes),
        }
    }
}

/// INFO key-value pairs. A key is either present with a value or absent; flags
/// are present with the value "true" and `KEY=.` is treated as absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Info(FxHashMap<String, String>);

impl Info {
    pub fn parse(s: &str) -> Self {
        let mut info = Info::default();
        info.extend_raw(s);
        info
    }

    /// Add the entries of a raw INFO string. Later keys replace earlier ones.
    fn extend_raw(&mut self, s: &str) {
        if s == MISSING {
            return;
        }
        for field in s.split(INFO_SEP).filter(|f| !f.is_empty()) {
            match field.split_once('=') {
                Some((key, MISSING)) => {
                    self.0.remove(key);
                }
                Some((key, value)) => {
                    self.0.insert(key.to_string(), value.to_string());
                }
                None => {
                    self.0.insert(field.to_string(), "true".to_string());
                }
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(|v| v.as_str())
    }

    /// First comma-separated value of `key` as a float. Unparsable values are absent.
    pub fn float(&self, key: &str) -> Option<f64> {
        let value = self.get(key)?.split(',').next()?;
        match value.parse::<f64>() {
            Ok(v) => Some(v),
            Err(_) => {
                log::debug!("INFO {}={} is not a number", key, value);
                None
            }
        }
    }
}

/// One single-sample variant line.
#[derive(Debug, Clone, PartialEq)]
pub struct VariantRecord {
    pub chrom: String,
    pub pos: u64,
    pub id: Option<String>,
    pub ref_allele: String,
    pub alt_alleles: Vec<String>,
    pub qual: Option<f64>,
    pub filter: FilterStatus,
    pub info: Info,
    pub format: Vec<String>,
    /// Keyed by the names in `format`; values missing from the sample column are `None`.
    pub sample_values: FxHashMap<String, Option<String>>,
}

impl VariantRecord {
    /// Parse a data line. Columns may be separated by any run of whitespace.
    /// Header lines must be skipped by the caller.
    pub fn parse(line: &str) -> Result<Self, ParseError> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 8 {
            return Err(ParseError::TooFewColumns {
                found: fields.len(),
            });
        }

        let pos = match fields[1].parse::<u64>() {
            Ok(p) if p > 0 => p,
            _ => return Err(ParseError::InvalidPosition(fields[1].to_string())),
        };

        let qual = match fields[5] {
            MISSING => None,
            q => Some(
                q.parse::<f64>()
                    .map_err(|_| ParseError::InvalidQuality(q.to_string()))?,
            ),
        };

        let id = match fields[2] {
            MISSING => None,
            id => Some(id.to_string()),
        };

        let alt_alleles = if fields[4] == MISSING {
            Vec::new()
        } else {
            fields[4].split(',').map(|a| a.to_string()).collect()
        };

        let mut info = Info::parse(fields[7]);
        let (format, sample_values) = match format_column(&fields) {
            Some(i) => {
                // hand-edited files sometimes split INFO on a space.
                for stray in &fields[8..i] {
                    log::debug!("{}:{} folding stray column '{}' into INFO", fields[0], pos, stray);
                    info.extend_raw(stray);
                }
                parse_sample(fields[i], fields[i + 1])
            }
            None => (Vec::new(), FxHashMap::default()),
        };

        Ok(VariantRecord {
            chrom: fields[0].to_string(),
            pos,
            id,
            ref_allele: fields[3].to_string(),
            alt_alleles,
            qual,
            filter: FilterStatus::parse(fields[6]),
            info,
            format,
            sample_values,
        })
    }

    /// The allele that is triaged. Only the first alternate is considered.
    pub fn first_alt(&self) -> &str {
        self.alt_alleles.first().map_or(MISSING, |a| a.as_str())
    }

    /// Value of a FORMAT field for the sample, `None` if absent or missing.
    pub fn sample(&self, key: &str) -> Option<&str> {
        self.sample_values.get(key).and_then(|v| v.as_deref())
    }
}

fn is_format_keys(col: &str) -> bool {
    col.split(FORMAT_SEP).all(|key| {
        let mut chars = key.chars();
        chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
    })
}

/// Index of the FORMAT column, if there is a sample column after it. With
/// exactly 10 columns this is the 9th. With more, it is the rightmost column
/// that looks like a list of FORMAT keys and is followed by another column, so
/// stray INFO tokens are skipped while extra sample columns are ignored.
fn format_column(fields: &[&str]) -> Option<usize> {
    match fields.len() {
        0..=9 => None,
        10 => Some(8),
        n => (8..n - 1)
            .rev()
            .find(|&i| is_format_keys(fields[i]))
            .or(Some(8)),
    }
}

fn parse_sample(fmt: &str, sample: &str) -> (Vec<String>, FxHashMap<String, Option<String>>) {
    let format: Vec<String> = fmt.split(FORMAT_SEP).map(|k| k.to_string()).collect();
    let mut values = sample.split(FORMAT_SEP);
    let mut sample_values = FxHashMap::default();
    for key in &format {
        let value = match values.next() {
            Some(MISSING) | Some("") | None => None,
            Some(v) => Some(v.to_string()),
        };
        sample_values.insert(key.clone(), value);
    }
    (format, sample_values)
}
