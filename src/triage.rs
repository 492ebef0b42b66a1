use log::{debug, info, warn};
use std::io::{BufRead, Write};

use crate::allowlist::GeneAllowlist;
use crate::annotation::{Annotation, Annotator};
use crate::error::Result;
use crate::filter::{FilterEngine, FilterOutcome, FilterReason, SiteMetrics};
use crate::summary::{Summary, SummaryStats};
use crate::variant::VariantRecord;

/// Output columns, in order.
pub const COLUMNS: [&str; 13] = [
    "chrom",
    "pos",
    "ref",
    "alt",
    "gene",
    "consequence",
    "hgvs_c",
    "hgvs_p",
    "af",
    "gt",
    "dp",
    "ab",
    "filters",
];

/// One kept variant, ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct TriageRow {
    pub chrom: String,
    pub pos: u64,
    pub ref_allele: String,
    pub alt: String,
    pub annotation: Annotation,
    pub metrics: SiteMetrics,
    pub filters: String,
}

fn render<T: ToString>(v: Option<T>) -> String {
    v.map_or_else(String::new, |v| v.to_string())
}

impl TriageRow {
    /// The row as strings in `COLUMNS` order. Absent values are empty.
    pub fn fields(&self) -> [String; 13] {
        let ab = self.metrics.allele_balance.map(|ab| (ab * 1000.0).round() / 1000.0);
        [
            self.chrom.clone(),
            self.pos.to_string(),
            self.ref_allele.clone(),
            self.alt.clone(),
            self.annotation.gene.clone(),
            self.annotation.consequence.clone(),
            self.annotation.hgvs_c.clone(),
            self.annotation.hgvs_p.clone(),
            render(self.metrics.allele_frequency),
            render(self.metrics.genotype.as_deref()),
            render(self.metrics.depth),
            render(ab),
            self.filters.clone(),
        ]
    }
}

/// Drives parse, annotate, filter, allowlist and aggregation over a stream of
/// lines, one line at a time.
pub struct Triage {
    engine: FilterEngine,
    annotator: Annotator,
    allowlist: GeneAllowlist,
    stats: SummaryStats,
    line_number: usize,
}

impl Triage {
    pub fn new(engine: FilterEngine, annotator: Annotator, allowlist: GeneAllowlist) -> Self {
        Triage {
            engine,
            annotator,
            allowlist,
            stats: SummaryStats::default(),
            line_number: 0,
        }
    }

    /// Evaluate a single input line. Header, blank and malformed lines give
    /// `None`, as do records that are dropped.
    pub fn evaluate(&mut self, line: &str) -> Option<TriageRow> {
        self.line_number += 1;
        if line.starts_with('#') {
            if line.starts_with("#CHROM") {
                if let Some(sample) = line.split_whitespace().nth(9) {
                    debug!("sample: {}", sample);
                }
            }
            return None;
        }
        if line.trim().is_empty() {
            return None;
        }

        let record = match VariantRecord::parse(line) {
            Ok(record) => record,
            Err(e) => {
                warn!("skipping malformed line {}: {}", self.line_number, e);
                self.stats.observe_malformed();
                return None;
            }
        };

        let annotation = self.annotator.extract(&record.info);
        if annotation.is_empty() {
            debug!("{}:{} has no annotation", record.chrom, record.pos);
        }
        let metrics = SiteMetrics::from_record(&record);
        let mut outcome = self.engine.evaluate_with(&record, &metrics);
        if outcome.is_kept() && !self.allowlist.allows(&annotation.gene) {
            debug!(
                "{}:{} gene '{}' not in allowlist",
                record.chrom, record.pos, annotation.gene
            );
            outcome = FilterOutcome::Dropped(FilterReason::GeneExcluded);
        }
        self.stats.observe(&outcome, &annotation);

        if !outcome.is_kept() {
            return None;
        }
        Some(TriageRow {
            alt: record.first_alt().to_string(),
            filters: record.filter.to_string(),
            chrom: record.chrom,
            pos: record.pos,
            ref_allele: record.ref_allele,
            annotation,
            metrics,
        })
    }

    /// Read every line from `reader` and write kept rows to `writer`.
    /// Bytes that are not valid UTF-8 are replaced rather than failing the run.
    pub fn run<R: BufRead, W: Write>(
        &mut self,
        mut reader: R,
        writer: &mut csv::Writer<W>,
    ) -> Result<()> {
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            let raw = buf.strip_suffix(b"\n").unwrap_or(&buf);
            let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
            let line = String::from_utf8_lossy(raw);
            if let Some(row) = self.evaluate(&line) {
                writer.write_record(row.fields())?;
            }
        }
        writer.flush()?;
        Ok(())
    }

    pub fn stats(&self) -> &SummaryStats {
        &self.stats
    }

    pub fn finalize(self) -> Summary {
        let summary = self.stats.finalize();
        info!(
            "seen {} variants, kept {} ({} malformed lines skipped)",
            summary.total_seen, summary.total_kept, summary.malformed
        );
        summary
    }
}
