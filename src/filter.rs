use log::{debug, log_enabled, Level};
use std::fmt;

use crate::error::{Result, TriageError};
use crate::genotypes::Genotype;
use crate::variant::VariantRecord;

pub const MIN_ALLELE_BALANCE: f64 = 0.3;
pub const MAX_ALLELE_BALANCE: f64 = 0.7;

/// Thresholds for a run. Built once and read-only afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterConfig {
    pub min_depth: u32,
    pub min_quality: f64,
    pub max_allele_frequency: f64,
    pub include_non_pass: bool,
}

impl Default for FilterConfig {
    fn default() -> Self {
        FilterConfig {
            min_depth: 10,
            min_quality: 30.0,
            max_allele_frequency: 0.01,
            include_non_pass: false,
        }
    }
}

impl FilterConfig {
    pub fn new(
        min_depth: u32,
        min_quality: f64,
        max_allele_frequency: f64,
        include_non_pass: bool,
    ) -> Result<Self> {
        let config = FilterConfig {
            min_depth,
            min_quality,
            max_allele_frequency,
            include_non_pass,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.min_quality.is_finite() || self.min_quality < 0.0 {
            return Err(TriageError::Config(format!(
                "minimum quality must be a non-negative number, got {}",
                self.min_quality
            )));
        }
        if !self.max_allele_frequency.is_finite()
            || !(0.0..=1.0).contains(&self.max_allele_frequency)
        {
            return Err(TriageError::Config(format!(
                "maximum allele frequency must be between 0 and 1, got {}",
                self.max_allele_frequency
            )));
        }
        Ok(())
    }
}

/// Why a record was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FilterReason {
    PassFilter,
    LowQual,
    LowDepth,
    HighAf,
    BadAlleleBalance,
    GeneExcluded,
}

impl FilterReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterReason::PassFilter => "PassFilter",
            FilterReason::LowQual => "LowQual",
            FilterReason::LowDepth => "LowDepth",
            FilterReason::HighAf => "HighAF",
            FilterReason::BadAlleleBalance => "BadAlleleBalance",
            FilterReason::GeneExcluded => "GeneExcluded",
        }
    }
}

impl fmt::Display for FilterReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOutcome {
    Kept,
    Dropped(FilterReason),
}

impl FilterOutcome {
    pub fn is_kept(&self) -> bool {
        matches!(self, FilterOutcome::Kept)
    }

    pub fn reason(&self) -> Option<FilterReason> {
        match self {
            FilterOutcome::Kept => None,
            FilterOutcome::Dropped(r) => Some(*r),
        }
    }
}

/// Numeric signals pulled from INFO and the sample column. Each is `None` when
/// absent, unparsable or (for allele balance) not applicable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SiteMetrics {
    pub allele_frequency: Option<f64>,
    pub depth: Option<u32>,
    pub genotype: Option<String>,
    /// alt / (ref + alt) from the first two AD values; only for heterozygous calls.
    pub allele_balance: Option<f64>,
}

impl SiteMetrics {
    pub fn from_record(record: &VariantRecord) -> Self {
        let depth = record.sample("DP").and_then(|dp| match dp.parse::<u32>() {
            Ok(v) => Some(v),
            Err(_) => {
                debug!("{}:{} unparsable DP '{}'", record.chrom, record.pos, dp);
                None
            }
        });
        let gt = record.sample("GT");
        let parsed = gt.and_then(|g| g.parse::<Genotype>().ok());
        let heterozygous = parsed.as_ref().is_some_and(|g| g.is_heterozygous());
        // normalized when it decodes, verbatim otherwise.
        let genotype = match parsed {
            Some(g) => Some(g.to_string()),
            None => gt.map(String::from),
        };
        let allele_balance = if heterozygous {
            record.sample("AD").and_then(allele_balance)
        } else {
            None
        };
        SiteMetrics {
            allele_frequency: record.info.float("AF"),
            depth,
            genotype,
            allele_balance,
        }
    }
}

/// alt / (ref + alt) from an AD value such as `10,15`. `None` unless the first
/// two values are integers with a non-zero sum.
pub fn allele_balance(ad: &str) -> Option<f64> {
    let mut depths = ad.split(',').map(|d| d.parse::<u32>());
    let ref_depth = depths.next()?.ok()?;
    let alt_depth = depths.next()?.ok()?;
    let total = ref_depth as u64 + alt_depth as u64;
    if total == 0 {
        return None;
    }
    Some(alt_depth as f64 / total as f64)
}

pub fn allele_balance_in_range(ab: f64) -> bool {
    (MIN_ALLELE_BALANCE..=MAX_ALLELE_BALANCE).contains(&ab)
}

/// The ordered keep/drop chain. The first failing stage sets the reason.
#[derive(Debug, Clone, Default)]
pub struct FilterEngine {
    config: FilterConfig,
}

impl FilterEngine {
    pub fn new(config: FilterConfig) -> Self {
        FilterEngine { config }
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    pub fn evaluate(&self, record: &VariantRecord) -> FilterOutcome {
        self.evaluate_with(record, &SiteMetrics::from_record(record))
    }

    /// Evaluate using metrics already extracted from `record`.
    pub fn evaluate_with(&self, record: &VariantRecord, metrics: &SiteMetrics) -> FilterOutcome {
        let outcome = self.chain(record, metrics);
        if log_enabled!(Level::Debug) {
            if let FilterOutcome::Dropped(reason) = outcome {
                debug!("{}:{} dropped: {}", record.chrom, record.pos, reason);
            }
        }
        outcome
    }

    fn chain(&self, record: &VariantRecord, metrics: &SiteMetrics) -> FilterOutcome {
        let c = &self.config;
        if !c.include_non_pass && !record.filter.is_pass() {
            return FilterOutcome::Dropped(FilterReason::PassFilter);
        }
        if record.qual.is_some_and(|q| q < c.min_quality) {
            return FilterOutcome::Dropped(FilterReason::LowQual);
        }
        if metrics.depth.is_some_and(|dp| dp < c.min_depth) {
            return FilterOutcome::Dropped(FilterReason::LowDepth);
        }
        if metrics
            .allele_frequency
            .is_some_and(|af| af >= c.max_allele_frequency)
        {
            return FilterOutcome::Dropped(FilterReason::HighAf);
        }
        if metrics
            .allele_balance
            .is_some_and(|ab| !allele_balance_in_range(ab))
        {
            return FilterOutcome::Dropped(FilterReason::BadAlleleBalance);
        }
        FilterOutcome::Kept
    }
}
