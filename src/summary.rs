use rustc_hash::FxHashMap;
use std::fmt;

use crate::annotation::Annotation;
use crate::filter::{FilterOutcome, FilterReason};

/// Running counts over a stream of triaged records. Accumulators built over
/// disjoint parts of the input can be combined with `merge`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SummaryStats {
    pub total_seen: usize,
    pub total_kept: usize,
    pub malformed: usize,
    pub consequence_counts: FxHashMap<String, usize>,
    pub dropped: FxHashMap<FilterReason, usize>,
}

impl SummaryStats {
    /// Count one record. `outcome` must already reflect the gene allowlist.
    pub fn observe(&mut self, outcome: &FilterOutcome, annotation: &Annotation) {
        self.total_seen += 1;
        match outcome {
            FilterOutcome::Kept => {
                self.total_kept += 1;
                *self
                    .consequence_counts
                    .entry(annotation.consequence.clone())
                    .or_insert(0) += 1;
            }
            FilterOutcome::Dropped(reason) => {
                *self.dropped.entry(*reason).or_insert(0) += 1;
            }
        }
    }

    /// Count a line that could not be parsed.
    pub fn observe_malformed(&mut self) {
        self.malformed += 1;
    }

    pub fn merge(mut self, other: SummaryStats) -> SummaryStats {
        self.total_seen += other.total_seen;
        self.total_kept += other.total_kept;
        self.malformed += other.malformed;
        for (k, v) in other.consequence_counts {
            *self.consequence_counts.entry(k).or_insert(0) += v;
        }
        for (k, v) in other.dropped {
            *self.dropped.entry(k).or_insert(0) += v;
        }
        self
    }

    pub fn finalize(self) -> Summary {
        let mut by_consequence: Vec<(String, usize)> = self.consequence_counts.into_iter().collect();
        by_consequence.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        let mut dropped: Vec<(FilterReason, usize)> = self.dropped.into_iter().collect();
        dropped.sort();
        Summary {
            total_seen: self.total_seen,
            total_kept: self.total_kept,
            malformed: self.malformed,
            by_consequence,
            dropped,
        }
    }
}

/// Final counts for reporting. Consequences are ordered by descending count, then name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub total_seen: usize,
    pub total_kept: usize,
    pub malformed: usize,
    pub by_consequence: Vec<(String, usize)>,
    pub dropped: Vec<(FilterReason, usize)>,
}

impl Summary {
    pub fn consequence_count(&self, consequence: &str) -> usize {
        self.by_consequence
            .iter()
            .find(|(c, _)| c == consequence)
            .map_or(0, |(_, n)| *n)
    }

    pub fn dropped_for(&self, reason: FilterReason) -> usize {
        self.dropped
            .iter()
            .find(|(r, _)| *r == reason)
            .map_or(0, |(_, n)| *n)
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Seen variants: {}", self.total_seen)?;
        writeln!(f, "Kept variants: {}", self.total_kept)?;
        writeln!(f, "Malformed lines: {}", self.malformed)?;
        if !self.by_consequence.is_empty() {
            writeln!(f, "By consequence:")?;
            for (consequence, n) in &self.by_consequence {
                let name = if consequence.is_empty() {
                    "(none)"
                } else {
                    consequence.as_str()
                };
                writeln!(f, "  {}: {}", name, n)?;
            }
        }
        if !self.dropped.is_empty() {
            writeln!(f, "Dropped by reason:")?;
            for (reason, n) in &self.dropped {
                writeln!(f, "  {}: {}", reason, n)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ann(consequence: &str) -> Annotation {
        Annotation {
            consequence: consequence.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_observe() {
        let mut stats = SummaryStats::default();
        stats.observe(&FilterOutcome::Kept, &ann("missense_variant"));
        stats.observe(&FilterOutcome::Kept, &ann("missense_variant"));
        stats.observe(&FilterOutcome::Kept, &ann(""));
        stats.observe(
            &FilterOutcome::Dropped(FilterReason::GeneExcluded),
            &ann("stop_gained"),
        );
        stats.observe_malformed();

        let summary = stats.finalize();
        assert_eq!(summary.total_seen, 4);
        assert_eq!(summary.total_kept, 3);
        assert_eq!(summary.malformed, 1);
        assert_eq!(summary.consequence_count("missense_variant"), 2);
        assert_eq!(summary.consequence_count(""), 1);
        assert_eq!(summary.consequence_count("stop_gained"), 0);
        assert_eq!(summary.dropped_for(FilterReason::GeneExcluded), 1);
    }

    #[test]
    fn test_empty_run_reports_zero() {
        let summary = SummaryStats::default().finalize();
        let text = summary.to_string();
        assert!(text.contains("Seen variants: 0"));
        assert!(text.contains("Kept variants: 0"));
        assert!(!text.contains("By consequence"));
    }

    #[test]
    fn test_merge_is_order_independent() {
        let mut a = SummaryStats::default();
        a.observe(&FilterOutcome::Kept, &ann("synonymous_variant"));
        a.observe(&FilterOutcome::Dropped(FilterReason::LowQual), &ann(""));
        let mut b = SummaryStats::default();
        b.observe(&FilterOutcome::Kept, &ann("synonymous_variant"));
        b.observe(&FilterOutcome::Kept, &ann("missense_variant"));
        b.observe_malformed();

        let ab = a.clone().merge(b.clone());
        let ba = b.merge(a);
        assert_eq!(ab, ba);
        assert_eq!(ab.total_seen, 4);
        assert_eq!(ab.total_kept, 3);
        assert_eq!(ab.consequence_counts["synonymous_variant"], 2);
    }

    #[test]
    fn test_display_order() {
        let mut stats = SummaryStats::default();
        for c in ["b_variant", "a_variant", "c_variant", "c_variant", ""] {
            stats.observe(&FilterOutcome::Kept, &ann(c));
        }
        stats.observe(&FilterOutcome::Dropped(FilterReason::HighAf), &ann(""));
        let text = stats.finalize().to_string();
        let expected = "Seen variants: 6\n\
                        Kept variants: 5\n\
                        Malformed lines: 0\n\
                        By consequence:\n  \
                        c_variant: 2\n  \
                        (none): 1\n  \
                        a_variant: 1\n  \
                        b_variant: 1\n\
                        Dropped by reason:\n  \
                        HighAF: 1\n";
        assert_eq!(text, expected);
    }
}
