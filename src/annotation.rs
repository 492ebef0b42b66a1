//! Decoding of the pipe-delimited transcript-effect INFO field (ANN/CSQ).

use crate::variant::Info;

const ENTRY_SEP: char = ',';
const FIELD_SEP: char = '|';

/// Transcript-level annotation for a record. Empty strings mean "unknown".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Annotation {
    pub gene: String,
    pub consequence: String,
    pub hgvs_c: String,
    pub hgvs_p: String,
}

impl Annotation {
    pub fn is_empty(&self) -> bool {
        self.gene.is_empty()
            && self.consequence.is_empty()
            && self.hgvs_c.is_empty()
            && self.hgvs_p.is_empty()
    }
}

/// Where to find the annotation and which field positions hold what.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationLayout {
    pub key: String,
    pub consequence: usize,
    pub gene: usize,
    pub hgvs_c: usize,
    pub hgvs_p: usize,
}

impl AnnotationLayout {
    /// `Allele|Consequence|Gene|HGVSc|HGVSp`
    pub fn compact() -> Self {
        AnnotationLayout {
            key: "ANN".to_string(),
            consequence: 1,
            gene: 2,
            hgvs_c: 3,
            hgvs_p: 4,
        }
    }

    /// The standard SnpEff ANN layout:
    /// `Allele|Annotation|Impact|Gene_Name|Gene_ID|Feature_Type|Feature_ID|Biotype|Rank|HGVS.c|HGVS.p|...`
    pub fn snpeff() -> Self {
        AnnotationLayout {
            key: "ANN".to_string(),
            consequence: 1,
            gene: 3,
            hgvs_c: 9,
            hgvs_p: 10,
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }
}

impl Default for AnnotationLayout {
    fn default() -> Self {
        AnnotationLayout::compact()
    }
}

/// Chooses one annotation entry out of the raw, comma-separated list.
pub type EntrySelector = fn(&str) -> Option<&str>;

/// Takes the first entry. No canonical-transcript logic is applied.
pub fn select_first(entries: &str) -> Option<&str> {
    entries.split(ENTRY_SEP).next().filter(|e| !e.is_empty())
}

pub struct Annotator {
    layout: AnnotationLayout,
    select: EntrySelector,
}

impl Annotator {
    pub fn new(layout: AnnotationLayout) -> Self {
        Annotator {
            layout,
            select: select_first,
        }
    }

    pub fn with_selector(mut self, select: EntrySelector) -> Self {
        self.select = select;
        self
    }

    pub fn layout(&self) -> &AnnotationLayout {
        &self.layout
    }

    /// Extract the annotation from INFO. Never fails: a missing or malformed
    /// payload gives an all-empty `Annotation`.
    pub fn extract(&self, info: &Info) -> Annotation {
        let raw = match info.get(&self.layout.key) {
            Some(raw) if !raw.is_empty() => raw,
            _ => return Annotation::default(),
        };
        let entry = match (self.select)(raw) {
            Some(entry) => entry,
            None => {
                log::debug!("no usable entry in {}={}", self.layout.key, raw);
                return Annotation::default();
            }
        };
        let fields: Vec<&str> = entry.split(FIELD_SEP).collect();
        let at = |i: usize| fields.get(i).map_or_else(String::new, |s| s.to_string());
        Annotation {
            gene: at(self.layout.gene),
            consequence: at(self.layout.consequence),
            hgvs_c: at(self.layout.hgvs_c),
            hgvs_p: at(self.layout.hgvs_p),
        }
    }
}

impl Default for Annotator {
    fn default() -> Self {
        Annotator::new(AnnotationLayout::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(info: &Info) -> Annotation {
        Annotator::default().extract(info)
    }

    #[test]
    fn test_extract_compact() {
        let info = Info::parse("DP=25;ANN=T|missense_variant|GENE1|c.1A>T|p.M1L");
        let ann = extract(&info);
        assert_eq!(ann.gene, "GENE1");
        assert_eq!(ann.consequence, "missense_variant");
        assert_eq!(ann.hgvs_c, "c.1A>T");
        assert_eq!(ann.hgvs_p, "p.M1L");
    }

    #[test]
    fn test_only_first_entry_is_used() {
        let info = Info::parse(
            "ANN=T|synonymous_variant|GENE2|c.3G>A|p.M1M,T|missense_variant|GENE1|c.1A>T|p.M1L",
        );
        let ann = extract(&info);
        assert_eq!(ann.gene, "GENE2");
        assert_eq!(ann.consequence, "synonymous_variant");
    }

    #[test]
    fn test_short_entry_gives_empty_fields() {
        let info = Info::parse("ANN=T|stop_gained");
        let ann = extract(&info);
        assert_eq!(ann.consequence, "stop_gained");
        assert_eq!(ann.gene, "");
        assert_eq!(ann.hgvs_c, "");
        assert_eq!(ann.hgvs_p, "");
    }

    #[test]
    fn test_absent_or_degenerate() {
        assert!(extract(&Info::parse("DP=3")).is_empty());
        assert!(extract(&Info::parse("ANN=")).is_empty());
        assert!(extract(&Info::parse("ANN=,T|x|G")).is_empty());
        // a bare flag decodes to a single garbage field, which is not a consequence position.
        assert!(extract(&Info::parse("ANN")).is_empty());
    }

    #[test]
    fn test_snpeff_layout() {
        let info = Info::parse(
            "ANN=T|missense_variant|MODERATE|BRCA1|ENSG0001|transcript|ENST0001|protein_coding|2/10|c.181T>G|p.Cys61Gly",
        );
        let ann = Annotator::new(AnnotationLayout::snpeff()).extract(&info);
        assert_eq!(ann.gene, "BRCA1");
        assert_eq!(ann.consequence, "missense_variant");
        assert_eq!(ann.hgvs_c, "c.181T>G");
        assert_eq!(ann.hgvs_p, "p.Cys61Gly");
    }

    #[test]
    fn test_custom_key_and_selector() {
        fn last(entries: &str) -> Option<&str> {
            entries.rsplit(',').next()
        }
        let info = Info::parse("CSQ=A|intron_variant|G1|.|.,A|frameshift_variant|G2|c.5del|p.K2fs");
        let annotator = Annotator::new(AnnotationLayout::compact().with_key("CSQ")).with_selector(last);
        let ann = annotator.extract(&info);
        assert_eq!(ann.gene, "G2");
        assert_eq!(ann.consequence, "frameshift_variant");
        assert_eq!(annotator.layout().key, "CSQ");
    }
}
