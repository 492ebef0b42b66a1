use rustc_hash::FxHashSet;
use std::io::BufRead;

/// Genes to keep. Matching is exact and case-sensitive. An empty allowlist
/// applies no gene filtering at all.
#[derive(Debug, Clone, Default)]
pub struct GeneAllowlist {
    genes: FxHashSet<String>,
}

impl GeneAllowlist {
    /// Read one gene per line. Surrounding whitespace is trimmed and blank lines skipped.
    pub fn from_reader<R: BufRead>(reader: R) -> std::io::Result<Self> {
        let mut genes = FxHashSet::default();
        for line in reader.lines() {
            let line = line?;
            let gene = line.trim();
            if !gene.is_empty() {
                genes.insert(gene.to_string());
            }
        }
        Ok(GeneAllowlist { genes })
    }

    pub fn is_active(&self) -> bool {
        !self.genes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    pub fn allows(&self, gene: &str) -> bool {
        if !self.is_active() {
            return true;
        }
        !gene.is_empty() && self.genes.contains(gene)
    }
}

impl<S: Into<String>> FromIterator<S> for GeneAllowlist {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        GeneAllowlist {
            genes: iter
                .into_iter()
                .map(Into::into)
                .filter(|g: &String| !g.is_empty())
                .collect(),
        }
    }
}
