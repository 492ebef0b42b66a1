use rust_htslib::bcf::record::GenotypeAllele;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A genotype from the GT sample field, e.g. `0/1` or `1|0`. Follows the htslib
/// convention where the phasing of each allele after the first is carried on
/// that allele.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Genotype(Vec<GenotypeAllele>);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid genotype '{0}'")]
pub struct InvalidGenotype(pub String);

fn allele_index(allele: &GenotypeAllele) -> Option<i32> {
    match allele {
        GenotypeAllele::Unphased(i) | GenotypeAllele::Phased(i) => Some(*i),
        GenotypeAllele::UnphasedMissing | GenotypeAllele::PhasedMissing => None,
    }
}

impl Genotype {
    pub fn has_missing(&self) -> bool {
        self.0.iter().any(|a| allele_index(a).is_none())
    }

    /// Fully called with exactly two distinct allele indices. `0/1`, `1|0` and
    /// `1/2` are heterozygous; `1/1`, `0/.` and `1` are not.
    pub fn is_heterozygous(&self) -> bool {
        if self.has_missing() {
            return false;
        }
        let mut indices: Vec<i32> = self.0.iter().filter_map(allele_index).collect();
        indices.sort_unstable();
        indices.dedup();
        indices.len() == 2
    }
}

impl FromStr for Genotype {
    type Err = InvalidGenotype;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(InvalidGenotype(s.to_string()));
        }
        let mut alleles = Vec::with_capacity(2);
        let mut phased = false;
        let mut start = 0;
        for (i, c) in s.char_indices().chain(std::iter::once((s.len(), '/'))) {
            if c != '/' && c != '|' {
                continue;
            }
            let token = &s[start..i];
            let allele = match (token, phased) {
                (".", false) => GenotypeAllele::UnphasedMissing,
                (".", true) => GenotypeAllele::PhasedMissing,
                (t, p) => {
                    let idx = t
                        .parse::<u32>()
                        .ok()
                        .and_then(|v| i32::try_from(v).ok())
                        .ok_or_else(|| InvalidGenotype(s.to_string()))?;
                    if p {
                        GenotypeAllele::Phased(idx)
                    } else {
                        GenotypeAllele::Unphased(idx)
                    }
                }
            };
            alleles.push(allele);
            // the separator before an allele defines that allele's phasing.
            phased = c == '|';
            start = i + 1;
        }
        Ok(Genotype(alleles))
    }
}

impl fmt::Display for Genotype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Genotype(alleles) = self;
        write!(f, "{}", alleles[0])?;
        for allele in alleles[1..].iter() {
            let sep = match allele {
                GenotypeAllele::Phased(_) | GenotypeAllele::PhasedMissing => "|",
                GenotypeAllele::Unphased(_) | GenotypeAllele::UnphasedMissing => "/",
            };
            write!(f, "{}{}", sep, allele)?;
        }
        Ok(())
    }
}
