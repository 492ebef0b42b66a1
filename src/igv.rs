//! Build an IGV batch script that visits every locus in a triage table,
//! optionally saving a snapshot of each.

use std::io::{Read, Write};

use crate::error::Result;

const MAX_NAME_LEN: usize = 80;
const MAX_CONSEQUENCE_LEN: usize = 24;

/// Where IGV should load alignments from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlignmentSource {
    /// One BAM/CRAM, loaded once for all loci.
    Single(String),
    /// Name of a column holding a per-row BAM/CRAM path.
    Column(String),
}

#[derive(Debug, Clone)]
pub struct IgvBatchOptions {
    pub genome: String,
    pub alignments: AlignmentSource,
    pub flank: u64,
    pub snapshot_dir: Option<String>,
    pub snapshot_prefix: Option<String>,
}

/// Replace characters that are unsafe in file names and cap the length.
pub fn sanitize_filename(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' | ' ' | '\t' => '_',
            c => c,
        })
        .take(MAX_NAME_LEN)
        .collect()
}

struct Columns {
    chrom: Option<usize>,
    pos: Option<usize>,
    gene: Option<usize>,
    consequence: Option<usize>,
    bam: Option<usize>,
}

impl Columns {
    fn new(headers: &csv::StringRecord, bam_col: Option<&str>) -> Self {
        let find = |names: &[&str]| {
            names
                .iter()
                .find_map(|n| headers.iter().position(|h| h == *n))
        };
        Columns {
            chrom: find(&["chrom", "CHROM"]),
            pos: find(&["pos", "POS"]),
            gene: find(&["gene", "GENE"]),
            consequence: find(&["consequence", "Consequences", "CONSEQUENCE"]),
            bam: bam_col.and_then(|c| find(&[c])),
        }
    }
}

fn get(row: &csv::StringRecord, idx: Option<usize>) -> &str {
    idx.and_then(|i| row.get(i)).map_or("", |v| v.trim())
}

/// Read a triage CSV and write an IGV batch script. Rows without a chromosome
/// or with a non-numeric position are skipped. Returns the number of loci written.
pub fn make_batch<R: Read, W: Write>(
    csv_input: R,
    mut out: W,
    opts: &IgvBatchOptions,
) -> Result<usize> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(csv_input);
    let headers = rdr.headers()?.clone();
    let bam_col = match &opts.alignments {
        AlignmentSource::Column(c) => Some(c.as_str()),
        AlignmentSource::Single(_) => None,
    };
    let cols = Columns::new(&headers, bam_col);

    let mut lines = vec!["new".to_string(), format!("genome {}", opts.genome)];
    let mut rows = rdr.records().peekable();
    if rows.peek().is_none() {
        writeln!(out, "{}", lines.join("\n"))?;
        out.flush()?;
        return Ok(0);
    }

    if let AlignmentSource::Single(bam) = &opts.alignments {
        lines.push(format!("load {}", bam));
    }
    if let Some(dir) = &opts.snapshot_dir {
        lines.push(format!("snapshotDirectory {}", dir));
    }

    let mut count = 0;
    for row in rows {
        let row = row?;
        let chrom = get(&row, cols.chrom);
        let pos_str = get(&row, cols.pos);
        if chrom.is_empty() || pos_str.is_empty() || !pos_str.bytes().all(|b| b.is_ascii_digit()) {
            log::debug!("skipping row without a usable locus: {:?}", row);
            continue;
        }
        let pos: u64 = match pos_str.parse() {
            Ok(p) => p,
            Err(_) => continue,
        };
        let start = pos.saturating_sub(opts.flank).max(1);
        let end = pos.saturating_add(opts.flank);

        let bam = get(&row, cols.bam);
        if bam_col.is_some() && !bam.is_empty() {
            lines.push(format!("load {}", bam));
        }

        lines.push(format!("goto {}:{}-{}", chrom, start, end));

        if opts.snapshot_dir.is_some() {
            let mut parts = vec![chrom.to_string(), pos.to_string()];
            let gene = get(&row, cols.gene);
            if !gene.is_empty() {
                parts.push(gene.to_string());
            }
            let consequence = get(&row, cols.consequence);
            if !consequence.is_empty() {
                let first = consequence.split('&').next().unwrap_or(consequence);
                parts.push(first.chars().take(MAX_CONSEQUENCE_LEN).collect());
            }
            let mut name = parts.join("_");
            if let Some(prefix) = &opts.snapshot_prefix {
                name = format!("{}_{}", prefix, name);
            }
            lines.push(format!("snapshot {}.png", sanitize_filename(&name)));
        }
        count += 1;
    }

    writeln!(out, "{}", lines.join("\n"))?;
    out.flush()?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(alignments: AlignmentSource, flank: u64, snapshot_dir: Option<&str>) -> IgvBatchOptions {
        IgvBatchOptions {
            genome: "GRCh38".to_string(),
            alignments,
            flank,
            snapshot_dir: snapshot_dir.map(String::from),
            snapshot_prefix: None,
        }
    }

    fn batch(csv: &str, opts: &IgvBatchOptions) -> (usize, String) {
        let mut out = Vec::new();
        let n = make_batch(csv.as_bytes(), &mut out, opts).expect("error making batch");
        (n, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_single_bam_with_snapshots() {
        let mut o = opts(
            AlignmentSource::Single("/x/sample.bam".to_string()),
            50,
            Some("/tmp/shots"),
        );
        o.snapshot_prefix = Some("demo".to_string());
        let (n, txt) = batch("chrom,pos,gene,consequence\n1,1000,GENE1,missense_variant\n", &o);
        assert_eq!(n, 1);
        assert_eq!(
            txt,
            "new\ngenome GRCh38\nload /x/sample.bam\nsnapshotDirectory /tmp/shots\n\
             goto 1:950-1050\nsnapshot demo_1_1000_GENE1_missense_variant.png\n"
        );
    }

    #[test]
    fn test_bam_column_without_snapshots() {
        let o = opts(AlignmentSource::Column("bam_path".to_string()), 25, None);
        let (n, txt) = batch(
            "chrom,pos,gene,consequence,bam_path\n1,2000,GENE2,synonymous_variant,/x/sample2.cram\n",
            &o,
        );
        assert_eq!(n, 1);
        assert!(txt.contains("load /x/sample2.cram\n"));
        assert!(txt.contains("goto 1:1975-2025\n"));
        assert!(!txt.contains("snapshot "));
    }

    #[test]
    fn test_skips_malformed_and_clamps_start() {
        let o = opts(AlignmentSource::Single("s.bam".to_string()), 100, None);
        let (n, txt) = batch("CHROM,POS\n,10\nchr2,abc\nchr3,40\n", &o);
        assert_eq!(n, 1);
        assert!(txt.contains("goto chr3:1-140"));
        assert!(!txt.contains("chr2"));
    }

    #[test]
    fn test_end_saturates_at_max_position() {
        let o = opts(AlignmentSource::Single("s.bam".to_string()), 100, None);
        let (n, txt) = batch(&format!("chrom,pos\nchr1,{}\n", u64::MAX), &o);
        assert_eq!(n, 1);
        assert!(txt.contains(&format!("goto chr1:{}-{}", u64::MAX - 100, u64::MAX)));
    }

    #[test]
    fn test_empty_csv() {
        let o = opts(AlignmentSource::Single("s.bam".to_string()), 100, Some("d"));
        let (n, txt) = batch("chrom,pos\n", &o);
        assert_eq!(n, 0);
        assert_eq!(txt, "new\ngenome GRCh38\n");
    }

    #[test]
    fn test_snapshot_name_trims_consequence() {
        let o = opts(AlignmentSource::Single("s.bam".to_string()), 10, Some("d"));
        let (_, txt) = batch(
            "chrom,pos,consequence\nchrX,500,splice_acceptor_variant_long_name&intron_variant\n",
            &o,
        );
        assert!(txt.contains("snapshot chrX_500_splice_acceptor_variant_.png"));
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("a b/c:d*e"), "a_b_c_d_e");
        assert_eq!(sanitize_filename(&"x".repeat(100)).len(), 80);
    }
}
