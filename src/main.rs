use clap::{Parser, Subcommand, ValueEnum};
use log::{info, warn};
use mimalloc::MiMalloc;
use std::io::Write;

use vcftriage::igv::{self, AlignmentSource, IgvBatchOptions};
use vcftriage::io::{finish_writer, open_reader, triage_writer, EitherWriter};
use vcftriage::{
    AnnotationLayout, Annotator, FilterConfig, FilterEngine, GeneAllowlist, Triage, TriageError,
};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Layout {
    /// Allele|Consequence|Gene|HGVSc|HGVSp
    Compact,
    /// standard SnpEff ANN field order
    Snpeff,
}

#[derive(Subcommand)]
enum Commands {
    /// Filter a single-sample VCF and write kept variants as CSV.
    Filter {
        /// Path to input VCF (plain, gzip or bgzip). Use "-" for stdin.
        #[arg(long)]
        vcf: String,

        /// Output CSV. Use "-" for stdout; a path ending in .gz is bgzip-compressed.
        #[arg(long)]
        out: String,

        /// Minimum sample depth (DP) to keep a site.
        #[arg(long, default_value_t = 10)]
        min_dp: u32,

        /// Minimum QUAL to keep a site.
        #[arg(long, default_value_t = 30.0)]
        min_qual: f64,

        /// Maximum allele frequency (AF) when present in INFO.
        #[arg(long, default_value_t = 0.01)]
        max_af: f64,

        /// Include sites where FILTER is not PASS.
        #[arg(long)]
        include_nonpass: bool,

        /// File of genes to keep, one per line.
        #[arg(long)]
        genes: Option<String>,

        /// Write a small text summary to this path.
        #[arg(long)]
        summary: Option<String>,

        /// INFO key holding the transcript annotation.
        #[arg(long, default_value = "ANN")]
        ann_key: String,

        /// Field layout of each annotation entry.
        #[arg(long, value_enum, default_value_t = Layout::Compact)]
        ann_layout: Layout,
    },

    /// Generate an IGV batch script from a triage CSV.
    Igv {
        /// Path to triage CSV (must have chrom,pos).
        #[arg(long)]
        csv: String,

        /// Output IGV batch file.
        #[arg(long, default_value = "igv_batch.txt")]
        out: String,

        /// Genome ID to use in IGV (e.g. GRCh37, GRCh38).
        #[arg(long, default_value = "GRCh38")]
        genome: String,

        /// Single BAM/CRAM to load for all loci.
        #[arg(long, group = "alignments", required_unless_present = "bam_col")]
        bam: Option<String>,

        /// CSV column holding a BAM/CRAM path per row.
        #[arg(long, group = "alignments")]
        bam_col: Option<String>,

        /// Padding in bp around POS.
        #[arg(long, default_value_t = 100)]
        flank: u64,

        /// Directory for IGV snapshots.
        #[arg(long)]
        snapshot_dir: Option<String>,

        /// Prefix for snapshot file names.
        #[arg(long)]
        snapshot_prefix: Option<String>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // exit quietly when output is piped into e.g. head.
    unsafe {
        libc::signal(libc::SIGPIPE, libc::SIG_DFL);
    }
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Cli::parse();
    match args.command {
        Commands::Filter {
            vcf,
            out,
            min_dp,
            min_qual,
            max_af,
            include_nonpass,
            genes,
            summary,
            ann_key,
            ann_layout,
        } => {
            let config = FilterConfig::new(min_dp, min_qual, max_af, include_nonpass)?;

            let allowlist = match genes {
                Some(path) => {
                    let allowlist = GeneAllowlist::from_reader(open_reader(&path)?)?;
                    if allowlist.is_active() {
                        info!("loaded {} genes from {}", allowlist.len(), path);
                    } else {
                        warn!("gene list {} is empty; no gene filtering applied", path);
                    }
                    allowlist
                }
                None => GeneAllowlist::default(),
            };

            let layout = match ann_layout {
                Layout::Compact => AnnotationLayout::compact(),
                Layout::Snpeff => AnnotationLayout::snpeff(),
            }
            .with_key(ann_key);

            let reader = open_reader(&vcf)?;
            let mut writer = triage_writer(EitherWriter::from_path(&out)?)?;

            let mut triage = Triage::new(FilterEngine::new(config), Annotator::new(layout), allowlist);
            triage.run(reader, &mut writer)?;
            finish_writer(writer)?;
            let report = triage.finalize();

            if let Some(path) = summary {
                let mut f = std::fs::File::create(&path)?;
                write!(f, "{}", report)?;
            }
        }
        Commands::Igv {
            csv,
            out,
            genome,
            bam,
            bam_col,
            flank,
            snapshot_dir,
            snapshot_prefix,
        } => {
            let alignments = match (bam, bam_col) {
                (Some(bam), _) => AlignmentSource::Single(bam),
                (None, Some(col)) => AlignmentSource::Column(col),
                (None, None) => {
                    return Err(TriageError::Config("one of --bam or --bam-col is required".into()).into())
                }
            };
            if let Some(dir) = &snapshot_dir {
                std::fs::create_dir_all(dir)?;
            }
            let opts = IgvBatchOptions {
                genome,
                alignments,
                flank,
                snapshot_dir,
                snapshot_prefix,
            };
            let input = std::fs::File::open(&csv)?;
            let output = std::io::BufWriter::new(std::fs::File::create(&out)?);
            let n = igv::make_batch(input, output, &opts)?;
            info!("wrote {} loci to {}", n, out);
        }
    }
    Ok(())
}
