//! Input and output at the edges of a run. Reading goes through htslib so
//! plain, gzip and bgzip input are all handled the same way.

use rust_htslib::bgzf;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::error::Result;
use crate::triage::COLUMNS;

fn is_stdio(path: &str) -> bool {
    matches!(path, "-" | "stdin" | "stdout")
}

/// Open `path` (or `-` for stdin) for line-by-line reading.
pub fn open_reader(path: &str) -> Result<Box<dyn BufRead>> {
    let reader = if is_stdio(path) {
        bgzf::Reader::from_stdin()?
    } else {
        bgzf::Reader::from_path(path)?
    };
    log::debug!("opened {} for reading", path);
    Ok(Box::new(BufReader::new(reader)))
}

/// `EitherWriter` encapsulates the different places output can go.
pub enum EitherWriter {
    Bgzf(bgzf::Writer),
    File(BufWriter<std::fs::File>),
    Stdout(BufWriter<std::io::Stdout>),
}

impl EitherWriter {
    /// `-` writes to stdout and a path ending in `.gz` is bgzip-compressed.
    pub fn from_path(path: &str) -> Result<Self> {
        if is_stdio(path) {
            Ok(EitherWriter::Stdout(BufWriter::new(std::io::stdout())))
        } else if path.ends_with(".gz") {
            Ok(EitherWriter::Bgzf(bgzf::Writer::from_path(path)?))
        } else {
            let file = std::fs::File::create(Path::new(path))?;
            Ok(EitherWriter::File(BufWriter::new(file)))
        }
    }
}

impl Write for EitherWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self {
            EitherWriter::Bgzf(w) => w.write(buf),
            EitherWriter::File(w) => w.write(buf),
            EitherWriter::Stdout(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self {
            EitherWriter::Bgzf(w) => w.flush(),
            EitherWriter::File(w) => w.flush(),
            EitherWriter::Stdout(w) => w.flush(),
        }
    }
}

/// A CSV writer with the triage header row already written.
pub fn triage_writer<W: Write>(inner: W) -> Result<csv::Writer<W>> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(inner);
    wtr.write_record(COLUMNS)?;
    Ok(wtr)
}

/// Flush the CSV buffer and then the underlying writer, so that late write
/// failures are reported instead of being lost when the writer is dropped.
pub fn finish_writer<W: Write>(wtr: csv::Writer<W>) -> Result<()> {
    let mut inner = wtr.into_inner().map_err(|e| e.into_error())?;
    inner.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::tempdir;

    #[test]
    fn test_plain_and_bgzip_read_the_same() {
        let dir = tempdir().expect("error creating tempdir");
        let text = "##fileformat=VCFv4.2\nchr1\t1\t.\tA\tT\t50\tPASS\t.\n";

        let plain = dir.path().join("x.vcf");
        std::fs::write(&plain, text).unwrap();

        let gz = dir.path().join("x.vcf.gz");
        {
            let mut w = EitherWriter::from_path(gz.to_str().unwrap()).unwrap();
            assert!(matches!(w, EitherWriter::Bgzf(_)));
            w.write_all(text.as_bytes()).unwrap();
            w.flush().unwrap();
        }

        for p in [&plain, &gz] {
            let mut got = String::new();
            open_reader(p.to_str().unwrap())
                .unwrap()
                .read_to_string(&mut got)
                .unwrap();
            assert_eq!(got, text);
        }
    }

    #[test]
    fn test_missing_input_is_an_error() {
        let dir = tempdir().unwrap();
        let p = dir.path().join("nope.vcf");
        assert!(open_reader(p.to_str().unwrap()).is_err());
    }

    struct FailingFlush;

    impl Write for FailingFlush {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "disk full"))
        }
    }

    #[test]
    fn test_finish_writer_reports_flush_failure() {
        let wtr = triage_writer(FailingFlush).unwrap();
        assert!(matches!(finish_writer(wtr), Err(crate::TriageError::Io(_))));
        assert!(finish_writer(triage_writer(Vec::new()).unwrap()).is_ok());
    }

    #[test]
    fn test_triage_writer_header() {
        let mut wtr = triage_writer(Vec::new()).unwrap();
        wtr.flush().unwrap();
        let bytes = wtr.into_inner().unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            "chrom,pos,ref,alt,gene,consequence,hgvs_c,hgvs_p,af,gt,dp,ab,filters\n"
        );
    }
}
