use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use anyhow::Context;
use bio::io::fastq;
use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

/// Locate the FASTQ of read 1 or 2 for `name`, trying in order
/// name_N.fastq, name_N.fastq.gz, name_RN.fastq, name_RN.fastq.gz
pub fn resolve_fastq(dir: &Path, name: &str, read: u8) -> Option<PathBuf> {
    [
        format!("{}_{}.fastq", name, read),
        format!("{}_{}.fastq.gz", name, read),
        format!("{}_R{}.fastq", name, read),
        format!("{}_R{}.fastq.gz", name, read),
    ]
    .into_iter()
    .map(|f| dir.join(f))
    .find(|p| p.is_file())
}

/// Open a FASTQ, transparently decompressing .gz files
pub fn open_fastq(path: &Path) -> anyhow::Result<Box<dyn Read>> {
    let file = File::open(path).with_context(|| format!("Could not open FASTQ {:?}", path))?;
    if path.extension().is_some_and(|e| e == "gz") {
        Ok(Box::new(MultiGzDecoder::new(file)))
    } else {
        Ok(Box::new(file))
    }
}

pub fn create_gz_fastq(path: &Path) -> anyhow::Result<GzEncoder<File>> {
    let file = File::create(path).with_context(|| format!("Could not create FASTQ {:?}", path))?;
    Ok(GzEncoder::new(file, Compression::default()))
}

/// FASTQ reader over a plain or gzipped file
pub fn fastq_reader(path: &Path) -> anyhow::Result<fastq::Reader<BufReader<Box<dyn Read>>>> {
    Ok(fastq::Reader::new(open_fastq(path)?))
}

/// Number of records in a FASTQ. Malformed or truncated records are an error
pub fn count_fastq(path: &Path) -> anyhow::Result<usize> {
    let mut n = 0;
    for record in fastq_reader(path)?.records() {
        record.with_context(|| format!("Malformed record {} in FASTQ {:?}", n + 1, path))?;
        n += 1;
    }
    Ok(n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_resolve_fastq_priority() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(resolve_fastq(dir.path(), "POLR2A", 1), None);

        std::fs::write(dir.path().join("POLR2A_R1.fastq.gz"), "").unwrap();
        assert_eq!(
            resolve_fastq(dir.path(), "POLR2A", 1),
            Some(dir.path().join("POLR2A_R1.fastq.gz"))
        );

        std::fs::write(dir.path().join("POLR2A_1.fastq.gz"), "").unwrap();
        assert_eq!(
            resolve_fastq(dir.path(), "POLR2A", 1),
            Some(dir.path().join("POLR2A_1.fastq.gz"))
        );

        std::fs::write(dir.path().join("POLR2A_1.fastq"), "").unwrap();
        assert_eq!(
            resolve_fastq(dir.path(), "POLR2A", 1),
            Some(dir.path().join("POLR2A_1.fastq"))
        );
        assert_eq!(resolve_fastq(dir.path(), "POLR2A", 2), None);
    }

    fn write_text(dir: &Path, text: &str) -> PathBuf {
        let path = dir.join("reads_R1.fastq.gz");
        let mut gz = create_gz_fastq(&path).unwrap();
        gz.write_all(text.as_bytes()).unwrap();
        gz.finish().unwrap();
        path
    }

    #[test]
    fn test_fastq_reader() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_text(dir.path(), "@r1 1:N\nACGT\n+\nIIII\n@r2/1\nGG\n+\n@I\n");
        let records: Vec<fastq::Record> = fastq_reader(&path)
            .unwrap()
            .records()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id(), "r1");
        assert_eq!(records[0].desc(), Some("1:N"));
        assert_eq!(records[1].id(), "r2/1");
        assert_eq!(records[1].seq(), b"GG");
        assert_eq!(records[1].qual(), b"@I");
        assert_eq!(count_fastq(&path).unwrap(), 2);
    }

    #[test]
    fn test_count_fastq_blank_line_mid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_text(
            dir.path(),
            "@a\nACGT\n+\nIIII\n\n@b\nACGT\n+\nIIII\n@c\nACGT\n+\nIIII\n",
        );
        assert!(count_fastq(&path).is_err());
    }

    #[test]
    fn test_count_fastq_bad_header_mid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_text(
            dir.path(),
            "@a\nACGT\n+\nIIII\nb\nACGT\n+\nIIII\n@c\nACGT\n+\nIIII\n",
        );
        assert!(count_fastq(&path).is_err());
    }

    #[test]
    fn test_truncated_fastq() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_text(dir.path(), "@r1\nACGT\n+\n");
        assert!(count_fastq(&path).is_err());
    }
}
