use std::path::Path;

use crate::exec::{Invocation, Runner};
use crate::fileformat::temp_file;
use crate::utils::extra_threads;

/// samtools sort, by coordinate
pub fn sort(runner: &dyn Runner, input: &Path, output: &Path, threads: usize) -> anyhow::Result<()> {
    let inv = Invocation::new("samtools")
        .arg("sort")
        .opt("--threads", extra_threads(threads))
        .arg("-o")
        .path(output)
        .path(input);
    runner.run(&inv)
}

/// samtools sort -n, by read name
pub fn sort_by_readname(
    runner: &dyn Runner,
    input: &Path,
    output: &Path,
    threads: usize,
) -> anyhow::Result<()> {
    let inv = Invocation::new("samtools")
        .args(["sort", "-n"])
        .opt("--threads", extra_threads(threads))
        .arg("-o")
        .path(output)
        .path(input);
    runner.run(&inv)
}

/// Compress an aligner's SAM output into BAM
pub fn sam_to_bam(runner: &dyn Runner, sam: &Path, bam: &Path, threads: usize) -> anyhow::Result<()> {
    let inv = Invocation::new("samtools")
        .args(["view", "-b"])
        .opt("--threads", extra_threads(threads))
        .arg("-o")
        .path(bam)
        .path(sam);
    runner.run(&inv)
}

/// Aligner output to a coordinate sorted BAM, through a temporary unsorted BAM
pub fn sam_to_sorted_bam(
    runner: &dyn Runner,
    sam: &Path,
    bam: &Path,
    threads: usize,
) -> anyhow::Result<()> {
    let unsorted = temp_file(".bam")?;
    sam_to_bam(runner, sam, unsorted.path(), threads)?;
    sort(runner, unsorted.path(), bam, threads)
}

/// Total number of reads reported by samtools flagstat
pub fn flagstat_total(runner: &dyn Runner, bam: &Path) -> anyhow::Result<u64> {
    let inv = Invocation::new("samtools").arg("flagstat").path(bam);
    let out = runner.run_capture(&inv)?;
    parse_flagstat_total(&out).ok_or_else(|| {
        crate::runtime::Error::parse_error(
            format!("samtools flagstat output for {:?}", bam),
            Some("no read count on first line"),
        )
        .into()
    })
}

/// The first line of flagstat reads "N + M in total (QC-passed reads + QC-failed reads)"
pub fn parse_flagstat_total(flagstat: &str) -> Option<u64> {
    flagstat
        .lines()
        .next()?
        .split_whitespace()
        .next()?
        .parse()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::RecordingRunner;

    #[test]
    fn test_sort() {
        let runner = RecordingRunner::new();
        sort(&runner, Path::new("sample.bam"), Path::new("sample-out.bam"), 1).unwrap();
        sort(&runner, Path::new("sample.bam"), Path::new("sample-out.bam"), 3).unwrap();
        assert_eq!(
            runner.argvs(),
            vec![
                vec!["samtools", "sort", "-o", "sample-out.bam", "sample.bam"],
                vec!["samtools", "sort", "--threads", "2", "-o", "sample-out.bam", "sample.bam"],
            ]
        );
    }

    #[test]
    fn test_sort_by_readname() {
        let runner = RecordingRunner::new();
        sort_by_readname(&runner, Path::new("sample.bam"), Path::new("sample-out.bam"), 1).unwrap();
        assert_eq!(
            runner.argvs(),
            vec![vec!["samtools", "sort", "-n", "-o", "sample-out.bam", "sample.bam"]]
        );
    }

    #[test]
    fn test_flagstat_total() {
        let flagstat = "200 + 0 in total (QC-passed reads + QC-failed reads)\n0 + 0 secondary\n";
        let runner = RecordingRunner::new().with_stdout("samtools", flagstat);
        assert_eq!(flagstat_total(&runner, Path::new("a.bam")).unwrap(), 200);
        assert_eq!(runner.argvs(), vec![vec!["samtools", "flagstat", "a.bam"]]);

        assert_eq!(parse_flagstat_total(""), None);
        assert_eq!(parse_flagstat_total("x + 0 in total"), None);
    }
}
