use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use super::constants::DEFAULT_PATH_SAMPLES;
use super::sample_names;
use crate::exec::{Invocation, Runner, SystemRunner};
use crate::fileformat::bed::{self, parse_coordinate};
use crate::fileformat::{bam, temp_file};

#[derive(Args)]
pub struct Bam2BedCMD {
    #[arg(short = 's', long = "samples", default_value = DEFAULT_PATH_SAMPLES)]
    /// Sample names listed one sample name by line
    pub path_samples: PathBuf,

    #[arg(short = 'p', long = "paired", overrides_with = "unpaired")]
    /// Sample reads are paired (default)
    pub paired: bool,

    #[arg(short = 'u', long = "unpaired", overrides_with = "paired")]
    /// Sample reads are not paired
    pub unpaired: bool,

    #[arg(short = 't', long = "threads", default_value_t = 1)]
    /// Number of threads used to process data per sample
    pub threads: usize,

    #[arg(long = "input-suffix", default_value = "")]
    /// Suffix added to sample name in BAM filename for input
    pub input_suffix: String,

    #[arg(long = "output-suffix", default_value = "")]
    /// Suffix added to sample name in BED filename for output
    pub output_suffix: String,

    #[arg(short = 'i', long = "index")]
    /// Index of sample to process in samples file
    pub index: Option<usize>,
}
impl Bam2BedCMD {
    /// Run the commandline option
    pub fn try_execute(&mut self) -> Result<()> {
        Bam2Bed::run(
            &Bam2Bed {
                path_workdir: PathBuf::new(),
                path_samples: self.path_samples.clone(),
                index: self.index,
                paired: !self.unpaired,
                threads: self.threads,
                input_suffix: self.input_suffix.clone(),
                output_suffix: self.output_suffix.clone(),
            },
            &SystemRunner,
        )?;
        log::info!("Bam2Bed has finished succesfully");
        Ok(())
    }
}

/// Convert BAM to BED; paired reads become one fragment spanning both mates
pub struct Bam2Bed {
    pub path_workdir: PathBuf,
    pub path_samples: PathBuf,
    pub index: Option<usize>,
    pub paired: bool,
    pub threads: usize,
    pub input_suffix: String,
    pub output_suffix: String,
}
impl Bam2Bed {
    /// Run the algorithm
    pub fn run(params: &Bam2Bed, runner: &dyn Runner) -> Result<()> {
        for sample in sample_names(&params.path_samples, params.index)? {
            println!("Converting BAM to BED for sample {}", sample);
            let dir = &params.path_workdir;
            let bam = dir.join(format!("{}{}.bam", sample, params.input_suffix));
            let bed = dir.join(format!("{}{}.bed", sample, params.output_suffix));
            let result = if params.paired {
                bam_to_fragments(runner, &bam, &bed, params.threads)
            } else {
                bam_to_reads(runner, &bam, &bed)
            };
            result.with_context(|| format!("BAM to BED conversion failed on sample {}", sample))?;
        }
        Ok(())
    }
}

/// Paired reads: name sort, BEDPE with mate 1 first, then one interval per pair
pub fn bam_to_fragments(runner: &dyn Runner, bam: &Path, bed: &Path, threads: usize) -> Result<()> {
    let by_name = temp_file(".bam")?;
    bam::sort_by_readname(runner, bam, by_name.path(), threads)?;

    let bedpe = temp_file(".bedpe")?;
    let inv = Invocation::new("bedtools")
        .args(["bamtobed", "-bedpe", "-mate1", "-i"])
        .path(by_name.path());
    runner.run_to_file(&inv, bedpe.path())?;
    drop(by_name);

    let merged = temp_file(".bed")?;
    bedpe_to_bed(bedpe.path(), merged.path())?;
    bed::sort(runner, merged.path(), bed)
}

/// Unpaired reads: one interval per read
pub fn bam_to_reads(runner: &dyn Runner, bam: &Path, bed: &Path) -> Result<()> {
    let unsorted = temp_file(".bed")?;
    let inv = Invocation::new("bedtools").args(["bamtobed", "-i"]).path(bam);
    runner.run_to_file(&inv, unsorted.path())?;
    bed::sort(runner, unsorted.path(), bed)
}

/// Merge the two mates of each BEDPE line. Keeps chrom1, the outer bounds,
/// name, score and strand1, and any column after strand2
pub fn bedpe_to_bed(bedpe: &Path, bed: &Path) -> Result<()> {
    bed::map_intervals(bedpe, bed, |columns| {
        if columns.len() < 10 {
            anyhow::bail!("BEDPE line has less than 10 columns: {}", columns.join("\t"));
        }
        let start = parse_coordinate(columns, 1)?.min(parse_coordinate(columns, 4)?);
        let end = parse_coordinate(columns, 2)?.max(parse_coordinate(columns, 5)?);
        let mut out = vec![columns[0].to_string(), start.to_string(), end.to_string()];
        out.extend(columns[6..9].iter().map(|c| c.to_string()));
        out.extend(columns[10..].iter().map(|c| c.to_string()));
        Ok(Some(out))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::RecordingRunner;

    const BEDPE: &str = "\
chr1\t100\t150\tchr1\t300\t350\tr1\t60\t+\t-
chr2\t500\t550\tchr2\t420\t470\tr2\t42\t-\t+\textra
";

    #[test]
    fn test_bedpe_to_bed() {
        let dir = tempfile::tempdir().unwrap();
        let bedpe = dir.path().join("a.bedpe");
        let bed = dir.path().join("a.bed");
        std::fs::write(&bedpe, format!("track name=a\n{}", BEDPE)).unwrap();
        bedpe_to_bed(&bedpe, &bed).unwrap();
        assert_eq!(
            std::fs::read_to_string(&bed).unwrap(),
            "track name=a\nchr1\t100\t350\tr1\t60\t+\nchr2\t420\t550\tr2\t42\t-\textra\n"
        );
    }

    #[test]
    fn test_bam2bed_paired() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("samples.txt"), "POLR2A\n").unwrap();
        let runner = RecordingRunner::new().on("bedtools", |inv| {
            if inv.args[0] == "bamtobed" {
                return Ok(BEDPE.to_string());
            }
            Ok(std::fs::read_to_string(&inv.args[2])?)
        });
        let params = Bam2Bed {
            path_workdir: dir.path().to_path_buf(),
            path_samples: dir.path().join("samples.txt"),
            index: None,
            paired: true,
            threads: 2,
            input_suffix: "-dedup".to_string(),
            output_suffix: "-frag".to_string(),
        };
        Bam2Bed::run(&params, &runner).unwrap();

        let argvs = runner.argvs();
        assert_eq!(argvs.len(), 3);
        assert_eq!(argvs[0][..5], ["samtools", "sort", "-n", "--threads", "1"]);
        assert_eq!(argvs[0][7], dir.path().join("POLR2A-dedup.bam").to_string_lossy());
        assert_eq!(argvs[1][..5], ["bedtools", "bamtobed", "-bedpe", "-mate1", "-i"]);
        assert_eq!(argvs[1][5], argvs[0][6]);
        assert_eq!(argvs[2][..3], ["bedtools", "sort", "-i"]);
        let bed = std::fs::read_to_string(dir.path().join("POLR2A-frag.bed")).unwrap();
        assert_eq!(bed.lines().count(), 2);
        assert!(bed.starts_with("chr1\t100\t350\t"));
    }

    #[test]
    fn test_bam2bed_unpaired() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("samples.txt"), "POLR2A\n").unwrap();
        let runner = RecordingRunner::new();
        let params = Bam2Bed {
            path_workdir: dir.path().to_path_buf(),
            path_samples: dir.path().join("samples.txt"),
            index: Some(0),
            paired: false,
            threads: 1,
            input_suffix: String::new(),
            output_suffix: String::new(),
        };
        Bam2Bed::run(&params, &runner).unwrap();
        let argvs = runner.argvs();
        assert_eq!(argvs.len(), 2);
        assert_eq!(argvs[0][..3], ["bedtools", "bamtobed", "-i"]);
        assert_eq!(argvs[0][3], dir.path().join("POLR2A.bam").to_string_lossy());
        assert_eq!(argvs[1][..3], ["bedtools", "sort", "-i"]);
        assert!(dir.path().join("POLR2A.bed").exists());
    }
}
