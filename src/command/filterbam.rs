use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use super::constants::{DEFAULT_PATH_SAMPLES, SUFFIX_DEDUP, SUFFIX_FILTERED};
use super::sample_names;
use crate::exec::{Invocation, Runner, SystemRunner};
use crate::fileformat::{bam, temp_file};
use crate::utils::extra_threads;

#[derive(Args)]
pub struct FilterBamCMD {
    #[arg(short = 's', long = "samples", default_value = DEFAULT_PATH_SAMPLES)]
    /// Sample names listed one sample name by line
    pub path_samples: PathBuf,

    #[arg(short = 'p', long = "paired", overrides_with = "unpaired")]
    /// Sample reads are paired (default)
    pub paired: bool,

    #[arg(short = 'u', long = "unpaired", overrides_with = "paired")]
    /// Sample reads are not paired
    pub unpaired: bool,

    #[arg(short = 'd', long = "dedup", overrides_with = "no_dedup")]
    /// Remove duplicates (default)
    pub dedup: bool,

    #[arg(long = "no-dedup", overrides_with = "dedup")]
    /// Keep duplicates
    pub no_dedup: bool,

    #[arg(short = 'q', long = "quality")]
    /// Only include reads with mapping quality >= INT
    pub quality: Option<u32>,

    #[arg(short = 't', long = "threads", default_value_t = 1)]
    /// Number of threads used to process data per sample
    pub threads: usize,

    #[arg(long = "input-suffix", default_value = "")]
    /// Suffix added to sample name in BAM filename for input
    pub input_suffix: String,

    #[arg(long = "output-suffix", default_value = "")]
    /// Suffix added to sample name in BAM filename for output
    pub output_suffix: String,

    #[arg(short = 'i', long = "index")]
    /// Index of sample to process in samples file
    pub index: Option<usize>,
}
impl FilterBamCMD {
    /// Run the commandline option
    pub fn try_execute(&mut self) -> Result<()> {
        FilterBam::run(
            &FilterBam {
                path_workdir: PathBuf::new(),
                path_samples: self.path_samples.clone(),
                index: self.index,
                paired: !self.unpaired,
                dedup: !self.no_dedup,
                quality: self.quality,
                threads: self.threads,
                input_suffix: self.input_suffix.clone(),
                output_suffix: self.output_suffix.clone(),
            },
            &SystemRunner,
        )?;
        log::info!("FilterBam has finished succesfully");
        Ok(())
    }
}

/// Keep properly mapped primary alignments and optionally remove duplicates
pub struct FilterBam {
    pub path_workdir: PathBuf,
    pub path_samples: PathBuf,
    pub index: Option<usize>,
    pub paired: bool,
    pub dedup: bool,
    pub quality: Option<u32>,
    pub threads: usize,
    pub input_suffix: String,
    pub output_suffix: String,
}
impl FilterBam {
    /// Run the algorithm
    pub fn run(params: &FilterBam, runner: &dyn Runner) -> Result<()> {
        for sample in sample_names(&params.path_samples, params.index)? {
            println!("Filtering BAM for sample {}", sample);
            let dir = &params.path_workdir;
            let input = dir.join(format!("{}{}.bam", sample, params.input_suffix));
            let filtered = dir.join(format!("{}{}{}.bam", sample, params.output_suffix, SUFFIX_FILTERED));
            filter_mapped(runner, &input, &filtered, params.paired, params.quality, params.threads)
                .with_context(|| format!("Filtering failed on sample {}", sample))?;
            if params.dedup {
                let dedup = dir.join(format!("{}{}{}.bam", sample, params.output_suffix, SUFFIX_DEDUP));
                remove_duplicates(runner, &filtered, &dedup, params.threads)
                    .with_context(|| format!("Deduplication failed on sample {}", sample))?;
            }
        }
        Ok(())
    }
}

/// Drop supplementary and secondary alignments, and unmapped reads or
/// reads not mapped in a proper pair
pub fn filter_mapped(
    runner: &dyn Runner,
    input: &Path,
    output: &Path,
    paired: bool,
    quality: Option<u32>,
    threads: usize,
) -> Result<()> {
    println!("Filtering BAM {:?} to remove poorly mapped sequences", input);
    let temp = temp_file(".bam")?;
    let inv = Invocation::new("samtools")
        .args(["view", "-b", "-F", "2048", "-F", "256"])
        .args(if paired { ["-f", "2"] } else { ["-F", "4"] })
        .opt("-q", quality.filter(|q| *q > 0))
        .opt("--threads", extra_threads(threads))
        .arg("-o")
        .path(temp.path())
        .path(input);
    runner.run(&inv)?;
    bam::sort(runner, temp.path(), output, threads)
}

/// samtools fixmate and markdup need name sorted, then coordinate sorted input
pub fn remove_duplicates(runner: &dyn Runner, input: &Path, output: &Path, threads: usize) -> Result<()> {
    println!("Removing duplicated sequences from BAM {:?}", input);
    let by_name = temp_file(".bam")?;
    bam::sort_by_readname(runner, input, by_name.path(), threads)?;

    let fixmate = temp_file(".bam")?;
    let inv = Invocation::new("samtools")
        .args(["fixmate", "-m"])
        .opt("--threads", extra_threads(threads))
        .path(by_name.path())
        .path(fixmate.path());
    runner.run(&inv)?;
    drop(by_name);

    let sorted = temp_file(".bam")?;
    bam::sort(runner, fixmate.path(), sorted.path(), threads)?;
    drop(fixmate);

    let markdup = temp_file(".bam")?;
    let inv = Invocation::new("samtools")
        .args(["markdup", "-r"])
        .opt("--threads", extra_threads(threads))
        .path(sorted.path())
        .path(markdup.path());
    runner.run(&inv)?;
    drop(sorted);

    bam::sort(runner, markdup.path(), output, threads)
}
