use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use super::constants::{DEFAULT_PATH_FASTA, DEFAULT_PATH_SAMPLES};
use super::sample_names;
use crate::exec::{Invocation, Runner, SystemRunner};
use crate::fileformat::{bam, resolve_fastq, temp_file};
use crate::runtime::Error;

#[derive(Args)]
pub struct BwaCMD {
    #[arg(short = 's', long = "samples", default_value = DEFAULT_PATH_SAMPLES)]
    /// Sample names listed one sample name by line
    pub path_samples: PathBuf,

    #[arg(long = "fasta", default_value = DEFAULT_PATH_FASTA)]
    /// FASTA file used for alignment
    pub path_fasta: PathBuf,

    #[arg(short = 't', long = "threads", default_value_t = 1)]
    /// Number of threads used to process data per sample
    pub threads: usize,

    #[arg(long = "input-suffix", default_value = "")]
    /// Suffix added to sample name in FASTQ filename for input
    pub input_suffix: String,

    #[arg(long = "output-suffix", default_value = "")]
    /// Suffix added to sample name in BAM filename for output
    pub output_suffix: String,

    #[arg(short = 'i', long = "index")]
    /// Index of sample to process in samples file
    pub index: Option<usize>,

    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    /// Arguments passed to bwa mem
    pub bwa_args: Vec<String>,
}
impl BwaCMD {
    /// Run the commandline option
    pub fn try_execute(&mut self) -> Result<()> {
        if !self.path_fasta.is_file() {
            return Err(Error::file_not_found(&self.path_fasta).into());
        }
        Bwa::run(
            &Bwa {
                path_workdir: PathBuf::new(),
                path_samples: self.path_samples.clone(),
                path_fasta: self.path_fasta.clone(),
                index: self.index,
                threads: self.threads,
                input_suffix: self.input_suffix.clone(),
                output_suffix: self.output_suffix.clone(),
                bwa_args: self.bwa_args.clone(),
            },
            &SystemRunner,
        )?;
        log::info!("Bwa has finished succesfully");
        Ok(())
    }
}

pub struct Bwa {
    pub path_workdir: PathBuf,
    pub path_samples: PathBuf,
    pub path_fasta: PathBuf,
    pub index: Option<usize>,
    pub threads: usize,
    pub input_suffix: String,
    pub output_suffix: String,
    pub bwa_args: Vec<String>,
}
impl Bwa {
    /// Run the algorithm
    pub fn run(params: &Bwa, runner: &dyn Runner) -> Result<()> {
        let samples = sample_names(&params.path_samples, params.index)?;
        bwa_index_if_missing(runner, &params.path_fasta)?;
        for sample in samples {
            Bwa::run_sample(params, runner, &sample)
                .with_context(|| format!("bwa failed on sample {}", sample))?;
        }
        Ok(())
    }

    fn run_sample(params: &Bwa, runner: &dyn Runner, sample: &str) -> Result<()> {
        println!("Running BWA on sample {}", sample);
        let name = format!("{}{}", sample, params.input_suffix);
        let fastq1 = resolve_fastq(&params.path_workdir, &name, 1)
            .ok_or_else(|| Error::missing_input(&name, "FASTQ files"))?;
        let fastq2 = resolve_fastq(&params.path_workdir, &name, 2);
        let bam = params
            .path_workdir
            .join(format!("{}{}.bam", sample, params.output_suffix));

        let sam = temp_file(".sam")?;
        let inv = Invocation::new("bwa")
            .arg("mem")
            .args(params.bwa_args.iter().cloned())
            .opt("-t", (params.threads > 1).then_some(params.threads))
            .arg("-o")
            .path(sam.path())
            .path(&params.path_fasta)
            .path(&fastq1);
        let inv = match &fastq2 {
            Some(fastq2) => inv.path(fastq2),
            None => inv,
        };
        runner.run(&inv)?;
        bam::sam_to_sorted_bam(runner, sam.path(), &bam, params.threads)
    }
}

/// bwa mem needs the index files next to the FASTA; build them once
pub fn bwa_index_if_missing(runner: &dyn Runner, fasta: &Path) -> Result<()> {
    let mut bwt = fasta.as_os_str().to_owned();
    bwt.push(".bwt");
    if Path::new(&bwt).is_file() {
        return Ok(());
    }
    println!("Indexing FASTA {:?} for BWA", fasta);
    runner.run(&Invocation::new("bwa").arg("index").path(fasta))
}
