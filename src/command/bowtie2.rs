use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use super::constants::DEFAULT_PATH_SAMPLES;
use super::sample_names;
use crate::exec::{Invocation, Runner, SystemRunner};
use crate::fileformat::{bam, resolve_fastq, temp_file};
use crate::runtime::Error;

#[derive(Args)]
pub struct Bowtie2CMD {
    #[arg(short = 's', long = "samples", default_value = DEFAULT_PATH_SAMPLES)]
    /// Sample names listed one sample name by line
    pub path_samples: PathBuf,

    #[arg(short = 'p', long = "threads", default_value_t = 1)]
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
    /// Arguments passed to bowtie2, e.g. -x sacCer3
    pub bowtie_args: Vec<String>,
}
impl Bowtie2CMD {
    /// Run the commandline option
    pub fn try_execute(&mut self) -> Result<()> {
        Bowtie2::run(
            &Bowtie2 {
                path_workdir: PathBuf::new(),
                path_samples: self.path_samples.clone(),
                index: self.index,
                threads: self.threads,
                input_suffix: self.input_suffix.clone(),
                output_suffix: self.output_suffix.clone(),
                bowtie_args: self.bowtie_args.clone(),
            },
            &SystemRunner,
        )?;
        log::info!("Bowtie2 has finished succesfully");
        Ok(())
    }
}

pub struct Bowtie2 {
    pub path_workdir: PathBuf,
    pub path_samples: PathBuf,
    pub index: Option<usize>,
    pub threads: usize,
    pub input_suffix: String,
    pub output_suffix: String,
    pub bowtie_args: Vec<String>,
}
impl Bowtie2 {
    /// Run the algorithm
    pub fn run(params: &Bowtie2, runner: &dyn Runner) -> Result<()> {
        for sample in sample_names(&params.path_samples, params.index)? {
            Bowtie2::run_sample(params, runner, &sample)
                .with_context(|| format!("bowtie2 failed on sample {}", sample))?;
        }
        Ok(())
    }

    fn run_sample(params: &Bowtie2, runner: &dyn Runner, sample: &str) -> Result<()> {
        println!("Running bowtie2 on sample {}", sample);
        let name = format!("{}{}", sample, params.input_suffix);
        let fastq1 = resolve_fastq(&params.path_workdir, &name, 1)
            .ok_or_else(|| Error::missing_input(&name, "FASTQ files"))?;
        let fastq2 = resolve_fastq(&params.path_workdir, &name, 2);
        let bam = params
            .path_workdir
            .join(format!("{}{}.bam", sample, params.output_suffix));
        run_bowtie(
            runner,
            &fastq1,
            fastq2.as_deref(),
            &bam,
            params.threads,
            &params.bowtie_args,
        )
    }
}

/// Align one or two FASTQ with bowtie2 into a sorted BAM
pub fn run_bowtie(
    runner: &dyn Runner,
    fastq1: &Path,
    fastq2: Option<&Path>,
    bam: &Path,
    threads: usize,
    bowtie_args: &[String],
) -> Result<()> {
    let sam = temp_file(".sam")?;
    let mut inv = Invocation::new("bowtie2")
        .args(bowtie_args.iter().cloned())
        .opt("-p", (threads > 1).then_some(threads))
        .arg("-S")
        .path(sam.path());
    inv = match fastq2 {
        Some(fastq2) => inv.arg("-1").path(fastq1).arg("-2").path(fastq2),
        None => inv.arg("-U").path(fastq1),
    };
    runner.run(&inv)?;
    bam::sam_to_sorted_bam(runner, sam.path(), bam, threads)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::RecordingRunner;

    fn params(dir: &Path, threads: usize, args: &[&str]) -> Bowtie2 {
        let samples = dir.join("samples.txt");
        std::fs::write(&samples, "POLR2A\nASDURF\n").unwrap();
        Bowtie2 {
            path_workdir: dir.to_path_buf(),
            path_samples: samples,
            index: Some(0),
            threads,
            input_suffix: String::new(),
            output_suffix: "-out".to_string(),
            bowtie_args: args.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_bowtie2_paired() {
        let dir = tempfile::tempdir().unwrap();
        let fq1 = dir.path().join("POLR2A_1.fastq");
        let fq2 = dir.path().join("POLR2A_2.fastq");
        std::fs::write(&fq1, "").unwrap();
        std::fs::write(&fq2, "").unwrap();

        let runner = RecordingRunner::new();
        Bowtie2::run(&params(dir.path(), 2, &["-x", "sacCer3.fa"]), &runner).unwrap();

        let argvs = runner.argvs();
        assert_eq!(argvs.len(), 3);
        let bowtie = &argvs[0];
        assert_eq!(bowtie[..6], ["bowtie2", "-x", "sacCer3.fa", "-p", "2", "-S"]);
        let sam = &bowtie[6];
        assert!(sam.ends_with(".sam"));
        assert_eq!(
            bowtie[7..],
            ["-1", fq1.to_str().unwrap(), "-2", fq2.to_str().unwrap()]
        );

        let view = &argvs[1];
        assert_eq!(view[..6], ["samtools", "view", "-b", "--threads", "1", "-o"]);
        assert_eq!(&view[7], sam);

        let sort = &argvs[2];
        let bam = dir.path().join("POLR2A-out.bam");
        assert_eq!(
            sort,
            &vec!["samtools", "sort", "--threads", "1", "-o", bam.to_str().unwrap(), view[6].as_str()]
        );
    }

    #[test]
    fn test_bowtie2_single() {
        let dir = tempfile::tempdir().unwrap();
        let fq1 = dir.path().join("POLR2A_R1.fastq.gz");
        std::fs::write(&fq1, "").unwrap();

        let runner = RecordingRunner::new();
        Bowtie2::run(&params(dir.path(), 1, &[]), &runner).unwrap();

        let bowtie = &runner.argvs()[0];
        assert_eq!(bowtie[..2], ["bowtie2", "-S"]);
        assert_eq!(bowtie[3..], ["-U", fq1.to_str().unwrap()]);
    }

    #[test]
    fn test_bowtie2_missing_fastq() {
        let dir = tempfile::tempdir().unwrap();
        let runner = RecordingRunner::new();
        let err = Bowtie2::run(&params(dir.path(), 1, &[]), &runner).unwrap_err();
        assert!(matches!(
            err.root_cause().downcast_ref::<Error>(),
            Some(Error::MissingInput { .. })
        ));
        assert!(runner.argvs().is_empty());
    }
}
