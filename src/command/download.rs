use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use super::constants::DEFAULT_PATH_SAMPLES;
use crate::exec::{Invocation, Runner, SystemRunner};
use crate::fileformat::{read_columns, resolve_fastq, select_index};

#[derive(Args)]
pub struct DownloadCMD {
    #[arg(short = 's', long = "samples", default_value = DEFAULT_PATH_SAMPLES)]
    /// Sample names listed one sample name by line. An SRR id can be provided
    /// (tab separated) to download the FASTQ files, otherwise FASTQ files must be provided
    pub path_samples: PathBuf,

    #[arg(short = 't', long = "threads")]
    /// Number of threads used by fasterq-dump
    pub threads: Option<usize>,

    #[arg(short = 'i', long = "index")]
    /// Index of sample to process in samples file
    pub index: Option<usize>,
}
impl DownloadCMD {
    /// Run the commandline option
    pub fn try_execute(&mut self) -> Result<()> {
        Download::run(
            &Download {
                path_workdir: PathBuf::new(),
                path_samples: self.path_samples.clone(),
                index: self.index,
                threads: self.threads,
            },
            &SystemRunner,
        )?;
        log::info!("Download has finished succesfully");
        Ok(())
    }
}

/// Fetch reads from SRA for samples that have an SRR id and no FASTQ yet
pub struct Download {
    pub path_workdir: PathBuf,
    pub path_samples: PathBuf,
    pub index: Option<usize>,
    pub threads: Option<usize>,
}
impl Download {
    /// Run the algorithm
    pub fn run(params: &Download, runner: &dyn Runner) -> Result<()> {
        let rows = select_index(read_columns(&params.path_samples)?, params.index)?;
        for row in rows {
            let Some(sample) = row.first() else {
                continue;
            };
            let srr = row.get(1).map(|s| s.trim()).filter(|s| !s.is_empty());
            Download::run_sample(params, runner, sample, srr)
                .with_context(|| format!("Download failed for sample {}", sample))?;
        }
        Ok(())
    }

    fn run_sample(params: &Download, runner: &dyn Runner, sample: &str, srr: Option<&str>) -> Result<()> {
        let dir = &params.path_workdir;
        if resolve_fastq(dir, sample, 1).is_some() {
            log::debug!("FASTQ of sample {} already present, skipping download", sample);
            return Ok(());
        }
        let Some(srr) = srr else {
            log::warn!("No FASTQ and no SRR id for sample {}", sample);
            return Ok(());
        };
        println!("Downloading FASTQ for sample {} with SRR {}", sample, srr);
        let mut inv = Invocation::new("fasterq-dump")
            .arg("--split-files")
            .opt("--threads", params.threads)
            .arg(srr);
        if !dir.as_os_str().is_empty() {
            inv = inv.current_dir(dir);
        }
        runner.run(&inv)?;

        let srr_output1 = dir.join(format!("{}_1.fastq", srr));
        let srr_output2 = dir.join(format!("{}_2.fastq", srr));
        std::fs::rename(&srr_output1, dir.join(format!("{}_1.fastq", sample)))
            .with_context(|| format!("fasterq-dump did not produce {:?}", srr_output1))?;
        if srr_output2.is_file() {
            std::fs::rename(&srr_output2, dir.join(format!("{}_2.fastq", sample)))?;
        }
        Ok(())
    }
}
