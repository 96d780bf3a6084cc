use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use super::constants::{DEFAULT_PATH_SAMPLES, SUFFIX_PAIRED, SUFFIX_TRIM, SUFFIX_UNPAIRED};
use super::sample_names;
use crate::exec::{Invocation, Runner, SystemRunner};
use crate::fileformat::resolve_fastq;
use crate::runtime::{Error, ToolConfig};

#[derive(Args)]
pub struct TrimmomaticCMD {
    #[arg(short = 's', long = "samples", default_value = DEFAULT_PATH_SAMPLES)]
    /// Sample names listed one sample name by line
    pub path_samples: PathBuf,

    #[arg(long = "input-suffix", default_value = "")]
    /// Suffix added to sample name in FASTQ filename for input
    pub input_suffix: String,

    #[arg(long = "output-suffix", default_value = SUFFIX_TRIM)]
    /// Suffix added to sample name for FASTQ output, single-end data only
    pub output_suffix: String,

    #[arg(long = "paired-suffix", default_value = SUFFIX_PAIRED)]
    /// Suffix added to sample name for paired FASTQ output, paired-end data only
    pub paired_suffix: String,

    #[arg(long = "unpaired-suffix", default_value = SUFFIX_UNPAIRED)]
    /// Suffix added to sample name for unpaired FASTQ output, paired-end data only
    pub unpaired_suffix: String,

    #[arg(long = "trimmers")]
    /// Trimmers to use, e.g. "LEADING:3 TRAILING:3"
    pub trimmers: Option<String>,

    #[arg(short = 'i', long = "index")]
    /// Index of sample to process in samples file
    pub index: Option<usize>,

    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    /// Arguments passed to trimmomatic, before the file names
    pub trim_args: Vec<String>,
}
impl TrimmomaticCMD {
    /// Run the commandline option
    pub fn try_execute(&mut self) -> Result<()> {
        Trimmomatic::run(
            &Trimmomatic {
                path_workdir: PathBuf::new(),
                path_samples: self.path_samples.clone(),
                index: self.index,
                input_suffix: self.input_suffix.clone(),
                output_suffix: self.output_suffix.clone(),
                paired_suffix: self.paired_suffix.clone(),
                unpaired_suffix: self.unpaired_suffix.clone(),
                trimmers: self.trimmers.clone(),
                trim_args: self.trim_args.clone(),
                tools: ToolConfig::from_env(),
            },
            &SystemRunner,
        )?;
        log::info!("Trimmomatic has finished succesfully");
        Ok(())
    }
}

pub struct Trimmomatic {
    pub path_workdir: PathBuf,
    pub path_samples: PathBuf,
    pub index: Option<usize>,
    pub input_suffix: String,
    pub output_suffix: String,
    pub paired_suffix: String,
    pub unpaired_suffix: String,
    pub trimmers: Option<String>,
    pub trim_args: Vec<String>,
    pub tools: ToolConfig,
}
impl Trimmomatic {
    /// Run the algorithm
    pub fn run(params: &Trimmomatic, runner: &dyn Runner) -> Result<()> {
        for sample in sample_names(&params.path_samples, params.index)? {
            Trimmomatic::run_sample(params, runner, &sample)
                .with_context(|| format!("trimmomatic failed on sample {}", sample))?;
        }
        Ok(())
    }

    fn run_sample(params: &Trimmomatic, runner: &dyn Runner, sample: &str) -> Result<()> {
        println!("Trim FASTQ files of sample {}", sample);
        let name = format!("{}{}", sample, params.input_suffix);
        let fastq1 = resolve_fastq(&params.path_workdir, &name, 1)
            .ok_or_else(|| Error::missing_input(&name, "FASTQ files"))?;
        let fastq2 = resolve_fastq(&params.path_workdir, &name, 2);
        let trimmers = params
            .trimmers
            .as_deref()
            .map(|t| fix_adapters(t, &params.path_workdir, params.tools.trimmomatic_adapters.as_deref()))
            .unwrap_or_default();

        // Output names keep whatever follows the sample name, e.g. _R1.fastq.gz
        let output = |suffix: &str, fastq: &Path| -> PathBuf {
            params
                .path_workdir
                .join(format!("{}{}{}", sample, suffix, fastq_tail(fastq, &name)))
        };

        let inv = match &fastq2 {
            Some(fastq2) => java(&params.tools)
                .arg("PE")
                .args(params.trim_args.iter().cloned())
                .path(&fastq1)
                .path(fastq2)
                .path(output(&params.paired_suffix, &fastq1))
                .path(output(&params.unpaired_suffix, &fastq1))
                .path(output(&params.paired_suffix, fastq2))
                .path(output(&params.unpaired_suffix, fastq2)),
            None => java(&params.tools)
                .arg("SE")
                .args(params.trim_args.iter().cloned())
                .path(&fastq1)
                .path(output(&params.output_suffix, &fastq1)),
        };
        runner.run(&inv.args(trimmers))
    }
}

/// java [-Xmx<mem>] -jar <trimmomatic.jar>
fn java(tools: &ToolConfig) -> Invocation {
    Invocation::new("java")
        .args(tools.java_mem.iter().map(|m| format!("-Xmx{}", m)))
        .arg("-jar")
        .arg(tools.trimmomatic_jar())
}

/// File name of a FASTQ after the sample name and input suffix
fn fastq_tail(fastq: &Path, name: &str) -> String {
    let file_name = fastq
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_default();
    file_name
        .strip_prefix(name)
        .unwrap_or(&file_name)
        .to_string()
}

/// ILLUMINACLIP adapter files are resolved in the working directory, then in the adapters folder
pub fn fix_adapters(trimmers: &str, workdir: &Path, adapters_dir: Option<&str>) -> Vec<String> {
    trimmers
        .split_whitespace()
        .map(|trimmer| {
            let Some(rest) = trimmer.strip_prefix("ILLUMINACLIP:") else {
                return trimmer.to_string();
            };
            let mut parts: Vec<String> = rest.split(':').map(String::from).collect();
            if let Some(file) = parts.first() {
                let local = workdir.join(file);
                let found = if local.exists() {
                    Some(local)
                } else {
                    adapters_dir
                        .map(|dir| Path::new(dir).join(file))
                        .filter(|c| c.exists())
                };
                if let Some(path) = found {
                    parts[0] = path.to_string_lossy().into_owned();
                }
            }
            format!("ILLUMINACLIP:{}", parts.join(":"))
        })
        .collect()
}
