use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use itertools::Itertools;

use super::constants::{DEFAULT_PATH_DATASETS, DEFAULT_PATH_SAMPLES, DEFAULT_PATH_STATISTICS, SUFFIX_FILTERED};
use crate::exec::{Runner, SystemRunner};
use crate::fileformat::bam::flagstat_total;
use crate::fileformat::bed::{self, parse_coordinate};
use crate::fileformat::{read_first, splits};

pub const HEADERS: [&str; 4] = ["Sample", "Total reads", "Mapped reads", "Deduplicated reads"];
pub const FRAGMENT_HEADERS: [&str; 2] = ["Fragments average size", "Fragments size std"];

#[derive(Args)]
pub struct StatisticsCMD {
    #[arg(short = 's', long = "samples", default_value = DEFAULT_PATH_SAMPLES)]
    /// Sample names listed one sample name by line
    pub path_samples: PathBuf,

    #[arg(short = 'd', long = "datasets", default_value = DEFAULT_PATH_DATASETS)]
    /// Dataset name in first column and sample names on following columns, tab delimited
    pub path_datasets: PathBuf,

    #[arg(long = "bam-suffix", visible_alias = "bs", default_value = "")]
    /// Suffix added to sample name for BAM containing low quality reads and duplicates
    pub bam_suffix: String,

    #[arg(long = "filtered-suffix", visible_alias = "fs", default_value = SUFFIX_FILTERED)]
    /// Suffix added to sample name for BAM without low quality reads but with duplicates
    pub filtered_suffix: String,

    #[arg(long = "fragment-suffix", visible_alias = "es", default_value = "")]
    /// Suffix added to sample name for BED containing all fragments
    pub fragment_suffix: String,

    #[arg(long = "fragments", overrides_with = "no_fragments")]
    /// Compute fragments statistics
    pub fragments: bool,

    #[arg(long = "no-fragments")]
    /// Do not compute fragments statistics
    pub no_fragments: bool,

    #[arg(short = 'o', long = "output", default_value = DEFAULT_PATH_STATISTICS)]
    /// Output file were statistics are written
    pub path_output: PathBuf,
}
impl StatisticsCMD {
    /// Run the commandline option
    pub fn try_execute(&mut self) -> Result<()> {
        Statistics::run(
            &Statistics {
                path_workdir: PathBuf::new(),
                path_samples: self.path_samples.clone(),
                path_datasets: self.path_datasets.clone(),
                bam_suffix: self.bam_suffix.clone(),
                filtered_suffix: self.filtered_suffix.clone(),
                fragment_suffix: self.fragment_suffix.clone(),
                fragments: self.fragments,
                path_output: self.path_output.clone(),
            },
            &SystemRunner,
        )?;
        log::info!("Statistics has finished succesfully");
        Ok(())
    }
}

/// One table with read counts of every sample and dataset
pub struct Statistics {
    pub path_workdir: PathBuf,
    pub path_samples: PathBuf,
    pub path_datasets: PathBuf,
    pub bam_suffix: String,
    pub filtered_suffix: String,
    pub fragment_suffix: String,
    pub fragments: bool,
    pub path_output: PathBuf,
}
impl Statistics {
    /// Run the algorithm
    pub fn run(params: &Statistics, runner: &dyn Runner) -> Result<()> {
        let mut names = read_first(&params.path_samples)?;
        if params.path_datasets.is_file() {
            names.extend(read_first(&params.path_datasets)?);
        } else {
            log::debug!("No datasets file {:?}", params.path_datasets);
        }

        let split_labels = split_labels(&params.path_workdir, &names, &params.fragment_suffix)?;
        let mut headers: Vec<String> = HEADERS.iter().map(|h| h.to_string()).collect();
        if params.fragments {
            headers.extend(FRAGMENT_HEADERS.iter().map(|h| h.to_string()));
        }
        headers.extend(split_labels.iter().cloned());

        let out = File::create(&params.path_output)
            .with_context(|| format!("Could not create {:?}", params.path_output))?;
        let mut out = BufWriter::new(out);
        writeln!(out, "{}", headers.join("\t"))?;
        for name in &names {
            let row = params
                .sample_statistics(runner, name, &split_labels)
                .with_context(|| format!("Could not compute statistics of {}", name))?;
            writeln!(out, "{}", row.join("\t"))?;
        }
        out.flush()?;
        Ok(())
    }

    /// Cells of one row; missing files give empty cells
    pub fn sample_statistics(&self, runner: &dyn Runner, sample: &str, split_labels: &[String]) -> Result<Vec<String>> {
        println!("Computing statistics for sample {}", sample);
        let dir = &self.path_workdir;
        let mut row = vec![sample.to_string()];

        for suffix in [&self.bam_suffix, &self.filtered_suffix] {
            let bam = dir.join(format!("{}{}.bam", sample, suffix));
            row.push(if bam.is_file() {
                flagstat_total(runner, &bam)?.to_string()
            } else {
                String::new()
            });
        }

        let bed = dir.join(format!("{}{}.bed", sample, self.fragment_suffix));
        let has_bed = bed.is_file();
        row.push(if has_bed {
            (bed::count_bed(&bed)? * 2).to_string()
        } else {
            String::new()
        });
        if self.fragments {
            let (mean, std) = if has_bed {
                mean_std(&fragment_sizes(&bed)?)
            } else {
                (None, None)
            };
            row.push(mean.map(|m| m.to_string()).unwrap_or_default());
            row.push(std.map(|s| s.to_string()).unwrap_or_default());
        }

        for label in split_labels {
            let split_bed = dir.join(format!("{}{}-{}.bed", sample, self.fragment_suffix, label));
            row.push(if split_bed.is_file() {
                bed::count_bed(&split_bed)?.to_string()
            } else {
                String::new()
            });
        }
        Ok(row)
    }
}

/// Union of the `<min>-<max>` labels of all splits, ordered by bin
pub fn split_labels(dir: &Path, names: &[String], fragment_suffix: &str) -> Result<Vec<String>> {
    let mut bins = BTreeSet::new();
    for name in names {
        let base = format!("{}{}", name, fragment_suffix);
        for split in splits(dir, &base)? {
            bins.insert((split.min_length, split.max_length));
        }
    }
    Ok(bins
        .into_iter()
        .map(|(min, max)| format!("{}-{}", min, max))
        .collect())
}

/// Absolute length of every interval
pub fn fragment_sizes(bed: &Path) -> Result<Vec<i64>> {
    let file = File::open(bed).with_context(|| format!("Could not open BED {:?}", bed))?;
    let mut sizes = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line?;
        if bed::is_header(&line) || line.trim().is_empty() {
            continue;
        }
        let columns = line.split('\t').collect_vec();
        sizes.push((parse_coordinate(&columns, 2)? - parse_coordinate(&columns, 1)?).abs());
    }
    Ok(sizes)
}

/// Mean and sample standard deviation
pub fn mean_std(values: &[i64]) -> (Option<f64>, Option<f64>) {
    if values.is_empty() {
        return (None, None);
    }
    let n = values.len() as f64;
    let mean = values.iter().map(|v| *v as f64).sum::<f64>() / n;
    if values.len() < 2 {
        return (Some(mean), None);
    }
    let var = values.iter().map(|v| (*v as f64 - mean).powi(2)).sum::<f64>() / (n - 1.0);
    (Some(mean), Some(var.sqrt()))
}
