use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use log::debug;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rust_htslib::bam::{self, Read};

use super::constants::{DEFAULT_PATH_SAMPLES, DEFAULT_RANDOM_READS, SUFFIX_RANDOM};
use super::sample_names;
use crate::exec::{Runner, SystemRunner};
use crate::fileformat::{bam as bamtools, temp_file};

#[derive(Args)]
pub struct KeepRandomReadsBamCMD {
    #[arg(short = 's', long = "samples", default_value = DEFAULT_PATH_SAMPLES)]
    /// Sample names listed one sample name by line
    pub path_samples: PathBuf,

    #[arg(long = "count", default_value_t = DEFAULT_RANDOM_READS)]
    /// Number of reads to keep; a read pair counts once
    pub count: usize,

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
    /// Suffix added to sample name to obtain input BAM filename
    pub input_suffix: String,

    #[arg(long = "output-suffix", default_value = SUFFIX_RANDOM)]
    /// Suffix added to sample name in output BAM filename
    pub output_suffix: String,

    #[arg(long = "seed")]
    /// Seed for the random selection, for reproducible output
    pub seed: Option<u64>,

    #[arg(short = 'i', long = "index")]
    /// Index of sample to process in samples file
    pub index: Option<usize>,
}
impl KeepRandomReadsBamCMD {
    /// Run the commandline option
    pub fn try_execute(&mut self) -> Result<()> {
        KeepRandomReadsBam::run(
            &KeepRandomReadsBam {
                path_workdir: PathBuf::new(),
                path_samples: self.path_samples.clone(),
                index: self.index,
                count: self.count,
                paired: !self.unpaired,
                threads: self.threads,
                input_suffix: self.input_suffix.clone(),
                output_suffix: self.output_suffix.clone(),
                seed: self.seed,
            },
            &SystemRunner,
        )?;
        log::info!("KeepRandomReadsBam has finished succesfully");
        Ok(())
    }
}

pub struct KeepRandomReadsBam {
    pub path_workdir: PathBuf,
    pub path_samples: PathBuf,
    pub index: Option<usize>,
    pub count: usize,
    pub paired: bool,
    pub threads: usize,
    pub input_suffix: String,
    pub output_suffix: String,
    pub seed: Option<u64>,
}
impl KeepRandomReadsBam {
    /// Run the algorithm
    pub fn run(params: &KeepRandomReadsBam, runner: &dyn Runner) -> Result<()> {
        for sample in sample_names(&params.path_samples, params.index)? {
            KeepRandomReadsBam::run_sample(params, runner, &sample)
                .with_context(|| format!("Could not subsample reads of sample {}", sample))?;
        }
        Ok(())
    }

    fn run_sample(params: &KeepRandomReadsBam, runner: &dyn Runner, sample: &str) -> Result<()> {
        println!(
            "Keep {} of {} reads from BAM file for sample {}",
            params.count,
            if params.paired { "paired" } else { "unpaired" },
            sample
        );
        let dir = &params.path_workdir;
        let input = dir.join(format!("{}{}.bam", sample, params.input_suffix));
        let output = dir.join(format!("{}{}.bam", sample, params.output_suffix));

        //Mates must be adjacent, so work on a name sorted copy
        let by_name = temp_file(".bam")?;
        bamtools::sort_by_readname(runner, &input, by_name.path(), params.threads)?;

        let total = count_reads(by_name.path(), params.paired)?;
        let mut rng = match params.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let keep = params.count.min(total);
        let indexes: HashSet<usize> = rand::seq::index::sample(&mut rng, total, keep)
            .into_iter()
            .collect();

        let filtered = temp_file(".bam")?;
        let written = write_selected(by_name.path(), filtered.path(), indexes, params.paired)?;
        debug!(
            "sample = {}, count = {}, in_count = {}, kept = {}, records written = {}",
            sample, params.count, total, keep, written
        );
        drop(by_name);

        bamtools::sort(runner, filtered.path(), &output, params.threads)
    }
}

fn is_primary(record: &bam::Record) -> bool {
    !record.is_secondary() && !record.is_supplementary()
}

/// Number of reads to draw from: primary alignments, one per pair in paired mode
pub fn count_reads(path: &Path, paired: bool) -> Result<usize> {
    let mut reader =
        bam::Reader::from_path(path).with_context(|| format!("Could not open BAM {:?}", path))?;
    let mut record = bam::Record::new();
    let mut n = 0;
    while let Some(r) = reader.read(&mut record) {
        r?;
        if !is_primary(&record) {
            continue;
        }
        if !paired || !record.is_paired() || record.is_first_in_template() {
            n += 1;
        }
    }
    Ok(n)
}

/// Copy the selected reads of a name sorted BAM, mates following their read.
/// Returns the number of records written
pub fn write_selected(input: &Path, output: &Path, indexes: HashSet<usize>, paired: bool) -> Result<usize> {
    let mut reader =
        bam::Reader::from_path(input).with_context(|| format!("Could not open BAM {:?}", input))?;
    let header = bam::Header::from_template(reader.header());
    let mut writer = bam::Writer::from_path(output, &header, bam::Format::Bam)
        .with_context(|| format!("Could not create BAM {:?}", output))?;

    let mut selector = ReadSelector::new(indexes, paired);
    let mut written = 0;
    let mut record = bam::Record::new();
    while let Some(r) = reader.read(&mut record) {
        r?;
        if !is_primary(&record) {
            continue;
        }
        if selector.keep(record.qname(), record.is_paired()) {
            writer.write(&record)?;
            written += 1;
        }
    }
    Ok(written)
}

///////////////////////////////
/// Replays the keep/drop decision over primary records in name order.
/// A new read name takes the next index; a paired record repeating the
/// previous name is the mate and shares its decision
pub struct ReadSelector {
    indexes: HashSet<usize>,
    paired: bool,
    next_index: usize,
    last_name: Vec<u8>,
    keep_last: bool,
}

impl ReadSelector {
    pub fn new(indexes: HashSet<usize>, paired: bool) -> ReadSelector {
        ReadSelector {
            indexes,
            paired,
            next_index: 0,
            last_name: Vec::new(),
            keep_last: false,
        }
    }

    pub fn keep(&mut self, name: &[u8], is_paired: bool) -> bool {
        if self.paired && is_paired && self.next_index > 0 && self.last_name == name {
            return self.keep_last;
        }
        self.last_name.clear();
        self.last_name.extend_from_slice(name);
        self.keep_last = self.indexes.contains(&self.next_index);
        self.next_index += 1;
        self.keep_last
    }

    /// Number of distinct reads seen so far
    pub fn reads_seen(&self) -> usize {
        self.next_index
    }
}
