use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::{Context, Result};
use bio::io::fastq;
use clap::Args;
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::constants::{DEFAULT_PATH_SAMPLES, DEFAULT_RANDOM_READS, SUFFIX_RANDOM};
use super::sample_names;
use crate::fileformat::fastq::{count_fastq, create_gz_fastq, fastq_reader};
use crate::runtime::Error;

#[derive(Args)]
pub struct KeepRandomReadsCMD {
    #[arg(short = 's', long = "samples", default_value = DEFAULT_PATH_SAMPLES)]
    /// Sample names listed one sample name by line
    pub path_samples: PathBuf,

    #[arg(long = "count", default_value_t = DEFAULT_RANDOM_READS)]
    /// Number of reads to keep
    pub count: usize,

    #[arg(short = 'p', long = "paired", overrides_with = "unpaired")]
    /// Sample reads are paired (default)
    pub paired: bool,

    #[arg(short = 'u', long = "unpaired", overrides_with = "paired")]
    /// Sample reads are not paired
    pub unpaired: bool,

    #[arg(long = "input-suffix", default_value = "")]
    /// Suffix to add to sample name to obtain input reads FASTQ filename
    pub input_suffix: String,

    #[arg(long = "output-suffix", default_value = SUFFIX_RANDOM)]
    /// Suffix added to sample name in output FASTQ filename
    pub output_suffix: String,

    #[arg(long = "seed")]
    /// Seed for the random selection
    pub seed: Option<u64>,

    #[arg(short = 'i', long = "index")]
    /// Index of sample to process in samples file
    pub index: Option<usize>,
}
impl KeepRandomReadsCMD {
    /// Run the commandline option
    pub fn try_execute(&mut self) -> Result<()> {
        KeepRandomReads::run(&KeepRandomReads {
            path_workdir: PathBuf::new(),
            path_samples: self.path_samples.clone(),
            index: self.index,
            count: self.count,
            paired: !self.unpaired,
            input_suffix: self.input_suffix.clone(),
            output_suffix: self.output_suffix.clone(),
            seed: self.seed,
        })?;
        log::info!("KeepRandomReads has finished succesfully");
        Ok(())
    }
}

pub struct KeepRandomReads {
    pub path_workdir: PathBuf,
    pub path_samples: PathBuf,
    pub index: Option<usize>,
    pub count: usize,
    pub paired: bool,
    pub input_suffix: String,
    pub output_suffix: String,
    pub seed: Option<u64>,
}
impl KeepRandomReads {
    /// Run the algorithm. Everything happens in process, no external tool is involved
    pub fn run(params: &KeepRandomReads) -> Result<()> {
        for sample in sample_names(&params.path_samples, params.index)? {
            KeepRandomReads::run_sample(params, &sample)
                .with_context(|| format!("Could not subsample FASTQ of sample {}", sample))?;
        }
        Ok(())
    }

    fn run_sample(params: &KeepRandomReads, sample: &str) -> Result<()> {
        println!(
            "Keep {} of unpaired or paired reads from FASTQ files for sample {}",
            params.count, sample
        );
        let dir = &params.path_workdir;
        let fastq1 = dir.join(format!("{}{}_R1.fastq.gz", sample, params.input_suffix));
        let fastq2 = dir.join(format!("{}{}_R2.fastq.gz", sample, params.input_suffix));
        let output1 = dir.join(format!("{}{}_R1.fastq.gz", sample, params.output_suffix));
        let output2 = dir.join(format!("{}{}_R2.fastq.gz", sample, params.output_suffix));

        let total = count_fastq(&fastq1)?;
        let mut rng = match params.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let indexes: HashSet<usize> =
            rand::seq::index::sample(&mut rng, total, params.count.min(total))
                .into_iter()
                .collect();
        log::debug!(
            "sample = {}, in_count = {}, keeping {}",
            sample,
            total,
            indexes.len()
        );

        let mut gz1 = create_gz_fastq(&output1)?;
        if !params.paired {
            let mut writer1 = fastq::Writer::new(&mut gz1);
            for (i, record) in fastq_reader(&fastq1)?.records().enumerate() {
                let record = record.with_context(|| format!("Malformed FASTQ {:?}", fastq1))?;
                if indexes.contains(&i) {
                    writer1.write_record(&record)?;
                }
            }
            writer1.flush()?;
            drop(writer1);
            gz1.finish()?;
            return Ok(());
        }

        let mut gz2 = create_gz_fastq(&output2)?;
        let mut writer1 = fastq::Writer::new(&mut gz1);
        let mut writer2 = fastq::Writer::new(&mut gz2);
        let mut records2 = fastq_reader(&fastq2)?.records();
        for (i, record1) in fastq_reader(&fastq1)?.records().enumerate() {
            let record1 = record1.with_context(|| format!("Malformed FASTQ {:?}", fastq1))?;
            let record2 = records2
                .next()
                .transpose()
                .with_context(|| format!("Malformed FASTQ {:?}", fastq2))?
                .ok_or_else(|| {
                    Error::file_not_valid(&fastq2, Some(format!("ends before read {}", record1.id())))
                })?;
            if record1.id() != record2.id() {
                return Err(Error::file_not_valid(
                    &fastq2,
                    Some(format!(
                        "read {} does not match read {} from file {:?}",
                        record2.id(),
                        record1.id(),
                        fastq1
                    )),
                )
                .into());
            }
            if indexes.contains(&i) {
                writer1.write_record(&record1)?;
                writer2.write_record(&record2)?;
            }
        }
        writer1.flush()?;
        writer2.flush()?;
        drop(writer1);
        drop(writer2);
        gz1.finish()?;
        gz2.finish()?;
        Ok(())
    }
}
