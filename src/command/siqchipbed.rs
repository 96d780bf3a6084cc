use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use rust_htslib::bam::{self, Read};

use super::constants::{DEFAULT_PATH_SAMPLES, SUFFIX_DEDUP, SUFFIX_READS};
use super::sample_names;
use crate::exec::{Runner, SystemRunner};
use crate::fileformat::{bed, temp_file};

#[derive(Args)]
pub struct SiqchipBedCMD {
    #[arg(short = 's', long = "samples", default_value = DEFAULT_PATH_SAMPLES)]
    /// Sample names listed one sample name by line
    pub path_samples: PathBuf,

    #[arg(long = "input-suffix", default_value = SUFFIX_DEDUP)]
    /// Suffix to add to sample name to obtain input reads BAM filename
    pub input_suffix: String,

    #[arg(long = "output-suffix", default_value = SUFFIX_READS)]
    /// Suffix added to sample name in output BED filename
    pub output_suffix: String,

    #[arg(long = "unpaired", value_name = "LENGTH")]
    /// Reads are not paired; fragments get this length
    pub unpaired: Option<i64>,

    #[arg(short = 'i', long = "index")]
    /// Index of sample to process in samples file
    pub index: Option<usize>,
}
impl SiqchipBedCMD {
    /// Run the commandline option
    pub fn try_execute(&mut self) -> Result<()> {
        SiqchipBed::run(
            &SiqchipBed {
                path_workdir: PathBuf::new(),
                path_samples: self.path_samples.clone(),
                index: self.index,
                input_suffix: self.input_suffix.clone(),
                output_suffix: self.output_suffix.clone(),
                unpaired: self.unpaired,
            },
            &SystemRunner,
        )?;
        log::info!("SiqchipBed has finished succesfully");
        Ok(())
    }
}

/// Fragments of a BAM as `chrom start end length` lines for siQ-ChIP
pub struct SiqchipBed {
    pub path_workdir: PathBuf,
    pub path_samples: PathBuf,
    pub index: Option<usize>,
    pub input_suffix: String,
    pub output_suffix: String,
    pub unpaired: Option<i64>,
}
impl SiqchipBed {
    /// Run the algorithm
    pub fn run(params: &SiqchipBed, runner: &dyn Runner) -> Result<()> {
        for sample in sample_names(&params.path_samples, params.index)? {
            println!("Converting BAM to BED for siQ-ChIP for sample {}", sample);
            let dir = &params.path_workdir;
            let input = dir.join(format!("{}{}.bam", sample, params.input_suffix));
            let output = dir.join(format!("{}{}.bed", sample, params.output_suffix));
            let unsorted = temp_file(".bed")?;
            write_fragments(&input, unsorted.path(), params.unpaired)
                .with_context(|| format!("Could not read fragments of sample {}", sample))?;
            bed::sort(runner, unsorted.path(), &output)?;
        }
        Ok(())
    }
}

/// Paired, proper pair, forward with the mate reversed, first or second in template
const FLAGS_FORWARD_PAIR: [u16; 2] = [99, 163];
const FLAG_REVERSE: u16 = 0x10;
const FLAGS_NOT_PRIMARY: u16 = 0x100 | 0x800;

/// Fragment of one alignment, 1-based start. `pos` is the 0-based leftmost position.
///
/// Paired reads use only the forward mate of a proper primary pair, with its
/// template length. Unpaired reads extend `length` from the 5' end, clamped
/// at the chromosome start
pub fn fragment(pos: i64, flags: u16, template_length: i64, unpaired: Option<i64>) -> Option<(i64, i64)> {
    match unpaired {
        None => {
            if !FLAGS_FORWARD_PAIR.contains(&flags) || template_length <= 0 {
                return None;
            }
            let start = pos + 1;
            Some((start, start + template_length - 1))
        }
        Some(_) if flags & FLAGS_NOT_PRIMARY != 0 => None,
        Some(length) if flags & FLAG_REVERSE == 0 => Some((pos + 1, pos + 1 + length)),
        Some(length) => {
            let end = pos + 1;
            Some(((end - length).max(1), end))
        }
    }
}

pub fn write_fragments(bam: &Path, output: &Path, unpaired: Option<i64>) -> Result<usize> {
    let mut reader =
        bam::Reader::from_path(bam).with_context(|| format!("Could not open BAM {:?}", bam))?;
    let names: Vec<String> = reader
        .header()
        .target_names()
        .iter()
        .map(|n| String::from_utf8_lossy(n).into_owned())
        .collect();
    let mut writer = BufWriter::new(
        File::create(output).with_context(|| format!("Could not create BED {:?}", output))?,
    );
    let mut written = 0;
    let mut record = bam::Record::new();
    while let Some(r) = reader.read(&mut record) {
        r?;
        let Some(chrom) = usize::try_from(record.tid()).ok().and_then(|t| names.get(t)) else {
            continue;
        };
        if let Some((start, end)) =
            fragment(record.pos(), record.flags(), record.insert_size(), unpaired)
        {
            writeln!(writer, "{}\t{}\t{}\t{}", chrom, start, end, end - start)?;
            written += 1;
        }
    }
    writer.flush()?;
    Ok(written)
}
