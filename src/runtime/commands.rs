use std::fmt;
use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::command;
use crate::runtime::{self, Config, LogLevel, LogMode, CONFIG};

///////////////////////////////
/// Logging options shared by all binaries
#[derive(Args, Clone, Debug)]
pub struct LogArgs {
    #[arg(long = "log-level", global = true, default_value = "debug")]
    /// Log level: trace, debug, info, warn, error or off
    pub log_level: LogLevel,

    #[arg(long = "log-mode", global = true, default_value = "path")]
    /// Where the log goes: path, terminal or discard
    pub log_mode: LogMode,

    #[arg(long = "log-path", global = true, default_value = runtime::DEFAULT_LOG_PATH)]
    /// Log file, used when the log mode is path
    pub log_path: PathBuf,
}

impl LogArgs {
    /// Store the settings in the global config and install the logger
    pub fn init(&self) -> anyhow::Result<()> {
        let config = Config {
            log_level: self.log_level,
            log_mode: self.log_mode,
            log_path: self.log_path.clone(),
        };
        if CONFIG.set(config).is_err() {
            anyhow::bail!("Global config was already set");
        }
        let config = Config::get();
        runtime::setup_global_logger(config.log_level, config.log_mode, config.log_path.clone())
    }
}

///////////////////////////////
/// Subcommands of robtools
#[derive(Subcommand)]
pub enum RobtoolsCommands {
    Bam2bed(command::Bam2BedCMD),
    Bowtie2(command::Bowtie2CMD),
    Bwa(command::BwaCMD),
    Centerannotations(command::CenterAnnotationsCMD),
    Chipexoqual(command::ChipexoQualCMD),
    Distillerresolutions(command::DistillerResolutionsCMD),
    Download(command::DownloadCMD),
    Filterbam(command::FilterBamCMD),
    Genomecov(command::GenomeCovCMD),
    Keeprandomreads(command::KeepRandomReadsCMD),
    Keeprandomreadsbam(command::KeepRandomReadsBamCMD),
    Merge(command::MergeCMD),
    Pairs2hic(command::Pairs2HicCMD),
    Plot2do(command::Plot2doCMD),
    Printsample(command::PrintSampleCMD),
    Shiftannotations(command::ShiftAnnotationsCMD),
    Siqchip(command::SiqchipCMD),
    Siqchipbed(command::SiqchipBedCMD),
    Slowsplit(command::SlowSplitCMD),
    Statistics(command::StatisticsCMD),
    Trimmomatic(command::TrimmomaticCMD),
}

impl fmt::Debug for RobtoolsCommands {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cmd = match self {
            RobtoolsCommands::Bam2bed(_) => "Bam2bed",
            RobtoolsCommands::Bowtie2(_) => "Bowtie2",
            RobtoolsCommands::Bwa(_) => "Bwa",
            RobtoolsCommands::Centerannotations(_) => "Centerannotations",
            RobtoolsCommands::Chipexoqual(_) => "Chipexoqual",
            RobtoolsCommands::Distillerresolutions(_) => "Distillerresolutions",
            RobtoolsCommands::Download(_) => "Download",
            RobtoolsCommands::Filterbam(_) => "Filterbam",
            RobtoolsCommands::Genomecov(_) => "Genomecov",
            RobtoolsCommands::Keeprandomreads(_) => "Keeprandomreads",
            RobtoolsCommands::Keeprandomreadsbam(_) => "Keeprandomreadsbam",
            RobtoolsCommands::Merge(_) => "Merge",
            RobtoolsCommands::Pairs2hic(_) => "Pairs2hic",
            RobtoolsCommands::Plot2do(_) => "Plot2do",
            RobtoolsCommands::Printsample(_) => "Printsample",
            RobtoolsCommands::Shiftannotations(_) => "Shiftannotations",
            RobtoolsCommands::Siqchip(_) => "Siqchip",
            RobtoolsCommands::Siqchipbed(_) => "Siqchipbed",
            RobtoolsCommands::Slowsplit(_) => "Slowsplit",
            RobtoolsCommands::Statistics(_) => "Statistics",
            RobtoolsCommands::Trimmomatic(_) => "Trimmomatic",
        };
        write!(f, "{}", cmd)
    }
}

///////////////////////////////
/// Subcommands of mnasetools
#[derive(Subcommand)]
pub enum MnasetoolsCommands {
    Fitgaussians(command::FitGaussiansCMD),
    Fitdoublegaussian(command::FitDoubleGaussianCMD),
}

impl fmt::Debug for MnasetoolsCommands {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cmd = match self {
            MnasetoolsCommands::Fitgaussians(_) => "Fitgaussians",
            MnasetoolsCommands::Fitdoublegaussian(_) => "Fitdoublegaussian",
        };
        write!(f, "{}", cmd)
    }
}

///////////////////////////////
/// Subcommands of seqtools
#[derive(Subcommand)]
pub enum SeqtoolsCommands {
    Bam2bed(command::Bam2BedCMD),
    Genomecov(command::GenomeCovCMD),
    Download(command::DownloadCMD),
    Slowsplit(command::SlowSplitCMD),
}

impl fmt::Debug for SeqtoolsCommands {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cmd = match self {
            SeqtoolsCommands::Bam2bed(_) => "Bam2bed",
            SeqtoolsCommands::Genomecov(_) => "Genomecov",
            SeqtoolsCommands::Download(_) => "Download",
            SeqtoolsCommands::Slowsplit(_) => "Slowsplit",
        };
        write!(f, "{}", cmd)
    }
}
