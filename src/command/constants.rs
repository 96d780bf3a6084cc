pub const DEFAULT_PATH_SAMPLES: &str = "samples.txt";
pub const DEFAULT_PATH_DATASETS: &str = "dataset.txt";
pub const DEFAULT_PATH_PROJECT: &str = "project.yml";
pub const DEFAULT_PATH_JUICER: &str = "juicer_tools.jar";
pub const DEFAULT_PATH_FASTA: &str = "sacCer3.fa";
pub const DEFAULT_PATH_CHROM_SIZES: &str = "sacCer3.chrom.sizes";
pub const DEFAULT_PATH_STATISTICS: &str = "statistics.txt";

pub const DEFAULT_RANDOM_READS: usize = 10_000_000;

pub const SUFFIX_RANDOM: &str = "-random";
pub const SUFFIX_FILTERED: &str = "-filtered";
pub const SUFFIX_DEDUP: &str = "-dedup";
pub const SUFFIX_TRIM: &str = "-trim";
pub const SUFFIX_PAIRED: &str = "-paired";
pub const SUFFIX_UNPAIRED: &str = "-unpaired";
pub const SUFFIX_COVERAGE: &str = "-cov";
pub const SUFFIX_FORCOV: &str = "-forcov";
pub const SUFFIX_READS: &str = "-reads";
pub const SUFFIX_INPUT_READS: &str = "-input-reads";
pub const SUFFIX_PARAMS: &str = "-params";
pub const SUFFIX_SIQCHIP: &str = "-siqchip";

/// Reads per million used to normalize coverage
pub const BASE_SCALE: f64 = 1_000_000.0;
