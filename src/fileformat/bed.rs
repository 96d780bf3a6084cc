use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::Context;

use crate::exec::{Invocation, Runner};
use crate::fileformat::temp_file;

/// track, browser and comment lines carry no interval
pub fn is_header(line: &str) -> bool {
    line.starts_with("track") || line.starts_with("browser") || line.starts_with('#')
}

/// bedtools sort
pub fn sort(runner: &dyn Runner, input: &Path, output: &Path) -> anyhow::Result<()> {
    let inv = Invocation::new("bedtools").args(["sort", "-i"]).path(input);
    runner.run_to_file(&inv, output)
}

/// Number of intervals, header lines excluded
pub fn count_bed(path: &Path) -> anyhow::Result<usize> {
    let file = File::open(path).with_context(|| format!("Could not open BED {:?}", path))?;
    let mut count = 0;
    for line in BufReader::new(file).lines() {
        if !is_header(&line?) {
            count += 1;
        }
    }
    Ok(count)
}

/// Convert a bedGraph to bigWig. bedGraphToBigWig wants sorted input without a track line
pub fn bedgraph_to_bigwig(
    runner: &dyn Runner,
    bedgraph: &Path,
    sizes: &Path,
    bigwig: &Path,
) -> anyhow::Result<()> {
    let stripped = temp_file(".bed")?;
    {
        let input = File::open(bedgraph)
            .with_context(|| format!("Could not open bedGraph {:?}", bedgraph))?;
        let mut out = BufWriter::new(stripped.as_file());
        for line in BufReader::new(input).lines() {
            let line = line?;
            if !line.starts_with("track") {
                writeln!(out, "{}", line)?;
            }
        }
        out.flush()?;
    }
    let sorted = temp_file(".bed")?;
    sort(runner, stripped.path(), sorted.path())?;

    let inv = Invocation::new("bedGraphToBigWig")
        .path(sorted.path())
        .path(sizes)
        .path(bigwig);
    runner.run(&inv)
}

/// Rewrite every interval of a BED file, header lines copied as they are.
/// The closure gets the tab separated columns and returns the output columns, or None to drop the line
pub fn map_intervals<F>(input: &Path, output: &Path, mut f: F) -> anyhow::Result<()>
where
    F: FnMut(&[&str]) -> anyhow::Result<Option<Vec<String>>>,
{
    let reader = BufReader::new(
        File::open(input).with_context(|| format!("Could not open BED {:?}", input))?,
    );
    let mut writer = BufWriter::new(
        File::create(output).with_context(|| format!("Could not create BED {:?}", output))?,
    );
    for line in reader.lines() {
        let line = line?;
        if is_header(&line) {
            writeln!(writer, "{}", line)?;
            continue;
        }
        let columns: Vec<&str> = line.split('\t').collect();
        if let Some(out) = f(&columns)? {
            writeln!(writer, "{}", out.join("\t"))?;
        }
    }
    writer.flush()?;
    Ok(())
}

/// Integer column of a BED line
pub fn parse_coordinate(columns: &[&str], i: usize) -> anyhow::Result<i64> {
    let value = columns
        .get(i)
        .ok_or_else(|| anyhow::anyhow!("BED line has no column {}: {}", i + 1, columns.join("\t")))?;
    value
        .trim()
        .parse()
        .with_context(|| format!("Column {} is not a coordinate: {}", i + 1, value))
}
