use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use log::debug;
use regex::Regex;
use walkdir::WalkDir;

use crate::exec::{Invocation, Runner};
use crate::fileformat::temp_file;
use crate::runtime::Error;

fn open_pairs(path: &Path) -> anyhow::Result<BufReader<MultiGzDecoder<File>>> {
    let file = File::open(path).with_context(|| format!("Could not open pairs {:?}", path))?;
    Ok(BufReader::new(MultiGzDecoder::new(file)))
}

/// Strand as juicer encodes it
fn strand_code(strand: &str) -> &'static str {
    if strand == "+" {
        "0"
    } else {
        "1"
    }
}

/// One pairs record as a juicer "medium" line:
/// readname str1 chr1 pos1 frag1 str2 chr2 pos2 frag2 mapq1 mapq2
pub fn pairs_line_to_medium(line: &str) -> anyhow::Result<String> {
    let c: Vec<&str> = line.split('\t').collect();
    if c.len() < 10 {
        return Err(Error::parse_error(
            "pairs record",
            Some(format!("expected at least 10 columns: {}", line)),
        )
        .into());
    }
    Ok([
        c[0],
        strand_code(c[5]),
        c[1],
        c[2],
        "0",
        strand_code(c[6]),
        c[3],
        c[4],
        "1",
        c[8],
        c[9],
    ]
    .join("\t"))
}

/// Convert a gzipped pairs file to juicer's medium format
pub fn pairs_to_medium(pairs: &Path, medium: &Path) -> anyhow::Result<()> {
    debug!("Converting pairs {:?} to medium format {:?}", pairs, medium);
    let mut out = BufWriter::new(
        File::create(medium).with_context(|| format!("Could not create {:?}", medium))?,
    );
    for line in open_pairs(pairs)?.lines() {
        let line = line?;
        let line = line.trim_end_matches('\r');
        if line.starts_with('#') {
            continue;
        }
        writeln!(out, "{}", pairs_line_to_medium(line)?)?;
    }
    out.flush()?;
    Ok(())
}

/// Build a .hic with juicer pre at the given resolutions
pub fn pairs_to_hic(
    runner: &dyn Runner,
    pairs: &Path,
    hic: &Path,
    resolutions: &str,
    chromosome_sizes: &Path,
    juicer: &Path,
    juicer_args: &[String],
) -> anyhow::Result<()> {
    let medium = temp_file(".tsv")?;
    pairs_to_medium(pairs, medium.path())?;
    debug!("Converting medium format {:?} to HIC {:?}", medium.path(), hic);
    let inv = Invocation::new("java")
        .arg("-jar")
        .path(juicer)
        .arg("pre")
        .args(juicer_args.iter().cloned())
        .args(["-r", resolutions])
        .path(medium.path())
        .path(hic)
        .path(chromosome_sizes);
    runner.run(&inv)
}

/// Merge several pairs files: data lines are concatenated, sorted by
/// chromosome and position with sort(1), then gzipped into `output`
pub fn merge_pairs(runner: &dyn Runner, pairs: &[PathBuf], output: &Path) -> anyhow::Result<()> {
    let merged = temp_file(".tsv")?;
    debug!("Merging pairs {:?} to {:?}", pairs, merged.path());
    {
        let mut out = BufWriter::new(merged.as_file());
        for p in pairs {
            for line in open_pairs(p)?.lines() {
                let line = line?;
                if !line.starts_with('#') {
                    writeln!(out, "{}", line)?;
                }
            }
        }
        out.flush()?;
    }

    let sorted = temp_file(".tsv")?;
    let inv = Invocation::new("sort")
        .args(["-k", "2,2", "-k", "4,4", "-k", "3,3n", "-k", "5,5n", "-o"])
        .path(sorted.path())
        .path(merged.path());
    runner.run(&inv)?;

    debug!("Gzip pairs {:?} to {:?}", sorted.path(), output);
    let mut gz = GzEncoder::new(
        File::create(output).with_context(|| format!("Could not create {:?}", output))?,
        Compression::default(),
    );
    std::io::copy(&mut BufReader::new(File::open(sorted.path())?), &mut gz)?;
    gz.finish()?;
    Ok(())
}

/// Regex for a file name pattern where * and ? are wildcards
fn wildcard_regex(pattern: &str) -> anyhow::Result<Regex> {
    let mut re = String::from("^");
    for ch in pattern.chars() {
        match ch {
            '*' => re.push_str(".*"),
            '?' => re.push('.'),
            c => re.push_str(&regex::escape(&c.to_string())),
        }
    }
    re.push('$');
    Ok(Regex::new(&re)?)
}

/// First file named like `pattern` anywhere below one of the folders.
/// Folders are searched in order; within a folder the shallowest match wins,
/// ties broken by path. An empty folder is the current directory
pub fn resolve(pattern: &str, folders: &[PathBuf]) -> anyhow::Result<Option<PathBuf>> {
    let re = wildcard_regex(pattern)?;
    for folder in folders {
        let root = if folder.as_os_str().is_empty() {
            Path::new(".")
        } else {
            folder.as_path()
        };
        let mut matches: Vec<(usize, PathBuf)> = WalkDir::new(root)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| re.is_match(&e.file_name().to_string_lossy()))
            .map(|e| (e.depth(), e.into_path()))
            .collect();
        matches.sort();
        if let Some((_, path)) = matches.into_iter().next() {
            let path = if folder.as_os_str().is_empty() {
                path.strip_prefix(".").map(Path::to_path_buf).unwrap_or(path)
            } else {
                path
            };
            return Ok(Some(path));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::RecordingRunner;

    fn write_gz(path: &Path, text: &str) {
        let mut gz = GzEncoder::new(File::create(path).unwrap(), Compression::default());
        gz.write_all(text.as_bytes()).unwrap();
        gz.finish().unwrap();
    }

    #[test]
    fn test_pairs_line_to_medium() {
        let line = ".\tchrI\t1\tchrI\t62\t-\t+\tUU\t41\t41";
        assert_eq!(
            pairs_line_to_medium(line).unwrap(),
            ".\t1\tchrI\t1\t0\t0\tchrI\t62\t1\t41\t41"
        );
        assert!(pairs_line_to_medium("a\tb").is_err());
    }

    #[test]
    fn test_pairs_to_medium() {
        let dir = tempfile::tempdir().unwrap();
        let pairs = dir.path().join("a.pairs.gz");
        let medium = dir.path().join("a.tsv");
        write_gz(
            &pairs,
            "## pairs format v1.0\n#columns: readID chrom1 pos1 chrom2 pos2 strand1 strand2 pair_type mapq1 mapq2\n\
             .\tchrI\t1\tchrI\t62\t+\t-\tUU\t41\t41\n\
             .\tchrI\t5\tchrII\t100\t-\t-\tUU\t60\t3\n",
        );
        pairs_to_medium(&pairs, &medium).unwrap();
        assert_eq!(
            std::fs::read_to_string(&medium).unwrap(),
            ".\t0\tchrI\t1\t0\t1\tchrI\t62\t1\t41\t41\n.\t1\tchrI\t5\t0\t1\tchrII\t100\t1\t60\t3\n"
        );
    }

    #[test]
    fn test_pairs_to_hic() {
        let dir = tempfile::tempdir().unwrap();
        let pairs = dir.path().join("a.pairs.gz");
        write_gz(&pairs, ".\tchrI\t1\tchrI\t62\t+\t-\tUU\t41\t41\n");
        let runner = RecordingRunner::new();
        pairs_to_hic(
            &runner,
            &pairs,
            Path::new("a.hic"),
            "10000,5000",
            Path::new("sacCer3.chrom.sizes"),
            Path::new("juicer_tools.jar"),
            &["-n".to_string()],
        )
        .unwrap();
        let argv = &runner.argvs()[0];
        assert_eq!(argv[..7], ["java", "-jar", "juicer_tools.jar", "pre", "-n", "-r", "10000,5000"]);
        assert!(argv[7].ends_with(".tsv"));
        assert_eq!(argv[8..], ["a.hic", "sacCer3.chrom.sizes"]);
    }

    #[test]
    fn test_merge_pairs() {
        let dir = tempfile::tempdir().unwrap();
        let p1 = dir.path().join("a.pairs.gz");
        let p2 = dir.path().join("b.pairs.gz");
        write_gz(&p1, "#header\nr1\tchrI\t5\tchrI\t9\t+\t+\tUU\t1\t1\n");
        write_gz(&p2, "#header\nr2\tchrI\t1\tchrI\t9\t+\t+\tUU\t1\t1\n");
        let output = dir.path().join("merged.pairs.gz");

        // sort(1) stand in: reverse the lines of the merged file
        let runner = RecordingRunner::new().on("sort", |inv| {
            let n = inv.args.len();
            let text = std::fs::read_to_string(&inv.args[n - 1])?;
            let mut lines: Vec<&str> = text.lines().collect();
            lines.reverse();
            std::fs::write(&inv.args[n - 2], lines.join("\n") + "\n")?;
            Ok(String::new())
        });
        merge_pairs(&runner, &[p1, p2], &output).unwrap();

        let argv = &runner.argvs()[0];
        assert_eq!(argv[..10], ["sort", "-k", "2,2", "-k", "4,4", "-k", "3,3n", "-k", "5,5n", "-o"]);

        let mut text = String::new();
        std::io::Read::read_to_string(&mut open_pairs(&output).unwrap(), &mut text).unwrap();
        assert_eq!(
            text,
            "r2\tchrI\t1\tchrI\t9\t+\t+\tUU\t1\t1\nr1\tchrI\t5\tchrI\t9\t+\t+\tUU\t1\t1\n"
        );
    }

    #[test]
    fn test_resolve() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a");
        let b = dir.path().join("b");
        std::fs::create_dir_all(a.join("deep/er")).unwrap();
        std::fs::create_dir_all(&b).unwrap();
        std::fs::write(a.join("deep/er/S1.nodups.pairs.gz"), "").unwrap();
        std::fs::write(a.join("deep/S2.lib.nodups.pairs.gz"), "").unwrap();
        std::fs::write(b.join("S1.x.nodups.pairs.gz"), "").unwrap();

        let folders = vec![a.clone(), b.clone()];
        assert_eq!(
            resolve("S1*.nodups.pairs.gz", &folders).unwrap(),
            Some(a.join("deep/er/S1.nodups.pairs.gz"))
        );
        assert_eq!(
            resolve("S2*.nodups.pairs.gz", &folders).unwrap(),
            Some(a.join("deep/S2.lib.nodups.pairs.gz"))
        );
        assert_eq!(
            resolve("S1.x.nodups.pairs.gz", &folders).unwrap(),
            Some(b.join("S1.x.nodups.pairs.gz"))
        );
        assert_eq!(resolve("S3*.pairs.gz", &folders).unwrap(), None);
        // dots are literal
        assert_eq!(resolve("S1xnodups.pairs.gz", &folders).unwrap(), None);
    }
}
