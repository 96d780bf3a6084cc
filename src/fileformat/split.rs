use std::path::Path;

use anyhow::Context;
use regex::Regex;

///////////////////////////////
/// A length bin of a sample's BED, as written by slowsplit: <sample>-<min>-<max>.bed
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Split {
    pub name: String,
    pub min_length: u64,
    pub max_length: u64,
}

impl Split {
    pub fn new(sample: &str, min_length: u64, max_length: u64) -> Split {
        Split {
            name: format!("{}-{}-{}", sample, min_length, max_length),
            min_length,
            max_length,
        }
    }
}

/// Splits of `sample` present in `dir`, ordered by their minimum length
pub fn splits(dir: &Path, sample: &str) -> anyhow::Result<Vec<Split>> {
    let re = Regex::new(&format!(r"^{}-(\d+)-(\d+)\.bed$", regex::escape(sample)))?;
    let root = if dir.as_os_str().is_empty() {
        Path::new(".")
    } else {
        dir
    };
    let mut found = Vec::new();
    for entry in std::fs::read_dir(root).with_context(|| format!("Could not list {:?}", root))? {
        let entry = entry?;
        let file_name = entry.file_name();
        let file_name = file_name.to_string_lossy();
        if let Some(caps) = re.captures(&file_name) {
            let (Ok(min), Ok(max)) = (caps[1].parse(), caps[2].parse()) else {
                continue;
            };
            found.push(Split::new(sample, min, max));
        }
    }
    found.sort_by_key(|s| (s.min_length, s.max_length));
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_splits() {
        let dir = tempfile::tempdir().unwrap();
        for f in [
            "POLR2A-120-140.bed",
            "POLR2A-100-110.bed",
            "POLR2A-110-120.bed",
            "POLR2A.bed",
            "POLR2A-cov.bed",
            "POLR2A-100-110.bw",
            "POLR2AB-100-110.bed",
        ] {
            std::fs::write(dir.path().join(f), "").unwrap();
        }
        let names: Vec<String> = splits(dir.path(), "POLR2A")
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["POLR2A-100-110", "POLR2A-110-120", "POLR2A-120-140"]);
    }
}
