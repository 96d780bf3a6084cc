use std::fs::File;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;
use serde_yaml::{Mapping, Value};

use crate::runtime::Error;

///////////////////////////////
/// The parts of a distiller-nf project.yml used here
#[derive(Debug, Deserialize)]
pub struct DistillerProject {
    pub input: ProjectInput,
    pub bin: ProjectBin,
}

#[derive(Debug, Deserialize)]
pub struct ProjectInput {
    pub raw_reads_paths: Mapping,
    #[serde(default)]
    pub library_groups: Option<Mapping>,
    pub genome: ProjectGenome,
}

#[derive(Debug, Deserialize)]
pub struct ProjectGenome {
    pub chrom_sizes_path: String,
}

#[derive(Debug, Deserialize)]
pub struct ProjectBin {
    pub resolutions: Vec<u64>,
}

impl DistillerProject {
    pub fn from_path(path: &Path) -> anyhow::Result<DistillerProject> {
        let file = File::open(path).with_context(|| format!("Could not open project {:?}", path))?;
        serde_yaml::from_reader(file)
            .map_err(|e| Error::file_not_valid(path, Some(e.to_string())).into())
    }

    /// Library names, in file order
    pub fn samples(&self) -> Vec<String> {
        self.input.raw_reads_paths.keys().map(value_to_string).collect()
    }

    /// Library groups with their member libraries, in file order
    pub fn groups(&self) -> anyhow::Result<Vec<(String, Vec<String>)>> {
        let Some(groups) = &self.input.library_groups else {
            return Ok(Vec::new());
        };
        let mut out = Vec::with_capacity(groups.len());
        for (name, members) in groups {
            let name = value_to_string(name);
            let members = members
                .as_sequence()
                .ok_or_else(|| {
                    Error::parse_error(
                        format!("library group {}", name),
                        Some("expected a list of libraries"),
                    )
                })?
                .iter()
                .map(value_to_string)
                .collect();
            out.push((name, members));
        }
        Ok(out)
    }

    /// Resolutions joined the way juicer pre takes them
    pub fn resolutions_arg(&self) -> String {
        self.bin
            .resolutions
            .iter()
            .map(|r| r.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }
}

fn value_to_string(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub const PROJECT: &str = "\
input:
    raw_reads_paths:
        MUS81_1:
            lane1:
                - MUS81_1_R1.fastq.gz
                - MUS81_1_R2.fastq.gz
        MUS81_2:
            lane1:
                - MUS81_2_R1.fastq.gz
                - MUS81_2_R2.fastq.gz
    library_groups:
        MUS81:
            - MUS81_1
            - MUS81_2
    genome:
        assembly_name: sacCer3
        chrom_sizes_path: genome/sacCer3.chrom.sizes
bin:
    resolutions:
        - 10000
        - 5000
        - 2000
";

    #[test]
    fn test_parse_project() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("project.yml");
        std::fs::write(&path, PROJECT).unwrap();
        let project = DistillerProject::from_path(&path).unwrap();
        assert_eq!(project.samples(), vec!["MUS81_1", "MUS81_2"]);
        assert_eq!(
            project.groups().unwrap(),
            vec![("MUS81".to_string(), vec!["MUS81_1".to_string(), "MUS81_2".to_string()])]
        );
        assert_eq!(project.bin.resolutions, vec![10000, 5000, 2000]);
        assert_eq!(project.resolutions_arg(), "10000,5000,2000");
        assert_eq!(project.input.genome.chrom_sizes_path, "genome/sacCer3.chrom.sizes");
    }

    #[test]
    fn test_invalid_project() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("project.yml");
        std::fs::write(&path, "input:\n  raw_reads_paths: [\n").unwrap();
        let err = DistillerProject::from_path(&path).unwrap_err();
        assert!(matches!(err.downcast_ref::<Error>(), Some(Error::FileNotValid { .. })));
    }
}
