use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use super::constants::{DEFAULT_PATH_JUICER, DEFAULT_PATH_PROJECT};
use crate::exec::{Runner, SystemRunner};
use crate::fileformat::pairs::{merge_pairs, pairs_to_hic, resolve};
use crate::fileformat::{temp_file, DistillerProject};
use crate::runtime::Error;

pub const DEFAULT_PAIRS_SUFFIX: &str = "*.nodups";

#[derive(Args)]
pub struct Pairs2HicCMD {
    #[arg(short = 'p', long = "project", default_value = DEFAULT_PATH_PROJECT)]
    /// Distiller project file
    pub path_project: PathBuf,

    #[arg(short = 'j', long = "juicer", default_value = DEFAULT_PATH_JUICER)]
    /// Juicer tools jar file from Juicebox
    pub path_juicer: PathBuf,

    #[arg(long = "input-suffix", visible_alias = "is", default_value = DEFAULT_PAIRS_SUFFIX)]
    /// Suffix added to sample/group name in pairs filename for input. Stars are wildcards
    pub input_suffix: String,

    #[arg(long = "output-suffix", visible_alias = "os")]
    /// Suffix added to sample/group name in HIC filename for output
    pub output_suffix: Option<String>,

    #[arg(short = 'o', long = "output-folder")]
    /// Output folder. Defaults to current folder
    pub output_folder: Option<PathBuf>,

    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    /// Arguments passed to juicer pre
    pub juicer_args: Vec<String>,
}
impl Pairs2HicCMD {
    /// Run the commandline option
    pub fn try_execute(&mut self) -> Result<()> {
        for path in [&self.path_project, &self.path_juicer] {
            if !path.is_file() {
                return Err(Error::file_not_found(path).into());
            }
        }
        if let Some(folder) = &self.output_folder {
            if !folder.is_dir() {
                return Err(Error::file_not_found(folder).into());
            }
        }
        Pairs2Hic::run(
            &Pairs2Hic {
                path_workdir: PathBuf::new(),
                path_project: self.path_project.clone(),
                path_juicer: self.path_juicer.clone(),
                input_suffix: self.input_suffix.clone(),
                output_suffix: self.output_suffix.clone().unwrap_or_default(),
                output_folder: self.output_folder.clone(),
                juicer_args: self.juicer_args.clone(),
            },
            &SystemRunner,
        )?;
        log::info!("Pairs2Hic has finished succesfully");
        Ok(())
    }
}

/// HIC files of every library and library group of a distiller-nf project.
///
/// Pairs files are searched recursively, first next to the project file and
/// then in the working directory
pub struct Pairs2Hic {
    pub path_workdir: PathBuf,
    pub path_project: PathBuf,
    pub path_juicer: PathBuf,
    pub input_suffix: String,
    pub output_suffix: String,
    pub output_folder: Option<PathBuf>,
    pub juicer_args: Vec<String>,
}
impl Pairs2Hic {
    /// Run the algorithm
    pub fn run(params: &Pairs2Hic, runner: &dyn Runner) -> Result<()> {
        let project = DistillerProject::from_path(&params.path_project)?;
        let resolutions = project.resolutions_arg();
        let folders = params.search_folders();
        let sizes = params.chromosome_sizes(&project, &folders)?;
        let output_folder = params.output_folder.as_ref().unwrap_or(&params.path_workdir);

        for sample in project.samples() {
            let Some(pairs) = resolve(&params.pairs_pattern(&sample), &folders)? else {
                eprintln!("Could not find pairs file for sample {}", sample);
                continue;
            };
            let hic = output_folder.join(format!("{}{}.hic", sample, params.output_suffix));
            println!("Converting pairs file {:?} to HIC {:?}", pairs, hic);
            pairs_to_hic(runner, &pairs, &hic, &resolutions, &sizes, &params.path_juicer, &params.juicer_args)
                .with_context(|| format!("Could not convert pairs of sample {}", sample))?;
        }

        for (group, members) in project.groups()? {
            let mut pairs = Vec::with_capacity(members.len());
            for member in &members {
                match resolve(&params.pairs_pattern(member), &folders)? {
                    Some(p) => pairs.push(p),
                    None => {
                        eprintln!("Could not find pairs files for sample {} in group {}", member, group);
                        break;
                    }
                }
            }
            if pairs.len() != members.len() {
                continue;
            }
            let hic = output_folder.join(format!("{}{}.hic", group, params.output_suffix));
            println!("Converting pairs of group {} to HIC {:?}", group, hic);
            let merged = temp_file(".pairs.gz")?;
            merge_pairs(runner, &pairs, merged.path())
                .with_context(|| format!("Could not merge pairs of group {}", group))?;
            pairs_to_hic(runner, merged.path(), &hic, &resolutions, &sizes, &params.path_juicer, &params.juicer_args)
                .with_context(|| format!("Could not convert pairs of group {}", group))?;
        }
        log::debug!("Pairs2Hic finished all samples and groups");
        Ok(())
    }

    fn pairs_pattern(&self, name: &str) -> String {
        format!("{}{}.pairs.gz", name, self.input_suffix)
    }

    /// The project's folder, unless it is the working directory, then the working directory
    pub fn search_folders(&self) -> Vec<PathBuf> {
        let project_dir = self.path_project.parent().unwrap_or(Path::new("")).to_path_buf();
        let mut folders = Vec::new();
        if absolute(&project_dir) != absolute(&self.path_workdir) {
            folders.push(project_dir);
        }
        folders.push(self.path_workdir.clone());
        folders
    }

    /// Locate the project's chromosome sizes file. A relative folder in the
    /// project is tried first, relative to the project file
    pub fn chromosome_sizes(&self, project: &DistillerProject, folders: &[PathBuf]) -> Result<PathBuf> {
        let configured = Path::new(&project.input.genome.chrom_sizes_path);
        let file_name = configured
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut search = Vec::with_capacity(folders.len() + 1);
        if let Some(parent) = configured.parent().filter(|p| !p.as_os_str().is_empty()) {
            let project_dir = self.path_project.parent().unwrap_or(Path::new(""));
            search.push(project_dir.join(parent));
        }
        search.extend(folders.iter().cloned());
        resolve(&file_name, &search)?.ok_or_else(|| Error::file_not_found(configured).into())
    }
}

fn absolute(path: &Path) -> PathBuf {
    let path = if path.as_os_str().is_empty() { Path::new(".") } else { path };
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::RecordingRunner;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::fs::File;
    use std::io::Write;

    const PROJECT: &str = "\
input:
    raw_reads_paths:
        CJ1_MicroC_WT:
            lane1:
                - CJ1_R1.fastq.gz
        CJ2_MicroC_FACT:
            lane1:
                - CJ2_R1.fastq.gz
    library_groups:
        CJ_MicroC:
            - CJ1_MicroC_WT
            - CJ2_MicroC_FACT
    genome:
        chrom_sizes_path: sacCer3/sacCer3.chrom.sizes
bin:
    resolutions:
        - 10000
        - 1000
";

    fn write_gz(path: &Path, text: &str) {
        let mut gz = GzEncoder::new(File::create(path).unwrap(), Compression::default());
        gz.write_all(text.as_bytes()).unwrap();
        gz.finish().unwrap();
    }

    /// A project folder next to a working folder, like a distiller-nf run
    fn setup(root: &Path) -> (PathBuf, PathBuf) {
        let project_dir = root.join("project");
        let workdir = root.join("work");
        std::fs::create_dir_all(project_dir.join("sacCer3")).unwrap();
        std::fs::create_dir_all(project_dir.join("results/pairs_library/CJ1_MicroC_WT")).unwrap();
        std::fs::create_dir_all(&workdir).unwrap();
        std::fs::write(project_dir.join("project.yml"), PROJECT).unwrap();
        std::fs::write(project_dir.join("sacCer3/sacCer3.chrom.sizes"), "chrI\t230218\n").unwrap();
        write_gz(
            &project_dir.join("results/pairs_library/CJ1_MicroC_WT/CJ1_MicroC_WT.sacCer3.nodups.pairs.gz"),
            ".\tchrI\t1\tchrI\t62\t+\t-\tUU\t41\t41\n",
        );
        write_gz(
            &workdir.join("CJ2_MicroC_FACT.sacCer3.nodups.pairs.gz"),
            ".\tchrI\t1\tchrI\t56\t+\t-\tUU\t27\t27\n",
        );
        (project_dir, workdir)
    }

    fn params(project_dir: &Path, workdir: &Path) -> Pairs2Hic {
        Pairs2Hic {
            path_workdir: workdir.to_path_buf(),
            path_project: project_dir.join("project.yml"),
            path_juicer: PathBuf::from("juicer_tools.jar"),
            input_suffix: DEFAULT_PAIRS_SUFFIX.to_string(),
            output_suffix: String::new(),
            output_folder: None,
            juicer_args: vec!["-n".to_string()],
        }
    }

    #[test]
    fn test_search_folders() {
        let dir = tempfile::tempdir().unwrap();
        let (project_dir, workdir) = setup(dir.path());
        let params = params(&project_dir, &workdir);
        assert_eq!(params.search_folders(), vec![project_dir.clone(), workdir.clone()]);

        let params = Pairs2Hic {
            path_workdir: project_dir.clone(),
            ..params
        };
        assert_eq!(params.search_folders(), vec![project_dir]);
    }

    #[test]
    fn test_chromosome_sizes() {
        let dir = tempfile::tempdir().unwrap();
        let (project_dir, workdir) = setup(dir.path());
        let params = params(&project_dir, &workdir);
        let project = DistillerProject::from_path(&params.path_project).unwrap();
        assert_eq!(
            params.chromosome_sizes(&project, &params.search_folders()).unwrap(),
            project_dir.join("sacCer3/sacCer3.chrom.sizes")
        );

        std::fs::remove_file(project_dir.join("sacCer3/sacCer3.chrom.sizes")).unwrap();
        let err = params.chromosome_sizes(&project, &params.search_folders()).unwrap_err();
        assert!(matches!(err.downcast_ref::<Error>(), Some(Error::FileNotFound { .. })));
    }

    #[test]
    fn test_pairs2hic() {
        let dir = tempfile::tempdir().unwrap();
        let (project_dir, workdir) = setup(dir.path());
        let output = dir.path().join("hic");
        std::fs::create_dir_all(&output).unwrap();
        let runner = RecordingRunner::new().on("sort", |inv| {
            let n = inv.args.len();
            std::fs::copy(&inv.args[n - 1], &inv.args[n - 2])?;
            Ok(String::new())
        });
        let params = Pairs2Hic {
            output_folder: Some(output.clone()),
            output_suffix: "-hic".to_string(),
            ..params(&project_dir, &workdir)
        };
        Pairs2Hic::run(&params, &runner).unwrap();

        let argvs = runner.argvs();
        let java: Vec<&Vec<String>> = argvs.iter().filter(|a| a[0] == "java").collect();
        assert_eq!(java.len(), 3);
        let sizes = project_dir.join("sacCer3/sacCer3.chrom.sizes").to_string_lossy().into_owned();
        for (argv, name) in java.iter().zip(["CJ1_MicroC_WT", "CJ2_MicroC_FACT", "CJ_MicroC"]) {
            assert_eq!(argv[..7], ["java", "-jar", "juicer_tools.jar", "pre", "-n", "-r", "10000,1000"]);
            let hic = output.join(format!("{}-hic.hic", name)).to_string_lossy().into_owned();
            assert_eq!(argv[8..], [hic, sizes.clone()]);
        }
        assert_eq!(argvs.iter().filter(|a| a[0] == "sort").count(), 1);
    }

    #[test]
    fn test_pairs2hic_missing_member() {
        let dir = tempfile::tempdir().unwrap();
        let (project_dir, workdir) = setup(dir.path());
        std::fs::remove_file(workdir.join("CJ2_MicroC_FACT.sacCer3.nodups.pairs.gz")).unwrap();
        let runner = RecordingRunner::new();
        Pairs2Hic::run(&params(&project_dir, &workdir), &runner).unwrap();

        let argvs = runner.argvs();
        assert_eq!(argvs.len(), 1);
        let hic = workdir.join("CJ1_MicroC_WT.hic").to_string_lossy().into_owned();
        assert_eq!(argvs[0][8], hic);
    }
}
