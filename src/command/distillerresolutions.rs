use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use super::constants::DEFAULT_PATH_PROJECT;
use crate::fileformat::DistillerProject;

#[derive(Args)]
pub struct DistillerResolutionsCMD {
    #[arg(short = 'p', long = "project", default_value = DEFAULT_PATH_PROJECT)]
    /// Distiller project file
    pub path_project: PathBuf,
}
impl DistillerResolutionsCMD {
    /// Run the commandline option
    pub fn try_execute(&mut self) -> Result<()> {
        let stdout = std::io::stdout();
        DistillerResolutions::run(
            &DistillerResolutions {
                path_project: self.path_project.clone(),
            },
            &mut stdout.lock(),
        )
    }
}

/// Resolutions of a distiller-nf project, one per line
pub struct DistillerResolutions {
    pub path_project: PathBuf,
}
impl DistillerResolutions {
    pub fn run<W: Write>(params: &DistillerResolutions, out: &mut W) -> Result<()> {
        let project = DistillerProject::from_path(&params.path_project)?;
        for resolution in &project.bin.resolutions {
            writeln!(out, "{}", resolution)?;
        }
        out.flush()?;
        Ok(())
    }
}
