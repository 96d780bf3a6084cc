use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("File at {:?} not found.", path)]
    FileNotFound { path: PathBuf },

    #[error("File at {:?} is invalid{}.", path, Error::format_msg_as_detail(msg))]
    FileNotValid { path: PathBuf, msg: Option<String> },

    #[error("Cannot find {} for sample {}", what, sample)]
    MissingInput { sample: String, what: String },

    #[error(
        "Utility '{}' failed on execute '{}'{}",
        utility,
        cmd,
        Error::format_msg_as_detail(msg)
    )]
    UtilityExecutionError {
        utility: String,
        cmd: String,
        msg: Option<String>,
    },

    #[error(
        "Failed trying to execute utility '{utility}'. Make sure it is in your $PATH and you have execution permissions."
    )]
    UtilityNotExecutable { utility: String },

    #[error("Invalid value for {}{}", option, Error::format_msg_as_detail(msg))]
    InvalidOption { option: String, msg: Option<String> },

    #[error("Failed parsing {}{}", context, Error::format_msg_as_detail(msg))]
    ParseError { context: String, msg: Option<String> },
}

impl Error {
    #[cold]
    pub fn file_not_found<P: AsRef<Path>>(path: P) -> Self {
        Error::FileNotFound {
            path: path.as_ref().to_path_buf(),
        }
    }

    #[cold]
    pub fn file_not_valid<P: AsRef<Path>, M: Into<String>>(path: P, msg: Option<M>) -> Self {
        Error::FileNotValid {
            path: path.as_ref().to_path_buf(),
            msg: msg.map(|m| m.into()),
        }
    }

    #[cold]
    pub fn missing_input<S: Into<String>, W: Into<String>>(sample: S, what: W) -> Self {
        Error::MissingInput {
            sample: sample.into(),
            what: what.into(),
        }
    }

    #[cold]
    pub fn utility_execution_error<U: Into<String>, C: Into<String>, M: Into<String>>(
        utility: U,
        cmd: C,
        msg: Option<M>,
    ) -> Self {
        Error::UtilityExecutionError {
            utility: utility.into(),
            cmd: cmd.into(),
            msg: msg.map(|m| m.into()),
        }
    }

    #[cold]
    pub fn utility_not_executable<U: Into<String>>(utility: U) -> Self {
        Error::UtilityNotExecutable {
            utility: utility.into(),
        }
    }

    #[cold]
    pub fn invalid_option<O: Into<String>, M: Into<String>>(option: O, msg: Option<M>) -> Self {
        Error::InvalidOption {
            option: option.into(),
            msg: msg.map(|m| m.into()),
        }
    }

    #[cold]
    pub fn parse_error<C: Into<String>, M: Into<String>>(context: C, msg: Option<M>) -> Self {
        Error::ParseError {
            context: context.into(),
            msg: msg.map(|m| m.into()),
        }
    }

    pub fn format_msg_as_detail(msg: &Option<String>) -> String {
        match msg {
            Some(m) => format!(" ({})", m),
            None => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let e = Error::utility_execution_error("samtools", "samtools sort -o a.bam b.bam", Some("exit status: 1"));
        assert_eq!(
            e.to_string(),
            "Utility 'samtools' failed on execute 'samtools sort -o a.bam b.bam' (exit status: 1)"
        );

        let e = Error::missing_input("POLR2A", "FASTQ files");
        assert_eq!(e.to_string(), "Cannot find FASTQ files for sample POLR2A");

        let e = Error::invalid_option("--output-suffix", None::<String>);
        assert_eq!(e.to_string(), "Invalid value for --output-suffix");
    }
}
