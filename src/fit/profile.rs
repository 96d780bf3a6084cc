use std::path::Path;

use anyhow::Context;
use csv::ReaderBuilder;

use crate::runtime::Error;

/// A coverage profile: positions in the first column, values in a named column
#[derive(Clone, Debug, PartialEq)]
pub struct Profile {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub y_header: String,
}

impl Profile {
    pub fn x_min(&self) -> f64 {
        self.x.iter().copied().fold(f64::INFINITY, f64::min)
    }

    pub fn x_max(&self) -> f64 {
        self.x.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    pub fn y_min(&self) -> f64 {
        self.y.iter().copied().fold(f64::INFINITY, f64::min)
    }

    pub fn y_max(&self) -> f64 {
        self.y.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }
}

/// Read a tab separated profile with a header line. Without a column name the
/// second column holds the values
pub fn read_profile(path: &Path, column: Option<&str>) -> anyhow::Result<Profile> {
    if !path.is_file() {
        return Err(Error::file_not_found(path).into());
    }
    let mut reader = ReaderBuilder::new()
        .delimiter(b'\t')
        .comment(Some(b'#'))
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Could not open {:?}", path))?;
    let headers = reader
        .headers()
        .map_err(|e| Error::file_not_valid(path, Some(e.to_string())))?
        .clone();
    let index = match column {
        Some(name) => headers.iter().position(|h| h == name).ok_or_else(|| {
            Error::file_not_valid(path, Some(format!("no column named \"{}\"", name)))
        })?,
        None if headers.len() > 1 => 1,
        None => return Err(Error::file_not_valid(path, Some("expected at least two columns")).into()),
    };

    let mut profile = Profile {
        x: Vec::new(),
        y: Vec::new(),
        y_header: headers[index].to_string(),
    };
    for (line, record) in reader.records().enumerate() {
        let record = record.map_err(|e| Error::file_not_valid(path, Some(e.to_string())))?;
        let parse = |i: usize| -> anyhow::Result<f64> {
            let value = record.get(i).unwrap_or("");
            value.trim().parse().map_err(|_| {
                Error::file_not_valid(
                    path,
                    Some(format!("value \"{}\" on data line {} is not a number", value, line + 1)),
                )
                .into()
            })
        };
        profile.x.push(parse(0)?);
        profile.y.push(parse(index)?);
    }
    if profile.x.is_empty() {
        return Err(Error::file_not_valid(path, Some("no data")).into());
    }
    Ok(profile)
}
