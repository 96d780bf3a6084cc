use std::path::Path;

use anyhow::Context;
use csv::ReaderBuilder;

use crate::runtime::Error;

/// Rows of a tab separated list. Lines starting with # are comments
pub fn read_columns<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<Vec<String>>> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(Error::file_not_found(path).into());
    }
    let mut reader = ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .comment(Some(b'#'))
        .quoting(false)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Could not open {:?}", path))?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| Error::file_not_valid(path, Some(e.to_string())))?;
        rows.push(record.iter().map(String::from).collect());
    }
    Ok(rows)
}

/// First column of every row; for sample lists these are the sample names
pub fn read_first<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<String>> {
    Ok(read_columns(path)?
        .into_iter()
        .filter_map(|row| row.into_iter().next())
        .collect())
}

/// Restrict the rows to the one at `index`, if given
pub fn select_index<T>(mut rows: Vec<T>, index: Option<usize>) -> anyhow::Result<Vec<T>> {
    match index {
        None => Ok(rows),
        Some(i) if i < rows.len() => Ok(vec![rows.swap_remove(i)]),
        Some(i) => Err(Error::invalid_option(
            "--index",
            Some(format!("{} is out of range, the list has {} entries", i, rows.len())),
        )
        .into()),
    }
}
