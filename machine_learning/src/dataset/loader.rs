use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
    str::FromStr,
};

use log::debug;
use ndarray::Array1;

use super::{Features, LabeledPoint, SparseVec};
use crate::{MlErr, Result};

/// The supported text formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFormat {
    /// `label index:value ...` with 1-based feature indices.
    LibSvm,
    /// Whitespace separated feature values followed by the label.
    Tsv,
}

/// A loaded set of records together with the amount of features they were parsed with.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub points: Vec<LabeledPoint>,
    pub num_features: usize,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Loads a dataset from a file.
///
/// # Arguments
/// * `path` - The file to read.
/// * `format` - The format of its lines.
/// * `sparse` - Whether the features should be stored sparsely.
pub fn load_data<P: AsRef<Path>>(path: P, format: DataFormat, sparse: bool) -> Result<Dataset> {
    let path = path.as_ref();
    let reader = BufReader::new(File::open(path)?);

    let dataset = match format {
        DataFormat::LibSvm => load_libsvm(reader, sparse)?,
        DataFormat::Tsv => load_tsv(reader, sparse)?,
    };

    debug!(
        records = dataset.len(), features = dataset.num_features;
        "loaded {}", path.display()
    );
    Ok(dataset)
}

/// Parses LIBSVM formatted records, the amount of features is the largest index seen.
pub fn load_libsvm<R: BufRead>(reader: R, sparse: bool) -> Result<Dataset> {
    let mut rows = Vec::new();
    let mut num_features = 0;

    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        let lineno = lineno + 1;

        let content = line.split('#').next().unwrap_or_default().trim();
        if content.is_empty() {
            continue;
        }

        let mut tokens = content.split_whitespace();
        let label = tokens.next().unwrap_or_default();
        let label = parse_num::<f32>(label, lineno, "label")?;

        let entries = tokens
            .map(|token| parse_entry(token, lineno))
            .collect::<Result<Vec<_>>>()?;

        if let Some(max) = entries.iter().map(|&(i, _)| i + 1).max() {
            num_features = num_features.max(max);
        }

        rows.push((label, entries));
    }

    let points = rows
        .into_iter()
        .map(|(label, entries)| {
            let x = if sparse {
                Features::Sparse(SparseVec::new(num_features, entries)?)
            } else {
                let mut x = Array1::zeros(num_features);
                entries.into_iter().for_each(|(i, v)| x[i] += v);
                Features::Dense(x)
            };

            Ok(LabeledPoint { x, y: label })
        })
        .collect::<Result<_>>()?;

    Ok(Dataset {
        points,
        num_features,
    })
}

/// Parses whitespace separated records whose last column is the label.
pub fn load_tsv<R: BufRead>(reader: R, sparse: bool) -> Result<Dataset> {
    let mut points = Vec::new();
    let mut num_columns = None;

    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        let lineno = lineno + 1;

        if line.trim().is_empty() {
            continue;
        }

        let values = line
            .split_whitespace()
            .map(|token| parse_num::<f32>(token, lineno, "value"))
            .collect::<Result<Vec<_>>>()?;

        let expected = *num_columns.get_or_insert(values.len());
        if values.len() != expected {
            return Err(MlErr::Parse {
                line: lineno,
                reason: format!("expected {expected} columns, got {}", values.len()),
            });
        }

        let Some((&label, features)) = values.split_last() else {
            continue;
        };

        let x = if sparse {
            let entries = features.iter().copied().enumerate().collect();
            Features::Sparse(SparseVec::new(features.len(), entries)?)
        } else {
            Features::Dense(Array1::from(features.to_vec()))
        };

        points.push(LabeledPoint { x, y: label });
    }

    Ok(Dataset {
        points,
        num_features: num_columns.map_or(0, |n| n - 1),
    })
}

fn parse_entry(token: &str, line: usize) -> Result<(usize, f32)> {
    let (index, value) = token.split_once(':').ok_or_else(|| MlErr::Parse {
        line,
        reason: format!("expected index:value, got '{token}'"),
    })?;

    let index = parse_num::<usize>(index, line, "feature index")?;
    if index == 0 {
        return Err(MlErr::Parse {
            line,
            reason: "feature indices start at 1".into(),
        });
    }

    Ok((index - 1, parse_num(value, line, "feature value")?))
}

fn parse_num<T: FromStr>(token: &str, line: usize, what: &str) -> Result<T> {
    token.parse().map_err(|_| MlErr::Parse {
        line,
        reason: format!("invalid {what} '{token}'"),
    })
}
