//! Saving and loading bases, value functions and POMDPs.
//!
//! Anything serde-serializable can go through [`save`] / [`load`], as JSON
//! or bincode. [`write_alpha_file`] additionally exports a value function in
//! the plain-text alpha format read by common POMDP tooling.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use log::info;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::value_function::ValueFunction;

/// On-disk encoding
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Format {
    #[default]
    Json,
    Bincode,
}

impl Format {
    /// Guess from a file extension: `.json` is JSON, anything else bincode
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        match path.as_ref().extension().and_then(|ext| ext.to_str()) {
            Some("json") => Format::Json,
            _ => Format::Bincode,
        }
    }
}

pub fn save<T: Serialize, P: AsRef<Path>>(value: &T, path: P, format: Format) -> Result<()> {
    let path = path.as_ref();
    let mut writer = BufWriter::new(File::create(path)?);
    match format {
        Format::Json => serde_json::to_writer_pretty(&mut writer, value)?,
        Format::Bincode => bincode::serialize_into(&mut writer, value)?,
    }
    writer.flush()?;
    info!("saved {:?} to {}", format, path.display());
    Ok(())
}

pub fn load<T: DeserializeOwned, P: AsRef<Path>>(path: P, format: Format) -> Result<T> {
    let path = path.as_ref();
    let reader = BufReader::new(File::open(path)?);
    let value = match format {
        Format::Json => serde_json::from_reader(reader)?,
        Format::Bincode => bincode::deserialize_from(reader)?,
    };
    info!("loaded {:?} from {}", format, path.display());
    Ok(value)
}

/// Write `value_function` as alternating action and coefficient lines, each
/// pair followed by a blank line. The sentinel action is written as `-1`.
pub fn write_alpha_file<P: AsRef<Path>>(value_function: &ValueFunction, path: P) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path.as_ref())?);
    for alpha in value_function.alphas() {
        match alpha.action {
            Some(action) => writeln!(writer, "{}", action)?,
            None => writeln!(writer, "-1")?,
        }
        let coefficients: Vec<String> = alpha.vector.iter().map(|x| format!("{:.16}", x)).collect();
        writeln!(writer, "{}", coefficients.join(" "))?;
        writeln!(writer)?;
    }
    writer.flush()?;
    Ok(())
}
