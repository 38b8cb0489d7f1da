use serde::{
    Deserialize,
    Serialize,
};
use std::path::Path;

use crate::errors::{
    AlignmentError,
    Result,
};

/// A single (m/z, intensity) point of a row's representative scan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpectrumPoint {
    pub mz: f64,
    pub intensity: f32,
}

impl From<(f64, f32)> for SpectrumPoint {
    fn from((mz, intensity): (f64, f32)) -> Self {
        Self { mz, intensity }
    }
}

/// An identity/annotation attached to a feature row.
///
/// Two identities are considered the same record when all their fields match,
/// which is what aligned rows use to deduplicate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeakIdentity {
    pub name: String,
    #[serde(default)]
    pub formula: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
}

impl PeakIdentity {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            formula: None,
            method: None,
        }
    }
}

/// The raw data file a feature list was detected in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sample {
    pub name: String,
}

impl Sample {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// One detected chromatographic peak group in one sample.
///
/// Retention times are in minutes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub id: u32,
    pub mz: f64,
    pub rt: f64,
    #[serde(default)]
    pub spectrum: Vec<SpectrumPoint>,
    #[serde(default)]
    pub identities: Vec<PeakIdentity>,
    #[serde(default)]
    pub preferred_identity: Option<PeakIdentity>,
}

impl FeatureRow {
    pub fn new(id: u32, mz: f64, rt: f64) -> Self {
        Self {
            id,
            mz,
            rt,
            spectrum: Vec::new(),
            identities: Vec::new(),
            preferred_identity: None,
        }
    }

    pub fn with_spectrum(mut self, spectrum: impl IntoIterator<Item = (f64, f32)>) -> Self {
        self.spectrum = spectrum.into_iter().map(SpectrumPoint::from).collect();
        self
    }

    /// Adds an identity and makes it the preferred one if none is set yet.
    pub fn with_identity(mut self, identity: PeakIdentity) -> Self {
        if self.preferred_identity.is_none() {
            self.preferred_identity = Some(identity.clone());
        }
        self.identities.push(identity);
        self
    }
}

/// All feature rows detected in a single sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureList {
    pub sample: Sample,
    pub rows: Vec<FeatureRow>,
}

impl FeatureList {
    pub fn new(sample: Sample, rows: Vec<FeatureRow>) -> Self {
        Self { sample, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path).map_err(|e| AlignmentError::Io {
            source: e,
            path: Some(path.to_path_buf()),
        })?;
        let reader = std::io::BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }
}
