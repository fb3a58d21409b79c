//! Binary selection vectors and the submission artifact.

use crate::error::ConfigError;
#[cfg(feature = "serde")]
use crate::error::QuboError;
#[cfg(feature = "serde")]
use std::path::Path;

/// A binary selection over the asset universe: `x[i] == 1` iff asset `i`
/// is in the portfolio.
///
/// The length is fixed at construction. The optimizer only ever changes a
/// selection through swaps, so its cardinality never changes during a run.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "Vec<u8>", into = "Vec<u8>")
)]
pub struct Selection {
    bits: Vec<u8>,
}

impl Selection {
    /// An all-zero selection of length `n`.
    pub fn zeros(n: usize) -> Self {
        Self { bits: vec![0; n] }
    }

    /// Builds a selection of length `n` with ones at `indices`.
    ///
    /// # Panics
    ///
    /// Panics if an index is `>= n`.
    pub fn from_indices(n: usize, indices: &[usize]) -> Self {
        let mut bits = vec![0; n];
        for &i in indices {
            bits[i] = 1;
        }
        Self { bits }
    }

    /// Wraps a 0/1 vector. Returns `None` if any entry is not 0 or 1.
    pub fn from_bits(bits: Vec<u8>) -> Option<Self> {
        Self::try_from(bits).ok()
    }

    /// Universe size N.
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Number of selected assets, `sum(x)`.
    pub fn cardinality(&self) -> usize {
        self.bits.iter().filter(|&&b| b == 1).count()
    }

    pub fn is_selected(&self, i: usize) -> bool {
        self.bits[i] == 1
    }

    /// Indices with `x[i] == 1`, ascending.
    pub fn selected_indices(&self) -> Vec<usize> {
        self.bits
            .iter()
            .enumerate()
            .filter_map(|(i, &b)| (b == 1).then_some(i))
            .collect()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bits
    }

    /// The selection as a string of `'0'`/`'1'` characters.
    pub fn to_bit_string(&self) -> String {
        self.bits
            .iter()
            .map(|&b| if b == 1 { '1' } else { '0' })
            .collect()
    }

    pub(crate) fn set(&mut self, i: usize, on: bool) {
        self.bits[i] = u8::from(on);
    }
}

impl TryFrom<Vec<u8>> for Selection {
    type Error = ConfigError;

    fn try_from(bits: Vec<u8>) -> Result<Self, Self::Error> {
        match bits.iter().position(|&b| b > 1) {
            Some(index) => Err(ConfigError::NonBinarySelection {
                index,
                value: bits[index],
            }),
            None => Ok(Self { bits }),
        }
    }
}

impl From<Selection> for Vec<u8> {
    fn from(x: Selection) -> Self {
        x.bits
    }
}

/// The optimizer's output artifact: the best selection found.
///
/// Serialized as `{"x": [0, 1, ...]}`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Submission {
    pub x: Selection,
}

impl Submission {
    pub fn new(x: Selection) -> Self {
        Self { x }
    }

    /// Bit-string form of `x`.
    pub fn bit_string(&self) -> String {
        self.x.to_bit_string()
    }

    /// Pretty JSON with 2-space indentation.
    #[cfg(feature = "serde")]
    pub fn to_json_string(&self) -> Result<String, QuboError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Writes the submission JSON, creating parent directories as needed.
    #[cfg(feature = "serde")]
    pub fn write_to_path<P: AsRef<Path>>(&self, path: P) -> Result<(), QuboError> {
        let path = path.as_ref();
        let io_err = |source| QuboError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        std::fs::write(path, self.to_json_string()?).map_err(io_err)
    }
}

impl From<Selection> for Submission {
    fn from(x: Selection) -> Self {
        Self::new(x)
    }
}
