//! Depth inference result

use crate::RemoteInferenceError;
use ndarray::Array2;
use serde::Deserialize;

/// Wire shape of the depth endpoint
#[derive(Debug, Deserialize)]
pub(crate) struct DepthPayload {
    pub depth: Vec<Vec<f32>>,
}

/// Per-pixel distance grid (rows x cols)
#[derive(Debug, Clone, PartialEq)]
pub struct DepthResult {
    pub grid: Array2<f32>,
}

impl DepthResult {
    pub fn new(grid: Array2<f32>) -> Self {
        Self { grid }
    }

    /// Build from row vectors; rows must all have the same length
    pub fn from_rows(rows: Vec<Vec<f32>>) -> Result<Self, RemoteInferenceError> {
        let height = rows.len();
        let width = rows.first().map(Vec::len).unwrap_or(0);

        if let Some(bad) = rows.iter().position(|row| row.len() != width) {
            return Err(RemoteInferenceError::MalformedResponse(format!(
                "depth row {} has {} values, expected {}",
                bad,
                rows[bad].len(),
                width
            )));
        }

        let flat: Vec<f32> = rows.into_iter().flatten().collect();
        let grid = Array2::from_shape_vec((height, width), flat)
            .map_err(|e| RemoteInferenceError::MalformedResponse(e.to_string()))?;

        Ok(Self { grid })
    }

    /// Parse the JSON body of the depth endpoint
    pub(crate) fn from_json(body: &[u8]) -> Result<Self, RemoteInferenceError> {
        let payload: DepthPayload = serde_json::from_slice(body)
            .map_err(|e| RemoteInferenceError::MalformedResponse(e.to_string()))?;
        Self::from_rows(payload.depth)
    }

    pub fn rows(&self) -> usize {
        self.grid.nrows()
    }

    pub fn cols(&self) -> usize {
        self.grid.ncols()
    }
}
