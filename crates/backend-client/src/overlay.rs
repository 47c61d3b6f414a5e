//! Lane overlay inference result

use crate::RemoteInferenceError;

/// Annotated frame returned by the lane-overlay service
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayResult {
    /// Annotated JPEG image
    pub annotated_image: Vec<u8>,
    /// Number of lane-boundary indicators detected
    pub lane_indicator_count: u32,
}

impl OverlayResult {
    /// Build a result from the count header value and the response body
    pub(crate) fn from_response(
        header_name: &str,
        count_header: Option<&str>,
        body: Vec<u8>,
    ) -> Result<Self, RemoteInferenceError> {
        let raw = count_header.ok_or_else(|| {
            RemoteInferenceError::MalformedResponse(format!("missing {} header", header_name))
        })?;

        let lane_indicator_count = raw.trim().parse::<u32>().map_err(|_| {
            RemoteInferenceError::MalformedResponse(format!("invalid {} header: {:?}", header_name, raw))
        })?;

        if body.is_empty() {
            return Err(RemoteInferenceError::MalformedResponse(
                "empty overlay image".to_string(),
            ));
        }

        Ok(Self {
            annotated_image: body,
            lane_indicator_count,
        })
    }
}
