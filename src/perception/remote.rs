//! Remote `Perception` backend: detection/OCR served by an out-of-process
//! model server over HTTP+JSON.
//!
//! Uses `ureq` (sync, no async runtime needed — the core's control loop is
//! single-threaded) rather than `reqwest`, since this crate carries no
//! Tokio dependency.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

use super::Perception;
use crate::controller::CapturedImage;
use crate::model::{BBox, Detection, OcrToken};

/// Hard deadline for a remote perception call, set to 2x the Waiter poll
/// interval; on expiry the call is treated as an empty detection set
/// rather than propagated as an error.
pub struct RemotePerception {
    agent: ureq::Agent,
    base_url: String,
    deadline: Duration,
}

#[derive(Serialize)]
struct DetectRequest<'a> {
    width: u32,
    height: u32,
    #[serde(with = "serde_bytes_base64")]
    image: &'a [u8],
}

#[derive(Deserialize)]
struct DetectResponse {
    detections: Vec<Detection>,
}

#[derive(Serialize)]
struct OcrRequest<'a> {
    width: u32,
    height: u32,
    roi: BBox,
    #[serde(skip_serializing_if = "Option::is_none")]
    charset_hint: Option<&'a str>,
    #[serde(with = "serde_bytes_base64")]
    image: &'a [u8],
}

#[derive(Deserialize)]
struct OcrResponse {
    tokens: Vec<OcrToken>,
}

mod serde_bytes_base64 {
    use serde::Serializer;

    pub fn serialize<S: Serializer>(bytes: &&[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&base64_encode(bytes))
    }

    fn base64_encode(bytes: &[u8]) -> String {
        const TABLE: &[u8; 64] =
            b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";
        let mut out = String::with_capacity(bytes.len().div_ceil(3) * 4);
        for chunk in bytes.chunks(3) {
            let b0 = chunk[0];
            let b1 = *chunk.get(1).unwrap_or(&0);
            let b2 = *chunk.get(2).unwrap_or(&0);
            out.push(TABLE[(b0 >> 2) as usize] as char);
            out.push(TABLE[(((b0 & 0x03) << 4) | (b1 >> 4)) as usize] as char);
            out.push(if chunk.len() > 1 {
                TABLE[(((b1 & 0x0f) << 2) | (b2 >> 6)) as usize] as char
            } else {
                '='
            });
            out.push(if chunk.len() > 2 {
                TABLE[(b2 & 0x3f) as usize] as char
            } else {
                '='
            });
        }
        out
    }
}

impl RemotePerception {
    pub fn new(base_url: impl Into<String>, waiter_interval: Duration) -> Self {
        let deadline = waiter_interval * 2;
        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(deadline))
            .build()
            .into();
        Self {
            agent,
            base_url: base_url.into(),
            deadline,
        }
    }
}

impl Perception for RemotePerception {
    fn detect(&self, frame: &CapturedImage) -> Vec<Detection> {
        let req = DetectRequest {
            width: frame.width,
            height: frame.height,
            image: &frame.bytes,
        };
        let url = format!("{}/detect", self.base_url);
        match self.agent.post(&url).send_json(&req) {
            Ok(mut response) => match response.body_mut().read_json::<DetectResponse>() {
                Ok(body) => body.detections,
                Err(error) => {
                    warn!(error = %error, "perception detect: malformed response body");
                    Vec::new()
                }
            },
            Err(error) => {
                warn!(
                    error = %error,
                    deadline_ms = self.deadline.as_millis(),
                    "perception detect: backend unreachable within deadline, treating as empty"
                );
                Vec::new()
            }
        }
    }

    fn ocr(&self, frame: &CapturedImage, roi: BBox, charset_hint: Option<&str>) -> Vec<OcrToken> {
        let req = OcrRequest {
            width: frame.width,
            height: frame.height,
            roi,
            charset_hint,
            image: &frame.bytes,
        };
        let url = format!("{}/ocr", self.base_url);
        match self.agent.post(&url).send_json(&req) {
            Ok(mut response) => match response.body_mut().read_json::<OcrResponse>() {
                Ok(body) => body.tokens,
                Err(error) => {
                    warn!(error = %error, "perception ocr: malformed response body");
                    Vec::new()
                }
            },
            Err(error) => {
                warn!(
                    error = %error,
                    deadline_ms = self.deadline.as_millis(),
                    "perception ocr: backend unreachable within deadline, treating as empty"
                );
                Vec::new()
            }
        }
    }
}
