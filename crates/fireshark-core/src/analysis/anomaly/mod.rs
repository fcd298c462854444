//! Audio anomaly detectors over decoded sample buffers.
//!
//! Boundary analysis needs packet structure; the spectral and click
//! detectors work on the concatenated samples of the clean packets.

use serde::{Deserialize, Serialize};

pub mod boundary;
pub mod clicks;
pub mod filter;
pub mod peaks;
pub mod spectral;

pub use boundary::{BoundaryAnalysis, BoundaryJump, PacketBoundary, analyze_boundaries};
pub use clicks::{Click, ClickAnalysis, ClickMethod, detect_clicks};
pub use spectral::{SpectralAnalysis, SpectralAnomaly, analyze_spectrum};

/// Any audio finding that can be attached to a DBC discontinuity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Anomaly {
    Boundary(BoundaryJump),
    Spectral(SpectralAnomaly),
    Click(Click),
}
