//! Derivations from an order routing: drilling flag and edge-banding summary
//!
//! Codes are matched by set membership: a first pass and a rework pass use
//! different operation codes for the same physical edge.

use crate::types::RoutingStep;

/// Operation codes that drill the piece
pub const DRILLING_CODES: &[&str] = &["9", "11", "13", "37"];

/// Edge-banding codes of the first width edge
pub const WIDTH_EDGE_1: &[&str] = &["7", "33"];
/// Edge-banding codes of the second width edge
pub const WIDTH_EDGE_2: &[&str] = &["8", "34"];
/// Edge-banding codes of the first length edge
pub const LENGTH_EDGE_1: &[&str] = &["5", "31"];
/// Edge-banding codes of the second length edge
pub const LENGTH_EDGE_2: &[&str] = &["6", "32"];

fn any_code_in(steps: &[RoutingStep], codes: &[&str]) -> bool {
    steps
        .iter()
        .filter_map(RoutingStep::code)
        .any(|code| codes.contains(&code))
}

/// Whether any step of the routing drills the piece
pub fn has_drilling(steps: &[RoutingStep]) -> bool {
    any_code_in(steps, DRILLING_CODES)
}

/// Banded edges of a piece, counted per dimension
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EdgeBand {
    /// Banded width edges (0, 1 or 2)
    pub width: u8,
    /// Banded length edges (0, 1 or 2)
    pub length: u8,
}

impl EdgeBand {
    /// Count the banded edges present in a routing
    pub fn from_routing(steps: &[RoutingStep]) -> Self {
        let count = |edges: [&[&str]; 2]| {
            edges
                .into_iter()
                .filter(|codes| any_code_in(steps, codes))
                .count() as u8
        };

        Self {
            width: count([WIDTH_EDGE_1, WIDTH_EDGE_2]),
            length: count([LENGTH_EDGE_1, LENGTH_EDGE_2]),
        }
    }
}

impl std::fmt::Display for EdgeBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{},BORDA", self.width, self.length)
    }
}

/// Edge-banding text of the report (`"{width},{length},BORDA"`)
///
/// An empty routing yields an empty string.
pub fn edge_band_text(steps: &[RoutingStep]) -> String {
    if steps.is_empty() {
        return String::new();
    }
    EdgeBand::from_routing(steps).to_string()
}
