//! Coordinate mapping between the agent's advertised resolution and the
//! physical display.
//!
//! Large displays are advertised to the agent as one of a few "safe"
//! resolutions with the same aspect ratio. Coordinates coming from the agent
//! are scaled up before they reach the pointer; coordinates read from the
//! display are scaled down before they are reported.

use serde::{Deserialize, Serialize};

use crate::error::{Result, ToolError};

/// Aspect ratio tolerance when matching a scaling target
const ASPECT_RATIO_TOLERANCE: f64 = 0.02;

/// Screen size in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.width as f64 / self.height as f64
    }
}

/// Named entry of the scaling target table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScalingTarget {
    pub name: &'static str,
    pub resolution: Resolution,
}

/// Resolutions the agent may be told about, scanned in order.
pub static SCALING_TARGETS: &[ScalingTarget] = &[
    // 4:3
    ScalingTarget { name: "XGA", resolution: Resolution::new(1024, 768) },
    // 16:10
    ScalingTarget { name: "WXGA", resolution: Resolution::new(1280, 800) },
    // ~16:9
    ScalingTarget { name: "FWXGA", resolution: Resolution::new(1366, 768) },
];

/// Converts coordinates between agent space and physical space
#[derive(Debug, Clone)]
pub struct CoordinateMapper {
    size: Resolution,
    target: Option<ScalingTarget>,
}

impl CoordinateMapper {
    /// Build a mapper for a display of `size`.
    ///
    /// The target is chosen once here; with `enabled == false` both
    /// directions are the identity.
    pub fn new(size: Resolution, targets: &'static [ScalingTarget], enabled: bool) -> Self {
        let target = if enabled { select_target(size, targets) } else { None };
        Self { size, target }
    }

    /// Configured (physical) size
    pub fn size(&self) -> Resolution {
        self.size
    }

    /// Selected scaling target, if any
    pub fn target(&self) -> Option<&ScalingTarget> {
        self.target.as_ref()
    }

    /// Size advertised to the agent
    pub fn scaled_size(&self) -> Resolution {
        let (width, height) = self.to_logical(self.size.width, self.size.height);
        Resolution { width, height }
    }

    /// Agent space to physical space (scale up).
    pub fn to_physical(&self, x: u32, y: u32) -> Result<(u32, u32)> {
        let Some((fx, fy)) = self.factors() else {
            return Ok((x, y));
        };
        if x > self.size.width || y > self.size.height {
            return Err(ToolError::OutOfBounds { x, y });
        }
        Ok((round(x as f64 / fx), round(y as f64 / fy)))
    }

    /// Physical space to agent space (scale down).
    pub fn to_logical(&self, x: u32, y: u32) -> (u32, u32) {
        match self.factors() {
            Some((fx, fy)) => (round(x as f64 * fx), round(y as f64 * fy)),
            None => (x, y),
        }
    }

    fn factors(&self) -> Option<(f64, f64)> {
        self.target.map(|t| {
            (
                t.resolution.width as f64 / self.size.width as f64,
                t.resolution.height as f64 / self.size.height as f64,
            )
        })
    }
}

/// The scan stops at the first aspect-ratio match even when that entry is
/// not smaller than `size`; in that case no target is selected.
fn select_target(size: Resolution, targets: &[ScalingTarget]) -> Option<ScalingTarget> {
    let ratio = size.aspect_ratio();
    let matched = targets
        .iter()
        .find(|t| (t.resolution.aspect_ratio() - ratio).abs() < ASPECT_RATIO_TOLERANCE)?;
    (matched.resolution.width < size.width).then_some(*matched)
}

fn round(v: f64) -> u32 {
    v.round_ties_even() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapper(width: u32, height: u32) -> CoordinateMapper {
        CoordinateMapper::new(Resolution::new(width, height), SCALING_TARGETS, true)
    }

    #[test]
    fn full_hd_selects_fwxga() {
        let m = mapper(1920, 1080);
        assert_eq!(m.target().map(|t| t.name), Some("FWXGA"));
        assert_eq!(m.scaled_size(), Resolution::new(1366, 768));
    }

    #[test]
    fn to_physical_scales_up_full_hd() {
        let m = mapper(1920, 1080);
        // 960 * 1920 / 1366 = 1349.3, 540 * 1080 / 768 = 759.4
        assert_eq!(m.to_physical(960, 540).unwrap(), (1349, 759));
        assert_eq!(m.to_physical(0, 0).unwrap(), (0, 0));
    }

    #[test]
    fn to_logical_scales_down_full_hd() {
        let m = mapper(1920, 1080);
        assert_eq!(m.to_logical(1920, 1080), (1366, 768));
        assert_eq!(m.to_logical(960, 540), (683, 384));
    }

    #[test]
    fn round_trip_within_one_pixel() {
        for (w, h) in [(1920, 1080), (2560, 1600), (2048, 1536)] {
            let m = mapper(w, h);
            assert!(m.target().is_some(), "{}x{} should scale", w, h);
            for x in (0..=w).step_by(37) {
                for y in (0..=h).step_by(41) {
                    let (px, py) = m.to_physical(x, y).unwrap();
                    let (lx, ly) = m.to_logical(px, py);
                    assert!(lx.abs_diff(x) <= 1 && ly.abs_diff(y) <= 1, "({}, {}) -> ({}, {})", x, y, lx, ly);
                }
            }
        }
    }

    #[test]
    fn disabled_scaling_is_identity() {
        let m = CoordinateMapper::new(Resolution::new(1920, 1080), SCALING_TARGETS, false);
        assert!(m.target().is_none());
        assert_eq!(m.to_physical(5000, 5000).unwrap(), (5000, 5000));
        assert_eq!(m.to_logical(1920, 1080), (1920, 1080));
    }

    // A ratio match that is not smaller stops the scan: no target at all.
    #[test]
    fn matching_ratio_without_smaller_width_selects_nothing() {
        for (w, h) in [(1024, 768), (800, 600), (1280, 800), (1280, 720)] {
            let m = mapper(w, h);
            assert!(m.target().is_none(), "{}x{} should not scale", w, h);
            assert_eq!(m.to_physical(100, 200).unwrap(), (100, 200));
            assert_eq!(m.to_logical(100, 200), (100, 200));
        }
    }

    #[test]
    fn unmatched_ratio_selects_nothing() {
        let m = mapper(2560, 1080);
        assert!(m.target().is_none());
        assert_eq!(m.scaled_size(), Resolution::new(2560, 1080));
    }

    #[test]
    fn to_physical_rejects_out_of_bounds() {
        let m = mapper(1920, 1080);
        assert!(matches!(m.to_physical(1921, 0), Err(ToolError::OutOfBounds { x: 1921, y: 0 })));
        assert!(matches!(m.to_physical(0, 1081), Err(ToolError::OutOfBounds { .. })));
        assert!(m.to_physical(1920, 1080).is_ok());
    }

    #[test]
    fn rounding_is_half_to_even() {
        assert_eq!(round(2.5), 2);
        assert_eq!(round(3.5), 4);
        assert_eq!(round(2.4), 2);
    }
}
