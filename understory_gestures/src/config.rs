// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Platform metrics shared by all recognizers.
//!
//! [`TouchConfig`] is the single table of distances and timeouts the
//! per-recognizer configs are seeded from. Build one per surface (scaled for
//! its pixel density) and pass it to each `from_touch_config` constructor, or
//! rely on the `Default` impls, which use [`TouchConfig::default`].

/// Distances (in surface pixels) and durations (in milliseconds) used to
/// classify pointer motion.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TouchConfig {
    /// Distance a contact may wander before it counts as a drag.
    pub touch_slop: f64,
    /// Maximum distance between successive taps of a multi-tap.
    pub double_tap_slop: f64,
    /// Delay before a lifted finger stops counting toward a multi-finger tap.
    pub tap_timeout: u64,
    /// Maximum time between the taps of a multi-tap.
    pub double_tap_timeout: u64,
    /// Hold duration that turns a press into a long press.
    pub long_press_timeout: u64,
    /// Extra slack added to deferred failure deadlines.
    pub timeout_delay: u64,
    /// Minimum speed, in pixels per second, of a fling.
    pub minimum_fling_velocity: f64,
    /// Speed, in pixels per second, velocities are clamped to.
    pub maximum_fling_velocity: f64,
    /// Smallest span at which a pinch may begin.
    pub minimum_scaling_span: f64,
    /// Width of the band along a surface edge where an edge pan may start.
    pub screen_edge_limit: f64,
}

impl TouchConfig {
    /// Metrics for a surface at 1 pixel per density-independent unit.
    pub const DEFAULT: Self = Self {
        touch_slop: 8.0,
        double_tap_slop: 100.0,
        tap_timeout: 100,
        double_tap_timeout: 300,
        long_press_timeout: 500,
        timeout_delay: 5,
        minimum_fling_velocity: 50.0,
        maximum_fling_velocity: 8000.0,
        minimum_scaling_span: 32.0,
        screen_edge_limit: 20.0,
    };

    /// Scale the distance and velocity metrics by `factor` (pixels per unit).
    ///
    /// Durations are left unchanged.
    #[must_use]
    pub fn scaled(self, factor: f64) -> Self {
        Self {
            touch_slop: self.touch_slop * factor,
            double_tap_slop: self.double_tap_slop * factor,
            minimum_fling_velocity: self.minimum_fling_velocity * factor,
            maximum_fling_velocity: self.maximum_fling_velocity * factor,
            minimum_scaling_span: self.minimum_scaling_span * factor,
            screen_edge_limit: self.screen_edge_limit * factor,
            ..self
        }
    }
}

impl Default for TouchConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scaling_leaves_durations_alone() {
        let c = TouchConfig::default().scaled(2.0);
        assert_eq!(c.touch_slop, 16.0);
        assert_eq!(c.double_tap_slop, 200.0);
        assert_eq!(c.screen_edge_limit, 40.0);
        assert_eq!(c.long_press_timeout, 500);
        assert_eq!(c.tap_timeout, 100);
    }
}
