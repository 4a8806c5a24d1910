// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! On-grid power limit type.
//!
//! The EZHI accepts an on-grid power setting in Watts. Positive values feed
//! power to the grid, negative values draw power from it to charge the
//! battery. The firmware only accepts values in `[-1200, 1200]`.

use std::fmt;

use crate::error::ValueError;

/// On-grid power setting in Watts, always within `[MIN, MAX]`.
///
/// # Examples
///
/// ```
/// use ezhi_lib::types::PowerLimit;
///
/// let limit = PowerLimit::new(600).unwrap();
/// assert_eq!(limit.watts(), 600);
///
/// // Strict construction rejects out-of-range values
/// assert!(PowerLimit::new(5000).is_err());
///
/// // Clamping saturates instead
/// assert_eq!(PowerLimit::clamped(5000), PowerLimit::MAX);
/// assert_eq!(PowerLimit::clamped(-5000), PowerLimit::MIN);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct PowerLimit(i32);

impl PowerLimit {
    /// Lowest accepted setting (maximum grid draw).
    pub const MIN_WATTS: i32 = -1200;

    /// Highest accepted setting (maximum grid feed-in).
    pub const MAX_WATTS: i32 = 1200;

    /// Minimum power limit.
    pub const MIN: Self = Self(Self::MIN_WATTS);

    /// Maximum power limit.
    pub const MAX: Self = Self(Self::MAX_WATTS);

    /// Creates a new power limit.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::OutOfRange` if `watts` is outside `[MIN, MAX]`.
    pub fn new(watts: i32) -> Result<Self, ValueError> {
        if !(Self::MIN_WATTS..=Self::MAX_WATTS).contains(&watts) {
            return Err(ValueError::OutOfRange {
                min: Self::MIN_WATTS,
                max: Self::MAX_WATTS,
                actual: watts,
            });
        }
        Ok(Self(watts))
    }

    /// Creates a power limit, clamping to the valid range.
    #[must_use]
    pub const fn clamped(watts: i32) -> Self {
        if watts < Self::MIN_WATTS {
            Self::MIN
        } else if watts > Self::MAX_WATTS {
            Self::MAX
        } else {
            Self(watts)
        }
    }

    /// Returns the setting in Watts.
    #[must_use]
    pub const fn watts(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for PowerLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} W", self.0)
    }
}

impl TryFrom<i32> for PowerLimit {
    type Error = ValueError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PowerLimit> for i32 {
    fn from(limit: PowerLimit) -> Self {
        limit.0
    }
}
