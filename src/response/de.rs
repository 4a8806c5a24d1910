// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Lenient field deserializers.
//!
//! The EZHI firmware reports most values as JSON strings (`"batSoc": "87"`),
//! but some firmware revisions send bare numbers. Both are accepted here.
//! `null` and empty strings decode to zero; anything else that is not a
//! number is rejected.

use serde::de::{self, Deserializer};
use serde::Deserialize;

use crate::types::BatteryStatus;

#[derive(Deserialize)]
#[serde(untagged)]
enum Raw {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
}

fn raw<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Raw>, D::Error> {
    Option::<Raw>::deserialize(deserializer)
}

#[allow(clippy::cast_precision_loss)]
pub(crate) fn number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    match raw(deserializer)? {
        None => Ok(0.0),
        Some(Raw::Int(v)) => Ok(v as f64),
        Some(Raw::Float(v)) => Ok(v),
        Some(Raw::Bool(v)) => Err(de::Error::custom(format!("expected a number, got {v}"))),
        Some(Raw::Str(s)) => {
            let s = s.trim();
            if s.is_empty() {
                return Ok(0.0);
            }
            s.parse::<f64>()
                .map_err(|_| de::Error::custom(format!("invalid numeric value {s:?}")))
        }
    }
}

#[allow(clippy::cast_precision_loss)]
pub(crate) fn opt_number<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<f64>, D::Error> {
    match raw(deserializer)? {
        None => Ok(None),
        Some(Raw::Str(s)) if s.trim().is_empty() => Ok(None),
        Some(Raw::Int(v)) => Ok(Some(v as f64)),
        Some(Raw::Float(v)) => Ok(Some(v)),
        Some(Raw::Bool(v)) => Err(de::Error::custom(format!("expected a number, got {v}"))),
        Some(Raw::Str(s)) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| de::Error::custom(format!("invalid numeric value {s:?}"))),
    }
}

pub(crate) fn integer<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    match raw(deserializer)? {
        None => Ok(0),
        Some(Raw::Int(v)) => Ok(v),
        #[allow(clippy::cast_possible_truncation)]
        Some(Raw::Float(v)) if v.fract() == 0.0 && v.abs() < 9.0e15 => Ok(v as i64),
        Some(Raw::Float(v)) => Err(de::Error::custom(format!("expected an integer, got {v}"))),
        Some(Raw::Bool(v)) => Err(de::Error::custom(format!("expected an integer, got {v}"))),
        Some(Raw::Str(s)) => {
            let s = s.trim();
            if s.is_empty() {
                return Ok(0);
            }
            s.parse::<i64>()
                .map_err(|_| de::Error::custom(format!("invalid integer value {s:?}")))
        }
    }
}

pub(crate) fn battery_status<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<BatteryStatus, D::Error> {
    let code = integer(deserializer)?;
    u32::try_from(code)
        .map(BatteryStatus::from_code)
        .map_err(|_| de::Error::custom(format!("invalid battery status code {code}")))
}

pub(crate) fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    match raw(deserializer)? {
        None | Some(Raw::Int(0)) => Ok(false),
        Some(Raw::Int(1)) => Ok(true),
        Some(Raw::Bool(v)) => Ok(v),
        Some(Raw::Str(s)) => match s.trim() {
            "" | "0" => Ok(false),
            "1" => Ok(true),
            other => Err(de::Error::custom(format!("invalid alarm flag {other:?}"))),
        },
        Some(Raw::Int(v)) => Err(de::Error::custom(format!("invalid alarm flag {v}"))),
        Some(Raw::Float(v)) => Err(de::Error::custom(format!("invalid alarm flag {v}"))),
    }
}

pub(crate) fn opt_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Ok(match raw(deserializer)? {
        None => None,
        Some(Raw::Str(s)) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Some(Raw::Int(v)) => Some(v.to_string()),
        Some(Raw::Float(v)) => Some(v.to_string()),
        Some(Raw::Bool(v)) => Some(v.to_string()),
    })
}
