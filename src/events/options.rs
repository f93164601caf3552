// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Typed option structs for event constructors.
//!
//! Field values arrive from song files or scripting front ends with no
//! guarantee about their kind, so each field holds a [`FieldValue`] and the
//! constructors decide whether a value is usable, defaulted, or an error.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Dynamically typed option value
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FieldValue {
    /// Boolean value
    Bool(bool),
    /// Integer value
    Int(i64),
    /// Float value
    Float(f64),
    /// String value
    String(String),
}

impl FieldValue {
    /// Numeric view of the value, if it is a number
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Int(v) => Some(*v as f64),
            FieldValue::Float(v) if v.is_finite() => Some(*v),
            _ => None,
        }
    }

    /// Byte view of the value.
    ///
    /// Integers wrap modulo 256 like the platform's byte-wide message
    /// fields; floats are truncated first.
    pub fn as_byte(&self) -> Option<u8> {
        match self {
            FieldValue::Int(v) => Some(*v as u8),
            FieldValue::Float(v) if v.is_finite() => Some((*v as i64) as u8),
            _ => None,
        }
    }

    /// Name of the value's kind, for error messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            FieldValue::Bool(_) => "bool",
            FieldValue::Int(_) => "integer",
            FieldValue::Float(_) => "float",
            FieldValue::String(_) => "string",
        }
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Int(v)
    }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self {
        FieldValue::Int(v as i64)
    }
}

impl From<u8> for FieldValue {
    fn from(v: u8) -> Self {
        FieldValue::Int(v as i64)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float(v)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Bool(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::String(v.to_string())
    }
}

/// Options for [`NoteMessage::create`](super::NoteMessage::create)
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NoteOptions {
    #[serde(default)]
    pub channel: Option<FieldValue>,
    #[serde(default)]
    pub note: Option<FieldValue>,
    #[serde(default)]
    pub velocity: Option<FieldValue>,
    #[serde(default)]
    pub release_velocity: Option<FieldValue>,
    #[serde(default)]
    pub duration: Option<FieldValue>,
}

/// Options for [`ChannelMessage::create`](super::ChannelMessage::create)
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ChannelOptions {
    #[serde(default)]
    pub status: Option<FieldValue>,
    #[serde(default)]
    pub data1: Option<FieldValue>,
    #[serde(default)]
    pub data2: Option<FieldValue>,
}

/// Options for [`TempoEvent::create`](super::TempoEvent::create)
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TempoOptions {
    #[serde(default)]
    pub bpm: Option<FieldValue>,
}

/// Read a required byte field
pub(crate) fn required_byte(field: &'static str, value: Option<&FieldValue>) -> Result<u8> {
    let value = value.ok_or(Error::MissingField(field))?;
    value.as_byte().ok_or_else(|| Error::TypeError {
        field,
        found: value.kind_name().to_string(),
    })
}

/// Read a required numeric field
pub(crate) fn required_number(field: &'static str, value: Option<&FieldValue>) -> Result<f64> {
    let value = value.ok_or(Error::MissingField(field))?;
    value.as_number().ok_or_else(|| Error::TypeError {
        field,
        found: value.kind_name().to_string(),
    })
}

/// Read an optional byte field; unusable values count as absent
pub(crate) fn byte_or(value: Option<&FieldValue>, default: u8) -> u8 {
    value.and_then(FieldValue::as_byte).unwrap_or(default)
}

/// Read an optional numeric field; unusable values count as absent
pub(crate) fn number_or(value: Option<&FieldValue>, default: f64) -> f64 {
    value.and_then(FieldValue::as_number).unwrap_or(default)
}
