// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Standard MIDI File hooks.
//!
//! Sequences are loaded and saved through [`SmfLoader`] and [`SmfSaver`],
//! which exchange plain [`SequenceData`] snapshots. Reading SMF is left to an
//! external loader; [`SmfWriter`] is the built-in saver.

pub mod writer;

pub use writer::SmfWriter;

use std::path::Path;

use crate::error::Result;
use crate::sequence::SequenceData;

/// Produces sequence data from a file
pub trait SmfLoader {
    fn load(&self, path: &Path) -> Result<SequenceData>;
}

/// Writes sequence data to a file
pub trait SmfSaver {
    fn save(&self, data: &SequenceData, path: &Path) -> Result<()>;
}
