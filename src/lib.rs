// Symphonia
// Copyright (c) 2019-2022 The Project Symphonia Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! A decoder for the floor component of a Vorbis I bitstream.
//!
//! The floor is the spectral envelope that scales the decoded residue of each audio block. A floor
//! is configured once per stream from the setup header, unpacked once per channel per audio
//! packet, and finally applied by multiplying the channel's residue vector in-place by the
//! synthesized curve.
//!
//! The surrounding decoder provides the packet bit reader
//! ([`BitReaderRtl`](symphonia_core::io::BitReaderRtl)), the stream's codebook table (via the
//! [`Codebook`] trait), and the two block sizes negotiated in the identification header.

#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]
// The following lints are allowed in all Symphonia crates. Please see clippy.toml for their
// justification.
#![allow(clippy::comparison_chain)]
#![allow(clippy::excessive_precision)]
#![allow(clippy::identity_op)]
#![allow(clippy::manual_range_contains)]

mod codebook;
mod common;
mod floor;
mod floor0;
mod floor1;

pub use codebook::Codebook;
pub use floor::{read_floors, Floor, FloorData};
pub use floor0::Floor0;
pub use floor1::Floor1;
