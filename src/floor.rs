// Symphonia
// Copyright (c) 2019-2022 The Project Symphonia Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use log::debug;

use symphonia_core::errors::{decode_error, Result};
use symphonia_core::io::{BitReaderRtl, ReadBitsRtl};

use crate::codebook::Codebook;
use crate::floor0::{Floor0, Floor0Data};
use crate::floor1::{Floor1, Floor1Data};

/// Read the floor configurations from the setup header: a 6-bit count-minus-one followed by that
/// many floor configurations.
pub fn read_floors(
    bs: &mut BitReaderRtl<'_>,
    bs0_exp: u8,
    bs1_exp: u8,
    max_codebook: u8,
) -> Result<Vec<Floor>> {
    let count = bs.read_bits_leq32(6)? + 1;

    debug!("vorbis: setup contains {} floor(s)", count);

    (0..count).map(|_| Floor::try_read(bs, bs0_exp, bs1_exp, max_codebook)).collect()
}

/// A floor configuration.
///
/// Parsed once per stream from the setup header. The configuration is immutable afterwards and may
/// be shared by concurrently decoding threads, provided each owns its packet reader and residue
/// buffer.
#[derive(Debug)]
pub enum Floor {
    Type0(Floor0),
    Type1(Floor1),
}

impl Floor {
    /// Read one floor configuration, dispatching on the 16-bit floor type.
    pub fn try_read(
        bs: &mut BitReaderRtl<'_>,
        bs0_exp: u8,
        bs1_exp: u8,
        max_codebook: u8,
    ) -> Result<Floor> {
        match bs.read_bits_leq32(16)? {
            0 => Ok(Floor::Type0(Floor0::try_read(bs, bs0_exp, bs1_exp, max_codebook)?)),
            1 => Ok(Floor::Type1(Floor1::try_read(bs, max_codebook)?)),
            _ => decode_error("vorbis: invalid floor type"),
        }
    }

    /// Decode one channel's floor from an audio packet.
    ///
    /// `bs_exp` is the block size of the packet expressed as a power-of-2 exponent. Reaching the
    /// end of the packet mid-decode is not an error, the channel decodes to a silent floor.
    pub fn read_channel<C: Codebook>(
        &self,
        bs: &mut BitReaderRtl<'_>,
        codebooks: &[C],
        bs_exp: u8,
    ) -> Result<FloorData> {
        let kind = match self {
            Floor::Type0(floor) => FloorDataKind::Type0(floor.read_channel(bs, codebooks)?),
            Floor::Type1(floor) => FloorDataKind::Type1(floor.read_channel(bs, codebooks)?),
        };

        Ok(FloorData { bs_exp, force_energy: false, force_no_energy: false, kind })
    }

    /// Synthesize the floor curve and multiply `residue[..n]` by it in-place, where `n` is half
    /// the block size the floor was unpacked for. A silent floor leaves the residue untouched.
    ///
    /// Panics if `data` was not produced by a floor of the same type.
    pub fn apply(&self, data: &FloorData, residue: &mut [f32]) -> Result<()> {
        match (self, &data.kind) {
            (Floor::Type0(floor), FloorDataKind::Type0(ch)) => {
                floor.apply(ch, data.bs_exp, residue)
            }
            (Floor::Type1(floor), FloorDataKind::Type1(ch)) => {
                floor.apply(ch, data.bs_exp, residue);
                Ok(())
            }
            _ => panic!("floor data type mismatch"),
        }
    }
}

/// Per-packet, per-channel floor data.
#[derive(Debug)]
pub struct FloorData {
    /// The block size exponent the floor was unpacked for.
    bs_exp: u8,
    /// Set by the residue stage when channel coupling requires this channel to be decoded even
    /// though its own floor is silent.
    pub force_energy: bool,
    /// Set by the residue stage to exclude this channel outright.
    pub force_no_energy: bool,
    kind: FloorDataKind,
}

#[derive(Debug)]
enum FloorDataKind {
    Type0(Floor0Data),
    Type1(Floor1Data),
}

impl FloorData {
    /// Returns true if the residue stage should process this channel.
    pub fn exec_channel(&self) -> bool {
        let has_energy = match &self.kind {
            FloorDataKind::Type0(data) => data.amplitude > 0,
            FloorDataKind::Type1(data) => data.posts.is_some(),
        };

        (self.force_energy || has_energy) && !self.force_no_energy
    }

    /// The block size exponent this floor was unpacked for.
    pub fn bs_exp(&self) -> u8 {
        self.bs_exp
    }
}
