// Symphonia
// Copyright (c) 2019-2022 The Project Symphonia Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use symphonia_core::errors::Result;
use symphonia_core::io::BitReaderRtl;

/// A codebook from the stream's setup header.
///
/// The floor does not decode Huffman codewords or vector quantization (VQ) vectors itself, it
/// calls into the codebook table configured by the setup header. Floor setup validates every
/// stored codebook number against the size of that table, therefore implementations may assume
/// in-bounds indexing.
///
/// An exhausted packet must surface from both methods as the bit reader's end-of-stream I/O error
/// so that floor decode can demote the channel to silence.
pub trait Codebook {
    /// Decode one scalar codeword from the bitstream.
    fn decode_scalar(&self, bs: &mut BitReaderRtl<'_>) -> Result<u32>;

    /// Decode one codeword and append the associated VQ vector to `out`.
    fn decode_vq(&self, bs: &mut BitReaderRtl<'_>, out: &mut Vec<f32>) -> Result<()>;
}
