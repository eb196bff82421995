// Symphonia
// Copyright (c) 2019-2022 The Project Symphonia Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use symphonia_core::errors::Error;

/// As defined in section 9.2.1 of the Vorbis I specification.
///
/// The `ilog` function returns the position number (1 through n) of the highest set bit in the
/// two's complement integer value `x`.
#[inline(always)]
pub fn ilog(x: u32) -> u32 {
    32 - x.leading_zeros()
}

/// Returns true if the error indicates the end of the packet was reached.
///
/// An end-of-bitstream error is classified under `ErrorKind::Other` by the bit reader. During
/// per-packet floor decode this condition is not an error, the channel simply decodes to a silent
/// floor.
#[inline(always)]
pub fn is_end_of_packet(err: &Error) -> bool {
    match err {
        Error::IoError(err) => err.kind() == std::io::ErrorKind::Other,
        _ => false,
    }
}
