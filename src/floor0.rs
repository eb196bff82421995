// Symphonia
// Copyright (c) 2019-2022 The Project Symphonia Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use symphonia_core::errors::{decode_error, Result};
use symphonia_core::io::{BitReaderRtl, ReadBitsRtl};

use crate::codebook::Codebook;
use crate::common::{ilog, is_end_of_packet};

/// Floor type 0 configuration.
///
/// The type 0 floor encodes the spectral envelope as line spectral pair (LSP) coefficients from
/// which a curve is synthesized on a Bark-scale frequency map.
#[derive(Debug)]
pub struct Floor0 {
    order: u8,
    bark_map_size: u16,
    amplitude_bits: u8,
    amplitude_offset: u8,
    book_list: Vec<u8>,
    // The block size of the short Bark map.
    map_short_bs_exp: u8,
    // Pre-computed Bark map for short blocks.
    map_short: Vec<f32>,
    // Pre-computed Bark map for long blocks.
    map_long: Vec<f32>,
}

/// Per-packet floor type 0 data. The floor is silent when the amplitude is 0.
#[derive(Debug)]
pub struct Floor0Data {
    pub(crate) amplitude: u64,
    /// LSP coefficients, stored pre-folded as `2cos(coefficient)`. Empty when silent.
    coeffs: Vec<f32>,
}

impl Floor0Data {
    fn silent() -> Self {
        Floor0Data { amplitude: 0, coeffs: Vec::new() }
    }
}

impl Floor0 {
    pub(crate) fn try_read(
        bs: &mut BitReaderRtl<'_>,
        bs0_exp: u8,
        bs1_exp: u8,
        max_codebook: u8,
    ) -> Result<Floor0> {
        let order = bs.read_bits_leq32(8)? as u8;
        let rate = bs.read_bits_leq32(16)? as u16;
        let bark_map_size = bs.read_bits_leq32(16)? as u16;
        let amplitude_bits = bs.read_bits_leq32(6)? as u8;
        let amplitude_offset = bs.read_bits_leq32(8)? as u8;
        let num_books = bs.read_bits_leq32(4)? as u8 + 1;

        // The curve synthesis consumes coefficients in even and odd index pairs. Orders below 6
        // yield fewer coefficients than the shortest expansion.
        if order < 6 {
            return decode_error("vorbis: floor0, invalid order");
        }

        let mut book_list = Vec::with_capacity(usize::from(num_books));

        for _ in 0..num_books {
            let book = bs.read_bits_leq32(8)? as u8;

            if book >= max_codebook {
                return decode_error("vorbis: floor0, invalid codebook number");
            }

            book_list.push(book);
        }

        // Pre-compute the Bark-scale maps for both block sizes.
        let map_short = bark_map(1 << (bs0_exp - 1), rate, bark_map_size);
        let map_long = bark_map(1 << (bs1_exp - 1), rate, bark_map_size);

        Ok(Floor0 {
            order,
            bark_map_size,
            amplitude_bits,
            amplitude_offset,
            book_list,
            map_short_bs_exp: bs0_exp,
            map_short,
            map_long,
        })
    }

    pub(crate) fn read_channel<C: Codebook>(
        &self,
        bs: &mut BitReaderRtl<'_>,
        codebooks: &[C],
    ) -> Result<Floor0Data> {
        match self.try_read_channel(bs, codebooks) {
            Err(ref e) if is_end_of_packet(e) => Ok(Floor0Data::silent()),
            other => other,
        }
    }

    fn try_read_channel<C: Codebook>(
        &self,
        bs: &mut BitReaderRtl<'_>,
        codebooks: &[C],
    ) -> Result<Floor0Data> {
        let amplitude = bs.read_bits_leq64(u32::from(self.amplitude_bits))?;

        // An amplitude of 0 is a silent floor and encodes no coefficients.
        if amplitude == 0 {
            return Ok(Floor0Data::silent());
        }

        // Read the index into the floor's codebook list that contains the actual codebook index.
        let book_idx = bs.read_bits_leq32(ilog(self.book_list.len() as u32))? as usize;

        let codebook_idx = match self.book_list.get(book_idx) {
            Some(&idx) => usize::from(idx),
            _ => return decode_error("vorbis: floor0, invalid book number"),
        };

        let codebook = match codebooks.get(codebook_idx) {
            Some(codebook) => codebook,
            _ => return decode_error("vorbis: floor0, invalid codebook"),
        };

        let order = usize::from(self.order);

        let mut coeffs = Vec::with_capacity(order);
        let mut vector = Vec::new();
        let mut last = 0.0;

        while coeffs.len() < order {
            // Read and obtain the next VQ vector from the codebook.
            vector.clear();
            codebook.decode_vq(bs, &mut vector)?;

            if vector.is_empty() {
                return decode_error("vorbis: floor0, empty vq vector");
            }

            // Each scalar is biased by the final coefficient value of the previous vector. The VQ
            // vector may be longer than the remaining number of coefficients, cap the amount
            // consumed.
            for &value in vector.iter().take(order - coeffs.len()) {
                coeffs.push(last + value);
            }

            last = coeffs[coeffs.len() - 1];
        }

        // Pre-compute 2 times the cosine of all coefficients.
        for coeff in coeffs.iter_mut() {
            *coeff = 2.0 * coeff.cos();
        }

        Ok(Floor0Data { amplitude, coeffs })
    }

    /// Synthesize the curve and multiply `residue[..n]` by it in-place.
    pub(crate) fn apply(&self, data: &Floor0Data, bs_exp: u8, residue: &mut [f32]) -> Result<()> {
        if data.amplitude == 0 {
            return Ok(());
        }

        // Half the block size.
        let n = (1 << bs_exp) >> 1;

        debug_assert!(residue.len() >= n);

        // Select the Bark-scale map matching the block size.
        let map =
            if bs_exp == self.map_short_bs_exp { &self.map_short } else { &self.map_long };

        let omega_step = std::f32::consts::PI / f32::from(self.bark_map_size);
        let order = usize::from(self.order);

        let mut i = 0;

        while i < n {
            let bin = map[i];

            let omega = omega_step * bin;
            let cos_omega = omega.cos();
            let two_cos_omega = 2.0 * cos_omega;

            let mut p = 1.0;
            let mut q = 1.0;

            let mut pairs = data.coeffs[..order].chunks_exact(2);

            // p is the product over odd-indexed coefficients, q over even-indexed ones.
            for pair in &mut pairs {
                p *= pair[1] - two_cos_omega;
                q *= pair[0] - two_cos_omega;
            }

            // An odd order leaves exactly one extra even-indexed coefficient.
            let rem = pairs.remainder();

            if !rem.is_empty() {
                q *= rem[0] - two_cos_omega;

                p = p * p * (1.0 - cos_omega * cos_omega);
                q = q * q * 0.25;
            }
            else {
                p = p * p * ((1.0 - cos_omega) / 2.0);
                q = q * q * ((1.0 + cos_omega) / 2.0);
            }

            if p + q == 0.0 {
                return decode_error("vorbis: invalid floor0 coefficients");
            }

            let value = linear_floor_value(
                p,
                q,
                data.amplitude,
                self.amplitude_bits,
                self.amplitude_offset,
            );

            // Scale every sample sharing the current Bark bin. The sentinel at map[n] terminates
            // the run.
            while map[i] == bin {
                residue[i] *= value;
                i += 1;
            }
        }

        Ok(())
    }
}

/// Vorbis I specification, section 6.2.3.
#[inline(always)]
fn bark(x: f64) -> f64 {
    (13.1 * (0.00074 * x).atan()) + (2.24 * (0.0000000185 * x * x).atan()) + (0.0001 * x)
}

/// Build the Bark-scale map for half-block size `n`.
///
/// The map has `n + 1` entries. Entries up to `n - 2` hold quantized Bark bins, entry `n - 1` is
/// left 0, and entry `n` holds a -1 sentinel that terminates the equal-bin run in the curve
/// synthesis.
fn bark_map(n: u32, rate: u16, bark_map_size: u16) -> Vec<f32> {
    let n = n as usize;

    let mut map = vec![0.0; n + 1];

    let max_bin = f64::from(bark_map_size) - 1.0;
    let rate = f64::from(rate);
    let rate_by_2n = rate / (2.0 * n as f64);

    let c = f64::from(bark_map_size) / bark(0.5 * rate);

    for (i, bin) in map[..n - 1].iter_mut().enumerate() {
        let pos = (bark(rate_by_2n * i as f64) * c).floor();
        *bin = pos.min(max_bin) as f32;
    }

    map[n] = -1.0;

    map
}

/// Calculate the linear floor value as per Vorbis I specification, section 6.2.3.
#[inline(always)]
fn linear_floor_value(
    p: f32,
    q: f32,
    amplitude: u64,
    amplitude_bits: u8,
    amplitude_offset: u8,
) -> f32 {
    // Amplitude may be up-to 63-bits and the offset 8-bits, so the product does not always fit a
    // u64. Such values do not occur in practice, use wrapping arithmetic to prevent panics and let
    // the f32 conversion truncate.
    let a = amplitude.wrapping_mul(u64::from(amplitude_offset)) as f32;
    let b = (p + q).sqrt() * ((1u64 << amplitude_bits) - 1) as f32;

    (0.11512925 * ((a / b) - f32::from(amplitude_offset))).exp()
}

#[cfg(test)]
mod tests {
    use symphonia_core::io::BitReaderRtl;

    use super::{bark_map, Floor0};
    use crate::common::testing::{BitstreamWriter, StubCodebook};

    fn write_setup(writer: &mut BitstreamWriter, order: u32, book: u32) {
        writer.put(8, order);
        writer.put(16, 8000); // rate
        writer.put(16, 64); // bark map size
        writer.put(6, 6); // amplitude bits
        writer.put(8, 128); // amplitude offset
        writer.put(4, 0); // number of books - 1
        writer.put(8, book);
    }

    fn read_setup(order: u32) -> Floor0 {
        let mut writer = BitstreamWriter::new();
        write_setup(&mut writer, order, 0);

        let buf = writer.finish();
        Floor0::try_read(&mut BitReaderRtl::new(&buf), 6, 8, 1).unwrap()
    }

    fn stub() -> StubCodebook {
        StubCodebook {
            vectors: vec![vec![0.5, 0.25], vec![0.1, 0.2], vec![0.3, 0.3]],
        }
    }

    #[test]
    fn verify_bark_map() {
        let map = bark_map(32, 8000, 64);

        assert_eq!(map.len(), 33);
        assert_eq!(map[31], 0.0);
        assert_eq!(map[32], -1.0);

        // Bins are quantized, in-range, and non-decreasing up to the default slot.
        for window in map[..31].windows(2) {
            assert!(window[0] <= window[1]);
        }

        for &bin in &map[..31] {
            assert!(bin >= 0.0 && bin <= 63.0);
            assert_eq!(bin.fract(), 0.0);
        }
    }

    #[test]
    fn verify_setup_rejects_small_order() {
        let mut writer = BitstreamWriter::new();
        write_setup(&mut writer, 4, 0);

        let buf = writer.finish();
        assert!(Floor0::try_read(&mut BitReaderRtl::new(&buf), 6, 8, 1).is_err());
    }

    #[test]
    fn verify_setup_rejects_invalid_book() {
        let mut writer = BitstreamWriter::new();
        write_setup(&mut writer, 6, 3);

        let buf = writer.finish();
        assert!(Floor0::try_read(&mut BitReaderRtl::new(&buf), 6, 8, 3).is_err());
    }

    #[test]
    fn verify_read_channel_amplitude_zero() {
        let floor = read_setup(6);

        let mut writer = BitstreamWriter::new();
        writer.put(6, 0); // amplitude

        let buf = writer.finish();
        let data = floor.read_channel(&mut BitReaderRtl::new(&buf), &[stub()]).unwrap();

        assert_eq!(data.amplitude, 0);
        assert!(data.coeffs.is_empty());
    }

    #[test]
    fn verify_read_channel_coefficients() {
        let floor = read_setup(6);

        let mut writer = BitstreamWriter::new();
        writer.put(6, 40); // amplitude
        writer.put(1, 0); // book number, 1 bit for a single book
        writer.put(8, 0); // vq entries
        writer.put(8, 1);
        writer.put(8, 2);

        let buf = writer.finish();
        let data = floor.read_channel(&mut BitReaderRtl::new(&buf), &[stub()]).unwrap();

        assert_eq!(data.amplitude, 40);

        // Each vector is biased by the final coefficient of the previous one, and the stored
        // values are 2cos of the accumulated coefficients.
        let expected = [0.5f32, 0.25, 0.35, 0.45, 0.75, 0.75];

        assert_eq!(data.coeffs.len(), expected.len());

        for (&coeff, &raw) in data.coeffs.iter().zip(&expected) {
            assert!((coeff - 2.0 * raw.cos()).abs() < 1e-6);
        }
    }

    #[test]
    fn verify_read_channel_end_of_packet() {
        let floor = read_setup(6);

        let mut writer = BitstreamWriter::new();
        writer.put(6, 40); // amplitude
        writer.put(1, 0); // book number
        writer.put(8, 0); // one vq entry, then the packet ends

        let buf = writer.finish();
        let data = floor.read_channel(&mut BitReaderRtl::new(&buf), &[stub()]).unwrap();

        // The truncated packet demotes the channel to silence.
        assert_eq!(data.amplitude, 0);
        assert!(data.coeffs.is_empty());
    }

    #[test]
    fn verify_apply_silent_is_noop() {
        let floor = read_setup(6);

        let mut writer = BitstreamWriter::new();
        writer.put(6, 0);

        let buf = writer.finish();
        let data = floor.read_channel(&mut BitReaderRtl::new(&buf), &[stub()]).unwrap();

        let mut residue = vec![1.0; 32];
        floor.apply(&data, 6, &mut residue).unwrap();

        assert!(residue.iter().all(|&v| v == 1.0));
    }

    #[test]
    fn verify_apply_curve() {
        let floor = read_setup(6);

        let mut writer = BitstreamWriter::new();
        writer.put(6, 40);
        writer.put(1, 0);
        writer.put(8, 0);
        writer.put(8, 1);
        writer.put(8, 2);

        let buf = writer.finish();
        let data = floor.read_channel(&mut BitReaderRtl::new(&buf), &[stub()]).unwrap();

        let mut residue = vec![1.0; 32];
        floor.apply(&data, 6, &mut residue).unwrap();

        // Every sample is scaled by a positive, finite factor.
        assert!(residue.iter().all(|&v| v.is_finite() && v > 0.0));

        // Samples sharing a Bark bin share a scale factor.
        for i in 1..32 {
            if floor.map_short[i] == floor.map_short[i - 1] {
                assert_eq!(residue[i].to_bits(), residue[i - 1].to_bits());
            }
        }

        // The curve is deterministic, bit-for-bit.
        let mut again = vec![1.0; 32];
        floor.apply(&data, 6, &mut again).unwrap();

        for (a, b) in residue.iter().zip(&again) {
            assert_eq!(a.to_bits(), b.to_bits());
        }
    }
}
