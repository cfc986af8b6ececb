//! 16-bit arithmetic coder. Carries no notion of symbols itself - it only
//! knows how to narrow `[low, high]` to a `Symbol`'s cumulative range and
//! renormalize, emitting or consuming bits through the underlying
//! [`BitWriter`]/[`BitReader`] as the interval collapses.

use std::io::{Read, Write};
use crate::bitstream::{BitReader, BitWriter};
use crate::Error;
use super::model::Symbol;

const TOP: u32 = 0xffff;
const MSB: u32 = 0x8000;
const SECOND_MSB: u32 = 0x4000;

pub struct Encoder {
    low: u32,
    high: u32,
    underflow_bits: u32,
}

impl Encoder {
    pub fn new() -> Self {
        Self { low: 0, high: TOP, underflow_bits: 0 }
    }

    pub fn encode<W: Write>(&mut self, s: &Symbol, w: &mut BitWriter<W>) -> Result<(), Error> {
        if s.scale == 0 {
            return Err(Error::ZeroScale);
        }
        let range = (self.high - self.low + 1) as u64;
        self.high = self.low + ((range * s.high_count as u64) / s.scale as u64) as u32 - 1;
        self.low += ((range * s.low_count as u64) / s.scale as u64) as u32;
        loop {
            if (self.high & MSB) == (self.low & MSB) {
                let bit = ((self.high & MSB) != 0) as u8;
                w.output_bit(bit)?;
                while self.underflow_bits > 0 {
                    w.output_bit(1 - bit)?;
                    self.underflow_bits -= 1;
                }
            } else if (self.low & SECOND_MSB) != 0 && (self.high & SECOND_MSB) == 0 {
                self.underflow_bits += 1;
                self.high |= SECOND_MSB;
                self.low &= !SECOND_MSB;
            } else {
                break;
            }
            self.low = (self.low << 1) & TOP;
            self.high = ((self.high << 1) | 1) & TOP;
        }
        Ok(())
    }

    /// Disambiguate the final interval and let the decoder's 16-bit window
    /// drain; the caller follows this with 16 zero bits of its own so the
    /// decoder's initial read never under-runs.
    pub fn flush<W: Write>(&mut self, w: &mut BitWriter<W>) -> Result<(), Error> {
        let bit = ((self.high & MSB) != 0) as u8;
        w.output_bit(bit)?;
        self.underflow_bits += 1;
        while self.underflow_bits > 0 {
            w.output_bit(1 - bit)?;
            self.underflow_bits -= 1;
        }
        Ok(())
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Decoder {
    low: u32,
    high: u32,
    code: u32,
}

impl Decoder {
    /// Prime the decoder by reading the initial 16-bit window.
    pub fn new<R: Read>(r: &mut BitReader<R>) -> Result<Self, Error> {
        let mut code = 0u32;
        for _ in 0..16 {
            code = (code << 1) | r.input_bit()? as u32;
        }
        Ok(Self { low: 0, high: TOP, code })
    }

    /// Given the model's current scale, compute the cumulative-count index
    /// the model should map back to a symbol.
    pub fn current_index(&self, scale: u32) -> Result<u32, Error> {
        if scale == 0 {
            return Err(Error::ZeroScale);
        }
        let range = (self.high - self.low + 1) as i64;
        let index = (((self.code as i64 - self.low as i64) + 1) * scale as i64 - 1) / range;
        Ok(index as u32)
    }

    pub fn remove_symbol<R: Read>(&mut self, s: &Symbol, r: &mut BitReader<R>) -> Result<(), Error> {
        let range = (self.high - self.low + 1) as u64;
        self.high = self.low + ((range * s.high_count as u64) / s.scale as u64) as u32 - 1;
        self.low += ((range * s.low_count as u64) / s.scale as u64) as u32;
        loop {
            if (self.high & MSB) == (self.low & MSB) {
                // nothing to do: the shared leading bit was already consumed
                // on the way in
            } else if (self.low & SECOND_MSB) != 0 && (self.high & SECOND_MSB) == 0 {
                self.code ^= SECOND_MSB;
                self.high |= SECOND_MSB;
                self.low &= !SECOND_MSB;
            } else {
                break;
            }
            self.low = (self.low << 1) & TOP;
            self.high = ((self.high << 1) | 1) & TOP;
            self.code = ((self.code << 1) | r.input_bit()? as u32) & TOP;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// Encode a handful of symbols with hand-picked ranges against a fixed
    /// scale and check the decoder recovers the same sequence of indices.
    #[test]
    fn round_trips_a_sequence_of_ranges() {
        let scale = 10u32;
        let ranges = [(0u32, 3u32), (3, 5), (5, 6), (6, 10), (0, 3), (6, 10)];
        let mut buf = Vec::new();
        {
            let mut w = BitWriter::new(Cursor::new(&mut buf));
            let mut enc = Encoder::new();
            for (low, high) in ranges {
                enc.encode(&Symbol { low_count: low, high_count: high, scale }, &mut w).unwrap();
            }
            enc.flush(&mut w).unwrap();
            w.output_bits(0, 16).unwrap();
            w.close_output().unwrap();
        }
        let mut r = BitReader::new(Cursor::new(&buf));
        let mut dec = Decoder::new(&mut r).unwrap();
        for (low, high) in ranges {
            let index = dec.current_index(scale).unwrap();
            assert!(index >= low && index < high, "index {} not in [{},{})", index, low, high);
            dec.remove_symbol(&Symbol { low_count: low, high_count: high, scale }, &mut r).unwrap();
        }
    }
}
