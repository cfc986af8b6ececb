//! PPMC (Prediction by Partial Matching, variant C): a context-mixing model
//! ([`model`]) built over a vine-linked trie ([`trie`]), driving a 16-bit
//! arithmetic coder ([`arith`]).
//!
//! Encoding a symbol may escape through several orders before landing - the
//! model keeps re-querying at a lower context each time - so both
//! [`compress`] and [`expand`] loop on escapes around a single call into the
//! arithmetic coder per context tried, not per symbol.

pub mod arith;
pub mod model;
pub mod trie;

use std::io::{Read, Write};
use crate::bitstream::{BitReader, BitWriter};
use crate::Error;
use model::{Model, END_OF_STREAM, ESCAPE};

/// Model order: how many bytes of context precede the symbol being
/// predicted. `order + 1` is the trie's maximum depth, since depth 0 is the
/// empty (order -1 notwithstanding) context at the root.
pub const STD_ORDER: usize = 3;

pub fn compress<R: Read, W: Write>(input: &mut R, output: &mut W, order: usize) -> Result<(), Error> {
    let mut model = Model::new(order);
    let mut encoder = arith::Encoder::new();
    let mut writer = BitWriter::new(Vec::new());
    let mut buf = [0u8; 1];
    loop {
        let c: i32 = match input.read(&mut buf)? {
            0 => END_OF_STREAM,
            _ => buf[0] as i32,
        };
        let (mut symbol, mut escaped) = model.convert_int_to_symbol(c);
        encoder.encode(&symbol, &mut writer)?;
        while escaped {
            (symbol, escaped) = model.convert_int_to_symbol(c);
            encoder.encode(&symbol, &mut writer)?;
        }
        if c == END_OF_STREAM {
            break;
        }
        model.update_model(c);
    }
    encoder.flush(&mut writer)?;
    writer.output_bits(0, 16)?;
    let bytes = writer.close_output()?;
    output.write_all(&bytes)?;
    Ok(())
}

pub fn expand<R: Read, W: Write>(input: &mut R, output: &mut W, order: usize) -> Result<(), Error> {
    let mut model = Model::new(order);
    let mut reader = BitReader::new(input);
    let mut decoder = arith::Decoder::new(&mut reader)?;
    loop {
        let c = loop {
            let scale = model.symbol_scale();
            let index = decoder.current_index(scale)?;
            let (c, symbol) = model.convert_symbol_to_int(index);
            decoder.remove_symbol(&symbol, &mut reader)?;
            if c != ESCAPE {
                break c;
            }
        };
        if c == END_OF_STREAM {
            break;
        }
        output.write_all(&[c as u8])?;
        model.update_model(c);
    }
    Ok(())
}

pub fn compress_slice(dat: &[u8], order: usize) -> Result<Vec<u8>, Error> {
    let mut out = Vec::new();
    let mut cur = std::io::Cursor::new(dat);
    compress(&mut cur, &mut out, order)?;
    Ok(out)
}

pub fn expand_slice(dat: &[u8], order: usize) -> Result<Vec<u8>, Error> {
    let mut out = Vec::new();
    let mut cur = std::io::Cursor::new(dat);
    expand(&mut cur, &mut out, order)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(dat: &[u8], order: usize) {
        let compressed = compress_slice(dat, order).expect("compress failed");
        let expanded = expand_slice(&compressed, order).expect("expand failed");
        assert_eq!(expanded, dat);
    }

    #[test]
    fn empty_input_every_order() {
        for order in 0..=4 {
            round_trip(&[], order);
        }
    }

    #[test]
    fn single_byte_every_order() {
        for order in 0..=4 {
            round_trip(&[0x42], order);
        }
    }

    #[test]
    fn repeated_byte_every_order() {
        for order in 0..=4 {
            round_trip(&[0x41; 5], order);
        }
    }

    #[test]
    fn all_256_values_every_order() {
        let dat: Vec<u8> = (0..=255).collect();
        for order in 0..=4 {
            round_trip(&dat, order);
        }
    }

    #[test]
    fn text_with_long_repeats_every_order() {
        let mut dat = Vec::new();
        for _ in 0..200 {
            dat.extend_from_slice(b"the quick brown fox jumps over the lazy dog");
        }
        for order in 0..=4 {
            round_trip(&dat, order);
        }
    }

    #[test]
    fn random_bytes_round_trip() {
        let mut x: u32 = 0xC0FFEE;
        let dat: Vec<u8> = (0..3000).map(|_| {
            x ^= x << 13;
            x ^= x >> 17;
            x ^= x << 5;
            (x & 0xff) as u8
        }).collect();
        round_trip(&dat, STD_ORDER);
    }

    #[test]
    fn all_zeros_compress_over_100x() {
        let dat = vec![0u8; 10_000];
        let compressed = compress_slice(&dat, STD_ORDER).expect("compress failed");
        assert!(compressed.len() * 100 < dat.len(), "compressed {} bytes, expected well under {}", compressed.len(), dat.len() / 100);
        let expanded = expand_slice(&compressed, STD_ORDER).expect("expand failed");
        assert_eq!(expanded, dat);
    }

    #[test]
    fn quick_brown_fox_order_3_under_200_bytes() {
        let mut dat = Vec::new();
        for _ in 0..100 {
            dat.extend_from_slice(b"the quick brown fox jumps over the lazy dog");
        }
        let compressed = compress_slice(&dat, 3).expect("compress failed");
        assert!(compressed.len() < 200, "compressed to {} bytes", compressed.len());
        let expanded = expand_slice(&compressed, 3).expect("expand failed");
        assert_eq!(expanded, dat);
    }
}
