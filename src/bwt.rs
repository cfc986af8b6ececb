//! Block-sorting compression: Burrows-Wheeler Transform + Move-To-Front,
//! entropy-coded with the adaptive Huffman coder from [`crate::huffman`].
//!
//! The input is split into blocks of up to [`BLOCK_SIZE`] bytes. Each block is
//! rotation-sorted to produce the transform column and a primary index, the
//! column is MTF-encoded, and an 8-byte little-endian header (primary index,
//! block length) is glued on front of the MTF bytes. The whole thing -
//! header and MTF bytes alike - is pushed through a *fresh* Huffman tree per
//! block, but all blocks share one continuous bitstream: the writer is never
//! flushed between blocks, only at the very end. A block shorter than
//! `BLOCK_SIZE` is the last one.

use std::io::{Read, Write};
use crate::bitstream::{BitReader, BitWriter};
use crate::huffman;
use crate::Error;

pub const BLOCK_SIZE: usize = 750 * 1024;

fn bwt_forward(block: &[u8]) -> (Vec<u8>, usize) {
    let n = block.len();
    let mut idx: Vec<usize> = (0..n).collect();
    idx.sort_by(|&a, &b| {
        for k in 0..n {
            let ca = block[(a + k) % n];
            let cb = block[(b + k) % n];
            if ca != cb {
                return ca.cmp(&cb);
            }
        }
        std::cmp::Ordering::Equal
    });
    let mut l = vec![0u8; n];
    let mut primary_index = 0usize;
    for (i, &start) in idx.iter().enumerate() {
        if start == 0 {
            primary_index = i;
        }
        l[i] = block[(start + n - 1) % n];
    }
    (l, primary_index)
}

fn bwt_inverse(l: &[u8], primary_index: usize) -> Vec<u8> {
    let n = l.len();
    if n == 0 {
        return Vec::new();
    }
    let mut pairs: Vec<(u8, usize)> = l.iter().copied().zip(0..n).collect();
    pairs.sort_by(|a, b| a.0.cmp(&b.0));
    let mut transform = vec![0usize; n];
    for (sort_pos, &(_, orig_idx)) in pairs.iter().enumerate() {
        transform[orig_idx] = sort_pos;
    }
    let mut out = vec![0u8; n];
    let mut pos = primary_index;
    for i in (0..n).rev() {
        out[i] = l[pos];
        pos = transform[pos];
    }
    out
}

fn mtf_encode(bytes: &[u8]) -> Vec<u8> {
    let mut table: Vec<u8> = (0..=255).collect();
    let mut out = Vec::with_capacity(bytes.len());
    for &b in bytes {
        let pos = table.iter().position(|&x| x == b).expect("byte in 0..=255");
        out.push(pos as u8);
        table.remove(pos);
        table.insert(0, b);
    }
    out
}

fn mtf_decode(codes: &[u8]) -> Vec<u8> {
    let mut table: Vec<u8> = (0..=255).collect();
    let mut out = Vec::with_capacity(codes.len());
    for &idx in codes {
        let b = table[idx as usize];
        out.push(b);
        table.remove(idx as usize);
        table.insert(0, b);
    }
    out
}

/// Fill `buf` from `input` as far as possible, returning the number of bytes
/// actually read (less than `buf.len()` only at end of stream).
fn fill(input: &mut impl Read, buf: &mut [u8]) -> Result<usize, Error> {
    let mut filled = 0;
    while filled < buf.len() {
        match input.read(&mut buf[filled..])? {
            0 => break,
            n => filled += n,
        }
    }
    Ok(filled)
}

pub fn compress<R: Read, W: Write>(input: &mut R, output: &mut W) -> Result<(), Error> {
    let mut writer = BitWriter::new(Vec::new());
    let mut block = vec![0u8; BLOCK_SIZE];
    loop {
        let n = fill(input, &mut block)?;
        log::debug!("encoding block of {} bytes", n);
        // the 8-byte header packs both fields as little-endian i32
        if n > i32::MAX as usize {
            return Err(Error::FileTooLarge);
        }
        let (l, primary_index) = bwt_forward(&block[..n]);
        let mtf = mtf_encode(&l);
        let mut combined = Vec::with_capacity(8 + mtf.len());
        combined.extend_from_slice(&(primary_index as i32).to_le_bytes());
        combined.extend_from_slice(&(n as i32).to_le_bytes());
        combined.extend_from_slice(&mtf);
        let mut tree = huffman::Tree::new();
        for &b in &combined {
            tree.encode_symbol(b as usize, &mut writer)?;
            tree.update_model(b as usize);
        }
        tree.encode_symbol(huffman::END_OF_STREAM, &mut writer)?;
        if n < BLOCK_SIZE {
            break;
        }
    }
    let bytes = writer.close_output()?;
    output.write_all(&bytes)?;
    Ok(())
}

pub fn expand<R: Read, W: Write>(input: &mut R, output: &mut W) -> Result<(), Error> {
    let mut reader = BitReader::new(input);
    loop {
        let mut tree = huffman::Tree::new();
        let mut combined = Vec::new();
        loop {
            let c = tree.decode_symbol(&mut reader)?;
            if c == huffman::END_OF_STREAM {
                break;
            }
            combined.push(c as u8);
            tree.update_model(c);
        }
        if combined.len() < 8 {
            return Err(Error::UnexpectedEof);
        }
        let primary_index = i32::from_le_bytes(combined[0..4].try_into().unwrap()) as usize;
        let length = i32::from_le_bytes(combined[4..8].try_into().unwrap()) as usize;
        let mtf = &combined[8..];
        if mtf.len() != length {
            return Err(Error::FileFormatMismatch);
        }
        let l = mtf_decode(mtf);
        let block = bwt_inverse(&l, primary_index);
        output.write_all(&block)?;
        if length < BLOCK_SIZE {
            break;
        }
    }
    Ok(())
}

pub fn compress_slice(dat: &[u8]) -> Result<Vec<u8>, Error> {
    let mut out = Vec::new();
    let mut cur = std::io::Cursor::new(dat);
    compress(&mut cur, &mut out)?;
    Ok(out)
}

pub fn expand_slice(dat: &[u8]) -> Result<Vec<u8>, Error> {
    let mut out = Vec::new();
    let mut cur = std::io::Cursor::new(dat);
    expand(&mut cur, &mut out)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(dat: &[u8]) {
        let compressed = compress_slice(dat).expect("compress failed");
        let expanded = expand_slice(&compressed).expect("expand failed");
        assert_eq!(expanded, dat);
    }

    #[test]
    fn mtf_round_trips() {
        let dat = b"bananaananana".to_vec();
        assert_eq!(mtf_decode(&mtf_encode(&dat)), dat);
    }

    #[test]
    fn bwt_round_trips_any_nonempty_block() {
        for dat in [&b"a"[..], b"banana", b"mississippi", b"aaaaaaaaaaaa"] {
            let (l, primary) = bwt_forward(dat);
            assert_eq!(bwt_inverse(&l, primary), dat);
        }
    }

    #[test]
    fn empty_input() {
        round_trip(&[]);
    }

    #[test]
    fn single_byte() {
        round_trip(&[0x42]);
    }

    #[test]
    fn repeated_byte_run() {
        round_trip(&[0x41; 5]);
    }

    #[test]
    fn all_256_values() {
        let dat: Vec<u8> = (0..=255).collect();
        round_trip(&dat);
    }

    #[test]
    fn text_with_long_repeats() {
        let mut dat = Vec::new();
        for _ in 0..200 {
            dat.extend_from_slice(b"the quick brown fox jumps over the lazy dog");
        }
        round_trip(&dat);
    }

    #[test]
    fn exactly_one_block_over_splits_into_two_blocks() {
        let dat = vec![0x37u8; BLOCK_SIZE + 1];
        let compressed = compress_slice(&dat).expect("compress failed");
        // decode block-by-block and count blocks
        let mut reader = BitReader::new(std::io::Cursor::new(&compressed));
        let mut blocks = 0;
        loop {
            let mut tree = huffman::Tree::new();
            let mut combined = Vec::new();
            loop {
                let c = tree.decode_symbol(&mut reader).unwrap();
                if c == huffman::END_OF_STREAM {
                    break;
                }
                combined.push(c as u8);
                tree.update_model(c);
            }
            let length = i32::from_le_bytes(combined[4..8].try_into().unwrap()) as usize;
            blocks += 1;
            if length < BLOCK_SIZE {
                break;
            }
        }
        assert_eq!(blocks, 2);
        let expanded = expand_slice(&compressed).expect("expand failed");
        assert_eq!(expanded, dat);
    }
}
