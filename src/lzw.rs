//! Variable-width LZW with a hash-probed encode dictionary and an
//! index-addressed decode dictionary.
//!
//! The encoder never knows a code's numeric value ahead of a hash probe over
//! `(parent_code, character)`, so its table is addressed by hash. The decoder
//! only ever needs "given this code, what's its parent and last character",
//! so its table is addressed directly by code value - a different structure
//! for a different direction, even though the original C shares one
//! oversized array between both because they never run in the same process
//! invocation.

use std::io::{Read, Write};
use crate::bitstream::{BitReader, BitWriter};
use crate::Error;

const BITS: u32 = 16;
const MAX_CODE: u32 = (1 << BITS) - 1;
const TABLE_SIZE: i64 = 78643;
const END_OF_STREAM: u32 = 256;
const BUMP_CODE: u32 = 257;
const FLUSH_CODE: u32 = 258;
const FIRST_CODE: u32 = 259;
const UNUSED: i32 = -1;

#[derive(Clone, Copy)]
struct EncodeEntry {
    parent_code: i32,
    code_value: i32,
    character: u8,
}

impl Default for EncodeEntry {
    fn default() -> Self {
        Self { parent_code: 0, code_value: UNUSED, character: 0 }
    }
}

struct EncodeDict {
    table: Vec<EncodeEntry>,
    next_code: u32,
    current_code_bits: u32,
    next_bump_code: u32,
}

impl EncodeDict {
    fn new() -> Self {
        Self {
            table: vec![EncodeEntry::default(); TABLE_SIZE as usize],
            next_code: FIRST_CODE,
            current_code_bits: 9,
            next_bump_code: 511,
        }
    }

    fn reset(&mut self) {
        for e in self.table.iter_mut() {
            e.code_value = UNUSED;
        }
        self.next_code = FIRST_CODE;
        self.current_code_bits = 9;
        self.next_bump_code = 511;
    }

    /// Probe for the child of `parent_code` over `character`, returning the
    /// slot: either a pre-existing match or the first unused slot on the
    /// probe sequence. The raw hash is folded into `[0, TABLE_SIZE)` before
    /// probing so the table never indexes out of bounds.
    fn hash_child_node(&self, parent_code: i32, character: u8) -> usize {
        let raw = ((character as i64) << (BITS - 8)) ^ (parent_code as i64);
        let mut index = raw.rem_euclid(TABLE_SIZE);
        let offset = if index == 0 { 1 } else { TABLE_SIZE - index };
        loop {
            let e = &self.table[index as usize];
            if e.code_value == UNUSED {
                return index as usize;
            }
            if e.parent_code == parent_code && e.character == character {
                return index as usize;
            }
            if index >= offset {
                index -= offset;
            } else {
                index += TABLE_SIZE - offset;
            }
        }
    }
}

#[derive(Clone, Copy, Default)]
struct DecodeEntry {
    parent_code: i32,
    character: u8,
}

fn decode_string(table: &[DecodeEntry], stack: &mut Vec<u8>, mut code: u32) {
    while code > 255 {
        let e = &table[code as usize];
        stack.push(e.character);
        code = e.parent_code as u32;
    }
    stack.push(code as u8);
}

pub fn compress<R: Read, W: Write>(input: &mut R, output: &mut W) -> Result<(), Error> {
    let mut dict = EncodeDict::new();
    let mut writer = BitWriter::new(Vec::new());
    let mut b = [0u8; 1];
    let mut string_code: i32 = if input.read(&mut b)? == 0 {
        END_OF_STREAM as i32
    } else {
        b[0] as i32
    };
    loop {
        let n = input.read(&mut b)?;
        if n == 0 {
            break;
        }
        let character = b[0];
        let index = dict.hash_child_node(string_code, character);
        if dict.table[index].code_value != UNUSED {
            string_code = dict.table[index].code_value;
        } else {
            dict.table[index] = EncodeEntry {
                parent_code: string_code,
                code_value: dict.next_code as i32,
                character,
            };
            writer.output_bits(string_code as u32, dict.current_code_bits)?;
            dict.next_code += 1;
            string_code = character as i32;
            if dict.next_code > MAX_CODE {
                log::debug!("dictionary full at code {}, flushing", dict.next_code);
                writer.output_bits(FLUSH_CODE, dict.current_code_bits)?;
                dict.reset();
            } else if dict.next_code > dict.next_bump_code {
                log::debug!("bumping code width to {} bits at code {}", dict.current_code_bits + 1, dict.next_code);
                writer.output_bits(BUMP_CODE, dict.current_code_bits)?;
                dict.current_code_bits += 1;
                dict.next_bump_code = (dict.next_bump_code << 1) | 1;
            }
        }
    }
    writer.output_bits(string_code as u32, dict.current_code_bits)?;
    writer.output_bits(END_OF_STREAM, dict.current_code_bits)?;
    let bytes = writer.close_output()?;
    output.write_all(&bytes)?;
    Ok(())
}

pub fn expand<R: Read, W: Write>(input: &mut R, output: &mut W) -> Result<(), Error> {
    let mut reader = BitReader::new(input);
    let mut table = vec![DecodeEntry::default(); (MAX_CODE + 1) as usize];
    loop {
        let mut current_code_bits = 9u32;
        let mut next_code = FIRST_CODE;
        let old_code_val = reader.input_bits(current_code_bits)?;
        if old_code_val == END_OF_STREAM {
            return Ok(());
        }
        let mut character = old_code_val as u8;
        output.write_all(&[character])?;
        let mut old_code = old_code_val as i32;
        loop {
            let new_code = reader.input_bits(current_code_bits)?;
            if new_code == END_OF_STREAM {
                return Ok(());
            }
            if new_code == FLUSH_CODE {
                break;
            }
            if new_code == BUMP_CODE {
                current_code_bits += 1;
                continue;
            }
            let mut stack: Vec<u8> = Vec::new();
            if new_code >= next_code {
                // incomplete dictionary entry: decode old_code, then repeat
                // its own first character at the far end of the string
                stack.push(character);
                decode_string(&table, &mut stack, old_code as u32);
            } else {
                decode_string(&table, &mut stack, new_code);
            }
            character = *stack.last().ok_or(Error::InvalidCode)?;
            for &c in stack.iter().rev() {
                output.write_all(&[c])?;
            }
            if (next_code as usize) >= table.len() {
                return Err(Error::InvalidCode);
            }
            table[next_code as usize] = DecodeEntry { parent_code: old_code, character };
            next_code += 1;
            old_code = new_code as i32;
        }
    }
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
    fn incomplete_entry_case_ababababab() {
        // Triggers the KwKwK fixup: "AB" gets coded, then seeing "ABA" again
        // the dictionary entry for "ABA" doesn't exist yet when it's queried.
        round_trip(b"ABABABABAB");
    }

    #[test]
    fn long_input_forces_a_code_width_bump() {
        // Enough distinct two-byte contexts to push next_code past 511.
        let mut dat = Vec::new();
        for i in 0..3000u32 {
            dat.push((i % 256) as u8);
            dat.push(((i / 7) % 256) as u8);
        }
        round_trip(&dat);
    }

    #[test]
    fn long_repeated_substrings() {
        let mut dat = Vec::new();
        for _ in 0..200 {
            dat.extend_from_slice(b"the quick brown fox jumps over the lazy dog");
        }
        round_trip(&dat);
    }
}
