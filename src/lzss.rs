//! Sliding-window LZSS with a binary search tree indexing the window.
//!
//! Every position in the 4096-byte ring-buffer window has a tree node keyed
//! on the lexicographic order of the 16-byte look-ahead string starting
//! there. Encoding walks the tree to find the longest prior match, literals
//! and matches are tagged with a single flag bit, and a zero-length match at
//! position 0 is the end-of-stream sentinel.

use std::io::{Read, Write};
use crate::bitstream::{BitReader, BitWriter};
use crate::Error;

const INDEX_BIT_COUNT: u32 = 12;
const LENGTH_BIT_COUNT: u32 = 4;
const WINDOW_SIZE: usize = 1 << INDEX_BIT_COUNT;
const LOOK_AHEAD_SIZE: usize = 1 << LENGTH_BIT_COUNT;
const BREAK_EVEN: usize = 2;
const TREE_ROOT: usize = WINDOW_SIZE;
const UNUSED: i32 = -1;
const END_OF_STREAM: usize = 0;

#[derive(Clone, Copy)]
struct TreeNode {
    parent: i32,
    smaller: i32,
    larger: i32,
}

impl Default for TreeNode {
    fn default() -> Self {
        Self { parent: UNUSED, smaller: UNUSED, larger: UNUSED }
    }
}

struct Window {
    window: Vec<u8>,
    tree: Vec<TreeNode>,
}

fn mod_window(v: usize) -> usize {
    v & (WINDOW_SIZE - 1)
}

impl Window {
    fn new() -> Self {
        Self { window: vec![0u8; WINDOW_SIZE], tree: vec![TreeNode::default(); WINDOW_SIZE + 1] }
    }

    fn contract_node(&mut self, old: usize, new: i32) {
        let parent = self.tree[old].parent;
        if new != UNUSED {
            self.tree[new as usize].parent = parent;
        }
        if self.tree[parent as usize].larger == old as i32 {
            self.tree[parent as usize].larger = new;
        } else {
            self.tree[parent as usize].smaller = new;
        }
        self.tree[old].parent = UNUSED;
    }

    fn find_next_node(&self, node: usize) -> usize {
        let mut next = self.tree[node].smaller;
        while self.tree[next as usize].larger != UNUSED {
            next = self.tree[next as usize].larger;
        }
        next as usize
    }

    fn replace_node(&mut self, old: usize, new: usize) {
        let parent = self.tree[old].parent;
        if self.tree[parent as usize].smaller == old as i32 {
            self.tree[parent as usize].smaller = new as i32;
        } else {
            self.tree[parent as usize].larger = new as i32;
        }
        self.tree[new] = self.tree[old];
        let (ns, nl) = (self.tree[new].smaller, self.tree[new].larger);
        if ns != UNUSED {
            self.tree[ns as usize].parent = new as i32;
        }
        if nl != UNUSED {
            self.tree[nl as usize].parent = new as i32;
        }
        self.tree[old].parent = UNUSED;
    }

    /// Remove the string rooted at `position` from the tree. The two-child
    /// case recurses exactly one level in the source this is grounded on; that
    /// single level is inlined here instead of an actual recursive call.
    fn delete_string(&mut self, position: usize) {
        if self.tree[position].parent == UNUSED {
            return;
        }
        if self.tree[position].larger == UNUSED {
            let child = self.tree[position].smaller;
            self.contract_node(position, child);
        } else if self.tree[position].smaller == UNUSED {
            let child = self.tree[position].larger;
            self.contract_node(position, child);
        } else {
            let replacement = self.find_next_node(position);
            let child = self.tree[replacement].smaller;
            self.contract_node(replacement, child);
            self.replace_node(position, replacement);
        }
    }

    fn add_string(&mut self, pos: usize) {
        if self.tree[TREE_ROOT].larger == UNUSED {
            self.tree[TREE_ROOT].larger = pos as i32;
            self.tree[pos] = TreeNode { parent: TREE_ROOT as i32, smaller: UNUSED, larger: UNUSED };
            return;
        }
        let mut test_node = self.tree[TREE_ROOT].larger as usize;
        loop {
            let mut delta = 0i32;
            for i in 0..LOOK_AHEAD_SIZE {
                delta = self.window[mod_window(pos + i)] as i32 - self.window[mod_window(test_node + i)] as i32;
                if delta != 0 {
                    break;
                }
            }
            if delta == 0 {
                self.replace_node(test_node, pos);
                return;
            }
            let larger_side = delta > 0;
            let child = if larger_side { self.tree[test_node].larger } else { self.tree[test_node].smaller };
            if child == UNUSED {
                if larger_side {
                    self.tree[test_node].larger = pos as i32;
                } else {
                    self.tree[test_node].smaller = pos as i32;
                }
                self.tree[pos] = TreeNode { parent: test_node as i32, smaller: UNUSED, larger: UNUSED };
                return;
            }
            test_node = child as usize;
        }
    }

    /// Longest match of the look-ahead at `current_position` against any
    /// previously indexed position. Ties are broken by the last node visited
    /// during descent that achieves the current maximum.
    fn get_match_length(&self, current_position: usize) -> (usize, usize) {
        let mut match_position = 0usize;
        let mut match_length = 0usize;
        if self.tree[TREE_ROOT].larger == UNUSED {
            return (0, 0);
        }
        let mut test_node = self.tree[TREE_ROOT].larger as usize;
        loop {
            let mut delta = 0i32;
            let mut i = 0usize;
            while i < LOOK_AHEAD_SIZE {
                delta = self.window[mod_window(current_position + i)] as i32
                    - self.window[mod_window(test_node + i)] as i32;
                if delta != 0 {
                    break;
                }
                i += 1;
            }
            if i > match_length {
                match_length = i;
                match_position = test_node;
            }
            if delta == 0 {
                break;
            }
            let larger_side = delta > 0;
            let child = if larger_side { self.tree[test_node].larger } else { self.tree[test_node].smaller };
            if child == UNUSED {
                break;
            }
            test_node = child as usize;
        }
        (match_length, match_position)
    }
}

pub fn compress<R: Read, W: Write>(input: &mut R, output: &mut W) -> Result<(), Error> {
    let mut w = Window::new();
    let mut writer = BitWriter::new(Vec::new());
    let mut current_position = 0usize;
    let mut match_length = 0usize;
    let mut match_position = 0usize;

    let mut look_ahead_bytes = 0usize;
    for i in 0..LOOK_AHEAD_SIZE {
        let mut b = [0u8; 1];
        if input.read(&mut b)? == 0 {
            break;
        }
        w.window[current_position + i] = b[0];
        look_ahead_bytes = i + 1;
    }

    while look_ahead_bytes > 0 {
        if match_length >= look_ahead_bytes {
            match_length = look_ahead_bytes - 1;
        }
        if match_length <= BREAK_EVEN {
            match_length = 1;
            writer.output_bit(0)?;
            writer.output_bits(w.window[current_position] as u32, 8)?;
        } else {
            writer.output_bit(1)?;
            writer.output_bits(match_position as u32, INDEX_BIT_COUNT)?;
            writer.output_bits(match_length as u32, LENGTH_BIT_COUNT)?;
        }
        let replace_count = match_length;
        for _ in 0..replace_count {
            w.delete_string(mod_window(current_position + LOOK_AHEAD_SIZE));
            let mut b = [0u8; 1];
            if input.read(&mut b)? == 0 {
                look_ahead_bytes -= 1;
            } else {
                w.window[mod_window(current_position + LOOK_AHEAD_SIZE)] = b[0];
            }
            w.add_string(current_position);
            current_position = mod_window(current_position + 1);
        }
        if look_ahead_bytes > 0 {
            let (ml, mp) = w.get_match_length(current_position);
            match_length = ml;
            match_position = mp;
        }
    }
    writer.output_bit(1)?;
    writer.output_bits(END_OF_STREAM as u32, INDEX_BIT_COUNT + LENGTH_BIT_COUNT)?;
    let bytes = writer.close_output()?;
    output.write_all(&bytes)?;
    Ok(())
}

pub fn expand<R: Read, W: Write>(input: &mut R, output: &mut W) -> Result<(), Error> {
    let mut window = vec![0u8; WINDOW_SIZE];
    let mut reader = BitReader::new(input);
    let mut current_position = 0usize;
    loop {
        if reader.input_bit()? == 0 {
            let c = reader.input_bits(8)? as u8;
            output.write_all(&[c])?;
            window[current_position] = c;
            current_position = mod_window(current_position + 1);
        } else {
            let match_position = reader.input_bits(INDEX_BIT_COUNT)? as usize;
            let match_length = reader.input_bits(LENGTH_BIT_COUNT)? as usize;
            if match_length == END_OF_STREAM {
                break;
            }
            for i in 0..match_length {
                let c = window[mod_window(match_position + i)];
                output.write_all(&[c])?;
                window[current_position] = c;
                current_position = mod_window(current_position + 1);
            }
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
