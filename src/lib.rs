//! # retrocompressor
//!
//! Five self-contained entropy/dictionary codecs, each a pure transducer
//! between a byte stream and a bit stream:
//!
//! * [`huffman`] - adaptive order-0 Huffman coding with an escape code for
//!   unseen symbols.
//! * [`bwt`] - Burrows-Wheeler Transform + Move-To-Front, entropy-coded with
//!   [`huffman`].
//! * [`lzss`] - sliding-window LZSS with a binary search tree over the
//!   window.
//! * [`lzw`] - variable-width LZW with a hash-probed dictionary.
//! * [`ppmc`] - PPMC context mixing driving a 16-bit arithmetic coder.
//!
//! All five sit on top of [`bitstream`], a single bit-granular reader/writer
//! pair. None of them know about an archive container, a command line, or a
//! filesystem - those are a collaborator's job. Each codec owns its own
//! transient state and discards it at the end of the call; nothing persists
//! across streams, and nothing is shared between codecs.
//!
//! ## Buffer example
//!
//! ```rs
//! use retrocompressor::huffman;
//! let test_data = b"the quick brown fox jumps over the lazy dog";
//! let compressed = huffman::compress_slice(test_data).expect("compression failed");
//! let expanded = huffman::expand_slice(&compressed).expect("expansion failed");
//! assert_eq!(expanded, test_data);
//! ```

pub mod bitstream;
pub mod huffman;
pub mod bwt;
pub mod lzss;
pub mod lzw;
pub mod ppmc;

/// Errors a codec can surface to its caller. Internal invariant violations
/// (a broken Huffman sibling property, an inconsistent LZSS tree, a null
/// PPMC vine pointer where a child was expected) are programmer errors and
/// show up as panics, not as a member of this enum - see spec's error model.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("unexpected end of stream")]
    UnexpectedEof,
    #[error("file format mismatch")]
    FileFormatMismatch,
    #[error("invalid code in compressed stream")]
    InvalidCode,
    #[error("arithmetic coder scale was zero")]
    ZeroScale,
    #[error("file too large")]
    FileTooLarge,
}
