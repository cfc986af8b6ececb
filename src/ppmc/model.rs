//! Context-mixing model: per-context cumulative counts, escape, and
//! exclusion bookkeeping layered on top of the [`crate::ppmc::trie::Trie`].
//!
//! A context trie node's "order" is its depth; `cursor` is the node for the
//! context currently being consulted, `base_pointer` is the deepest node
//! touched by the most recent [`Model::update_model`] call, and
//! `escape_context` mirrors `base_pointer`'s depth so the encoder can skip
//! straight to the first non-empty context on its next symbol instead of
//! walking down from the top every time. `cursor == NIL` stands for the
//! order-(-1) uniform context - the one context that is guaranteed to have
//! every symbol, since it never excludes anything permanently.

use super::trie::{Trie, NodeId, NIL, ROOT};

pub const SYMBOL_COUNT: usize = 257;
pub const END_OF_STREAM: i32 = 256;
pub const ESCAPE: i32 = 257;

/// A cumulative-count range and the scale it's drawn against, ready to hand
/// to the arithmetic coder.
#[derive(Clone, Copy, Default)]
pub struct Symbol {
    pub low_count: u32,
    pub high_count: u32,
    pub scale: u32,
}

pub struct Model {
    trie: Trie,
    cursor: NodeId,
    base_pointer: NodeId,
    escape_context: i32,
    totals: [u32; SYMBOL_COUNT + 2],
    excluded: [bool; SYMBOL_COUNT],
    negative_one_context_table: [u32; SYMBOL_COUNT],
}

impl Model {
    pub fn new(order: usize) -> Self {
        Self {
            trie: Trie::new(order),
            cursor: ROOT,
            base_pointer: ROOT,
            escape_context: 0,
            totals: [0; SYMBOL_COUNT + 2],
            excluded: [false; SYMBOL_COUNT],
            negative_one_context_table: [1; SYMBOL_COUNT],
        }
    }

    fn clear_exclusions(&mut self) {
        self.excluded = [false; SYMBOL_COUNT];
    }

    /// Mark every child of the current context as excluded, so that a lower
    /// order falling back from an escape here won't re-predict them.
    fn mark_excluded_children(&mut self) {
        if self.cursor == NIL {
            return;
        }
        let mut child = self.trie.node(self.cursor).down;
        while child != NIL {
            let n = self.trie.node(child);
            self.excluded[n.symbol as usize] = true;
            child = n.next;
        }
    }

    /// Rebuild `totals` from scratch from the current context's children (or
    /// the order-(-1) uniform table when `cursor` is `NIL`), masking out
    /// whatever is currently excluded.
    fn rebuild_totals(&mut self) {
        let mut counts = [0u32; SYMBOL_COUNT];
        let extra;
        if self.cursor != NIL {
            let mut child = self.trie.node(self.cursor).down;
            while child != NIL {
                let n = self.trie.node(child);
                counts[n.symbol as usize] = n.context_count as u32;
                child = n.next;
            }
            extra = self.trie.node(self.cursor).children as u32;
        } else {
            counts = self.negative_one_context_table;
            extra = 0;
        }
        self.totals[0] = 0;
        for i in 0..SYMBOL_COUNT {
            let contribution = if self.excluded[i] { 0 } else { counts[i] };
            self.totals[i + 1] = self.totals[i] + contribution;
        }
        self.totals[SYMBOL_COUNT + 1] = self.totals[SYMBOL_COUNT] + extra;
    }

    /// Encoder side: produce the range for symbol `c`, dropping to the first
    /// non-empty context along the escape_context fast path first. Returns
    /// whether this range was an escape (caller must re-query at the new,
    /// lower context for the same `c`).
    pub fn convert_int_to_symbol(&mut self, c: i32) -> (Symbol, bool) {
        if self.escape_context >= 0 {
            while self.cursor != NIL {
                if self.trie.node(self.cursor).children > 0 {
                    break;
                }
                self.escape_context -= 1;
                self.cursor = self.trie.node(self.cursor).vine;
            }
        }
        let found = self.cursor != NIL && self.trie.find(self.cursor, c).is_some();
        self.rebuild_totals();
        if self.cursor == NIL || found {
            self.clear_exclusions();
            let s = Symbol {
                low_count: self.totals[c as usize],
                high_count: self.totals[c as usize + 1],
                scale: self.totals[ESCAPE as usize + 1],
            };
            (s, false)
        } else {
            self.mark_excluded_children();
            let s = Symbol {
                low_count: self.totals[ESCAPE as usize],
                high_count: self.totals[ESCAPE as usize + 1],
                scale: self.totals[ESCAPE as usize + 1],
            };
            self.cursor = self.trie.node(self.cursor).vine;
            self.escape_context -= 1;
            (s, true)
        }
    }

    /// Decoder side: drop to the first non-empty context and report its
    /// scale, ahead of the caller asking the arithmetic coder for an index.
    pub fn symbol_scale(&mut self) -> u32 {
        while self.cursor != NIL {
            if self.trie.node(self.cursor).children > 0 {
                break;
            }
            self.cursor = self.trie.node(self.cursor).vine;
        }
        self.rebuild_totals();
        self.totals[ESCAPE as usize + 1]
    }

    /// Decoder side: map a cumulative-count `index` back to a symbol (which
    /// may be `ESCAPE`), and fall back one context if it was an escape.
    pub fn convert_symbol_to_int(&mut self, index: u32) -> (i32, Symbol) {
        let mut c = ESCAPE;
        while index < self.totals[c as usize] {
            c -= 1;
        }
        let s = Symbol {
            low_count: self.totals[c as usize],
            high_count: self.totals[c as usize + 1],
            scale: self.totals[ESCAPE as usize + 1],
        };
        if c == ESCAPE {
            self.mark_excluded_children();
            self.cursor = self.trie.node(self.cursor).vine;
        } else {
            self.clear_exclusions();
        }
        (c, s)
    }

    /// Insert `c` into the trie along the whole vine chain from
    /// `base_pointer` back to the root, then reposition `cursor` and
    /// `base_pointer` at the deepest newly-touched node.
    pub fn update_model(&mut self, c: i32) {
        let mut context = self.base_pointer;
        if self.trie.node(context).depth == self.trie.max_depth {
            context = self.trie.node(context).vine;
        }
        let mut inserted = self.trie.insert(context, c);
        if self.trie.node(inserted).context_count == 255 {
            log::trace!("rescaling context counts at depth {}", self.trie.node(context).depth);
            self.trie.rescale_context_count(context);
        }
        self.base_pointer = inserted;
        let mut vine_updater = inserted;
        while self.trie.node(context).depth > 0 {
            context = self.trie.node(context).vine;
            inserted = self.trie.insert(context, c);
            if self.trie.node(inserted).context_count == 255 {
                log::trace!("rescaling context counts at depth {}", self.trie.node(context).depth);
                self.trie.rescale_context_count(context);
            }
            self.trie.set_vine(vine_updater, inserted);
            vine_updater = inserted;
        }
        debug_assert_eq!(context, ROOT, "vine chain must bottom out at the root");
        let root_child = self.trie.find(context, c).expect("root always gets a child for every symbol seen");
        self.trie.set_vine(root_child, context);
        self.cursor = self.base_pointer;
        self.escape_context = self.trie.node(self.base_pointer).depth as i32;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_one_context_has_every_symbol_with_width_one() {
        let mut m = Model::new(3);
        let scale = m.symbol_scale();
        assert_eq!(scale, SYMBOL_COUNT as u32);
        for c in 0..SYMBOL_COUNT as i32 {
            let (s, escaped) = m.convert_int_to_symbol(c);
            assert!(!escaped);
            assert_eq!(s.high_count - s.low_count, 1);
            // order -1 has no state to reset between queries
        }
    }

    #[test]
    fn seen_symbol_eventually_stops_escaping() {
        let mut m = Model::new(3);
        for _ in 0..20 {
            let (_, escaped) = m.convert_int_to_symbol(b'a' as i32);
            if !escaped {
                m.update_model(b'a' as i32);
                return;
            }
            m.update_model(b'a' as i32);
        }
        panic!("symbol never stopped escaping");
    }
}
