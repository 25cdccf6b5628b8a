use rayon::prelude::*;

use crate::block::{BlockId, Document};
use crate::block_parsers;
use crate::emphasis;
use crate::error::EngineError;
use crate::inline::{InlineData, InlineTree};
use crate::inline_parsers;
use crate::line_group::LineGroup;
use crate::parser::{BlockParser, BlockState, InlineParser, InlineState, MatchResult};
use crate::pool::BuilderPool;
use crate::reader::{LineSource, StrLines};
use crate::trace::TraceSink;

#[derive(Clone, Copy, Debug, Default)]
pub struct EngineOptions {
    /// Fan the inline phase out across leaves. Results are identical to the
    /// sequential path; per-leaf state is disjoint.
    pub parallel_inline: bool,
}

/// The two-phase orchestrator: owns the block-parser list, the inline
/// dispatch table, and the drivers for both phases.
pub struct Engine {
    block_parsers: Vec<Box<dyn BlockParser>>,
    inline_parsers: Vec<Box<dyn InlineParser>>,
    /// First-char fast path: at most one inline parser per ASCII byte.
    dispatch: [Option<usize>; 128],
    /// Parsers with no first-char claim, in declared order.
    regular: Vec<usize>,
    /// Bytes claimed in the dispatch table; literal runs stop at these.
    specials: [bool; 128],
    /// Index of the terminal paragraph parser.
    paragraph: usize,
    options: EngineOptions,
}

impl Engine {
    /// Engine over the default CommonMark parser sets.
    pub fn new() -> Result<Self, EngineError> {
        Self::with_options(EngineOptions::default())
    }

    pub fn with_options(options: EngineOptions) -> Result<Self, EngineError> {
        Self::with_parsers(
            block_parsers::default_set(),
            inline_parsers::default_set(),
            options,
        )
    }

    /// Engine over caller-supplied parser lists, in priority order. The
    /// lists are fixed for the engine's lifetime; first-char conflicts and
    /// a missing paragraph parser fail here.
    pub fn with_parsers(
        block_parsers: Vec<Box<dyn BlockParser>>,
        inline_parsers: Vec<Box<dyn InlineParser>>,
        options: EngineOptions,
    ) -> Result<Self, EngineError> {
        let paragraph = block_parsers
            .iter()
            .position(|parser| parser.is_paragraph())
            .ok_or(EngineError::NoParagraphParser)?;

        let mut dispatch: [Option<usize>; 128] = [None; 128];
        let mut specials = [false; 128];
        let mut regular = Vec::new();
        for (idx, parser) in inline_parsers.iter().enumerate() {
            let chars = parser.first_chars();
            if chars.is_empty() {
                regular.push(idx);
                continue;
            }
            for &byte in chars {
                if byte >= 128 {
                    return Err(EngineError::NonAsciiFirstChar {
                        parser: parser.name(),
                        byte,
                    });
                }
                if let Some(prev) = dispatch[byte as usize] {
                    return Err(EngineError::DuplicateFirstChar {
                        first: inline_parsers[prev].name(),
                        second: parser.name(),
                        byte: byte as char,
                    });
                }
                dispatch[byte as usize] = Some(idx);
                specials[byte as usize] = true;
            }
        }

        Ok(Self {
            block_parsers,
            inline_parsers,
            dispatch,
            regular,
            specials,
            paragraph,
            options,
        })
    }

    pub fn parse(&self, source: &str) -> Result<Document, EngineError> {
        self.parse_from(StrLines::new(source), &mut None)
    }

    pub fn parse_with_trace(
        &self,
        source: &str,
        sink: &mut dyn TraceSink,
    ) -> Result<Document, EngineError> {
        self.parse_from(StrLines::new(source), &mut Some(sink))
    }

    pub fn parse_source<S: LineSource>(&self, source: S) -> Result<Document, EngineError> {
        self.parse_from(source, &mut None)
    }

    fn parse_from<S: LineSource>(
        &self,
        mut source: S,
        trace: &mut Option<&mut dyn TraceSink>,
    ) -> Result<Document, EngineError> {
        let mut state = BlockState::new();
        while let Some(line) = source.next_line() {
            if let Some(sink) = trace.as_deref_mut() {
                sink.line_start(state.line_index, line);
            }
            state.cursor.reset(line);
            self.process_line(&mut state, trace)?;
            state.line_index += 1;
        }
        // End of input: close everything but the document, deepest first.
        while state.open.len() > 1 {
            self.close_top(&mut state, trace);
        }
        let mut doc = state.doc;
        self.process_inlines(&mut doc);
        Ok(doc)
    }

    fn process_line(
        &self,
        state: &mut BlockState,
        trace: &mut Option<&mut dyn TraceSink>,
    ) -> Result<(), EngineError> {
        let continue_line = self.continue_pending(state, trace)?;
        if continue_line {
            self.open_new_blocks(state, trace)?;
        }
        // Blocks whose open flag was never re-established close now, which
        // keeps every stacked block open between lines.
        while state.open.len() > 1 && !state.doc.block(state.top()).is_open {
            self.close_top(state, trace);
        }
        Ok(())
    }

    /// Continuation phase: asks each open block, shallowest first, whether
    /// the new line continues it. Returns whether the line still has
    /// content to offer the new-blocks phase.
    fn continue_pending(
        &self,
        state: &mut BlockState,
        trace: &mut Option<&mut dyn TraceSink>,
    ) -> Result<bool, EngineError> {
        for idx in 1..state.open.len() {
            let id = state.open[idx];
            state.doc.block_mut(id).is_open = false;
        }

        let mut i = 1;
        while i < state.open.len() {
            let id = state.open[i];
            if state.doc.is_paragraph(id) {
                // Paragraphs are probed by the new-blocks phase, where a new
                // block may interrupt them first.
                break;
            }
            let parser_idx = match state.doc.block(id).parser {
                Some(parser_idx) => parser_idx,
                None => {
                    i += 1;
                    continue;
                }
            };
            state.pending = Some(id);
            state.current_parser = parser_idx;
            state.cursor.save();
            let result = self.block_parsers[parser_idx].match_line(state);
            state.pending = None;
            match result {
                MatchResult::Skip | MatchResult::None => {
                    state.cursor.restore();
                    if state.has_staged() {
                        return Err(EngineError::InvariantViolation {
                            reason: "pending parser staged blocks but made no claim".to_string(),
                            line_index: state.line_index,
                            parser: self.block_parsers[parser_idx].name(),
                        });
                    }
                    if result == MatchResult::None {
                        // This and all deeper blocks stay tentatively closed.
                        return Ok(true);
                    }
                    state.doc.block_mut(id).is_open = true;
                    i += 1;
                }
                result => {
                    state.cursor.commit();
                    state.doc.block_mut(id).is_open = result.keeps_open();
                    if state.has_staged() {
                        if i != state.open.len() - 1 {
                            return Err(EngineError::InvariantViolation {
                                reason: "pending parser staged blocks while not the deepest open block"
                                    .to_string(),
                                line_index: state.line_index,
                                parser: self.block_parsers[parser_idx].name(),
                            });
                        }
                        let leaf_on_top = self.attach_staged(state, result, false, trace)?;
                        return Ok(!leaf_on_top);
                    }
                    if state.doc.is_leaf(id) {
                        if !result.discards_line() {
                            let text = state.cursor.remainder().into_owned();
                            if let Some(leaf) = state.doc.leaf_mut(id) {
                                leaf.lines.push(text, state.line_index);
                            }
                        }
                        // A leaf consumes the line.
                        return Ok(false);
                    }
                    if result == MatchResult::LastDiscard {
                        return Ok(false);
                    }
                    i += 1;
                }
            }
        }
        Ok(true)
    }

    /// New-blocks phase: runs the parser list in priority order over the
    /// remaining line, restarting after each attached container so nested
    /// containers can open on the same line.
    fn open_new_blocks(
        &self,
        state: &mut BlockState,
        trace: &mut Option<&mut dyn TraceSink>,
    ) -> Result<(), EngineError> {
        'line: loop {
            if state.cursor.is_eol() {
                return Ok(());
            }
            for (parser_idx, parser) in self.block_parsers.iter().enumerate() {
                if state.paragraph_on_top() && !parser.can_interrupt_paragraph() {
                    continue;
                }
                state.pending = None;
                state.current_parser = parser_idx;
                state.cursor.save();
                let result = parser.match_line(state);
                if !result.is_match() {
                    // `Skip` from this phase reads as `None`.
                    state.cursor.restore();
                    if state.has_staged() {
                        return Err(EngineError::InvariantViolation {
                            reason: "parser staged blocks but did not match".to_string(),
                            line_index: state.line_index,
                            parser: parser.name(),
                        });
                    }
                    if parser_idx == self.paragraph && state.cursor.is_blank() {
                        // A blank line opens nothing.
                        return Ok(());
                    }
                    continue;
                }
                state.cursor.commit();

                if parser_idx == self.paragraph && state.paragraph_on_top() && !state.has_staged()
                {
                    // Direct or lazy paragraph continuation: append the line
                    // and reopen every ancestor the continuation phase had
                    // tentatively closed.
                    let top = state.top();
                    let text = state.cursor.remainder().into_owned();
                    if let Some(leaf) = state.doc.leaf_mut(top) {
                        leaf.lines.push(text, state.line_index);
                    }
                    for idx in 0..state.open.len() {
                        let id = state.open[idx];
                        state.doc.block_mut(id).is_open = true;
                    }
                    return Ok(());
                }

                if state.has_staged() {
                    let leaf_on_top = self.attach_staged(state, result, true, trace)?;
                    if leaf_on_top {
                        return Ok(());
                    }
                    continue 'line;
                }

                // Success without staged blocks mutates an existing block
                // (setext promotion); the line is done.
                return Ok(());
            }
            return Ok(());
        }
    }

    /// Attaches staged blocks to the tree and the open-block stack.
    /// Returns true when the new stack top is a leaf (the line is done).
    fn attach_staged(
        &self,
        state: &mut BlockState,
        result: MatchResult,
        allow_close: bool,
        trace: &mut Option<&mut dyn TraceSink>,
    ) -> Result<bool, EngineError> {
        let staged = state.take_staged();
        let count = staged.len();
        for (idx, id) in staged.into_iter().enumerate() {
            let is_leaf = state.doc.is_leaf(id);
            if is_leaf && idx + 1 != count {
                return Err(EngineError::InvariantViolation {
                    reason: "leaf-producing parser staged further blocks after the leaf"
                        .to_string(),
                    line_index: state.line_index,
                    parser: self.block_parsers[state.current_parser].name(),
                });
            }
            state.doc.block_mut(id).line_index = state.line_index;
            if is_leaf && !result.discards_line() {
                let text = state.cursor.remainder().into_owned();
                if let Some(leaf) = state.doc.leaf_mut(id) {
                    leaf.lines.push(text, state.line_index);
                }
            }
            if allow_close {
                while state.open.len() > 1 && !state.doc.block(state.top()).is_open {
                    self.close_top(state, trace);
                }
            }
            if state.doc.block(id).parent.is_none() {
                // The deepest open block is a container here (an open leaf
                // would have consumed the line already).
                let parent = state.top();
                state.doc.push_child(parent, id);
            }
            state.doc.block_mut(id).is_open = result.keeps_open();
            state.open.push(id);
            if let Some(sink) = trace.as_deref_mut() {
                sink.block_opened(state.line_index, self.block_parsers[state.current_parser].name());
            }
            if is_leaf {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn close_top(&self, state: &mut BlockState, trace: &mut Option<&mut dyn TraceSink>) {
        let id = match state.open.pop() {
            Some(id) => id,
            None => return,
        };
        state.doc.block_mut(id).is_open = false;
        if let Some(parser_idx) = state.doc.block(id).parser {
            self.block_parsers[parser_idx].close(&mut state.doc, id);
            if let Some(sink) = trace.as_deref_mut() {
                sink.block_closed(state.line_index, self.block_parsers[parser_idx].name());
            }
        }
    }

    /// Inline phase: walks leaves in document order and resolves each one's
    /// inline tree. Leaves are independent; the parallel path gives each
    /// worker its own builder pool and produces identical trees.
    fn process_inlines(&self, doc: &mut Document) {
        let leaves: Vec<BlockId> = doc
            .leaves()
            .into_iter()
            .filter(|&id| doc.leaf(id).map(|leaf| !leaf.no_inline).unwrap_or(false))
            .collect();

        if self.options.parallel_inline {
            let shared: &Document = doc;
            let trees: Vec<(BlockId, InlineTree)> = leaves
                .par_iter()
                .filter_map(|&id| {
                    let leaf = shared.leaf(id)?;
                    let pool = BuilderPool::new();
                    Some((id, self.parse_leaf_inlines(&leaf.lines, id, &pool)))
                })
                .collect();
            for (id, tree) in trees {
                if let Some(leaf) = doc.leaf_mut(id) {
                    leaf.inline = Some(tree);
                }
            }
        } else {
            let pool = BuilderPool::new();
            for id in leaves {
                let tree = match doc.leaf(id) {
                    Some(leaf) => self.parse_leaf_inlines(&leaf.lines, id, &pool),
                    None => continue,
                };
                if let Some(leaf) = doc.leaf_mut(id) {
                    leaf.inline = Some(tree);
                }
            }
        }
    }

    /// Scans one leaf's line group into an inline tree: first-char
    /// dispatch, then the regular list, then literal fallback; finally the
    /// to-close drain and the emphasis post-pass (which always runs).
    pub fn parse_leaf_inlines(
        &self,
        group: &LineGroup,
        block: BlockId,
        pool: &BuilderPool,
    ) -> InlineTree {
        let mut state = InlineState::new(group, block, pool, &self.specials);

        while let Some(byte) = state.cursor.peek() {
            state.cursor.save();
            let mut matched = false;
            if (byte as usize) < 128 {
                if let Some(parser_idx) = self.dispatch[byte as usize] {
                    state.inline = None;
                    if self.inline_parsers[parser_idx].match_inline(&mut state) {
                        matched = true;
                        state.cursor.commit();
                        self.finish_inline_match(&mut state);
                    } else {
                        state.cursor.restore();
                        state.cursor.save();
                    }
                }
            }
            if !matched {
                for &parser_idx in &self.regular {
                    state.inline = None;
                    if self.inline_parsers[parser_idx].match_inline(&mut state) {
                        matched = true;
                        state.cursor.commit();
                        self.finish_inline_match(&mut state);
                        break;
                    }
                    state.cursor.restore();
                    state.cursor.save();
                }
            }
            if !matched {
                // Default literal handling: the byte becomes text.
                state.cursor.restore();
                state.inline = None;
                inline_parsers::fallback_literal(&mut state);
                self.finish_inline_match(&mut state);
            }
        }

        let to_close = std::mem::take(&mut state.to_close);
        for id in to_close {
            inline_parsers::close_inline(&mut state, id);
        }
        emphasis::process_emphasis(&mut state.tree, &mut state.delims);
        state.tree
    }

    /// Attachment step shared by all inline matches.
    fn finish_inline_match(&self, state: &mut InlineState<'_>) {
        match state.inline {
            Some(node) => {
                if state.tree.node(node).parent.is_none() && node != state.tree.root() {
                    let parent = state.tree.deepest_open();
                    state.tree.push_child(parent, node);
                }
                let inline = state.tree.node(node);
                if inline.is_closable
                    && !inline.is_closed
                    && state.to_close.last() != Some(&node)
                {
                    state.to_close.push(node);
                }
                if state.literal_tail != Some(node) {
                    state.literal_tail = None;
                }
            }
            None => {
                // The parser mutated existing inlines; recompute a valid
                // insertion anchor.
                let container = state.tree.deepest_open();
                let anchor = match state.tree.children(container).last() {
                    Some(&last)
                        if matches!(state.tree.node(last).data, InlineData::Leaf(_)) =>
                    {
                        last
                    }
                    _ => container,
                };
                state.inline = Some(anchor);
                state.literal_tail = None;
            }
        }
    }
}
