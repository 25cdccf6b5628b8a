use crate::block::{
    Block, BlockData, BlockId, ContainerBlock, ContainerKind, Document, LeafBlock, LeafKind,
};
use crate::cursor::LineCursor;
use crate::inline::{InlineContainerKind, InlineId, InlineLeaf, InlineTree};
use crate::line_group::{GroupCursor, LineGroup};
use crate::pool::BuilderPool;

/// Outcome of a block parser's match, as interpreted by the driver.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MatchResult {
    /// Not recognised; the cursor must be restorable to the entry position.
    None,
    /// Recognised, block stays open; the line may still be passed on.
    Continue,
    /// `Continue`, but the rest of the line is consumed.
    ContinueDiscard,
    /// Recognised, block closes after this line; the line may be appended.
    Last,
    /// `Last`, and the rest of the line is consumed.
    LastDiscard,
    /// Continuation phase only: no claim on this line, yield to the next
    /// stack level without closing.
    Skip,
}

impl MatchResult {
    pub fn keeps_open(self) -> bool {
        matches!(self, MatchResult::Continue | MatchResult::ContinueDiscard)
    }

    pub fn discards_line(self) -> bool {
        matches!(self, MatchResult::ContinueDiscard | MatchResult::LastDiscard)
    }

    pub fn is_match(self) -> bool {
        !matches!(self, MatchResult::None | MatchResult::Skip)
    }
}

/// A block-level plug-in. One `match_line` entry point serves both driver
/// phases: `state.pending` carries the open block being probed during the
/// continuation phase and is `None` during the new-blocks phase.
pub trait BlockParser: Send + Sync {
    fn name(&self) -> &'static str;

    /// May this parser open a block while a paragraph is the deepest open
    /// block?
    fn can_interrupt_paragraph(&self) -> bool {
        true
    }

    /// Marks the terminal paragraph parser, which the driver special-cases
    /// for lazy continuation and blank-line handling.
    fn is_paragraph(&self) -> bool {
        false
    }

    fn match_line(&self, state: &mut BlockState) -> MatchResult;

    /// Finalize hook, invoked once when a block governed by this parser is
    /// closed. No line content may be appended afterwards.
    fn close(&self, doc: &mut Document, id: BlockId) {
        let _ = (doc, id);
    }
}

/// Mutable context threaded through block parsers: the current line cursor,
/// the open-block stack, the staging area for newly produced blocks, and
/// the shared builder pool.
pub struct BlockState {
    pub cursor: LineCursor,
    pub line_index: usize,
    pub doc: Document,
    /// Open-block stack; index 0 is the document root.
    pub open: Vec<BlockId>,
    /// The block being probed in the continuation phase.
    pub pending: Option<BlockId>,
    pub pool: BuilderPool,
    staged: Vec<BlockId>,
    pub(crate) current_parser: usize,
}

impl BlockState {
    pub(crate) fn new() -> Self {
        let doc = Document::new();
        let root = doc.root();
        Self {
            cursor: LineCursor::new(),
            line_index: 0,
            doc,
            open: vec![root],
            pending: None,
            pool: BuilderPool::new(),
            staged: Vec::new(),
            current_parser: 0,
        }
    }

    pub fn top(&self) -> BlockId {
        self.open.last().copied().unwrap_or_else(|| self.doc.root())
    }

    pub fn paragraph_on_top(&self) -> bool {
        self.doc.is_paragraph(self.top())
    }

    /// True when every block below the stack top continued on this line;
    /// distinguishes a real continuation from a lazy one.
    pub fn ancestors_continue(&self) -> bool {
        let len = self.open.len();
        self.open[..len.saturating_sub(1)]
            .iter()
            .all(|&id| self.doc.block(id).is_open)
    }

    /// The topmost stack entry that still continues this line, if it is a
    /// list container. Used to append sibling items instead of opening a
    /// second list.
    pub fn open_list(&self) -> Option<BlockId> {
        for &id in self.open.iter().rev() {
            let block = self.doc.block(id);
            if !block.is_open {
                continue;
            }
            return match &block.data {
                BlockData::Container(c) if matches!(c.kind, ContainerKind::List(_)) => Some(id),
                _ => None,
            };
        }
        None
    }

    /// Creates a container block in the staging area.
    pub fn stage_container(&mut self, kind: ContainerKind) -> BlockId {
        let id = self.doc.alloc(Block {
            parent: None,
            parser: Some(self.current_parser),
            is_open: true,
            line_index: self.line_index,
            data: BlockData::Container(ContainerBlock {
                kind,
                children: Vec::new(),
            }),
        });
        self.staged.push(id);
        id
    }

    /// Creates a leaf block in the staging area. A leaf must be the last
    /// block staged in a match call.
    pub fn stage_leaf(&mut self, kind: LeafKind, no_inline: bool) -> BlockId {
        let id = self.doc.alloc(Block {
            parent: None,
            parser: Some(self.current_parser),
            is_open: true,
            line_index: self.line_index,
            data: BlockData::Leaf(LeafBlock {
                kind,
                lines: LineGroup::new(),
                no_inline,
                inline: None,
            }),
        });
        self.staged.push(id);
        id
    }

    pub fn has_staged(&self) -> bool {
        !self.staged.is_empty()
    }

    pub(crate) fn take_staged(&mut self) -> Vec<BlockId> {
        std::mem::take(&mut self.staged)
    }
}

/// An inline-level plug-in.
pub trait InlineParser: Send + Sync {
    fn name(&self) -> &'static str;

    /// ASCII bytes this parser claims in the dispatch table. Empty means
    /// the parser joins the ordered regular list instead. Entries must be
    /// below 128 and unique across parsers.
    fn first_chars(&self) -> &[u8] {
        &[]
    }

    /// On success: either create a node and leave it in `state.inline`, or
    /// mutate existing open inlines and leave `state.inline` empty. On
    /// failure: leave `state.inline` empty; the caller restores the cursor.
    fn match_inline(&self, state: &mut InlineState<'_>) -> bool;
}

/// Recorded emphasis delimiter run, resolved by the post-pass.
#[derive(Clone, Copy, Debug)]
pub struct Delimiter {
    pub ch: u8,
    pub len: usize,
    /// The text node carrying the run.
    pub node: InlineId,
    pub can_open: bool,
    pub can_close: bool,
    pub orig_can_open: bool,
    pub orig_can_close: bool,
}

/// Mutable context threaded through inline parsers: the line-group cursor,
/// the tree under construction, the insertion point, the to-close queue,
/// and the delimiter/bracket records feeding the post-pass.
pub struct InlineState<'a> {
    pub cursor: GroupCursor<'a>,
    pub tree: InlineTree,
    /// Node produced by the last successful match, or the current insertion
    /// anchor between matches.
    pub inline: Option<InlineId>,
    /// Closable inlines pending end-of-lines finalisation.
    pub to_close: Vec<InlineId>,
    pub delims: Vec<Delimiter>,
    /// Open bracket containers, innermost last.
    pub brackets: Vec<InlineId>,
    /// Trailing literal node eligible for merging.
    pub literal_tail: Option<InlineId>,
    /// The owning leaf block.
    pub block: BlockId,
    pub pool: &'a BuilderPool,
    /// Dispatch-claimed bytes; the literal parser stops at these.
    pub specials: &'a [bool; 128],
}

impl<'a> InlineState<'a> {
    pub(crate) fn new(
        group: &'a LineGroup,
        block: BlockId,
        pool: &'a BuilderPool,
        specials: &'a [bool; 128],
    ) -> Self {
        Self {
            cursor: group.cursor(),
            tree: InlineTree::new(),
            inline: None,
            to_close: Vec::new(),
            delims: Vec::new(),
            brackets: Vec::new(),
            literal_tail: None,
            block,
            pool,
            specials,
        }
    }

    /// Allocates a leaf node and records it as the match product.
    pub fn emit(&mut self, leaf: InlineLeaf) -> InlineId {
        let id = self.tree.alloc_leaf(leaf);
        self.inline = Some(id);
        id
    }

    /// Allocates a container node and records it as the match product.
    pub fn emit_container(&mut self, kind: InlineContainerKind, closable: bool) -> InlineId {
        let id = self.tree.alloc_container(kind, closable);
        self.inline = Some(id);
        id
    }

    pub fn deepest_open(&self) -> InlineId {
        self.tree.deepest_open()
    }
}
