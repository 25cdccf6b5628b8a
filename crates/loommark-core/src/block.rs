use crate::inline::InlineTree;
use crate::line_group::LineGroup;

/// Index of a block in the document arena.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct BlockId(pub u32);

impl BlockId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// A block node. The tree owns children through the arena; `parent` is a
/// back-reference, never ownership.
#[derive(Debug)]
pub struct Block {
    pub parent: Option<BlockId>,
    /// Index of the governing parser in the engine's block-parser list.
    /// `None` only for the document root.
    pub parser: Option<usize>,
    pub is_open: bool,
    /// 0-based source line where the block began.
    pub line_index: usize,
    pub data: BlockData,
}

#[derive(Debug)]
pub enum BlockData {
    Container(ContainerBlock),
    Leaf(LeafBlock),
}

#[derive(Debug)]
pub struct ContainerBlock {
    pub kind: ContainerKind,
    pub children: Vec<BlockId>,
}

#[derive(Debug)]
pub struct LeafBlock {
    pub kind: LeafKind,
    pub lines: LineGroup,
    /// Suppresses the inline phase for this leaf (code, HTML, breaks).
    pub no_inline: bool,
    /// Filled in by the inline phase.
    pub inline: Option<InlineTree>,
}

#[derive(Debug)]
pub enum ContainerKind {
    Document,
    Quote,
    List(ListData),
    ListItem(ListItemData),
}

#[derive(Debug, Clone)]
pub struct ListData {
    pub ordered: bool,
    pub start: Option<u64>,
    /// Bullet character, or the delimiter of an ordered marker (`.` / `)`).
    pub marker: u8,
    pub tight: bool,
    /// A blank line was seen while the list was open and has not yet been
    /// followed by more list content. Converts to `tight = false` only when
    /// the list goes on.
    pub pending_blank: bool,
}

#[derive(Debug, Clone)]
pub struct ListItemData {
    /// Column the item's content starts at; continuation lines must reach it.
    pub content_indent: usize,
}

#[derive(Debug)]
pub enum LeafKind {
    Paragraph,
    Heading { level: u8, setext: bool },
    FencedCode(FenceData),
    IndentedCode,
    ThematicBreak,
    HtmlBlock { kind: HtmlBlockKind },
}

#[derive(Debug, Clone)]
pub struct FenceData {
    pub marker: u8,
    pub length: usize,
    /// Indentation of the opening fence, stripped from body lines.
    pub indent: usize,
    pub info: String,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum HtmlBlockKind {
    /// `<pre>`/`<script>`/`<style>`/`<textarea>`, ended by the closing tag.
    Raw(&'static str),
    Comment,
    Processing,
    Declaration,
    Cdata,
    /// Known block-level tag, ended by a blank line.
    BlockTag,
    /// Any complete open/close tag on its own line, ended by a blank line.
    AnyTag,
}

/// The parsed document: an arena of blocks with index 0 as the root
/// container. Callers walk the tree through [`Document::children`] and read
/// each leaf's line group and inline tree.
#[derive(Debug)]
pub struct Document {
    blocks: Vec<Block>,
}

impl Document {
    pub(crate) fn new() -> Self {
        Self {
            blocks: vec![Block {
                parent: None,
                parser: None,
                is_open: true,
                line_index: 0,
                data: BlockData::Container(ContainerBlock {
                    kind: ContainerKind::Document,
                    children: Vec::new(),
                }),
            }],
        }
    }

    pub fn root(&self) -> BlockId {
        BlockId(0)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        false // the root is always present
    }

    pub fn block(&self, id: BlockId) -> &Block {
        &self.blocks[id.index()]
    }

    pub(crate) fn block_mut(&mut self, id: BlockId) -> &mut Block {
        &mut self.blocks[id.index()]
    }

    pub(crate) fn alloc(&mut self, block: Block) -> BlockId {
        let id = BlockId(self.blocks.len() as u32);
        self.blocks.push(block);
        id
    }

    pub fn children(&self, id: BlockId) -> &[BlockId] {
        match &self.block(id).data {
            BlockData::Container(c) => &c.children,
            BlockData::Leaf(_) => &[],
        }
    }

    pub(crate) fn push_child(&mut self, parent: BlockId, child: BlockId) {
        self.block_mut(child).parent = Some(parent);
        match &mut self.block_mut(parent).data {
            BlockData::Container(c) => c.children.push(child),
            BlockData::Leaf(_) => unreachable!("leaf blocks hold no children"),
        }
    }

    pub fn is_container(&self, id: BlockId) -> bool {
        matches!(self.block(id).data, BlockData::Container(_))
    }

    pub fn is_leaf(&self, id: BlockId) -> bool {
        matches!(self.block(id).data, BlockData::Leaf(_))
    }

    pub fn is_paragraph(&self, id: BlockId) -> bool {
        matches!(
            &self.block(id).data,
            BlockData::Leaf(leaf) if matches!(leaf.kind, LeafKind::Paragraph)
        )
    }

    pub fn leaf(&self, id: BlockId) -> Option<&LeafBlock> {
        match &self.block(id).data {
            BlockData::Leaf(leaf) => Some(leaf),
            BlockData::Container(_) => None,
        }
    }

    pub(crate) fn leaf_mut(&mut self, id: BlockId) -> Option<&mut LeafBlock> {
        match &mut self.block_mut(id).data {
            BlockData::Leaf(leaf) => Some(leaf),
            BlockData::Container(_) => None,
        }
    }

    /// Leaf blocks in pre-order document position.
    pub fn leaves(&self) -> Vec<BlockId> {
        let mut out = Vec::new();
        self.collect_leaves(self.root(), &mut out);
        out
    }

    fn collect_leaves(&self, id: BlockId, out: &mut Vec<BlockId>) {
        match &self.block(id).data {
            BlockData::Leaf(_) => out.push(id),
            BlockData::Container(c) => {
                for &child in &c.children {
                    self.collect_leaves(child, out);
                }
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (BlockId, &Block)> {
        self.blocks
            .iter()
            .enumerate()
            .map(|(idx, block)| (BlockId(idx as u32), block))
    }

    /// Indented one-node-per-line dump of the block tree and each leaf's
    /// inline tree. The shape is stable and is what the structural tests
    /// assert against.
    pub fn tree_string(&self) -> String {
        let mut out = String::new();
        self.write_block(self.root(), 0, &mut out);
        out
    }

    fn write_block(&self, id: BlockId, depth: usize, out: &mut String) {
        for _ in 0..depth {
            out.push_str("  ");
        }
        let block = self.block(id);
        match &block.data {
            BlockData::Container(c) => {
                match &c.kind {
                    ContainerKind::Document => out.push_str("document"),
                    ContainerKind::Quote => out.push_str("quote"),
                    ContainerKind::List(list) => {
                        out.push_str("list");
                        if list.ordered {
                            out.push_str(" ordered");
                            if let Some(start) = list.start {
                                out.push_str(&format!(" start={start}"));
                            }
                        }
                        if !list.tight {
                            out.push_str(" loose");
                        }
                    }
                    ContainerKind::ListItem(_) => out.push_str("item"),
                }
                out.push('\n');
                for &child in &c.children {
                    self.write_block(child, depth + 1, out);
                }
            }
            BlockData::Leaf(leaf) => {
                match &leaf.kind {
                    LeafKind::Paragraph => out.push_str("paragraph"),
                    LeafKind::Heading { level, setext } => {
                        out.push_str(&format!("heading level={level}"));
                        if *setext {
                            out.push_str(" setext");
                        }
                    }
                    LeafKind::FencedCode(fence) => {
                        out.push_str("fenced-code");
                        if !fence.info.is_empty() {
                            out.push_str(&format!(" info={:?}", fence.info));
                        }
                    }
                    LeafKind::IndentedCode => out.push_str("indented-code"),
                    LeafKind::ThematicBreak => out.push_str("thematic-break"),
                    LeafKind::HtmlBlock { .. } => out.push_str("html-block"),
                }
                out.push('\n');
                if let Some(tree) = &leaf.inline {
                    tree.write_tree(depth + 1, out);
                } else {
                    for line in leaf.lines.lines() {
                        for _ in 0..depth + 1 {
                            out.push_str("  ");
                        }
                        out.push_str(&format!("line {:?}\n", line.text));
                    }
                }
            }
        }
    }
}
