//! Two-phase Markdown parsing engine.
//!
//! A first phase recognises block structure line by line against a stack of
//! open containers; a second phase resolves inline structure inside each
//! leaf block's accumulated lines. Both phases run pluggable parser sets
//! behind small `Match` interfaces; the default sets follow CommonMark.
//!
//! ```
//! let doc = loommark_core::parse("# Hello\n\n*world*\n").unwrap();
//! println!("{}", doc.tree_string());
//! ```

mod block;
mod block_parsers;
mod canonical;
mod cursor;
mod emphasis;
mod engine;
mod error;
mod inline;
mod inline_parsers;
mod line_group;
mod parser;
mod pool;
mod reader;
mod trace;

pub use block::{
    Block, BlockData, BlockId, ContainerBlock, ContainerKind, Document, FenceData, HtmlBlockKind,
    LeafBlock, LeafKind, ListData, ListItemData,
};
pub use block_parsers::{
    default_set as default_block_parsers, FencedCodeParser, HeadingParser, HtmlBlockParser,
    IndentedCodeParser, ListParser, ParagraphParser, QuoteParser, ThematicBreakParser,
};
pub use canonical::write_canonical;
pub use cursor::{CursorSnapshot, LineCursor};
pub use engine::{Engine, EngineOptions};
pub use error::EngineError;
pub use inline::{
    Inline, InlineContainerKind, InlineData, InlineId, InlineLeaf, InlineTree,
};
pub use inline_parsers::{
    default_set as default_inline_parsers, AutolinkParser, BracketParser, CodeSpanParser,
    EmphasisDelimiterParser, EscapeParser, LineBreakParser, LiteralParser,
};
pub use line_group::{GroupCursor, GroupLine, GroupSnapshot, LineGroup};
pub use parser::{BlockParser, BlockState, Delimiter, InlineParser, InlineState, MatchResult};
pub use pool::{Builder, BuilderPool};
pub use reader::{LineSource, StrLines};
pub use trace::{TraceSink, VecSink};

/// Parses with an engine over the default parser sets.
pub fn parse(source: &str) -> Result<Document, EngineError> {
    Engine::new()?.parse(source)
}
