//! Default block parsers. Grammar follows CommonMark; each parser speaks
//! the driver protocol through [`BlockState`] and [`MatchResult`].

use crate::block::{
    BlockData, BlockId, ContainerKind, Document, FenceData, HtmlBlockKind, LeafKind, ListData,
    ListItemData,
};
use crate::parser::{BlockParser, BlockState, MatchResult};

/// The default set, in priority order. Heading precedes the thematic break
/// so a setext `---` under a paragraph wins over a break; indented code
/// sits just above the terminal paragraph parser.
pub fn default_set() -> Vec<Box<dyn BlockParser>> {
    vec![
        Box::new(HeadingParser),
        Box::new(ThematicBreakParser),
        Box::new(QuoteParser),
        Box::new(FencedCodeParser),
        Box::new(HtmlBlockParser),
        Box::new(ListParser),
        Box::new(IndentedCodeParser),
        Box::new(ParagraphParser),
    ]
}

/// ATX headings, plus setext promotion of a pending paragraph.
pub struct HeadingParser;

impl BlockParser for HeadingParser {
    fn name(&self) -> &'static str {
        "heading"
    }

    fn match_line(&self, state: &mut BlockState) -> MatchResult {
        if state.pending.is_some() {
            // Headings close on their own line; nothing continues them.
            return MatchResult::None;
        }

        let atx = {
            let rest = state.cursor.remainder();
            parse_atx_heading(&rest)
        };
        if let Some((level, start, end)) = atx {
            state.cursor.consume(start);
            state.cursor.limit_remainder(end - start);
            state.stage_leaf(
                LeafKind::Heading {
                    level,
                    setext: false,
                },
                false,
            );
            return MatchResult::Last;
        }

        // Setext underline: promotes the paragraph on top of the stack, but
        // only when every ancestor truly continued this line (a lazy
        // underline stays paragraph text).
        if state.paragraph_on_top() && state.ancestors_continue() {
            let level = {
                let rest = state.cursor.remainder();
                setext_underline_level(&rest)
            };
            if let Some(level) = level {
                let top = state.top();
                if let Some(leaf) = state.doc.leaf_mut(top) {
                    leaf.kind = LeafKind::Heading {
                        level,
                        setext: true,
                    };
                }
                return MatchResult::LastDiscard;
            }
        }

        MatchResult::None
    }
}

pub struct ThematicBreakParser;

impl BlockParser for ThematicBreakParser {
    fn name(&self) -> &'static str {
        "thematic_break"
    }

    fn match_line(&self, state: &mut BlockState) -> MatchResult {
        if state.pending.is_some() {
            return MatchResult::None;
        }
        let matched = {
            let rest = state.cursor.remainder();
            is_thematic_break_line(&rest)
        };
        if !matched {
            return MatchResult::None;
        }
        state.stage_leaf(LeafKind::ThematicBreak, true);
        MatchResult::LastDiscard
    }
}

/// `>` block quotes. Opening and continuation share the marker match; lazy
/// continuation without the marker is the driver's paragraph special case.
pub struct QuoteParser;

impl QuoteParser {
    fn eat_marker(state: &mut BlockState) -> bool {
        state.cursor.skip_spaces_up_to(3);
        if state.cursor.peek() != Some(b'>') {
            return false;
        }
        state.cursor.bump();
        // One following space or tab column belongs to the marker.
        if matches!(state.cursor.peek(), Some(b' ') | Some(b'\t')) {
            state.cursor.bump();
        }
        true
    }
}

impl BlockParser for QuoteParser {
    fn name(&self) -> &'static str {
        "quote"
    }

    fn match_line(&self, state: &mut BlockState) -> MatchResult {
        if !Self::eat_marker(state) {
            return MatchResult::None;
        }
        if state.pending.is_none() {
            state.stage_container(ContainerKind::Quote);
        }
        MatchResult::Continue
    }
}

/// ``` and ~~~ fenced code blocks.
pub struct FencedCodeParser;

impl BlockParser for FencedCodeParser {
    fn name(&self) -> &'static str {
        "fenced_code"
    }

    fn match_line(&self, state: &mut BlockState) -> MatchResult {
        if let Some(id) = state.pending {
            let (marker, length, indent) = match &state.doc.block(id).data {
                BlockData::Leaf(leaf) => match &leaf.kind {
                    LeafKind::FencedCode(fence) => (fence.marker, fence.length, fence.indent),
                    _ => return MatchResult::None,
                },
                BlockData::Container(_) => return MatchResult::None,
            };
            let closes = {
                let rest = state.cursor.remainder();
                is_fence_close(&rest, length, marker)
            };
            if closes {
                return MatchResult::LastDiscard;
            }
            // Body lines lose up to the opening fence's indentation.
            state.cursor.skip_spaces_up_to(indent);
            return MatchResult::Continue;
        }

        let opened = {
            let rest = state.cursor.remainder();
            parse_fence_open(&rest)
        };
        match opened {
            Some((indent, length, marker, info)) => {
                state.stage_leaf(
                    LeafKind::FencedCode(FenceData {
                        marker,
                        length,
                        indent,
                        info,
                    }),
                    true,
                );
                MatchResult::ContinueDiscard
            }
            None => MatchResult::None,
        }
    }
}

/// Four-column indented code. Never interrupts a paragraph.
pub struct IndentedCodeParser;

impl BlockParser for IndentedCodeParser {
    fn name(&self) -> &'static str {
        "indented_code"
    }

    fn can_interrupt_paragraph(&self) -> bool {
        false
    }

    fn match_line(&self, state: &mut BlockState) -> MatchResult {
        let blank = state.cursor.is_blank();
        if state.pending.is_some() {
            if blank {
                // Interior blank lines stay; trailing ones are trimmed at
                // close.
                state.cursor.skip_columns(4);
                return MatchResult::Continue;
            }
            if state.cursor.indent_width() >= 4 {
                state.cursor.skip_columns(4);
                return MatchResult::Continue;
            }
            return MatchResult::None;
        }
        if blank || state.cursor.indent_width() < 4 {
            return MatchResult::None;
        }
        state.cursor.skip_columns(4);
        state.stage_leaf(LeafKind::IndentedCode, true);
        MatchResult::Continue
    }

    fn close(&self, doc: &mut Document, id: BlockId) {
        if let Some(leaf) = doc.leaf_mut(id) {
            let lines = leaf.lines.lines_mut();
            while lines
                .last()
                .map(|line| line.text.bytes().all(|b| b == b' ' || b == b'\t'))
                .unwrap_or(false)
            {
                lines.pop();
            }
        }
    }
}

/// CommonMark HTML blocks, kinds 1–7.
pub struct HtmlBlockParser;

impl BlockParser for HtmlBlockParser {
    fn name(&self) -> &'static str {
        "html_block"
    }

    fn match_line(&self, state: &mut BlockState) -> MatchResult {
        if let Some(id) = state.pending {
            let kind = match &state.doc.block(id).data {
                BlockData::Leaf(leaf) => match leaf.kind {
                    LeafKind::HtmlBlock { kind } => kind,
                    _ => return MatchResult::None,
                },
                BlockData::Container(_) => return MatchResult::None,
            };
            return match kind {
                HtmlBlockKind::BlockTag | HtmlBlockKind::AnyTag => {
                    if state.cursor.is_blank() {
                        // The blank line is not part of the block.
                        MatchResult::None
                    } else {
                        MatchResult::Continue
                    }
                }
                _ => {
                    let ends = {
                        let rest = state.cursor.remainder();
                        html_block_ends(kind, &rest)
                    };
                    if ends {
                        MatchResult::Last
                    } else {
                        MatchResult::Continue
                    }
                }
            };
        }

        let (kind, ends_same_line) = {
            let rest = state.cursor.remainder();
            match match_html_block_start(&rest) {
                Some(kind) => {
                    let ends = !matches!(kind, HtmlBlockKind::BlockTag | HtmlBlockKind::AnyTag)
                        && html_block_ends(kind, &rest);
                    (kind, ends)
                }
                None => return MatchResult::None,
            }
        };
        if matches!(kind, HtmlBlockKind::AnyTag) && state.paragraph_on_top() {
            // Kind 7 cannot interrupt a paragraph.
            return MatchResult::None;
        }
        state.stage_leaf(LeafKind::HtmlBlock { kind }, true);
        if ends_same_line {
            MatchResult::Last
        } else {
            MatchResult::Continue
        }
    }
}

/// Bullet and ordered lists plus their items. The parser governs both
/// container levels: the list itself yields (`Skip`) while its items make
/// the per-line decisions.
pub struct ListParser;

impl ListParser {
    fn continue_list(&self, state: &mut BlockState, id: BlockId) -> MatchResult {
        if state.cursor.is_blank() {
            // A blank swallowed by an open code or raw-HTML leaf is interior
            // content, not a separator, and must not loosen the list.
            if !blank_absorbed_by_leaf(state) {
                if let Some(list) = list_data_mut(&mut state.doc, id) {
                    list.pending_blank = true;
                }
            }
            return MatchResult::Skip;
        }
        let indent = state.cursor.indent_width();
        let content_indent = last_item_indent(&state.doc, id);
        if indent >= content_indent {
            return MatchResult::Skip;
        }
        let marker = {
            let base = state.cursor.column();
            let rest = state.cursor.remainder();
            parse_list_marker(&rest, base)
        };
        if let Some(marker) = marker {
            if let Some(list) = list_data(&state.doc, id) {
                if marker.ordered == list.ordered && marker.marker == list.marker {
                    // A sibling item will claim the line.
                    return MatchResult::Skip;
                }
            }
        }
        MatchResult::None
    }

    fn continue_item(&self, state: &mut BlockState, id: BlockId) -> MatchResult {
        let content_indent = match item_data(&state.doc, id) {
            Some(item) => item.content_indent,
            None => return MatchResult::None,
        };
        if state.cursor.is_blank() {
            state.cursor.skip_columns(content_indent);
            return MatchResult::Continue;
        }
        if state.cursor.indent_width() >= content_indent {
            state.cursor.skip_columns(content_indent);
            if let Some(list_id) = state.doc.block(id).parent {
                resolve_pending_blank(&mut state.doc, list_id);
            }
            return MatchResult::Continue;
        }
        MatchResult::None
    }

    fn open_item(&self, state: &mut BlockState) -> MatchResult {
        let base = state.cursor.column();
        let marker = {
            let rest = state.cursor.remainder();
            parse_list_marker(&rest, base)
        };
        let marker = match marker {
            Some(marker) => marker,
            None => return MatchResult::None,
        };
        if state.paragraph_on_top() {
            // Only a non-empty bullet item or an ordered item numbered 1
            // may interrupt a paragraph.
            if marker.empty {
                return MatchResult::None;
            }
            if marker.ordered && marker.start != Some(1) {
                return MatchResult::None;
            }
        }

        let target = state.open_list().filter(|&list_id| {
            list_data(&state.doc, list_id)
                .map(|list| list.ordered == marker.ordered && list.marker == marker.marker)
                .unwrap_or(false)
        });
        match target {
            Some(list_id) => resolve_pending_blank(&mut state.doc, list_id),
            None => {
                state.stage_container(ContainerKind::List(ListData {
                    ordered: marker.ordered,
                    start: marker.start,
                    marker: marker.marker,
                    tight: true,
                    pending_blank: false,
                }));
            }
        }
        state.stage_container(ContainerKind::ListItem(ListItemData {
            content_indent: marker.content_indent,
        }));

        state.cursor.consume(marker.marker_len);
        let consumed = state.cursor.column().saturating_sub(base);
        if consumed < marker.content_indent {
            state.cursor.skip_columns(marker.content_indent - consumed);
        }
        MatchResult::Continue
    }
}

impl BlockParser for ListParser {
    fn name(&self) -> &'static str {
        "list"
    }

    fn match_line(&self, state: &mut BlockState) -> MatchResult {
        match state.pending {
            Some(id) => match &state.doc.block(id).data {
                BlockData::Container(c) => match c.kind {
                    ContainerKind::List(_) => self.continue_list(state, id),
                    ContainerKind::ListItem(_) => self.continue_item(state, id),
                    _ => MatchResult::None,
                },
                BlockData::Leaf(_) => MatchResult::None,
            },
            None => self.open_item(state),
        }
    }
}

/// Terminal paragraph parser. Matching in the new-blocks phase either
/// stages a fresh paragraph or signals the driver's continuation special
/// case when a paragraph already tops the stack.
pub struct ParagraphParser;

impl BlockParser for ParagraphParser {
    fn name(&self) -> &'static str {
        "paragraph"
    }

    fn is_paragraph(&self) -> bool {
        true
    }

    fn match_line(&self, state: &mut BlockState) -> MatchResult {
        if state.cursor.is_blank() {
            return MatchResult::None;
        }
        if state.pending.is_none() && !state.paragraph_on_top() {
            state.stage_leaf(LeafKind::Paragraph, false);
        }
        MatchResult::Continue
    }

    fn close(&self, doc: &mut Document, id: BlockId) {
        // Paragraph content drops per-line leading whitespace and the final
        // line's trailing whitespace; interior trailing spaces survive for
        // hard breaks.
        if let Some(leaf) = doc.leaf_mut(id) {
            let lines = leaf.lines.lines_mut();
            for line in lines.iter_mut() {
                let trimmed = line.text.trim_start_matches([' ', '\t']);
                if trimmed.len() != line.text.len() {
                    line.text = trimmed.to_string();
                }
            }
            if let Some(last) = lines.last_mut() {
                let trimmed = last.text.trim_end_matches([' ', '\t']);
                if trimmed.len() != last.text.len() {
                    last.text = trimmed.to_string();
                }
            }
        }
    }
}

fn list_data(doc: &Document, id: BlockId) -> Option<&ListData> {
    match &doc.block(id).data {
        BlockData::Container(c) => match &c.kind {
            ContainerKind::List(list) => Some(list),
            _ => None,
        },
        BlockData::Leaf(_) => None,
    }
}

fn list_data_mut(doc: &mut Document, id: BlockId) -> Option<&mut ListData> {
    match &mut doc.block_mut(id).data {
        BlockData::Container(c) => match &mut c.kind {
            ContainerKind::List(list) => Some(list),
            _ => None,
        },
        BlockData::Leaf(_) => None,
    }
}

fn item_data(doc: &Document, id: BlockId) -> Option<&ListItemData> {
    match &doc.block(id).data {
        BlockData::Container(c) => match &c.kind {
            ContainerKind::ListItem(item) => Some(item),
            _ => None,
        },
        BlockData::Leaf(_) => None,
    }
}

fn last_item_indent(doc: &Document, list_id: BlockId) -> usize {
    doc.children(list_id)
        .last()
        .and_then(|&item| item_data(doc, item))
        .map(|item| item.content_indent)
        .unwrap_or(0)
}

fn blank_absorbed_by_leaf(state: &BlockState) -> bool {
    match &state.doc.block(state.top()).data {
        BlockData::Leaf(leaf) => matches!(
            leaf.kind,
            LeafKind::FencedCode(_)
                | LeafKind::IndentedCode
                | LeafKind::HtmlBlock {
                    kind: HtmlBlockKind::Raw(_)
                        | HtmlBlockKind::Comment
                        | HtmlBlockKind::Processing
                        | HtmlBlockKind::Declaration
                        | HtmlBlockKind::Cdata
                }
        ),
        BlockData::Container(_) => false,
    }
}

/// A blank recorded against an open list converts to looseness only once
/// the list receives more content.
fn resolve_pending_blank(doc: &mut Document, list_id: BlockId) {
    if let Some(list) = list_data_mut(doc, list_id) {
        if list.pending_blank {
            list.tight = false;
            list.pending_blank = false;
        }
    }
}

// Line-shape helpers. These inspect the materialised remainder of a line;
// the parsers above translate byte/column counts back onto the cursor.

fn is_space_or_tab(byte: u8) -> bool {
    byte == b' ' || byte == b'\t'
}

/// `(level, content_start, content_end)` in bytes of `text`, or `None`.
fn parse_atx_heading(text: &str) -> Option<(u8, usize, usize)> {
    let bytes = text.as_bytes();
    let mut idx = 0;
    while idx < bytes.len() && idx < 3 && bytes[idx] == b' ' {
        idx += 1;
    }
    if idx < bytes.len() && bytes[idx] == b' ' {
        return None;
    }
    let mut level = 0;
    while idx < bytes.len() && bytes[idx] == b'#' {
        level += 1;
        idx += 1;
    }
    if level == 0 || level > 6 {
        return None;
    }
    if idx < bytes.len() && !is_space_or_tab(bytes[idx]) {
        return None;
    }
    let mut start = idx;
    while start < bytes.len() && is_space_or_tab(bytes[start]) {
        start += 1;
    }
    let mut end = bytes.len();
    while end > start && is_space_or_tab(bytes[end - 1]) {
        end -= 1;
    }
    // Optional closing sequence: spaces, hashes, end of line.
    if end > start {
        let mut hashes = end;
        while hashes > start && bytes[hashes - 1] == b'#' {
            hashes -= 1;
        }
        if hashes < end && (hashes == start || is_space_or_tab(bytes[hashes - 1])) {
            end = hashes;
            while end > start && is_space_or_tab(bytes[end - 1]) {
                end -= 1;
            }
        }
    }
    Some((level as u8, start, end))
}

fn setext_underline_level(text: &str) -> Option<u8> {
    let bytes = text.as_bytes();
    let mut idx = 0;
    while idx < bytes.len() && idx < 3 && bytes[idx] == b' ' {
        idx += 1;
    }
    if idx < bytes.len() && bytes[idx] == b' ' {
        return None;
    }
    let rest = &bytes[idx..];
    let ch = *rest.first()?;
    if ch != b'=' && ch != b'-' {
        return None;
    }
    let run = rest.iter().take_while(|b| **b == ch).count();
    if rest[run..].iter().any(|b| !is_space_or_tab(*b)) {
        return None;
    }
    Some(if ch == b'=' { 1 } else { 2 })
}

fn is_thematic_break_line(text: &str) -> bool {
    let bytes = text.as_bytes();
    let mut idx = 0;
    while idx < bytes.len() && idx < 3 && bytes[idx] == b' ' {
        idx += 1;
    }
    if idx < bytes.len() && bytes[idx] == b' ' {
        return false;
    }
    let mut marker = None;
    let mut count = 0;
    for b in &bytes[idx..] {
        if is_space_or_tab(*b) {
            continue;
        }
        match marker {
            None => {
                if !matches!(*b, b'-' | b'*' | b'_') {
                    return false;
                }
                marker = Some(*b);
                count = 1;
            }
            Some(m) if m == *b => count += 1,
            Some(_) => return false,
        }
    }
    count >= 3
}

/// `(indent, fence_len, marker, info)` for an opening fence line.
fn parse_fence_open(text: &str) -> Option<(usize, usize, u8, String)> {
    let bytes = text.as_bytes();
    let mut idx = 0;
    while idx < bytes.len() && idx < 3 && bytes[idx] == b' ' {
        idx += 1;
    }
    if idx < bytes.len() && bytes[idx] == b' ' {
        return None;
    }
    let indent = idx;
    let marker = match bytes.get(idx) {
        Some(b'`') => b'`',
        Some(b'~') => b'~',
        _ => return None,
    };
    let length = bytes[idx..].iter().take_while(|b| **b == marker).count();
    if length < 3 {
        return None;
    }
    let info = text[idx + length..].trim_matches([' ', '\t']);
    if marker == b'`' && info.contains('`') {
        return None;
    }
    Some((indent, length, marker, unescape_backslashes(info)))
}

fn is_fence_close(text: &str, length: usize, marker: u8) -> bool {
    let bytes = text.as_bytes();
    let mut idx = 0;
    while idx < bytes.len() && idx < 3 && bytes[idx] == b' ' {
        idx += 1;
    }
    if idx < bytes.len() && bytes[idx] == b' ' {
        return false;
    }
    let run = bytes[idx..].iter().take_while(|b| **b == marker).count();
    if run < length {
        return false;
    }
    bytes[idx + run..].iter().all(|b| is_space_or_tab(*b))
}

fn unescape_backslashes(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut idx = 0;
    while idx < bytes.len() {
        if bytes[idx] == b'\\' && idx + 1 < bytes.len() && bytes[idx + 1].is_ascii_punctuation() {
            out.push(bytes[idx + 1] as char);
            idx += 2;
            continue;
        }
        let ch = text[idx..].chars().next().unwrap_or('\u{fffd}');
        out.push(ch);
        idx += ch.len_utf8();
    }
    out
}

/// Parsed list marker. Byte counts are relative to the probed remainder;
/// `content_indent` is in columns from the remainder start.
#[derive(Debug, Clone, Copy)]
struct ListMarker {
    ordered: bool,
    start: Option<u64>,
    marker: u8,
    /// Bytes from the remainder start through the consumed post-marker
    /// whitespace.
    marker_len: usize,
    content_indent: usize,
    empty: bool,
}

/// `base_col` is the absolute column of the remainder start, for tab-stop
/// math.
fn parse_list_marker(text: &str, base_col: usize) -> Option<ListMarker> {
    if is_thematic_break_line(text) {
        return None;
    }
    let bytes = text.as_bytes();
    let mut idx = 0;
    while idx < bytes.len() && idx < 3 && bytes[idx] == b' ' {
        idx += 1;
    }
    if idx < bytes.len() && bytes[idx] == b' ' {
        return None;
    }
    let indent = idx;

    let (ordered, start, marker, marker_end) = match bytes.get(idx).copied() {
        Some(ch @ (b'-' | b'+' | b'*')) => (false, None, ch, idx + 1),
        Some(b) if b.is_ascii_digit() => {
            let digit_start = idx;
            let mut digit_end = idx;
            while digit_end < bytes.len() && bytes[digit_end].is_ascii_digit() {
                digit_end += 1;
            }
            if digit_end - digit_start > 9 || digit_end >= bytes.len() {
                return None;
            }
            let delim = bytes[digit_end];
            if delim != b'.' && delim != b')' {
                return None;
            }
            let number = text[digit_start..digit_end].parse::<u64>().ok();
            (true, number, delim, digit_end + 1)
        }
        _ => return None,
    };

    let marker_width = marker_end - indent;
    let after = scan_post_marker(bytes, marker_end, base_col + indent + marker_width);
    if after.columns == 0 && after.has_content {
        return None;
    }
    let empty = !after.has_content;
    let (content_indent, marker_len) = if empty {
        (indent + marker_width + 1, marker_end + after.bytes)
    } else if after.columns > 4 {
        // Excess whitespace belongs to the content (indented code inside
        // the item).
        (indent + marker_width + 1, marker_end)
    } else {
        (indent + marker_width + after.columns, marker_end + after.content_bytes)
    };

    Some(ListMarker {
        ordered,
        start,
        marker,
        marker_len,
        content_indent,
        empty,
    })
}

struct PostMarker {
    /// Whitespace columns after the marker (capped scan at 5).
    columns: usize,
    /// Bytes covered by the capped scan.
    bytes: usize,
    /// Bytes covering exactly `columns` columns when `columns <= 4`.
    content_bytes: usize,
    has_content: bool,
}

fn scan_post_marker(bytes: &[u8], start: usize, start_col: usize) -> PostMarker {
    let mut idx = start;
    let mut col = start_col;
    let mut tab_left = 0;
    while col - start_col < 5 && idx < bytes.len() {
        if tab_left > 0 {
            tab_left -= 1;
            col += 1;
            if tab_left == 0 {
                idx += 1;
            }
            continue;
        }
        match bytes[idx] {
            b' ' => {
                col += 1;
                idx += 1;
            }
            b'\t' => {
                let width = 4 - (col % 4);
                col += 1;
                if width > 1 {
                    tab_left = width - 1;
                } else {
                    idx += 1;
                }
            }
            _ => break,
        }
    }
    let columns = col - start_col;
    let scan_bytes = idx - start;

    let mut has_content = false;
    let mut probe = idx;
    while probe < bytes.len() {
        if !is_space_or_tab(bytes[probe]) {
            has_content = true;
            break;
        }
        probe += 1;
    }

    // Bytes that cover exactly `columns` columns, stopping short of a
    // straddling tab.
    let mut content_bytes = 0;
    if columns >= 1 && columns <= 4 {
        let mut c = start_col;
        let mut b = start;
        while c < start_col + columns && b < bytes.len() {
            match bytes[b] {
                b' ' => {
                    c += 1;
                    b += 1;
                }
                b'\t' => {
                    let next = c + (4 - (c % 4));
                    if next <= start_col + columns {
                        c = next;
                        b += 1;
                    } else {
                        break;
                    }
                }
                _ => break,
            }
        }
        content_bytes = b - start;
    }

    PostMarker {
        columns,
        bytes: scan_bytes,
        content_bytes,
        has_content,
    }
}

// HTML block recognition.

const HTML_BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "base", "basefont", "blockquote", "body", "caption", "center",
    "col", "colgroup", "dd", "details", "dialog", "dir", "div", "dl", "dt", "fieldset",
    "figcaption", "figure", "footer", "form", "frame", "frameset", "h1", "h2", "h3", "h4", "h5",
    "h6", "head", "header", "hr", "html", "iframe", "legend", "li", "link", "main", "menu",
    "menuitem", "nav", "noframes", "ol", "optgroup", "option", "p", "param", "search", "section",
    "source", "summary", "table", "tbody", "td", "tfoot", "th", "thead", "title", "tr", "track",
    "ul",
];

struct HtmlTag<'a> {
    name: &'a str,
    after: usize,
    closing: bool,
}

fn parse_html_tag_name(text: &str) -> Option<HtmlTag<'_>> {
    let bytes = text.as_bytes();
    if *bytes.first()? != b'<' {
        return None;
    }
    let mut idx = 1;
    let mut closing = false;
    if bytes.get(idx) == Some(&b'/') {
        closing = true;
        idx += 1;
    }
    if !bytes.get(idx)?.is_ascii_alphabetic() {
        return None;
    }
    let start = idx;
    idx += 1;
    while idx < bytes.len() && (bytes[idx].is_ascii_alphanumeric() || bytes[idx] == b'-') {
        idx += 1;
    }
    Some(HtmlTag {
        name: &text[start..idx],
        after: idx,
        closing,
    })
}

fn is_tag_boundary(bytes: &[u8], idx: usize) -> bool {
    match bytes.get(idx) {
        None => true,
        Some(b) => b.is_ascii_whitespace() || *b == b'>' || *b == b'/',
    }
}

fn raw_tag_name(name: &str) -> Option<&'static str> {
    for tag in ["pre", "script", "style", "textarea"] {
        if name.eq_ignore_ascii_case(tag) {
            return Some(tag);
        }
    }
    None
}

fn match_html_block_start(text: &str) -> Option<HtmlBlockKind> {
    let bytes = text.as_bytes();
    let mut idx = 0;
    while idx < bytes.len() && idx < 3 && bytes[idx] == b' ' {
        idx += 1;
    }
    if idx < bytes.len() && bytes[idx] == b' ' {
        return None;
    }
    let trimmed = &text[idx..];
    if trimmed.is_empty() {
        return None;
    }

    if let Some(tag) = parse_html_tag_name(trimmed) {
        if !tag.closing && is_tag_boundary(trimmed.as_bytes(), tag.after) {
            if let Some(raw) = raw_tag_name(tag.name) {
                return Some(HtmlBlockKind::Raw(raw));
            }
        }
    }
    if trimmed.starts_with("<!--") {
        return Some(HtmlBlockKind::Comment);
    }
    if trimmed.starts_with("<?") {
        return Some(HtmlBlockKind::Processing);
    }
    if trimmed.starts_with("<![CDATA[") {
        return Some(HtmlBlockKind::Cdata);
    }
    if trimmed.starts_with("<!") {
        if let Some(b) = trimmed.as_bytes().get(2) {
            if b.is_ascii_alphabetic() {
                return Some(HtmlBlockKind::Declaration);
            }
        }
    }
    if let Some(tag) = parse_html_tag_name(trimmed) {
        if is_tag_boundary(trimmed.as_bytes(), tag.after)
            && HTML_BLOCK_TAGS
                .iter()
                .any(|name| tag.name.eq_ignore_ascii_case(name))
        {
            return Some(HtmlBlockKind::BlockTag);
        }
    }
    if complete_tag_line(trimmed) {
        return Some(HtmlBlockKind::AnyTag);
    }
    None
}

/// A single complete open or closing tag followed only by whitespace
/// (HTML block kind 7), excluding the raw-content tags.
fn complete_tag_line(text: &str) -> bool {
    let bytes = text.as_bytes();
    let tag = match parse_html_tag_name(text) {
        Some(tag) => tag,
        None => return false,
    };
    if raw_tag_name(tag.name).is_some() {
        return false;
    }
    let mut idx = tag.after;
    let mut in_quote = 0u8;
    while idx < bytes.len() {
        let b = bytes[idx];
        if in_quote != 0 {
            if b == in_quote {
                in_quote = 0;
            }
            idx += 1;
            continue;
        }
        match b {
            b'"' | b'\'' => {
                in_quote = b;
                idx += 1;
            }
            b'>' => {
                return bytes[idx + 1..].iter().all(|b| is_space_or_tab(*b));
            }
            b'<' => return false,
            _ => idx += 1,
        }
    }
    false
}

fn html_block_ends(kind: HtmlBlockKind, text: &str) -> bool {
    match kind {
        HtmlBlockKind::Raw(tag) => {
            let lower = text.to_ascii_lowercase();
            lower.contains(&format!("</{tag}>"))
        }
        HtmlBlockKind::Comment => text.contains("-->"),
        HtmlBlockKind::Processing => text.contains("?>"),
        HtmlBlockKind::Declaration => text.contains('>'),
        HtmlBlockKind::Cdata => text.contains("]]>"),
        HtmlBlockKind::BlockTag | HtmlBlockKind::AnyTag => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atx_heading_levels_and_closing_sequence() {
        assert_eq!(parse_atx_heading("# Hello"), Some((1, 2, 7)));
        assert_eq!(parse_atx_heading("### x ###"), Some((3, 4, 5)));
        assert_eq!(parse_atx_heading("####### x"), None);
        assert_eq!(parse_atx_heading("#hash"), None);
        assert_eq!(parse_atx_heading("  ## y"), Some((2, 5, 6)));
    }

    #[test]
    fn thematic_breaks_need_three_markers() {
        assert!(is_thematic_break_line("***"));
        assert!(is_thematic_break_line(" - - -"));
        assert!(is_thematic_break_line("_____"));
        assert!(!is_thematic_break_line("**"));
        assert!(!is_thematic_break_line("*-*"));
        assert!(!is_thematic_break_line("    ***"));
    }

    #[test]
    fn fence_open_rejects_backtick_info() {
        assert!(parse_fence_open("```rust").is_some());
        assert!(parse_fence_open("``` a`b").is_none());
        assert!(parse_fence_open("~~~ a`b").is_some());
        assert!(parse_fence_open("``").is_none());
    }

    #[test]
    fn fence_close_needs_at_least_opening_length() {
        assert!(is_fence_close("```", 3, b'`'));
        assert!(is_fence_close("`````  ", 3, b'`'));
        assert!(!is_fence_close("``", 3, b'`'));
        assert!(!is_fence_close("``` x", 3, b'`'));
    }

    #[test]
    fn list_markers_track_content_columns() {
        let m = parse_list_marker("- a", 0).unwrap();
        assert!(!m.ordered);
        assert_eq!(m.content_indent, 2);
        assert_eq!(m.marker_len, 2);

        let m = parse_list_marker("12. x", 0).unwrap();
        assert!(m.ordered);
        assert_eq!(m.start, Some(12));
        assert_eq!(m.content_indent, 4);

        assert!(parse_list_marker("-x", 0).is_none());
        assert!(parse_list_marker("1234567890. x", 0).is_none());
        // A lone dash is an empty item, not nothing.
        let m = parse_list_marker("-", 0).unwrap();
        assert!(m.empty);
        assert_eq!(m.content_indent, 2);
    }

    #[test]
    fn wide_gaps_fall_back_to_one_space_of_content() {
        let m = parse_list_marker("-      code", 0).unwrap();
        assert_eq!(m.content_indent, 2);
        assert_eq!(m.marker_len, 1);
    }

    #[test]
    fn setext_underlines() {
        assert_eq!(setext_underline_level("==="), Some(1));
        assert_eq!(setext_underline_level("-"), Some(2));
        assert_eq!(setext_underline_level("--- "), Some(2));
        assert_eq!(setext_underline_level("= ="), None);
    }

    #[test]
    fn html_block_kinds() {
        assert_eq!(
            match_html_block_start("<script src=\"x\">"),
            Some(HtmlBlockKind::Raw("script"))
        );
        assert_eq!(match_html_block_start("<!-- note"), Some(HtmlBlockKind::Comment));
        assert_eq!(match_html_block_start("<div class=\"a\">"), Some(HtmlBlockKind::BlockTag));
        assert_eq!(match_html_block_start("<custom-tag>"), Some(HtmlBlockKind::AnyTag));
        assert_eq!(match_html_block_start("<3 hearts"), None);
    }

    #[test]
    fn raw_html_end_condition_is_case_insensitive() {
        assert!(html_block_ends(HtmlBlockKind::Raw("script"), "x</SCRIPT>"));
        assert!(!html_block_ends(HtmlBlockKind::Raw("script"), "</style>"));
    }
}
