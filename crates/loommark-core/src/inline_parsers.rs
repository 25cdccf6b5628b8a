//! Default inline parsers. Each claims its first characters in the
//! engine's dispatch table; the literal parser trails the regular list and
//! always matches.

use crate::inline::{InlineContainerKind, InlineData, InlineId, InlineLeaf};
use crate::parser::{Delimiter, InlineParser, InlineState};

pub fn default_set() -> Vec<Box<dyn InlineParser>> {
    vec![
        Box::new(EscapeParser),
        Box::new(CodeSpanParser),
        Box::new(AutolinkParser),
        Box::new(EmphasisDelimiterParser),
        Box::new(BracketParser),
        Box::new(LineBreakParser),
        Box::new(LiteralParser),
    ]
}

/// Backslash escapes and backslash hard breaks.
pub struct EscapeParser;

impl InlineParser for EscapeParser {
    fn name(&self) -> &'static str {
        "escape"
    }

    fn first_chars(&self) -> &[u8] {
        b"\\"
    }

    fn match_inline(&self, state: &mut InlineState<'_>) -> bool {
        match state.cursor.peek_at(1) {
            Some(b'\n') => {
                state.cursor.advance(2);
                state.emit(InlineLeaf::HardBreak);
                true
            }
            Some(b) if b.is_ascii_punctuation() => {
                state.cursor.advance(2);
                state.emit(InlineLeaf::Text((b as char).to_string()));
                true
            }
            _ => false, // a bare backslash is literal text
        }
    }
}

/// Backtick code spans; the run length keys opener to closer.
pub struct CodeSpanParser;

impl InlineParser for CodeSpanParser {
    fn name(&self) -> &'static str {
        "code_span"
    }

    fn first_chars(&self) -> &[u8] {
        b"`"
    }

    fn match_inline(&self, state: &mut InlineState<'_>) -> bool {
        let open_len = state.cursor.run_len(b'`');
        if open_len == 0 {
            return false;
        }
        state.cursor.advance(open_len);
        let mut content = state.pool.take();
        loop {
            let rest = state.cursor.rest_of_line();
            if rest.is_empty() {
                if state.cursor.peek() != Some(b'\n') {
                    return false; // ran out of input without a closer
                }
                // Interior line endings read as spaces.
                content.push(' ');
                state.cursor.bump();
                continue;
            }
            match rest.bytes().position(|b| b == b'`') {
                Some(pos) => {
                    content.push_str(&rest[..pos]);
                    state.cursor.advance(pos);
                    let run = state.cursor.run_len(b'`');
                    if run == open_len {
                        state.cursor.advance(run);
                        let text = normalize_code_span(&content);
                        state.emit(InlineLeaf::CodeSpan(text));
                        return true;
                    }
                    for _ in 0..run {
                        content.push('`');
                    }
                    state.cursor.advance(run);
                }
                None => {
                    content.push_str(rest);
                    state.cursor.advance(rest.len());
                }
            }
        }
    }
}

/// One leading and trailing space are stripped when both are present and
/// the content is not all spaces.
fn normalize_code_span(content: &str) -> String {
    let bytes = content.as_bytes();
    if bytes.len() >= 2
        && bytes.first() == Some(&b' ')
        && bytes.last() == Some(&b' ')
        && bytes.iter().any(|b| *b != b' ')
    {
        content[1..content.len() - 1].to_string()
    } else {
        content.to_string()
    }
}

/// `<scheme:...>` and `<email@host>` autolinks.
pub struct AutolinkParser;

impl InlineParser for AutolinkParser {
    fn name(&self) -> &'static str {
        "autolink"
    }

    fn first_chars(&self) -> &[u8] {
        b"<"
    }

    fn match_inline(&self, state: &mut InlineState<'_>) -> bool {
        let rest = state.cursor.rest_of_line();
        let bytes = rest.as_bytes();
        let mut idx = 1;
        while idx < bytes.len() && bytes[idx] != b'>' {
            if bytes[idx].is_ascii_whitespace() || bytes[idx] == b'<' {
                return false;
            }
            idx += 1;
        }
        if idx >= bytes.len() || idx == 1 {
            return false;
        }
        let inner = &rest[1..idx];
        let email = if is_autolink_scheme(inner) {
            false
        } else if is_autolink_email(inner) {
            true
        } else {
            return false;
        };
        state.cursor.advance(idx + 1);
        state.emit(InlineLeaf::Autolink {
            target: inner.to_string(),
            email,
        });
        true
    }
}

fn is_autolink_scheme(text: &str) -> bool {
    let colon = match text.find(':') {
        Some(pos) => pos,
        None => return false,
    };
    if !(2..=32).contains(&colon) {
        return false;
    }
    let scheme = text.as_bytes();
    if !scheme[0].is_ascii_alphabetic() {
        return false;
    }
    scheme[1..colon]
        .iter()
        .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'.' | b'-'))
}

fn is_autolink_email(text: &str) -> bool {
    let at = match text.find('@') {
        Some(pos) => pos,
        None => return false,
    };
    let (local, domain) = (&text[..at], &text[at + 1..]);
    if local.is_empty() || domain.is_empty() {
        return false;
    }
    let local_ok = local.bytes().all(|b| {
        b.is_ascii_alphanumeric() || b".!#$%&'*+/=?^_`{|}~-".contains(&b)
    });
    if !local_ok {
        return false;
    }
    domain.split('.').all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && label.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
            && !label.starts_with('-')
            && !label.ends_with('-')
    })
}

/// Measures `*`/`_`/`~` runs, records them for the post-pass, and leaves
/// the run in the tree as text.
pub struct EmphasisDelimiterParser;

impl InlineParser for EmphasisDelimiterParser {
    fn name(&self) -> &'static str {
        "emphasis"
    }

    fn first_chars(&self) -> &[u8] {
        b"*_~"
    }

    fn match_inline(&self, state: &mut InlineState<'_>) -> bool {
        let byte = match state.cursor.peek() {
            Some(byte) => byte,
            None => return false,
        };
        let run = state.cursor.run_len(byte);
        if byte == b'~' && run < 2 {
            return false; // strikethrough needs a double tilde
        }
        let before = state.cursor.prev_char();
        let after = state.cursor.char_at(run);
        let (can_open, can_close) = delimiter_properties(before, after, byte);

        let mut text = String::with_capacity(run);
        for _ in 0..run {
            text.push(byte as char);
        }
        state.cursor.advance(run);
        let node = state.emit(InlineLeaf::Text(text));
        if can_open || can_close {
            state.delims.push(Delimiter {
                ch: byte,
                len: run,
                node,
                can_open,
                can_close,
                orig_can_open: can_open,
                orig_can_close: can_close,
            });
        }
        true
    }
}

/// Left/right flanking per CommonMark, with the `_` intraword restriction.
pub(crate) fn delimiter_properties(
    before: Option<char>,
    after: Option<char>,
    delim: u8,
) -> (bool, bool) {
    let before_ws = before.map(|c| c.is_whitespace()).unwrap_or(true);
    let after_ws = after.map(|c| c.is_whitespace()).unwrap_or(true);
    let before_punct = before.map(is_unicode_punctuation).unwrap_or(false);
    let after_punct = after.map(is_unicode_punctuation).unwrap_or(false);

    let left = !after_ws && (!after_punct || before_ws || before_punct);
    let right = !before_ws && (!before_punct || after_ws || after_punct);

    if delim == b'_' {
        (
            left && (!right || before_punct),
            right && (!left || after_punct),
        )
    } else {
        (left, right)
    }
}

fn is_unicode_punctuation(ch: char) -> bool {
    !ch.is_whitespace() && !ch.is_alphanumeric()
}

/// `[` / `![` open bracket containers; `]` attempts an inline link or image
/// close. Unclosed brackets degrade to literal text at the to-close drain.
pub struct BracketParser;

impl InlineParser for BracketParser {
    fn name(&self) -> &'static str {
        "bracket"
    }

    fn first_chars(&self) -> &[u8] {
        b"[]!"
    }

    fn match_inline(&self, state: &mut InlineState<'_>) -> bool {
        match state.cursor.peek() {
            Some(b'[') => {
                state.cursor.bump();
                open_bracket(state, false);
                true
            }
            Some(b'!') => {
                if state.cursor.peek_at(1) == Some(b'[') {
                    state.cursor.advance(2);
                    open_bracket(state, true);
                    true
                } else {
                    false
                }
            }
            Some(b']') => close_bracket(state),
            _ => false,
        }
    }
}

fn open_bracket(state: &mut InlineState<'_>, image: bool) {
    let id = state.emit_container(
        InlineContainerKind::Bracket {
            image,
            active: true,
        },
        true,
    );
    state.brackets.push(id);
}

fn close_bracket(state: &mut InlineState<'_>) -> bool {
    // Innermost bracket that is still open.
    let (pos, opener) = match state
        .brackets
        .iter()
        .rposition(|&id| !state.tree.node(id).is_closed)
    {
        Some(pos) => (pos, state.brackets[pos]),
        None => return false, // `]` is literal text
    };
    let (image, active) = match &state.tree.node(opener).data {
        InlineData::Container {
            kind: InlineContainerKind::Bracket { image, active },
            ..
        } => (*image, *active),
        _ => return false,
    };

    state.cursor.bump(); // `]`

    let destination = if active {
        parse_link_destination(state)
    } else {
        None
    };
    match destination {
        Some((url, title)) => {
            let kind = if image {
                InlineContainerKind::Image { url, title }
            } else {
                InlineContainerKind::Link { url, title }
            };
            {
                let node = state.tree.node_mut(opener);
                node.is_closed = true;
                node.data = match std::mem::replace(
                    &mut node.data,
                    InlineData::Leaf(InlineLeaf::SoftBreak),
                ) {
                    InlineData::Container { children, .. } => {
                        InlineData::Container { kind, children }
                    }
                    leaf => leaf,
                };
            }
            // Emphasis inside the label resolves when the link closes.
            let tree = &state.tree;
            let (inner, rest): (Vec<Delimiter>, Vec<Delimiter>) = state
                .delims
                .drain(..)
                .partition(|d| tree.node(d.node).parent == Some(opener));
            state.delims = rest;
            let mut inner = inner;
            crate::emphasis::process_emphasis(&mut state.tree, &mut inner);

            if !image {
                // No links inside links: earlier non-image openers go dead.
                for &other in &state.brackets {
                    if other == opener {
                        continue;
                    }
                    if let InlineData::Container {
                        kind:
                            InlineContainerKind::Bracket {
                                image: false,
                                active,
                            },
                        ..
                    } = &mut state.tree.node_mut(other).data
                    {
                        *active = false;
                    }
                }
            }
            state.brackets.truncate(pos);
            state.inline = None; // mutation only; the driver recomputes the anchor
            true
        }
        None => {
            // Failed close: the opener is spent and `]` becomes text.
            state.tree.node_mut(opener).is_closed = true;
            state.brackets.truncate(pos);
            state.emit(InlineLeaf::Text("]".to_string()));
            true
        }
    }
}

/// `(destination "title")` after a closing bracket. Consumes it on success.
fn parse_link_destination(state: &mut InlineState<'_>) -> Option<(String, Option<String>)> {
    if state.cursor.peek() != Some(b'(') {
        return None;
    }
    state.cursor.save();
    match parse_destination_inner(state) {
        Some(parsed) => {
            state.cursor.commit();
            Some(parsed)
        }
        None => {
            state.cursor.restore();
            None
        }
    }
}

fn parse_destination_inner(state: &mut InlineState<'_>) -> Option<(String, Option<String>)> {
    state.cursor.bump(); // `(`
    skip_link_whitespace(state);

    let mut url = state.pool.take();
    if state.cursor.peek() == Some(b'<') {
        state.cursor.bump();
        loop {
            match state.cursor.peek() {
                Some(b'>') => {
                    state.cursor.bump();
                    break;
                }
                Some(b'<') | Some(b'\n') | None => return None,
                Some(b'\\') => {
                    push_escaped(state, &mut url);
                }
                Some(b) => {
                    push_raw_byte(state, &mut url, b);
                }
            }
        }
    } else {
        let mut depth = 0usize;
        loop {
            match state.cursor.peek() {
                None | Some(b' ') | Some(b'\t') | Some(b'\n') => break,
                Some(b'(') => {
                    depth += 1;
                    url.push('(');
                    state.cursor.bump();
                }
                Some(b')') => {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                    url.push(')');
                    state.cursor.bump();
                }
                Some(b'\\') => {
                    push_escaped(state, &mut url);
                }
                Some(b) if b.is_ascii_control() => return None,
                Some(b) => {
                    push_raw_byte(state, &mut url, b);
                }
            }
        }
        if depth != 0 {
            return None;
        }
    }

    skip_link_whitespace(state);

    let title = match state.cursor.peek() {
        Some(open @ (b'"' | b'\'' | b'(')) => {
            let close = match open {
                b'"' => b'"',
                b'\'' => b'\'',
                _ => b')',
            };
            state.cursor.bump();
            let mut title = state.pool.take();
            loop {
                match state.cursor.peek() {
                    None => return None,
                    Some(b) if b == close => {
                        state.cursor.bump();
                        break;
                    }
                    Some(b'\\') => {
                        push_escaped(state, &mut title);
                    }
                    Some(b) => {
                        push_raw_byte(state, &mut title, b);
                    }
                }
            }
            skip_link_whitespace(state);
            Some(title.detach())
        }
        _ => None,
    };

    if state.cursor.peek() != Some(b')') {
        return None;
    }
    state.cursor.bump();
    Some((url.detach(), title))
}

fn skip_link_whitespace(state: &mut InlineState<'_>) {
    while matches!(state.cursor.peek(), Some(b' ') | Some(b'\t') | Some(b'\n')) {
        state.cursor.bump();
    }
}

/// Backslash escape inside a destination or title.
fn push_escaped(state: &mut InlineState<'_>, out: &mut String) {
    state.cursor.bump(); // `\`
    match state.cursor.peek() {
        Some(b) if b.is_ascii_punctuation() => {
            out.push(b as char);
            state.cursor.bump();
        }
        _ => out.push('\\'),
    }
}

/// Copies the full UTF-8 sequence starting with `byte`.
fn push_raw_byte(state: &mut InlineState<'_>, out: &mut String, byte: u8) {
    if byte < 128 {
        out.push(byte as char);
        state.cursor.bump();
        return;
    }
    let rest = state.cursor.rest_of_line();
    match rest.chars().next() {
        Some(ch) => {
            out.push(ch);
            state.cursor.advance(ch.len_utf8());
        }
        None => state.cursor.bump(),
    }
}

/// Soft and hard line breaks at interior line endings.
pub struct LineBreakParser;

impl InlineParser for LineBreakParser {
    fn name(&self) -> &'static str {
        "line_break"
    }

    fn first_chars(&self) -> &[u8] {
        b"\n"
    }

    fn match_inline(&self, state: &mut InlineState<'_>) -> bool {
        if state.cursor.peek() != Some(b'\n') {
            return false;
        }
        state.cursor.bump();

        // Two or more trailing spaces on the preceding text make the break
        // hard; trailing spaces are dropped either way.
        let mut hard = false;
        let mut emptied = None;
        let container = state.tree.deepest_open();
        if let Some(&last) = state.tree.children(container).last() {
            if let InlineData::Leaf(InlineLeaf::Text(text)) = &mut state.tree.node_mut(last).data
            {
                let trailing = text.bytes().rev().take_while(|b| *b == b' ').count();
                if trailing > 0 {
                    hard = trailing >= 2;
                    text.truncate(text.len() - trailing);
                    if text.is_empty() {
                        emptied = Some(last);
                    }
                }
            }
        }
        if let Some(node) = emptied {
            if let Some(pos) = state.tree.position(container, node) {
                state.tree.children_mut(container).remove(pos);
                state.tree.node_mut(node).parent = None;
            }
        }
        state.emit(if hard {
            InlineLeaf::HardBreak
        } else {
            InlineLeaf::SoftBreak
        });
        true
    }
}

/// Trailing literal parser: consumes a maximal run of unclaimed bytes,
/// merging into the current literal tail.
pub struct LiteralParser;

impl InlineParser for LiteralParser {
    fn name(&self) -> &'static str {
        "literal"
    }

    fn match_inline(&self, state: &mut InlineState<'_>) -> bool {
        let rest = state.cursor.rest_of_line();
        if rest.is_empty() {
            return false;
        }
        let stop = rest
            .bytes()
            .position(|b| b < 128 && state.specials[b as usize])
            .unwrap_or(rest.len());
        if stop == 0 {
            return false;
        }
        let text = &rest[..stop];
        state.cursor.advance(stop);
        push_literal(state, text);
        true
    }
}

/// Default literal handling when every parser failed: the current run of
/// the offending byte becomes text. Consuming the whole run keeps an
/// unmatched backtick string from re-pairing at a shorter length.
pub(crate) fn fallback_literal(state: &mut InlineState<'_>) {
    let byte = match state.cursor.peek() {
        Some(byte) => byte,
        None => return,
    };
    let run = state.cursor.run_len(byte).max(1);
    let mut text = String::with_capacity(run);
    if byte < 128 {
        for _ in 0..run {
            text.push(byte as char);
        }
        state.cursor.advance(run);
    } else {
        let rest = state.cursor.rest_of_line();
        match rest.chars().next() {
            Some(ch) => {
                text.push(ch);
                state.cursor.advance(ch.len_utf8());
            }
            None => {
                text.push('\n');
                state.cursor.bump();
            }
        }
    }
    push_literal(state, &text);
}

/// Appends to the literal tail when it is still the insertion point,
/// otherwise starts a new text node.
fn push_literal(state: &mut InlineState<'_>, text: &str) {
    if let Some(tail) = state.literal_tail {
        let container = state.tree.deepest_open();
        if state.tree.children(container).last() == Some(&tail) {
            if let InlineData::Leaf(InlineLeaf::Text(existing)) =
                &mut state.tree.node_mut(tail).data
            {
                existing.push_str(text);
                state.inline = Some(tail);
                return;
            }
        }
    }
    let id = state.emit(InlineLeaf::Text(text.to_string()));
    state.literal_tail = Some(id);
}

/// End-of-lines close hook: marks the inline closed and flattens brackets
/// that never became links.
pub(crate) fn close_inline(state: &mut InlineState<'_>, id: InlineId) {
    state.tree.node_mut(id).is_closed = true;
    let flatten = matches!(
        state.tree.node(id).data,
        InlineData::Container {
            kind: InlineContainerKind::Bracket { .. },
            ..
        }
    );
    if flatten {
        flatten_bracket(state, id);
    }
}

/// Replaces an unresolved bracket container with its opening text followed
/// by its children, spliced into the parent.
fn flatten_bracket(state: &mut InlineState<'_>, id: InlineId) {
    let parent = match state.tree.node(id).parent {
        Some(parent) => parent,
        None => return,
    };
    let pos = match state.tree.position(parent, id) {
        Some(pos) => pos,
        None => return,
    };
    let image = matches!(
        state.tree.node(id).data,
        InlineData::Container {
            kind: InlineContainerKind::Bracket { image: true, .. },
            ..
        }
    );
    let children = std::mem::take(state.tree.children_mut(id));
    let opener_text = state
        .tree
        .alloc_leaf(InlineLeaf::Text(if image { "![" } else { "[" }.to_string()));
    state.tree.node_mut(opener_text).parent = Some(parent);
    for &child in &children {
        state.tree.node_mut(child).parent = Some(parent);
    }
    state.tree.node_mut(id).parent = None;
    let siblings = state.tree.children_mut(parent);
    siblings.splice(
        pos..pos + 1,
        std::iter::once(opener_text).chain(children.into_iter()),
    );
}
