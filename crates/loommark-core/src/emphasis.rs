//! Emphasis post-pass: resolves recorded delimiter runs into
//! `Emph`/`Strong`/`Strikethrough` containers. Left-to-right closer scan,
//! nearest compatible opener, CommonMark's rule of 3; unmatched delimiters
//! stay literal text.

use crate::inline::{InlineContainerKind, InlineData, InlineId, InlineLeaf, InlineTree};
use crate::parser::Delimiter;

pub(crate) fn process_emphasis(tree: &mut InlineTree, delims: &mut Vec<Delimiter>) {
    loop {
        let closer_index = match delims.iter().position(|d| d.can_close) {
            Some(idx) => idx,
            None => break,
        };
        let closer = delims[closer_index];
        let closer_parent = tree.node(closer.node).parent;

        let mut opener_index = None;
        let mut use_len = 1;
        for idx in (0..closer_index).rev() {
            let opener = &delims[idx];
            if opener.ch != closer.ch || !opener.can_open {
                continue;
            }
            // Pairs resolve within one parent container.
            if tree.node(opener.node).parent != closer_parent {
                continue;
            }
            let candidate = if opener.ch == b'~' {
                if opener.len >= 2 && closer.len >= 2 {
                    2
                } else {
                    continue;
                }
            } else if opener.len >= 2 && closer.len >= 2 {
                2
            } else {
                1
            };
            if opener.ch != b'~' && candidate == 1 && delimiter_blocked(opener, &closer) {
                continue;
            }
            opener_index = Some(idx);
            use_len = candidate;
            break;
        }

        match opener_index {
            Some(opener_index) => {
                apply_emphasis(tree, delims, opener_index, closer_index, use_len)
            }
            None => {
                delims[closer_index].can_close = false;
            }
        }
    }
}

/// Rule of 3: a one-delimiter match is forbidden when either side can both
/// open and close and the lengths sum to a multiple of three (unless both
/// are themselves multiples of three).
fn delimiter_blocked(opener: &Delimiter, closer: &Delimiter) -> bool {
    if opener.ch != closer.ch {
        return false;
    }
    let opener_both = opener.orig_can_open && opener.orig_can_close;
    let closer_both = closer.orig_can_open && closer.orig_can_close;
    if !opener_both && !closer_both {
        return false;
    }
    if (opener.len + closer.len) % 3 != 0 {
        return false;
    }
    opener.len % 3 != 0 || closer.len % 3 != 0
}

fn apply_emphasis(
    tree: &mut InlineTree,
    delims: &mut Vec<Delimiter>,
    opener_index: usize,
    closer_index: usize,
    use_len: usize,
) {
    let opener = delims[opener_index];
    let closer = delims[closer_index];
    let parent = match tree.node(opener.node).parent {
        Some(parent) => parent,
        None => {
            delims[closer_index].can_close = false;
            return;
        }
    };
    let opener_pos = tree.position(parent, opener.node);
    let closer_pos = tree.position(parent, closer.node);
    let (opener_pos, closer_pos) = match (opener_pos, closer_pos) {
        (Some(o), Some(c)) if o < c => (o, c),
        _ => {
            delims[closer_index].can_close = false;
            return;
        }
    };

    // Wrap the siblings between the two runs.
    let inner: Vec<InlineId> = tree
        .children_mut(parent)
        .drain(opener_pos + 1..closer_pos)
        .collect();
    let kind = if opener.ch == b'~' {
        InlineContainerKind::Strikethrough
    } else if use_len == 2 {
        InlineContainerKind::Strong
    } else {
        InlineContainerKind::Emph
    };
    let emph = tree.alloc_container(kind, false);
    tree.node_mut(emph).is_closed = true;
    tree.node_mut(emph).parent = Some(parent);
    for &child in &inner {
        tree.node_mut(child).parent = Some(emph);
    }
    *tree.children_mut(emph) = inner;
    tree.children_mut(parent).insert(opener_pos + 1, emph);

    // Consume delimiter characters from both runs.
    let opener_left = opener.len - use_len;
    let closer_left = closer.len - use_len;
    shrink_run(tree, opener.node, use_len);
    shrink_run(tree, closer.node, use_len);

    // Closer first so its index survives the opener update.
    if closer_left == 0 {
        remove_node(tree, parent, closer.node);
        delims.remove(closer_index);
    } else {
        delims[closer_index].len = closer_left;
    }
    if opener_left == 0 {
        remove_node(tree, parent, opener.node);
        delims.remove(opener_index);
    } else {
        delims[opener_index].len = opener_left;
    }
}

fn shrink_run(tree: &mut InlineTree, node: InlineId, by: usize) {
    if let InlineData::Leaf(InlineLeaf::Text(text)) = &mut tree.node_mut(node).data {
        let new_len = text.len().saturating_sub(by);
        text.truncate(new_len);
    }
}

fn remove_node(tree: &mut InlineTree, parent: InlineId, node: InlineId) {
    if let Some(pos) = tree.position(parent, node) {
        tree.children_mut(parent).remove(pos);
    }
    tree.node_mut(node).parent = None;
}
