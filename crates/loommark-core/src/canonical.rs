//! Canonical CommonMark writer over the block structure. Parsing a
//! canonical-subset document, writing it, and reparsing is a fixed point;
//! the remaining block kinds are written best-effort.

use crate::block::{BlockData, BlockId, ContainerKind, Document, LeafKind};

pub fn write_canonical(doc: &Document) -> String {
    let lines = container_lines(doc, doc.root());
    let mut out = lines.join("\n");
    if !out.is_empty() {
        out.push('\n');
    }
    out
}

fn container_lines(doc: &Document, id: BlockId) -> Vec<String> {
    let mut out = Vec::new();
    for (idx, &child) in doc.children(id).iter().enumerate() {
        if idx > 0 {
            out.push(String::new());
        }
        out.extend(block_lines(doc, child));
    }
    out
}

fn block_lines(doc: &Document, id: BlockId) -> Vec<String> {
    match &doc.block(id).data {
        BlockData::Container(container) => match &container.kind {
            ContainerKind::Document | ContainerKind::ListItem(_) => container_lines(doc, id),
            ContainerKind::Quote => container_lines(doc, id)
                .into_iter()
                .map(|line| {
                    if line.is_empty() {
                        ">".to_string()
                    } else {
                        format!("> {line}")
                    }
                })
                .collect(),
            ContainerKind::List(list) => {
                let mut out = Vec::new();
                for (idx, &item) in container.children.iter().enumerate() {
                    if idx > 0 && !list.tight {
                        out.push(String::new());
                    }
                    let marker = if list.ordered {
                        let number = list.start.unwrap_or(1).saturating_add(idx as u64);
                        format!("{number}{} ", list.marker as char)
                    } else {
                        format!("{} ", list.marker as char)
                    };
                    let inner = container_lines(doc, item);
                    if inner.is_empty() {
                        out.push(marker.trim_end().to_string());
                        continue;
                    }
                    let pad = " ".repeat(marker.len());
                    for (line_idx, line) in inner.into_iter().enumerate() {
                        if line_idx == 0 {
                            out.push(format!("{marker}{line}"));
                        } else if line.is_empty() {
                            out.push(String::new());
                        } else {
                            out.push(format!("{pad}{line}"));
                        }
                    }
                }
                out
            }
        },
        BlockData::Leaf(leaf) => {
            let raw: Vec<String> = leaf
                .lines
                .lines()
                .iter()
                .map(|line| line.text.clone())
                .collect();
            match &leaf.kind {
                LeafKind::Paragraph | LeafKind::HtmlBlock { .. } => raw,
                LeafKind::Heading { level, .. } => {
                    let content = leaf.lines.text().replace('\n', " ");
                    let hashes = "#".repeat(usize::from(*level));
                    vec![format!("{hashes} {content}").trim_end().to_string()]
                }
                LeafKind::FencedCode(fence) => {
                    let marker =
                        (fence.marker as char).to_string().repeat(fence.length.max(3));
                    let mut out = Vec::with_capacity(raw.len() + 2);
                    if fence.info.is_empty() {
                        out.push(marker.clone());
                    } else {
                        out.push(format!("{marker}{}", fence.info));
                    }
                    out.extend(raw);
                    out.push(marker);
                    out
                }
                LeafKind::IndentedCode => raw
                    .into_iter()
                    .map(|line| {
                        if line.is_empty() {
                            line
                        } else {
                            format!("    {line}")
                        }
                    })
                    .collect(),
                LeafKind::ThematicBreak => vec!["***".to_string()],
            }
        }
    }
}
