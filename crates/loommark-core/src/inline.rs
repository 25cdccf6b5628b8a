/// Index of an inline node in a leaf block's inline tree.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct InlineId(pub u32);

impl InlineId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug)]
pub struct Inline {
    pub parent: Option<InlineId>,
    pub is_closable: bool,
    pub is_closed: bool,
    pub data: InlineData,
}

#[derive(Debug)]
pub enum InlineData {
    Container {
        kind: InlineContainerKind,
        children: Vec<InlineId>,
    },
    Leaf(InlineLeaf),
}

#[derive(Debug)]
pub enum InlineContainerKind {
    Root,
    Emph,
    Strong,
    Strikethrough,
    Link { url: String, title: Option<String> },
    Image { url: String, title: Option<String> },
    /// Pending `[` / `![` awaiting its closer; degrades to literal text when
    /// the to-close queue drains.
    Bracket { image: bool, active: bool },
}

#[derive(Debug)]
pub enum InlineLeaf {
    Text(String),
    CodeSpan(String),
    Autolink { target: String, email: bool },
    SoftBreak,
    HardBreak,
}

/// Arena for one leaf block's inline tree. Index 0 is the root container,
/// created open at the start of the inline phase.
#[derive(Debug)]
pub struct InlineTree {
    nodes: Vec<Inline>,
}

impl InlineTree {
    pub(crate) fn new() -> Self {
        Self {
            nodes: vec![Inline {
                parent: None,
                is_closable: false,
                is_closed: false,
                data: InlineData::Container {
                    kind: InlineContainerKind::Root,
                    children: Vec::new(),
                },
            }],
        }
    }

    pub fn root(&self) -> InlineId {
        InlineId(0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        false // the root is always present
    }

    pub fn node(&self, id: InlineId) -> &Inline {
        &self.nodes[id.index()]
    }

    pub(crate) fn node_mut(&mut self, id: InlineId) -> &mut Inline {
        &mut self.nodes[id.index()]
    }

    pub(crate) fn alloc_leaf(&mut self, leaf: InlineLeaf) -> InlineId {
        let id = InlineId(self.nodes.len() as u32);
        self.nodes.push(Inline {
            parent: None,
            is_closable: false,
            is_closed: true,
            data: InlineData::Leaf(leaf),
        });
        id
    }

    pub(crate) fn alloc_container(
        &mut self,
        kind: InlineContainerKind,
        is_closable: bool,
    ) -> InlineId {
        let id = InlineId(self.nodes.len() as u32);
        self.nodes.push(Inline {
            parent: None,
            is_closable,
            is_closed: false,
            data: InlineData::Container {
                kind,
                children: Vec::new(),
            },
        });
        id
    }

    pub fn children(&self, id: InlineId) -> &[InlineId] {
        match &self.node(id).data {
            InlineData::Container { children, .. } => children,
            InlineData::Leaf(_) => &[],
        }
    }

    pub(crate) fn children_mut(&mut self, id: InlineId) -> &mut Vec<InlineId> {
        match &mut self.node_mut(id).data {
            InlineData::Container { children, .. } => children,
            InlineData::Leaf(_) => unreachable!("leaf inlines hold no children"),
        }
    }

    pub(crate) fn push_child(&mut self, parent: InlineId, child: InlineId) {
        self.node_mut(child).parent = Some(parent);
        self.children_mut(parent).push(child);
    }

    pub(crate) fn position(&self, parent: InlineId, child: InlineId) -> Option<usize> {
        self.children(parent).iter().position(|&c| c == child)
    }

    /// A container that is still accepting children.
    pub fn is_open_container(&self, id: InlineId) -> bool {
        let node = self.node(id);
        matches!(node.data, InlineData::Container { .. }) && !node.is_closed
    }

    /// Descends from the root, following the last child while it is an open
    /// container. This is where new inlines attach.
    pub(crate) fn deepest_open(&self) -> InlineId {
        let mut id = self.root();
        loop {
            match self.children(id).last() {
                Some(&last) if self.is_open_container(last) => id = last,
                _ => return id,
            }
        }
    }

    /// Concatenated text of the leaf nodes, in tree order. Soft breaks count
    /// as newlines, hard breaks as nothing (their spaces were consumed).
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        self.collect_text(self.root(), &mut out);
        out
    }

    fn collect_text(&self, id: InlineId, out: &mut String) {
        match &self.node(id).data {
            InlineData::Container { children, .. } => {
                for &child in children {
                    self.collect_text(child, out);
                }
            }
            InlineData::Leaf(leaf) => match leaf {
                InlineLeaf::Text(text) => out.push_str(text),
                InlineLeaf::CodeSpan(text) => out.push_str(text),
                InlineLeaf::Autolink { target, .. } => out.push_str(target),
                InlineLeaf::SoftBreak => out.push('\n'),
                InlineLeaf::HardBreak => {}
            },
        }
    }

    pub(crate) fn write_tree(&self, depth: usize, out: &mut String) {
        for &child in self.children(self.root()) {
            self.write_node(child, depth, out);
        }
    }

    fn write_node(&self, id: InlineId, depth: usize, out: &mut String) {
        for _ in 0..depth {
            out.push_str("  ");
        }
        match &self.node(id).data {
            InlineData::Container { kind, children } => {
                match kind {
                    InlineContainerKind::Root => out.push_str("root"),
                    InlineContainerKind::Emph => out.push_str("emph"),
                    InlineContainerKind::Strong => out.push_str("strong"),
                    InlineContainerKind::Strikethrough => out.push_str("strike"),
                    InlineContainerKind::Link { url, title } => {
                        out.push_str(&format!("link url={url:?}"));
                        if let Some(title) = title {
                            out.push_str(&format!(" title={title:?}"));
                        }
                    }
                    InlineContainerKind::Image { url, title } => {
                        out.push_str(&format!("image url={url:?}"));
                        if let Some(title) = title {
                            out.push_str(&format!(" title={title:?}"));
                        }
                    }
                    InlineContainerKind::Bracket { .. } => out.push_str("bracket"),
                }
                out.push('\n');
                for &child in children {
                    self.write_node(child, depth + 1, out);
                }
            }
            InlineData::Leaf(leaf) => {
                match leaf {
                    InlineLeaf::Text(text) => out.push_str(&format!("text {text:?}")),
                    InlineLeaf::CodeSpan(text) => out.push_str(&format!("code-span {text:?}")),
                    InlineLeaf::Autolink { target, email } => {
                        out.push_str(&format!("autolink {target:?}"));
                        if *email {
                            out.push_str(" email");
                        }
                    }
                    InlineLeaf::SoftBreak => out.push_str("softbreak"),
                    InlineLeaf::HardBreak => out.push_str("hardbreak"),
                }
                out.push('\n');
            }
        }
    }
}
