use std::panic;

use loommark_core::{
    parse, BlockData, Document, Engine, EngineOptions, InlineData, InlineId, InlineTree,
};

const CASES: usize = 300;
const MAX_LEN: usize = 512;
const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJ0123456789 \
\n\t#>*-+_~`[]()!\\<.\"'@:/=|";

struct Lcg(u64);

impl Lcg {
    fn new(seed: u64) -> Self {
        Self(seed)
    }

    fn next_u64(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0
    }

    fn gen_range(&mut self, lo: usize, hi: usize) -> usize {
        lo + (self.next_u64() as usize) % (hi - lo)
    }
}

fn random_string(rng: &mut Lcg, len: usize) -> String {
    let mut out = String::with_capacity(len);
    for _ in 0..len {
        let idx = rng.gen_range(0, CHARSET.len());
        out.push(CHARSET[idx] as char);
    }
    out
}

#[test]
fn parser_never_panics_on_random_input() -> Result<(), Box<dyn std::error::Error>> {
    let mut rng = Lcg::new(0x51ab_03c7_9e2d_4411);
    for case in 0..CASES {
        let len = rng.gen_range(0, MAX_LEN + 1);
        let source = random_string(&mut rng, len);
        let result = panic::catch_unwind(|| parse(&source));
        match result {
            Ok(Ok(_)) => {}
            Ok(Err(err)) => {
                return Err(format!("parse errored for case {case}: {err}\n{source:?}").into())
            }
            Err(_) => return Err(format!("parse panicked for case {case}: {source:?}").into()),
        }
    }
    Ok(())
}

#[test]
fn parsing_is_deterministic() {
    let mut rng = Lcg::new(0x0f31_77a2_5540_9b1d);
    for _ in 0..CASES {
        let len = rng.gen_range(0, MAX_LEN + 1);
        let source = random_string(&mut rng, len);
        let first = parse(&source).expect("parse").tree_string();
        let second = parse(&source).expect("parse").tree_string();
        assert_eq!(first, second, "nondeterministic parse for {source:?}");
    }
}

#[test]
fn parallel_inline_phase_matches_sequential() {
    let sequential = Engine::new().expect("engine");
    let parallel = Engine::with_options(EngineOptions {
        parallel_inline: true,
    })
    .expect("engine");

    let mut rng = Lcg::new(0x7cc2_1b4e_8893_2a60);
    for _ in 0..CASES {
        let len = rng.gen_range(0, MAX_LEN + 1);
        let source = random_string(&mut rng, len);
        let a = sequential.parse(&source).expect("parse").tree_string();
        let b = parallel.parse(&source).expect("parse").tree_string();
        assert_eq!(a, b, "parallel inline phase diverged for {source:?}");
    }
}

#[test]
fn block_tree_invariants_hold_on_random_input() -> Result<(), Box<dyn std::error::Error>> {
    let mut rng = Lcg::new(0x21f6_d0aa_37c4_885b);
    for case in 0..CASES {
        let len = rng.gen_range(0, MAX_LEN + 1);
        let source = random_string(&mut rng, len);
        let doc = parse(&source)?;
        if let Err(message) = check_block_tree(&doc) {
            return Err(format!("case {case}: {message}\nSource:\n{source:?}").into());
        }
    }
    Ok(())
}

fn check_block_tree(doc: &Document) -> Result<(), String> {
    // Parent/child agreement over the whole arena.
    for (id, block) in doc.iter() {
        match block.parent {
            Some(parent) => {
                if !doc.children(parent).contains(&id) {
                    return Err(format!("block {id:?} missing from parent's children"));
                }
            }
            None => {
                if id != doc.root() {
                    return Err(format!("non-root block {id:?} has no parent"));
                }
            }
        }
        for &child in doc.children(id) {
            if doc.block(child).parent != Some(id) {
                return Err(format!("child {child:?} disagrees about its parent"));
            }
        }
        // Line indices never precede the parent's.
        if let Some(parent) = block.parent {
            if block.line_index < doc.block(parent).line_index {
                return Err(format!("block {id:?} starts before its parent"));
            }
        }
        if let BlockData::Leaf(leaf) = &block.data {
            if let Some(tree) = &leaf.inline {
                check_inline_tree(tree)?;
            }
        }
    }
    // Acyclic: walking up from any block reaches the root.
    for (id, _) in doc.iter() {
        let mut current = id;
        let mut steps = 0;
        while let Some(parent) = doc.block(current).parent {
            current = parent;
            steps += 1;
            if steps > doc.len() {
                return Err(format!("parent chain from {id:?} does not terminate"));
            }
        }
        if current != doc.root() {
            return Err(format!("parent chain from {id:?} misses the root"));
        }
    }
    Ok(())
}

fn check_inline_tree(tree: &InlineTree) -> Result<(), String> {
    fn walk(tree: &InlineTree, id: InlineId, seen: &mut usize) -> Result<(), String> {
        *seen += 1;
        if *seen > tree.len() {
            return Err("inline tree walk exceeded arena size (cycle?)".to_string());
        }
        for &child in tree.children(id) {
            if tree.node(child).parent != Some(id) {
                return Err(format!("inline {child:?} disagrees about its parent"));
            }
            if let InlineData::Container { .. } = tree.node(child).data {
                walk(tree, child, seen)?;
            }
        }
        Ok(())
    }
    let mut seen = 0;
    walk(tree, tree.root(), &mut seen)
}

#[test]
fn plain_paragraph_text_survives_inline_parsing() {
    // No delimiters in play, so the inline leaves must carry every
    // character of the paragraph content.
    let mut rng = Lcg::new(0x44d1_0e52_6b3f_72c9);
    for _ in 0..CASES {
        let len = rng.gen_range(1, 80);
        let mut source = String::new();
        for _ in 0..len {
            let b = b"abcdefghij XYZ,;"[rng.gen_range(0, 16)];
            source.push(b as char);
        }
        let source = source.trim().to_string();
        if source.is_empty() {
            continue;
        }
        let doc = parse(&source).expect("parse");
        let leaves = doc.leaves();
        assert_eq!(leaves.len(), 1);
        let leaf = doc.leaf(leaves[0]).expect("leaf");
        let inline = leaf.inline.as_ref().expect("inline tree");
        assert_eq!(inline.plain_text(), source);
    }
}

#[test]
fn append_never_happens_after_close() {
    // Closed blocks are sealed: every block's last line index is within the
    // input, and a reparse of the same bytes yields the same line stamps.
    let source = "> a\n> b\n\nc\n";
    let doc = parse(source).expect("parse");
    for (_, block) in doc.iter() {
        if let BlockData::Leaf(leaf) = &block.data {
            for line in leaf.lines.lines() {
                assert!(line.line_index < 4);
                assert!(line.line_index >= block.line_index);
            }
        }
    }
}
