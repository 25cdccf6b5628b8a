//! Canonical-writer round trips: after one normalising parse/write cycle,
//! write(parse(s)) is a fixed point for the canonical subset.

use loommark_core::{parse, write_canonical};

fn fixed_point(input: &str) -> String {
    let first = write_canonical(&parse(input).expect("parse"));
    let second = write_canonical(&parse(&first).expect("reparse"));
    assert_eq!(first, second, "canonical writer is not a fixed point for {input:?}");
    first
}

#[test]
fn headings_paragraphs_and_breaks() {
    let out = fixed_point("# Title\n\nBody text\nover two lines\n\n***\n");
    assert_eq!(out, "# Title\n\nBody text\nover two lines\n\n***\n");
}

#[test]
fn setext_normalises_to_atx() {
    let out = fixed_point("Title\n=====\n\nbody\n");
    assert_eq!(out, "# Title\n\nbody\n");
}

#[test]
fn block_quotes_round_trip() {
    let out = fixed_point("> quoted\n> still\n\nout\n");
    assert_eq!(out, "> quoted\n> still\n\nout\n");
}

#[test]
fn nested_quotes_round_trip() {
    let out = fixed_point("> > deep\n>\n> shallow\n");
    assert_eq!(out, "> > deep\n>\n> shallow\n");
}

#[test]
fn fenced_code_round_trips() {
    let out = fixed_point("```rust\nlet x = 1;\n\nlet y = 2;\n```\n");
    assert_eq!(out, "```rust\nlet x = 1;\n\nlet y = 2;\n```\n");
}

#[test]
fn thematic_break_normalises() {
    assert_eq!(fixed_point("-----\n"), "***\n");
    assert_eq!(fixed_point("_ _ _\n"), "***\n");
}

#[test]
fn quote_with_heading_round_trips() {
    let out = fixed_point("> # h\n>\n> body\n");
    assert_eq!(out, "> # h\n>\n> body\n");
}

#[test]
fn tight_list_round_trips() {
    let out = fixed_point("- a\n- b\n");
    assert_eq!(out, "- a\n- b\n");
}

#[test]
fn loose_list_round_trips() {
    let out = fixed_point("- a\n\n- b\n");
    assert_eq!(out, "- a\n\n- b\n");
}

#[test]
fn ordered_list_round_trips() {
    let out = fixed_point("3. a\n4. b\n");
    assert_eq!(out, "3. a\n4. b\n");
}

#[test]
fn nested_list_round_trips() {
    // The writer separates sibling blocks inside the item with a blank
    // line; that form is the stable one.
    let out = fixed_point("- a\n  - b\n");
    assert_eq!(out, "- a\n\n  - b\n");
}

#[test]
fn indented_code_round_trips() {
    let out = fixed_point("    one\n    two\n");
    assert_eq!(out, "    one\n    two\n");
}

#[test]
fn mixed_document_is_stable() {
    fixed_point(concat!(
        "# Top\n",
        "\n",
        "Intro paragraph\nwith a second line\n",
        "\n",
        "> a quote\n",
        ">\n",
        "> - listed\n",
        "> - items\n",
        "\n",
        "```\ncode\n```\n",
        "\n",
        "***\n",
        "\n",
        "Tail\n",
    ));
}
