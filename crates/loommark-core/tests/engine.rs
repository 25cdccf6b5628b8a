use loommark_core::{parse, Engine, EngineError, EngineOptions, InlineParser, InlineState, VecSink};
use pretty_assertions::assert_eq;

fn tree(source: &str) -> String {
    parse(source).expect("parse").tree_string()
}

#[test]
fn atx_heading_with_literal() {
    assert_eq!(
        tree("# Hello\n"),
        "document\n  heading level=1\n    text \"Hello\"\n"
    );
}

#[test]
fn block_quote_then_paragraph() {
    assert_eq!(
        tree("> quoted\n> still\n\nout\n"),
        concat!(
            "document\n",
            "  quote\n",
            "    paragraph\n",
            "      text \"quoted\"\n",
            "      softbreak\n",
            "      text \"still\"\n",
            "  paragraph\n",
            "    text \"out\"\n",
        )
    );
}

#[test]
fn fenced_code_with_info() {
    assert_eq!(
        tree("```x\ny\n```\n"),
        "document\n  fenced-code info=\"x\"\n    line \"y\"\n"
    );
}

#[test]
fn lazy_continuation_beats_indented_code() {
    // The indented line continues the paragraph; it does not open a code
    // block.
    assert_eq!(
        tree("a\n    b\n"),
        concat!(
            "document\n",
            "  paragraph\n",
            "    text \"a\"\n",
            "    softbreak\n",
            "    text \"b\"\n",
        )
    );
}

#[test]
fn bullet_list_two_items() {
    assert_eq!(
        tree("- a\n- b\n"),
        concat!(
            "document\n",
            "  list\n",
            "    item\n",
            "      paragraph\n",
            "        text \"a\"\n",
            "    item\n",
            "      paragraph\n",
            "        text \"b\"\n",
        )
    );
}

#[test]
fn emphasis_and_strong() {
    assert_eq!(
        tree("*em* and **strong**"),
        concat!(
            "document\n",
            "  paragraph\n",
            "    emph\n",
            "      text \"em\"\n",
            "    text \" and \"\n",
            "    strong\n",
            "      text \"strong\"\n",
        )
    );
}

#[test]
fn setext_heading_promotes_paragraph() {
    assert_eq!(
        tree("Foo\n---\n"),
        "document\n  heading level=2 setext\n    text \"Foo\"\n"
    );
    assert_eq!(
        tree("Foo\nBar\n===\n"),
        concat!(
            "document\n",
            "  heading level=1 setext\n",
            "    text \"Foo\"\n",
            "    softbreak\n",
            "    text \"Bar\"\n",
        )
    );
}

#[test]
fn thematic_break_stands_alone() {
    assert_eq!(tree("***\n"), "document\n  thematic-break\n");
    // Under a paragraph a dash underline is a setext heading instead.
    assert_eq!(
        tree("x\n---\n"),
        "document\n  heading level=2 setext\n    text \"x\"\n"
    );
}

#[test]
fn lazy_continuation_inside_quote() {
    assert_eq!(
        tree("> a\nb\n"),
        concat!(
            "document\n",
            "  quote\n",
            "    paragraph\n",
            "      text \"a\"\n",
            "      softbreak\n",
            "      text \"b\"\n",
        )
    );
}

#[test]
fn heading_interrupts_quoted_paragraph() {
    assert_eq!(
        tree("> a\n# h\n"),
        concat!(
            "document\n",
            "  quote\n",
            "    paragraph\n",
            "      text \"a\"\n",
            "  heading level=1\n",
            "    text \"h\"\n",
        )
    );
}

#[test]
fn unterminated_fence_closes_at_eof() {
    assert_eq!(
        tree("> ```rust\n> let x;\n"),
        concat!(
            "document\n",
            "  quote\n",
            "    fenced-code info=\"rust\"\n",
            "      line \"let x;\"\n",
        )
    );
}

#[test]
fn indented_code_block() {
    assert_eq!(
        tree("    code\n"),
        "document\n  indented-code\n    line \"code\"\n"
    );
}

#[test]
fn indented_code_trailing_blanks_trimmed() {
    assert_eq!(
        tree("    a\n\n    b\n\n\n"),
        concat!(
            "document\n",
            "  indented-code\n",
            "    line \"a\"\n",
            "    line \"\"\n",
            "    line \"b\"\n",
        )
    );
}

#[test]
fn blank_between_items_makes_list_loose() {
    assert_eq!(
        tree("- a\n\n- b\n"),
        concat!(
            "document\n",
            "  list loose\n",
            "    item\n",
            "      paragraph\n",
            "        text \"a\"\n",
            "    item\n",
            "      paragraph\n",
            "        text \"b\"\n",
        )
    );
}

#[test]
fn trailing_blank_keeps_list_tight() {
    assert_eq!(
        tree("- a\n- b\n\npara\n"),
        concat!(
            "document\n",
            "  list\n",
            "    item\n",
            "      paragraph\n",
            "        text \"a\"\n",
            "    item\n",
            "      paragraph\n",
            "        text \"b\"\n",
            "  paragraph\n",
            "    text \"para\"\n",
        )
    );
}

#[test]
fn nested_list_via_content_indent() {
    assert_eq!(
        tree("- a\n  - b\n"),
        concat!(
            "document\n",
            "  list\n",
            "    item\n",
            "      paragraph\n",
            "        text \"a\"\n",
            "      list\n",
            "        item\n",
            "          paragraph\n",
            "            text \"b\"\n",
        )
    );
}

#[test]
fn ordered_list_keeps_start_number() {
    assert_eq!(
        tree("3. a\n4. b\n"),
        concat!(
            "document\n",
            "  list ordered start=3\n",
            "    item\n",
            "      paragraph\n",
            "        text \"a\"\n",
            "    item\n",
            "      paragraph\n",
            "        text \"b\"\n",
        )
    );
}

#[test]
fn changing_bullet_starts_a_new_list() {
    assert_eq!(
        tree("- a\n+ b\n"),
        concat!(
            "document\n",
            "  list\n",
            "    item\n",
            "      paragraph\n",
            "        text \"a\"\n",
            "  list\n",
            "    item\n",
            "      paragraph\n",
            "        text \"b\"\n",
        )
    );
}

#[test]
fn ordered_list_not_starting_at_one_cannot_interrupt() {
    assert_eq!(
        tree("text\n2. x\n"),
        concat!(
            "document\n",
            "  paragraph\n",
            "    text \"text\"\n",
            "    softbreak\n",
            "    text \"2. x\"\n",
        )
    );
}

#[test]
fn html_block_ends_at_blank_line() {
    assert_eq!(
        tree("<div>\nhi\n</div>\n\npara\n"),
        concat!(
            "document\n",
            "  html-block\n",
            "    line \"<div>\"\n",
            "    line \"hi\"\n",
            "    line \"</div>\"\n",
            "  paragraph\n",
            "    text \"para\"\n",
        )
    );
}

#[test]
fn html_comment_ends_on_marker_line() {
    assert_eq!(
        tree("<!-- a\nb -->\nafter\n"),
        concat!(
            "document\n",
            "  html-block\n",
            "    line \"<!-- a\"\n",
            "    line \"b -->\"\n",
            "  paragraph\n",
            "    text \"after\"\n",
        )
    );
}

#[test]
fn hard_break_from_trailing_spaces() {
    assert_eq!(
        tree("a  \nb\n"),
        concat!(
            "document\n",
            "  paragraph\n",
            "    text \"a\"\n",
            "    hardbreak\n",
            "    text \"b\"\n",
        )
    );
}

#[test]
fn backslash_hard_break() {
    assert_eq!(
        tree("a\\\nb\n"),
        concat!(
            "document\n",
            "  paragraph\n",
            "    text \"a\"\n",
            "    hardbreak\n",
            "    text \"b\"\n",
        )
    );
}

#[test]
fn escapes_suppress_emphasis() {
    assert_eq!(
        tree("\\*not\\*\n"),
        concat!(
            "document\n",
            "  paragraph\n",
            "    text \"*\"\n",
            "    text \"not\"\n",
            "    text \"*\"\n",
        )
    );
}

#[test]
fn code_span_protects_delimiters() {
    assert_eq!(
        tree("a `*b*` c\n"),
        concat!(
            "document\n",
            "  paragraph\n",
            "    text \"a \"\n",
            "    code-span \"*b*\"\n",
            "    text \" c\"\n",
        )
    );
}

#[test]
fn code_span_spans_lines() {
    assert_eq!(
        tree("`a\nb`\n"),
        "document\n  paragraph\n    code-span \"a b\"\n"
    );
}

#[test]
fn unmatched_backticks_stay_literal() {
    // The unmatched opener run must not re-pair at a shorter length; it
    // merges into the surrounding literal text instead.
    assert_eq!(tree("``x`\n"), "document\n  paragraph\n    text \"``x`\"\n");
}

#[test]
fn autolinks() {
    assert_eq!(
        tree("<https://example.com>\n"),
        "document\n  paragraph\n    autolink \"https://example.com\"\n"
    );
    assert_eq!(
        tree("<user@example.com>\n"),
        "document\n  paragraph\n    autolink \"user@example.com\" email\n"
    );
    // Not an autolink: spaces are not allowed.
    assert_eq!(
        tree("<not a link>\n"),
        "document\n  paragraph\n    text \"<not a link>\"\n"
    );
}

#[test]
fn inline_link_with_title() {
    assert_eq!(
        tree("[text](/url \"title\")\n"),
        concat!(
            "document\n",
            "  paragraph\n",
            "    link url=\"/url\" title=\"title\"\n",
            "      text \"text\"\n",
        )
    );
}

#[test]
fn image_link() {
    assert_eq!(
        tree("![alt](img.png)\n"),
        concat!(
            "document\n",
            "  paragraph\n",
            "    image url=\"img.png\"\n",
            "      text \"alt\"\n",
        )
    );
}

#[test]
fn emphasis_resolves_inside_link_label() {
    assert_eq!(
        tree("[*em*](u)\n"),
        concat!(
            "document\n",
            "  paragraph\n",
            "    link url=\"u\"\n",
            "      emph\n",
            "        text \"em\"\n",
        )
    );
}

#[test]
fn unclosed_bracket_degrades_to_text() {
    assert_eq!(
        tree("[foo bar\n"),
        concat!(
            "document\n",
            "  paragraph\n",
            "    text \"[\"\n",
            "    text \"foo bar\"\n",
        )
    );
}

#[test]
fn no_links_inside_links() {
    assert_eq!(
        tree("[a [b](u) c](v)\n"),
        concat!(
            "document\n",
            "  paragraph\n",
            "    text \"[\"\n",
            "    text \"a \"\n",
            "    link url=\"u\"\n",
            "      text \"b\"\n",
            "    text \" c\"\n",
            "    text \"]\"\n",
            "    text \"(v)\"\n",
        )
    );
}

#[test]
fn nested_emphasis_from_triple_run() {
    assert_eq!(
        tree("***a***\n"),
        concat!(
            "document\n",
            "  paragraph\n",
            "    emph\n",
            "      strong\n",
            "        text \"a\"\n",
        )
    );
}

#[test]
fn strikethrough_needs_two_tildes() {
    assert_eq!(
        tree("~~gone~~\n"),
        concat!(
            "document\n",
            "  paragraph\n",
            "    strike\n",
            "      text \"gone\"\n",
        )
    );
    assert_eq!(tree("~one~\n"), "document\n  paragraph\n    text \"~one~\"\n");
}

#[test]
fn intraword_underscore_stays_literal() {
    assert_eq!(
        tree("snake_case_name\n"),
        concat!(
            "document\n",
            "  paragraph\n",
            "    text \"snake\"\n",
            "    text \"_\"\n",
            "    text \"case\"\n",
            "    text \"_\"\n",
            "    text \"name\"\n",
        )
    );
}

#[test]
fn quote_tab_after_marker_splits_to_columns() {
    assert_eq!(
        tree(">\tword\n"),
        concat!(
            "document\n",
            "  quote\n",
            "    paragraph\n",
            "      text \"word\"\n",
        )
    );
}

#[test]
fn blank_line_inside_item_fence_keeps_list_tight() {
    assert_eq!(
        tree("- ```\n\n  x\n  ```\n"),
        concat!(
            "document\n",
            "  list\n",
            "    item\n",
            "      fenced-code\n",
            "        line \"\"\n",
            "        line \"x\"\n",
        )
    );
}

#[test]
fn trace_sink_sees_lines_and_blocks() {
    let engine = Engine::new().expect("engine");
    let mut sink = VecSink::default();
    engine
        .parse_with_trace("# h\n\npara\n", &mut sink)
        .expect("parse");
    assert!(sink.events.iter().any(|e| e.starts_with("line 0")));
    assert!(sink.events.iter().any(|e| e.starts_with("open heading")));
    assert!(sink.events.iter().any(|e| e.starts_with("close paragraph")));
}

struct NonAsciiParser;

impl InlineParser for NonAsciiParser {
    fn name(&self) -> &'static str {
        "non_ascii"
    }

    fn first_chars(&self) -> &[u8] {
        &[200]
    }

    fn match_inline(&self, _state: &mut InlineState<'_>) -> bool {
        false
    }
}

struct StarClaimer;

impl InlineParser for StarClaimer {
    fn name(&self) -> &'static str {
        "star_claimer"
    }

    fn first_chars(&self) -> &[u8] {
        b"*"
    }

    fn match_inline(&self, _state: &mut InlineState<'_>) -> bool {
        false
    }
}

#[test]
fn non_ascii_first_char_is_a_construction_error() {
    let mut inlines = loommark_core::default_inline_parsers();
    inlines.push(Box::new(NonAsciiParser));
    let result = Engine::with_parsers(
        loommark_core::default_block_parsers(),
        inlines,
        EngineOptions::default(),
    );
    assert!(matches!(
        result.err(),
        Some(EngineError::NonAsciiFirstChar { byte: 200, .. })
    ));
}

#[test]
fn duplicate_first_char_is_a_construction_error() {
    let mut inlines = loommark_core::default_inline_parsers();
    inlines.push(Box::new(StarClaimer));
    let result = Engine::with_parsers(
        loommark_core::default_block_parsers(),
        inlines,
        EngineOptions::default(),
    );
    assert!(matches!(
        result.err(),
        Some(EngineError::DuplicateFirstChar { byte: '*', .. })
    ));
}

#[test]
fn missing_paragraph_parser_is_a_construction_error() {
    let result = Engine::with_parsers(
        Vec::new(),
        loommark_core::default_inline_parsers(),
        EngineOptions::default(),
    );
    assert!(matches!(result.err(), Some(EngineError::NoParagraphParser)));
}

#[test]
fn empty_input_yields_bare_document() {
    assert_eq!(tree(""), "document\n");
    assert_eq!(tree("\n\n\n"), "document\n");
}

#[test]
fn crlf_lines_parse_like_lf() {
    assert_eq!(tree("# a\r\nb\r\n"), tree("# a\nb\n"));
}
