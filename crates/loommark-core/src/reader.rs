use memchr::memchr;

/// A source of logical lines: one line per call, line endings stripped,
/// `None` at end of input.
pub trait LineSource {
    fn next_line(&mut self) -> Option<&str>;
}

/// Line source over an in-memory string, with `memchr`-accelerated newline
/// scanning and CRLF handling.
pub struct StrLines<'s> {
    source: &'s str,
    offset: usize,
}

impl<'s> StrLines<'s> {
    pub fn new(source: &'s str) -> Self {
        Self { source, offset: 0 }
    }
}

impl LineSource for StrLines<'_> {
    fn next_line(&mut self) -> Option<&str> {
        let bytes = self.source.as_bytes();
        if self.offset >= bytes.len() {
            return None;
        }
        let start = self.offset;
        let end = match memchr(b'\n', &bytes[start..]) {
            Some(pos) => start + pos,
            None => bytes.len(),
        };
        let text_end = if end > start && bytes[end - 1] == b'\r' {
            end - 1
        } else {
            end
        };
        self.offset = if end < bytes.len() { end + 1 } else { end };
        Some(&self.source[start..text_end])
    }
}

#[cfg(test)]
mod tests {
    use super::{LineSource, StrLines};

    fn collect(source: &str) -> Vec<String> {
        let mut lines = StrLines::new(source);
        let mut out = Vec::new();
        while let Some(line) = lines.next_line() {
            out.push(line.to_string());
        }
        out
    }

    #[test]
    fn strips_lf_and_crlf() {
        assert_eq!(collect("a\nb\r\nc"), ["a", "b", "c"]);
    }

    #[test]
    fn trailing_newline_yields_no_empty_line() {
        assert_eq!(collect("a\n"), ["a"]);
    }

    #[test]
    fn interior_blank_lines_survive() {
        assert_eq!(collect("a\n\nb"), ["a", "", "b"]);
    }

    #[test]
    fn empty_input_is_eof() {
        assert!(collect("").is_empty());
    }
}
