use std::borrow::Cow;

/// Rewindable position over the current logical line.
///
/// Columns follow CommonMark's 4-column tab stops. A tab may be consumed one
/// column at a time: while partially consumed, the cursor reports the
/// remaining columns as spaces and [`LineCursor::remainder`] materialises
/// them.
#[derive(Debug)]
pub struct LineCursor {
    text: String,
    pos: usize,
    /// Virtual end of line; parsers may pull it in to drop trailing syntax
    /// (e.g. an ATX closing sequence).
    end: usize,
    column: usize,
    /// Columns left in a partially consumed tab at `pos`.
    tab_spaces: usize,
    saves: Vec<CursorSnapshot>,
}

/// Copyable snapshot for save/restore.
#[derive(Clone, Copy, Debug)]
pub struct CursorSnapshot {
    pos: usize,
    end: usize,
    column: usize,
    tab_spaces: usize,
}

impl LineCursor {
    pub fn new() -> Self {
        Self {
            text: String::new(),
            pos: 0,
            end: 0,
            column: 0,
            tab_spaces: 0,
            saves: Vec::new(),
        }
    }

    /// Rebinds the cursor to a new line, reusing the internal buffer.
    pub fn reset(&mut self, line: &str) {
        self.text.clear();
        self.text.push_str(line);
        self.pos = 0;
        self.end = self.text.len();
        self.column = 0;
        self.tab_spaces = 0;
        self.saves.clear();
    }

    pub fn column(&self) -> usize {
        self.column
    }

    /// Current byte. Mid-tab positions read as a space.
    pub fn peek(&self) -> Option<u8> {
        if self.tab_spaces > 0 {
            return Some(b' ');
        }
        if self.pos < self.end {
            Some(self.text.as_bytes()[self.pos])
        } else {
            None
        }
    }

    /// Advances one column for whitespace (splitting tabs), one byte
    /// otherwise.
    pub fn bump(&mut self) {
        if self.tab_spaces > 0 {
            self.tab_spaces -= 1;
            self.column += 1;
            if self.tab_spaces == 0 {
                self.pos += 1;
            }
            return;
        }
        if self.pos >= self.end {
            return;
        }
        match self.text.as_bytes()[self.pos] {
            b'\t' => {
                let width = 4 - (self.column % 4);
                self.column += 1;
                if width > 1 {
                    self.tab_spaces = width - 1;
                } else {
                    self.pos += 1;
                }
            }
            _ => {
                self.pos += 1;
                self.column += 1;
            }
        }
    }

    pub fn is_eol(&self) -> bool {
        self.tab_spaces == 0 && self.pos >= self.end
    }

    /// True when nothing but spaces and tabs remain.
    pub fn is_blank(&self) -> bool {
        self.text.as_bytes()[self.pos..self.end]
            .iter()
            .all(|b| *b == b' ' || *b == b'\t')
    }

    pub fn save(&mut self) {
        self.saves.push(CursorSnapshot {
            pos: self.pos,
            end: self.end,
            column: self.column,
            tab_spaces: self.tab_spaces,
        });
    }

    pub fn restore(&mut self) {
        if let Some(snapshot) = self.saves.pop() {
            self.pos = snapshot.pos;
            self.end = snapshot.end;
            self.column = snapshot.column;
            self.tab_spaces = snapshot.tab_spaces;
        }
    }

    /// Pops the latest save without rewinding.
    pub fn commit(&mut self) {
        self.saves.pop();
    }

    /// Consumes up to `max` literal spaces (block syntax allows at most
    /// three before a marker). Returns the count consumed.
    pub fn skip_spaces_up_to(&mut self, max: usize) -> usize {
        let mut skipped = 0;
        while skipped < max && self.peek() == Some(b' ') {
            self.bump();
            skipped += 1;
        }
        skipped
    }

    /// Consumes up to `max` columns of whitespace, splitting tabs as needed.
    /// Returns the number of columns consumed.
    pub fn skip_columns(&mut self, max: usize) -> usize {
        let mut consumed = 0;
        while consumed < max {
            match self.peek() {
                Some(b' ') | Some(b'\t') => {
                    self.bump();
                    consumed += 1;
                }
                _ => break,
            }
        }
        consumed
    }

    /// Columns of whitespace ahead of the cursor, without consuming.
    pub fn indent_width(&self) -> usize {
        let start = self.column;
        let mut col = self.column + self.tab_spaces;
        let from = if self.tab_spaces > 0 {
            self.pos + 1
        } else {
            self.pos
        };
        for byte in &self.text.as_bytes()[from..self.end] {
            match byte {
                b' ' => col += 1,
                b'\t' => col += 4 - (col % 4),
                _ => break,
            }
        }
        col - start
    }

    /// Consumes `n` bytes of the materialised remainder: pending tab columns
    /// count one byte each, a raw tab counts one byte.
    pub fn consume(&mut self, n: usize) {
        let mut left = n;
        while left > 0 && self.tab_spaces > 0 {
            self.bump();
            left -= 1;
        }
        while left > 0 && self.pos < self.end {
            match self.text.as_bytes()[self.pos] {
                b'\t' => {
                    self.column += 4 - (self.column % 4);
                    self.pos += 1;
                }
                _ => {
                    self.pos += 1;
                    self.column += 1;
                }
            }
            left -= 1;
        }
    }

    /// Pulls the virtual end of line in to `len` bytes past the cursor.
    pub fn limit_remainder(&mut self, len: usize) {
        debug_assert_eq!(self.tab_spaces, 0);
        let end = self.pos + len;
        if end < self.end {
            self.end = end;
        }
    }

    /// The unconsumed rest of the line. Borrows unless a partially consumed
    /// tab has to be materialised as spaces.
    pub fn remainder(&self) -> Cow<'_, str> {
        if self.tab_spaces == 0 {
            Cow::Borrowed(&self.text[self.pos..self.end])
        } else {
            let mut out = String::with_capacity(self.tab_spaces + self.end - self.pos);
            for _ in 0..self.tab_spaces {
                out.push(' ');
            }
            out.push_str(&self.text[self.pos + 1..self.end]);
            Cow::Owned(out)
        }
    }
}

impl Default for LineCursor {
    fn default() -> Self {
        Self::new()
    }
}
