/// Optional line-oriented trace sink for the block phase. Costs nothing
/// when absent; there are no other telemetry side channels.
pub trait TraceSink {
    /// A logical line is about to be processed.
    fn line_start(&mut self, line_index: usize, text: &str);

    /// A block was opened on this line by the named parser.
    fn block_opened(&mut self, line_index: usize, parser: &'static str);

    /// A block was closed while processing this line.
    fn block_closed(&mut self, line_index: usize, parser: &'static str);
}

/// Trace sink that records events as plain strings; handy in tests.
#[derive(Debug, Default)]
pub struct VecSink {
    pub events: Vec<String>,
}

impl TraceSink for VecSink {
    fn line_start(&mut self, line_index: usize, text: &str) {
        self.events.push(format!("line {line_index}: {text:?}"));
    }

    fn block_opened(&mut self, line_index: usize, parser: &'static str) {
        self.events.push(format!("open {parser} @{line_index}"));
    }

    fn block_closed(&mut self, line_index: usize, parser: &'static str) {
        self.events.push(format!("close {parser} @{line_index}"));
    }
}
