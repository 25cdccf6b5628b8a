use std::cell::RefCell;
use std::ops::{Deref, DerefMut};

/// Borrow/return pool of string builders. Buffers come back on every exit
/// path through the guard's drop, including parser failure. Not shared
/// across threads: the parallel inline phase gives each worker its own pool.
#[derive(Debug, Default)]
pub struct BuilderPool {
    free: RefCell<Vec<String>>,
}

impl BuilderPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&self) -> Builder<'_> {
        let buf = self.free.borrow_mut().pop().unwrap_or_default();
        Builder { pool: self, buf }
    }

    fn put_back(&self, mut buf: String) {
        buf.clear();
        self.free.borrow_mut().push(buf);
    }
}

/// Scoped borrow of a pooled string builder.
#[derive(Debug)]
pub struct Builder<'p> {
    pool: &'p BuilderPool,
    buf: String,
}

impl Builder<'_> {
    /// Takes the built string; the (emptied) buffer still returns to the
    /// pool on drop.
    pub fn detach(mut self) -> String {
        std::mem::take(&mut self.buf)
    }
}

impl Deref for Builder<'_> {
    type Target = String;

    fn deref(&self) -> &String {
        &self.buf
    }
}

impl DerefMut for Builder<'_> {
    fn deref_mut(&mut self) -> &mut String {
        &mut self.buf
    }
}

impl Drop for Builder<'_> {
    fn drop(&mut self) {
        self.pool.put_back(std::mem::take(&mut self.buf));
    }
}
