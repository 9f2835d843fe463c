use tracing::trace;

use crate::context::FunctionContext;
use crate::error::Result;

/// Growable byte buffer backing variable-length accumulator state.
///
/// The region is allocated from the [`FunctionContext`] and is always exactly
/// `capacity` bytes long; `buffer[0..len]` holds the current value. Growth
/// reallocates to 1.5x the required length, which keeps repeated appends
/// amortised O(1).
#[derive(Debug, Default)]
pub struct ScratchBuffer {
    buffer: Option<Vec<u8>>,
    len: usize,
    populated: bool,
    reallocations: usize,
}

impl ScratchBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.buffer.as_ref().map_or(0, Vec::len)
    }

    /// True once a value has been stored, even an empty one.
    pub fn is_populated(&self) -> bool {
        self.populated
    }

    pub fn reallocations(&self) -> usize {
        self.reallocations
    }

    pub fn as_bytes(&self) -> &[u8] {
        match &self.buffer {
            Some(buffer) => &buffer[..self.len],
            None => &[],
        }
    }

    /// Makes room for at least `n` bytes. When `preserve` is set the current
    /// bytes survive the reallocation, otherwise the content is undefined.
    pub fn ensure_capacity(&mut self, ctx: &FunctionContext, n: usize, preserve: bool) -> Result<()> {
        if n <= self.capacity() {
            return Ok(());
        }

        let new_capacity = n + n / 2;
        let mut new_buffer = ctx.allocate(new_capacity)?;
        if let Some(old) = self.buffer.take() {
            if preserve {
                new_buffer[..self.len].copy_from_slice(&old[..self.len]);
            }
            ctx.free(old);
        }
        trace!(
            "scratch buffer grown to {new_capacity} bytes (required {n}, preserve {preserve})"
        );
        self.buffer = Some(new_buffer);
        self.reallocations += 1;

        Ok(())
    }

    /// Replaces the content with `bytes`.
    pub fn set(&mut self, ctx: &FunctionContext, bytes: &[u8]) -> Result<()> {
        self.ensure_capacity(ctx, bytes.len(), false)?;
        if let Some(buffer) = &mut self.buffer {
            buffer[..bytes.len()].copy_from_slice(bytes);
        }
        self.len = bytes.len();
        self.populated = true;

        Ok(())
    }

    /// Appends `bytes` after the current content.
    pub fn append(&mut self, ctx: &FunctionContext, bytes: &[u8]) -> Result<()> {
        if bytes.is_empty() {
            return Ok(());
        }

        let new_len = self.len + bytes.len();
        self.ensure_capacity(ctx, new_len, true)?;
        if let Some(buffer) = &mut self.buffer {
            buffer[self.len..new_len].copy_from_slice(bytes);
        }
        self.len = new_len;
        self.populated = true;

        Ok(())
    }

    /// Splits the buffer into its region (if any), the value length and the
    /// populated flag.
    pub(crate) fn into_parts(self) -> (Option<Vec<u8>>, usize, bool) {
        (self.buffer, self.len, self.populated)
    }
}
