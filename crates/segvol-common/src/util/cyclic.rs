/// Terminator appended after every message stored in a [`CyclicBuffer`].
pub const LINE_TERMINATOR: &[u8] = b"\r\n";

/// A fixed-capacity byte ring that holds diagnostic text until the
/// host asks for it.
///
/// The buffer tracks its contents through a `start` position (oldest
/// byte), an `end` position (next free slot), both taken modulo `C`,
/// and a `level` holding the number of valid bytes between them.
///
/// Unlike a general purpose ring buffer, a full buffer never evicts
/// older data. A message that doesn't fit, including the
/// [`LINE_TERMINATOR`] every message gets, is dropped whole, so the
/// buffer only ever holds complete lines and a rejected append never
/// touches the ring state.
pub struct CyclicBuffer<const C: usize> {
    buf: [u8; C],
    start: usize,
    end: usize,
    level: usize,
}

impl<const C: usize> CyclicBuffer<C> {
    const fn assert_valid_capacity() {
        assert!(
            C > LINE_TERMINATOR.len(),
            "Cyclic buffer capacity must leave room for at least one line terminator!"
        )
    }

    #[inline]
    pub const fn new() -> Self {
        const { Self::assert_valid_capacity() }

        Self {
            buf: [0; C],
            start: 0,
            end: 0,
            level: 0,
        }
    }

    /// Discards every pending byte and rewinds both positions.
    pub fn reset(&mut self) {
        self.start = 0;
        self.end = 0;
        self.level = 0;
    }

    /// Returns the number of bytes waiting to be drained.
    #[inline(always)]
    pub const fn level(&self) -> usize {
        self.level
    }

    /// Returns the number of free bytes in the buffer.
    #[inline(always)]
    pub const fn free(&self) -> usize {
        C - self.level
    }

    #[inline(always)]
    pub const fn capacity(&self) -> usize {
        C
    }

    #[inline(always)]
    pub const fn is_empty(&self) -> bool {
        self.level == 0
    }

    /// Copies `bytes` at the end of the ring, wrapping around the
    /// backing array if needed. Callers must have checked that there
    /// is room for them.
    fn write_wrapping(&mut self, bytes: &[u8]) {
        let first_write_cnt = usize::min(bytes.len(), C - self.end);
        let second_write_cnt = bytes.len() - first_write_cnt;

        self.buf[self.end..self.end + first_write_cnt].copy_from_slice(&bytes[..first_write_cnt]);
        self.buf[..second_write_cnt].copy_from_slice(&bytes[first_write_cnt..]);

        self.end = (self.end + bytes.len()) % C;
        self.level += bytes.len();
    }

    /// Appends `text` followed by `\r\n`.
    ///
    /// If the whole message plus its terminator doesn't fit in the
    /// free space, the call does nothing: the message is silently
    /// dropped and no byte is written.
    pub fn append(&mut self, text: &[u8]) {
        if text.len().saturating_add(LINE_TERMINATOR.len()) > self.free() {
            return;
        }

        self.write_wrapping(text);
        self.write_wrapping(LINE_TERMINATOR);
    }

    /// Moves up to `out.len()` of the oldest bytes into `out`,
    /// removing them from the buffer.
    ///
    /// Returns the number of bytes actually copied.
    pub fn drain(&mut self, out: &mut [u8]) -> usize {
        let count = usize::min(out.len(), self.level);
        let first_read_cnt = usize::min(count, C - self.start);

        out[..first_read_cnt].copy_from_slice(&self.buf[self.start..self.start + first_read_cnt]);
        out[first_read_cnt..count].copy_from_slice(&self.buf[..count - first_read_cnt]);

        self.start = (self.start + count) % C;
        self.level -= count;
        count
    }

    /// Drains the buffer into a length-prefixed block of `N` bytes.
    ///
    /// Byte 0 holds the exact number of payload bytes that follow it,
    /// which is at most `N - 1`. Bytes past the payload are zero. An
    /// empty buffer produces a block whose prefix is zero.
    pub fn drain_block<const N: usize>(&mut self) -> [u8; N] {
        const {
            assert!(N >= 2, "A drained block needs room for the prefix and some payload!");
            assert!(N <= 256, "The payload length of a drained block must fit in its prefix byte!");
        }

        let mut block = [0u8; N];
        let count = self.drain(&mut block[1..]);
        block[0] = count as u8;
        block
    }
}

impl<const C: usize> Default for CyclicBuffer<C> {
    fn default() -> Self {
        Self::new()
    }
}
