//! Bump allocator backing all per-cycle shell memory.
//!
//! The arena owns a chain of fixed-capacity blocks and hands out regions by
//! bumping the current block's used-offset. Nothing is freed individually:
//! [`Arena::reset`] discards every block except the first and rewinds it,
//! releasing a whole command cycle at once.
//!
//! Allocations are addressed through [`ArenaRef`]/[`ArenaStr`] handles rather
//! than raw pointers, so the crate stays in safe Rust. A handle is only
//! meaningful against the arena that issued it and only until that arena's
//! next `reset`.

use thiserror::Error;

/// Capacity of the first block and the floor for appended blocks.
pub const DEFAULT_BLOCK_SIZE: usize = 64 * 1024;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ArenaError {
    /// Alignment was zero or not a power of two.
    #[error("alignment must be a power of two, got {0}")]
    BadAlign(usize),
    /// The requested size overflows what a block can ever address.
    #[error("allocation of {0} bytes is too large")]
    TooLarge(usize),
}

/// Handle to a byte region inside an [`Arena`].
///
/// Valid until the owning arena is reset or dropped. Resolving a stale handle
/// is a logic error and panics, like indexing out of bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArenaRef {
    block: usize,
    offset: usize,
    len: usize,
}

impl ArenaRef {
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Byte offset inside the owning block. Exposed for alignment checks.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Index of the owning block in the arena's chain.
    pub fn block(&self) -> usize {
        self.block
    }
}

/// Handle to a NUL-terminated string duplicated into an [`Arena`].
///
/// The text is stored with a trailing NUL byte, matching the process-exec
/// contract for argv strings; [`Arena::str`] returns it without the NUL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArenaStr(ArenaRef);

impl ArenaStr {
    /// Length of the text in bytes, excluding the trailing NUL.
    pub fn len(&self) -> usize {
        self.0.len - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

struct Block {
    buf: Box<[u8]>,
    used: usize,
}

impl Block {
    fn new(cap: usize) -> Self {
        Self {
            buf: vec![0u8; cap].into_boxed_slice(),
            used: 0,
        }
    }

    fn cap(&self) -> usize {
        self.buf.len()
    }
}

/// Chained-block bump allocator.
///
/// Created once at shell start, reset at the end of every command cycle,
/// dropped at shell exit.
pub struct Arena {
    blocks: Vec<Block>,
    block_size: usize,
}

impl Arena {
    pub fn new() -> Self {
        Self::with_block_size(DEFAULT_BLOCK_SIZE)
    }

    /// Arena whose first block (and appended-block floor) is `block_size`
    /// bytes. Small sizes make block-growth paths easy to exercise in tests.
    pub fn with_block_size(block_size: usize) -> Self {
        Self {
            blocks: Vec::new(),
            block_size: block_size.max(1),
        }
    }

    /// Allocate `size` bytes aligned to `align` within a block.
    ///
    /// `align` must be a power of two. Zero-size requests round up to one
    /// byte so every allocation has a distinct region. When the current
    /// block cannot fit the request, a new block sized
    /// `max(block_size, size + align)` becomes the current block; earlier
    /// blocks are left untouched until [`Arena::reset`].
    pub fn alloc(&mut self, size: usize, align: usize) -> Result<ArenaRef, ArenaError> {
        if align == 0 || !align.is_power_of_two() {
            return Err(ArenaError::BadAlign(align));
        }
        let size = size.max(1);

        if self.blocks.is_empty() {
            self.blocks.push(Block::new(self.block_size));
        }

        let block = self.blocks.len() - 1;
        let current = &self.blocks[block];
        let offset = align_up(current.used, align).ok_or(ArenaError::TooLarge(size))?;
        let end = offset.checked_add(size).ok_or(ArenaError::TooLarge(size))?;

        if end <= current.cap() {
            self.blocks[block].used = end;
            return Ok(ArenaRef { block, offset, len: size });
        }

        // Request does not fit: append a dedicated current block. `size +
        // align` leaves slack for the worst-case alignment pad.
        let need = size.checked_add(align).ok_or(ArenaError::TooLarge(size))?;
        let cap = need.max(self.block_size);
        self.blocks.push(Block::new(cap));
        let block = self.blocks.len() - 1;
        self.blocks[block].used = size;
        Ok(ArenaRef {
            block,
            offset: 0,
            len: size,
        })
    }

    /// Copy `data` into the arena.
    pub fn alloc_bytes(&mut self, data: &[u8]) -> Result<ArenaRef, ArenaError> {
        let r = self.alloc(data.len(), 1)?;
        self.bytes_mut(r)[..data.len()].copy_from_slice(data);
        Ok(r)
    }

    /// Duplicate `s` into the arena with a trailing NUL byte.
    pub fn alloc_str(&mut self, s: &str) -> Result<ArenaStr, ArenaError> {
        let r = self.alloc(s.len() + 1, 1)?;
        let buf = self.bytes_mut(r);
        buf[..s.len()].copy_from_slice(s.as_bytes());
        buf[s.len()] = 0;
        Ok(ArenaStr(r))
    }

    /// Resolve a byte-region handle.
    pub fn bytes(&self, r: ArenaRef) -> &[u8] {
        &self.blocks[r.block].buf[r.offset..r.offset + r.len]
    }

    pub fn bytes_mut(&mut self, r: ArenaRef) -> &mut [u8] {
        &mut self.blocks[r.block].buf[r.offset..r.offset + r.len]
    }

    /// Resolve a string handle, without the trailing NUL.
    pub fn str(&self, s: ArenaStr) -> &str {
        let bytes = &self.bytes(s.0)[..s.0.len - 1];
        // alloc_str only ever stores valid UTF-8 followed by a NUL.
        std::str::from_utf8(bytes).unwrap_or("")
    }

    /// Discard every block except the first and rewind its used-offset.
    ///
    /// Invalidates all previously returned handles.
    pub fn reset(&mut self) {
        self.blocks.truncate(1);
        if let Some(first) = self.blocks.first_mut() {
            first.used = 0;
        }
    }

    /// Number of blocks in the chain.
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Used-offset of the current block; 0 for a fresh or reset arena.
    pub fn used(&self) -> usize {
        self.blocks.last().map_or(0, |b| b.used)
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::new()
    }
}

fn align_up(offset: usize, align: usize) -> Option<usize> {
    let mask = align - 1;
    offset.checked_add(mask).map(|v| v & !mask)
}
