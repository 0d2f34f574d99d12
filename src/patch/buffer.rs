//! Editable text buffers.
//!
//! [`TextBuffer`] is the seam between the matcher and whatever holds the
//! document: an editor, an in-memory string, or a file on disk.

use super::write_atomic;
use crate::error::{Result, ReshapeError};
use crate::ingest::Span;
use ropey::Rope;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// 0-based line and byte column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Position {
    /// Line index.
    pub line: usize,
    /// Byte offset within the line.
    pub column: usize,
}

/// A document the session can read, edit and save.
pub trait TextBuffer {
    /// Current full text.
    fn text(&self) -> String;

    /// Line and column of a byte offset. Offsets past the end clamp to the end.
    fn position_at(&self, offset: usize) -> Position;

    /// Replace the text in `span` with `text`.
    fn replace(&mut self, span: Span, text: &str) -> Result<()>;

    /// Persist the current text.
    fn save(&mut self) -> Result<()>;
}

/// In-memory buffer. Saving is a no-op.
#[derive(Debug, Clone, Default)]
pub struct MemoryBuffer {
    rope: Rope,
}

impl MemoryBuffer {
    /// Buffer holding `text`.
    pub fn new(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
        }
    }
}

impl TextBuffer for MemoryBuffer {
    fn text(&self) -> String {
        self.rope.to_string()
    }

    fn position_at(&self, offset: usize) -> Position {
        rope_position(&self.rope, offset)
    }

    fn replace(&mut self, span: Span, text: &str) -> Result<()> {
        rope_replace(&mut self.rope, span, text)
    }

    fn save(&mut self) -> Result<()> {
        Ok(())
    }
}

/// A file loaded into memory. Edits stay in memory until [`TextBuffer::save`].
#[derive(Debug, Clone)]
pub struct FileBuffer {
    path: PathBuf,
    rope: Rope,
}

impl FileBuffer {
    /// Load `path` as UTF-8.
    pub fn open(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ReshapeError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            rope: Rope::from_str(&content),
        })
    }

    /// File the buffer saves to.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TextBuffer for FileBuffer {
    fn text(&self) -> String {
        self.rope.to_string()
    }

    fn position_at(&self, offset: usize) -> Position {
        rope_position(&self.rope, offset)
    }

    fn replace(&mut self, span: Span, text: &str) -> Result<()> {
        rope_replace(&mut self.rope, span, text)
    }

    fn save(&mut self) -> Result<()> {
        write_atomic(&self.path, self.rope.to_string().as_bytes())?;
        log::debug!("Saved {}", self.path.display());
        Ok(())
    }
}

fn is_byte_boundary(rope: &Rope, byte: usize) -> bool {
    byte <= rope.len_bytes() && rope.char_to_byte(rope.byte_to_char(byte)) == byte
}

fn rope_replace(rope: &mut Rope, span: Span, text: &str) -> Result<()> {
    if span.start > span.end || !is_byte_boundary(rope, span.start) || !is_byte_boundary(rope, span.end) {
        return Err(ReshapeError::InvalidSpan {
            start: span.start,
            end: span.end,
            len: rope.len_bytes(),
        });
    }

    let start_char = rope.byte_to_char(span.start);
    let end_char = rope.byte_to_char(span.end);
    rope.remove(start_char..end_char);
    rope.insert(start_char, text);
    Ok(())
}

fn rope_position(rope: &Rope, offset: usize) -> Position {
    let mut offset = offset.min(rope.len_bytes());
    while !is_byte_boundary(rope, offset) {
        offset -= 1;
    }
    let line = rope.byte_to_line(offset);
    Position {
        line,
        column: offset - rope.line_to_byte(line),
    }
}
