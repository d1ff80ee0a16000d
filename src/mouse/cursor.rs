//! Cursor Arena
//!
//! Cursors live in an owned sequence keyed by stable [`CursorId`]s. Ids are
//! never reused, so a stale id can only fail lookup, never alias a newer
//! cursor.
//!
//! # Monochrome Format
//!
//! | mask bit | data bit | pixel |
//! |----------|----------|-------|
//! | 1 | 1 | black |
//! | 1 | 0 | white |
//! | 0 | 1 | black |
//! | 0 | 0 | transparent |
//!
//! Bits are MSB-first; each row is padded to a whole byte.

use serde::{Deserialize, Serialize};

use crate::backend::{CursorHandle, CursorImage, SystemCursor};
use crate::error::{InputError, Result};

const BLACK: u32 = 0xFF00_0000;
const WHITE: u32 = 0xFFFF_FFFF;
const TRANSPARENT: u32 = 0x0000_0000;

/// Stable cursor identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CursorId(pub u32);

/// How a cursor was made
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CursorSource {
    /// Backend's built-in pointer
    Default,
    Color { width: u32, height: u32 },
    System(SystemCursor),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor {
    pub handle: CursorHandle,
    pub source: CursorSource,
    pub hot_x: i32,
    pub hot_y: i32,
}

/// Expand a 1-bit cursor into ARGB pixels
///
/// `width` is rounded up to a multiple of 8.
pub fn monochrome_to_argb(
    data: &[u8],
    mask: &[u8],
    width: u32,
    height: u32,
) -> Result<CursorImage> {
    let too_large = || InputError::invalid(format!("monochrome cursor {}x{} is too large", width, height));
    let width = width.checked_add(7).ok_or_else(too_large)? & !7;
    let row_bytes = (width / 8) as usize;
    let needed = row_bytes.checked_mul(height as usize).ok_or_else(too_large)?;
    if data.len() < needed || mask.len() < needed {
        return Err(InputError::invalid(format!(
            "monochrome cursor {}x{} needs {} bytes of data and mask",
            width, height, needed
        )));
    }

    let mut pixels = Vec::new();
    pixels
        .try_reserve_exact(needed.checked_mul(8).ok_or_else(too_large)?)
        .map_err(|_| InputError::OutOfMemory("cursor image"))?;

    for (data_row, mask_row) in data[..needed]
        .chunks_exact(row_bytes)
        .zip(mask[..needed].chunks_exact(row_bytes))
    {
        for (&datab, &maskb) in data_row.iter().zip(mask_row) {
            for bit in (0..8).rev() {
                let ink = (datab >> bit) & 1 != 0;
                let opaque = (maskb >> bit) & 1 != 0;
                pixels.push(match (opaque, ink) {
                    (_, true) => BLACK,
                    (true, false) => WHITE,
                    (false, false) => TRANSPARENT,
                });
            }
        }
    }

    CursorImage::new(width, height, pixels)
}

/// Owned cursors with a default and a current selection
#[derive(Debug)]
pub struct CursorArena {
    cursors: Vec<(CursorId, Cursor)>,
    next_id: u32,
    default: CursorId,
    current: CursorId,
}

impl CursorArena {
    /// Arena holding only the default cursor
    pub fn new(default_handle: CursorHandle) -> Self {
        let default = CursorId(0);
        Self {
            cursors: vec![(
                default,
                Cursor {
                    handle: default_handle,
                    source: CursorSource::Default,
                    hot_x: 0,
                    hot_y: 0,
                },
            )],
            next_id: 1,
            default,
            current: default,
        }
    }

    /// Insert a cursor
    ///
    /// # Errors
    ///
    /// [`InputError::OutOfMemory`] when the arena cannot grow.
    pub fn insert(&mut self, cursor: Cursor) -> Result<CursorId> {
        self.cursors
            .try_reserve(1)
            .map_err(|_| InputError::OutOfMemory("cursor arena"))?;
        let id = CursorId(self.next_id);
        self.next_id += 1;
        self.cursors.push((id, cursor));
        Ok(id)
    }

    pub fn get(&self, id: CursorId) -> Option<&Cursor> {
        self.cursors
            .iter()
            .find(|(cursor_id, _)| *cursor_id == id)
            .map(|(_, cursor)| cursor)
    }

    pub fn contains(&self, id: CursorId) -> bool {
        self.get(id).is_some()
    }

    /// Remove a non-default cursor, returning it
    pub fn remove(&mut self, id: CursorId) -> Option<Cursor> {
        if id == self.default {
            return None;
        }
        let index = self.cursors.iter().position(|(cursor_id, _)| *cursor_id == id)?;
        if self.current == id {
            self.current = self.default;
        }
        Some(self.cursors.remove(index).1)
    }

    pub fn default_id(&self) -> CursorId {
        self.default
    }

    pub fn current_id(&self) -> CursorId {
        self.current
    }

    /// Select the current cursor
    ///
    /// # Errors
    ///
    /// [`InputError::InvalidArgument`] when `id` is not in the arena.
    pub fn set_current(&mut self, id: CursorId) -> Result<()> {
        if !self.contains(id) {
            return Err(InputError::invalid(format!(
                "cursor {} is not owned by this mouse",
                id.0
            )));
        }
        self.current = id;
        Ok(())
    }

    /// Replace the default cursor; the old default becomes an ordinary entry
    pub fn set_default(&mut self, id: CursorId) -> Result<()> {
        if !self.contains(id) {
            return Err(InputError::invalid(format!(
                "cursor {} is not owned by this mouse",
                id.0
            )));
        }
        if self.current == self.default {
            self.current = id;
        }
        self.default = id;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.cursors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cursors.is_empty()
    }

    /// Backend handles of every cursor, for teardown
    pub fn handles(&self) -> impl Iterator<Item = CursorHandle> + '_ {
        self.cursors.iter().map(|(_, cursor)| cursor.handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn color_cursor(handle: CursorHandle) -> Cursor {
        Cursor {
            handle,
            source: CursorSource::Color {
                width: 8,
                height: 8,
            },
            hot_x: 0,
            hot_y: 0,
        }
    }

    #[test]
    fn test_monochrome_conversion_truth_table() {
        // One row: data 1100, mask 1010, rest zero
        let image = monochrome_to_argb(&[0b1100_0000], &[0b1010_0000], 8, 1).unwrap();
        assert_eq!(image.width, 8);
        assert_eq!(&image.pixels[..4], &[BLACK, BLACK, WHITE, TRANSPARENT]);
        assert!(image.pixels[4..].iter().all(|&p| p == TRANSPARENT));
    }

    #[test]
    fn test_monochrome_width_rounds_up() {
        let image = monochrome_to_argb(&[0xFF, 0xFF], &[0xFF, 0xFF], 5, 2).unwrap();
        assert_eq!(image.width, 8);
        assert_eq!(image.pixels.len(), 16);
    }

    #[test]
    fn test_monochrome_short_buffer() {
        assert!(monochrome_to_argb(&[0xFF], &[0xFF], 16, 1).is_err());
    }

    #[test]
    fn test_monochrome_oversized_rejected() {
        let err = monochrome_to_argb(&[], &[], u32::MAX, 1).unwrap_err();
        assert!(matches!(err, InputError::InvalidArgument(_)));
        assert!(monochrome_to_argb(&[], &[], u32::MAX - 7, u32::MAX).is_err());
    }

    #[test]
    fn test_remove_current_falls_back_to_default() {
        let mut arena = CursorArena::new(0);
        let id = arena.insert(color_cursor(9)).unwrap();
        arena.set_current(id).unwrap();

        assert_eq!(arena.remove(id).map(|c| c.handle), Some(9));
        assert_eq!(arena.current_id(), arena.default_id());
        assert!(arena.set_current(id).is_err());
    }

    #[test]
    fn test_default_cannot_be_removed() {
        let mut arena = CursorArena::new(0);
        let default = arena.default_id();
        assert!(arena.remove(default).is_none());
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn test_ids_are_not_reused() {
        let mut arena = CursorArena::new(0);
        let first = arena.insert(color_cursor(1)).unwrap();
        arena.remove(first);
        let second = arena.insert(color_cursor(2)).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_set_default_moves_current() {
        let mut arena = CursorArena::new(0);
        let id = arena.insert(color_cursor(3)).unwrap();
        arena.set_default(id).unwrap();
        assert_eq!(arena.default_id(), id);
        assert_eq!(arena.current_id(), id);
        // Old default is now freeable
        assert!(arena.remove(CursorId(0)).is_some());
    }
}
