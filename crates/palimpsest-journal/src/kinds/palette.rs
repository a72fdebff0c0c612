#![forbid(unsafe_code)]

//! Palette edits.

use palimpsest_raster::{ObjectId, Palette, RasterError, Registry, Sprite};

use super::{Emitter, Outcome, present, required, skip};
use crate::codec::{ByteReader, ByteWriter};
use crate::error::{JournalError, Result};
use crate::record::RecordKind;

/// Invert a color index permutation: `inverse[mapping[c]] == c`.
///
/// For a table that is not a permutation, indices no entry maps to are left
/// at `0`.
#[must_use]
pub fn inverse_mapping(mapping: &[u8; 256]) -> [u8; 256] {
    let mut inverse = [0u8; 256];
    for (c, &m) in mapping.iter().enumerate() {
        inverse[usize::from(m)] = c as u8;
    }
    inverse
}

fn is_permutation(mapping: &[u8; 256]) -> bool {
    let mut seen = [false; 256];
    for &m in mapping {
        if std::mem::replace(&mut seen[usize::from(m)], true) {
            return false;
        }
    }
    true
}

fn read_entries(r: &mut ByteReader<'_>, count: usize) -> Result<Vec<u32>> {
    (0..count)
        .map(|_| r.u32().map_err(JournalError::from))
        .collect()
}

// ============================================================================
// add_palette / remove_palette
// ============================================================================

pub(crate) fn capture_add_palette(
    out: &mut Emitter<'_>,
    reg: &Registry,
    sprite: ObjectId,
    palette: ObjectId,
) -> Result<()> {
    required::<Sprite>(reg, sprite)?;
    required::<Palette>(reg, palette)?;
    let mut p = ByteWriter::new();
    p.put_id(Some(sprite)).put_id(Some(palette));
    out.emit(RecordKind::AddPalette, p)
}

pub(crate) fn invert_add_palette(
    r: &mut ByteReader<'_>,
    out: &mut Emitter<'_>,
    reg: &mut Registry,
) -> Result<Outcome> {
    let sprite = r.required_id("sprite")?;
    let palette = r.required_id("palette")?;
    r.finish()?;

    if !present::<Sprite>(reg, sprite, RecordKind::AddPalette)?
        || !present::<Palette>(reg, palette, RecordKind::AddPalette)?
    {
        return Ok(Outcome::Skipped);
    }
    capture_remove_palette(out, reg, sprite, palette)?;
    reg.delete_palette(sprite, palette)?;
    reg.release(palette);
    Ok(Outcome::Applied)
}

pub(crate) fn capture_remove_palette(
    out: &mut Emitter<'_>,
    reg: &Registry,
    sprite: ObjectId,
    palette: ObjectId,
) -> Result<()> {
    required::<Sprite>(reg, sprite)?;
    let pal = required::<Palette>(reg, palette)?;
    let mut p = ByteWriter::new();
    p.put_id(Some(sprite)).put_id(Some(palette));
    p.put_u16_from(pal.frame() as usize, "palette frame")?
        .put_u16_from(pal.len(), "palette size")?;
    for &entry in pal.entries() {
        p.put_u32(entry);
    }
    out.emit(RecordKind::RemovePalette, p)
}

pub(crate) fn invert_remove_palette(
    r: &mut ByteReader<'_>,
    out: &mut Emitter<'_>,
    reg: &mut Registry,
) -> Result<Outcome> {
    let sprite = r.required_id("sprite")?;
    let palette = r.required_id("palette")?;
    let frame = u32::from(r.u16()?);
    let ncolors = usize::from(r.u16()?);
    let entries = read_entries(r, ncolors)?;
    r.finish()?;

    if !present::<Sprite>(reg, sprite, RecordKind::RemovePalette)? {
        return Ok(Outcome::Skipped);
    }
    reg.rebind(palette, Palette::from_entries(frame, entries));
    capture_add_palette(out, reg, sprite, palette)?;
    reg.insert_palette(sprite, palette)?;
    Ok(Outcome::Applied)
}

// ============================================================================
// set_palette_colors
// ============================================================================

/// Store entries `from..=to` of `palette`, keyed by the palette's start
/// frame so invert can find whichever palette covers that frame then.
pub(crate) fn capture_set_palette_colors(
    out: &mut Emitter<'_>,
    reg: &Registry,
    sprite: ObjectId,
    palette: ObjectId,
    from: u8,
    to: u8,
) -> Result<()> {
    required::<Sprite>(reg, sprite)?;
    let pal = required::<Palette>(reg, palette)?;
    if from > to {
        return Err(JournalError::InvalidCapture(format!(
            "palette range {from}..={to} is reversed"
        )));
    }
    let range = usize::from(from)..=usize::from(to);
    let entries = pal.entries().get(range).ok_or(RasterError::PaletteIndex {
        index: usize::from(to),
        len: pal.len(),
    })?;

    let mut p = ByteWriter::new();
    p.put_id(Some(sprite))
        .put_u32(pal.frame())
        .put_u8(from)
        .put_u8(to);
    for &entry in entries {
        p.put_u32(entry);
    }
    out.emit(RecordKind::SetPaletteColors, p)
}

pub(crate) fn invert_set_palette_colors(
    r: &mut ByteReader<'_>,
    out: &mut Emitter<'_>,
    reg: &mut Registry,
) -> Result<Outcome> {
    let sprite = r.required_id("sprite")?;
    let frame = r.u32()?;
    let from = r.u8()?;
    let to = r.u8()?;
    let count = usize::from(to.saturating_sub(from)) + 1;
    let entries = read_entries(r, count)?;
    r.finish()?;

    if !present::<Sprite>(reg, sprite, RecordKind::SetPaletteColors)? {
        return Ok(Outcome::Skipped);
    }
    let Some(palette) = reg.palette_for(sprite, frame) else {
        return Ok(skip(RecordKind::SetPaletteColors, sprite));
    };
    capture_set_palette_colors(out, reg, sprite, palette, from, to)?;
    let pal = reg.resolve_typed_mut::<Palette>(palette)?;
    for (index, color) in (usize::from(from)..).zip(entries) {
        pal.set_entry(index, color)?;
    }
    Ok(Outcome::Applied)
}

// ============================================================================
// remap_palette
// ============================================================================

/// Store a color index permutation about to be applied to the cel images
/// on frames `from..=to`.
pub(crate) fn capture_remap_palette(
    out: &mut Emitter<'_>,
    reg: &Registry,
    sprite: ObjectId,
    (from, to): (u32, u32),
    mapping: &[u8; 256],
) -> Result<()> {
    required::<Sprite>(reg, sprite)?;
    if from > to {
        return Err(JournalError::InvalidCapture(format!(
            "frame range {from}..={to} is reversed"
        )));
    }
    if !is_permutation(mapping) {
        return Err(JournalError::InvalidCapture(
            "remap table is not a permutation".to_owned(),
        ));
    }
    let mut p = ByteWriter::new();
    p.put_id(Some(sprite))
        .put_u32(from)
        .put_u32(to)
        .put_bytes(mapping);
    out.emit(RecordKind::RemapPalette, p)
}

/// Apply the inverse table; the inverse is also what gets recorded.
pub(crate) fn invert_remap_palette(
    r: &mut ByteReader<'_>,
    out: &mut Emitter<'_>,
    reg: &mut Registry,
) -> Result<Outcome> {
    let sprite = r.required_id("sprite")?;
    let from = r.u32()?;
    let to = r.u32()?;
    let mut mapping = [0u8; 256];
    mapping.copy_from_slice(r.bytes(256)?);
    r.finish()?;

    if !present::<Sprite>(reg, sprite, RecordKind::RemapPalette)? {
        return Ok(Outcome::Skipped);
    }
    let inverse = inverse_mapping(&mapping);
    capture_remap_palette(out, reg, sprite, (from, to), &inverse)?;
    reg.remap_images(sprite, from, to, &inverse)?;
    Ok(Outcome::Applied)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rotation(by: u8) -> [u8; 256] {
        let mut table = [0u8; 256];
        for (c, slot) in table.iter_mut().enumerate() {
            *slot = (c as u8).wrapping_add(by);
        }
        table
    }

    #[test]
    fn inverse_undoes_rotation() {
        let table = rotation(3);
        let inverse = inverse_mapping(&table);
        for c in 0..=255u8 {
            assert_eq!(inverse[usize::from(table[usize::from(c)])], c);
        }
        assert_eq!(inverse, rotation(253));
    }

    #[test]
    fn duplicate_targets_are_not_permutations() {
        let mut table = rotation(0);
        assert!(is_permutation(&table));
        table[1] = 0;
        assert!(!is_permutation(&table));
    }
}
