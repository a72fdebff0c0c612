#![forbid(unsafe_code)]

//! Raw encodings of images, cels and sparse diffs.

use palimpsest_raster::{Cel, ColorMode, Dirty, DirtyCol, DirtyRow, Image, ObjectId};

use super::{ByteReader, ByteWriter, CodecResult};
use crate::error::{CodecError, Result};

pub(crate) fn read_mode(r: &mut ByteReader<'_>) -> CodecResult<ColorMode> {
    let tag = u32::from(r.u8()?);
    ColorMode::from_tag(tag).map_err(|_| CodecError::UnknownColorMode(tag))
}

/// Raw image: id, mode, width, height, mask color, pixels. A `None` slot is
/// written as a lone `0` id.
pub(crate) fn write_image(w: &mut ByteWriter, slot: Option<(ObjectId, &Image)>) -> Result<()> {
    let Some((id, image)) = slot else {
        w.put_id(None);
        return Ok(());
    };
    w.put_id(Some(id)).put_u8(image.mode().tag());
    w.put_u16_from(image.width(), "image width")?
        .put_u16_from(image.height(), "image height")?
        .put_u32(image.mask_color())
        .put_bytes(image.data());
    Ok(())
}

pub(crate) fn read_image(r: &mut ByteReader<'_>) -> Result<Option<(ObjectId, Image)>> {
    let Some(id) = r.id()? else {
        return Ok(None);
    };
    let mode = read_mode(r)?;
    let width = usize::from(r.u16()?);
    let height = usize::from(r.u16()?);
    let mask_color = r.u32()?;
    let data = r.bytes(width * height * mode.bytes_per_pixel())?;
    let mut image = Image::from_raw(mode, width, height, data.to_vec())?;
    image.set_mask_color(mask_color);
    Ok(Some((id, image)))
}

/// Raw cel: id, frame, stock index, x, y, opacity.
pub(crate) fn write_cel(w: &mut ByteWriter, id: ObjectId, cel: &Cel) {
    w.put_id(Some(id))
        .put_u16(cel.frame)
        .put_u16(cel.image)
        .put_i16(cel.x)
        .put_i16(cel.y)
        .put_u16(cel.opacity);
}

pub(crate) fn read_cel(r: &mut ByteReader<'_>) -> CodecResult<(ObjectId, Cel)> {
    let id = r.required_id("cel")?;
    let cel = Cel {
        frame: r.u16()?,
        image: r.u16()?,
        x: r.i16()?,
        y: r.i16()?,
        opacity: r.u16()?,
    };
    Ok((id, cel))
}

/// Sparse diff: mode, bounds, then rows of runs with their pixels.
pub(crate) fn write_dirty(w: &mut ByteWriter, dirty: &Dirty) -> Result<()> {
    let (x1, y1, x2, y2) = dirty.bounds();
    w.put_u8(dirty.mode().tag());
    w.put_u16_from(x1, "dirty x1")?
        .put_u16_from(y1, "dirty y1")?
        .put_u16_from(x2, "dirty x2")?
        .put_u16_from(y2, "dirty y2")?
        .put_u16_from(dirty.rows().len(), "dirty rows")?;
    for row in dirty.rows() {
        w.put_u16_from(row.y, "dirty row y")?
            .put_u16_from(row.cols.len(), "dirty cols")?;
        for col in &row.cols {
            w.put_u16_from(col.x, "dirty col x")?
                .put_u16_from(col.w, "dirty col width")?
                .put_bytes(&col.data);
        }
    }
    Ok(())
}

pub(crate) fn read_dirty(r: &mut ByteReader<'_>) -> CodecResult<Dirty> {
    let mode = read_mode(r)?;
    let x1 = usize::from(r.u16()?);
    let y1 = usize::from(r.u16()?);
    let x2 = usize::from(r.u16()?);
    let y2 = usize::from(r.u16()?);
    let nrows = r.u16()?;

    let mut rows = Vec::with_capacity(usize::from(nrows));
    for _ in 0..nrows {
        let y = usize::from(r.u16()?);
        let ncols = r.u16()?;
        let mut cols = Vec::with_capacity(usize::from(ncols));
        for _ in 0..ncols {
            let x = usize::from(r.u16()?);
            let w = usize::from(r.u16()?);
            let data = r.bytes(w * mode.bytes_per_pixel())?.to_vec();
            cols.push(DirtyCol { x, w, data });
        }
        rows.push(DirtyRow { y, cols });
    }
    Ok(Dirty::from_parts(mode, (x1, y1, x2, y2), rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_image_keeps_mask_color() {
        let mut image = Image::new(ColorMode::Grayscale, 3, 2);
        image.put_pixel(2, 1, 0x1234).unwrap();
        image.set_mask_color(7);
        let id = ObjectId::new(11).unwrap();

        let mut w = ByteWriter::new();
        write_image(&mut w, Some((id, &image))).unwrap();
        assert_eq!(w.len(), 4 + 1 + 2 + 2 + 4 + 12);
        let bytes = w.into_bytes();

        let mut r = ByteReader::new(&bytes);
        let (got_id, got) = read_image(&mut r).unwrap().unwrap();
        assert_eq!(got_id, id);
        assert_eq!(got, image);
        assert!(r.finish().is_ok());
    }

    #[test]
    fn empty_slot_is_a_zero_id() {
        let mut w = ByteWriter::new();
        write_image(&mut w, None).unwrap();
        let bytes = w.into_bytes();
        assert_eq!(bytes, vec![0, 0, 0, 0]);
        assert_eq!(read_image(&mut ByteReader::new(&bytes)), Ok(None));
    }

    #[test]
    fn oversized_image_is_rejected() {
        let image = Image::new(ColorMode::Indexed, 70_000, 1);
        let mut w = ByteWriter::new();
        let err = write_image(&mut w, Some((ObjectId::new(1).unwrap(), &image))).unwrap_err();
        assert!(matches!(
            err,
            crate::error::JournalError::Codec(CodecError::FieldOverflow { .. })
        ));
    }

    #[test]
    fn dirty_layout_matches_runs() {
        let mut dirty = Dirty::new(ColorMode::Rgb, 0, 0, 0, 0);
        dirty.add_run(1, 2, 2);
        dirty.add_run(4, 0, 1);

        let mut w = ByteWriter::new();
        write_dirty(&mut w, &dirty).unwrap();
        // header 11, two rows of 4, runs 4+8 and 4+4
        assert_eq!(w.len(), 11 + 8 + 12 + 8);
        let bytes = w.into_bytes();
        assert_eq!(read_dirty(&mut ByteReader::new(&bytes)), Ok(dirty));
    }

    #[test]
    fn unknown_mode_tag_fails() {
        let mut r = ByteReader::new(&[9]);
        assert_eq!(read_mode(&mut r), Err(CodecError::UnknownColorMode(9)));
    }
}
