#![forbid(unsafe_code)]

//! Recursive layer tree encoding.
//!
//! A removed layer is stored whole: its scalar fields, and either every cel
//! with the stock image behind it (image layers) or every child layer
//! (folders). Decoding builds a detached [`RawLayer`] first, so a malformed
//! payload is rejected before anything is rebound.

use palimpsest_raster::{
    Cel, Image, Layer, LayerContent, LayerType, ObjectId, Registry, Sprite, Stock,
};

use super::raster::{read_cel, read_image, write_cel, write_image};
use super::{ByteReader, ByteWriter};
use crate::error::{CodecError, Result};

/// A decoded layer subtree, not yet bound to the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RawLayer {
    id: ObjectId,
    name: String,
    flags: u8,
    sprite: ObjectId,
    content: RawContent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum RawContent {
    Image(Vec<RawCel>),
    Folder(Vec<RawLayer>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct RawCel {
    id: ObjectId,
    cel: Cel,
    image: Option<(ObjectId, Image)>,
}

pub(crate) fn write_layer(w: &mut ByteWriter, reg: &Registry, id: ObjectId) -> Result<()> {
    let layer = reg.resolve_typed::<Layer>(id)?;
    w.put_id(Some(id));
    w.put_u16_from(layer.name().len(), "layer name length")?
        .put_bytes(layer.name().as_bytes())
        .put_u8(layer.flags())
        .put_u16(layer.layer_type().tag())
        .put_id(Some(layer.sprite()));

    match layer.content() {
        LayerContent::Image { cels } => {
            let stock = reg.resolve_typed::<Sprite>(layer.sprite())?.stock();
            let stock = reg.resolve_typed::<Stock>(stock)?;
            w.put_u16_from(cels.len(), "cel count")?;
            for &cel_id in cels {
                let cel = reg.resolve_typed::<Cel>(cel_id)?;
                write_cel(w, cel_id, cel);
                match stock.image_at(usize::from(cel.image)) {
                    Some(image_id) => {
                        let image = reg.resolve_typed::<Image>(image_id)?;
                        w.put_u8(1);
                        write_image(w, Some((image_id, image)))?;
                    }
                    None => {
                        w.put_u8(0);
                    }
                }
            }
        }
        LayerContent::Folder { children } => {
            w.put_u16_from(children.len(), "child count")?;
            for &child in children {
                write_layer(w, reg, child)?;
            }
        }
    }
    Ok(())
}

pub(crate) fn read_layer(r: &mut ByteReader<'_>) -> Result<RawLayer> {
    let id = r.required_id("layer")?;
    let name_len = usize::from(r.u16()?);
    let name = std::str::from_utf8(r.bytes(name_len)?)
        .map_err(|_| CodecError::InvalidUtf8)?
        .to_owned();
    let flags = r.u8()?;
    let tag = r.u16()?;
    let kind = LayerType::from_tag(tag).ok_or(CodecError::UnknownLayerType(tag))?;
    let sprite = r.required_id("layer sprite")?;

    let content = match kind {
        LayerType::Image => {
            let count = r.u16()?;
            let mut cels = Vec::with_capacity(usize::from(count));
            for _ in 0..count {
                let (id, cel) = read_cel(r)?;
                let image = match r.u8()? {
                    0 => None,
                    _ => read_image(r)?,
                };
                cels.push(RawCel { id, cel, image });
            }
            RawContent::Image(cels)
        }
        LayerType::Folder => {
            let count = r.u16()?;
            let mut children = Vec::with_capacity(usize::from(count));
            for _ in 0..count {
                children.push(read_layer(r)?);
            }
            RawContent::Folder(children)
        }
    };

    Ok(RawLayer {
        id,
        name,
        flags,
        sprite,
        content,
    })
}

impl RawLayer {
    pub(crate) fn sprite(&self) -> ObjectId {
        self.sprite
    }

    /// Rebind the subtree under its recorded ids, putting cel images back
    /// into the sprite's stock. The root of the subtree is left detached.
    pub(crate) fn restore(self, reg: &mut Registry) -> Result<ObjectId> {
        let stock = reg.resolve_typed::<Sprite>(self.sprite)?.stock();
        let mut layer = match self.content {
            RawContent::Image(_) => Layer::new_image(self.sprite, self.name),
            RawContent::Folder(_) => Layer::new_folder(self.sprite, self.name),
        };
        layer.set_flags(self.flags);
        reg.rebind(self.id, layer);

        match self.content {
            RawContent::Image(cels) => {
                for raw in cels {
                    if let Some((image_id, image)) = raw.image {
                        reg.rebind(image_id, image);
                        reg.resolve_typed_mut::<Stock>(stock)?
                            .replace_image(usize::from(raw.cel.image), Some(image_id));
                    }
                    reg.rebind(raw.id, raw.cel);
                    reg.attach_cel(self.id, raw.id)?;
                }
            }
            RawContent::Folder(children) => {
                for child in children {
                    let top = reg.resolve_typed::<Layer>(self.id)?.children().last().copied();
                    let child_id = child.restore(reg)?;
                    reg.attach_layer(self.id, child_id, top)?;
                }
            }
        }
        Ok(self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use palimpsest_raster::ColorMode;

    #[test]
    fn subtree_survives_destroy_and_restore() {
        let mut reg = Registry::new();
        let sprite = reg.create_sprite(ColorMode::Indexed, 4, 4);
        let (root, stock) = {
            let s = reg.resolve_typed::<Sprite>(sprite).unwrap();
            (s.root(), s.stock())
        };
        let folder = reg.add_layer(root, Layer::new_folder(sprite, "group")).unwrap();
        let ink = reg.add_layer(folder, Layer::new_image(sprite, "ink")).unwrap();
        let mut pixels = Image::new(ColorMode::Indexed, 2, 2);
        pixels.fill(5);
        let image = reg.bind(pixels.clone());
        let slot = reg.resolve_typed_mut::<Stock>(stock).unwrap().add_image(image);
        let cel = reg
            .add_cel(ink, Cel::new(0, slot as u16).with_position(-1, 2))
            .unwrap();
        reg.add_cel(ink, Cel::new(1, 40)).unwrap();

        let mut w = ByteWriter::new();
        write_layer(&mut w, &reg, folder).unwrap();
        let bytes = w.into_bytes();

        reg.destroy_layer(folder).unwrap();
        assert!(!reg.contains(image));

        let mut r = ByteReader::new(&bytes);
        let raw = read_layer(&mut r).unwrap();
        r.finish().unwrap();
        assert_eq!(raw.id, folder);
        let restored = raw.restore(&mut reg).unwrap();
        reg.attach_layer(root, restored, None).unwrap();

        let group = reg.resolve_typed::<Layer>(folder).unwrap();
        assert_eq!(group.name(), "group");
        assert_eq!(group.children(), &[ink]);
        let ink_layer = reg.resolve_typed::<Layer>(ink).unwrap();
        assert_eq!(ink_layer.cels().len(), 2);
        assert_eq!(reg.resolve_typed::<Cel>(cel).unwrap().x, -1);
        assert_eq!(reg.resolve_typed::<Image>(image).unwrap(), &pixels);
        assert_eq!(
            reg.resolve_typed::<Stock>(stock).unwrap().image_at(slot),
            Some(image)
        );
    }

    #[test]
    fn unknown_layer_type_is_rejected() {
        let mut w = ByteWriter::new();
        w.put_u32(3).put_u16(0).put_u8(0).put_u16(7).put_u32(1);
        let bytes = w.into_bytes();
        assert_eq!(
            read_layer(&mut ByteReader::new(&bytes)),
            Err(CodecError::UnknownLayerType(7).into())
        );
    }
}
