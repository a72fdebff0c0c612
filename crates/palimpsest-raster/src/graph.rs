#![forbid(unsafe_code)]

//! Structural edits across related objects.
//!
//! Sprites, layers, cels, stocks and palettes refer to each other by id.
//! These helpers keep both ends of every link consistent and release
//! owned objects when their owner goes away.

use crate::error::{RasterError, Result};
use crate::id::ObjectId;
use crate::image::{ColorMode, Image};
use crate::layer::{Cel, Layer};
use crate::object::Object;
use crate::palette::Palette;
use crate::registry::Registry;
use crate::sprite::{Document, Sprite};
use crate::stock::Stock;

/// Colors in a freshly created sprite's first palette.
pub const DEFAULT_PALETTE_SIZE: usize = 256;

impl Registry {
    // ========================================================================
    // Creation
    // ========================================================================

    /// Create a sprite with an empty stock, a root folder and a frame-0
    /// palette.
    pub fn create_sprite(&mut self, mode: ColorMode, width: u32, height: u32) -> ObjectId {
        let sprite = self.reserve();
        let stock = self.bind(Stock::new());
        let root = self.bind(Layer::new_folder(sprite, "root"));
        let palette = self.bind(Palette::new(0, DEFAULT_PALETTE_SIZE));
        let mut value = Sprite::new(mode, width, height, root, stock);
        value.palettes_mut().push(palette);
        self.rebind(sprite, value);
        sprite
    }

    pub fn create_document(&mut self, sprite: ObjectId) -> Result<ObjectId> {
        self.resolve_typed::<Sprite>(sprite)?;
        Ok(self.bind(Document::new(sprite)))
    }

    // ========================================================================
    // Layer tree
    // ========================================================================

    /// Bind `layer` and put it on top of `folder`.
    pub fn add_layer(&mut self, folder: ObjectId, layer: Layer) -> Result<ObjectId> {
        self.folder(folder)?;
        let id = self.bind(layer);
        let top = self.folder(folder)?.children().last().copied();
        self.attach_layer(folder, id, top)?;
        Ok(id)
    }

    /// Insert `layer` into `folder` right above `after`.
    ///
    /// With `after` unset, or not a child of `folder`, the layer goes to the
    /// bottom of the folder.
    pub fn attach_layer(
        &mut self,
        folder: ObjectId,
        layer: ObjectId,
        after: Option<ObjectId>,
    ) -> Result<()> {
        self.resolve_typed::<Layer>(layer)?;
        let children = self
            .resolve_typed_mut::<Layer>(folder)?
            .children_mut()
            .ok_or(RasterError::NotAFolder(folder))?;
        let index = after
            .and_then(|a| children.iter().position(|&c| c == a))
            .map_or(0, |pos| pos + 1);
        children.insert(index, layer);
        self.resolve_typed_mut::<Layer>(layer)?
            .set_parent(Some(folder));
        Ok(())
    }

    /// Unlink `layer` from `folder` without releasing it.
    pub fn detach_layer(&mut self, folder: ObjectId, layer: ObjectId) -> Result<()> {
        let children = self
            .resolve_typed_mut::<Layer>(folder)?
            .children_mut()
            .ok_or(RasterError::NotAFolder(folder))?;
        let pos = children
            .iter()
            .position(|&c| c == layer)
            .ok_or(RasterError::NotAChild { layer, folder })?;
        children.remove(pos);
        if let Ok(child) = self.resolve_typed_mut::<Layer>(layer) {
            child.set_parent(None);
        }
        Ok(())
    }

    /// Move a child of `folder` right above `after`.
    pub fn move_layer(
        &mut self,
        folder: ObjectId,
        layer: ObjectId,
        after: Option<ObjectId>,
    ) -> Result<()> {
        self.detach_layer(folder, layer)?;
        self.attach_layer(folder, layer, after)
    }

    /// Sibling directly below `layer` in its folder.
    #[must_use]
    pub fn prev_sibling(&self, layer: ObjectId) -> Option<ObjectId> {
        let parent = self.resolve_typed::<Layer>(layer).ok()?.parent()?;
        let children = self.resolve_typed::<Layer>(parent).ok()?.children();
        let pos = children.iter().position(|&c| c == layer)?;
        pos.checked_sub(1).map(|p| children[p])
    }

    /// Detach `layer` if attached, then release it with everything it owns:
    /// child layers, cels and the stock images the cels point at.
    pub fn destroy_layer(&mut self, layer: ObjectId) -> Result<()> {
        let node = self.resolve_typed::<Layer>(layer)?;
        let parent = node.parent();
        let sprite = node.sprite();
        if let Some(parent) = parent {
            self.detach_layer(parent, layer)?;
        }
        self.release_subtree(sprite, layer);
        Ok(())
    }

    fn release_subtree(&mut self, sprite: ObjectId, layer: ObjectId) {
        let Some(Object::Layer(node)) = self.release(layer) else {
            return;
        };
        for &child in node.children() {
            self.release_subtree(sprite, child);
        }
        let stock = self
            .resolve_typed::<Sprite>(sprite)
            .map(Sprite::stock)
            .ok();
        for &cel in node.cels() {
            let Some(Object::Cel(cel)) = self.release(cel) else {
                continue;
            };
            let image = stock.and_then(|stock| {
                self.resolve_typed_mut::<Stock>(stock)
                    .ok()?
                    .remove_image(usize::from(cel.image))
            });
            if let Some(image) = image {
                self.release(image);
            }
        }
    }

    /// Image layers of a sprite in depth-first, bottom-to-top order.
    pub fn image_layers(&self, sprite: ObjectId) -> Result<Vec<ObjectId>> {
        let root = self.resolve_typed::<Sprite>(sprite)?.root();
        let mut out = Vec::new();
        self.collect_image_layers(root, &mut out)?;
        Ok(out)
    }

    fn collect_image_layers(&self, layer: ObjectId, out: &mut Vec<ObjectId>) -> Result<()> {
        let node = self.resolve_typed::<Layer>(layer)?;
        if node.is_folder() {
            for &child in node.children() {
                self.collect_image_layers(child, out)?;
            }
        } else {
            out.push(layer);
        }
        Ok(())
    }

    fn folder(&self, folder: ObjectId) -> Result<&Layer> {
        let node = self.resolve_typed::<Layer>(folder)?;
        if node.is_folder() {
            Ok(node)
        } else {
            Err(RasterError::NotAFolder(folder))
        }
    }

    // ========================================================================
    // Cels
    // ========================================================================

    /// Bind `cel` and attach it to an image layer.
    pub fn add_cel(&mut self, layer: ObjectId, cel: Cel) -> Result<ObjectId> {
        self.image_layer_cels(layer)?;
        let id = self.bind(cel);
        self.attach_cel(layer, id)?;
        Ok(id)
    }

    pub fn attach_cel(&mut self, layer: ObjectId, cel: ObjectId) -> Result<()> {
        self.resolve_typed::<Cel>(cel)?;
        self.image_layer_cels(layer)?.push(cel);
        Ok(())
    }

    /// Unlink `cel` from `layer` without releasing it.
    pub fn remove_cel(&mut self, layer: ObjectId, cel: ObjectId) -> Result<()> {
        let cels = self.image_layer_cels(layer)?;
        if let Some(pos) = cels.iter().position(|&c| c == cel) {
            cels.remove(pos);
        }
        Ok(())
    }

    /// Cel of `layer` placed on `frame`.
    #[must_use]
    pub fn cel_at(&self, layer: ObjectId, frame: u16) -> Option<ObjectId> {
        let node = self.resolve_typed::<Layer>(layer).ok()?;
        node.cels().iter().copied().find(|&cel| {
            self.resolve_typed::<Cel>(cel)
                .is_ok_and(|c| c.frame == frame)
        })
    }

    fn image_layer_cels(&mut self, layer: ObjectId) -> Result<&mut Vec<ObjectId>> {
        self.resolve_typed_mut::<Layer>(layer)?
            .cels_mut()
            .ok_or(RasterError::NotAnImageLayer(layer))
    }

    // ========================================================================
    // Palettes
    // ========================================================================

    /// Palette in effect on `frame`: the one with the latest start frame
    /// not after it.
    #[must_use]
    pub fn palette_for(&self, sprite: ObjectId, frame: u32) -> Option<ObjectId> {
        let sprite = self.resolve_typed::<Sprite>(sprite).ok()?;
        sprite
            .palettes()
            .iter()
            .copied()
            .filter(|&p| {
                self.resolve_typed::<Palette>(p)
                    .is_ok_and(|pal| pal.frame() <= frame)
            })
            .last()
    }

    /// Add a bound palette to the sprite's list, keeping it ordered by start
    /// frame. A palette already starting on the same frame is released.
    pub fn insert_palette(&mut self, sprite: ObjectId, palette: ObjectId) -> Result<()> {
        let frame = self.resolve_typed::<Palette>(palette)?.frame();
        let frames: Vec<u32> = self
            .resolve_typed::<Sprite>(sprite)?
            .palettes()
            .iter()
            .map(|&p| self.resolve_typed::<Palette>(p).map_or(u32::MAX, Palette::frame))
            .collect();

        let list = self.resolve_typed_mut::<Sprite>(sprite)?.palettes_mut();
        let replaced = match frames.iter().position(|&f| f == frame) {
            Some(pos) => Some(std::mem::replace(&mut list[pos], palette)),
            None => {
                let pos = frames.partition_point(|&f| f < frame);
                list.insert(pos, palette);
                None
            }
        };
        if let Some(old) = replaced.filter(|&old| old != palette) {
            self.release(old);
        }
        Ok(())
    }

    /// Unlink a palette from the sprite's list without releasing it.
    pub fn delete_palette(&mut self, sprite: ObjectId, palette: ObjectId) -> Result<()> {
        let list = self.resolve_typed_mut::<Sprite>(sprite)?.palettes_mut();
        list.retain(|&p| p != palette);
        Ok(())
    }

    // ========================================================================
    // Pixels
    // ========================================================================

    /// Apply a color index mapping to every cel image on frames
    /// `from..=to`. Only indexed sprites can be remapped.
    pub fn remap_images(
        &mut self,
        sprite: ObjectId,
        from: u32,
        to: u32,
        mapping: &[u8; 256],
    ) -> Result<()> {
        let (mode, stock) = {
            let s = self.resolve_typed::<Sprite>(sprite)?;
            (s.mode(), s.stock())
        };
        if mode != ColorMode::Indexed {
            return Err(RasterError::ModeMismatch {
                expected: ColorMode::Indexed,
                actual: mode,
            });
        }

        let mut images = Vec::new();
        for layer in self.image_layers(sprite)? {
            for &cel in self.resolve_typed::<Layer>(layer)?.cels() {
                let cel = self.resolve_typed::<Cel>(cel)?;
                if (from..=to).contains(&u32::from(cel.frame)) {
                    let slot = usize::from(cel.image);
                    if let Some(image) = self.resolve_typed::<Stock>(stock)?.image_at(slot) {
                        images.push(image);
                    }
                }
            }
        }
        images.sort_unstable();
        images.dedup();
        for image in images {
            self.resolve_typed_mut::<Image>(image)?.remap(mapping)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sprite_with_layers() -> (Registry, ObjectId, ObjectId, ObjectId, ObjectId) {
        let mut reg = Registry::new();
        let sprite = reg.create_sprite(ColorMode::Indexed, 8, 8);
        let root = reg.resolve_typed::<Sprite>(sprite).unwrap().root();
        let a = reg.add_layer(root, Layer::new_image(sprite, "a")).unwrap();
        let b = reg.add_layer(root, Layer::new_image(sprite, "b")).unwrap();
        (reg, sprite, root, a, b)
    }

    #[test]
    fn create_sprite_binds_owned_parts() {
        let mut reg = Registry::new();
        let sprite = reg.create_sprite(ColorMode::Rgb, 4, 4);
        let s = reg.resolve_typed::<Sprite>(sprite).unwrap();
        assert!(reg.resolve_typed::<Layer>(s.root()).unwrap().is_folder());
        assert!(reg.resolve_typed::<Stock>(s.stock()).is_ok());
        assert_eq!(s.palettes().len(), 1);
        assert_eq!(reg.len(), 4);
    }

    #[test]
    fn add_layer_stacks_on_top() {
        let (reg, _, root, a, b) = sprite_with_layers();
        let folder = reg.resolve_typed::<Layer>(root).unwrap();
        assert_eq!(folder.children(), &[a, b]);
        assert_eq!(reg.prev_sibling(b), Some(a));
        assert_eq!(reg.prev_sibling(a), None);
        assert_eq!(reg.resolve_typed::<Layer>(a).unwrap().parent(), Some(root));
    }

    #[test]
    fn attach_falls_back_to_bottom() {
        let (mut reg, sprite, root, a, b) = sprite_with_layers();
        let c = reg.bind(Layer::new_image(sprite, "c"));
        let ghost = ObjectId::new(999).unwrap();
        reg.attach_layer(root, c, Some(ghost)).unwrap();
        let folder = reg.resolve_typed::<Layer>(root).unwrap();
        assert_eq!(folder.children(), &[c, a, b]);
    }

    #[test]
    fn move_layer_reorders() {
        let (mut reg, _, root, a, b) = sprite_with_layers();
        reg.move_layer(root, a, Some(b)).unwrap();
        let folder = reg.resolve_typed::<Layer>(root).unwrap();
        assert_eq!(folder.children(), &[b, a]);
    }

    #[test]
    fn detach_rejects_strangers() {
        let (mut reg, sprite, root, _, _) = sprite_with_layers();
        let loose = reg.bind(Layer::new_image(sprite, "loose"));
        assert_eq!(
            reg.detach_layer(root, loose),
            Err(RasterError::NotAChild {
                layer: loose,
                folder: root
            })
        );
    }

    #[test]
    fn destroy_layer_releases_cels_and_images() {
        let (mut reg, sprite, root, a, _) = sprite_with_layers();
        let stock = reg.resolve_typed::<Sprite>(sprite).unwrap().stock();
        let image = reg.bind(Image::new(ColorMode::Indexed, 2, 2));
        let slot = reg.resolve_typed_mut::<Stock>(stock).unwrap().add_image(image);
        let cel = reg.add_cel(a, Cel::new(0, slot as u16)).unwrap();

        reg.destroy_layer(a).unwrap();
        assert!(!reg.contains(a));
        assert!(!reg.contains(cel));
        assert!(!reg.contains(image));
        assert_eq!(reg.resolve_typed::<Stock>(stock).unwrap().image_at(slot), None);
        assert_eq!(reg.resolve_typed::<Layer>(root).unwrap().children().len(), 1);
    }

    #[test]
    fn cel_at_finds_frame() {
        let (mut reg, _, _, a, _) = sprite_with_layers();
        let c0 = reg.add_cel(a, Cel::new(0, 0)).unwrap();
        let c2 = reg.add_cel(a, Cel::new(2, 1)).unwrap();
        assert_eq!(reg.cel_at(a, 2), Some(c2));
        assert_eq!(reg.cel_at(a, 0), Some(c0));
        assert_eq!(reg.cel_at(a, 1), None);
        reg.remove_cel(a, c2).unwrap();
        assert_eq!(reg.cel_at(a, 2), None);
    }

    #[test]
    fn palettes_stay_ordered_and_replace_same_frame() {
        let (mut reg, sprite, ..) = sprite_with_layers();
        let p5 = reg.bind(Palette::new(5, 4));
        let p2 = reg.bind(Palette::new(2, 4));
        reg.insert_palette(sprite, p5).unwrap();
        reg.insert_palette(sprite, p2).unwrap();
        assert_eq!(reg.palette_for(sprite, 3), Some(p2));
        assert_eq!(reg.palette_for(sprite, 9), Some(p5));

        let p2b = reg.bind(Palette::new(2, 8));
        reg.insert_palette(sprite, p2b).unwrap();
        assert!(!reg.contains(p2));
        assert_eq!(reg.palette_for(sprite, 2), Some(p2b));
        assert_eq!(reg.resolve_typed::<Sprite>(sprite).unwrap().palettes().len(), 3);

        reg.delete_palette(sprite, p5).unwrap();
        assert_eq!(reg.palette_for(sprite, 9), Some(p2b));
        assert!(reg.contains(p5));
    }

    #[test]
    fn remap_touches_frames_in_range() {
        let (mut reg, sprite, _, a, _) = sprite_with_layers();
        let stock = reg.resolve_typed::<Sprite>(sprite).unwrap().stock();
        let mut img0 = Image::new(ColorMode::Indexed, 1, 1);
        img0.fill(1);
        let img1 = img0.clone();
        let i0 = reg.bind(img0);
        let i1 = reg.bind(img1);
        let s0 = reg.resolve_typed_mut::<Stock>(stock).unwrap().add_image(i0);
        let s1 = reg.resolve_typed_mut::<Stock>(stock).unwrap().add_image(i1);
        reg.add_cel(a, Cel::new(0, s0 as u16)).unwrap();
        reg.add_cel(a, Cel::new(3, s1 as u16)).unwrap();

        let mut mapping = [0u8; 256];
        for (i, m) in mapping.iter_mut().enumerate() {
            *m = i as u8;
        }
        mapping[1] = 7;
        reg.remap_images(sprite, 0, 1, &mapping).unwrap();
        assert_eq!(reg.resolve_typed::<Image>(i0).unwrap().get_pixel(0, 0), Some(7));
        assert_eq!(reg.resolve_typed::<Image>(i1).unwrap().get_pixel(0, 0), Some(1));
    }

    #[test]
    fn remap_requires_indexed_sprite() {
        let mut reg = Registry::new();
        let sprite = reg.create_sprite(ColorMode::Rgb, 1, 1);
        assert!(matches!(
            reg.remap_images(sprite, 0, 0, &[0; 256]),
            Err(RasterError::ModeMismatch { .. })
        ));
    }
}
