#![forbid(unsafe_code)]

//! Closed set of document object kinds stored in the registry.

use std::fmt;

use crate::fields::FieldBlock;
use crate::image::Image;
use crate::layer::{Cel, Layer};
use crate::palette::Palette;
use crate::sprite::{Document, Sprite};
use crate::stock::Stock;

/// Concrete kind of a registered object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Image,
    Stock,
    Cel,
    Layer,
    Palette,
    Sprite,
    Document,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Image => "image",
            Self::Stock => "stock",
            Self::Cel => "cel",
            Self::Layer => "layer",
            Self::Palette => "palette",
            Self::Sprite => "sprite",
            Self::Document => "document",
        };
        f.write_str(name)
    }
}

/// A document object owned by the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Object {
    Image(Image),
    Stock(Stock),
    Cel(Cel),
    Layer(Layer),
    Palette(Palette),
    Sprite(Sprite),
    Document(Document),
}

impl Object {
    #[must_use]
    pub fn kind(&self) -> ObjectKind {
        match self {
            Self::Image(_) => ObjectKind::Image,
            Self::Stock(_) => ObjectKind::Stock,
            Self::Cel(_) => ObjectKind::Cel,
            Self::Layer(_) => ObjectKind::Layer,
            Self::Palette(_) => ObjectKind::Palette,
            Self::Sprite(_) => ObjectKind::Sprite,
            Self::Document(_) => ObjectKind::Document,
        }
    }

    /// Patchable scalar fields, for kinds that expose them.
    #[must_use]
    pub fn field_block(&self) -> Option<&dyn FieldBlock> {
        match self {
            Self::Image(v) => Some(v),
            Self::Cel(v) => Some(v),
            Self::Layer(v) => Some(v),
            Self::Sprite(v) => Some(v),
            Self::Stock(_) | Self::Palette(_) | Self::Document(_) => None,
        }
    }

    pub fn field_block_mut(&mut self) -> Option<&mut dyn FieldBlock> {
        match self {
            Self::Image(v) => Some(v),
            Self::Cel(v) => Some(v),
            Self::Layer(v) => Some(v),
            Self::Sprite(v) => Some(v),
            Self::Stock(_) | Self::Palette(_) | Self::Document(_) => None,
        }
    }
}

/// Typed view of one [`Object`] variant.
pub trait Kinded: Sized + Into<Object> {
    const KIND: ObjectKind;

    fn from_object(object: &Object) -> Option<&Self>;

    fn from_object_mut(object: &mut Object) -> Option<&mut Self>;
}

macro_rules! impl_kinded {
    ($($variant:ident),* $(,)?) => {
        $(
            impl From<$variant> for Object {
                fn from(value: $variant) -> Self {
                    Self::$variant(value)
                }
            }

            impl Kinded for $variant {
                const KIND: ObjectKind = ObjectKind::$variant;

                fn from_object(object: &Object) -> Option<&Self> {
                    match object {
                        Object::$variant(v) => Some(v),
                        _ => None,
                    }
                }

                fn from_object_mut(object: &mut Object) -> Option<&mut Self> {
                    match object {
                        Object::$variant(v) => Some(v),
                        _ => None,
                    }
                }
            }
        )*
    };
}

impl_kinded!(Image, Stock, Cel, Layer, Palette, Sprite, Document);
