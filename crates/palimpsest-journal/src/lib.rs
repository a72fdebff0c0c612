#![forbid(unsafe_code)]

//! Linear undo/redo journal for Palimpsest sprite documents.
//!
//! The journal records *how to reverse* each primitive mutation of a
//! document's object graph. Calling code captures the state an edit is
//! about to overwrite, then performs the edit; undo and redo replay the
//! captured records, each replay capturing its own inverse.
//!
//! # Architecture
//!
//! ```text
//!   capture_*()                 undo()                   redo()
//!       │                         │                        │
//!       ▼                         ▼                        ▼
//! ┌────────────┐  invert   ┌────────────┐  invert   ┌────────────┐
//! │ undo       │ ────────► │ redo       │ ────────► │ undo       │
//! │ Stream     │           │ Stream     │           │ Stream     │
//! └────────────┘           └────────────┘           └────────────┘
//!       │ retention: discard oldest whole group from the tail
//!       ▼
//! ```
//!
//! Records never hold references to document objects. They store
//! [`ObjectId`](palimpsest_raster::ObjectId)s and resolve them through the
//! [`Registry`](palimpsest_raster::Registry) when replayed.
//!
//! # Example
//!
//! ```
//! use palimpsest_journal::History;
//! use palimpsest_raster::{ColorMode, Image, Registry};
//!
//! let mut reg = Registry::new();
//! let image = reg.bind(Image::new(ColorMode::Indexed, 8, 8));
//! let mut history = History::default();
//!
//! history.capture_image(&reg, image, 0, 0, 8, 8).unwrap();
//! reg.resolve_typed_mut::<Image>(image).unwrap().fill(3);
//!
//! assert_eq!(history.undo(&mut reg).unwrap().unwrap(), "image");
//! let pixels = reg.resolve_typed::<Image>(image).unwrap();
//! assert_eq!(pixels.get_pixel(4, 4), Some(0));
//! ```
//!
//! # Logging
//!
//! Events are emitted with `tracing` under the `palimpsest.journal` target.
//! No subscriber is installed.

mod codec;
pub mod config;
pub mod error;
pub mod history;
mod kinds;
pub mod record;
pub mod stream;

pub use config::{DEFAULT_BUDGET_BYTES, JournalConfig};
pub use error::{CodecError, JournalError, Result};
pub use history::History;
pub use kinds::palette::inverse_mapping;
pub use record::{RECORD_HEADER_SIZE, Record, RecordKind};
pub use stream::Stream;

/// `tracing` target for every journal event.
pub const TRACE_TARGET: &str = "palimpsest.journal";
