//! Rust implementation of the IBM 3270 data stream (TN3270)
//!
//! # Architecture
//!
//! - [`codes`] - command, order, WCC and AID codes
//! - [`field`] - field attribute byte model
//! - [`display`] - the screen buffer and 12-bit buffer addressing
//! - [`cycle`] - response cycle counters and the completion rules
//! - [`shared`] - the buffer lock and its condition variables
//! - [`protocol`] - record decoder and the reader loop
//! - [`screen`] - typing, field navigation and AID transmission
//!
//! # Example Usage
//!
//! ```rust
//! use tn3270r::lib3270::{Display3270, ProtocolProcessor3270};
//!
//! let mut display = Display3270::new();
//! let processor = ProtocolProcessor3270::new();
//!
//! // Erase/Write, WCC, then "HI"
//! processor.process_record(&[0xF5, 0xC3, 0xC8, 0xC9], &mut display).unwrap();
//! assert_eq!(display.text_at(0, 2), "HI");
//! ```

pub mod codes;
pub mod cycle;
pub mod display;
pub mod field;
pub mod protocol;
pub mod screen;
pub mod shared;

// Re-exports for easy access
pub use codes::{AidKey, CommandCode, OrderCode};
pub use cycle::{CompletionReason, ResponseCycle};
pub use display::{BufferPosition, Display3270};
pub use field::{FieldAttribute, FieldType, Intensity};
pub use protocol::{DataStreamReader, ProtocolProcessor3270};
pub use screen::Screen;
pub use shared::{HostWriter, SharedDisplay};
