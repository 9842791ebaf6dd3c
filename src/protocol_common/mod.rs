//! Protocol building blocks shared by the Telnet and 3270 layers
//!
//! - [`ebcdic`] - CP037 code page conversion
//! - [`telnet_base`] - Telnet command and option codes, frame builders
//!
//! ```
//! use tn3270r::protocol_common::ebcdic::{to_display, to_host};
//!
//! assert_eq!(to_display(0xC1), 'A');
//! assert_eq!(to_host('A'), 0xC1);
//! ```

pub mod ebcdic;
pub mod telnet_base;
