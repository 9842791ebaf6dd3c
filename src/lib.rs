//! TN3270R: a TN3270 terminal client core
//!
//! The crate drives IBM 3270 host applications over Telnet. It decodes the
//! host's 3270 data stream into a 24x80 screen buffer, negotiates the Telnet
//! options TN3270 needs, and lets callers type into fields and send attention
//! keys while blocking until the host reply has arrived.
//!
//! ```rust,no_run
//! use tn3270r::{Session, SessionConfig};
//!
//! let mut session = Session::new(SessionConfig::default());
//! session.connect("mainframe.example.com", 23)?;
//! let screen = session.screen()?;
//! // Typed text reaches the host only from inside an unprotected field
//! screen.home()?;
//! screen.put_string("LOGON APPLID(CICS)")?;
//! screen.enter()?;
//! println!("{}", screen.screen_text()?);
//! # Ok::<(), tn3270r::TN3270Error>(())
//! ```

/// PROTOCOL COMMON: EBCDIC code page and Telnet wire constants
pub mod protocol_common;

/// LIB3270: screen buffer, data stream decoder and sender façade
pub mod lib3270;

pub mod config;
pub mod error;
pub mod session;
pub mod telnet_negotiation;

pub use config::SessionConfig;
pub use error::{Result, TN3270Error};
pub use lib3270::{Display3270, ProtocolProcessor3270, Screen};
pub use session::Session;
pub use telnet_negotiation::TelnetNegotiator;
