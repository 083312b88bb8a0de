//! Wire protocol.
//!
//! # Data Flow
//! ```text
//! socket bytes
//!     → frame.rs (fixed-size, NUL-padded frames)
//!     → command.rs (text → Command)
//!     → session state machine
//!     → response.rs (Response → text)
//!     → frame.rs → socket bytes
//! ```
//!
//! # Design Decisions
//! - Strictly half-duplex: one request frame, then one response frame
//! - Requests and responses use separate fixed frame sizes
//! - Response text is part of the contract, typos included

pub mod command;
pub mod frame;
pub mod response;

pub use command::{Command, ParseError};
pub use frame::{FrameError, FrameReader, REQUEST_FRAME_LEN, RESPONSE_FRAME_LEN};
pub use response::{Response, SHUTDOWN_NOTICE};
