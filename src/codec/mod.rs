//! Binary decoding for the NPS framed-message protocol.
//!
//! The schema interpreter in `cursor` is crate-internal; message types
//! expose ordinary typed structs (see [`nps`]), never generic field maps.

pub(crate) mod cursor;
pub mod nps;

pub use cursor::to_hex;
pub use nps::{parse_nps_message, NpsBody, NpsMessage};
