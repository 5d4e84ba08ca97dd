/*
    This file is part of multistr.

    multistr is free software: you can redistribute it and/or modify
    it under the terms of the GNU Lesser General Public License as published by
    the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.

    multistr is distributed in the hope that it will be useful,
    but WITHOUT ANY WARRANTY; without even the implied warranty of
    MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
    GNU General Public License for more details.

    You should have received a copy of the GNU Lesser General Public License
    along with multistr. (LICENSE.md)  If not, see <https://www.gnu.org/licenses/>.
*/

//! Lazy multi-encoding strings and best-effort charset conversion.
//!
//! This crate carries one logical string in several charset representations
//! at once, converting between them lazily and never hard-failing on
//! malformed input unless asked to. The pieces, bottom up:
//!
//! * [`SeqBuffer`] — growable, always-terminated unit buffers.
//! * [`codec`] — stateless UTF-8 / CESU-8 / UTF-16BE code point codecs that
//!   substitute U+FFFD for invalid sequences instead of failing.
//! * [`normalize_nfc`] — streaming canonical composition.
//! * [`Conversion`] / [`ConversionRegistry`] — cached per-pair conversion
//!   contexts over pluggable backend services.
//! * [`MultiString`] — the lazy multi-representation string itself.
//!
//! Conversions report [`Fidelity`]: a lossy result means placeholders were
//! substituted but the output is complete and safe to use.

#[macro_use]
extern crate bitflags;

pub mod buffer;
pub mod charset;
pub mod codec;
pub mod convert;
pub mod error;
pub mod mstring;
pub mod normalize;
pub mod registry;

#[cfg(test)]
mod tests;

pub use crate::buffer::{ByteBuffer, SeqBuffer, WideBuffer};
pub use crate::charset::{
    CharsetConverter, CharsetService, EncodingService, Step, StepStatus, UnicodeWideChars,
    WideCharService,
};
pub use crate::codec::{
    decode_cesu8, decode_utf16be, decode_utf8, encode_utf16be, encode_utf8, Decoded,
};
pub use crate::convert::{ConvFlags, Conversion};
pub use crate::error::{Error, Result};
pub use crate::mstring::{Forms, MultiString};
pub use crate::normalize::normalize_nfc;
pub use crate::registry::{ConversionRegistry, Locale};

/// Whether a conversion reproduced its input exactly or substituted
/// placeholders along the way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fidelity {
    Exact,
    Lossy,
}

impl Fidelity {
    pub fn is_lossy(self) -> bool {
        matches!(self, Fidelity::Lossy)
    }

    /// The worse of the two.
    pub fn and(self, other: Fidelity) -> Fidelity {
        if self.is_lossy() || other.is_lossy() {
            Fidelity::Lossy
        } else {
            Fidelity::Exact
        }
    }
}
