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

//! One charset pair's conversion context.
//!
//! A [`Conversion`] binds a `(from, to)` charset pair to the strategy that
//! serves it: a verified copy for identical charsets, the internal Unicode
//! codecs for UTF-8 ⇄ UTF-16BE, an external [`CharsetConverter`] for
//! everything else, or the ASCII-preserving best-effort fallback when no
//! service path exists and the caller asked not to fail. The strategy is
//! chosen once at creation; `transcode` then runs it per call, reusing one
//! scratch buffer across calls.

use crate::buffer::ByteBuffer;
use crate::charset::{self, CharsetConverter, CharsetService, StepStatus};
use crate::codec::{decode_cesu8, decode_utf16be, encode_utf16be, encode_utf8};
use crate::error::Result;
use crate::normalize::normalize_nfc;
use crate::Fidelity;

bitflags! {
    /// Behavior flags derived from the charset pair at creation time.
    pub struct ConvFlags: u32 {
        /// Substitute placeholders for unconvertible input instead of
        /// failing; also permits degrading to the fallback strategy when no
        /// service path exists.
        const BEST_EFFORT   = 0b0000_0001;
        /// A UTF-8 stage exists in the pipeline and is brought to NFC
        /// before leaving it.
        const NORMALIZE_NFC = 0b0000_0010;
        /// Source text is UTF-16BE; units are two bytes wide.
        const UTF16_SOURCE  = 0b0000_0100;
        /// Target text is UTF-16BE; placeholders are wide units.
        const UTF16_TARGET  = 0b0000_1000;
        /// Target is UTF-8; placeholders are the encoded replacement
        /// character rather than `?`.
        const TO_UTF8       = 0b0001_0000;
        /// Source and target are the same charset; conversion is a copy
        /// (still repaired and normalized for UTF-8).
        const IDENTITY      = 0b0010_0000;
    }
}

/// The strategy serving one charset pair.
enum Engine {
    /// Byte-for-byte copy between identical non-UTF-8 charsets.
    Copy,
    /// UTF-8 to UTF-8: repairs CESU-8 surrogate pairs and invalid sequences
    /// and normalizes, rather than trusting the input blindly.
    CopyUtf8,
    Utf8ToUtf16,
    Utf16ToUtf8,
    /// External service directly serves the pair.
    Service(Box<dyn CharsetConverter>),
    /// Service converts `from` to UTF-8; the UTF-16BE target is reached
    /// through the internal encoder.
    ServiceToUtf16(Box<dyn CharsetConverter>),
    /// The UTF-16BE source decodes internally to UTF-8; the service carries
    /// it to `to`.
    Utf16ToService(Box<dyn CharsetConverter>),
    /// No service path: ASCII copies through, everything else becomes a
    /// placeholder.
    BestEffort,
}

/// A conversion context for one `(from, to)` charset pair.
pub struct Conversion {
    from: String,
    to: String,
    flags: ConvFlags,
    engine: Engine,
    scratch: ByteBuffer,
}

impl Conversion {
    /// Builds the context for `from` → `to`, selecting a strategy.
    ///
    /// A failure to open a service handle is a hard error unless the pair
    /// reduces to the identity or internal Unicode path, or `best_effort`
    /// allows degrading to the fallback.
    pub fn new(
        service: &dyn CharsetService,
        from: &str,
        to: &str,
        best_effort: bool,
    ) -> Result<Conversion> {
        let utf8_from = charset::is_utf8(from);
        let utf8_to = charset::is_utf8(to);
        let utf16_from = charset::is_utf16be(from);
        let utf16_to = charset::is_utf16be(to);
        let same = from.eq_ignore_ascii_case(to) || charset::same_encoding(from, to);

        let mut flags = ConvFlags::empty();
        if best_effort {
            flags |= ConvFlags::BEST_EFFORT;
        }
        if utf16_from {
            flags |= ConvFlags::UTF16_SOURCE;
        }
        if utf16_to {
            flags |= ConvFlags::UTF16_TARGET;
        }
        if utf8_to {
            flags |= ConvFlags::TO_UTF8;
        }
        if same {
            flags |= ConvFlags::IDENTITY;
        }
        // Normalize wherever the pipeline carries UTF-8 text: a UTF-8 source
        // before it leaves, or UTF-8 produced from a UTF-16 source.
        if utf8_from || (utf16_from && utf8_to) {
            flags |= ConvFlags::NORMALIZE_NFC;
        }

        let engine = if same {
            if utf8_from {
                Engine::CopyUtf8
            } else {
                Engine::Copy
            }
        } else if utf8_from && utf16_to {
            Engine::Utf8ToUtf16
        } else if utf16_from && utf8_to {
            Engine::Utf16ToUtf8
        } else {
            let opened = if utf16_to {
                service.open(from, "UTF-8").map(Engine::ServiceToUtf16)
            } else if utf16_from {
                service.open("UTF-8", to).map(Engine::Utf16ToService)
            } else {
                service.open(from, to).map(Engine::Service)
            };
            match opened {
                Ok(engine) => engine,
                Err(_) if best_effort => Engine::BestEffort,
                Err(e) => return Err(e),
            }
        };

        Ok(Conversion {
            from: from.to_string(),
            to: to.to_string(),
            flags,
            engine,
            scratch: ByteBuffer::new(),
        })
    }

    pub fn from_charset(&self) -> &str {
        &self.from
    }

    pub fn to_charset(&self) -> &str {
        &self.to
    }

    pub fn flags(&self) -> ConvFlags {
        self.flags
    }

    pub fn is_identity(&self) -> bool {
        self.flags.contains(ConvFlags::IDENTITY)
    }

    /// Converts `src` into `dest`, replacing its previous contents.
    ///
    /// [`Fidelity::Lossy`] reports that at least one substitution happened;
    /// the output is still complete and usable. Hard errors are reserved for
    /// allocation failure.
    pub fn transcode(&mut self, dest: &mut ByteBuffer, src: &[u8]) -> Result<Fidelity> {
        dest.clear();
        let Conversion { flags, engine, scratch, .. } = self;
        let flags = *flags;
        let lossy = match engine {
            Engine::Copy => {
                dest.append(src)?;
                false
            }
            Engine::CopyUtf8 => normalize_nfc(dest, src)?.is_lossy(),
            Engine::Utf8ToUtf16 => {
                scratch.clear();
                let mut lossy = normalize_nfc(scratch, src)?.is_lossy();
                lossy |= utf8_to_utf16be(dest, scratch.as_bytes())?;
                lossy
            }
            Engine::Utf16ToUtf8 => {
                scratch.clear();
                let mut lossy = utf16be_to_utf8(scratch, src)?;
                if flags.contains(ConvFlags::NORMALIZE_NFC) {
                    lossy |= normalize_nfc(dest, scratch.as_bytes())?.is_lossy();
                } else {
                    dest.append(scratch.as_bytes())?;
                }
                lossy
            }
            Engine::Service(conv) => {
                let mut lossy = false;
                let input: &[u8] = if flags.contains(ConvFlags::NORMALIZE_NFC) {
                    scratch.clear();
                    lossy = normalize_nfc(scratch, src)?.is_lossy();
                    scratch.as_bytes()
                } else {
                    src
                };
                lossy | run_service(conv.as_mut(), flags, input, dest)?
            }
            Engine::ServiceToUtf16(conv) => {
                // Pivot through UTF-8, then encode wide.
                scratch.clear();
                let mut lossy =
                    run_service(conv.as_mut(), ConvFlags::TO_UTF8, src, scratch)?;
                lossy |= utf8_to_utf16be(dest, scratch.as_bytes())?;
                lossy
            }
            Engine::Utf16ToService(conv) => {
                scratch.clear();
                let mut lossy = utf16be_to_utf8(scratch, src)?;
                lossy |= run_service(conv.as_mut(), flags, scratch.as_bytes(), dest)?;
                lossy
            }
            Engine::BestEffort => best_effort_copy(flags, src, dest)?,
        };
        Ok(if lossy { Fidelity::Lossy } else { Fidelity::Exact })
    }
}

/// Appends the placeholder appropriate for the target charset.
fn put_placeholder(flags: ConvFlags, dest: &mut ByteBuffer) -> Result<()> {
    if flags.contains(ConvFlags::UTF16_TARGET) {
        dest.append(&[0xFF, 0xFD])
    } else if flags.contains(ConvFlags::TO_UTF8) {
        dest.append(&[0xEF, 0xBF, 0xBD])
    } else {
        dest.push(b'?')
    }
}

/// Drives a service handle over `input`, substituting for every illegal
/// sequence it reports and retrying with more room when it runs out.
fn run_service(
    conv: &mut dyn CharsetConverter,
    flags: ConvFlags,
    input: &[u8],
    dest: &mut ByteBuffer,
) -> Result<bool> {
    let mut rest = input;
    let mut lossy = false;
    while !rest.is_empty() {
        let step = conv.convert(rest, dest)?;
        match step.status {
            StepStatus::Complete { lossy: l } => {
                lossy |= l;
                break;
            }
            StepStatus::IllegalSequence { skip } => {
                put_placeholder(flags, dest)?;
                lossy = true;
                let advance = step.consumed + skip.max(1);
                rest = &rest[advance.min(rest.len())..];
            }
            StepStatus::OutputFull => {
                dest.ensure((dest.capacity() * 2).max(64))?;
                rest = &rest[step.consumed.min(rest.len())..];
            }
        }
    }
    Ok(lossy)
}

fn utf8_to_utf16be(dest: &mut ByteBuffer, src: &[u8]) -> Result<bool> {
    let mut lossy = false;
    let mut buf = [0u8; 4];
    let mut pos = 0;
    while pos < src.len() {
        let d = decode_cesu8(&src[pos..]);
        if d.consumed == 0 {
            break;
        }
        lossy |= d.replaced;
        let n = encode_utf16be(d.codepoint, &mut buf);
        dest.append(&buf[..n])?;
        pos += d.consumed;
    }
    Ok(lossy)
}

fn utf16be_to_utf8(dest: &mut ByteBuffer, src: &[u8]) -> Result<bool> {
    let mut lossy = false;
    let mut buf = [0u8; 4];
    let mut pos = 0;
    while pos + 1 < src.len() {
        let d = decode_utf16be(&src[pos..]);
        if d.consumed == 0 {
            break;
        }
        lossy |= d.replaced;
        let n = encode_utf8(d.codepoint, &mut buf);
        dest.append(&buf[..n])?;
        pos += d.consumed;
    }
    Ok(lossy)
}

/// The no-service fallback: ASCII survives, everything else becomes a
/// placeholder.
fn best_effort_copy(flags: ConvFlags, src: &[u8], dest: &mut ByteBuffer) -> Result<bool> {
    let mut lossy = false;
    if flags.contains(ConvFlags::UTF16_SOURCE) {
        let mut pos = 0;
        while pos + 1 < src.len() {
            let unit = u16::from_be_bytes([src[pos], src[pos + 1]]);
            pos += 2;
            if unit == 0 {
                break;
            }
            if unit < 0x80 {
                dest.push(unit as u8)?;
            } else {
                put_placeholder(flags, dest)?;
                lossy = true;
            }
        }
        return Ok(lossy);
    }
    for &b in src {
        if b < 0x80 {
            if flags.contains(ConvFlags::UTF16_TARGET) {
                dest.append(&[0, b])?;
            } else {
                dest.push(b)?;
            }
        } else {
            put_placeholder(flags, dest)?;
            lossy = true;
        }
    }
    Ok(lossy)
}
