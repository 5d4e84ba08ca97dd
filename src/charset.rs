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

//! External conversion collaborators.
//!
//! The conversion core never talks to a charset library directly; it consumes
//! two narrow contracts defined here. [`CharsetService`] opens a converter
//! for a named charset pair and [`CharsetConverter`] transcodes bytes in
//! steps, reporting illegal sequences positionally so the caller can decide
//! what to substitute. [`WideCharService`] is the platform wide/narrow
//! contract for MBS ⇄ WCS.
//!
//! [`EncodingService`] and [`UnicodeWideChars`] are the default
//! implementations, both backed by `encoding_rs`; a platform with its own
//! code-page tables supplies its own implementations instead.

use std::convert::TryFrom;

use encoding_rs::{DecoderResult, Encoder, EncoderResult, Encoding, UTF_16BE, UTF_16LE, UTF_8};

use crate::buffer::{ByteBuffer, WideBuffer};
use crate::codec::{decode_cesu8, encode_utf8, REPLACEMENT};
use crate::error::{Error, Result};
use crate::Fidelity;

/// Outcome of one [`CharsetConverter::convert`] step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    /// All input consumed. `lossy` is set when the backend had to substitute
    /// a placeholder for a target-unrepresentable character.
    Complete { lossy: bool },
    /// An illegal input sequence stopped the step. Everything before it has
    /// been converted and written; `skip` is the width of the sequence in
    /// source units (at least 1).
    IllegalSequence { skip: usize },
    /// The output ran out of room. Never produced by the bundled backends,
    /// which write into growable buffers; fixed-buffer backends may return it
    /// and expect to be called again.
    OutputFull,
}

/// One step of conversion: how much input was consumed and why it stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub consumed: usize,
    pub status: StepStatus,
}

/// Opens converters for named charset pairs.
pub trait CharsetService {
    /// Opens a converter from `from` to `to`.
    ///
    /// `Error::InvalidCharset` when a name is not recognized,
    /// `Error::Unsupported` when both names resolve but the pair cannot be
    /// served. Callers tolerate failure only under best-effort policy.
    fn open(&self, from: &str, to: &str) -> Result<Box<dyn CharsetConverter>>;
}

/// A conversion handle for one charset pair.
pub trait CharsetConverter {
    /// Converts a prefix of `input`, appending to `out`, and reports how far
    /// it got. The caller substitutes for illegal sequences and calls again
    /// with the rest.
    fn convert(&mut self, input: &[u8], out: &mut ByteBuffer) -> Result<Step>;
}

/// Platform wide/narrow text conversion: MBS in a named charset to wide
/// units and back. A substitution is reported as [`Fidelity::Lossy`],
/// distinct from hard failure.
pub trait WideCharService {
    fn widen(&self, charset: &str, bytes: &[u8], out: &mut WideBuffer) -> Result<Fidelity>;
    fn narrow(&self, charset: &str, units: &[u32], out: &mut ByteBuffer) -> Result<Fidelity>;
}

/// Resolves a charset label to its encoding, if the backend knows it.
pub(crate) fn resolve(label: &str) -> Option<&'static Encoding> {
    Encoding::for_label(label.trim().as_bytes())
}

/// Both labels resolve to one underlying encoding.
pub(crate) fn same_encoding(a: &str, b: &str) -> bool {
    match (resolve(a), resolve(b)) {
        (Some(ea), Some(eb)) => ea == eb,
        _ => false,
    }
}

pub(crate) fn is_utf8(label: &str) -> bool {
    resolve(label) == Some(UTF_8)
}

pub(crate) fn is_utf16be(label: &str) -> bool {
    resolve(label) == Some(UTF_16BE)
}

fn reserve(vec: &mut Vec<u8>, len: usize) -> Result<()> {
    if vec.try_reserve_exact(len.saturating_sub(vec.len())).is_err() {
        return Err(Error::OutOfMemory(len));
    }
    vec.resize(len, 0);
    Ok(())
}

/// Encodes UTF-8 `text` into `enc`, substituting `placeholder` for
/// unmappable characters. Returns whether any substitution occurred.
pub(crate) fn encode_from_utf8(
    enc: &'static Encoding,
    text: &str,
    out: &mut ByteBuffer,
    placeholder: u8,
) -> Result<bool> {
    let mut lossy = false;
    let mut rest = text;
    let mut encoder: Encoder = enc.new_encoder();
    let mut chunk: Vec<u8> = Vec::new();
    while !rest.is_empty() {
        let worst = encoder
            .max_buffer_length_from_utf8_without_replacement(rest.len())
            .unwrap_or(usize::MAX / 2);
        reserve(&mut chunk, worst.max(16))?;
        let (result, read, written) =
            encoder.encode_from_utf8_without_replacement(rest, &mut chunk, true);
        out.append(&chunk[..written])?;
        rest = &rest[read..];
        match result {
            EncoderResult::InputEmpty => break,
            EncoderResult::Unmappable(_) => {
                out.push(placeholder)?;
                lossy = true;
            }
            EncoderResult::OutputFull => return Err(Error::OutOfMemory(worst)),
        }
    }
    Ok(lossy)
}

/// The default charset-conversion service, backed by `encoding_rs`.
///
/// Conversion pivots through UTF-8: any labeled source decodes to UTF-8 and
/// any labeled non-UTF-16 target encodes from it. UTF-16 targets are
/// declined; the conversion core owns those through its internal Unicode
/// path.
#[derive(Debug, Default)]
pub struct EncodingService;

impl CharsetService for EncodingService {
    fn open(&self, from: &str, to: &str) -> Result<Box<dyn CharsetConverter>> {
        let from_enc =
            resolve(from).ok_or_else(|| Error::InvalidCharset(from.to_string()))?;
        let to_enc = resolve(to).ok_or_else(|| Error::InvalidCharset(to.to_string()))?;
        if to_enc == UTF_16BE || to_enc == UTF_16LE {
            return Err(Error::Unsupported { from: from.to_string(), to: to.to_string() });
        }
        Ok(Box::new(EncodingRsConverter { from: from_enc, to: to_enc }))
    }
}

struct EncodingRsConverter {
    from: &'static Encoding,
    to: &'static Encoding,
}

impl CharsetConverter for EncodingRsConverter {
    fn convert(&mut self, input: &[u8], out: &mut ByteBuffer) -> Result<Step> {
        if input.is_empty() {
            return Ok(Step { consumed: 0, status: StepStatus::Complete { lossy: false } });
        }
        // Stage 1: source to UTF-8 pivot, stopping at the first malformed
        // sequence. A fresh decoder per step keeps the handle stateless
        // across the caller's skip-and-retry.
        let mut decoder = self.from.new_decoder_without_bom_handling();
        let worst = decoder
            .max_utf8_buffer_length_without_replacement(input.len())
            .unwrap_or(usize::MAX / 2);
        let mut pivot: Vec<u8> = Vec::new();
        reserve(&mut pivot, worst.max(16))?;
        let (result, read, written) =
            decoder.decode_to_utf8_without_replacement(input, &mut pivot, true);
        pivot.truncate(written);
        let (consumed, stopped) = match result {
            DecoderResult::InputEmpty => (read, None),
            DecoderResult::Malformed(bad, extra) => {
                let span = bad as usize + extra as usize;
                (read - span, Some(bad as usize))
            }
            // Output was sized for the worst case.
            DecoderResult::OutputFull => return Err(Error::OutOfMemory(worst)),
        };

        // Stage 2: pivot to target. The pivot is valid UTF-8 by
        // construction.
        let lossy = if self.to == UTF_8 {
            out.append(&pivot)?;
            false
        } else {
            let text =
                std::str::from_utf8(&pivot).expect("decoder produced invalid UTF-8 pivot");
            encode_from_utf8(self.to, text, out, b'?')?
        };

        match stopped {
            None => Ok(Step { consumed, status: StepStatus::Complete { lossy } }),
            Some(skip) => {
                Ok(Step { consumed, status: StepStatus::IllegalSequence { skip: skip.max(1) } })
            }
        }
    }
}

/// The default wide/narrow service for platforms whose wide representation
/// is Unicode code points: one wide unit per Unicode scalar value.
#[derive(Debug, Default)]
pub struct UnicodeWideChars;

impl WideCharService for UnicodeWideChars {
    fn widen(&self, charset: &str, bytes: &[u8], out: &mut WideBuffer) -> Result<Fidelity> {
        let mut fidelity = Fidelity::Exact;
        if is_utf8(charset) {
            let mut pos = 0;
            while pos < bytes.len() {
                let d = decode_cesu8(&bytes[pos..]);
                if d.consumed == 0 {
                    break;
                }
                if d.replaced {
                    fidelity = Fidelity::Lossy;
                }
                out.push(d.codepoint)?;
                pos += d.consumed;
            }
            return Ok(fidelity);
        }
        let enc = resolve(charset).ok_or_else(|| Error::InvalidCharset(charset.to_string()))?;
        let (text, had_errors) = enc.decode_without_bom_handling(bytes);
        if had_errors {
            fidelity = Fidelity::Lossy;
        }
        for c in text.chars() {
            out.push(u32::from(c))?;
        }
        Ok(fidelity)
    }

    fn narrow(&self, charset: &str, units: &[u32], out: &mut ByteBuffer) -> Result<Fidelity> {
        let mut fidelity = Fidelity::Exact;
        if is_utf8(charset) {
            let mut buf = [0u8; 4];
            for &u in units {
                if char::try_from(u).is_err() {
                    fidelity = Fidelity::Lossy;
                }
                let n = encode_utf8(u, &mut buf);
                out.append(&buf[..n])?;
            }
            return Ok(fidelity);
        }
        let enc = resolve(charset).ok_or_else(|| Error::InvalidCharset(charset.to_string()))?;
        let mut text = String::with_capacity(units.len());
        for &u in units {
            match char::try_from(u) {
                Ok(c) => text.push(c),
                Err(_) => {
                    text.push(char::try_from(REPLACEMENT).unwrap_or('\u{FFFD}'));
                    fidelity = Fidelity::Lossy;
                }
            }
        }
        if encode_from_utf8(enc, &text, out, b'?')? {
            fidelity = Fidelity::Lossy;
        }
        Ok(fidelity)
    }
}
