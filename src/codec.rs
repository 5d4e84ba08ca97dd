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

//! Stateless code point codecs for UTF-8, CESU-8 and UTF-16BE.
//!
//! Decoders process exactly one sequence per call and never fail: an invalid
//! sequence yields the replacement character U+FFFD with `replaced` set and
//! `consumed` equal to the number of units to skip. `consumed == 0` means end
//! of input (empty slice or a leading NUL).
//!
//! CESU-8 encodes supplementary-plane characters as two 3-byte surrogate
//! sequences instead of one 4-byte sequence. [`decode_cesu8`] combines such
//! pairs; [`decode_utf8`] rejects any encoded surrogate as invalid UTF-8.

/// The Unicode replacement character, substituted for invalid input.
pub const REPLACEMENT: u32 = 0xFFFD;
/// The largest legal Unicode code point.
pub const UNICODE_MAX: u32 = 0x10FFFF;

const SURROGATE_HIGH: u32 = 0xD800;
const SURROGATE_LOW: u32 = 0xDC00;
const SURROGATE_END: u32 = 0xE000;

/// Result of decoding one sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decoded {
    /// The decoded code point, or U+FFFD when `replaced` is set.
    pub codepoint: u32,
    /// Units consumed from the input; zero at end of input. When `replaced`
    /// is set this is the span to skip past the invalid sequence.
    pub consumed: usize,
    /// The sequence was invalid and `codepoint` is a substitution.
    pub replaced: bool,
}

impl Decoded {
    fn end() -> Decoded {
        Decoded { codepoint: 0, consumed: 0, replaced: false }
    }

    fn ok(codepoint: u32, consumed: usize) -> Decoded {
        Decoded { codepoint, consumed, replaced: false }
    }

    fn replaced(consumed: usize) -> Decoded {
        Decoded { codepoint: REPLACEMENT, consumed, replaced: true }
    }
}

pub fn is_high_surrogate(uc: u32) -> bool {
    (SURROGATE_HIGH..SURROGATE_LOW).contains(&uc)
}

pub fn is_low_surrogate(uc: u32) -> bool {
    (SURROGATE_LOW..SURROGATE_END).contains(&uc)
}

pub fn is_surrogate(uc: u32) -> bool {
    (SURROGATE_HIGH..SURROGATE_END).contains(&uc)
}

/// Assembles one code point from a high/low surrogate pair.
pub fn combine_surrogate_pair(hi: u32, lo: u32) -> u32 {
    0x10000 + (hi - SURROGATE_HIGH) * 0x400 + (lo - SURROGATE_LOW)
}

/// Sequence length by lead byte; 0 marks bytes that can never start a
/// sequence.
fn sequence_len(lead: u8) -> usize {
    match lead {
        0x00..=0x7F => 1,
        0xC2..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF4 => 4,
        _ => 0,
    }
}

/// Span to skip for an invalid lead byte: the length the byte claims to
/// introduce, so one bad character becomes one replacement.
fn invalid_skip(lead: u8) -> usize {
    match lead {
        0xC0 | 0xC1 => 2,
        0xF5..=0xF7 => 4,
        0xF8..=0xFB => 5,
        0xFC | 0xFD => 6,
        _ => 1,
    }
}

/// Clamps a skip span to the available bytes and to the run of continuation
/// bytes actually present.
fn clamp_skip(s: &[u8], claimed: usize) -> usize {
    let max = claimed.min(s.len());
    for (i, &b) in s.iter().enumerate().take(max).skip(1) {
        if b & 0xC0 != 0x80 {
            return i;
        }
    }
    max
}

/// Decodes one UTF-8 sequence, permitting encoded surrogate values.
///
/// This is the shared scanner under [`decode_utf8`] and [`decode_cesu8`]:
/// overlong forms, out-of-range values and truncated sequences are invalid
/// here; surrogate values pass through for the callers to judge.
fn decode_raw(s: &[u8]) -> Decoded {
    if s.is_empty() || s[0] == 0 {
        return Decoded::end();
    }
    let lead = s[0];
    let want = sequence_len(lead);
    if want == 0 {
        return Decoded::replaced(clamp_skip(s, invalid_skip(lead)));
    }
    if s.len() < want {
        return Decoded::replaced(clamp_skip(s, want));
    }
    for &b in &s[1..want] {
        if b & 0xC0 != 0x80 {
            return Decoded::replaced(clamp_skip(s, want));
        }
    }
    let uc = match want {
        1 => u32::from(lead),
        2 => (u32::from(lead & 0x1F) << 6) | u32::from(s[1] & 0x3F),
        3 => {
            let uc = (u32::from(lead & 0x0F) << 12)
                | (u32::from(s[1] & 0x3F) << 6)
                | u32::from(s[2] & 0x3F);
            if uc < 0x800 {
                // Overlong sequence.
                return Decoded::replaced(want);
            }
            uc
        }
        _ => {
            let uc = (u32::from(lead & 0x07) << 18)
                | (u32::from(s[1] & 0x3F) << 12)
                | (u32::from(s[2] & 0x3F) << 6)
                | u32::from(s[3] & 0x3F);
            if uc < 0x10000 {
                // Overlong sequence.
                return Decoded::replaced(want);
            }
            uc
        }
    };
    if uc > UNICODE_MAX {
        return Decoded::replaced(want);
    }
    Decoded::ok(uc, want)
}

/// Decodes exactly one strict UTF-8 sequence.
///
/// Encoded surrogate values (U+D800–U+DFFF) are invalid UTF-8 and come back
/// replaced with a 3-byte skip; callers that want to salvage CESU-8 surrogate
/// pairs retry such spots through [`decode_cesu8`].
pub fn decode_utf8(s: &[u8]) -> Decoded {
    let d = decode_raw(s);
    if !d.replaced && d.consumed == 3 && is_surrogate(d.codepoint) {
        return Decoded::replaced(3);
    }
    d
}

/// Decodes one UTF-8/CESU-8 sequence, combining surrogate pairs.
///
/// A 3-byte high surrogate immediately followed by a 3-byte low surrogate
/// decodes to the combined supplementary code point, consuming 6 bytes. A
/// lone surrogate of either kind is invalid.
pub fn decode_cesu8(s: &[u8]) -> Decoded {
    let d = decode_raw(s);
    if d.replaced || d.consumed != 3 || !is_surrogate(d.codepoint) {
        return d;
    }
    if is_high_surrogate(d.codepoint) {
        let d2 = decode_raw(&s[3..]);
        if !d2.replaced && d2.consumed == 3 && is_low_surrogate(d2.codepoint) {
            return Decoded::ok(combine_surrogate_pair(d.codepoint, d2.codepoint), 6);
        }
    }
    Decoded::replaced(3)
}

/// Encodes one code point as UTF-8 into `buf`, returning the length used.
///
/// Never fails: surrogate values and anything beyond U+10FFFF encode as the
/// 3-byte replacement character.
pub fn encode_utf8(uc: u32, buf: &mut [u8; 4]) -> usize {
    let uc = if is_surrogate(uc) { REPLACEMENT } else { uc };
    if uc <= 0x7F {
        buf[0] = uc as u8;
        1
    } else if uc <= 0x7FF {
        buf[0] = 0xC0 | ((uc >> 6) & 0x1F) as u8;
        buf[1] = 0x80 | (uc & 0x3F) as u8;
        2
    } else if uc <= 0xFFFF {
        buf[0] = 0xE0 | ((uc >> 12) & 0x0F) as u8;
        buf[1] = 0x80 | ((uc >> 6) & 0x3F) as u8;
        buf[2] = 0x80 | (uc & 0x3F) as u8;
        3
    } else if uc <= UNICODE_MAX {
        buf[0] = 0xF0 | ((uc >> 18) & 0x07) as u8;
        buf[1] = 0x80 | ((uc >> 12) & 0x3F) as u8;
        buf[2] = 0x80 | ((uc >> 6) & 0x3F) as u8;
        buf[3] = 0x80 | (uc & 0x3F) as u8;
        4
    } else {
        buf[0] = 0xEF;
        buf[1] = 0xBF;
        buf[2] = 0xBD;
        3
    }
}

/// Decodes one UTF-16BE scalar; `consumed` counts bytes (2 or 4).
///
/// A high surrogate followed by a low surrogate assembles into one code
/// point; a lone surrogate is invalid with a 2-byte skip. Fewer than 2 bytes
/// remaining is end of input.
pub fn decode_utf16be(s: &[u8]) -> Decoded {
    if s.len() < 2 {
        return Decoded::end();
    }
    let uc = u32::from(u16::from_be_bytes([s[0], s[1]]));
    if is_high_surrogate(uc) {
        if s.len() >= 4 {
            let lo = u32::from(u16::from_be_bytes([s[2], s[3]]));
            if is_low_surrogate(lo) {
                return Decoded::ok(combine_surrogate_pair(uc, lo), 4);
            }
        }
        return Decoded::replaced(2);
    }
    if is_low_surrogate(uc) {
        return Decoded::replaced(2);
    }
    Decoded::ok(uc, 2)
}

/// Encodes one code point as UTF-16BE into `buf`, returning the length used
/// (2 or 4 bytes). Out-of-range values encode as the replacement character.
pub fn encode_utf16be(uc: u32, buf: &mut [u8; 4]) -> usize {
    let uc = if uc > UNICODE_MAX || is_surrogate(uc) { REPLACEMENT } else { uc };
    if uc > 0xFFFF {
        let v = uc - 0x10000;
        buf[..2].copy_from_slice(&(((v >> 10) as u16 & 0x3FF) + 0xD800).to_be_bytes());
        buf[2..4].copy_from_slice(&((v as u16 & 0x3FF) + 0xDC00).to_be_bytes());
        4
    } else {
        buf[..2].copy_from_slice(&(uc as u16).to_be_bytes());
        2
    }
}
