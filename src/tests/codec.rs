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

use crate::codec::{
    decode_cesu8, decode_utf16be, decode_utf8, encode_utf16be, encode_utf8, REPLACEMENT,
};

#[test]
fn decodes_each_sequence_length() {
    let d = decode_utf8(b"A");
    assert_eq!((d.codepoint, d.consumed, d.replaced), (0x41, 1, false));
    let d = decode_utf8("é".as_bytes());
    assert_eq!((d.codepoint, d.consumed, d.replaced), (0xE9, 2, false));
    let d = decode_utf8("€".as_bytes());
    assert_eq!((d.codepoint, d.consumed, d.replaced), (0x20AC, 3, false));
    let d = decode_utf8("𐍈".as_bytes());
    assert_eq!((d.codepoint, d.consumed, d.replaced), (0x10348, 4, false));
}

#[test]
fn end_of_input() {
    assert_eq!(decode_utf8(b"").consumed, 0);
    assert_eq!(decode_utf8(b"\0after-nul").consumed, 0);
    assert_eq!(decode_cesu8(b"").consumed, 0);
}

#[test]
fn lone_continuation_skips_one() {
    let d = decode_utf8(b"\x80abc");
    assert!(d.replaced);
    assert_eq!(d.consumed, 1);
    assert_eq!(d.codepoint, REPLACEMENT);
}

#[test]
fn overlong_two_byte_skips_two() {
    // C0/C1 leads can only start overlong encodings.
    let d = decode_utf8(b"\xC0\x80");
    assert!(d.replaced);
    assert_eq!(d.consumed, 2);
}

#[test]
fn overlong_longer_forms_rejected() {
    // U+0000 encoded in three bytes.
    let d = decode_utf8(b"\xE0\x80\x80");
    assert!(d.replaced);
    assert_eq!(d.consumed, 3);
    // U+0800 encoded in four bytes.
    let d = decode_utf8(b"\xF0\x80\xA0\x80");
    assert!(d.replaced);
    assert_eq!(d.consumed, 4);
}

#[test]
fn out_of_range_lead_skips_claimed_width() {
    let d = decode_utf8(b"\xF5\x80\x80\x80x");
    assert!(d.replaced);
    assert_eq!(d.consumed, 4);
    // FC claims six bytes but the continuation run is cut short.
    let d = decode_utf8(b"\xFC\x80\x80");
    assert!(d.replaced);
    assert_eq!(d.consumed, 3);
    // The skip never swallows a following valid character.
    let d = decode_utf8(b"\xF8\x80A");
    assert!(d.replaced);
    assert_eq!(d.consumed, 2);
}

#[test]
fn truncated_sequence_skips_what_is_there() {
    let d = decode_utf8(b"\xE2\x82");
    assert!(d.replaced);
    assert_eq!(d.consumed, 2);
}

#[test]
fn strict_utf8_rejects_surrogates() {
    // U+D800 as three bytes.
    let d = decode_utf8(b"\xED\xA0\x80");
    assert!(d.replaced);
    assert_eq!(d.consumed, 3);
}

#[test]
fn cesu8_combines_surrogate_pairs() {
    // U+D800 U+DC00 as two three-byte sequences.
    let d = decode_cesu8(b"\xED\xA0\x80\xED\xB0\x80");
    assert_eq!((d.codepoint, d.consumed, d.replaced), (0x10000, 6, false));
    // The same bytes are invalid strict UTF-8.
    let d = decode_utf8(b"\xED\xA0\x80\xED\xB0\x80");
    assert!(d.replaced);
    assert_eq!(d.consumed, 3);
}

#[test]
fn cesu8_rejects_lone_surrogates() {
    let d = decode_cesu8(b"\xED\xA0\x80A");
    assert!(d.replaced);
    assert_eq!(d.consumed, 3);
    // A low surrogate with no preceding high one.
    let d = decode_cesu8(b"\xED\xB0\x80");
    assert!(d.replaced);
    assert_eq!(d.consumed, 3);
}

#[test]
fn utf8_encoding_boundaries() {
    let mut buf = [0u8; 4];
    let cases: [(u32, &[u8]); 7] = [
        (0x7F, b"\x7F"),
        (0x80, b"\xC2\x80"),
        (0x7FF, b"\xDF\xBF"),
        (0x800, b"\xE0\xA0\x80"),
        (0xFFFF, b"\xEF\xBF\xBF"),
        (0x10000, b"\xF0\x90\x80\x80"),
        (0x10FFFF, b"\xF4\x8F\xBF\xBF"),
    ];
    for &(uc, expected) in &cases {
        let n = encode_utf8(uc, &mut buf);
        assert_eq!(&buf[..n], expected, "U+{:04X}", uc);
    }
}

#[test]
fn utf8_encoding_never_fails() {
    let mut buf = [0u8; 4];
    // Surrogates and anything beyond the Unicode range come out as the
    // replacement character.
    for &uc in &[0xD800, 0xDFFF, 0x11_0000, u32::MAX] {
        let n = encode_utf8(uc, &mut buf);
        assert_eq!(&buf[..n], b"\xEF\xBF\xBD", "U+{:04X}", uc);
    }
}

#[test]
fn utf16be_basic_and_supplementary() {
    let d = decode_utf16be(b"\x00\x41");
    assert_eq!((d.codepoint, d.consumed, d.replaced), (0x41, 2, false));
    let d = decode_utf16be(b"\xD8\x00\xDC\x00");
    assert_eq!((d.codepoint, d.consumed, d.replaced), (0x10000, 4, false));
    assert_eq!(decode_utf16be(b"\x41").consumed, 0);
}

#[test]
fn utf16be_lone_surrogate_skips_one_unit() {
    let d = decode_utf16be(b"\xD8\x00\x00\x41");
    assert!(d.replaced);
    assert_eq!(d.consumed, 2);
    let d = decode_utf16be(b"\xDC\x00");
    assert!(d.replaced);
    assert_eq!(d.consumed, 2);
}

#[test]
fn utf16be_encoding() {
    let mut buf = [0u8; 4];
    let cases: [(u32, &[u8]); 4] = [
        (0x41, b"\x00\x41"),
        (0x10437, b"\xD8\x01\xDC\x37"),
        // Values no scalar can hold become the replacement character.
        (0xD800, b"\xFF\xFD"),
        (0x11_0000, b"\xFF\xFD"),
    ];
    for &(uc, expected) in &cases {
        let n = encode_utf16be(uc, &mut buf);
        assert_eq!(&buf[..n], expected, "U+{:04X}", uc);
    }
}
