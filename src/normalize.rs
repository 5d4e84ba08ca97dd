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

//! Canonical composition (NFC) over a UTF-8/CESU-8 byte stream.
//!
//! A single streaming pass per Unicode Standard Annex #15: Hangul syllables
//! compose arithmetically, everything else through the canonical composition
//! pair table, with a bounded lookahead run of combining marks so that marks
//! of canonical combining class 228 may reorder around each other.
//!
//! Invalid sequences do not abort the pass; they are carried through as the
//! replacement character and reported as [`Fidelity::Lossy`].

use std::convert::TryFrom;

use unicode_normalization::char::{canonical_combining_class, compose};

use crate::buffer::ByteBuffer;
use crate::codec::{decode_cesu8, encode_utf8};
use crate::error::Result;
use crate::Fidelity;

// Hangul composition constants, Unicode Standard Annex #15.
const HC_SBASE: u32 = 0xAC00;
const HC_LBASE: u32 = 0x1100;
const HC_VBASE: u32 = 0x1161;
const HC_TBASE: u32 = 0x11A7;
const HC_LCOUNT: u32 = 19;
const HC_VCOUNT: u32 = 21;
const HC_TCOUNT: u32 = 28;
const HC_NCOUNT: u32 = HC_VCOUNT * HC_TCOUNT;
const HC_SCOUNT: u32 = HC_LCOUNT * HC_NCOUNT;

/// Maximum number of following decomposable characters held in the
/// lookahead run.
const FDC_MAX: usize = 10;

/// The combining class whose marks may reorder among themselves.
const CCC_REORDER: u8 = 228;

fn ccc(uc: u32) -> u8 {
    char::try_from(uc).map(canonical_combining_class).unwrap_or(0)
}

/// No canonical composition has a second character below U+0300, so anything
/// under that needs no lookup at all.
fn in_decomposable_block(uc: u32) -> bool {
    uc >= 0x300
}

fn is_hangul_v_or_t(uc: u32) -> bool {
    (HC_VBASE..HC_VBASE + HC_VCOUNT).contains(&uc)
        || (HC_TBASE + 1..HC_TBASE + HC_TCOUNT).contains(&uc)
}

/// Canonical composition pair lookup. Hangul jamo are excluded here; the
/// caller composes those arithmetically first.
fn compose_pair(uc: u32, uc2: u32) -> Option<u32> {
    if is_hangul_v_or_t(uc2) {
        return None;
    }
    let a = char::try_from(uc).ok()?;
    let b = char::try_from(uc2).ok()?;
    compose(a, b).map(u32::from)
}

fn emit(out: &mut ByteBuffer, uc: u32) -> Result<()> {
    let mut buf = [0u8; 4];
    let n = encode_utf8(uc, &mut buf);
    out.append(&buf[..n])
}

/// Outcome of one lookahead collection pass.
enum Probe {
    /// End of input.
    End,
    /// An invalid sequence follows; left unconsumed for the main loop.
    Replaced,
    /// A mark of class `cx` blocks the run; left unconsumed.
    Blocked { cx: u8 },
    /// The run filled up before anything blocked it.
    Full,
}

/// Collects following combining marks into the run while their classes are
/// non-decreasing, with class-228 marks never blocking. `cl` tracks the class
/// of the last accepted mark.
fn collect(
    input: &[u8],
    pos: &mut usize,
    run_cp: &mut [u32; FDC_MAX],
    run_cc: &mut [u8; FDC_MAX],
    size: &mut usize,
    cl: &mut u8,
) -> Probe {
    while *size < FDC_MAX {
        let d = decode_cesu8(&input[*pos..]);
        if d.consumed == 0 {
            return Probe::End;
        }
        if d.replaced {
            return Probe::Replaced;
        }
        let cx = ccc(d.codepoint);
        if *cl >= cx && *cl != CCC_REORDER && cx != CCC_REORDER {
            return Probe::Blocked { cx };
        }
        *pos += d.consumed;
        run_cp[*size] = d.codepoint;
        run_cc[*size] = cx;
        *size += 1;
        *cl = cx;
    }
    Probe::Full
}

/// Whether the trailing-mark flush should run after this probe: the run was
/// stopped by a mark of the same class, or simply overflowed.
fn flushes(probe: &Probe, cl: u8) -> bool {
    match *probe {
        Probe::Blocked { cx } => cx == cl,
        Probe::Full => true,
        _ => false,
    }
}

/// Appends the NFC form of `input` to `out`.
///
/// Invalid sequences pass through as U+FFFD and make the result
/// [`Fidelity::Lossy`]; so does overflowing the lookahead run. The pass never
/// expands the text beyond the input length plus one terminator unless
/// replacements force re-encoding, so one up-front `ensure` covers the common
/// case and `emit` grows on demand from there.
pub fn normalize_nfc(out: &mut ByteBuffer, input: &[u8]) -> Result<Fidelity> {
    let mut fidelity = Fidelity::Exact;
    out.ensure(out.len() + input.len() + 1)?;

    let mut pos = 0;
    'outer: while pos < input.len() {
        let d = decode_cesu8(&input[pos..]);
        if d.consumed == 0 {
            break;
        }
        pos += d.consumed;
        if d.replaced {
            fidelity = Fidelity::Lossy;
            emit(out, d.codepoint)?;
            continue;
        }
        let mut uc = d.codepoint;

        loop {
            let d2 = decode_cesu8(&input[pos..]);
            if d2.consumed == 0 {
                emit(out, uc)?;
                break 'outer;
            }
            if d2.replaced {
                emit(out, uc)?;
                pos += d2.consumed;
                emit(out, d2.codepoint)?;
                fidelity = Fidelity::Lossy;
                continue 'outer;
            }
            pos += d2.consumed;
            let uc2 = d2.codepoint;

            if !in_decomposable_block(uc2) {
                emit(out, uc)?;
                uc = uc2;
                continue;
            }

            // Hangul composition: L + V makes an LV syllable.
            let l_index = uc.wrapping_sub(HC_LBASE);
            if l_index < HC_LCOUNT {
                let v_index = uc2.wrapping_sub(HC_VBASE);
                if v_index < HC_VCOUNT {
                    uc = HC_SBASE + (l_index * HC_VCOUNT + v_index) * HC_TCOUNT;
                } else {
                    emit(out, uc)?;
                    uc = uc2;
                }
                continue;
            }
            // Hangul composition: LV + T makes an LVT syllable.
            let s_index = uc.wrapping_sub(HC_SBASE);
            if s_index < HC_SCOUNT && s_index % HC_TCOUNT == 0 {
                let t_index = uc2.wrapping_sub(HC_TBASE);
                if t_index >= 1 && t_index < HC_TCOUNT {
                    uc += t_index;
                } else {
                    emit(out, uc)?;
                    uc = uc2;
                }
                continue;
            }

            if let Some(nfc) = compose_pair(uc, uc2) {
                uc = nfc;
                continue;
            }

            let mut cl = ccc(uc2);
            if cl == 0 {
                // uc2 is a starter; nothing behind it can reach uc.
                emit(out, uc)?;
                uc = uc2;
                continue;
            }

            // uc2 is a combining mark that does not compose directly.
            // Collect the run of marks behind it and search it for one that
            // composes with uc; marks of equal nonzero class may hide a
            // composable one behind them only for class 228.
            let mut run_cp = [0u32; FDC_MAX];
            let mut run_cc = [0u8; FDC_MAX];
            run_cp[0] = uc2;
            run_cc[0] = cl;
            let mut size = 1;
            let mut probe = collect(input, &mut pos, &mut run_cp, &mut run_cc, &mut size, &mut cl);
            if let Probe::Full = probe {
                fidelity = Fidelity::Lossy;
            }

            let mut i = 1;
            while i < size {
                let nfc = match compose_pair(uc, run_cp[i]) {
                    Some(nfc) => nfc,
                    None => {
                        i += 1;
                        continue;
                    }
                };
                uc = nfc;
                for j in i..size - 1 {
                    run_cp[j] = run_cp[j + 1];
                    run_cc[j] = run_cc[j + 1];
                }
                size -= 1;
                // The removed mark may have been blocking further marks of
                // its class; pull them in before restarting the search.
                if size > 0 && i == size && flushes(&probe, cl) {
                    cl = run_cc[size - 1];
                    probe = collect(input, &mut pos, &mut run_cp, &mut run_cc, &mut size, &mut cl);
                    if let Probe::Full = probe {
                        fidelity = Fidelity::Lossy;
                    }
                }
                i = 0;
            }

            // Nothing further composes; write out what we have, in order.
            emit(out, uc)?;
            for &cp in run_cp.iter().take(size) {
                emit(out, cp)?;
            }

            // Stream any remaining blocked marks straight through while
            // their classes stay non-decreasing.
            if flushes(&probe, cl) {
                loop {
                    let d = decode_cesu8(&input[pos..]);
                    if d.consumed == 0 || d.replaced {
                        break;
                    }
                    let cx = ccc(d.codepoint);
                    if cl > cx {
                        break;
                    }
                    pos += d.consumed;
                    cl = cx;
                    emit(out, d.codepoint)?;
                }
            }
            continue 'outer;
        }
    }
    Ok(fidelity)
}
