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

//! One logical string held lazily in up to three representations.
//!
//! A [`MultiString`] stores a value as locale-charset bytes (MBS), wide
//! units (WCS) and UTF-8, converting between them only when a representation
//! is actually read. Setting any one form invalidates the other two; reading
//! a missing form derives it through a [`ConversionRegistry`] and caches it
//! only when the conversion was exact. A lossy derivation still hands back
//! the converted value, so a later read retries the conversion rather than
//! serving a cached substitute.

use crate::buffer::{ByteBuffer, WideBuffer};
use crate::error::Result;
use crate::registry::ConversionRegistry;
use crate::Fidelity;

bitflags! {
    /// Which representations currently hold a valid value.
    pub struct Forms: u8 {
        const MBS  = 0b001;
        const WCS  = 0b010;
        const UTF8 = 0b100;
    }
}

/// A string value held in up to three charset representations at once.
#[derive(Clone)]
pub struct MultiString {
    mbs: ByteBuffer,
    wcs: WideBuffer,
    utf8: ByteBuffer,
    set: Forms,
}

impl Default for MultiString {
    fn default() -> MultiString {
        MultiString::new()
    }
}

impl MultiString {
    pub fn new() -> MultiString {
        MultiString {
            mbs: ByteBuffer::new(),
            wcs: WideBuffer::new(),
            utf8: ByteBuffer::new(),
            set: Forms::empty(),
        }
    }

    /// The representations currently valid.
    pub fn forms(&self) -> Forms {
        self.set
    }

    /// Drops the value from every representation, keeping allocations.
    pub fn clear(&mut self) {
        self.mbs.clear();
        self.wcs.clear();
        self.utf8.clear();
        self.set = Forms::empty();
    }

    /// Sets the value from locale-charset bytes, invalidating other forms.
    pub fn set_mbs(&mut self, bytes: &[u8]) -> Result<()> {
        self.mbs.clear();
        self.mbs.append(bytes)?;
        self.wcs.clear();
        self.utf8.clear();
        self.set = Forms::MBS;
        Ok(())
    }

    /// Sets the value from wide units, invalidating other forms.
    pub fn set_wcs(&mut self, units: &[u32]) -> Result<()> {
        self.wcs.clear();
        self.wcs.append(units)?;
        self.mbs.clear();
        self.utf8.clear();
        self.set = Forms::WCS;
        Ok(())
    }

    /// Sets the value from UTF-8 bytes, invalidating other forms.
    pub fn set_utf8(&mut self, bytes: &[u8]) -> Result<()> {
        self.utf8.clear();
        self.utf8.append(bytes)?;
        self.mbs.clear();
        self.wcs.clear();
        self.set = Forms::UTF8;
        Ok(())
    }

    /// The value as locale-charset bytes, deriving it if need be.
    ///
    /// Prefers deriving from the wide form, then from UTF-8. `None` when no
    /// form holds a value at all.
    pub fn get_mbs(&mut self, reg: &mut ConversionRegistry) -> Result<Option<(&[u8], Fidelity)>> {
        if self.set.contains(Forms::MBS) {
            return Ok(Some((self.mbs.as_bytes(), Fidelity::Exact)));
        }
        if self.set.contains(Forms::WCS) {
            self.mbs.clear();
            let charset = reg.locale().charset.clone();
            let fid = reg.narrow(&charset, self.wcs.as_units(), &mut self.mbs)?;
            if let Fidelity::Exact = fid {
                self.set |= Forms::MBS;
            }
            return Ok(Some((self.mbs.as_bytes(), fid)));
        }
        if self.set.contains(Forms::UTF8) {
            let charset = reg.locale().charset.clone();
            let conv = reg.conversion("UTF-8", &charset, true)?;
            let fid = conv.transcode(&mut self.mbs, self.utf8.as_bytes())?;
            if let Fidelity::Exact = fid {
                self.set |= Forms::MBS;
            }
            return Ok(Some((self.mbs.as_bytes(), fid)));
        }
        Ok(None)
    }

    /// The value as wide units, deriving it if need be.
    ///
    /// Prefers deriving from MBS, then from UTF-8.
    pub fn get_wcs(&mut self, reg: &mut ConversionRegistry) -> Result<Option<(&[u32], Fidelity)>> {
        if self.set.contains(Forms::WCS) {
            return Ok(Some((self.wcs.as_units(), Fidelity::Exact)));
        }
        if self.set.contains(Forms::MBS) {
            self.wcs.clear();
            let charset = reg.locale().charset.clone();
            let fid = reg.widen(&charset, self.mbs.as_bytes(), &mut self.wcs)?;
            if let Fidelity::Exact = fid {
                self.set |= Forms::WCS;
            }
            return Ok(Some((self.wcs.as_units(), fid)));
        }
        if self.set.contains(Forms::UTF8) {
            self.wcs.clear();
            let fid = reg.widen("UTF-8", self.utf8.as_bytes(), &mut self.wcs)?;
            if let Fidelity::Exact = fid {
                self.set |= Forms::WCS;
            }
            return Ok(Some((self.wcs.as_units(), fid)));
        }
        Ok(None)
    }

    /// The value as UTF-8, deriving it if need be.
    ///
    /// Prefers deriving from the wide form, then from MBS.
    pub fn get_utf8(&mut self, reg: &mut ConversionRegistry) -> Result<Option<(&[u8], Fidelity)>> {
        if self.set.contains(Forms::UTF8) {
            return Ok(Some((self.utf8.as_bytes(), Fidelity::Exact)));
        }
        if self.set.contains(Forms::WCS) {
            self.utf8.clear();
            let fid = reg.narrow("UTF-8", self.wcs.as_units(), &mut self.utf8)?;
            if let Fidelity::Exact = fid {
                self.set |= Forms::UTF8;
            }
            return Ok(Some((self.utf8.as_bytes(), fid)));
        }
        if self.set.contains(Forms::MBS) {
            let charset = reg.locale().charset.clone();
            let conv = reg.conversion(&charset, "UTF-8", true)?;
            let fid = conv.transcode(&mut self.utf8, self.mbs.as_bytes())?;
            if let Fidelity::Exact = fid {
                self.set |= Forms::UTF8;
            }
            return Ok(Some((self.utf8.as_bytes(), fid)));
        }
        Ok(None)
    }

    /// Sets the UTF-8 form and eagerly derives MBS and then WCS from it.
    ///
    /// `Ok(Fidelity::Exact)` means every form round-trips. A lossy step
    /// stops derivation and reports `Lossy`; the forms derived exactly up to
    /// that point stay populated and valid, so callers that can live with a
    /// substituted name may still read it back best-effort later.
    pub fn update_utf8(&mut self, reg: &mut ConversionRegistry, bytes: &[u8]) -> Result<Fidelity> {
        self.set_utf8(bytes)?;

        let charset = reg.locale().charset.clone();
        let conv = reg.conversion("UTF-8", &charset, true)?;
        if conv.transcode(&mut self.mbs, self.utf8.as_bytes())?.is_lossy() {
            return Ok(Fidelity::Lossy);
        }
        self.set |= Forms::MBS;

        self.wcs.clear();
        if reg.widen(&charset, self.mbs.as_bytes(), &mut self.wcs)?.is_lossy() {
            return Ok(Fidelity::Lossy);
        }
        self.set |= Forms::WCS;
        Ok(Fidelity::Exact)
    }
}
