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

//! The per-consumer registry of conversion contexts.
//!
//! A [`ConversionRegistry`] caches one [`Conversion`] per charset pair so
//! that converting a thousand filenames through the same pair builds its
//! context once. It also carries the consumer's [`Locale`] snapshot, so
//! "convert to the local charset" means the same thing for the whole life of
//! the registry regardless of later environment changes, and the
//! [`WideCharService`] used for MBS ⇄ WCS.

use indexmap::IndexMap;
use std::rc::Rc;

use crate::buffer::{ByteBuffer, WideBuffer};
use crate::charset::{CharsetService, EncodingService, UnicodeWideChars, WideCharService};
use crate::convert::Conversion;
use crate::error::Result;
use crate::Fidelity;

/// A snapshot of the environment's character-set configuration, taken when
/// the registry is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locale {
    /// The narrow charset names in this locale resolve against.
    pub charset: String,
    /// The ANSI code page, where the platform distinguishes one.
    pub ansi_codepage: Option<u32>,
    /// The OEM code page, where the platform distinguishes one.
    pub oem_codepage: Option<u32>,
}

impl Locale {
    /// A plain UTF-8 locale, the default on every platform this crate's
    /// bundled services target.
    pub fn utf8() -> Locale {
        Locale { charset: "UTF-8".to_string(), ansi_codepage: None, oem_codepage: None }
    }

    pub fn with_charset(charset: &str) -> Locale {
        Locale { charset: charset.to_string(), ansi_codepage: None, oem_codepage: None }
    }
}

impl Default for Locale {
    fn default() -> Locale {
        Locale::utf8()
    }
}

/// Owns and caches conversion contexts, keyed by charset pair.
pub struct ConversionRegistry {
    contexts: IndexMap<(String, String), Conversion>,
    locale: Locale,
    service: Rc<dyn CharsetService>,
    wide: Box<dyn WideCharService>,
}

impl ConversionRegistry {
    /// A registry over the bundled conversion services with a UTF-8 locale.
    pub fn new() -> ConversionRegistry {
        ConversionRegistry::with_locale(Locale::utf8())
    }

    pub fn with_locale(locale: Locale) -> ConversionRegistry {
        ConversionRegistry::with_services(
            locale,
            Rc::new(EncodingService::default()),
            Box::new(UnicodeWideChars::default()),
        )
    }

    /// A registry with caller-supplied services. The seam used by platforms
    /// with their own conversion machinery, and by tests.
    pub fn with_services(
        locale: Locale,
        service: Rc<dyn CharsetService>,
        wide: Box<dyn WideCharService>,
    ) -> ConversionRegistry {
        ConversionRegistry { contexts: IndexMap::new(), locale, service, wide }
    }

    pub fn locale(&self) -> &Locale {
        &self.locale
    }

    /// The cached context for `from` → `to`, building it on first use.
    ///
    /// The cache key is the pair alone; the first request's `best_effort`
    /// policy sticks for the life of the cached context.
    pub fn conversion(
        &mut self,
        from: &str,
        to: &str,
        best_effort: bool,
    ) -> Result<&mut Conversion> {
        let key = (from.to_string(), to.to_string());
        if !self.contexts.contains_key(&key) {
            let conv = Conversion::new(self.service.as_ref(), from, to, best_effort)?;
            self.contexts.insert(key.clone(), conv);
        }
        // Just inserted or already present.
        Ok(self.contexts.get_mut(&key).expect("conversion context vanished"))
    }

    /// Context converting from the locale charset to `charset`.
    pub fn to_charset(&mut self, charset: &str, best_effort: bool) -> Result<&mut Conversion> {
        let from = self.locale.charset.clone();
        self.conversion(&from, charset, best_effort)
    }

    /// Context converting from `charset` to the locale charset.
    pub fn from_charset(&mut self, charset: &str, best_effort: bool) -> Result<&mut Conversion> {
        let to = self.locale.charset.clone();
        self.conversion(charset, &to, best_effort)
    }

    /// Widens narrow text in `charset` through the wide-char service.
    pub fn widen(&self, charset: &str, bytes: &[u8], out: &mut WideBuffer) -> Result<Fidelity> {
        self.wide.widen(charset, bytes, out)
    }

    /// Narrows wide units into `charset` through the wide-char service.
    pub fn narrow(&self, charset: &str, units: &[u32], out: &mut ByteBuffer) -> Result<Fidelity> {
        self.wide.narrow(charset, units, out)
    }

    /// Drops every cached context. Buffers and service handles go with them.
    pub fn clear(&mut self) {
        self.contexts.clear();
    }

    /// Number of cached contexts.
    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }
}

impl Default for ConversionRegistry {
    fn default() -> ConversionRegistry {
        ConversionRegistry::new()
    }
}
