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

use std::cell::Cell;
use std::rc::Rc;

use crate::charset::{CharsetConverter, CharsetService, EncodingService, UnicodeWideChars};
use crate::error::Result;
use crate::mstring::{Forms, MultiString};
use crate::registry::{ConversionRegistry, Locale};
use crate::Fidelity;

/// Wraps the real service, counting how many handles get opened.
struct CountingService {
    opens: Rc<Cell<usize>>,
    inner: EncodingService,
}

impl CharsetService for CountingService {
    fn open(&self, from: &str, to: &str) -> Result<Box<dyn CharsetConverter>> {
        self.opens.set(self.opens.get() + 1);
        self.inner.open(from, to)
    }
}

fn counting_registry(locale: Locale) -> (ConversionRegistry, Rc<Cell<usize>>) {
    let opens = Rc::new(Cell::new(0));
    let service = CountingService { opens: Rc::clone(&opens), inner: EncodingService::default() };
    let reg = ConversionRegistry::with_services(
        locale,
        Rc::new(service),
        Box::new(UnicodeWideChars::default()),
    );
    (reg, opens)
}

#[test]
fn registry_caches_contexts_per_pair() {
    let (mut reg, opens) = counting_registry(Locale::utf8());
    reg.conversion("UTF-8", "windows-1252", true).unwrap();
    reg.conversion("UTF-8", "windows-1252", true).unwrap();
    reg.conversion("UTF-8", "windows-1252", false).unwrap();
    assert_eq!(opens.get(), 1);
    assert_eq!(reg.len(), 1);
    reg.conversion("windows-1252", "UTF-8", true).unwrap();
    assert_eq!(opens.get(), 2);
    assert_eq!(reg.len(), 2);
    reg.clear();
    assert!(reg.is_empty());
}

#[test]
fn locale_relative_constructors() {
    let mut reg = ConversionRegistry::with_locale(Locale::with_charset("windows-1252"));
    let c = reg.to_charset("UTF-8", true).unwrap();
    assert_eq!(c.from_charset(), "windows-1252");
    assert_eq!(c.to_charset(), "UTF-8");
    let c = reg.from_charset("UTF-8", true).unwrap();
    assert_eq!(c.from_charset(), "UTF-8");
    assert_eq!(c.to_charset(), "windows-1252");
}

#[test]
fn empty_mstring_has_no_forms() {
    let mut reg = ConversionRegistry::new();
    let mut m = MultiString::new();
    assert!(m.forms().is_empty());
    assert!(m.get_mbs(&mut reg).unwrap().is_none());
    assert!(m.get_wcs(&mut reg).unwrap().is_none());
    assert!(m.get_utf8(&mut reg).unwrap().is_none());
}

#[test]
fn setting_one_form_invalidates_the_others() {
    let mut reg = ConversionRegistry::new();
    let mut m = MultiString::new();
    m.set_utf8("héllo".as_bytes()).unwrap();
    assert_eq!(m.forms(), Forms::UTF8);
    m.get_mbs(&mut reg).unwrap();
    assert!(m.forms().contains(Forms::MBS));
    m.set_mbs(b"other").unwrap();
    assert_eq!(m.forms(), Forms::MBS);
    let (utf8, fid) = m.get_utf8(&mut reg).unwrap().unwrap();
    assert_eq!(utf8, b"other");
    assert_eq!(fid, Fidelity::Exact);
}

#[test]
fn conversion_is_lazy() {
    let (mut reg, opens) = counting_registry(Locale::with_charset("windows-1252"));
    let mut m = MultiString::new();
    m.set_utf8("héllo".as_bytes()).unwrap();
    // Nothing read yet, so nothing converted yet.
    assert_eq!(opens.get(), 0);
    let (mbs, fid) = m.get_mbs(&mut reg).unwrap().unwrap();
    assert_eq!(mbs, b"h\xe9llo");
    assert_eq!(fid, Fidelity::Exact);
    assert_eq!(opens.get(), 1);
    // A second read serves the cached form.
    m.get_mbs(&mut reg).unwrap().unwrap();
    assert_eq!(opens.get(), 1);
}

#[test]
fn wide_form_derives_from_utf8() {
    let mut reg = ConversionRegistry::new();
    let mut m = MultiString::new();
    m.set_utf8("A\u{10000}".as_bytes()).unwrap();
    let (wcs, fid) = m.get_wcs(&mut reg).unwrap().unwrap();
    assert_eq!(wcs, &[0x41, 0x10000]);
    assert_eq!(fid, Fidelity::Exact);
    assert!(m.forms().contains(Forms::WCS));
}

#[test]
fn wide_form_round_trips_through_mbs() {
    let mut reg = ConversionRegistry::with_locale(Locale::with_charset("windows-1252"));
    let mut m = MultiString::new();
    m.set_wcs(&[0x63, 0x61, 0x66, 0xE9]).unwrap(); // "café"
    let (mbs, fid) = m.get_mbs(&mut reg).unwrap().unwrap();
    assert_eq!(mbs, b"caf\xe9");
    assert_eq!(fid, Fidelity::Exact);
    let (utf8, fid) = m.get_utf8(&mut reg).unwrap().unwrap();
    assert_eq!(utf8, "café".as_bytes());
    assert_eq!(fid, Fidelity::Exact);
}

#[test]
fn lossy_read_delivers_value_without_caching_it() {
    let mut reg = ConversionRegistry::with_locale(Locale::with_charset("windows-1252"));
    let mut m = MultiString::new();
    // U+2192 has no windows-1252 mapping.
    m.set_utf8("a\u{2192}b".as_bytes()).unwrap();
    let (mbs, fid) = m.get_mbs(&mut reg).unwrap().unwrap();
    assert_eq!(mbs, b"a?b");
    assert_eq!(fid, Fidelity::Lossy);
    assert!(!m.forms().contains(Forms::MBS));
    // The next read converts again rather than serving the substitute.
    let (mbs, fid) = m.get_mbs(&mut reg).unwrap().unwrap();
    assert_eq!(mbs, b"a?b");
    assert_eq!(fid, Fidelity::Lossy);
}

#[test]
fn update_utf8_populates_every_form_eagerly() {
    let mut reg = ConversionRegistry::with_locale(Locale::with_charset("windows-1252"));
    let mut m = MultiString::new();
    let fid = m.update_utf8(&mut reg, "héllo".as_bytes()).unwrap();
    assert_eq!(fid, Fidelity::Exact);
    assert_eq!(m.forms(), Forms::UTF8 | Forms::MBS | Forms::WCS);
}

#[test]
fn update_utf8_reports_failure_but_keeps_what_succeeded() {
    let mut reg = ConversionRegistry::with_locale(Locale::with_charset("windows-1252"));
    let mut m = MultiString::new();
    let fid = m.update_utf8(&mut reg, "a\u{2192}b".as_bytes()).unwrap();
    assert_eq!(fid, Fidelity::Lossy);
    // UTF-8 itself is still valid and readable.
    assert_eq!(m.forms(), Forms::UTF8);
    let (utf8, fid) = m.get_utf8(&mut reg).unwrap().unwrap();
    assert_eq!(utf8, "a\u{2192}b".as_bytes());
    assert_eq!(fid, Fidelity::Exact);
}

#[test]
fn clear_drops_the_value() {
    let mut reg = ConversionRegistry::new();
    let mut m = MultiString::new();
    m.set_mbs(b"value").unwrap();
    m.clear();
    assert!(m.forms().is_empty());
    assert!(m.get_mbs(&mut reg).unwrap().is_none());
}
