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

use crate::buffer::{ByteBuffer, WideBuffer};

#[test]
fn starts_unallocated() {
    let b = ByteBuffer::new();
    assert_eq!(b.len(), 0);
    assert!(b.is_empty());
    assert_eq!(b.capacity(), 0);
    assert_eq!(b.as_bytes(), b"");
    assert_eq!(b.terminated(), b"");
}

#[test]
fn append_terminates() {
    let mut b = ByteBuffer::new();
    b.append(b"hello").unwrap();
    assert_eq!(b.len(), 5);
    assert_eq!(b.as_bytes(), b"hello");
    assert_eq!(b.terminated(), b"hello\0");
    b.append(b", world").unwrap();
    assert_eq!(b.as_bytes(), b"hello, world");
    assert_eq!(b.terminated().last(), Some(&0));
}

#[test]
fn first_growth_reserves_minimum() {
    let mut b = ByteBuffer::new();
    b.push(b'x').unwrap();
    assert!(b.capacity() >= 32);
}

#[test]
fn growth_is_amortized() {
    let mut b = ByteBuffer::new();
    let mut caps = Vec::new();
    for _ in 0..4096 {
        b.push(b'a').unwrap();
        if caps.last() != Some(&b.capacity()) {
            caps.push(b.capacity());
        }
    }
    // Doubling from 32 reaches 4096+ in a handful of steps.
    assert!(caps.len() <= 9, "reallocated {} times: {:?}", caps.len(), caps);
    assert_eq!(b.len(), 4096);
    assert_eq!(b.terminated().last(), Some(&0));
}

#[test]
fn large_buffers_grow_by_quarter() {
    let mut b = ByteBuffer::new();
    b.ensure(8192).unwrap();
    let cap = b.capacity();
    assert!(cap >= 8192);
    b.ensure(cap + 1).unwrap();
    assert!(b.capacity() >= cap + cap / 4);
}

#[test]
fn clear_keeps_capacity() {
    let mut b = ByteBuffer::new();
    b.append(b"abcdef").unwrap();
    let cap = b.capacity();
    b.clear();
    assert_eq!(b.len(), 0);
    assert_eq!(b.capacity(), cap);
    assert_eq!(b.terminated(), b"\0");
}

#[test]
fn free_releases_everything() {
    let mut b = ByteBuffer::new();
    b.append(b"abcdef").unwrap();
    b.free();
    assert_eq!(b.len(), 0);
    assert_eq!(b.capacity(), 0);
    assert_eq!(b.terminated(), b"");
}

#[test]
fn wide_units_terminate_too() {
    let mut w = WideBuffer::new();
    w.append(&[0x41, 0x10000, 0x10FFFF]).unwrap();
    assert_eq!(w.len(), 3);
    assert_eq!(w.as_units(), &[0x41, 0x10000, 0x10FFFF]);
    assert_eq!(w.terminated(), &[0x41, 0x10000, 0x10FFFF, 0]);
}

#[test]
fn eq_ignores_capacity() {
    let mut a = ByteBuffer::new();
    let mut b = ByteBuffer::new();
    a.append(b"same").unwrap();
    b.ensure(1024).unwrap();
    b.append(b"same").unwrap();
    assert_eq!(a, b);
}
