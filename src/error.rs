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
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// A buffer could not grow to the requested number of units, either
    /// because the growth arithmetic overflowed or because the allocator
    /// refused the request. The affected buffer has been reset to empty.
    #[error("Out of memory: cannot grow buffer to {0} units")]
    OutOfMemory(usize),

    /// No conversion path exists between the two charsets and best-effort
    /// was not requested.
    #[error("Unsupported conversion from {from} to {to}")]
    Unsupported { from: String, to: String },

    /// A charset name was not recognized by the conversion backend.
    #[error("Invalid charset name: {0}")]
    InvalidCharset(String),
}

pub type Result<T> = std::result::Result<T, Error>;
