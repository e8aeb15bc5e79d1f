// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Reference Interface Library: AT command formatting and response parsing.
//!
//! This crate is the byte-level core of a GSM/GPRS modem driver. It contains
//! two cooperating engines over a single piece of shared state:
//!
//! - the **Cmd engine** ([`cmd`] module) formats outbound AT commands one
//!   byte at a time, including a printf-like mini-language with modem
//!   conversions (quoted strings with escape policies, fixed-width hex, AT
//!   prefix composition);
//! - the **Rsp engine** ([`rsp`] module) parses inbound response bytes with
//!   a scanf-like mini-language, pattern-matched character classes, line
//!   framing, final-result classification (`OK`, `ERROR`, `ABORT`,
//!   `+CME ERROR`, `+CMS ERROR`), and a prefix matcher over sorted string
//!   alternatives ([`stra`] module) for enumerated parameters.
//!
//! The crate does no I/O of its own: bytes move through a caller-supplied
//! [`Port`]. There is no allocation; look-ahead lives in a fixed buffer
//! whose capacity is the `BUF` parameter of [`Ril`], and string-valued
//! results land in caller-owned [`Capture`] buffers.
//!
//! # Error model
//!
//! Primitives do not return `Result`. Each one returns a byte count, and a
//! failure records a sticky [`Error`] in the state: once set, every further
//! primitive is a no-op returning zero until the caller clears it. This
//! makes command/response sequences chainable without per-call checks; the
//! owning layer inspects [`Ril::result`] once, at the end of a transaction.
//! The only exceptions are the non-destructive `rsp_match_*` predicates,
//! which report their outcome through the return value alone.
//!
//! # Concurrency
//!
//! `Ril` is a plain state machine driven synchronously by its owner. It is
//! not re-entrant and must not be shared across threads without external
//! mutual exclusion. [`Port::recv`] is the only suspension point.

#![cfg_attr(not(test), no_std)]

pub mod cmd;
pub mod pattern;
pub mod rsp;
pub mod stra;

#[cfg(test)]
pub(crate) mod sim;

pub use cmd::CmdArg;
pub use pattern::CharClass;
pub use rsp::RspArg;
pub use stra::Alternative;

use tinyvec::ArrayVec;

/// Failure kinds recorded in the sticky error slot.
///
/// The set is closed and the discriminants are stable; upper layers use
/// them to decide between retrying a command, resetting the modem, and
/// reporting a connectivity fault. Whether a given kind is fatal is the
/// caller's policy, not this crate's.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum Error {
    /// An argument to a primitive was out of range or of the wrong type
    /// (format mini-language dispatch, hex width, bounds).
    BadParameter = 1,
    /// The transport rejected an outbound byte.
    CmdWrite = 2,
    /// The look-ahead buffer filled up without the current primitive
    /// reaching a decision.
    ReadOverflow = 3,
    /// The transport reported that the operation deadline passed.
    ReadTimeout = 4,
    /// The transport failed outright.
    ReadGeneral = 5,
    /// Expected byte not found.
    RspChar = 6,
    /// Expected a byte from a character class and found none.
    RspCharp = 7,
    /// Malformed command echo.
    RspEcho = 8,
    /// Expected `\r\n`.
    RspEol = 9,
    /// Final response was `ABORT`.
    RspFinalAbort = 10,
    /// Final response was `+CME ERROR`; the code is in [`Ril::cm_err`].
    RspFinalCme = 11,
    /// Final response was `+CMS ERROR`; the code is in [`Ril::cm_err`].
    RspFinalCms = 12,
    /// Final response was `ERROR`.
    RspFinalError = 13,
    /// Final response was not recognized; nothing was consumed.
    RspFinalUnknown = 14,
    /// Expected hexadecimal digits and found none.
    RspHex = 15,
    /// Expected a (signed) integer and found no digits.
    RspInt = 16,
    /// A fixed-literal line did not match.
    RspLine = 17,
    /// A dumped line was not terminated by `\r\n`.
    RspLineDump = 18,
    /// A `<command>: <value>` response did not match.
    RspQuery = 19,
    /// A literal byte string did not match.
    RspStr = 20,
    /// No string alternative survived the consumed prefix.
    RspStraNone = 21,
    /// A caller-owned capture buffer overflowed.
    RspStraOverflow = 22,
    /// Input ended while every surviving alternative still had unmatched
    /// text.
    RspStraUnderflow = 23,
    /// Bad bound for a length-limited class run.
    RspStrpn = 24,
    /// Opening quote missing.
    RspStrqqeBegin = 25,
    /// Closing quote missing.
    RspStrqqeEnd = 26,
    /// Unusable quote specification (NUL quote, or quote equal to escape).
    RspStrqqeNoQuotes = 27,
    /// Expected an unsigned integer and found no digits.
    RspUint = 28,
}

/// Error returned when a [`Port`] cannot accept an outbound byte.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct SendError;

/// Outcome of a single [`Port::recv`] poll.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Rx {
    /// One byte arrived.
    Byte(u8),
    /// No byte yet; poll again. The armed deadline is still running.
    Pending,
    /// The armed deadline passed without a byte arriving.
    Expired,
    /// The transport failed in a way that won't resolve by polling.
    Failed,
}

/// The byte transport underneath the two engines.
///
/// This is the only boundary toward hardware. Implementations typically
/// wrap a UART; tests wrap an in-memory script.
///
/// # Deadline convention
///
/// The first `recv` call of an operation carries a nonzero `timeout_ms`,
/// which arms the deadline; the engine's follow-up polls pass `0`, which
/// inherits it. The transport owns the clock: it answers [`Rx::Pending`]
/// while the deadline is running and [`Rx::Expired`] once it has passed.
pub trait Port {
    /// Accepts one outbound byte, blocking until the transport takes it.
    fn send(&mut self, byte: u8) -> Result<(), SendError>;

    /// Polls for one inbound byte under the deadline convention above.
    fn recv(&mut self, timeout_ms: u32) -> Rx;
}

/// A caller-owned capture buffer for string-valued response fields.
///
/// `Capture` borrows a scratch slice and tracks how much of it is filled.
/// The parsing primitives append to it; if they run past the end of the
/// slice the transaction fails with [`Error::RspStraOverflow`]. Nothing
/// here allocates.
pub struct Capture<'a> {
    buf: &'a mut [u8],
    len: usize,
}

impl<'a> Capture<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, len: 0 }
    }

    /// The filled prefix of the underlying slice.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }

    pub(crate) fn push(&mut self, byte: u8) -> Result<(), Error> {
        if self.len == self.buf.len() {
            return Err(Error::RspStraOverflow);
        }
        self.buf[self.len] = byte;
        self.len += 1;
        Ok(())
    }
}

/// Shared state of the Cmd and Rsp engines.
///
/// `P` is the byte transport; `BUF` is the capacity of the read-ahead
/// buffer, which bounds how far any single parsing decision can look
/// ahead (and therefore the longest literal the `rsp_match_*` family can
/// test).
///
/// A `Ril` lives for the life of the link. Each AT command is a
/// transaction over it: the owner clears the sticky error, formats the
/// command, drains the echo, parses the response, consumes the final
/// line, and then reads [`Ril::result`] once.
pub struct Ril<P, const BUF: usize> {
    port: P,
    /// Sticky first-error. `None` means the transaction is still healthy.
    error: Option<Error>,
    /// Numeric code from `+CME ERROR`/`+CMS ERROR`; meaningful only when
    /// `error` is `RspFinalCme`/`RspFinalCms`.
    cm_err: u32,
    /// Per-operation deadline in milliseconds, passed to the transport by
    /// the first poll of each parsing primitive.
    timeout: u32,
    /// Whether the current operation has already armed its deadline.
    armed: bool,
    /// Read-ahead buffer. `buf[index..]` is the unconsumed look-ahead.
    buf: ArrayVec<[u8; BUF]>,
    /// Cursor of the next unread byte within `buf`.
    index: usize,
}

impl<P: Port, const BUF: usize> Ril<P, BUF> {
    pub fn new(port: P) -> Self {
        Self {
            port,
            error: None,
            cm_err: 0,
            timeout: 0,
            armed: false,
            buf: ArrayVec::new(),
            index: 0,
        }
    }

    pub fn port(&self) -> &P {
        &self.port
    }

    pub fn port_mut(&mut self) -> &mut P {
        &mut self.port
    }

    pub fn into_port(self) -> P {
        self.port
    }

    /// Sets the deadline, in milliseconds, armed by each subsequent
    /// parsing operation. Zero leaves the transport's default behavior.
    pub fn set_timeout(&mut self, ms: u32) {
        self.timeout = ms;
    }

    pub fn timeout(&self) -> u32 {
        self.timeout
    }

    /// The sticky error, if one has been recorded.
    pub fn error(&self) -> Option<Error> {
        self.error
    }

    /// The modem-reported error code from the last `+CME ERROR: n` or
    /// `+CMS ERROR: n` final line.
    pub fn cm_err(&self) -> u32 {
        self.cm_err
    }

    /// Clears the sticky error. Owners call this at the start of each
    /// transaction; nothing in this crate clears it implicitly except
    /// [`Ril::rsp_flush`].
    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// Maps the sticky error into a `Result`, without clearing it.
    pub fn result(&self) -> Result<(), Error> {
        match self.error {
            None => Ok(()),
            Some(e) => Err(e),
        }
    }

    /// Records `e` unless an earlier error is already present. The first
    /// failure of a transaction is the one that gets reported.
    pub(crate) fn set_error(&mut self, e: Error) {
        if self.error.is_none() {
            self.error = Some(e);
        }
    }

    pub(crate) fn set_cm_err(&mut self, code: u32) {
        self.cm_err = code;
    }

    /// Returns the byte under the cursor, pulling one from the transport
    /// if the look-ahead is exhausted. Does not advance.
    pub(crate) fn peek(&mut self) -> Result<u8, Error> {
        if self.index == self.buf.len() {
            if self.buf.len() == BUF {
                return Err(Error::ReadOverflow);
            }
            let byte = self.fill()?;
            self.buf.push(byte);
        }
        Ok(self.buf[self.index])
    }

    /// Pulls one byte from the transport, honoring the deadline
    /// convention: the first poll of an operation passes the configured
    /// timeout, later polls pass zero and inherit it.
    fn fill(&mut self) -> Result<u8, Error> {
        loop {
            let timeout = if self.armed { 0 } else { self.timeout };
            self.armed = true;
            match self.port.recv(timeout) {
                Rx::Byte(b) => return Ok(b),
                Rx::Pending => continue,
                Rx::Expired => return Err(Error::ReadTimeout),
                Rx::Failed => return Err(Error::ReadGeneral),
            }
        }
    }

    pub(crate) fn advance(&mut self) {
        self.index += 1;
    }

    pub(crate) fn take(&mut self) -> Result<u8, Error> {
        let byte = self.peek()?;
        self.advance();
        Ok(byte)
    }

    /// Discards everything up to the cursor. This is what makes a
    /// primitive "consuming": after a commit the discarded bytes cannot be
    /// re-examined, whereas the `rsp_match_*` family only advances the
    /// cursor and leaves the bytes in the look-ahead.
    pub(crate) fn commit(&mut self) {
        let remaining = self.buf.len() - self.index;
        self.buf.copy_within(self.index.., 0);
        self.buf.truncate(remaining);
        self.index = 0;
    }

    pub(crate) fn cursor(&self) -> usize {
        self.index
    }

    pub(crate) fn rewind(&mut self, mark: usize) {
        self.index = mark;
    }

    /// Marks the start of a public parsing primitive: the next transport
    /// poll arms a fresh deadline.
    pub(crate) fn begin_op(&mut self) {
        self.armed = false;
    }
}
