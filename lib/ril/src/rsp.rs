// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Response parsing: the inbound half of the engine.
//!
//! All primitives read through the bounded look-ahead in [`Ril`]. They
//! come in two families:
//!
//! - **consuming** primitives (`rsp_char`, `rsp_uint`, `rsp_line`, ...)
//!   either succeed -- discarding what they matched and returning the byte
//!   count -- or fail, restoring the cursor, recording a sticky
//!   [`Error`], and returning zero;
//! - **matching** primitives (`rsp_match_*`) are predicates. They advance
//!   the cursor over what they matched but leave the bytes in the
//!   look-ahead, report the outcome through the return value alone, and
//!   never record an error. A read timeout during a match is a mismatch.
//!
//! A read timeout during a consuming primitive is reported as that
//! primitive's own kind where it has one (a missing closing quote is
//! `RspStrqqeEnd`, not a bare timeout); greedy class runs and completed
//! numeric scans just end at a timeout.
//!
//! Two operations bend the count convention deliberately:
//! [`Ril::rsp_final`] consumes and counts a recognized error line while
//! recording its classification, and [`Ril::rsp_flush`] clears the sticky
//! error, because it is the between-transactions reset.
//!
//! [`Ril::rsp_scanf`] drives these primitives from a format string; see
//! [`RspArg`].

use crate::pattern::CharClass;
use crate::{Capture, Error, Port, Ril, Rx};

/// One argument slot for [`Ril::rsp_scanf`].
///
/// Inputs (`Byte`, `Bytes`, `Pattern`, `Len`) parameterize conversions;
/// the `&mut` variants receive parsed values. A missing or wrongly-typed
/// slot fails the transaction with [`Error::BadParameter`]. Surplus slots
/// are ignored.
pub enum RspArg<'a, 'b> {
    /// An expected byte, for `%c` and quote placeholders.
    Byte(u8),
    /// An expected literal, for `%s`.
    Bytes(&'a [u8]),
    /// A character-class pattern, for the `/` conversions.
    Pattern(&'a [u8]),
    /// A length bound, for `#`.
    Len(usize),
    /// Receives `%d`.
    Int(&'a mut i32),
    /// Receives `%u` and `%x`.
    Uint(&'a mut u32),
    /// Receives captured string content.
    Str(&'a mut Capture<'b>),
}

type Args<'i, 'a, 'b> = core::slice::IterMut<'i, RspArg<'a, 'b>>;

fn arg_byte(args: &mut Args<'_, '_, '_>) -> Result<u8, Error> {
    match args.next() {
        Some(RspArg::Byte(b)) => Ok(*b),
        _ => Err(Error::BadParameter),
    }
}

fn arg_bytes<'a>(args: &mut Args<'_, 'a, '_>) -> Result<&'a [u8], Error> {
    match args.next() {
        Some(RspArg::Bytes(s)) => Ok(*s),
        _ => Err(Error::BadParameter),
    }
}

fn arg_pattern<'a>(args: &mut Args<'_, 'a, '_>) -> Result<&'a [u8], Error> {
    match args.next() {
        Some(RspArg::Pattern(p)) => Ok(*p),
        _ => Err(Error::BadParameter),
    }
}

fn arg_len(args: &mut Args<'_, '_, '_>) -> Result<usize, Error> {
    match args.next() {
        Some(RspArg::Len(n)) => Ok(*n),
        _ => Err(Error::BadParameter),
    }
}

fn arg_int<'i>(args: &mut Args<'i, '_, '_>) -> Result<&'i mut i32, Error> {
    match args.next() {
        Some(RspArg::Int(out)) => Ok(&mut **out),
        _ => Err(Error::BadParameter),
    }
}

fn arg_uint<'i>(args: &mut Args<'i, '_, '_>) -> Result<&'i mut u32, Error> {
    match args.next() {
        Some(RspArg::Uint(out)) => Ok(&mut **out),
        _ => Err(Error::BadParameter),
    }
}

fn arg_str<'i, 'b>(
    args: &mut Args<'i, '_, 'b>,
) -> Result<&'i mut Capture<'b>, Error> {
    match args.next() {
        Some(RspArg::Str(out)) => Ok(&mut **out),
        _ => Err(Error::BadParameter),
    }
}

/// Resolves a quote placeholder the same way the Cmd engine does: `"`
/// names itself, anything else draws the quote from the arguments.
fn quote(placeholder: u8, args: &mut Args<'_, '_, '_>) -> Result<u8, Error> {
    if placeholder == b'"' {
        Ok(b'"')
    } else {
        arg_byte(args)
    }
}

/// Swaps a transport timeout for the failing primitive's own kind.
fn kindify(e: Error, kind: Error) -> Error {
    match e {
        Error::ReadTimeout => kind,
        other => other,
    }
}

impl<P: Port, const BUF: usize> Ril<P, BUF> {
    //
    // === Primitive harness ===
    //

    /// Runs a consuming primitive: commit what the body matched, or
    /// restore the cursor and record the failure.
    fn consuming(
        &mut self,
        op: impl FnOnce(&mut Self) -> Result<usize, Error>,
    ) -> usize {
        if self.error().is_some() {
            return 0;
        }
        self.begin_op();
        let mark = self.cursor();
        match op(self) {
            Ok(n) => {
                self.commit();
                n
            }
            Err(e) => {
                self.rewind(mark);
                self.set_error(e);
                0
            }
        }
    }

    /// Runs a matching primitive: keep the cursor advance on a match,
    /// restore it on a mismatch, and treat a timeout as a mismatch.
    fn matching(
        &mut self,
        op: impl FnOnce(&mut Self) -> Result<usize, Error>,
    ) -> usize {
        if self.error().is_some() {
            return 0;
        }
        self.begin_op();
        let mark = self.cursor();
        match op(self) {
            Ok(0) => {
                self.rewind(mark);
                0
            }
            Ok(n) => n,
            Err(Error::ReadTimeout) => {
                self.rewind(mark);
                0
            }
            Err(e) => {
                self.rewind(mark);
                self.set_error(e);
                0
            }
        }
    }

    //
    // === Raw bodies (shared between primitives, scanf, and framing) ===
    //

    /// Consumes `lit` byte for byte; any divergence (or timeout) is
    /// reported as `kind`.
    fn raw_lit(&mut self, lit: &[u8], kind: Error) -> Result<usize, Error> {
        for &want in lit {
            match self.peek() {
                Ok(got) if got == want => self.advance(),
                Ok(_) => return Err(kind),
                Err(e) => return Err(kindify(e, kind)),
            }
        }
        Ok(lit.len())
    }

    /// Advances over `lit` if it is next in full; restores the cursor and
    /// answers `false` otherwise. A timeout mid-literal is a mismatch.
    fn raw_match_str(&mut self, lit: &[u8]) -> Result<bool, Error> {
        let mark = self.cursor();
        for &want in lit {
            match self.peek() {
                Ok(got) if got == want => self.advance(),
                Ok(_) | Err(Error::ReadTimeout) => {
                    self.rewind(mark);
                    return Ok(false);
                }
                Err(e) => {
                    self.rewind(mark);
                    return Err(e);
                }
            }
        }
        Ok(true)
    }

    fn raw_match_eol(&mut self) -> Result<bool, Error> {
        self.raw_match_str(b"\r\n")
    }

    /// Skips up to, but not over, the next `c`. Returns the skip count.
    fn raw_seek(&mut self, c: u8) -> Result<usize, Error> {
        let mut n = 0;
        loop {
            if self.peek()? == c {
                return Ok(n);
            }
            self.advance();
            n += 1;
        }
    }

    /// Unsigned decimal run. At least one digit, else `kind`; a timeout
    /// after the first digit ends the run.
    fn raw_decimal(&mut self, kind: Error) -> Result<(u32, usize), Error> {
        let mut value: u32 = 0;
        let mut n = 0;
        loop {
            match self.peek() {
                Ok(b @ b'0'..=b'9') => {
                    value = value
                        .wrapping_mul(10)
                        .wrapping_add(u32::from(b - b'0'));
                    self.advance();
                    n += 1;
                }
                Ok(_) => break,
                Err(Error::ReadTimeout) if n > 0 => break,
                Err(e) => return Err(kindify(e, kind)),
            }
        }
        if n == 0 {
            Err(kind)
        } else {
            Ok((value, n))
        }
    }

    fn raw_uint(&mut self) -> Result<(u32, usize), Error> {
        self.raw_decimal(Error::RspUint)
    }

    /// Optional `+`/`-`, then digits.
    fn raw_int(&mut self) -> Result<(i32, usize), Error> {
        let mut negative = false;
        let mut n = 0;
        match self.peek() {
            Ok(b'-') => {
                negative = true;
                self.advance();
                n += 1;
            }
            Ok(b'+') => {
                self.advance();
                n += 1;
            }
            Ok(_) => {}
            Err(e) => return Err(kindify(e, Error::RspInt)),
        }
        let (mag, digits) = self.raw_decimal(Error::RspInt)?;
        let value = if negative {
            (mag as i32).wrapping_neg()
        } else {
            mag as i32
        };
        Ok((value, n + digits))
    }

    /// Hex digit run, case-insensitive.
    fn raw_hex(&mut self) -> Result<(u32, usize), Error> {
        let mut value: u32 = 0;
        let mut n = 0;
        loop {
            let digit = match self.peek() {
                Ok(b @ b'0'..=b'9') => b - b'0',
                Ok(b @ b'a'..=b'f') => b - b'a' + 10,
                Ok(b @ b'A'..=b'F') => b - b'A' + 10,
                Ok(_) => break,
                Err(Error::ReadTimeout) if n > 0 => break,
                Err(e) => return Err(kindify(e, Error::RspHex)),
            };
            value = value.wrapping_shl(4) | u32::from(digit);
            self.advance();
            n += 1;
        }
        if n == 0 {
            Err(Error::RspHex)
        } else {
            Ok((value, n))
        }
    }

    /// Greedy run of class bytes, optionally bounded, optionally
    /// captured. A timeout ends the run.
    fn raw_strp(
        &mut self,
        class: CharClass<'_>,
        limit: Option<usize>,
        mut out: Option<&mut Capture<'_>>,
    ) -> Result<usize, Error> {
        if let Some(out) = out.as_mut() {
            out.clear();
        }
        let mut n = 0;
        loop {
            if limit.is_some_and(|max| n == max) {
                break;
            }
            match self.peek() {
                Ok(b) if class.contains(b) => {
                    if let Some(out) = out.as_mut() {
                        out.push(b)?;
                    }
                    self.advance();
                    n += 1;
                }
                Ok(_) | Err(Error::ReadTimeout) => break,
                Err(e) => return Err(e),
            }
        }
        Ok(n)
    }

    /// Quoted string: opening quote, content, closing quote. With an
    /// escape byte, an escaped byte is captured literally and cannot
    /// close the string; the capture receives the *unescaped* content, so
    /// `cmd_strqe` round-trips through this.
    fn raw_quoted(
        &mut self,
        quote_begin: u8,
        quote_end: u8,
        escape: Option<u8>,
        mut out: Option<&mut Capture<'_>>,
    ) -> Result<usize, Error> {
        if quote_begin == 0 || quote_end == 0 {
            return Err(Error::RspStrqqeNoQuotes);
        }
        if escape.is_some_and(|e| e == quote_begin || e == quote_end) {
            return Err(Error::RspStrqqeNoQuotes);
        }
        if let Some(out) = out.as_mut() {
            out.clear();
        }
        match self.peek() {
            Ok(b) if b == quote_begin => self.advance(),
            Ok(_) => return Err(Error::RspStrqqeBegin),
            Err(e) => return Err(kindify(e, Error::RspStrqqeBegin)),
        }
        let mut n = 1;
        loop {
            let b = match self.take() {
                Ok(b) => b,
                Err(e) => return Err(kindify(e, Error::RspStrqqeEnd)),
            };
            n += 1;
            if b == quote_end {
                return Ok(n);
            }
            let content = if escape == Some(b) {
                let escaped = match self.take() {
                    Ok(b) => b,
                    Err(e) => return Err(kindify(e, Error::RspStrqqeEnd)),
                };
                n += 1;
                escaped
            } else {
                b
            };
            if let Some(out) = out.as_mut() {
                out.push(content)?;
            }
        }
    }

    //
    // === Bytes ===
    //

    /// Predicate form of [`Ril::rsp_char`].
    pub fn rsp_match_char(&mut self, c: u8) -> usize {
        self.matching(|s| {
            Ok(if s.peek()? == c {
                s.advance();
                1
            } else {
                0
            })
        })
    }

    /// Consumes exactly `c`.
    pub fn rsp_char(&mut self, c: u8) -> usize {
        self.consuming(|s| {
            match s.peek() {
                Ok(got) if got == c => {
                    s.advance();
                    Ok(1)
                }
                Ok(_) => Err(Error::RspChar),
                Err(e) => Err(kindify(e, Error::RspChar)),
            }
        })
    }

    /// Predicate form of [`Ril::rsp_charp`].
    pub fn rsp_match_charp(&mut self, pattern: &[u8]) -> usize {
        let class = CharClass::new(pattern);
        self.matching(|s| {
            Ok(if class.contains(s.peek()?) {
                s.advance();
                1
            } else {
                0
            })
        })
    }

    /// Consumes one byte belonging to `pattern`.
    pub fn rsp_charp(&mut self, pattern: &[u8]) -> usize {
        let class = CharClass::new(pattern);
        self.consuming(|s| {
            match s.peek() {
                Ok(b) if class.contains(b) => {
                    s.advance();
                    Ok(1)
                }
                Ok(_) => Err(Error::RspCharp),
                Err(e) => Err(kindify(e, Error::RspCharp)),
            }
        })
    }

    /// Advances the cursor up to, but not over, the next `c`, leaving
    /// everything in the look-ahead. Returns the number of bytes skipped.
    pub fn rsp_seek_char(&mut self, c: u8) -> usize {
        if self.error().is_some() {
            return 0;
        }
        self.begin_op();
        let mark = self.cursor();
        match self.raw_seek(c) {
            Ok(n) => n,
            Err(e) => {
                self.rewind(mark);
                self.set_error(e);
                0
            }
        }
    }

    /// Consumes exactly `n` bytes into `out`.
    pub fn rsp_charn(&mut self, n: usize, out: &mut Capture<'_>) -> usize {
        self.consuming(|s| {
            out.clear();
            for _ in 0..n {
                let b = match s.take() {
                    Ok(b) => b,
                    Err(e) => return Err(kindify(e, Error::RspCharp)),
                };
                out.push(b)?;
            }
            Ok(n)
        })
    }

    //
    // === Numbers ===
    //

    /// Consumes an unsigned decimal into `out`.
    pub fn rsp_uint(&mut self, out: &mut u32) -> usize {
        self.consuming(|s| {
            let (value, n) = s.raw_uint()?;
            *out = value;
            Ok(n)
        })
    }

    /// Consumes a decimal with optional `+`/`-` into `out`.
    pub fn rsp_int(&mut self, out: &mut i32) -> usize {
        self.consuming(|s| {
            let (value, n) = s.raw_int()?;
            *out = value;
            Ok(n)
        })
    }

    /// Consumes hex digits (either case) into `out`.
    pub fn rsp_hex(&mut self, out: &mut u32) -> usize {
        self.consuming(|s| {
            let (value, n) = s.raw_hex()?;
            *out = value;
            Ok(n)
        })
    }

    //
    // === Strings ===
    //

    /// Consumes `lit`, byte for byte.
    pub fn rsp_str(&mut self, lit: &[u8]) -> usize {
        self.consuming(|s| s.raw_lit(lit, Error::RspStr))
    }

    /// Predicate form of [`Ril::rsp_str`]: advances over `lit` only if it
    /// matches in full.
    pub fn rsp_match_str(&mut self, lit: &[u8]) -> usize {
        self.matching(|s| {
            Ok(if s.raw_match_str(lit)? {
                lit.len()
            } else {
                0
            })
        })
    }

    /// Consumes a greedy run of `pattern` bytes into `out`.
    pub fn rsp_strp(&mut self, pattern: &[u8], out: &mut Capture<'_>) -> usize {
        let class = CharClass::new(pattern);
        self.consuming(|s| s.raw_strp(class, None, Some(out)))
    }

    /// Like [`Ril::rsp_strp`], bounded to `n` bytes. The bound must fit
    /// the capture.
    pub fn rsp_strpn(
        &mut self,
        pattern: &[u8],
        n: usize,
        out: &mut Capture<'_>,
    ) -> usize {
        let class = CharClass::new(pattern);
        self.consuming(|s| {
            if n > out.capacity() {
                return Err(Error::RspStrpn);
            }
            s.raw_strp(class, Some(n), Some(out))
        })
    }

    /// Predicate form of [`Ril::rsp_strp`]: advances over the run and
    /// returns its length without capturing.
    pub fn rsp_match_strp(&mut self, pattern: &[u8]) -> usize {
        let class = CharClass::new(pattern);
        self.matching(|s| s.raw_strp(class, None, None))
    }

    /// Bounded predicate run.
    pub fn rsp_match_strpn(&mut self, pattern: &[u8], n: usize) -> usize {
        let class = CharClass::new(pattern);
        self.matching(|s| s.raw_strp(class, Some(n), None))
    }

    /// Consumes `quote content quote` into `out`.
    pub fn rsp_strq(&mut self, q: u8, out: &mut Capture<'_>) -> usize {
        self.consuming(|s| s.raw_quoted(q, q, None, Some(out)))
    }

    /// Consumes a quoted string with escaping: inside the quotes, a byte
    /// preceded by `escape` is taken literally. `out` receives the
    /// unescaped content.
    pub fn rsp_strqe(&mut self, q: u8, escape: u8, out: &mut Capture<'_>) -> usize {
        self.consuming(|s| s.raw_quoted(q, q, Some(escape), Some(out)))
    }

    /// Asymmetric-quote form of [`Ril::rsp_strq`].
    pub fn rsp_strqq(
        &mut self,
        quote_begin: u8,
        quote_end: u8,
        out: &mut Capture<'_>,
    ) -> usize {
        self.consuming(|s| s.raw_quoted(quote_begin, quote_end, None, Some(out)))
    }

    /// Asymmetric-quote form of [`Ril::rsp_strqe`].
    pub fn rsp_strqqe(
        &mut self,
        quote_begin: u8,
        quote_end: u8,
        escape: u8,
        out: &mut Capture<'_>,
    ) -> usize {
        self.consuming(|s| {
            s.raw_quoted(quote_begin, quote_end, Some(escape), Some(out))
        })
    }

    //
    // === Line framing ===
    //

    /// Consumes `\r\n` exactly.
    pub fn rsp_eol(&mut self) -> usize {
        self.consuming(|s| s.raw_lit(b"\r\n", Error::RspEol))
    }

    /// Predicate form of [`Ril::rsp_eol`].
    pub fn rsp_match_eol(&mut self) -> usize {
        self.matching(|s| Ok(if s.raw_match_eol()? { 2 } else { 0 }))
    }

    /// Consumes `lit` followed by `\r\n`.
    pub fn rsp_line(&mut self, lit: &[u8]) -> usize {
        self.consuming(|s| {
            let mut n = s.raw_lit(lit, Error::RspLine)?;
            n += s.raw_lit(b"\r\n", Error::RspLine)?;
            Ok(n)
        })
    }

    /// Consumes the fixed line `OK\r\n`.
    pub fn rsp_line_ok(&mut self) -> usize {
        self.rsp_line(b"OK")
    }

    /// Consumes the fixed line `ERROR\r\n`.
    pub fn rsp_line_error(&mut self) -> usize {
        self.rsp_line(b"ERROR")
    }

    /// Consumes the fixed line `ABORT\r\n`.
    pub fn rsp_line_abort(&mut self) -> usize {
        self.rsp_line(b"ABORT")
    }

    /// Consumes and discards everything up to and including the next
    /// `\r\n`.
    pub fn rsp_line_dump(&mut self) -> usize {
        self.consuming(|s| {
            let n = s.raw_seek(b'\r')?;
            let eol = s.raw_lit(b"\r\n", Error::RspLineDump)?;
            Ok(n + eol)
        })
    }

    /// Skips the modem's echo of the last command: an optional empty line
    /// followed by an optional `AT...\r\n` line. Consumes whichever are
    /// present; if neither is, the input is not an echo and this fails
    /// with [`Error::RspEcho`].
    pub fn rsp_echo(&mut self) -> usize {
        self.consuming(|s| {
            let mut n = 0;
            if s.raw_match_eol()? {
                n += 2;
            }
            if s.raw_match_str(b"AT")? {
                n += 2;
                n += s.raw_seek(b'\r').map_err(|e| kindify(e, Error::RspEcho))?;
                n += s.raw_lit(b"\r\n", Error::RspEcho)?;
            } else if n == 0 {
                return Err(Error::RspEcho);
            }
            Ok(n)
        })
    }

    /// Drains buffered and pending bytes until the transport has nothing
    /// ready, returning the number discarded. Also clears the sticky
    /// error: flushing is the reset between transactions.
    pub fn rsp_flush(&mut self) -> usize {
        self.clear_error();
        let mut n = self.buf.len();
        self.buf.clear();
        self.index = 0;
        loop {
            match self.port_mut().recv(0) {
                Rx::Byte(_) => n += 1,
                Rx::Pending | Rx::Expired | Rx::Failed => break,
            }
        }
        n
    }

    //
    // === Final result ===
    //

    /// Classifies the next line as a final result.
    ///
    /// `OK` is the only success. `ERROR`, `ABORT`, `+CME ERROR: n`, and
    /// `+CMS ERROR: n` are consumed and counted *and* recorded as their
    /// sticky kinds (with `n` stored for the last two); an unrecognized
    /// line sets [`Error::RspFinalUnknown`] and consumes nothing.
    pub fn rsp_final(&mut self) -> usize {
        if self.error().is_some() {
            return 0;
        }
        self.begin_op();
        let mark = self.cursor();
        match self.classify_final() {
            Ok((n, verdict)) => {
                self.commit();
                if let Some(kind) = verdict {
                    self.set_error(kind);
                }
                n
            }
            Err(e) => {
                self.rewind(mark);
                self.set_error(e);
                0
            }
        }
    }

    fn classify_final(&mut self) -> Result<(usize, Option<Error>), Error> {
        if self.probe_line(b"OK")? {
            return Ok((4, None));
        }
        if self.probe_line(b"ERROR")? {
            return Ok((7, Some(Error::RspFinalError)));
        }
        if self.probe_line(b"ABORT")? {
            return Ok((7, Some(Error::RspFinalAbort)));
        }
        for (prefix, kind) in [
            (&b"+CME ERROR: "[..], Error::RspFinalCme),
            (&b"+CMS ERROR: "[..], Error::RspFinalCms),
        ] {
            if self.raw_match_str(prefix)? {
                // A recognized prefix with garbage after it is not a
                // final result we know; report it unrecognized and leave
                // the line alone.
                let (code, digits) = self
                    .raw_decimal(Error::RspFinalUnknown)
                    .map_err(|e| kindify(e, Error::RspFinalUnknown))?;
                self.raw_lit(b"\r\n", Error::RspFinalUnknown)?;
                self.set_cm_err(code);
                return Ok((prefix.len() + digits + 2, Some(kind)));
            }
        }
        Err(Error::RspFinalUnknown)
    }

    /// Matches `lit` followed by `\r\n`, advancing only on a full match.
    fn probe_line(&mut self, lit: &[u8]) -> Result<bool, Error> {
        let mark = self.cursor();
        if self.raw_match_str(lit)? && self.raw_match_eol()? {
            Ok(true)
        } else {
            self.rewind(mark);
            Ok(false)
        }
    }

    //
    // === Query ===
    //

    /// Consumes a `<cmd>: <value>` information response, storing the
    /// value.
    pub fn rsp_query(&mut self, cmd: &[u8], out: &mut i32) -> usize {
        self.consuming(|s| {
            if !s.raw_match_str(cmd)? {
                return Err(Error::RspQuery);
            }
            let mut n = cmd.len();
            n += s.raw_lit(b": ", Error::RspQuery)?;
            let (value, digits) = s.raw_int()?;
            *out = value;
            Ok(n + digits)
        })
    }

    //
    // === scanf ===
    //

    /// Scans input according to `fmt`, dispatching to the primitives
    /// above; the mirror image of [`Ril::cmd_printf`]. Literal format
    /// bytes must match the input. Returns the cumulative count of bytes
    /// consumed; on failure scanning stops where the sticky error was
    /// recorded.
    ///
    /// Conversions:
    ///
    /// | spec | consumes |
    /// |------|----------|
    /// | `%%` | a literal `%` |
    /// | `%$` | `\r\n` |
    /// | `%c` | the expected byte (`Byte`) |
    /// | `%<n>c`, `%#c` | exactly `n` bytes into `Str` (`Len` first if `#`) |
    /// | `%/c` | one byte of a class (`Pattern`) |
    /// | `%d` | a signed decimal into `Int` |
    /// | `%u` | an unsigned decimal into `Uint` |
    /// | `%x` | hex digits into `Uint` |
    /// | `%s` | an expected literal (`Bytes`) |
    /// | `%/s` | a greedy class run into `Str` (`Pattern` first) |
    /// | `%/#s` | a bounded class run (`Pattern`, `Len`, `Str`) |
    /// | `%"s`, `%'s`, `%'<e>s`, `%<q1><q2>s`, `%<q1><q2><e>s` | a quoted string into `Str`, quotes as in printf |
    ///
    /// A `*` right after the `%` discards the conversion's value: the
    /// bytes are consumed but no output slot is taken.
    pub fn rsp_scanf(&mut self, fmt: &[u8], args: &mut [RspArg<'_, '_>]) -> usize {
        if self.error().is_some() {
            return 0;
        }
        let mut args = args.iter_mut();
        let mut total = 0;
        let mut rest = fmt;
        while let Some((&b, tail)) = rest.split_first() {
            rest = tail;
            if b != b'%' {
                total += self.consuming(|s| s.raw_lit(&[b], Error::RspChar));
            } else {
                total += self.rsp_conversion(&mut rest, &mut args);
            }
            if self.error().is_some() {
                break;
            }
        }
        total
    }

    /// Parses and runs one conversion; `rest` starts just past the `%`.
    /// Returns the bytes consumed, recording any failure as sticky.
    fn rsp_conversion(
        &mut self,
        rest: &mut &[u8],
        args: &mut Args<'_, '_, '_>,
    ) -> usize {
        let mut discard = false;
        let mut class = false;
        let mut len_from_arg = false;
        let mut width: Option<usize> = None;

        loop {
            let Some((&b, tail)) = rest.split_first() else {
                self.set_error(Error::BadParameter);
                return 0;
            };
            match b {
                b'%' if !discard && !class && width.is_none() => {
                    *rest = tail;
                    return self.consuming(|s| s.raw_lit(b"%", Error::RspChar));
                }
                b'$' if !discard && !class && width.is_none() => {
                    *rest = tail;
                    return self.consuming(|s| s.raw_lit(b"\r\n", Error::RspEol));
                }
                b'*' if !discard && !class && width.is_none() => {
                    discard = true;
                    *rest = tail;
                }
                b'/' if !class && width.is_none() && !len_from_arg => {
                    class = true;
                    *rest = tail;
                }
                b'#' if !len_from_arg && width.is_none() => {
                    len_from_arg = true;
                    *rest = tail;
                }
                b'0'..=b'9' if !len_from_arg => {
                    width = Some(width.unwrap_or(0) * 10 + (b - b'0') as usize);
                    *rest = tail;
                }
                b'c' => {
                    *rest = tail;
                    return self.rsp_char_conversion(
                        discard,
                        class,
                        len_from_arg,
                        width,
                        args,
                    );
                }
                b'd' => {
                    *rest = tail;
                    let mut scratch = 0;
                    let out = if discard {
                        &mut scratch
                    } else {
                        match arg_int(args) {
                            Ok(out) => out,
                            Err(e) => {
                                self.set_error(e);
                                return 0;
                            }
                        }
                    };
                    return self.consuming(|s| {
                        let (value, n) = s.raw_int()?;
                        *out = value;
                        Ok(n)
                    });
                }
                b'u' | b'x' => {
                    *rest = tail;
                    let mut scratch = 0;
                    let out = if discard {
                        &mut scratch
                    } else {
                        match arg_uint(args) {
                            Ok(out) => out,
                            Err(e) => {
                                self.set_error(e);
                                return 0;
                            }
                        }
                    };
                    return self.consuming(|s| {
                        let (value, n) = if b == b'u' {
                            s.raw_uint()?
                        } else {
                            s.raw_hex()?
                        };
                        *out = value;
                        Ok(n)
                    });
                }
                b's' => {
                    *rest = tail;
                    return self.rsp_str_conversion(
                        discard,
                        class,
                        len_from_arg,
                        width,
                        args,
                    );
                }
                // A quote placeholder run, closed by `s`.
                _ => {
                    return self.rsp_quoted_conversion(rest, discard, args);
                }
            }
        }
    }

    fn rsp_char_conversion(
        &mut self,
        discard: bool,
        class: bool,
        len_from_arg: bool,
        width: Option<usize>,
        args: &mut Args<'_, '_, '_>,
    ) -> usize {
        if class {
            let pattern = match arg_pattern(args) {
                Ok(p) => p,
                Err(e) => {
                    self.set_error(e);
                    return 0;
                }
            };
            return self.rsp_charp(pattern);
        }
        if width.is_some() || len_from_arg {
            let result = (|| {
                let n = match width {
                    Some(w) => w,
                    None => arg_len(args)?,
                };
                let out = if discard { None } else { Some(arg_str(args)?) };
                Ok((n, out))
            })();
            let (n, out) = match result {
                Ok(v) => v,
                Err(e) => {
                    self.set_error(e);
                    return 0;
                }
            };
            let mut out = out;
            return self.consuming(|s| {
                if let Some(out) = out.as_mut() {
                    out.clear();
                }
                for _ in 0..n {
                    let b = match s.take() {
                        Ok(b) => b,
                        Err(e) => return Err(kindify(e, Error::RspCharp)),
                    };
                    if let Some(out) = out.as_mut() {
                        out.push(b)?;
                    }
                }
                Ok(n)
            });
        }
        if discard {
            // Discard one byte, whatever it is.
            return self.consuming(|s| {
                match s.take() {
                    Ok(_) => Ok(1),
                    Err(e) => Err(kindify(e, Error::RspChar)),
                }
            });
        }
        match arg_byte(args) {
            Ok(c) => self.rsp_char(c),
            Err(e) => {
                self.set_error(e);
                0
            }
        }
    }

    fn rsp_str_conversion(
        &mut self,
        discard: bool,
        class: bool,
        len_from_arg: bool,
        width: Option<usize>,
        args: &mut Args<'_, '_, '_>,
    ) -> usize {
        if !class {
            // `%s` matches a literal; discarding changes nothing since a
            // literal produces no value.
            let lit = match arg_bytes(args) {
                Ok(s) => s,
                Err(e) => {
                    self.set_error(e);
                    return 0;
                }
            };
            return self.rsp_str(lit);
        }
        let result = (|| {
            let pattern = arg_pattern(args)?;
            let limit = if len_from_arg {
                Some(arg_len(args)?)
            } else {
                width
            };
            let out = if discard { None } else { Some(arg_str(args)?) };
            Ok((pattern, limit, out))
        })();
        let (pattern, limit, mut out) = match result {
            Ok(v) => v,
            Err(e) => {
                self.set_error(e);
                return 0;
            }
        };
        let class = CharClass::new(pattern);
        self.consuming(|s| {
            if let (Some(max), Some(out)) = (limit, out.as_ref()) {
                if max > out.capacity() {
                    return Err(Error::RspStrpn);
                }
            }
            s.raw_strp(class, limit, out.as_deref_mut())
        })
    }

    fn rsp_quoted_conversion(
        &mut self,
        rest: &mut &[u8],
        discard: bool,
        args: &mut Args<'_, '_, '_>,
    ) -> usize {
        let mut placeholders = [0u8; 3];
        let mut k = 0;
        loop {
            let Some((&b, tail)) = rest.split_first() else {
                self.set_error(Error::BadParameter);
                return 0;
            };
            *rest = tail;
            if b == b's' {
                break;
            }
            if k == placeholders.len() {
                self.set_error(Error::BadParameter);
                return 0;
            }
            placeholders[k] = b;
            k += 1;
        }
        let result = (|| {
            let (qb, qe, esc) = match k {
                1 => {
                    let q = quote(placeholders[0], args)?;
                    (q, q, None)
                }
                2 if placeholders[0] == b'\'' || placeholders[0] == b'"' => {
                    let q = quote(placeholders[0], args)?;
                    let e = quote(placeholders[1], args)?;
                    (q, q, Some(e))
                }
                2 => {
                    let qb = quote(placeholders[0], args)?;
                    let qe = quote(placeholders[1], args)?;
                    (qb, qe, None)
                }
                3 => {
                    let qb = quote(placeholders[0], args)?;
                    let qe = quote(placeholders[1], args)?;
                    let e = quote(placeholders[2], args)?;
                    (qb, qe, Some(e))
                }
                _ => return Err(Error::BadParameter),
            };
            let out = if discard { None } else { Some(arg_str(args)?) };
            Ok((qb, qe, esc, out))
        })();
        let (qb, qe, esc, mut out) = match result {
            Ok(v) => v,
            Err(e) => {
                self.set_error(e);
                return 0;
            }
        };
        self.consuming(|s| s.raw_quoted(qb, qe, esc, out.as_deref_mut()))
    }
}
