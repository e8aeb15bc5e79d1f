// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Command formatting: the outbound half of the engine.
//!
//! Every operation here pushes bytes through [`Port::send`] and returns
//! how many it emitted; zero means the sticky error was already set or a
//! send failed (recorded as [`Error::CmdWrite`]). Numbers are rendered
//! digit-at-a-time into a small stack buffer -- there is no `core::fmt`
//! machinery behind any of this.
//!
//! [`Ril::cmd_printf`] drives the same operations from a format string,
//! with a typed argument slice standing in for C varargs; see [`CmdArg`].

use crate::{Error, Port, Ril};

/// One argument to [`Ril::cmd_printf`].
///
/// The dispatcher pulls arguments positionally as conversions require
/// them; a missing or wrongly-typed argument fails the transaction with
/// [`Error::BadParameter`]. Surplus arguments are ignored.
#[derive(Copy, Clone, Debug)]
pub enum CmdArg<'a> {
    /// A single byte, for `%c` and quote placeholders.
    Byte(u8),
    /// A byte string, for `%s` and the buffer forms of `%c`.
    Bytes(&'a [u8]),
    /// A signed integer, for `%d`.
    Int(i32),
    /// An unsigned integer, for `%u` and `%x`.
    Uint(u32),
    /// A length, for the `*` width.
    Len(usize),
}

type Args<'i, 'a> = core::slice::Iter<'i, CmdArg<'a>>;

fn next_byte(args: &mut Args<'_, '_>) -> Result<u8, Error> {
    match args.next() {
        Some(CmdArg::Byte(b)) => Ok(*b),
        _ => Err(Error::BadParameter),
    }
}

fn next_bytes<'a>(args: &mut Args<'_, 'a>) -> Result<&'a [u8], Error> {
    match args.next() {
        Some(CmdArg::Bytes(s)) => Ok(*s),
        _ => Err(Error::BadParameter),
    }
}

fn next_int(args: &mut Args<'_, '_>) -> Result<i32, Error> {
    match args.next() {
        Some(CmdArg::Int(i)) => Ok(*i),
        _ => Err(Error::BadParameter),
    }
}

fn next_uint(args: &mut Args<'_, '_>) -> Result<u32, Error> {
    match args.next() {
        Some(CmdArg::Uint(u)) => Ok(*u),
        _ => Err(Error::BadParameter),
    }
}

fn next_len(args: &mut Args<'_, '_>) -> Result<usize, Error> {
    match args.next() {
        Some(CmdArg::Len(n)) => Ok(*n),
        _ => Err(Error::BadParameter),
    }
}

/// Resolves a quote placeholder: the `"` placeholder names itself, any
/// other placeholder byte draws the actual quote from the arguments.
fn quote(placeholder: u8, args: &mut Args<'_, '_>) -> Result<u8, Error> {
    if placeholder == b'"' {
        Ok(b'"')
    } else {
        next_byte(args)
    }
}

impl<P: Port, const BUF: usize> Ril<P, BUF> {
    fn emit(&mut self, byte: u8) -> Result<usize, Error> {
        match self.port_mut().send(byte) {
            Ok(()) => Ok(1),
            Err(_) => Err(Error::CmdWrite),
        }
    }

    fn emit_all(&mut self, bytes: &[u8]) -> Result<usize, Error> {
        for &b in bytes {
            self.emit(b)?;
        }
        Ok(bytes.len())
    }

    fn emit_uint(&mut self, value: u32) -> Result<usize, Error> {
        let mut digits = [0u8; 10];
        let mut i = digits.len();
        let mut v = value;
        loop {
            i -= 1;
            digits[i] = b'0' + (v % 10) as u8;
            v /= 10;
            if v == 0 {
                break;
            }
        }
        self.emit_all(&digits[i..])
    }

    fn emit_hex_digits(&mut self, value: u32) -> Result<usize, Error> {
        let mut digits = [0u8; 8];
        let mut i = digits.len();
        let mut v = value;
        loop {
            i -= 1;
            digits[i] = HEX[(v & 0xF) as usize];
            v >>= 4;
            if v == 0 {
                break;
            }
        }
        self.emit_all(&digits[i..])
    }

    /// Signed decimal with optional zero-padded width and forced sign.
    /// The sign occupies a width column, so `(1, width 3, plus)` renders
    /// as `+01`.
    fn emit_int_padded(
        &mut self,
        value: i32,
        width: usize,
        plus: bool,
    ) -> Result<usize, Error> {
        let mut digits = [0u8; 10];
        let mut i = digits.len();
        let mut v = value.unsigned_abs();
        loop {
            i -= 1;
            digits[i] = b'0' + (v % 10) as u8;
            v /= 10;
            if v == 0 {
                break;
            }
        }
        let mut count = 0;
        if value < 0 {
            count += self.emit(b'-')?;
        } else if plus {
            count += self.emit(b'+')?;
        }
        let body = digits.len() - i;
        while count + body < width {
            count += self.emit(b'0')?;
        }
        count += self.emit_all(&digits[i..])?;
        Ok(count)
    }

    fn emit_quoted(
        &mut self,
        s: &[u8],
        quote_begin: u8,
        quote_end: u8,
        escape: Option<u8>,
    ) -> Result<usize, Error> {
        let mut count = self.emit(quote_begin)?;
        for &b in s {
            if let Some(e) = escape {
                if b == e || b == quote_begin || b == quote_end {
                    count += self.emit(e)?;
                }
            }
            count += self.emit(b)?;
        }
        count += self.emit(quote_end)?;
        Ok(count)
    }

    /// Runs one emission under the sticky-error discipline.
    fn emitting(
        &mut self,
        op: impl FnOnce(&mut Self) -> Result<usize, Error>,
    ) -> usize {
        if self.error().is_some() {
            return 0;
        }
        match op(self) {
            Ok(n) => n,
            Err(e) => {
                self.set_error(e);
                0
            }
        }
    }

    //
    // === Bytes ===
    //

    /// Emits one byte.
    pub fn cmd_char(&mut self, c: u8) -> usize {
        self.emitting(|s| s.emit(c))
    }

    /// Emits a buffer of raw bytes verbatim.
    pub fn cmd_charn(&mut self, bytes: &[u8]) -> usize {
        self.emitting(|s| s.emit_all(bytes))
    }

    /// Emits the AT line terminator, `\r\n`. Counts as two bytes.
    pub fn cmd_eol(&mut self) -> usize {
        self.emitting(|s| s.emit_all(b"\r\n"))
    }

    //
    // === Numbers ===
    //

    /// Signed decimal; a leading `-` appears only for negative values.
    pub fn cmd_int(&mut self, value: i32) -> usize {
        self.emitting(|s| s.emit_int_padded(value, 0, false))
    }

    /// Unsigned decimal.
    pub fn cmd_uint(&mut self, value: u32) -> usize {
        self.emitting(|s| s.emit_uint(value))
    }

    /// Lowercase hex, no padding.
    pub fn cmd_hex(&mut self, value: u32) -> usize {
        self.emitting(|s| s.emit_hex_digits(value))
    }

    /// Lowercase hex, zero-padded to exactly `width` digits. Values wider
    /// than `width` digits are masked down to the low `width` digits.
    /// `width` must be 1..=8.
    pub fn cmd_hexw(&mut self, value: u32, width: usize) -> usize {
        self.emitting(|s| {
            if width == 0 || width > 8 {
                return Err(Error::BadParameter);
            }
            for shift in (0..width).rev() {
                let digit = (value >> (4 * shift)) & 0xF;
                s.emit(HEX[digit as usize])?;
            }
            Ok(width)
        })
    }

    //
    // === Strings ===
    //

    /// Emits a string. Same bytes on the wire as [`Ril::cmd_charn`]; this
    /// spelling marks the argument as text rather than raw data.
    pub fn cmd_str(&mut self, s: &[u8]) -> usize {
        self.cmd_charn(s)
    }

    /// Emits at most `n` bytes of `s`.
    pub fn cmd_strn(&mut self, s: &[u8], n: usize) -> usize {
        let n = n.min(s.len());
        self.emitting(|state| state.emit_all(&s[..n]))
    }

    /// `quote s quote`, no escaping.
    pub fn cmd_strq(&mut self, s: &[u8], quote: u8) -> usize {
        self.emitting(|state| state.emit_quoted(s, quote, quote, None))
    }

    /// `quote_begin s quote_end`, no escaping.
    pub fn cmd_strqq(&mut self, s: &[u8], quote_begin: u8, quote_end: u8) -> usize {
        self.emitting(|state| state.emit_quoted(s, quote_begin, quote_end, None))
    }

    /// `quote s quote` where occurrences of the quote or escape byte
    /// inside `s` are prefixed with the escape byte.
    pub fn cmd_strqe(&mut self, s: &[u8], quote: u8, escape: u8) -> usize {
        self.emitting(|state| state.emit_quoted(s, quote, quote, Some(escape)))
    }

    /// Asymmetric-quote form of [`Ril::cmd_strqe`]; all three special
    /// bytes get escaped.
    pub fn cmd_strqqe(
        &mut self,
        s: &[u8],
        quote_begin: u8,
        quote_end: u8,
        escape: u8,
    ) -> usize {
        self.emitting(|state| {
            state.emit_quoted(s, quote_begin, quote_end, Some(escape))
        })
    }

    //
    // === AT composition ===
    //

    /// `AT`
    pub fn cmd_at(&mut self) -> usize {
        self.emitting(|s| s.emit_all(b"AT"))
    }

    /// `AT<cmd>`
    pub fn cmd_atc(&mut self, cmd: &[u8]) -> usize {
        self.emitting(|s| {
            let mut n = s.emit_all(b"AT")?;
            n += s.emit_all(cmd)?;
            Ok(n)
        })
    }

    /// `AT<cmd><op>`
    pub fn cmd_atco(&mut self, cmd: &[u8], op: u8) -> usize {
        self.emitting(|s| {
            let mut n = s.emit_all(b"AT")?;
            n += s.emit_all(cmd)?;
            n += s.emit(op)?;
            Ok(n)
        })
    }

    /// A complete read command: `AT<cmd>?\r\n`.
    pub fn cmd_query(&mut self, cmd: &[u8]) -> usize {
        self.emitting(|s| {
            let mut n = s.emit_all(b"AT")?;
            n += s.emit_all(cmd)?;
            n += s.emit_all(b"?\r\n")?;
            Ok(n)
        })
    }

    /// The head of a write command: `AT<cmd>=`. The caller appends the
    /// parameters and the terminator.
    pub fn cmd_set(&mut self, cmd: &[u8]) -> usize {
        self.emitting(|s| {
            let mut n = s.emit_all(b"AT")?;
            n += s.emit_all(cmd)?;
            n += s.emit(b'=')?;
            Ok(n)
        })
    }

    //
    // === printf ===
    //

    /// Formats `fmt` with `args`, dispatching to the primitives above.
    /// Returns the cumulative byte count; on failure emission stops where
    /// the sticky error was recorded.
    ///
    /// Conversions:
    ///
    /// | spec | emits |
    /// |------|-------|
    /// | `%%` | literal `%` |
    /// | `%$` | `\r\n` |
    /// | `%c` | one byte (`Byte`) |
    /// | `%<n>c`, `%*c` | first `n` bytes of a buffer (`Len` if `*`, then `Bytes`) |
    /// | `%d`, `%+d`, `%0<w>d` | signed decimal (`Int`), optional forced sign and zero-padded width |
    /// | `%u` | unsigned decimal (`Uint`) |
    /// | `%x`, `%<w>x` | lowercase hex (`Uint`), optional fixed width |
    /// | `%s` | a byte string (`Bytes`) |
    /// | `%*s` | at most `n` bytes of a string (`Len`, `Bytes`) |
    /// | `%"s`, `%'s` | quoted string; `"` quotes with itself, `'` draws the quote from a `Byte` |
    /// | `%'<e>s` | quoted with escaping (`Byte` quote unless `"`, `Byte` escape, `Bytes`) |
    /// | `%<q1><q2>s` | asymmetric quotes (`Byte`, `Byte`, `Bytes`) |
    /// | `%<q1><q2><e>s` | asymmetric quotes with escaping |
    pub fn cmd_printf(&mut self, fmt: &[u8], args: &[CmdArg<'_>]) -> usize {
        if self.error().is_some() {
            return 0;
        }
        let mut args = args.iter();
        let mut total = 0;
        let mut rest = fmt;
        while let Some((&b, tail)) = rest.split_first() {
            rest = tail;
            if b != b'%' {
                total += self.cmd_char(b);
            } else {
                match self.cmd_conversion(&mut rest, &mut args) {
                    Ok(n) => total += n,
                    Err(e) => self.set_error(e),
                }
            }
            if self.error().is_some() {
                break;
            }
        }
        total
    }

    /// Parses and runs one conversion. `rest` starts just past the `%`
    /// and is left just past the conversion.
    fn cmd_conversion(
        &mut self,
        rest: &mut &[u8],
        args: &mut Args<'_, '_>,
    ) -> Result<usize, Error> {
        let mut plus = false;
        let mut width: Option<usize> = None;
        let mut width_from_arg = false;

        loop {
            let (&b, tail) = rest.split_first().ok_or(Error::BadParameter)?;
            match b {
                b'%' if width.is_none() && !plus && !width_from_arg => {
                    *rest = tail;
                    return self.emit(b'%');
                }
                b'$' if width.is_none() && !plus && !width_from_arg => {
                    *rest = tail;
                    return self.emit_all(b"\r\n");
                }
                b'+' if !plus && width.is_none() => {
                    plus = true;
                    *rest = tail;
                }
                b'*' if width.is_none() && !width_from_arg => {
                    width_from_arg = true;
                    *rest = tail;
                }
                b'0'..=b'9' if !width_from_arg => {
                    let w = width.unwrap_or(0) * 10 + (b - b'0') as usize;
                    width = Some(w);
                    *rest = tail;
                }
                b'c' => {
                    *rest = tail;
                    return if width.is_some() || width_from_arg {
                        let n = match width {
                            Some(w) => w,
                            None => next_len(args)?,
                        };
                        let s = next_bytes(args)?;
                        if n > s.len() {
                            return Err(Error::BadParameter);
                        }
                        self.emit_all(&s[..n])
                    } else {
                        let c = next_byte(args)?;
                        self.emit(c)
                    };
                }
                b'd' => {
                    *rest = tail;
                    let v = next_int(args)?;
                    return self.emit_int_padded(v, width.unwrap_or(0), plus);
                }
                b'u' => {
                    *rest = tail;
                    let v = next_uint(args)?;
                    return self.emit_uint(v);
                }
                b'x' => {
                    *rest = tail;
                    let v = next_uint(args)?;
                    return match width {
                        Some(w) => {
                            if w == 0 || w > 8 {
                                return Err(Error::BadParameter);
                            }
                            let mut n = 0;
                            for shift in (0..w).rev() {
                                let digit = (v >> (4 * shift)) & 0xF;
                                n += self.emit(HEX[digit as usize])?;
                            }
                            Ok(n)
                        }
                        None => self.emit_hex_digits(v),
                    };
                }
                b's' => {
                    *rest = tail;
                    return if width_from_arg {
                        let n = next_len(args)?;
                        let s = next_bytes(args)?;
                        let n = n.min(s.len());
                        self.emit_all(&s[..n])
                    } else {
                        let s = next_bytes(args)?;
                        self.emit_all(s)
                    };
                }
                // Anything else is a quote placeholder run, closed by `s`.
                _ => return self.cmd_quoted_conversion(rest, args),
            }
        }
    }

    /// Handles the quoted-string conversions: one, two, or three
    /// placeholder bytes followed by `s`. One placeholder is a plain
    /// quote; two are symmetric-quote-plus-escape when the first is `'`
    /// or `"`, asymmetric quotes otherwise; three are asymmetric quotes
    /// plus escape. Placeholder-to-argument mapping is positional:
    /// (begin, end, escape).
    fn cmd_quoted_conversion(
        &mut self,
        rest: &mut &[u8],
        args: &mut Args<'_, '_>,
    ) -> Result<usize, Error> {
        let mut placeholders = [0u8; 3];
        let mut k = 0;
        loop {
            let (&b, tail) = rest.split_first().ok_or(Error::BadParameter)?;
            *rest = tail;
            if b == b's' {
                break;
            }
            if k == placeholders.len() {
                return Err(Error::BadParameter);
            }
            placeholders[k] = b;
            k += 1;
        }
        match k {
            1 => {
                let q = quote(placeholders[0], args)?;
                let s = next_bytes(args)?;
                self.emit_quoted(s, q, q, None)
            }
            2 if placeholders[0] == b'\'' || placeholders[0] == b'"' => {
                let q = quote(placeholders[0], args)?;
                let e = quote(placeholders[1], args)?;
                let s = next_bytes(args)?;
                self.emit_quoted(s, q, q, Some(e))
            }
            2 => {
                let qb = quote(placeholders[0], args)?;
                let qe = quote(placeholders[1], args)?;
                let s = next_bytes(args)?;
                self.emit_quoted(s, qb, qe, None)
            }
            3 => {
                let qb = quote(placeholders[0], args)?;
                let qe = quote(placeholders[1], args)?;
                let e = quote(placeholders[2], args)?;
                let s = next_bytes(args)?;
                self.emit_quoted(s, qb, qe, Some(e))
            }
            _ => Err(Error::BadParameter),
        }
    }
}

const HEX: &[u8; 16] = b"0123456789abcdef";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{ril, SimPort};

    fn sent(r: &Ril<SimPort, 32>) -> &[u8] {
        &r.port().sent
    }

    #[test]
    fn char_and_charn() {
        let mut r = ril();
        assert_eq!(r.cmd_char(b'c'), 1);
        assert_eq!(r.cmd_charn(b"string"), 6);
        assert_eq!(r.cmd_charn(b""), 0);
        assert_eq!(r.error(), None);
        assert_eq!(sent(&r), b"cstring");
    }

    #[test]
    fn eol() {
        let mut r = ril();
        assert_eq!(r.cmd_eol(), 2);
        assert_eq!(sent(&r), b"\r\n");
    }

    #[test]
    fn int() {
        let mut r = ril();
        assert_eq!(r.cmd_int(305419896), 9);
        assert_eq!(sent(&r), b"305419896");
    }

    #[test]
    fn int_negative() {
        let mut r = ril();
        assert_eq!(r.cmd_int(-24680), 6);
        assert_eq!(sent(&r), b"-24680");
    }

    #[test]
    fn int_extremes() {
        let mut r = ril();
        r.cmd_int(i32::MIN);
        r.cmd_char(b',');
        r.cmd_int(0);
        assert_eq!(sent(&r), b"-2147483648,0");
    }

    #[test]
    fn uint() {
        let mut r = ril();
        assert_eq!(r.cmd_uint(24680), 5);
        assert_eq!(r.cmd_uint(u32::MAX), 10);
        assert_eq!(sent(&r), b"246804294967295");
    }

    #[test]
    fn hex() {
        let mut r = ril();
        assert_eq!(r.cmd_hex(0x12345678), 8);
        r.cmd_char(b',');
        assert_eq!(r.cmd_hex(0), 1);
        assert_eq!(sent(&r), b"12345678,0");
    }

    #[test]
    fn hexw_pads() {
        let mut r = ril();
        assert_eq!(r.cmd_hexw(0x1234, 8), 8);
        assert_eq!(sent(&r), b"00001234");
    }

    #[test]
    fn hexw_masks_over_width() {
        let mut r = ril();
        assert_eq!(r.cmd_hexw(0xdeadbeef, 4), 4);
        assert_eq!(sent(&r), b"beef");
    }

    #[test]
    fn hexw_rejects_bad_width() {
        let mut r = ril();
        assert_eq!(r.cmd_hexw(1, 0), 0);
        assert_eq!(r.error(), Some(Error::BadParameter));
    }

    #[test]
    fn strn_bounds() {
        let mut r = ril();
        assert_eq!(r.cmd_strn(b"string", 7), 6);
        assert_eq!(r.cmd_strn(b"string", 3), 3);
        assert_eq!(sent(&r), b"stringstr");
    }

    #[test]
    fn strq() {
        let mut r = ril();
        assert_eq!(r.cmd_strq(b"string", b'"'), 8);
        assert_eq!(sent(&r), b"\"string\"");
    }

    #[test]
    fn strqq() {
        let mut r = ril();
        assert_eq!(r.cmd_strqq(b"string", b'<', b'>'), 8);
        assert_eq!(sent(&r), b"<string>");
    }

    #[test]
    fn strqe_escapes_quote_and_escape() {
        let mut r = ril();
        assert_eq!(r.cmd_strqe(b"|str/ing|", b'|', b'/'), 14);
        assert_eq!(sent(&r), b"|/|str//ing/||");
    }

    #[test]
    fn strqqe_escapes_all_three() {
        let mut r = ril();
        assert_eq!(r.cmd_strqqe(b"<str/ing>", b'<', b'>', b'/'), 14);
        assert_eq!(sent(&r), b"</<str//ing/>>");
    }

    #[test]
    fn at_family() {
        let mut r = ril();
        assert_eq!(r.cmd_at(), 2);
        assert_eq!(r.cmd_atc(b"CMD"), 5);
        assert_eq!(r.cmd_atco(b"CMD", b'?'), 6);
        assert_eq!(sent(&r), b"ATATCMDATCMD?");
    }

    #[test]
    fn query_and_set() {
        let mut r = ril();
        assert_eq!(r.cmd_query(b"CMD"), 8);
        assert_eq!(r.cmd_set(b"CMD"), 6);
        assert_eq!(sent(&r), b"ATCMD?\r\nATCMD=");
    }

    #[test]
    fn printf_percent_and_eol() {
        let mut r = ril();
        assert_eq!(r.cmd_printf(b"%%", &[]), 1);
        assert_eq!(r.cmd_printf(b"%$", &[]), 2);
        assert_eq!(sent(&r), b"%\r\n");
    }

    #[test]
    fn printf_char() {
        let mut r = ril();
        assert_eq!(r.cmd_printf(b"%c", &[CmdArg::Byte(b'c')]), 1);
        assert_eq!(sent(&r), b"c");
    }

    #[test]
    fn printf_charn_width() {
        let mut r = ril();
        let n = r.cmd_printf(b"%3c", &[CmdArg::Bytes(b"abctail")]);
        assert_eq!(n, 3);
        assert_eq!(sent(&r), b"abc");
    }

    #[test]
    fn printf_charn_star() {
        let mut r = ril();
        let n = r.cmd_printf(
            b"%*c",
            &[CmdArg::Len(3), CmdArg::Bytes(b"abctail")],
        );
        assert_eq!(n, 3);
        assert_eq!(sent(&r), b"abc");
    }

    #[test]
    fn printf_int() {
        let mut r = ril();
        assert_eq!(r.cmd_printf(b"%d", &[CmdArg::Int(24680)]), 5);
        assert_eq!(sent(&r), b"24680");
    }

    #[test]
    fn printf_int_forced_sign() {
        let mut r = ril();
        assert_eq!(r.cmd_printf(b"%+d", &[CmdArg::Int(24680)]), 6);
        assert_eq!(sent(&r), b"+24680");
    }

    #[test]
    fn printf_int_width_includes_sign() {
        let mut r = ril();
        assert_eq!(r.cmd_printf(b"%8d", &[CmdArg::Int(-24680)]), 8);
        assert_eq!(sent(&r), b"-0024680");
    }

    #[test]
    fn printf_int_plus_width() {
        let mut r = ril();
        assert_eq!(r.cmd_printf(b"%+8d", &[CmdArg::Int(24680)]), 8);
        assert_eq!(sent(&r), b"+0024680");
    }

    #[test]
    fn printf_small_zero_pad() {
        let mut r = ril();
        assert_eq!(
            r.cmd_printf(
                b"%02d:%02d%+03d",
                &[CmdArg::Int(7), CmdArg::Int(30), CmdArg::Int(1)]
            ),
            8
        );
        assert_eq!(sent(&r), b"07:30+01");
    }

    #[test]
    fn printf_uint_and_hex() {
        let mut r = ril();
        assert_eq!(r.cmd_printf(b"%u", &[CmdArg::Uint(24680)]), 5);
        assert_eq!(r.cmd_printf(b"%x", &[CmdArg::Uint(0xbeef)]), 4);
        assert_eq!(r.cmd_printf(b"%8x", &[CmdArg::Uint(0x1234)]), 8);
        assert_eq!(sent(&r), b"24680beef00001234");
    }

    #[test]
    fn printf_str() {
        let mut r = ril();
        assert_eq!(r.cmd_printf(b"%s", &[CmdArg::Bytes(b"string")]), 6);
        assert_eq!(sent(&r), b"string");
    }

    #[test]
    fn printf_strn() {
        let mut r = ril();
        let n = r.cmd_printf(
            b"%*s",
            &[CmdArg::Len(7), CmdArg::Bytes(b"string")],
        );
        assert_eq!(n, 6);
        assert_eq!(sent(&r), b"string");
    }

    #[test]
    fn printf_dquote() {
        let mut r = ril();
        assert_eq!(r.cmd_printf(b"%\"s", &[CmdArg::Bytes(b"string")]), 8);
        assert_eq!(sent(&r), b"\"string\"");
    }

    #[test]
    fn printf_quote_from_arg() {
        let mut r = ril();
        let n = r.cmd_printf(
            b"%'s",
            &[CmdArg::Byte(b'\''), CmdArg::Bytes(b"string")],
        );
        assert_eq!(n, 8);
        assert_eq!(sent(&r), b"'string'");
    }

    #[test]
    fn printf_strqe() {
        let mut r = ril();
        let n = r.cmd_printf(
            b"%'|s",
            &[
                CmdArg::Byte(b'|'),
                CmdArg::Byte(b'/'),
                CmdArg::Bytes(b"|str/ing|"),
            ],
        );
        assert_eq!(n, 14);
        assert_eq!(sent(&r), b"|/|str//ing/||");
    }

    #[test]
    fn printf_strqq() {
        let mut r = ril();
        let n = r.cmd_printf(
            b"%<>s",
            &[
                CmdArg::Byte(b'<'),
                CmdArg::Byte(b'>'),
                CmdArg::Bytes(b"str/ing"),
            ],
        );
        assert_eq!(n, 9);
        assert_eq!(sent(&r), b"<str/ing>");
    }

    #[test]
    fn printf_strqqe() {
        let mut r = ril();
        let n = r.cmd_printf(
            b"%<>|s",
            &[
                CmdArg::Byte(b'<'),
                CmdArg::Byte(b'>'),
                CmdArg::Byte(b'/'),
                CmdArg::Bytes(b"<str/ing>"),
            ],
        );
        assert_eq!(n, 14);
        assert_eq!(sent(&r), b"</<str//ing/>>");
    }

    #[test]
    fn printf_literal_mix() {
        let mut r = ril();
        let n = r.cmd_printf(
            b"AT+CMER=%u,0,0,%u,%u%$",
            &[CmdArg::Uint(1), CmdArg::Uint(2), CmdArg::Uint(1)],
        );
        assert_eq!(n, 19);
        assert_eq!(sent(&r), b"AT+CMER=1,0,0,2,1\r\n");
    }

    #[test]
    fn printf_bad_arg_stops() {
        let mut r = ril();
        let n = r.cmd_printf(b"a%db", &[CmdArg::Bytes(b"nope")]);
        assert_eq!(n, 1);
        assert_eq!(r.error(), Some(Error::BadParameter));
        assert_eq!(sent(&r), b"a");
    }

    #[test]
    fn printf_missing_arg_stops() {
        let mut r = ril();
        let n = r.cmd_printf(b"%d", &[]);
        assert_eq!(n, 0);
        assert_eq!(r.error(), Some(Error::BadParameter));
    }

    #[test]
    fn sticky_error_short_circuits() {
        let mut r = ril();
        r.cmd_hexw(1, 99);
        assert_eq!(r.error(), Some(Error::BadParameter));
        assert_eq!(r.cmd_uint(5), 0);
        assert_eq!(r.cmd_eol(), 0);
        assert_eq!(sent(&r), b"");
    }

    #[test]
    fn write_failure_sets_cmd_write() {
        let mut r = ril();
        r.port_mut().jam_sends = true;
        assert_eq!(r.cmd_uint(5), 0);
        assert_eq!(r.error(), Some(Error::CmdWrite));
    }
}
