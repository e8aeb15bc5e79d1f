// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Selection among string alternatives.
//!
//! Modems encode enumerated parameters as short strings (`+CSCS: "IRA"`,
//! `+CMTI: "ME",...`). Rather than a ladder of `if`/`else` per verb, the
//! dialect layer hands the parser a sorted table of alternatives and lets
//! [`Ril::rsp_stra`] pick one by reading the input prefix.
//!
//! The table is a flat slice sorted lexicographically by `text`. The
//! matcher treats it as a trie without building one: at each consumed
//! byte it narrows the window of surviving candidates with two binary
//! searches, so the structure stays cache-friendly and allocation-free.

use crate::pattern::CharClass;
use crate::{Error, Port, Ril};

/// One selectable alternative: the wire string and the value it decodes
/// to. The value is the record's own, not its table position.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Alternative<'a> {
    pub value: i32,
    pub text: &'a [u8],
}

impl<P: Port, const BUF: usize> Ril<P, BUF> {
    /// Decodes one of `alts` from the input.
    ///
    /// Bytes are consumed while they belong to `pattern`'s class and at
    /// least one candidate extends with them; at the stop point the
    /// candidate whose text equals the consumed prefix wins. A candidate
    /// that is a strict prefix of another therefore wins when the input
    /// ends at it.
    ///
    /// Returns the winner's `value`, or `-1` with a sticky error:
    /// [`Error::RspStraNone`] when no candidate survives the consumed
    /// prefix, [`Error::RspStraUnderflow`] when input stopped while every
    /// survivor still had unmatched text. On failure nothing is consumed.
    ///
    /// `alts` must be sorted by `text` and free of duplicates.
    pub fn rsp_stra(&mut self, pattern: &[u8], alts: &[Alternative<'_>]) -> i32 {
        if self.error().is_some() {
            return -1;
        }
        debug_assert!(alts.windows(2).all(|w| w[0].text < w[1].text));
        if alts.is_empty() {
            self.set_error(Error::BadParameter);
            return -1;
        }
        self.begin_op();
        let mark = self.cursor();
        let class = CharClass::new(pattern);

        let mut lo = 0;
        let mut hi = alts.len();
        let mut depth = 0;
        loop {
            let byte = match self.peek() {
                Ok(b) if class.contains(b) => b,
                Ok(_) | Err(Error::ReadTimeout) => break,
                Err(e) => {
                    self.rewind(mark);
                    self.set_error(e);
                    return -1;
                }
            };
            // Records shorter than the prefix sort first within the
            // window, then the rest grouped by their byte at `depth`.
            let window = &alts[lo..hi];
            let from = window.partition_point(|a| {
                a.text.get(depth).is_none_or(|&x| x < byte)
            });
            let to = window.partition_point(|a| {
                a.text.get(depth).is_none_or(|&x| x <= byte)
            });
            if from == to {
                // In-class byte, but it extends no candidate; it is not
                // part of the value.
                break;
            }
            hi = lo + to;
            lo += from;
            self.advance();
            depth += 1;
        }

        if depth > 0 && lo < hi && alts[lo].text.len() == depth {
            self.commit();
            alts[lo].value
        } else if depth > 0 && lo < hi {
            self.rewind(mark);
            self.set_error(Error::RspStraUnderflow);
            -1
        } else {
            self.rewind(mark);
            self.set_error(Error::RspStraNone);
            -1
        }
    }
}
