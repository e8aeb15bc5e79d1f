// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Character-set patterns for the parsing primitives.
//!
//! A pattern is a byte string naming a set: a sequence of literal bytes
//! and inclusive `X-Y` ranges, optionally negated by a leading `^`. So
//! `b"0-9"` is the decimal digits, `b"-0-9A-Z"` is digits, uppercase
//! letters, and the dash itself, and `b"^\r"` is everything except
//! carriage return.
//!
//! Evaluation walks the pattern per byte tested. Patterns are short and
//! this keeps the type a plain borrow with no compiled form to store.

/// A borrowed character-set pattern.
#[derive(Copy, Clone, Debug)]
pub struct CharClass<'a> {
    negated: bool,
    body: &'a [u8],
}

impl<'a> CharClass<'a> {
    pub fn new(spec: &'a [u8]) -> Self {
        match spec.split_first() {
            Some((&b'^', body)) => Self {
                negated: true,
                body,
            },
            _ => Self {
                negated: false,
                body: spec,
            },
        }
    }

    /// Tests `byte` against the set.
    pub fn contains(&self, byte: u8) -> bool {
        let mut hit = false;
        let mut i = 0;
        while i < self.body.len() {
            // A dash forms a range only with bytes on both sides; at
            // either end of the pattern it is a literal.
            if i + 2 < self.body.len() && self.body[i + 1] == b'-' {
                if self.body[i] <= byte && byte <= self.body[i + 2] {
                    hit = true;
                }
                i += 3;
            } else {
                if self.body[i] == byte {
                    hit = true;
                }
                i += 1;
            }
        }
        hit != self.negated
    }
}
