// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! U-blox proprietary extensions, kept apart from the standard 3GPP set.
//!
//! `+UDCONF` is a keyed configuration verb: the first parameter selects
//! the item, the rest are its values. Only the hex-mode item (key 1) is
//! bound here; it controls whether socket payload crosses the UART as raw
//! bytes or as hex pairs.

use crate::Modem;
use ril::{Error, Port};

/// `+UDCONF` configuration key for socket hex mode.
const UDCONF_HEX_MODE: u32 = 1;

impl<P: Port, const BUF: usize> Modem<P, BUF> {
    /// `AT+UDCONF=1`: reads the hex-mode setting.
    pub fn at_udconf1(&mut self) -> Result<u32, Error> {
        self.begin();
        let ril = self.ril_mut();
        ril.cmd_set(b"+UDCONF");
        ril.cmd_uint(UDCONF_HEX_MODE);
        ril.cmd_eol();
        ril.rsp_echo();
        ril.rsp_str(b"+UDCONF: 1,");
        let mut mode = 0;
        ril.rsp_uint(&mut mode);
        ril.rsp_eol();
        ril.rsp_final();
        self.finish().map(|()| mode)
    }

    /// `AT+UDCONF=1,<mode>`: sets the hex-mode setting.
    pub fn at_udconf1_set(&mut self, hex_mode: u32) -> Result<(), Error> {
        self.begin();
        let ril = self.ril_mut();
        ril.cmd_set(b"+UDCONF");
        ril.cmd_uint(UDCONF_HEX_MODE);
        ril.cmd_char(b',');
        ril.cmd_uint(hex_mode);
        ril.cmd_eol();
        ril.rsp_echo();
        ril.rsp_final();
        self.finish()
    }
}
