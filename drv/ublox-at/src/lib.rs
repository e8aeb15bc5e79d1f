// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! AT dialect bindings for U-blox GSM/GPRS modems (SARA G3/U2 family).
//!
//! This crate binds the `ril` engines to a concrete modem dialect: the
//! general ETSI/3GPP AT set (TS 27.007 / 27.005) plus the U-blox
//! `+UDCONF` extension (in [`ublox`], kept separate from the standard
//! set).
//!
//! Each verb is a method on [`Modem`] following the same transaction
//! skeleton: clear the sticky error, format the command, skip the echo,
//! parse the information response, consume the final line, and map the
//! sticky flag into a `Result`. The methods run one command at a time and
//! never retry; sequencing, retries, and URC dispatch belong to the
//! owner. [`Modem::urc_cmti`] is the parse hook for an owner-level URC
//! reader.

#![cfg_attr(not(test), no_std)]

pub mod ublox;

use num_derive::FromPrimitive;
use num_traits::FromPrimitive as _;
use ril::{Alternative, Capture, CmdArg, Error, Port, Ril, RspArg};

/// Character sets selectable with `+CSCS`, per TS 27.007.
///
/// The numeric coding follows the sorted order of the set names, which is
/// also the order of the decode table.
#[derive(Copy, Clone, Debug, Eq, PartialEq, FromPrimitive)]
pub enum CharacterSet {
    Iso8859_1 = 0,
    Iso8859_2 = 1,
    Gsm = 2,
    Hex = 3,
    Ira = 4,
    Pccp437 = 5,
    Pcdn = 6,
    Ucs2 = 7,
}

impl CharacterSet {
    /// The set's name as it appears on the wire.
    pub fn name(self) -> &'static [u8] {
        match self {
            Self::Iso8859_1 => b"8859-1",
            Self::Iso8859_2 => b"8859-2",
            Self::Gsm => b"GSM",
            Self::Hex => b"HEX",
            Self::Ira => b"IRA",
            Self::Pccp437 => b"PCCP437",
            Self::Pcdn => b"PCDN",
            Self::Ucs2 => b"UCS2",
        }
    }
}

/// `+CSCS` decode table, sorted by text as `rsp_stra` requires.
const CHARACTER_SETS: [Alternative<'static>; 8] = [
    Alternative { value: CharacterSet::Iso8859_1 as i32, text: b"8859-1" },
    Alternative { value: CharacterSet::Iso8859_2 as i32, text: b"8859-2" },
    Alternative { value: CharacterSet::Gsm as i32, text: b"GSM" },
    Alternative { value: CharacterSet::Hex as i32, text: b"HEX" },
    Alternative { value: CharacterSet::Ira as i32, text: b"IRA" },
    Alternative { value: CharacterSet::Pccp437 as i32, text: b"PCCP437" },
    Alternative { value: CharacterSet::Pcdn as i32, text: b"PCDN" },
    Alternative { value: CharacterSet::Ucs2 as i32, text: b"UCS2" },
];

/// Message storages named in `+CMTI` indications, per TS 27.005.
#[derive(Copy, Clone, Debug, Eq, PartialEq, FromPrimitive)]
pub enum MessageStorage {
    /// `"BM"`: broadcast message storage.
    Broadcast = 0,
    /// `"ME"`: mobile equipment storage.
    Equipment = 1,
    /// `"MT"`: combined storage.
    Combined = 2,
    /// `"SM"`: SIM storage.
    Sim = 3,
    /// `"SR"`: status report storage.
    StatusReport = 4,
}

/// `+CMTI` storage decode table, sorted by text.
const MESSAGE_STORAGES: [Alternative<'static>; 5] = [
    Alternative { value: MessageStorage::Broadcast as i32, text: b"BM" },
    Alternative { value: MessageStorage::Equipment as i32, text: b"ME" },
    Alternative { value: MessageStorage::Combined as i32, text: b"MT" },
    Alternative { value: MessageStorage::Sim as i32, text: b"SM" },
    Alternative { value: MessageStorage::StatusReport as i32, text: b"SR" },
];

/// Real-time clock state from `+CCLK`.
///
/// The wire format is `"YY/MM/DD,hh:mm:ss±zz"` with `zz` in quarter-hours
/// from GMT; here `year` is the full year and `timezone` is signed
/// minutes from GMT (always a multiple of 15).
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Clock {
    pub year: u32,
    pub month: u32,
    pub day: u32,
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
    pub timezone: i32,
}

/// Mobile-equipment event reporting configuration from `+CMER`. The
/// keypad and display fields are not carried; this dialect pins them to
/// zero.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct EventReporting {
    pub mode: u32,
    pub ind: u32,
    pub bfr: u32,
}

/// New-message indication configuration from `+CNMI`.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct SmsIndications {
    pub mode: u32,
    pub mt: u32,
    pub bm: u32,
    pub ds: u32,
    pub bfr: u32,
}

/// GPRS network registration state from `+CGREG`.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct GprsRegistration {
    pub n: u32,
    pub stat: u32,
    /// Present only in the long form (`n = 2`).
    pub cell: Option<CellLocation>,
}

/// Location area code and cell id, reported as quoted hex.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct CellLocation {
    pub lac: u32,
    pub ci: u32,
}

/// One modem behind a byte transport.
///
/// `BUF` is the look-ahead capacity of the underlying engine; 32 bytes is
/// plenty for this dialect's response fields.
pub struct Modem<P, const BUF: usize> {
    ril: Ril<P, BUF>,
}

impl<P: Port, const BUF: usize> Modem<P, BUF> {
    pub fn new(port: P) -> Self {
        Self {
            ril: Ril::new(port),
        }
    }

    /// Access to the underlying engine, e.g. for an owner-level URC
    /// reader that wants `rsp_match_*` and `rsp_line_dump`.
    pub fn ril(&self) -> &Ril<P, BUF> {
        &self.ril
    }

    pub fn ril_mut(&mut self) -> &mut Ril<P, BUF> {
        &mut self.ril
    }

    /// Deadline for each parsing step of subsequent commands.
    pub fn set_timeout(&mut self, ms: u32) {
        self.ril.set_timeout(ms);
    }

    /// The `+CME`/`+CMS` code of the last failed command, when the error
    /// was [`Error::RspFinalCme`]/[`Error::RspFinalCms`].
    pub fn cm_err(&self) -> u32 {
        self.ril.cm_err()
    }

    fn begin(&mut self) {
        self.ril.clear_error();
    }

    fn finish(&self) -> Result<(), Error> {
        self.ril.result()
    }

    /// Generic single-integer read: `AT<cmd>?` answered by
    /// `<cmd>: <value>`.
    fn read_value(&mut self, cmd: &[u8]) -> Result<u32, Error> {
        self.begin();
        self.ril.cmd_query(cmd);
        self.ril.rsp_echo();
        let mut value = 0;
        self.ril.rsp_query(cmd, &mut value);
        self.ril.rsp_eol();
        self.ril.rsp_final();
        self.finish().map(|()| value as u32)
    }

    /// Generic single-integer write: `AT<cmd>=<value>`.
    fn set_value(&mut self, cmd: &[u8], value: u32) -> Result<(), Error> {
        self.begin();
        self.ril.cmd_set(cmd);
        self.ril.cmd_uint(value);
        self.ril.cmd_eol();
        self.ril.rsp_echo();
        self.ril.rsp_final();
        self.finish()
    }

    //
    // === General operation ===
    //

    /// `AT+CGMR`: firmware version. The version text lands in `version`;
    /// returns its length.
    pub fn at_cgmr(&mut self, version: &mut [u8]) -> Result<usize, Error> {
        self.begin();
        self.ril.cmd_atc(b"+CGMR");
        self.ril.cmd_eol();
        self.ril.rsp_echo();
        let mut out = Capture::new(version);
        self.ril.rsp_strp(b"^\r", &mut out);
        self.ril.rsp_eol();
        self.ril.rsp_final();
        self.finish().map(|()| out.len())
    }

    /// `AT+CCID`: SIM card identifier, as its decimal digit string (it
    /// does not fit a machine integer). Returns the length.
    pub fn at_ccid(&mut self, ccid: &mut [u8]) -> Result<usize, Error> {
        self.begin();
        self.ril.cmd_atc(b"+CCID");
        self.ril.cmd_eol();
        self.ril.rsp_echo();
        self.ril.rsp_str(b"+CCID: ");
        let mut out = Capture::new(ccid);
        self.ril.rsp_strp(b"0-9", &mut out);
        self.ril.rsp_eol();
        self.ril.rsp_final();
        self.finish().map(|()| out.len())
    }

    //
    // === General (TS 27.007 §5) ===
    //

    /// `AT+CSCS?`: current character set.
    pub fn at_cscs(&mut self) -> Result<CharacterSet, Error> {
        self.begin();
        self.ril.cmd_query(b"+CSCS");
        self.ril.rsp_echo();
        self.ril.rsp_str(b"+CSCS: ");
        self.ril.rsp_char(b'"');
        let code = self.ril.rsp_stra(b"-0-9A-Z", &CHARACTER_SETS);
        self.ril.rsp_char(b'"');
        self.ril.rsp_eol();
        self.ril.rsp_final();
        self.finish()?;
        CharacterSet::from_i32(code).ok_or(Error::BadParameter)
    }

    /// `AT+CSCS=<chset>`.
    pub fn at_cscs_set(&mut self, chset: CharacterSet) -> Result<(), Error> {
        self.begin();
        self.ril.cmd_set(b"+CSCS");
        self.ril.cmd_strq(chset.name(), b'"');
        self.ril.cmd_eol();
        self.ril.rsp_echo();
        self.ril.rsp_final();
        self.finish()
    }

    //
    // === Mobile equipment control and status (TS 27.007 §8) ===
    //

    /// `AT+CMER?`: event reporting configuration.
    pub fn at_cmer(&mut self) -> Result<EventReporting, Error> {
        self.begin();
        self.ril.cmd_query(b"+CMER");
        self.ril.rsp_echo();
        let (mut mode, mut ind, mut bfr) = (0, 0, 0);
        self.ril.rsp_scanf(
            b"+CMER: %u,%*u,%*u,%u,%u%$",
            &mut [
                RspArg::Uint(&mut mode),
                RspArg::Uint(&mut ind),
                RspArg::Uint(&mut bfr),
            ],
        );
        self.ril.rsp_final();
        self.finish().map(|()| EventReporting { mode, ind, bfr })
    }

    /// `AT+CMER=<mode>,0,0,<ind>,<bfr>`: keypad and display reporting
    /// stay off.
    pub fn at_cmer_set(
        &mut self,
        mode: u32,
        ind: u32,
        bfr: u32,
    ) -> Result<(), Error> {
        self.begin();
        self.ril.cmd_printf(
            b"AT+CMER=%u,0,0,%u,%u%$",
            &[CmdArg::Uint(mode), CmdArg::Uint(ind), CmdArg::Uint(bfr)],
        );
        self.ril.rsp_echo();
        self.ril.rsp_final();
        self.finish()
    }

    /// `AT+CCLK?`: read the real-time clock.
    pub fn at_cclk(&mut self) -> Result<Clock, Error> {
        self.begin();
        self.ril.cmd_query(b"+CCLK");
        self.ril.rsp_echo();
        let (mut yy, mut month, mut day) = (0, 0, 0);
        let (mut hours, mut minutes, mut seconds) = (0, 0, 0);
        let mut zz = 0;
        self.ril.rsp_scanf(
            b"+CCLK: \"%u/%u/%u,%u:%u:%u%d\"%$",
            &mut [
                RspArg::Uint(&mut yy),
                RspArg::Uint(&mut month),
                RspArg::Uint(&mut day),
                RspArg::Uint(&mut hours),
                RspArg::Uint(&mut minutes),
                RspArg::Uint(&mut seconds),
                RspArg::Int(&mut zz),
            ],
        );
        self.ril.rsp_final();
        self.finish().map(|()| Clock {
            year: 2000 + yy,
            month,
            day,
            hours,
            minutes,
            seconds,
            timezone: zz * 15,
        })
    }

    /// `AT+CCLK="YY/MM/DD,hh:mm:ss±zz"`: set the real-time clock.
    pub fn at_cclk_set(&mut self, clock: &Clock) -> Result<(), Error> {
        self.begin();
        self.ril.cmd_printf(
            b"AT+CCLK=\"%02d/%02d/%02d,%02d:%02d:%02d%+03d\"%$",
            &[
                CmdArg::Int(clock.year as i32 - 2000),
                CmdArg::Int(clock.month as i32),
                CmdArg::Int(clock.day as i32),
                CmdArg::Int(clock.hours as i32),
                CmdArg::Int(clock.minutes as i32),
                CmdArg::Int(clock.seconds as i32),
                CmdArg::Int(clock.timezone / 15),
            ],
        );
        self.ril.rsp_echo();
        self.ril.rsp_final();
        self.finish()
    }

    /// `AT+CMEE?`: error reporting verbosity.
    pub fn at_cmee(&mut self) -> Result<u32, Error> {
        self.read_value(b"+CMEE")
    }

    /// `AT+CMEE=<n>`.
    pub fn at_cmee_set(&mut self, n: u32) -> Result<(), Error> {
        self.set_value(b"+CMEE", n)
    }

    //
    // === Network service ===
    //

    /// `AT+CGED?`: engineering data mode.
    pub fn at_cged(&mut self) -> Result<u32, Error> {
        self.read_value(b"+CGED")
    }

    /// `AT+CGED=<mode>`.
    pub fn at_cged_set(&mut self, mode: u32) -> Result<(), Error> {
        self.set_value(b"+CGED", mode)
    }

    //
    // === Short message service (TS 27.005) ===
    //

    /// `AT+CMGF?`: message format (PDU or text).
    pub fn at_cmgf(&mut self) -> Result<u32, Error> {
        self.read_value(b"+CMGF")
    }

    /// `AT+CMGF=<mode>`.
    pub fn at_cmgf_set(&mut self, mode: u32) -> Result<(), Error> {
        self.set_value(b"+CMGF", mode)
    }

    /// `AT+CSDH?`: show-text-mode-parameters setting.
    pub fn at_csdh(&mut self) -> Result<u32, Error> {
        self.read_value(b"+CSDH")
    }

    /// `AT+CSDH=<show>`.
    pub fn at_csdh_set(&mut self, show: u32) -> Result<(), Error> {
        self.set_value(b"+CSDH", show)
    }

    /// `AT+CNMI?`: new-message indication routing.
    pub fn at_cnmi(&mut self) -> Result<SmsIndications, Error> {
        self.begin();
        self.ril.cmd_query(b"+CNMI");
        self.ril.rsp_echo();
        let (mut mode, mut mt, mut bm, mut ds, mut bfr) = (0, 0, 0, 0, 0);
        self.ril.rsp_scanf(
            b"+CNMI: %u,%u,%u,%u,%u%$",
            &mut [
                RspArg::Uint(&mut mode),
                RspArg::Uint(&mut mt),
                RspArg::Uint(&mut bm),
                RspArg::Uint(&mut ds),
                RspArg::Uint(&mut bfr),
            ],
        );
        self.ril.rsp_final();
        self.finish().map(|()| SmsIndications {
            mode,
            mt,
            bm,
            ds,
            bfr,
        })
    }

    /// `AT+CNMI=<mode>,<mt>,<bm>,<ds>,<bfr>`.
    pub fn at_cnmi_set(&mut self, cfg: &SmsIndications) -> Result<(), Error> {
        self.begin();
        self.ril.cmd_printf(
            b"AT+CNMI=%u,%u,%u,%u,%u%$",
            &[
                CmdArg::Uint(cfg.mode),
                CmdArg::Uint(cfg.mt),
                CmdArg::Uint(cfg.bm),
                CmdArg::Uint(cfg.ds),
                CmdArg::Uint(cfg.bfr),
            ],
        );
        self.ril.rsp_echo();
        self.ril.rsp_final();
        self.finish()
    }

    /// `AT+CSCA?`: service center address. The address digits land in
    /// `sca`; returns `(length, type-of-address)`.
    pub fn at_csca(&mut self, sca: &mut [u8]) -> Result<(usize, u32), Error> {
        self.begin();
        self.ril.cmd_query(b"+CSCA");
        self.ril.rsp_echo();
        self.ril.rsp_str(b"+CSCA: ");
        let mut out = Capture::new(sca);
        self.ril.rsp_strq(b'"', &mut out);
        self.ril.rsp_char(b',');
        let mut tosca = 0;
        self.ril.rsp_uint(&mut tosca);
        self.ril.rsp_eol();
        self.ril.rsp_final();
        self.finish().map(|()| (out.len(), tosca))
    }

    /// `AT+CSCA="<sca>"`.
    pub fn at_csca_set(&mut self, sca: &[u8]) -> Result<(), Error> {
        self.begin();
        self.ril.cmd_set(b"+CSCA");
        self.ril.cmd_strq(sca, b'"');
        self.ril.cmd_eol();
        self.ril.rsp_echo();
        self.ril.rsp_final();
        self.finish()
    }

    /// `+CMTI: "<mem>",<index>`: parses a new-message indication. This is
    /// a URC, not a command: nothing is sent, and the owner's dispatcher
    /// calls this once it has recognized the prefix is next on the line.
    pub fn urc_cmti(&mut self) -> Result<(MessageStorage, u32), Error> {
        self.begin();
        self.ril.rsp_str(b"+CMTI: ");
        self.ril.rsp_char(b'"');
        let code = self.ril.rsp_stra(b"A-Z", &MESSAGE_STORAGES);
        self.ril.rsp_char(b'"');
        self.ril.rsp_char(b',');
        let mut index = 0;
        self.ril.rsp_uint(&mut index);
        self.ril.rsp_eol();
        self.finish()?;
        let mem = MessageStorage::from_i32(code).ok_or(Error::BadParameter)?;
        Ok((mem, index))
    }

    //
    // === V.25ter ===
    //

    /// `ATE<n>`: command echo on or off.
    pub fn ate_set(&mut self, echo: bool) -> Result<(), Error> {
        self.begin();
        self.ril.cmd_atc(b"E");
        self.ril.cmd_uint(echo as u32);
        self.ril.cmd_eol();
        self.ril.rsp_echo();
        self.ril.rsp_final();
        self.finish()
    }

    //
    // === Packet switched data (TS 27.007 §10) ===
    //

    /// `AT+CGATT?`: GPRS attach state.
    pub fn at_cgatt(&mut self) -> Result<u32, Error> {
        self.read_value(b"+CGATT")
    }

    /// `AT+CGATT=<state>`.
    pub fn at_cgatt_set(&mut self, state: u32) -> Result<(), Error> {
        self.set_value(b"+CGATT", state)
    }

    /// `AT+CGREG?`: network registration. The long form carries the
    /// location area code and cell id as quoted hex; the short form
    /// leaves [`GprsRegistration::cell`] empty.
    pub fn at_cgreg(&mut self) -> Result<GprsRegistration, Error> {
        self.begin();
        self.ril.cmd_query(b"+CGREG");
        self.ril.rsp_echo();
        self.ril.rsp_str(b"+CGREG: ");
        let (mut n, mut stat) = (0, 0);
        self.ril.rsp_uint(&mut n);
        self.ril.rsp_char(b',');
        self.ril.rsp_uint(&mut stat);
        let cell = if self.ril.rsp_match_char(b',') > 0 {
            let (mut lac, mut ci) = (0, 0);
            self.ril.rsp_char(b'"');
            self.ril.rsp_hex(&mut lac);
            self.ril.rsp_char(b'"');
            self.ril.rsp_char(b',');
            self.ril.rsp_char(b'"');
            self.ril.rsp_hex(&mut ci);
            self.ril.rsp_char(b'"');
            Some(CellLocation { lac, ci })
        } else {
            None
        };
        self.ril.rsp_eol();
        self.ril.rsp_final();
        self.finish().map(|()| GprsRegistration { n, stat, cell })
    }

    /// `AT+CGREG=<n>`.
    pub fn at_cgreg_set(&mut self, n: u32) -> Result<(), Error> {
        self.set_value(b"+CGREG", n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_traits::FromPrimitive;

    #[test]
    fn character_set_table_is_sorted() {
        assert!(CHARACTER_SETS
            .windows(2)
            .all(|w| w[0].text < w[1].text));
    }

    #[test]
    fn character_set_codes_round_trip() {
        for alt in &CHARACTER_SETS {
            let chset = CharacterSet::from_i32(alt.value).unwrap();
            assert_eq!(chset.name(), alt.text);
        }
        // The coding the rest of the stack relies on.
        assert_eq!(CharacterSet::Ira as i32, 4);
    }

    #[test]
    fn message_storage_table_is_sorted() {
        assert!(MESSAGE_STORAGES
            .windows(2)
            .all(|w| w[0].text < w[1].text));
    }
}
