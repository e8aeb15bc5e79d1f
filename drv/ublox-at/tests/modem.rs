// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Whole-transaction tests: each verb formats its command, survives the
//! echo, parses its response, and consumes the final line, against a
//! scripted in-memory transport.

use drv_ublox_at::{
    CellLocation, CharacterSet, Clock, MessageStorage, Modem, SmsIndications,
};
use ril::{Error, Port, Rx, SendError};
use std::collections::VecDeque;

#[derive(Default)]
struct ScriptPort {
    sent: Vec<u8>,
    script: VecDeque<u8>,
}

impl Port for ScriptPort {
    fn send(&mut self, byte: u8) -> Result<(), SendError> {
        self.sent.push(byte);
        Ok(())
    }

    fn recv(&mut self, _timeout_ms: u32) -> Rx {
        match self.script.pop_front() {
            Some(b) => Rx::Byte(b),
            None => Rx::Expired,
        }
    }
}

fn modem() -> Modem<ScriptPort, 32> {
    Modem::new(ScriptPort::default())
}

/// Queues a complete successful response: the blank echo line the modem
/// sends with echo disabled, the given information lines, and `OK`.
fn respond(m: &mut Modem<ScriptPort, 32>, lines: &[&str]) {
    push_line(m, "");
    for line in lines {
        push_line(m, line);
    }
    push_line(m, "OK");
}

fn push_line(m: &mut Modem<ScriptPort, 32>, line: &str) {
    let port = m.ril_mut().port_mut();
    port.script.extend(line.as_bytes().iter().copied());
    port.script.extend(b"\r\n".iter().copied());
}

/// Takes and returns everything the modem was sent so far.
fn sent(m: &mut Modem<ScriptPort, 32>) -> String {
    let port = m.ril_mut().port_mut();
    let bytes = std::mem::take(&mut port.sent);
    String::from_utf8(bytes).unwrap()
}

//
// === General operation ===
//

#[test]
fn cgmr_reads_version() {
    let mut m = modem();
    respond(&mut m, &["11.40"]);
    let mut buf = [0u8; 32];
    let n = m.at_cgmr(&mut buf).unwrap();
    assert_eq!(sent(&mut m), "AT+CGMR\r\n");
    assert_eq!(&buf[..n], b"11.40");
}

#[test]
fn cgmr_survives_its_own_echo() {
    let mut m = modem();
    push_line(&mut m, "");
    push_line(&mut m, "AT+CGMR");
    push_line(&mut m, "11.40");
    push_line(&mut m, "OK");
    let mut buf = [0u8; 32];
    let n = m.at_cgmr(&mut buf).unwrap();
    assert_eq!(&buf[..n], b"11.40");
}

#[test]
fn ccid_reads_digit_string() {
    let mut m = modem();
    respond(&mut m, &["+CCID: 8939107800023416395"]);
    let mut buf = [0u8; 32];
    let n = m.at_ccid(&mut buf).unwrap();
    assert_eq!(sent(&mut m), "AT+CCID\r\n");
    assert_eq!(&buf[..n], b"8939107800023416395");
}

//
// === General ===
//

#[test]
fn cscs_decodes_charset() {
    let mut m = modem();
    respond(&mut m, &["+CSCS: \"IRA\""]);
    assert_eq!(m.at_cscs().unwrap(), CharacterSet::Ira);
    assert_eq!(sent(&mut m), "AT+CSCS?\r\n");
}

#[test]
fn cscs_decodes_dashed_charset() {
    let mut m = modem();
    respond(&mut m, &["+CSCS: \"8859-1\""]);
    assert_eq!(m.at_cscs().unwrap(), CharacterSet::Iso8859_1);
}

#[test]
fn cscs_set_encodes_charset() {
    let mut m = modem();
    respond(&mut m, &[]);
    m.at_cscs_set(CharacterSet::Ira).unwrap();
    assert_eq!(sent(&mut m), "AT+CSCS=\"IRA\"\r\n");
}

//
// === Mobile equipment control and status ===
//

#[test]
fn cmer_reads_selected_fields() {
    let mut m = modem();
    respond(&mut m, &["+CMER: 1,0,0,0,1"]);
    let cfg = m.at_cmer().unwrap();
    assert_eq!(sent(&mut m), "AT+CMER?\r\n");
    assert_eq!(cfg.mode, 1);
    assert_eq!(cfg.ind, 0);
    assert_eq!(cfg.bfr, 1);
}

#[test]
fn cmer_set_pins_keypad_and_display() {
    let mut m = modem();
    respond(&mut m, &[]);
    m.at_cmer_set(1, 2, 1).unwrap();
    assert_eq!(sent(&mut m), "AT+CMER=1,0,0,2,1\r\n");
}

#[test]
fn cclk_decodes_time_and_zone() {
    let mut m = modem();
    respond(&mut m, &["+CCLK: \"14/07/01,15:00:00+01\""]);
    let clock = m.at_cclk().unwrap();
    assert_eq!(sent(&mut m), "AT+CCLK?\r\n");
    assert_eq!(
        clock,
        Clock {
            year: 2014,
            month: 7,
            day: 1,
            hours: 15,
            minutes: 0,
            seconds: 0,
            timezone: 15,
        }
    );
}

#[test]
fn cclk_decodes_negative_zone() {
    let mut m = modem();
    respond(&mut m, &["+CCLK: \"14/07/01,15:00:00-02\""]);
    assert_eq!(m.at_cclk().unwrap().timezone, -30);
}

#[test]
fn cclk_set_encodes_time_and_zone() {
    let mut m = modem();
    respond(&mut m, &[]);
    m.at_cclk_set(&Clock {
        year: 2014,
        month: 7,
        day: 1,
        hours: 15,
        minutes: 0,
        seconds: 0,
        timezone: 15,
    })
    .unwrap();
    assert_eq!(sent(&mut m), "AT+CCLK=\"14/07/01,15:00:00+01\"\r\n");
}

#[test]
fn cclk_set_encodes_negative_zone() {
    let mut m = modem();
    respond(&mut m, &[]);
    m.at_cclk_set(&Clock {
        year: 2021,
        month: 12,
        day: 31,
        hours: 23,
        minutes: 59,
        seconds: 59,
        timezone: -150,
    })
    .unwrap();
    assert_eq!(sent(&mut m), "AT+CCLK=\"21/12/31,23:59:59-10\"\r\n");
}

#[test]
fn cmee_roundtrip() {
    let mut m = modem();
    respond(&mut m, &["+CMEE: 2"]);
    assert_eq!(m.at_cmee().unwrap(), 2);
    assert_eq!(sent(&mut m), "AT+CMEE?\r\n");

    respond(&mut m, &[]);
    m.at_cmee_set(2).unwrap();
    assert_eq!(sent(&mut m), "AT+CMEE=2\r\n");
}

//
// === Network service ===
//

#[test]
fn cged_roundtrip() {
    let mut m = modem();
    respond(&mut m, &["+CGED: 3"]);
    assert_eq!(m.at_cged().unwrap(), 3);
    assert_eq!(sent(&mut m), "AT+CGED?\r\n");

    respond(&mut m, &[]);
    m.at_cged_set(3).unwrap();
    assert_eq!(sent(&mut m), "AT+CGED=3\r\n");
}

//
// === Short message service ===
//

#[test]
fn cmgf_roundtrip() {
    let mut m = modem();
    respond(&mut m, &["+CMGF: 1"]);
    assert_eq!(m.at_cmgf().unwrap(), 1);
    assert_eq!(sent(&mut m), "AT+CMGF?\r\n");

    respond(&mut m, &[]);
    m.at_cmgf_set(1).unwrap();
    assert_eq!(sent(&mut m), "AT+CMGF=1\r\n");
}

#[test]
fn csdh_roundtrip() {
    let mut m = modem();
    respond(&mut m, &["+CSDH: 0"]);
    assert_eq!(m.at_csdh().unwrap(), 0);
    assert_eq!(sent(&mut m), "AT+CSDH?\r\n");

    respond(&mut m, &[]);
    m.at_csdh_set(1).unwrap();
    assert_eq!(sent(&mut m), "AT+CSDH=1\r\n");
}

#[test]
fn cnmi_reads_all_fields() {
    let mut m = modem();
    respond(&mut m, &["+CNMI: 0,0,0,0,0"]);
    let cfg = m.at_cnmi().unwrap();
    assert_eq!(sent(&mut m), "AT+CNMI?\r\n");
    assert_eq!(
        cfg,
        SmsIndications {
            mode: 0,
            mt: 0,
            bm: 0,
            ds: 0,
            bfr: 0,
        }
    );
}

#[test]
fn cnmi_set_writes_all_fields() {
    let mut m = modem();
    respond(&mut m, &[]);
    m.at_cnmi_set(&SmsIndications {
        mode: 1,
        mt: 1,
        bm: 0,
        ds: 0,
        bfr: 0,
    })
    .unwrap();
    assert_eq!(sent(&mut m), "AT+CNMI=1,1,0,0,0\r\n");
}

#[test]
fn csca_reads_empty_address() {
    let mut m = modem();
    respond(&mut m, &["+CSCA: \"\",129"]);
    let mut buf = [0u8; 32];
    let (n, tosca) = m.at_csca(&mut buf).unwrap();
    assert_eq!(sent(&mut m), "AT+CSCA?\r\n");
    assert_eq!(n, 0);
    assert_eq!(tosca, 129);
}

#[test]
fn csca_reads_address() {
    let mut m = modem();
    respond(&mut m, &["+CSCA: \"+491710760000\",145"]);
    let mut buf = [0u8; 32];
    let (n, tosca) = m.at_csca(&mut buf).unwrap();
    assert_eq!(&buf[..n], b"+491710760000");
    assert_eq!(tosca, 145);
}

#[test]
fn csca_set_quotes_address() {
    let mut m = modem();
    respond(&mut m, &[]);
    m.at_csca_set(b"0170111000").unwrap();
    assert_eq!(sent(&mut m), "AT+CSCA=\"0170111000\"\r\n");
}

#[test]
fn cmti_urc_decodes_storage_and_index() {
    let mut m = modem();
    push_line(&mut m, "+CMTI: \"ME\",1");
    let (mem, index) = m.urc_cmti().unwrap();
    assert_eq!(mem, MessageStorage::Equipment);
    assert_eq!(index, 1);
    // A URC is inbound only.
    assert_eq!(sent(&mut m), "");
}

#[test]
fn cmti_urc_rejects_unknown_storage() {
    let mut m = modem();
    push_line(&mut m, "+CMTI: \"XX\",1");
    assert_eq!(m.urc_cmti(), Err(Error::RspStraNone));
}

//
// === V.25ter ===
//

#[test]
fn ate_set_formats_bare_verb() {
    let mut m = modem();
    respond(&mut m, &[]);
    m.ate_set(true).unwrap();
    assert_eq!(sent(&mut m), "ATE1\r\n");

    respond(&mut m, &[]);
    m.ate_set(false).unwrap();
    assert_eq!(sent(&mut m), "ATE0\r\n");
}

//
// === Packet switched data ===
//

#[test]
fn cgatt_roundtrip() {
    let mut m = modem();
    respond(&mut m, &["+CGATT: 1"]);
    assert_eq!(m.at_cgatt().unwrap(), 1);
    assert_eq!(sent(&mut m), "AT+CGATT?\r\n");

    respond(&mut m, &[]);
    m.at_cgatt_set(1).unwrap();
    assert_eq!(sent(&mut m), "AT+CGATT=1\r\n");
}

#[test]
fn cgreg_short_form() {
    let mut m = modem();
    respond(&mut m, &["+CGREG: 0,4"]);
    let reg = m.at_cgreg().unwrap();
    assert_eq!(sent(&mut m), "AT+CGREG?\r\n");
    assert_eq!(reg.n, 0);
    assert_eq!(reg.stat, 4);
    assert_eq!(reg.cell, None);
}

#[test]
fn cgreg_long_form() {
    let mut m = modem();
    respond(&mut m, &["+CGREG: 2,1,\"61EF\",\"7D58A3\""]);
    let reg = m.at_cgreg().unwrap();
    assert_eq!(reg.n, 2);
    assert_eq!(reg.stat, 1);
    assert_eq!(
        reg.cell,
        Some(CellLocation {
            lac: 0x61EF,
            ci: 0x7D58A3,
        })
    );
}

#[test]
fn cgreg_set() {
    let mut m = modem();
    respond(&mut m, &[]);
    m.at_cgreg_set(1).unwrap();
    assert_eq!(sent(&mut m), "AT+CGREG=1\r\n");
}

//
// === U-blox extensions ===
//

#[test]
fn udconf1_reads_hex_mode() {
    let mut m = modem();
    respond(&mut m, &["+UDCONF: 1,1"]);
    assert_eq!(m.at_udconf1().unwrap(), 1);
    assert_eq!(sent(&mut m), "AT+UDCONF=1\r\n");
}

#[test]
fn udconf1_set_writes_hex_mode() {
    let mut m = modem();
    respond(&mut m, &[]);
    m.at_udconf1_set(0).unwrap();
    assert_eq!(sent(&mut m), "AT+UDCONF=1,0\r\n");
}

//
// === Failure paths ===
//

#[test]
fn cme_error_surfaces_code() {
    let mut m = modem();
    push_line(&mut m, "");
    push_line(&mut m, "+CME ERROR: 123");
    assert_eq!(m.at_cmee_set(2), Err(Error::RspFinalCme));
    assert_eq!(m.cm_err(), 123);
}

#[test]
fn cms_error_surfaces_code() {
    let mut m = modem();
    push_line(&mut m, "");
    push_line(&mut m, "+CMS ERROR: 321");
    assert_eq!(m.at_csca_set(b"123"), Err(Error::RspFinalCms));
    assert_eq!(m.cm_err(), 321);
}

#[test]
fn plain_error_final() {
    let mut m = modem();
    push_line(&mut m, "");
    push_line(&mut m, "ERROR");
    assert_eq!(m.at_cgatt_set(1), Err(Error::RspFinalError));
}

#[test]
fn silent_modem_times_out() {
    let mut m = modem();
    // No response at all: the echo step is the first to notice.
    assert_eq!(m.at_cgatt(), Err(Error::RspEcho));
}

#[test]
fn malformed_information_response() {
    let mut m = modem();
    respond(&mut m, &["+WRONG: 1"]);
    assert_eq!(m.at_cmee(), Err(Error::RspQuery));
}

#[test]
fn transactions_recover_after_failure() {
    let mut m = modem();
    push_line(&mut m, "");
    push_line(&mut m, "ERROR");
    assert_eq!(m.at_cgatt_set(1), Err(Error::RspFinalError));

    // The next transaction starts clean.
    respond(&mut m, &["+CGATT: 1"]);
    assert_eq!(m.at_cgatt().unwrap(), 1);
}
