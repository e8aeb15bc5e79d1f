// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Scripted in-memory transport for the unit tests.
//!
//! Outbound bytes accumulate in `sent`; inbound bytes are popped from a
//! pre-loaded `script`. An empty script answers `Expired`, which is how a
//! real transport reports a passed deadline, so tests exercise the
//! end-of-input paths the same way exhausted hardware would.

use crate::{Port, Ril, Rx, SendError};
use std::collections::VecDeque;

#[derive(Default)]
pub struct SimPort {
    pub sent: Vec<u8>,
    pub script: VecDeque<u8>,
    /// When set, every send fails; for exercising `CmdWrite`.
    pub jam_sends: bool,
    /// When set, every recv fails; for exercising `ReadGeneral`.
    pub jam_recvs: bool,
    /// Timeout values observed on recv, in call order.
    pub timeouts: Vec<u32>,
}

impl Port for SimPort {
    fn send(&mut self, byte: u8) -> Result<(), SendError> {
        if self.jam_sends {
            return Err(SendError);
        }
        self.sent.push(byte);
        Ok(())
    }

    fn recv(&mut self, timeout_ms: u32) -> Rx {
        self.timeouts.push(timeout_ms);
        if self.jam_recvs {
            return Rx::Failed;
        }
        match self.script.pop_front() {
            Some(b) => Rx::Byte(b),
            None => Rx::Expired,
        }
    }
}

/// A fresh engine over a fresh port, with the look-ahead capacity the
/// tests assume.
pub fn ril() -> Ril<SimPort, 32> {
    Ril::new(SimPort::default())
}

/// Queues `bytes` as the next inbound data.
pub fn feed(r: &mut Ril<SimPort, 32>, bytes: &[u8]) {
    r.port_mut().script.extend(bytes.iter().copied());
}
