//! The orchestration core: discovery gate plus the alternating scan loop.
//!
//! Two nested loops. The outer loop power-cycles and re-enumerates the
//! chain until the inventory verdict is good; the inner loop walks every
//! eligible board and address for the current phase at a fixed pace. Every
//! completed pass flips the phase and re-enters the outer loop — hardware
//! stability is never assumed to persist between passes.

use std::thread;
use std::time::Duration;

use crate::config::Config;
use crate::inventory;
use crate::notify::{ack_message, device_listing, stamped, timestamp, Notify};
use crate::station::{Board, DeviceMap, StationApi, StationError};

/// Current scan mode. Flips after every completed pass and survives any
/// number of discovery retries in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Read,
    Write,
}

impl Phase {
    fn flipped(self) -> Self {
        match self {
            Phase::Read => Phase::Write,
            Phase::Write => Phase::Read,
        }
    }
}

/// The station orchestrator. Owns the verified device map and the phase;
/// everything else it touches is a stateless adapter.
pub struct Controller<S, N> {
    station: S,
    notifier: N,
    cfg: Config,
    phase: Phase,
    devices: DeviceMap,
}

impl<S: StationApi, N: Notify> Controller<S, N> {
    pub fn new(station: S, notifier: N, cfg: Config) -> Self {
        Self {
            station,
            notifier,
            cfg,
            phase: Phase::Read,
            devices: DeviceMap::default(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The device map currently targeted by the scan scheduler.
    pub fn devices(&self) -> &DeviceMap {
        &self.devices
    }

    /// Run forever: gate on a good inventory, scan one pass, flip, repeat.
    /// The process only stops when killed.
    pub fn run(&mut self) -> ! {
        log::info!("station orchestrator starting");
        self.notifier.publish(&stamped("STARTING STATION"));
        loop {
            self.run_cycle();
        }
    }

    /// One unit of work: the discovery gate followed by a single scan pass.
    pub fn run_cycle(&mut self) {
        self.wait_until_ready();
        self.notifier.publish(&stamped("STARTING OPERATIONS"));
        match self.phase {
            Phase::Read => self.read_pass(),
            Phase::Write => self.write_pass(),
        }
        self.phase = self.phase.flipped();
    }

    /// Discovery gate: power-cycle and re-enumerate until the chain reports
    /// a complete, uniquely-identified inventory.
    ///
    /// Every fault in the discovery path takes the same road: another full
    /// power cycle. There is no retry cap and no backoff — the assumed
    /// fault model is transient electrical or enumeration glitches that a
    /// power cycle clears, and an operator watching the notification stream
    /// steps in if the attempts keep climbing.
    fn wait_until_ready(&mut self) {
        let mut attempt: u64 = 0;
        loop {
            attempt += 1;
            match self.discover() {
                Ok(map) if inventory::chain_is_complete(&map, self.cfg.boards.expected) => {
                    log::info!(
                        "inventory good after {attempt} attempt(s): {} board(s)",
                        map.boards().count()
                    );
                    self.devices = map;
                    return;
                }
                Ok(map) => {
                    let seen = map.boards().count();
                    log::warn!(
                        "incomplete inventory on attempt {attempt}: {seen}/{} board(s)",
                        self.cfg.boards.expected
                    );
                    self.notifier.publish(&stamped(&format!(
                        "INCOMPLETE INVENTORY ({seen}/{}), RETRYING (ATTEMPT {attempt})",
                        self.cfg.boards.expected
                    )));
                }
                Err(err) => {
                    log::warn!("discovery attempt {attempt} failed: {err}");
                    self.notifier
                        .publish(&stamped(&format!("DISCOVERY FAILED: {err}")));
                }
            }
        }
    }

    /// One full power-off / power-on / register / fetch sequence.
    fn discover(&mut self) -> Result<DeviceMap, StationError> {
        let ack = self.station.power_off()?;
        self.notifier.publish(&ack_message(&ack.message));
        self.pause(self.cfg.timing.cooldown());

        let ack = self.station.power_on()?;
        self.notifier.publish(&ack_message(&ack.message));
        self.pause(self.cfg.timing.power_settle());

        let ack = self.station.register_ports()?;
        self.pause(self.cfg.timing.port_settle());
        let ports = self.station.available_ports()?;
        let mut text = format!("{}\n", ack.message.to_uppercase());
        for port in &ports.ports {
            text.push_str(port);
            text.push('\n');
        }
        self.notifier.publish(&stamped(&text));
        self.pause(self.cfg.timing.register_settle());

        let ack = self.station.register_devices()?;
        self.notifier.publish(&ack_message(&ack.message));
        self.pause(self.cfg.timing.device_settle());

        let map = self.station.available_devices()?;
        self.notifier.publish(&device_listing(&map));
        Ok(map)
    }

    /// READ phase: every board on every port, full read window.
    fn read_pass(&self) {
        self.notifier.publish("READ MEMORY VALUES");
        let scan = &self.cfg.scan;
        for (port_name, board) in self.devices.boards() {
            for address in (scan.read_start..scan.read_end).step_by(scan.step as usize) {
                self.issue(Phase::Read, port_name, board, address);
            }
        }
    }

    /// WRITE phase: only the write-enabled slots, narrowed address window.
    fn write_pass(&self) {
        self.notifier.publish("WRITE MEMORY VALUES");
        let scan = &self.cfg.scan;
        let write_max = self.cfg.boards.write_enabled_max();
        for (port_name, board) in self.devices.boards() {
            if board.slot > write_max {
                continue;
            }
            for address in (scan.write_start..scan.write_end).step_by(scan.step as usize) {
                self.issue(Phase::Write, port_name, board, address);
            }
        }
    }

    /// Submit one memory command, then pace.
    ///
    /// A failed submission is reported and the address skipped rather than
    /// aborting the pass; one flaky command must not cost a multi-hour scan.
    fn issue(&self, phase: Phase, port_name: &str, board: &Board, address: u32) {
        let verb = match phase {
            Phase::Read => "READ",
            Phase::Write => "WRITE",
        };
        self.notifier.publish(&format!(
            "{verb} [0x{address:08x}] BOARD [{}]\n[{}]",
            board.board_id,
            timestamp()
        ));

        let result = match phase {
            Phase::Read => self
                .station
                .submit_read(&board.board_id, address, port_name),
            Phase::Write => self
                .station
                .submit_write_invert(&board.board_id, address, port_name),
        };
        if let Err(err) = result {
            log::warn!(
                "{verb} 0x{address:08x} on board {} failed: {err}",
                board.board_id
            );
            self.notifier
                .publish(&stamped(&format!("COMMAND FAILED: {err}")));
        }

        self.pause(self.cfg.timing.cmd_wait());
    }

    /// Explicit pacing. These timed waits are the only suspension points in
    /// the whole process; the pacing is a hardware requirement, not an
    /// implementation detail.
    fn pause(&self, wait: Duration) {
        if !wait.is_zero() {
            thread::sleep(wait);
        }
    }
}
