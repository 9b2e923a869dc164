//! End-to-end controller scenarios against a scripted fake station.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use scanbench::config::Config;
use scanbench::controller::{Controller, Phase};
use scanbench::notify::Notify;
use scanbench::station::{
    Ack, Board, DeviceMap, PortList, Result as StationResult, StationApi, StationError,
};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    PowerOff,
    PowerOn,
    RegisterPorts,
    AvailablePorts,
    RegisterDevices,
    AvailableDevices,
    Read {
        board_id: String,
        address: u32,
        port: String,
    },
    WriteInvert {
        board_id: String,
        address: u32,
        port: String,
    },
}

#[derive(Default)]
struct FakeStationInner {
    calls: Vec<Call>,
    /// Scripted `/devices/available` responses. The last entry repeats once
    /// the queue runs dry.
    maps: VecDeque<DeviceMap>,
    /// Fail this many power-on requests before succeeding.
    fail_power_on: u32,
    /// Read submissions at these addresses report a station failure.
    fail_read_addresses: Vec<u32>,
}

#[derive(Clone, Default)]
struct FakeStation(Arc<Mutex<FakeStationInner>>);

impl FakeStation {
    fn with_maps(maps: Vec<DeviceMap>) -> Self {
        let fake = Self::default();
        fake.0.lock().unwrap().maps = maps.into();
        fake
    }

    fn record(&self, call: Call) {
        self.0.lock().unwrap().calls.push(call);
    }

    fn calls(&self) -> Vec<Call> {
        self.0.lock().unwrap().calls.clone()
    }

    fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|call| predicate(call)).count()
    }

    fn ack(message: &str) -> StationResult<Ack> {
        Ok(Ack {
            message: message.to_string(),
        })
    }
}

impl StationApi for FakeStation {
    fn power_on(&self) -> StationResult<Ack> {
        self.record(Call::PowerOn);
        let mut inner = self.0.lock().unwrap();
        if inner.fail_power_on > 0 {
            inner.fail_power_on -= 1;
            return Err(StationError::Status {
                path: "/devices/poweron",
                status: 500,
            });
        }
        drop(inner);
        Self::ack("all boards powered on")
    }

    fn power_off(&self) -> StationResult<Ack> {
        self.record(Call::PowerOff);
        Self::ack("all boards powered off")
    }

    fn register_ports(&self) -> StationResult<Ack> {
        self.record(Call::RegisterPorts);
        Self::ack("ports registered")
    }

    fn available_ports(&self) -> StationResult<PortList> {
        self.record(Call::AvailablePorts);
        Ok(PortList {
            ports: vec!["PORT_A".to_string(), "PORT_B".to_string()],
        })
    }

    fn register_devices(&self) -> StationResult<Ack> {
        self.record(Call::RegisterDevices);
        Self::ack("devices registered")
    }

    fn available_devices(&self) -> StationResult<DeviceMap> {
        self.record(Call::AvailableDevices);
        let mut inner = self.0.lock().unwrap();
        if inner.maps.len() > 1 {
            Ok(inner.maps.pop_front().unwrap())
        } else {
            inner
                .maps
                .front()
                .cloned()
                .ok_or(StationError::Status {
                    path: "/devices/available",
                    status: 404,
                })
        }
    }

    fn submit_read(&self, board_id: &str, address: u32, port_name: &str) -> StationResult<()> {
        self.record(Call::Read {
            board_id: board_id.to_string(),
            address,
            port: port_name.to_string(),
        });
        if self.0.lock().unwrap().fail_read_addresses.contains(&address) {
            return Err(StationError::Status {
                path: "/commands/read",
                status: 500,
            });
        }
        Ok(())
    }

    fn submit_write_invert(
        &self,
        board_id: &str,
        address: u32,
        port_name: &str,
    ) -> StationResult<()> {
        self.record(Call::WriteInvert {
            board_id: board_id.to_string(),
            address,
            port: port_name.to_string(),
        });
        Ok(())
    }
}

#[derive(Clone, Default)]
struct RecordingNotifier(Arc<Mutex<Vec<String>>>);

impl RecordingNotifier {
    fn messages(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

impl Notify for RecordingNotifier {
    fn publish(&self, text: &str) {
        self.0.lock().unwrap().push(text.to_string());
    }
}

/// All pacing zeroed so a full pass runs in milliseconds.
fn test_config(expected: u32) -> Config {
    let mut cfg = Config::default();
    cfg.boards.expected = expected;
    cfg.timing.cmd_wait_secs = 0;
    cfg.timing.cooldown_secs = 0;
    cfg.timing.power_settle_secs = 0;
    cfg.timing.port_settle_secs = 0;
    cfg.timing.register_settle_secs = 0;
    cfg.timing.device_settle_secs = 0;
    cfg.validate().unwrap();
    cfg
}

/// A chain of `n` boards with distinct identities, split over two ports.
fn chain_of(n: u32) -> DeviceMap {
    let mut map = DeviceMap::default();
    for slot in 1..=n {
        let port = if slot <= (n + 1) / 2 { "PORT_A" } else { "PORT_B" };
        map.ports.entry(port.to_string()).or_default().push(Board {
            slot,
            board_id: format!("nucleo-{slot:02}"),
        });
    }
    map
}

fn is_read(call: &Call) -> bool {
    matches!(call, Call::Read { .. })
}

fn is_write(call: &Call) -> bool {
    matches!(call, Call::WriteInvert { .. })
}

#[test]
fn first_pass_reads_every_board_and_address() {
    let station = FakeStation::with_maps(vec![chain_of(13)]);
    let notifier = RecordingNotifier::default();
    let mut controller = Controller::new(station.clone(), notifier, test_config(13));

    controller.run_cycle();

    // 160 addresses per board, 13 boards, zero writes on the first pass.
    assert_eq!(station.count(is_read), 160 * 13);
    assert_eq!(station.count(is_write), 0);
    assert_eq!(controller.phase(), Phase::Write);
    assert_eq!(controller.devices().boards().count(), 13);
}

#[test]
fn second_pass_write_inverts_only_the_enabled_slots() {
    let station = FakeStation::with_maps(vec![chain_of(13)]);
    let notifier = RecordingNotifier::default();
    let mut controller = Controller::new(station.clone(), notifier, test_config(13));

    controller.run_cycle();
    controller.run_cycle();

    // 146 addresses per eligible board, slots 1..=6 only.
    assert_eq!(station.count(is_write), 146 * 6);
    assert_eq!(station.count(is_read), 160 * 13);
    assert_eq!(controller.phase(), Phase::Read);

    let writes = station.calls();
    for call in writes.iter().filter(|call| is_write(call)) {
        if let Call::WriteInvert {
            board_id, address, ..
        } = call
        {
            let slot: u32 = board_id.trim_start_matches("nucleo-").parse().unwrap();
            assert!(slot <= 6, "slot {slot} is not write-enabled");
            assert!((0x1000..0x13400).contains(address));
            assert_eq!(address % 512, 0);
        }
    }
}

#[test]
fn incomplete_inventory_forces_another_power_cycle() {
    // First enumeration misses slot 7; the second is complete.
    let mut short_chain = chain_of(13);
    for boards in short_chain.ports.values_mut() {
        boards.retain(|board| board.slot != 7);
    }
    let station = FakeStation::with_maps(vec![short_chain, chain_of(13)]);
    let notifier = RecordingNotifier::default();
    let mut controller = Controller::new(station.clone(), notifier.clone(), test_config(13));

    controller.run_cycle();

    // The full power-off/on/register/fetch sequence ran twice.
    assert_eq!(station.count(|c| *c == Call::PowerOff), 2);
    assert_eq!(station.count(|c| *c == Call::PowerOn), 2);
    assert_eq!(station.count(|c| *c == Call::RegisterDevices), 2);
    assert_eq!(station.count(|c| *c == Call::AvailableDevices), 2);

    // No command was issued before the second, good enumeration.
    let calls = station.calls();
    let first_read = calls.iter().position(is_read).unwrap();
    let second_fetch = calls
        .iter()
        .enumerate()
        .filter(|(_, c)| **c == Call::AvailableDevices)
        .nth(1)
        .unwrap()
        .0;
    assert!(second_fetch < first_read);

    // One retry does not disturb phase alternation.
    assert_eq!(controller.phase(), Phase::Write);
    assert!(notifier
        .messages()
        .iter()
        .any(|m| m.contains("INCOMPLETE INVENTORY")));
}

#[test]
fn discovery_fault_is_absorbed_by_the_retry_loop() {
    let station = FakeStation::with_maps(vec![chain_of(13)]);
    station.0.lock().unwrap().fail_power_on = 1;
    let notifier = RecordingNotifier::default();
    let mut controller = Controller::new(station.clone(), notifier.clone(), test_config(13));

    controller.run_cycle();

    // The failed power-on sent the gate back to the top: two power cycles.
    assert_eq!(station.count(|c| *c == Call::PowerOff), 2);
    assert_eq!(station.count(|c| *c == Call::PowerOn), 2);
    assert_eq!(station.count(is_read), 160 * 13);
    assert!(notifier
        .messages()
        .iter()
        .any(|m| m.contains("DISCOVERY FAILED")));
}

#[test]
fn failed_command_skips_the_address_and_continues() {
    let station = FakeStation::with_maps(vec![chain_of(1)]);
    station.0.lock().unwrap().fail_read_addresses = vec![0x0200];
    let notifier = RecordingNotifier::default();
    let mut controller = Controller::new(station.clone(), notifier.clone(), test_config(1));

    controller.run_cycle();

    // Every address was still attempted, including the ones after the fault.
    assert_eq!(station.count(is_read), 160);
    assert!(station.calls().iter().any(|c| matches!(
        c,
        Call::Read { address: 0x0400, .. }
    )));
    assert!(notifier
        .messages()
        .iter()
        .any(|m| m.contains("COMMAND FAILED")));
}

#[test]
fn scan_lines_are_published_for_every_command() {
    let station = FakeStation::with_maps(vec![chain_of(1)]);
    let notifier = RecordingNotifier::default();
    let mut controller = Controller::new(station, notifier.clone(), test_config(1));

    controller.run_cycle();

    let messages = notifier.messages();
    assert!(messages.iter().any(|m| m == "READ MEMORY VALUES"));
    assert_eq!(
        messages
            .iter()
            .filter(|m| m.starts_with("READ [0x"))
            .count(),
        160
    );
    assert!(messages
        .iter()
        .any(|m| m.starts_with("READ [0x00000000] BOARD [nucleo-01]")));
}
