//! Wire types for the station HTTP surface.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Acknowledgement returned by the power and registration endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct Ack {
    pub message: String,
}

/// Response of `/ports/available`.
#[derive(Debug, Clone, Deserialize)]
pub struct PortList {
    pub ports: Vec<String>,
}

/// One enumerated board: its position in the daisy chain plus the
/// station-assigned identity. The identity is stable across power cycles on
/// unchanged hardware, but the controller never relies on that — it is
/// re-fetched on every discovery cycle.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Board {
    /// Chain position, 1-based.
    #[serde(rename = "TTL")]
    pub slot: u32,
    pub board_id: String,
}

/// Snapshot of `/devices/available`: every port with its chain of boards.
///
/// Replaced wholesale on each discovery cycle, never patched. A `BTreeMap`
/// keeps scan traversal order deterministic across fetches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DeviceMap {
    pub ports: BTreeMap<String, Vec<Board>>,
}

impl DeviceMap {
    /// Iterate over every (port name, board) pair in port order.
    pub fn boards(&self) -> impl Iterator<Item = (&str, &Board)> {
        self.ports
            .iter()
            .flat_map(|(port, boards)| boards.iter().map(move |board| (port.as_str(), board)))
    }
}

/// Payload of the `/commands/read` and `/commands/write_invert` endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct MemoryCommand<'a> {
    pub board_id: &'a str,
    pub mem_address: u32,
    pub port_name: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_map_decodes_station_shape() {
        let json = r#"{
            "ports": {
                "/dev/ttyUSB0": [
                    {"TTL": 1, "board_id": "nucleo-aa01"},
                    {"TTL": 2, "board_id": "nucleo-aa02"}
                ],
                "/dev/ttyUSB1": [
                    {"TTL": 3, "board_id": "nucleo-bb01"}
                ]
            }
        }"#;

        let map: DeviceMap = serde_json::from_str(json).unwrap();
        let pairs: Vec<(&str, u32)> = map.boards().map(|(p, b)| (p, b.slot)).collect();
        assert_eq!(
            pairs,
            vec![("/dev/ttyUSB0", 1), ("/dev/ttyUSB0", 2), ("/dev/ttyUSB1", 3)]
        );
        assert_eq!(map.ports["/dev/ttyUSB1"][0].board_id, "nucleo-bb01");
    }

    #[test]
    fn memory_command_serializes_station_field_names() {
        let cmd = MemoryCommand {
            board_id: "nucleo-aa01",
            mem_address: 0x1000,
            port_name: "/dev/ttyUSB0",
        };
        let json = serde_json::to_value(&cmd).unwrap();
        assert_eq!(json["board_id"], "nucleo-aa01");
        assert_eq!(json["mem_address"], 0x1000);
        assert_eq!(json["port_name"], "/dev/ttyUSB0");
    }
}
