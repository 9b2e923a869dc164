use std::time::Duration;

use serde::de::DeserializeOwned;
use ureq::Agent;

use super::{Ack, DeviceMap, MemoryCommand, PortList, Result, StationApi, StationError};

/// Blocking HTTP client for the station.
///
/// One method per station capability. Errors surface immediately; the
/// caller decides whether a failure means a power cycle or a skipped
/// command.
pub struct StationClient {
    agent: Agent,
    base_url: String,
}

impl StationClient {
    /// `timeout` bounds each individual request end to end.
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let agent: Agent = Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .into();
        Self {
            agent,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn get_json<T: DeserializeOwned>(&self, path: &'static str) -> Result<T> {
        let url = format!("{}{path}", self.base_url);
        let mut response = self
            .agent
            .get(&url)
            .call()
            .map_err(|err| StationError::Transport {
                path,
                source: Box::new(err),
            })?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            return Err(StationError::Status { path, status });
        }

        response
            .body_mut()
            .read_json::<T>()
            .map_err(|err| StationError::Decode {
                path,
                source: Box::new(err),
            })
    }

    /// Command responses are opaque; only the HTTP status is interpreted.
    fn post_command(&self, path: &'static str, command: &MemoryCommand) -> Result<()> {
        let url = format!("{}{path}", self.base_url);
        let response =
            self.agent
                .post(&url)
                .send_json(command)
                .map_err(|err| StationError::Transport {
                    path,
                    source: Box::new(err),
                })?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            return Err(StationError::Status { path, status });
        }
        Ok(())
    }
}

impl StationApi for StationClient {
    fn power_on(&self) -> Result<Ack> {
        self.get_json("/devices/poweron")
    }

    fn power_off(&self) -> Result<Ack> {
        self.get_json("/devices/poweroff")
    }

    fn register_ports(&self) -> Result<Ack> {
        self.get_json("/ports/register")
    }

    fn available_ports(&self) -> Result<PortList> {
        self.get_json("/ports/available")
    }

    fn register_devices(&self) -> Result<Ack> {
        self.get_json("/devices/register")
    }

    fn available_devices(&self) -> Result<DeviceMap> {
        self.get_json("/devices/available")
    }

    fn submit_read(&self, board_id: &str, address: u32, port_name: &str) -> Result<()> {
        self.post_command(
            "/commands/read",
            &MemoryCommand {
                board_id,
                mem_address: address,
                port_name,
            },
        )
    }

    fn submit_write_invert(&self, board_id: &str, address: u32, port_name: &str) -> Result<()> {
        self.post_command(
            "/commands/write_invert",
            &MemoryCommand {
                board_id,
                mem_address: address,
                port_name,
            },
        )
    }
}
