//! Bridge configuration
//!
//! Everything the two ends must agree on out of band lives here: addresses,
//! image and lidar dimensions, and the color image chunk count. Defaults match
//! the stock simulator build, so most programs never load a file.
//!
//! ```yaml
//! host: 127.0.0.1
//! host_port: 5065
//! registration_port: 5064
//! client_port: 5066
//! receive_timeout_ms: 5000
//! update_slow_time: 0.5
//! camera:
//!   depth_divide_factor: 16
//! ```

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::bulk::ChunkLayout;
use crate::types::ColorImage;
use crate::{BridgeError, Result};

/// Largest UDP payload the host can send in one datagram.
pub const MAX_DATAGRAM_SIZE: usize = 65_507;

/// How the client's sockets are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortPolicy {
    /// One socket bound to `client_port` both receives and sends.
    #[default]
    Shared,
    /// Receive on `client_port`, send from a separate ephemeral socket.
    Split,
}

/// Top-level bridge configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Address of the simulation host.
    pub host: IpAddr,
    /// Port the host listens on for calls and acknowledgments.
    pub host_port: u16,
    /// Port the host accepts `connect` and `python_exit` on. `None` skips
    /// registration, for hosts that send frame events to a fixed client port.
    pub registration_port: Option<u16>,
    /// Local address the client binds.
    pub bind_host: IpAddr,
    /// Port the client listens on for frame events and responses.
    pub client_port: u16,
    pub port_policy: PortPolicy,
    /// Give up on a silent host after this many milliseconds. `None` blocks forever.
    pub receive_timeout_ms: Option<u64>,
    /// Seconds of simulation time between `update_slow` calls. `None` disables them.
    pub update_slow_time: Option<f32>,
    /// `tracing` filter directive used by [`crate::logging::init`].
    pub log_filter: Option<String>,
    pub camera: CameraConfig,
    pub lidar: LidarConfig,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            host_port: 5065,
            registration_port: Some(5064),
            bind_host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            client_port: 5066,
            port_policy: PortPolicy::Shared,
            receive_timeout_ms: None,
            update_slow_time: Some(1.0),
            log_filter: None,
            camera: CameraConfig::default(),
            lidar: LidarConfig::default(),
        }
    }
}

/// Camera resolution contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub width: usize,
    pub height: usize,
    /// Number of datagrams a color image is split into.
    pub color_chunks: usize,
    /// Depth image is `width / factor` by `height / factor`.
    pub depth_divide_factor: usize,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self { width: 640, height: 480, color_chunks: 32, depth_divide_factor: 8 }
    }
}

impl CameraConfig {
    pub fn color_len(&self) -> usize {
        self.width * self.height * ColorImage::BYTES_PER_PIXEL
    }

    pub fn chunk_layout(&self) -> ChunkLayout {
        ChunkLayout::split(self.color_len(), self.color_chunks)
    }

    pub fn depth_width(&self) -> usize {
        self.width / self.depth_divide_factor.max(1)
    }

    pub fn depth_height(&self) -> usize {
        self.height / self.depth_divide_factor.max(1)
    }

    /// Number of f32 samples in a depth image.
    pub fn depth_samples(&self) -> usize {
        self.depth_width() * self.depth_height()
    }
}

/// Lidar scan contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LidarConfig {
    pub num_samples: usize,
}

impl Default for LidarConfig {
    fn default() -> Self {
        Self { num_samples: 720 }
    }
}

impl BridgeConfig {
    /// Parse and validate a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: BridgeConfig = serde_yaml_ng::from_str(yaml).map_err(|e| {
            BridgeError::config_with_source("Failed to parse bridge configuration", Box::new(e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading bridge configuration from {}", path.display());
        let yaml = std::fs::read_to_string(path).map_err(|e| {
            BridgeError::config_with_source(
                format!("Failed to read {}", path.display()),
                Box::new(e),
            )
        })?;
        Self::from_yaml_str(&yaml)
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        serde_yaml_ng::to_string(self).map_err(|e| {
            BridgeError::config_with_source("Failed to serialize bridge configuration", Box::new(e))
        })
    }

    /// Check the out-of-band contracts both ends rely on.
    pub fn validate(&self) -> Result<()> {
        let camera = &self.camera;
        if camera.width == 0 || camera.height == 0 {
            return Err(BridgeError::config("Camera dimensions must be nonzero"));
        }
        if camera.color_chunks == 0 {
            return Err(BridgeError::config("Color image chunk count must be nonzero"));
        }
        if camera.color_len() % camera.color_chunks != 0 {
            return Err(BridgeError::config(format!(
                "Color image of {} bytes does not split into {} equal chunks",
                camera.color_len(),
                camera.color_chunks
            )));
        }
        if camera.chunk_layout().chunk_size > MAX_DATAGRAM_SIZE {
            return Err(BridgeError::config(format!(
                "Color chunk of {} bytes exceeds the {} byte datagram limit",
                camera.chunk_layout().chunk_size,
                MAX_DATAGRAM_SIZE
            )));
        }
        if camera.depth_divide_factor == 0 || camera.depth_samples() == 0 {
            return Err(BridgeError::config("Depth image would be empty"));
        }
        if camera.depth_samples() * 4 > MAX_DATAGRAM_SIZE {
            return Err(BridgeError::config(format!(
                "Depth image of {} bytes does not fit in one datagram",
                camera.depth_samples() * 4
            )));
        }

        let lidar_len = self.lidar.num_samples * 4;
        if lidar_len == 0 || lidar_len > MAX_DATAGRAM_SIZE {
            return Err(BridgeError::config(format!(
                "Lidar scan of {} samples does not fit in one datagram",
                self.lidar.num_samples
            )));
        }

        if let Some(interval) = self.update_slow_time {
            if !interval.is_finite() || interval <= 0.0 {
                return Err(BridgeError::config(format!(
                    "update_slow_time must be positive, got {}",
                    interval
                )));
            }
        }

        Ok(())
    }

    pub fn host_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.host_port)
    }

    pub fn registration_addr(&self) -> Option<SocketAddr> {
        self.registration_port.map(|port| SocketAddr::new(self.host, port))
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_host, self.client_port)
    }

    pub fn receive_timeout(&self) -> Option<Duration> {
        self.receive_timeout_ms.map(Duration::from_millis)
    }

    /// Largest datagram the client must be able to receive.
    pub fn max_datagram_len(&self) -> usize {
        self.camera
            .chunk_layout()
            .chunk_size
            .max(self.camera.depth_samples() * 4)
            .max(self.lidar.num_samples * 4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_stock_simulator() {
        let config = BridgeConfig::default();
        config.validate().unwrap();

        assert_eq!(config.host_addr(), "127.0.0.1:5065".parse().unwrap());
        assert_eq!(config.bind_addr(), "127.0.0.1:5066".parse().unwrap());
        assert_eq!(config.registration_addr(), Some("127.0.0.1:5064".parse().unwrap()));
        assert_eq!(config.camera.chunk_layout(), ChunkLayout { chunk_count: 32, chunk_size: 38_400 });
        assert_eq!(config.camera.depth_width(), 80);
        assert_eq!(config.camera.depth_height(), 60);
        assert_eq!(config.max_datagram_len(), 38_400);
        assert_eq!(config.receive_timeout(), None);
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let yaml = r#"
host_port: 6000
receive_timeout_ms: 250
update_slow_time: ~
registration_port: ~
port_policy: split
camera:
  depth_divide_factor: 16
"#;
        let config = BridgeConfig::from_yaml_str(yaml).unwrap();

        assert_eq!(config.host_port, 6000);
        assert_eq!(config.client_port, 5066);
        assert_eq!(config.port_policy, PortPolicy::Split);
        assert_eq!(config.receive_timeout(), Some(Duration::from_millis(250)));
        assert_eq!(config.update_slow_time, None);
        assert_eq!(config.registration_addr(), None);
        assert_eq!(config.camera.width, 640);
        assert_eq!(config.camera.depth_samples(), 40 * 30);
    }

    #[test]
    fn yaml_round_trip() {
        let config = BridgeConfig { log_filter: Some("racecar_link=debug".into()), ..Default::default() };
        let yaml = config.to_yaml_string().unwrap();
        assert_eq!(BridgeConfig::from_yaml_str(&yaml).unwrap(), config);
    }

    #[test]
    fn uneven_chunking_is_rejected() {
        let yaml = "camera:\n  color_chunks: 7\n";
        let err = BridgeConfig::from_yaml_str(yaml).unwrap_err();
        assert!(matches!(err, BridgeError::Config { .. }));
        assert!(err.to_string().contains("7 equal chunks"));
    }

    #[test]
    fn oversized_chunks_are_rejected() {
        let mut config = BridgeConfig::default();
        config.camera.color_chunks = 2;
        assert!(config.validate().is_err());
    }

    #[test]
    fn nonpositive_slow_interval_is_rejected() {
        let config = BridgeConfig { update_slow_time: Some(0.0), ..Default::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn malformed_yaml_keeps_parser_source() {
        let err = BridgeConfig::from_yaml_str("host_port: [not, a, port]").unwrap_err();
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let err = BridgeConfig::load("/nonexistent/racecar.yaml").unwrap_err();
        assert!(matches!(err, BridgeError::Config { .. }));
    }
}
