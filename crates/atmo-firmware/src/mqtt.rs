//! MQTT session the sampling loop publishes through.

use core::fmt::Write;

use atmo_core::telemetry::Messaging;
use embassy_net::{
    Ipv4Address, Stack,
    tcp::{ConnectError, TcpSocket},
};
use embassy_time::Duration;
use log::{debug, info};
use rust_mqtt::{
    client::{
        client::MqttClient,
        client_config::{ClientConfig, MqttVersion},
    },
    packet::v5::{publish_packet::QualityOfService, reason_codes::ReasonCode},
    utils::rng_generator::CountingRng,
};

use crate::config;

/// TCP socket buffer size, each direction.
pub const SOCKET_BUFFER_SIZE: usize = 1024;

/// MQTT client buffer size, each direction. Bounds the largest packet the
/// session can send or receive.
pub const CLIENT_BUFFER_SIZE: usize = 256;

const FULL_TOPIC_CAPACITY: usize = 128;

/// Errors from establishing the session.
#[derive(Debug)]
pub enum SessionError {
    /// The TCP connection to the broker could not be opened.
    Tcp(ConnectError),
    /// The broker refused the MQTT handshake.
    Mqtt(ReasonCode),
}

/// An established MQTT connection.
///
/// Publishes go to `<MQTT_TOPIC_PREFIX>/<subtopic>` at QoS 0 and the
/// session answers the broker's keep-alive expectations through
/// [`Messaging::upkeep`].
pub struct MqttSession<'a> {
    client: MqttClient<'a, TcpSocket<'a>, 5, CountingRng>,
}

impl<'a> MqttSession<'a> {
    /// Opens a TCP connection to `broker` and performs the MQTT handshake.
    ///
    /// The buffers back the socket and the client for the lifetime of the
    /// session, so the caller keeps them alive alongside it.
    pub async fn connect(
        stack: Stack<'a>,
        broker: (Ipv4Address, u16),
        rx_buffer: &'a mut [u8],
        tx_buffer: &'a mut [u8],
        write_buffer: &'a mut [u8],
        recv_buffer: &'a mut [u8],
    ) -> Result<Self, SessionError> {
        let mut socket = TcpSocket::new(stack, rx_buffer, tx_buffer);
        socket.set_timeout(Some(Duration::from_secs(30)));

        info!("Connecting to MQTT broker at {}:{}", broker.0, broker.1);
        socket.connect(broker).await.map_err(SessionError::Tcp)?;

        let mut client_config = ClientConfig::new(MqttVersion::MQTTv5, CountingRng(20000));
        client_config.add_max_subscribe_qos(QualityOfService::QoS0);
        client_config.add_client_id(config::MQTT_CLIENT_ID);
        client_config.max_packet_size = CLIENT_BUFFER_SIZE as u32;

        let write_buffer_len = write_buffer.len();
        let recv_buffer_len = recv_buffer.len();
        let mut client = MqttClient::<_, 5, _>::new(
            socket,
            write_buffer,
            write_buffer_len,
            recv_buffer,
            recv_buffer_len,
            client_config,
        );

        client
            .connect_to_broker()
            .await
            .map_err(SessionError::Mqtt)?;
        info!("MQTT session established as '{}'", config::MQTT_CLIENT_ID);

        Ok(Self { client })
    }
}

impl Messaging for MqttSession<'_> {
    type Error = ReasonCode;

    /// Sends a PINGREQ so the broker sees the client between publishes.
    async fn upkeep(&mut self) -> Result<(), Self::Error> {
        self.client.send_ping().await
    }

    async fn publish(&mut self, subtopic: &str, payload: &str) -> Result<(), Self::Error> {
        let mut topic = heapless::String::<FULL_TOPIC_CAPACITY>::new();
        write!(topic, "{}/{}", config::MQTT_TOPIC_PREFIX, subtopic)
            .map_err(|_| ReasonCode::BuffError)?;

        debug!("Publishing {} bytes to '{topic}'", payload.len());

        self.client
            .send_message(&topic, payload.as_bytes(), QualityOfService::QoS0, false)
            .await
    }
}
