//! Outbound messaging abstraction.

use core::fmt::Debug;

/// A connection that can deliver sensor readings to the backend.
///
/// The firmware implements this over MQTT; the simulator implements it by
/// writing to the log. The sampling loop is the same either way.
pub trait Messaging {
    /// Transport-specific error type.
    type Error: Debug;

    /// Gives the transport a chance to service its connection (keep-alives,
    /// acknowledgements). Called once per sampling cycle, before the
    /// publish.
    fn upkeep(&mut self) -> impl Future<Output = Result<(), Self::Error>>;

    /// Publishes `payload` to `subtopic` under the transport's configured
    /// topic prefix.
    fn publish(
        &mut self,
        subtopic: &str,
        payload: &str,
    ) -> impl Future<Output = Result<(), Self::Error>>;
}
