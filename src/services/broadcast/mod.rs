//! Fan-out of tracker events to websocket subscribers.
//!
//! [`BroadcastHub`] owns the live connection set, each
//! [`SubscriberConnection`] owns its outbound queue, and
//! [`BroadcastServer`] admits websocket clients into the hub.

mod connection;
mod error;
mod hub;
mod server;
mod sink;
mod wire;


pub use connection::{ConnectionId, SubscriberConnection};
pub use error::TransportError;
pub use hub::{BroadcastHub, ConnectObserver, DisconnectObserver};
pub use server::BroadcastServer;
pub use sink::{MessageSink, WebSocketSink};
pub use wire::{WireEvent, WireMessage, WirePayload, encode};
