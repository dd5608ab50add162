use bincode::config::standard;
use bincode::serde::encode_to_vec;
use tracing::debug;

use common::protocol::{Audience, Outcome, ServerMessage};

/// The transport's side of the boundary. Delivery is fire-and-forget: the
/// engine hands encoded payloads over and never waits for confirmation.
pub trait DeliveryHandle {
    fn send_to_caller(&mut self, message: Vec<u8>);
    fn broadcast(&mut self, session_id: &str, message: Vec<u8>);
    fn broadcast_except_caller(&mut self, session_id: &str, message: Vec<u8>);
}

/// Routes one operation's outcome onto the wire: the reply to the caller,
/// each broadcast to its audience.
pub fn dispatch(session_id: &str, outcome: &Outcome, network: &mut dyn DeliveryHandle) {
    if let Some(reply) = &outcome.reply {
        debug!(session = session_id, message = reply.variant_name(), "reply");
        network.send_to_caller(encode(reply));
    }

    for broadcast in &outcome.broadcasts {
        debug!(
            session = session_id,
            message = broadcast.message.variant_name(),
            audience = ?broadcast.audience,
            "broadcast"
        );
        let payload = encode(&broadcast.message);
        match broadcast.audience {
            Audience::Everyone => network.broadcast(session_id, payload),
            Audience::Others => network.broadcast_except_caller(session_id, payload),
        }
    }
}

fn encode(message: &ServerMessage) -> Vec<u8> {
    encode_to_vec(message, standard()).expect("failed to serialize server message")
}
