//! Looks up or creates the per-SSRC session and dispatches a parsed
//! datagram to it (§4.1 `route`). Runs on the network thread; never
//! touches audio state directly, only pushes onto a session's lock-free
//! input queue (§5).

use std::time::Instant;

use ahash::AHashMap;
use crossbeam_channel::{Receiver, Sender};
use log::{debug, warn};

use crate::packet::{ControlPacket, ParsedPacket, ParsedPayload};
use crate::session::SessionParams;

/// What the router hands a session, on its input queue.
#[derive(Debug)]
pub enum SessionInput {
    Source(rtcast_rtp::Packet, Instant),
    Repair { fec: rtcast_rtp::FecHeader, symbol: bytes::Bytes },
    Control(ControlPacket),
}

struct SessionEntry {
    input: Sender<SessionInput>,
    broken: std::sync::Arc<std::sync::atomic::AtomicBool>,
}

/// Owns the SSRC -> session lookup table (§5 "hashed open-addressing
/// table protected by a read-mostly lock") and creates new sessions on
/// first unknown SSRC, up to `max_sessions`.
pub struct Router {
    sessions: parking_lot::RwLock<AHashMap<u32, SessionEntry>>,
    max_sessions: usize,
    params: SessionParams,
    new_sessions: Sender<(u32, Receiver<SessionInput>, std::sync::Arc<std::sync::atomic::AtomicBool>)>,
    dropped_malformed: std::sync::atomic::AtomicU64,
    dropped_session_cap: std::sync::atomic::AtomicU64,
}

impl Router {
    pub fn new(
        max_sessions: usize,
        params: SessionParams,
        new_sessions: Sender<(u32, Receiver<SessionInput>, std::sync::Arc<std::sync::atomic::AtomicBool>)>,
    ) -> Self {
        Router {
            sessions: parking_lot::RwLock::new(AHashMap::new()),
            max_sessions,
            params,
            new_sessions,
            dropped_malformed: std::sync::atomic::AtomicU64::new(0),
            dropped_session_cap: std::sync::atomic::AtomicU64::new(0),
        }
    }

    /// Parses and routes one raw datagram. Malformed datagrams and
    /// datagrams for a session at capacity are dropped and counted rather
    /// than propagated (§4.1 "Edge cases").
    pub fn handle_datagram(&self, datagram: &[u8], arrival_time: Instant) {
        let parsed = match crate::packet::parse(datagram, arrival_time) {
            Ok(parsed) => parsed,
            Err(err) => {
                self.dropped_malformed.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
                debug!("dropping malformed datagram: {err}");
                return;
            }
        };
        self.route(parsed);
    }

    fn route(&self, parsed: ParsedPacket) {
        let ssrc = parsed.ssrc;

        if let Some(entry) = self.sessions.read().get(&ssrc) {
            if entry.broken.load(std::sync::atomic::Ordering::Relaxed) {
                return; // dropped: session is broken (§4.1 "Edge cases")
            }
            let _ = entry.input.send(to_input(parsed.payload, parsed.arrival_time));
            return;
        }

        // Unknown SSRC: only a source (audio) packet may create a session.
        let is_audio = matches!(parsed.payload, ParsedPayload::Source(_));
        if !is_audio {
            return;
        }

        let mut sessions = self.sessions.write();
        if let Some(entry) = sessions.get(&ssrc) {
            let _ = entry.input.send(to_input(parsed.payload, parsed.arrival_time));
            return;
        }
        if sessions.len() >= self.max_sessions {
            self.dropped_session_cap.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
            warn!("session table at capacity ({}), dropping packet for new ssrc {ssrc}", self.max_sessions);
            return;
        }

        let (tx, rx) = crossbeam_channel::unbounded();
        let broken = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));
        sessions.insert(ssrc, SessionEntry { input: tx.clone(), broken: broken.clone() });
        let _ = tx.send(to_input(parsed.payload, parsed.arrival_time));
        let _ = self.new_sessions.send((ssrc, rx, broken));
        debug!("created session for new ssrc {ssrc} (params {:?})", self.params);
    }

    /// Drops a session from the table once the pipeline thread has
    /// destroyed it (§5 "Cancellation").
    pub fn remove(&self, ssrc: u32) {
        self.sessions.write().remove(&ssrc);
    }

    pub fn dropped_malformed_count(&self) -> u64 {
        self.dropped_malformed.load(std::sync::atomic::Ordering::Relaxed)
    }
}

fn to_input(payload: ParsedPayload, arrival_time: Instant) -> SessionInput {
    match payload {
        ParsedPayload::Source(packet) => SessionInput::Source(packet, arrival_time),
        ParsedPayload::Repair { fec, symbol } => SessionInput::Repair { fec, symbol },
        ParsedPayload::Control(control) => SessionInput::Control(control),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use rtcast_rtp::{Header, Packet};
    use rtcast_util::marshal::Marshal;

    fn source_datagram(ssrc: u32, seq: u16) -> Vec<u8> {
        let packet = Packet {
            header: Header { sequence_number: seq, ssrc, timestamp: 0, ..Default::default() },
            payload: Bytes::from_static(&[0; 8]),
        };
        let mut raw = vec![0u8];
        raw.extend_from_slice(&ssrc.to_be_bytes());
        raw.extend_from_slice(&packet.marshal().unwrap());
        raw
    }

    #[test]
    fn first_packet_creates_a_session() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let router = Router::new(8, SessionParams::default(), tx);
        router.handle_datagram(&source_datagram(42, 0), Instant::now());
        let (ssrc, _input_rx, _broken) = rx.try_recv().expect("a new session should have been announced");
        assert_eq!(ssrc, 42);
    }

    #[test]
    fn session_cap_drops_new_ssrcs() {
        let (tx, _rx) = crossbeam_channel::unbounded();
        let router = Router::new(1, SessionParams::default(), tx);
        router.handle_datagram(&source_datagram(1, 0), Instant::now());
        router.handle_datagram(&source_datagram(2, 0), Instant::now());
        assert_eq!(router.sessions.read().len(), 1);
    }

    #[test]
    fn malformed_datagrams_are_counted_not_propagated() {
        let (tx, _rx) = crossbeam_channel::unbounded();
        let router = Router::new(8, SessionParams::default(), tx);
        router.handle_datagram(&[9, 0, 0, 0, 0], Instant::now());
        assert_eq!(router.dropped_malformed_count(), 1);
    }
}
