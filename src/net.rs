//! Concrete collaborators for the interfaces the core only specifies as
//! boundaries (§1, §6): a UDP socket for the "network" collaborator, and
//! raw-PCM file I/O standing in for the "source"/"sink" audio device (file
//! format codecs and device backends are explicitly out of scope; a
//! headerless PCM file sidesteps both).

use std::fs::File;
use std::io::{Read, Write};
use std::net::{SocketAddr, UdpSocket};
use std::path::Path;
use std::time::Duration;

use anyhow::Context;

/// Thin wrapper over a bound UDP socket: yields `(bytes, arrival)` to the
/// network thread and accepts outgoing `(bytes, dest)` (§6 "network"
/// collaborator).
pub struct UdpNetwork {
    socket: UdpSocket,
}

impl UdpNetwork {
    pub fn bind(addr: SocketAddr) -> anyhow::Result<Self> {
        let socket = UdpSocket::bind(addr).with_context(|| format!("binding udp socket on {addr}"))?;
        Ok(UdpNetwork { socket })
    }

    /// Blocking receive with a read timeout, so the network thread can
    /// still poll for shutdown between packets instead of blocking
    /// forever (§5 "the network thread suspends only inside the event
    /// loop's poll").
    pub fn set_poll_timeout(&self, timeout: Duration) -> anyhow::Result<()> {
        self.socket.set_read_timeout(Some(timeout))?;
        Ok(())
    }

    pub fn recv(&self, buf: &mut [u8]) -> std::io::Result<(usize, SocketAddr)> {
        self.socket.recv_from(buf)
    }

    pub fn send_to(&self, buf: &[u8], dest: SocketAddr) -> std::io::Result<usize> {
        self.socket.send_to(buf, dest)
    }

    pub fn connect(&self, dest: SocketAddr) -> std::io::Result<()> {
        self.socket.connect(dest)
    }

    pub fn send(&self, buf: &[u8]) -> std::io::Result<usize> {
        self.socket.send(buf)
    }
}

/// Reads interleaved PCM16 sample bytes from a headerless file, looping
/// back to the start at EOF so a short test file can drive a long-running
/// send (§6 "source collaborator").
pub struct RawPcmFileSource {
    file: File,
}

impl RawPcmFileSource {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let file = File::open(path).with_context(|| format!("opening pcm source {}", path.display()))?;
        Ok(RawPcmFileSource { file })
    }
}

impl rtcast_sender::Source for RawPcmFileSource {
    fn push(&mut self, frame_buffer: &mut [u8]) -> usize {
        let mut filled = 0;
        while filled < frame_buffer.len() {
            match self.file.read(&mut frame_buffer[filled..]) {
                Ok(0) => {
                    if self.file.rewind().is_err() {
                        break;
                    }
                    if filled == 0 {
                        continue;
                    }
                    break;
                }
                Ok(n) => filled += n,
                Err(_) => break,
            }
        }
        filled
    }
}

/// Writes decoded PCM16 sample bytes to a file as they're pulled from the
/// mixer (§6 "sink collaborator"). No pacing of its own: the caller
/// decides the cadence the pipeline is driven at.
pub struct RawPcmFileSink {
    file: File,
}

impl RawPcmFileSink {
    pub fn create(path: &Path) -> anyhow::Result<Self> {
        let file = File::create(path).with_context(|| format!("creating pcm sink {}", path.display()))?;
        Ok(RawPcmFileSink { file })
    }
}

impl rtcast_session::Sink for RawPcmFileSink {
    fn pull(&mut self, frame_buffer: &[u8], _nominal_ts: u64) -> usize {
        match self.file.write_all(frame_buffer) {
            Ok(()) => frame_buffer.len(),
            Err(_) => 0,
        }
    }
}
