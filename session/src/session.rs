//! One active SSRC's whole receive pipeline (§3 "Session", §4): FEC
//! decoder, jitter buffer, depacketiser, resampler, and the latency and
//! watchdog state that steer them. Owned exclusively by the pipeline
//! thread (§5); the network thread only ever touches it through the
//! `crossbeam_channel` input queue the router created for it.

use std::time::{Duration, Instant};

use bytes::Bytes;
use log::{debug, warn};

use rtcast_fec::{Decoder as FecDecoder, Delivery, SchemeKind};
use rtcast_media::{FrameAssembler, InsertOutcome, JitterBuffer, Slot};
use rtcast_rtcp::ReceiverReport;
use rtcast_resampler::{LatencyMonitor, PolyphaseResampler, Profile, ResamplerQuality, SincKernel};
use rtcast_rtp::{Header, Packet};

use crate::packet::ControlPacket;
use crate::rtcp_reporter::ReceiverReportTracker;
use crate::router::SessionInput;
use crate::watchdog::Watchdog;

/// Interval between receiver reports (§6: no configuration option names
/// this directly, so rtcast reuses RTCP's conventional ~5s cadence).
const RECEIVER_REPORT_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Created,
    Active,
    Broken,
    Destroyed,
}

#[derive(Debug, Clone)]
pub struct FecParams {
    pub scheme: SchemeKind,
    pub k: u16,
    pub m: u16,
    pub window_size: u16,
    pub max_sbn_jump: u16,
}

/// The subset of the toplevel configuration (§6) a single session needs.
#[derive(Debug, Clone)]
pub struct SessionParams {
    pub sample_rate: u32,
    pub channels: u16,
    pub samples_per_frame: u32,
    pub fec: Option<FecParams>,
    pub jitter_capacity: u16,
    pub target_latency_ns: i64,
    pub min_latency_ns: i64,
    pub max_latency_ns: i64,
    pub latency_profile: Profile,
    pub resampler_quality: ResamplerQuality,
    pub watchdog_no_packets_ns: u64,
    pub watchdog_broken_frames_ratio: f64,
}

impl Default for SessionParams {
    fn default() -> Self {
        SessionParams {
            sample_rate: 44_100,
            channels: 2,
            samples_per_frame: 441, // 10ms at 44.1kHz
            fec: Some(FecParams { scheme: SchemeKind::ReedSolomonGf8, k: 20, m: 10, window_size: 4, max_sbn_jump: 64 }),
            jitter_capacity: 256,
            target_latency_ns: 100_000_000,
            min_latency_ns: 20_000_000,
            max_latency_ns: 500_000_000,
            latency_profile: Profile::Gentle,
            resampler_quality: ResamplerQuality::Medium,
            watchdog_no_packets_ns: 2_000_000_000,
            watchdog_broken_frames_ratio: 0.5,
        }
    }
}

pub struct Session {
    pub ssrc: u32,
    state: SessionState,
    params: SessionParams,
    fec: Option<FecDecoder>,
    jitter: JitterBuffer,
    assembler: FrameAssembler,
    resampler: PolyphaseResampler,
    latency_monitor: LatencyMonitor,
    watchdog: Watchdog,
    anchor: Option<(u16, u32)>, // (sequence_number, timestamp) of the first source packet seen
    /// The instant `pull_frame`'s `now` is measured against, so the session
    /// never calls `Instant::now()` itself (§5: "no component in the core"
    /// reaches for the wall clock directly — the sink pull supplies it).
    epoch: Instant,
    rtcp_tracker: ReceiverReportTracker,
    last_receiver_report_at: Option<Instant>,
    last_sr_middle32: u32,
    last_sr_received_at: Option<Instant>,
}

impl Session {
    pub fn new(ssrc: u32, params: SessionParams, now: Instant) -> Self {
        let bytes_per_packet = params.samples_per_frame as usize * params.channels as usize * 2;
        let fec = params.fec.as_ref().map(|f| FecDecoder::new(f.scheme, f.k, f.m, f.window_size, f.max_sbn_jump));
        let kernel = SincKernel::build(params.resampler_quality.into());
        Session {
            ssrc,
            state: SessionState::Created,
            fec,
            jitter: JitterBuffer::new(params.jitter_capacity),
            assembler: FrameAssembler::new(params.channels, params.samples_per_frame, bytes_per_packet),
            resampler: PolyphaseResampler::new(kernel, params.channels),
            latency_monitor: LatencyMonitor::new(params.latency_profile, params.target_latency_ns),
            watchdog: Watchdog::new(params.watchdog_no_packets_ns, params.watchdog_broken_frames_ratio),
            anchor: None,
            epoch: now,
            rtcp_tracker: ReceiverReportTracker::new(params.sample_rate, now),
            last_receiver_report_at: None,
            last_sr_middle32: 0,
            last_sr_received_at: None,
            params,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Feeds one input from the router's queue. Source/repair packets go
    /// through the FEC decoder (if configured) and any deliveries are
    /// inserted into the jitter buffer; control packets are handed to the
    /// watchdog/latency bookkeeping path (RTCP content itself is a
    /// pass-through per §9's open question on custom metrics).
    pub fn handle_input(&mut self, input: SessionInput, now: Instant) {
        if self.state == SessionState::Broken {
            return;
        }
        match input {
            SessionInput::Source(packet, arrival) => self.handle_source(packet, arrival, now),
            SessionInput::Repair { fec, symbol } => self.handle_repair(fec, symbol),
            SessionInput::Control(control) => self.handle_control(control, now),
        }
    }

    fn handle_source(&mut self, packet: Packet, arrival: Instant, now: Instant) {
        self.watchdog.note_packet(now);
        if self.anchor.is_none() {
            self.anchor = Some((packet.header.sequence_number, packet.header.timestamp));
        }
        self.rtcp_tracker.note_source_packet(packet.header.sequence_number, packet.header.timestamp, arrival);

        let seq = packet.header.sequence_number;
        let payload = packet.payload.to_vec();

        // The FEC decoder's admission is purely additive (§4.2: "the
        // decoder does not gate delivery — it only inserts
        // reconstructions"): the packet that just arrived goes straight
        // into the jitter buffer regardless of whether FEC is configured.
        // The decoder only ever sees a cloned payload, kept solely to
        // track the block for reconstructing *other* missing indices.
        if self.jitter.insert(packet) == InsertOutcome::DroppedFull {
            debug!("session {}: jitter buffer full, dropped source seq {seq}", self.ssrc);
        }

        if let Some(decoder) = &mut self.fec {
            match decoder.insert_source(seq, payload) {
                Ok(deliveries) => {
                    for delivery in deliveries {
                        self.deliver(delivery);
                    }
                }
                Err(err) => warn!("session {}: FEC insert_source failed: {err}", self.ssrc),
            }
        }

        if self.state == SessionState::Created {
            self.state = SessionState::Active;
        }
    }

    fn handle_repair(&mut self, fec: rtcast_rtp::FecHeader, symbol: Bytes) {
        let Some(decoder) = &mut self.fec else { return };
        match decoder.insert_repair(fec.source_block_number, fec.repair_symbol_id, symbol.to_vec()) {
            Ok(deliveries) => {
                for delivery in deliveries {
                    self.deliver(delivery);
                }
            }
            Err(err) => warn!("session {}: FEC insert_repair failed: {err}", self.ssrc),
        }
    }

    fn deliver(&mut self, delivery: Delivery) {
        match delivery {
            Delivery::Reconstructed { sequence_number, payload } => {
                let timestamp = self.synthesize_timestamp(sequence_number);
                let packet = Packet {
                    header: Header { sequence_number, timestamp, ssrc: self.ssrc, ..Default::default() },
                    payload: Bytes::from(payload),
                };
                if self.jitter.insert(packet) == InsertOutcome::DroppedFull {
                    debug!("session {}: jitter buffer full, dropped reconstructed seq {sequence_number}", self.ssrc);
                }
            }
            Delivery::Loss { sequence_number } => {
                // Nothing to insert: the jitter buffer already emits a loss
                // token for any sequence number whose slot stays empty when
                // the read cursor reaches it.
                debug!("session {}: FEC reports unrecoverable loss at seq {sequence_number}", self.ssrc);
            }
        }
    }

    fn synthesize_timestamp(&self, sequence_number: u16) -> u32 {
        match self.anchor {
            Some((anchor_seq, anchor_ts)) => {
                let delta = rtcast_util::wrap::wrapping_diff16(sequence_number, anchor_seq);
                let samples_per_packet = self.params.samples_per_frame as i64;
                anchor_ts.wrapping_add((delta as i64 * samples_per_packet) as u32)
            }
            None => 0,
        }
    }

    fn handle_control(&mut self, control: ControlPacket, now: Instant) {
        match control {
            ControlPacket::SenderReport(sr) => {
                debug!("session {}: sender report ntp={} rtp_ts={}", self.ssrc, sr.ntp_time, sr.rtp_time);
                self.last_sr_middle32 = ((sr.ntp_time >> 16) & 0xFFFF_FFFF) as u32;
                self.last_sr_received_at = Some(now);
            }
            ControlPacket::ReceiverReport(_) => {
                // A receiver shouldn't usually see its own report kind, but
                // ignoring it is harmless and keeps the parser uniform.
            }
        }
    }

    /// Builds a receiver report if the reporting interval has elapsed
    /// (§4.1 "Control channel"). `None` both when it's not time yet and
    /// when no source packet has ever been seen (nothing to report on).
    pub fn maybe_build_receiver_report(&mut self, now: Instant) -> Option<ReceiverReport> {
        if self.anchor.is_none() {
            return None;
        }
        if self.last_receiver_report_at.is_some_and(|last| now.duration_since(last) < RECEIVER_REPORT_INTERVAL) {
            return None;
        }
        self.last_receiver_report_at = Some(now);

        let delay_since_last_sr = match self.last_sr_received_at {
            Some(received_at) => {
                let elapsed = now.saturating_duration_since(received_at);
                ((elapsed.as_secs_f64() * 65536.0) as u32).min(u32::MAX)
            }
            None => 0,
        };
        Some(self.rtcp_tracker.build_report(self.ssrc, self.last_sr_middle32, delay_since_last_sr))
    }

    /// One sink pull's worth of work for this session (§4.9): advance the
    /// jitter buffer by exactly one slot if play-out time has arrived,
    /// depacketise, and resample to the sink's nominal rate.
    pub fn pull_frame(&mut self, now: Instant, current_latency_ns: i64) -> Option<rtcast_media::Frame> {
        let ready = current_latency_ns >= self.params.min_latency_ns;
        if self.jitter.peek(ready).is_none() {
            return None;
        }
        let slot = self.jitter.advance();
        let interpolated = matches!(slot, Slot::Loss);
        self.watchdog.note_frame(interpolated);

        let frames = self.assembler.push(slot);
        let frame = frames.into_iter().next()?;

        let now_ns = now.saturating_duration_since(self.epoch).as_nanos() as u64;
        let s = match self.latency_monitor.update(now_ns, current_latency_ns) {
            Ok(s) => s,
            Err(_) => {
                warn!("session {}: resampler scaling out of range, flagging broken", self.ssrc);
                self.state = SessionState::Broken;
                1.0
            }
        };
        Some(self.resampler.process_frame(&frame, s))
    }

    /// Capture time of the packet waiting at the jitter buffer's read
    /// cursor, if any — the input to the latency monitor's own readiness
    /// decision (§4.6).
    pub fn head_capture_time(&self) -> Option<u32> {
        self.jitter.head_packet().map(|p| p.header.timestamp)
    }

    pub fn watchdog_check(&mut self, now: Instant) {
        if self.watchdog.is_broken(now) {
            self.state = SessionState::Broken;
        }
    }

    pub fn mark_destroyed(&mut self) {
        self.state = SessionState::Destroyed;
    }
}
