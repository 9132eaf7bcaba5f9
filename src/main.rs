//! `rtcast`: a CLI binary tying the sender and receiver pipelines to a UDP
//! socket and raw-PCM files (§1 "explicitly out of scope": "The C API
//! surface, the CLI tools, and configuration/logging scaffolding" — this
//! is exactly that scaffolding, kept as thin as the core's interfaces
//! allow).

mod config;
mod logging;
mod net;

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use clap::Parser;
use log::{info, warn};

use rtcast_session::{MixPolicy, Mixer, Pipeline, Router};

use config::{load_file_config, rtcp_interval, session_params, Cli, Mode};
use net::{RawPcmFileSink, RawPcmFileSource, UdpNetwork};

/// Seconds between the NTP epoch (1900-01-01) and the Unix epoch
/// (1970-01-01), for converting `SystemTime` to RTCP's NTP timestamps.
const NTP_UNIX_EPOCH_OFFSET_SECS: u64 = 2_208_988_800;

fn since_ntp_epoch(now: SystemTime) -> Duration {
    let since_unix = now.duration_since(UNIX_EPOCH).unwrap_or(Duration::ZERO);
    since_unix + Duration::from_secs(NTP_UNIX_EPOCH_OFFSET_SECS)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(&cli.log_level);
    let file_config = load_file_config(&cli.config)?;

    match cli.mode {
        Mode::Receive { listen, out, mut audio, mut fec, mut latency } => {
            if let Some(file_audio) = file_config.audio {
                audio = file_audio;
            }
            if let Some(file_fec) = file_config.fec {
                fec = file_fec;
            }
            if let Some(file_latency) = file_config.latency {
                latency = file_latency;
            }
            run_receiver(listen, &out, audio, fec, latency)
        }
        Mode::Send { peer, input, ssrc, payload_type, max_payload_len, mut audio, mut fec } => {
            if let Some(file_audio) = file_config.audio {
                audio = file_audio;
            }
            if let Some(file_fec) = file_config.fec {
                fec = file_fec;
            }
            run_sender(peer, &input, ssrc, payload_type, max_payload_len, audio, fec)
        }
    }
}

fn run_receiver(
    listen: SocketAddr,
    out: &std::path::Path,
    audio: config::AudioArgs,
    fec: config::FecArgs,
    latency: config::LatencyArgs,
) -> anyhow::Result<()> {
    let params = session_params(&audio, &fec, &latency);
    let sample_rate = params.sample_rate;
    let samples_per_frame = params.samples_per_frame;
    let channels = params.channels;

    let network = Arc::new(UdpNetwork::bind(listen)?);
    network.set_poll_timeout(Duration::from_millis(200))?;
    info!("rtcast receiver listening on {listen}, writing pcm to {}", out.display());

    let (new_sessions_tx, new_sessions_rx) = crossbeam_channel::unbounded();
    let router = Arc::new(Router::new(latency.max_sessions, params.clone(), new_sessions_tx));
    let last_peer: Arc<Mutex<Option<SocketAddr>>> = Arc::new(Mutex::new(None));
    let dropped = Arc::new(AtomicU64::new(0));

    let _net_thread = {
        let network = network.clone();
        let router = router.clone();
        let last_peer = last_peer.clone();
        let dropped = dropped.clone();
        std::thread::spawn(move || {
            let mut buf = vec![0u8; 2048];
            loop {
                match network.recv(&mut buf) {
                    Ok((n, peer)) => {
                        *last_peer.lock().unwrap() = Some(peer);
                        router.handle_datagram(&buf[..n], Instant::now());
                    }
                    Err(err) if err.kind() == std::io::ErrorKind::WouldBlock || err.kind() == std::io::ErrorKind::TimedOut => {
                        continue;
                    }
                    Err(err) => {
                        dropped.fetch_add(1, Ordering::Relaxed);
                        warn!("udp recv error: {err}");
                    }
                }
            }
        })
    };

    let sink = RawPcmFileSink::create(out)?;
    let mixer = Mixer::new(channels, MixPolicy::Saturating);
    let mut pipeline = Pipeline::new(router, new_sessions_rx, params, sink, mixer, sample_rate, samples_per_frame);

    let frame_duration = Duration::from_secs_f64(samples_per_frame as f64 / sample_rate as f64);
    let mut last_rtcp_poll = Instant::now();
    loop {
        let now = Instant::now();
        pipeline.tick(now);

        if now.duration_since(last_rtcp_poll) >= rtcp_interval() {
            last_rtcp_poll = now;
            if let Some(peer) = *last_peer.lock().unwrap() {
                for (ssrc, report) in pipeline.pull_receiver_reports(now) {
                    let datagram = emit_receiver_report_datagram(ssrc, &report);
                    if let Err(err) = network.send_to(&datagram, peer) {
                        warn!("failed sending receiver report: {err}");
                    }
                }
            }
        }

        std::thread::sleep(frame_duration);
    }
}

fn emit_receiver_report_datagram(ssrc: u32, report: &rtcast_rtcp::ReceiverReport) -> bytes::Bytes {
    rtcast_sender::packet_emitter::emit_receiver_report(ssrc, report)
}

fn run_sender(
    peer: SocketAddr,
    input: &std::path::Path,
    ssrc: u32,
    payload_type: u8,
    max_payload_len: usize,
    audio: config::AudioArgs,
    fec: config::FecArgs,
) -> anyhow::Result<()> {
    let network = UdpNetwork::bind("0.0.0.0:0".parse().unwrap())?;
    network.connect(peer)?;
    info!("rtcast sender streaming {} to {peer}", input.display());

    let source = RawPcmFileSource::open(input)?;
    let fec_params = if fec.fec_scheme == config::FecSchemeArg::None {
        None
    } else {
        Some((fec.fec_block_source_count, fec.fec_block_repair_count))
    };
    let session = rtcast_sender::SenderSession::new(rtcast_sender::SenderParams {
        ssrc,
        payload_type,
        channels: audio.channels,
        max_payload_len,
        fec: fec_params,
        rtcp_interval: rtcp_interval(),
    })?;
    let mut pipeline = rtcast_sender::SenderPipeline::new(source, session, audio.channels);

    let bytes_per_sample_frame = audio.channels as usize * 2;
    let mut scratch = vec![0u8; max_payload_len.max(bytes_per_sample_frame) * 4];
    let frame_duration = Duration::from_secs_f64(audio.samples_per_frame as f64 / audio.sample_rate as f64);
    let start = Instant::now();

    loop {
        let now = Instant::now();
        let datagrams = pipeline.tick(&mut scratch, now, since_ntp_epoch(SystemTime::now()))?;
        for datagram in &datagrams {
            if let Err(err) = network.send(datagram) {
                warn!("udp send error: {err}");
            }
        }
        let elapsed = now.duration_since(start);
        let _ = elapsed;
        std::thread::sleep(frame_duration);
    }
}
