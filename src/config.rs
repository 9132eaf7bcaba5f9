//! The configuration surface enumerated in §6 ("Configuration (enumerated
//! options)"), exposed as a CLI (`clap`) layered over an optional TOML
//! file (`serde` + `toml`), the way `mycrl-turn-rs` layers its own CLI
//! over a `serde_json5` config file. Out of scope for the core itself,
//! but the binary crate still needs a concrete place to put it.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use serde::Deserialize;

use rtcast_fec::SchemeKind;
use rtcast_resampler::{Profile, ResamplerQuality};
use rtcast_session::{FecParams, SessionParams};

#[derive(Parser, Debug)]
#[command(name = "rtcast", version, about = "Real-time PCM audio streaming over RTP/UDP with block FEC")]
pub struct Cli {
    #[command(subcommand)]
    pub mode: Mode,

    /// Optional TOML config file; CLI flags override values it sets.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,
}

#[derive(clap::Subcommand, Debug)]
pub enum Mode {
    /// Receive a stream and write decoded PCM to a file.
    Receive {
        #[arg(long, default_value = "0.0.0.0:5004")]
        listen: SocketAddr,
        #[arg(long)]
        out: PathBuf,
        #[command(flatten)]
        audio: AudioArgs,
        #[command(flatten)]
        fec: FecArgs,
        #[command(flatten)]
        latency: LatencyArgs,
    },
    /// Read raw PCM from a file and send it to a receiver.
    Send {
        #[arg(long)]
        peer: SocketAddr,
        #[arg(long)]
        input: PathBuf,
        #[arg(long, default_value_t = 1)]
        ssrc: u32,
        #[arg(long, default_value_t = 96)]
        payload_type: u8,
        #[arg(long, default_value_t = 1200)]
        max_payload_len: usize,
        #[command(flatten)]
        audio: AudioArgs,
        #[command(flatten)]
        fec: FecArgs,
    },
}

#[derive(clap::Args, Debug, Clone, Deserialize)]
pub struct AudioArgs {
    #[arg(long, default_value_t = 44_100)]
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    #[arg(long, default_value_t = 2)]
    #[serde(default = "default_channels")]
    pub channels: u16,
    #[arg(long, default_value_t = 441)]
    #[serde(default = "default_samples_per_frame")]
    pub samples_per_frame: u32,
}

fn default_sample_rate() -> u32 {
    44_100
}
fn default_channels() -> u16 {
    2
}
fn default_samples_per_frame() -> u32 {
    441
}

#[derive(clap::Args, Debug, Clone, Deserialize)]
pub struct FecArgs {
    #[arg(long, value_enum, default_value_t = FecSchemeArg::ReedSolomonGf8)]
    #[serde(default)]
    pub fec_scheme: FecSchemeArg,
    #[arg(long, default_value_t = 20)]
    #[serde(default = "default_k")]
    pub fec_block_source_count: u16,
    #[arg(long, default_value_t = 10)]
    #[serde(default = "default_m")]
    pub fec_block_repair_count: u16,
    #[arg(long, default_value_t = 4)]
    #[serde(default = "default_window")]
    pub fec_window_size: u16,
    #[arg(long, default_value_t = 64)]
    #[serde(default = "default_sbn_jump")]
    pub fec_max_sbn_jump: u16,
}

fn default_k() -> u16 {
    20
}
fn default_m() -> u16 {
    10
}
fn default_window() -> u16 {
    4
}
fn default_sbn_jump() -> u16 {
    64
}

#[derive(ValueEnum, Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum FecSchemeArg {
    None,
    #[default]
    ReedSolomonGf8,
    ReedSolomonGf2m,
    LdpcStaircase,
}

impl From<FecSchemeArg> for SchemeKind {
    fn from(arg: FecSchemeArg) -> Self {
        match arg {
            FecSchemeArg::None => SchemeKind::None,
            FecSchemeArg::ReedSolomonGf8 => SchemeKind::ReedSolomonGf8,
            FecSchemeArg::ReedSolomonGf2m => SchemeKind::ReedSolomonGf2m,
            FecSchemeArg::LdpcStaircase => SchemeKind::LdpcStaircase,
        }
    }
}

#[derive(clap::Args, Debug, Clone, Deserialize)]
pub struct LatencyArgs {
    #[arg(long, default_value_t = 100_000_000)]
    #[serde(default = "default_target_latency")]
    pub target_latency_ns: i64,
    #[arg(long, default_value_t = 20_000_000)]
    #[serde(default = "default_min_latency")]
    pub min_latency_ns: i64,
    #[arg(long, default_value_t = 500_000_000)]
    #[serde(default = "default_max_latency")]
    pub max_latency_ns: i64,
    #[arg(long, value_enum, default_value_t = LatencyProfileArg::Gentle)]
    #[serde(default)]
    pub latency_profile: LatencyProfileArg,
    #[arg(long, value_enum, default_value_t = ResamplerQualityArg::Medium)]
    #[serde(default)]
    pub resampler_quality: ResamplerQualityArg,
    #[arg(long, default_value_t = 2_000_000_000)]
    #[serde(default = "default_watchdog_no_packets")]
    pub watchdog_no_packets_ns: u64,
    #[arg(long, default_value_t = 0.5)]
    #[serde(default = "default_watchdog_ratio")]
    pub watchdog_broken_frames_ratio: f64,
    #[arg(long, default_value_t = 256)]
    #[serde(default = "default_jitter_capacity")]
    pub jitter_capacity: u16,
    #[arg(long, default_value_t = 64)]
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
}

fn default_target_latency() -> i64 {
    100_000_000
}
fn default_min_latency() -> i64 {
    20_000_000
}
fn default_max_latency() -> i64 {
    500_000_000
}
fn default_watchdog_no_packets() -> u64 {
    2_000_000_000
}
fn default_watchdog_ratio() -> f64 {
    0.5
}
fn default_jitter_capacity() -> u16 {
    256
}
fn default_max_sessions() -> usize {
    64
}

#[derive(ValueEnum, Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum LatencyProfileArg {
    Responsive,
    #[default]
    Gentle,
}

impl From<LatencyProfileArg> for Profile {
    fn from(arg: LatencyProfileArg) -> Self {
        match arg {
            LatencyProfileArg::Responsive => Profile::Responsive,
            LatencyProfileArg::Gentle => Profile::Gentle,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ResamplerQualityArg {
    Low,
    #[default]
    Medium,
    High,
}

impl From<ResamplerQualityArg> for ResamplerQuality {
    fn from(arg: ResamplerQualityArg) -> Self {
        match arg {
            ResamplerQualityArg::Low => ResamplerQuality::Low,
            ResamplerQualityArg::Medium => ResamplerQuality::Medium,
            ResamplerQualityArg::High => ResamplerQuality::High,
        }
    }
}

/// A config file mirrors the same fields as the CLI's flattened args, so
/// a user can check in a TOML file instead of repeating flags. Only
/// `[audio]`, `[fec]`, and `[latency]` tables are recognized; listen/peer
/// addresses and file paths stay CLI-only since they're per-invocation.
#[derive(Deserialize, Debug, Default)]
pub struct FileConfig {
    pub audio: Option<AudioArgs>,
    pub fec: Option<FecArgs>,
    pub latency: Option<LatencyArgs>,
}

pub fn load_file_config(path: &Option<PathBuf>) -> anyhow::Result<FileConfig> {
    match path {
        None => Ok(FileConfig::default()),
        Some(path) => {
            let text = std::fs::read_to_string(path)?;
            Ok(toml::from_str(&text)?)
        }
    }
}

/// Builds the session parameters the receiver pipeline needs, merging a
/// file config's tables underneath whatever the CLI explicitly set.
pub fn session_params(audio: &AudioArgs, fec: &FecArgs, latency: &LatencyArgs) -> SessionParams {
    let fec_params = if fec.fec_scheme == FecSchemeArg::None {
        None
    } else {
        Some(FecParams {
            scheme: fec.fec_scheme.into(),
            k: fec.fec_block_source_count,
            m: fec.fec_block_repair_count,
            window_size: fec.fec_window_size,
            max_sbn_jump: fec.fec_max_sbn_jump,
        })
    };

    SessionParams {
        sample_rate: audio.sample_rate,
        channels: audio.channels,
        samples_per_frame: audio.samples_per_frame,
        fec: fec_params,
        jitter_capacity: latency.jitter_capacity,
        target_latency_ns: latency.target_latency_ns,
        min_latency_ns: latency.min_latency_ns,
        max_latency_ns: latency.max_latency_ns,
        latency_profile: latency.latency_profile.into(),
        resampler_quality: latency.resampler_quality.into(),
        watchdog_no_packets_ns: latency.watchdog_no_packets_ns,
        watchdog_broken_frames_ratio: latency.watchdog_broken_frames_ratio,
    }
}

pub fn rtcp_interval() -> Duration {
    Duration::from_secs(5)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_scheme_yields_no_fec_params() {
        let audio = AudioArgs { sample_rate: 44_100, channels: 2, samples_per_frame: 441 };
        let fec = FecArgs {
            fec_scheme: FecSchemeArg::None,
            fec_block_source_count: 20,
            fec_block_repair_count: 10,
            fec_window_size: 4,
            fec_max_sbn_jump: 64,
        };
        let latency = LatencyArgs {
            target_latency_ns: 1,
            min_latency_ns: 1,
            max_latency_ns: 1,
            latency_profile: LatencyProfileArg::Gentle,
            resampler_quality: ResamplerQualityArg::Medium,
            watchdog_no_packets_ns: 1,
            watchdog_broken_frames_ratio: 0.5,
            jitter_capacity: 8,
            max_sessions: 1,
        };
        assert!(session_params(&audio, &fec, &latency).fec.is_none());
    }

    #[test]
    fn empty_file_config_parses() {
        let cfg: FileConfig = toml::from_str("").unwrap();
        assert!(cfg.audio.is_none());
    }
}
