//! The pipeline thread (§5): driven by the sink's blocking pull, drains
//! every session's input queue, advances its stages, and returns one mixed
//! frame. Holds no locks during the sink call; the only cross-thread
//! coupling is the lock-free queues the router hands it for each session
//! and the `broken` flag it hands back.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crossbeam_channel::Receiver;
use log::info;

use crate::mixer::Mixer;
use crate::router::{Router, SessionInput};
use crate::session::{Session, SessionParams, SessionState};
use crate::sink_clock::{Sink, SinkClock};

struct Entry {
    session: Session,
    input: Receiver<SessionInput>,
    broken_flag: Arc<AtomicBool>,
}

pub struct Pipeline<S> {
    router: Arc<Router>,
    new_sessions: Receiver<(u32, Receiver<SessionInput>, Arc<AtomicBool>)>,
    sessions: HashMap<u32, Entry>,
    session_params: SessionParams,
    sink_clock: SinkClock<S>,
}

impl<S: Sink> Pipeline<S> {
    pub fn new(
        router: Arc<Router>,
        new_sessions: Receiver<(u32, Receiver<SessionInput>, Arc<AtomicBool>)>,
        session_params: SessionParams,
        sink: S,
        mixer: Mixer,
        sample_rate: u32,
        samples_per_frame: u32,
    ) -> Self {
        Pipeline {
            router,
            new_sessions,
            sessions: HashMap::new(),
            session_params,
            sink_clock: SinkClock::new(sink, mixer, sample_rate, samples_per_frame),
        }
    }

    /// One full tick, called from the thread that owns the sink. `now`
    /// comes from the sink's pull (§4.9) — this is the only place the
    /// pipeline thread learns the time.
    pub fn tick(&mut self, now: Instant) -> usize {
        self.admit_new_sessions(now);
        self.drain_inputs(now);
        self.run_watchdogs(now);

        let frames: Vec<_> = self
            .sessions
            .values_mut()
            .filter(|e| e.session.state() != SessionState::Broken)
            .filter_map(|e| {
                let latency_ns = e
                    .session
                    .head_capture_time()
                    .map(|ts| self.sink_clock.current_latency_ns(ts))
                    .unwrap_or(i64::MIN);
                e.session.pull_frame(now, latency_ns)
            })
            .collect();

        let filled = self.sink_clock.tick(&frames);
        self.destroy_broken_sessions();
        filled
    }

    fn admit_new_sessions(&mut self, now: Instant) {
        while let Ok((ssrc, input, broken_flag)) = self.new_sessions.try_recv() {
            let session = Session::new(ssrc, self.session_params.clone(), now);
            self.sessions.insert(ssrc, Entry { session, input, broken_flag });
            info!("pipeline: admitted session for ssrc {ssrc}");
        }
    }

    fn drain_inputs(&mut self, now: Instant) {
        for entry in self.sessions.values_mut() {
            while let Ok(input) = entry.input.try_recv() {
                entry.session.handle_input(input, now);
            }
        }
    }

    fn run_watchdogs(&mut self, now: Instant) {
        for entry in self.sessions.values_mut() {
            entry.session.watchdog_check(now);
            if entry.session.state() == SessionState::Broken {
                entry.broken_flag.store(true, Ordering::Relaxed);
            }
        }
    }

    /// Destroys sessions the watchdog flagged broken (§4.7: "the mixer
    /// fades it out before destroying" — the mix step above already
    /// stopped including this session's frames, so by the time we get
    /// here it has already faded to silence from the output's perspective).
    fn destroy_broken_sessions(&mut self) {
        let broken: Vec<u32> = self
            .sessions
            .iter()
            .filter(|(_, e)| e.session.state() == SessionState::Broken)
            .map(|(ssrc, _)| *ssrc)
            .collect();
        for ssrc in broken {
            if let Some(mut entry) = self.sessions.remove(&ssrc) {
                entry.session.mark_destroyed();
            }
            self.router.remove(ssrc);
            info!("pipeline: destroyed broken session for ssrc {ssrc}");
        }
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Collects any receiver reports ready to go out (§4.1 "Control
    /// channel"). Separate from `tick` because RTCP's cadence (seconds)
    /// has nothing to do with the sink's audio-rate pacing; the network
    /// thread calls this on its own, coarser schedule.
    pub fn pull_receiver_reports(&mut self, now: Instant) -> Vec<(u32, rtcast_rtcp::ReceiverReport)> {
        self.sessions
            .iter_mut()
            .filter_map(|(ssrc, entry)| entry.session.maybe_build_receiver_report(now).map(|report| (*ssrc, report)))
            .collect()
    }
}
