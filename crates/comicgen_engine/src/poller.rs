use std::sync::mpsc;
use std::time::Duration;

use comicgen_logging::cg_debug;
use tokio::runtime::Handle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::{EngineEvent, SessionId};

const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// The single polling ticker. Starting a new one cancels the previous one
/// first, so at most one tick source is ever live.
#[derive(Debug, Default)]
pub(crate) struct TickerSlot {
    active: Option<(SessionId, CancellationToken)>,
}

impl TickerSlot {
    pub(crate) fn start(
        &mut self,
        runtime: &Handle,
        session: SessionId,
        interval: Duration,
        event_tx: mpsc::Sender<EngineEvent>,
    ) {
        self.cancel_active();
        let token = CancellationToken::new();
        runtime.spawn(run_ticker(session, interval, token.clone(), event_tx));
        self.active = Some((session, token));
    }

    /// Stops the ticker if it belongs to `session`.
    pub(crate) fn stop(&mut self, session: SessionId) -> bool {
        match &self.active {
            Some((active, _)) if *active == session => {
                self.cancel_active();
                true
            }
            _ => false,
        }
    }

    pub(crate) fn active_session(&self) -> Option<SessionId> {
        self.active.as_ref().map(|(session, _)| *session)
    }

    fn cancel_active(&mut self) {
        if let Some((session, token)) = self.active.take() {
            cg_debug!("Stopping poll ticker for session {session}");
            token.cancel();
        }
    }
}

impl Drop for TickerSlot {
    fn drop(&mut self) {
        self.cancel_active();
    }
}

/// Emits `PollTick` every `interval`, starting one interval from now, until
/// cancelled or the event receiver is gone.
async fn run_ticker(
    session: SessionId,
    interval: Duration,
    token: CancellationToken,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    let interval = interval.max(MIN_INTERVAL);
    let mut ticker = interval_at(Instant::now() + interval, interval);
    // A slow event consumer must not cause a burst of catch-up ticks.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            _ = ticker.tick() => {
                if event_tx.send(EngineEvent::PollTick { session }).is_err() {
                    break;
                }
            }
        }
    }
}
