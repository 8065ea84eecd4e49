use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde_json::Value;
use tokio::time::Instant;

use super::deadline_after;
use crate::ws::client::SocketState;

#[derive(Debug, Copy, Clone)]
struct SentPing {
    at: Instant,
    timestamp: u64,
}

/// What the heartbeat wants done at a tick
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum Beat {
    /// bound connection was replaced or is not open, stop silently
    Stale,
    /// send a ping with this timestamp
    Ping(u64),
    /// no pong since the previous ping
    LivenessTimeout,
}

/// Ping state of one connection, bound to that connection's epoch.
#[derive(Debug)]
pub(crate) struct Heartbeat {
    epoch: u64,
    interval: Duration,
    next_tick: Instant,
    latest_ping: Option<SentPing>,
    latest_pong: Option<Instant>,
}

impl Heartbeat {
    /// first tick is due immediately
    pub fn start(epoch: u64, interval: Duration, now: Instant) -> Self {
        log::debug!("Heartbeat start for epoch {}, interval {:?}", epoch, interval);

        Self {
            epoch,
            interval,
            next_tick: now,
            latest_ping: None,
            latest_pong: None,
        }
    }

    pub fn deadline(&self) -> Instant {
        self.next_tick
    }

    pub fn tick(&mut self, current_epoch: u64, socket: SocketState, now: Instant) -> Beat {
        if self.epoch != current_epoch || socket != SocketState::Open {
            log::trace!(
                "Heartbeat of epoch {} is stale, current epoch {}, socket {:?}",
                self.epoch,
                current_epoch,
                socket
            );
            return Beat::Stale;
        }

        if let Some(ping) = self.latest_ping {
            let answered = matches!(self.latest_pong, Some(pong) if pong >= ping.at);
            if !answered {
                return Beat::LivenessTimeout;
            }
        }

        let timestamp = unix_millis();
        self.latest_ping = Some(SentPing { at: now, timestamp });
        self.next_tick = deadline_after(now, self.interval);

        log::trace!("Next heartbeat tick: {:?}", self.next_tick);

        Beat::Ping(timestamp)
    }

    /// Record a pong, returns round trip time if it answers the latest ping.
    pub fn pong(&mut self, echoed: &Value, now: Instant) -> Option<Duration> {
        self.latest_pong = Some(now);

        let ping = self.latest_ping?;
        if echoed.as_u64() == Some(ping.timestamp) {
            Some(now.saturating_duration_since(ping.at))
        } else {
            None
        }
    }
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or_default()
}

#[cfg(test)]
mod test {
    use super::*;

    const INTERVAL: Duration = Duration::from_secs(10);

    #[tokio::test(start_paused = true)]
    async fn test_first_tick_pings_immediately() {
        let now = Instant::now();
        let mut heartbeat = Heartbeat::start(1, INTERVAL, now);

        assert_eq!(heartbeat.deadline(), now);
        assert!(matches!(
            heartbeat.tick(1, SocketState::Open, now),
            Beat::Ping(_)
        ));
        assert_eq!(heartbeat.deadline(), now + INTERVAL);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pong_keeps_alive() {
        let start = Instant::now();
        let mut heartbeat = Heartbeat::start(1, INTERVAL, start);

        let timestamp = match heartbeat.tick(1, SocketState::Open, start) {
            Beat::Ping(timestamp) => timestamp,
            other => panic!("expect ping, got {:?}", other),
        };

        let latency = heartbeat.pong(&Value::from(timestamp), start + Duration::from_millis(30));
        assert_eq!(latency, Some(Duration::from_millis(30)));

        assert!(matches!(
            heartbeat.tick(1, SocketState::Open, start + INTERVAL),
            Beat::Ping(_)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_pong_is_liveness_timeout() {
        let start = Instant::now();
        let mut heartbeat = Heartbeat::start(1, INTERVAL, start);

        heartbeat.tick(1, SocketState::Open, start);
        assert_eq!(
            heartbeat.tick(1, SocketState::Open, start + INTERVAL),
            Beat::LivenessTimeout
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_pong_before_latest_ping_does_not_count() {
        let start = Instant::now();
        let mut heartbeat = Heartbeat::start(1, INTERVAL, start);

        heartbeat.tick(1, SocketState::Open, start);
        heartbeat.pong(&Value::Null, start + Duration::from_secs(1));
        heartbeat.tick(1, SocketState::Open, start + INTERVAL);

        assert_eq!(
            heartbeat.tick(1, SocketState::Open, start + INTERVAL * 2),
            Beat::LivenessTimeout
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_huge_interval_clamps_next_tick() {
        let now = Instant::now();
        let mut heartbeat = Heartbeat::start(1, Duration::MAX, now);

        assert!(matches!(
            heartbeat.tick(1, SocketState::Open, now),
            Beat::Ping(_)
        ));
        assert!(heartbeat.deadline() > now + Duration::from_secs(86400 * 365));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_heartbeat_does_nothing() {
        let start = Instant::now();
        let mut heartbeat = Heartbeat::start(1, INTERVAL, start);

        assert_eq!(heartbeat.tick(2, SocketState::Open, start), Beat::Stale);
        assert_eq!(heartbeat.tick(1, SocketState::Closed, start), Beat::Stale);

        // no ping recorded, so no liveness verdict either
        assert!(heartbeat.latest_ping.is_none());
        assert_eq!(heartbeat.deadline(), start);
    }
}
