//! Random-number metric loop.
//!
//! Every interval, draws an integer in `[0, 100]` and logs it. The
//! `latest_random_number` up/down counter is moved by the difference to the
//! previous draw, so its value always equals the latest number. The counter
//! goes through the global OpenTelemetry meter, so it is a no-op when
//! telemetry export is disabled.

use std::time::Duration;

use opentelemetry::global;
use opentelemetry::metrics::UpDownCounter;
use rand::Rng;
use tokio::time::{self, MissedTickBehavior};

use crate::lifecycle::ShutdownSignal;

pub const METER_NAME: &str = "random-generator";
pub const COUNTER_NAME: &str = "latest_random_number";

/// Inclusive upper bound of a draw.
pub const MAX_RANDOM: i64 = 100;

pub fn draw_random_number<R: Rng + ?Sized>(rng: &mut R) -> i64 {
    rng.gen_range(0..=MAX_RANDOM)
}

/// Periodic emitter of random values to an OTLP counter.
pub struct RandomNumberEmitter {
    interval: Duration,
    counter: UpDownCounter<i64>,
}

impl RandomNumberEmitter {
    pub fn new(interval: Duration) -> Self {
        let counter = global::meter(METER_NAME)
            .i64_up_down_counter(COUNTER_NAME)
            .with_description("Tracks the last generated random number")
            .with_unit("1")
            .build();

        Self { interval, counter }
    }

    /// Emit until shutdown. Returns the number of values emitted.
    pub async fn run(self, mut shutdown: ShutdownSignal) -> u64 {
        let mut ticker = time::interval_at(time::Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut emitted = 0u64;
        let mut latest = 0i64;
        loop {
            tokio::select! {
                biased;

                _ = shutdown.recv() => {
                    tracing::debug!(emitted, "Random number loop stopped");
                    return emitted;
                }
                _ = ticker.tick() => {
                    let random_number = draw_random_number(&mut rand::thread_rng());
                    self.counter.add(random_number - latest, &[]);
                    latest = random_number;
                    tracing::info!(random_number, "Generated new random number");
                    emitted += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::Shutdown;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_draw_stays_in_range() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut seen_max = false;
        for _ in 0..10_000 {
            let n = draw_random_number(&mut rng);
            assert!((0..=MAX_RANDOM).contains(&n));
            seen_max |= n == MAX_RANDOM;
        }
        assert!(seen_max, "upper bound should be reachable");
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_emits_until_shutdown() {
        let shutdown = Shutdown::new();
        let emitter = RandomNumberEmitter::new(Duration::from_millis(100));
        let handle = tokio::spawn(emitter.run(shutdown.subscribe()));

        time::sleep(Duration::from_millis(350)).await;
        shutdown.trigger();

        let emitted = handle.await.unwrap();
        assert_eq!(emitted, 3);
    }
}
