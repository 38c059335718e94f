// Pool controller
//
// Periodically reconciles the live worker count toward the desired count.
// Capacity moves by at most one worker per tick in either direction:
//
// - actual < desired            -> grow by one
// - backlog > desired (and a worker is live) -> shrink by one
// - otherwise                   -> hold
//
// An idle pool with an empty queue never shrinks, even when desired has been
// lowered below actual. Workers are only retired under backlog.

use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::pool::{PoolHandle, PoolSnapshot};

/// Decision taken on one controller tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlAction {
    Grow,
    Shrink,
    Hold,
}

/// Pick the action for a snapshot
pub fn decide(snapshot: &PoolSnapshot) -> ControlAction {
    if snapshot.actual < snapshot.desired {
        ControlAction::Grow
    } else if snapshot.backlog > snapshot.desired && snapshot.actual > 0 {
        ControlAction::Shrink
    } else {
        ControlAction::Hold
    }
}

/// Run the reconciliation loop until shutdown is signalled or the pool goes away
pub async fn run_controller(
    pool: PoolHandle,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    // First decision one full interval after start
    let mut ticker = interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if tick(&pool).await.is_err() {
                    break;
                }
            }
            _ = shutdown.changed() => {
                debug!("Pool controller: shutdown requested");
                break;
            }
        }
    }

    debug!("Pool controller exited");
}

async fn tick(pool: &PoolHandle) -> crate::Result<ControlAction> {
    let snapshot = pool.snapshot().await?;
    let action = decide(&snapshot);

    match action {
        ControlAction::Grow => {
            info!(
                actual = snapshot.actual,
                desired = snapshot.desired,
                "Growing worker pool"
            );
            pool.grow().await?;
        }
        ControlAction::Shrink => {
            info!(
                actual = snapshot.actual,
                desired = snapshot.desired,
                backlog = snapshot.backlog,
                "Shrinking worker pool"
            );
            pool.shrink().await?;
        }
        ControlAction::Hold => {}
    }

    Ok(action)
}

/// Close the submission-count window on a fixed period
pub async fn run_submission_window(
    pool: PoolHandle,
    window: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = interval_at(Instant::now() + window, window);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if pool.reset_submission_window().await.is_err() {
                    break;
                }
            }
            _ = shutdown.changed() => break,
        }
    }

    debug!("Submission window task exited");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(desired: usize, actual: usize, backlog: usize) -> PoolSnapshot {
        PoolSnapshot {
            desired,
            actual,
            backlog,
            ..Default::default()
        }
    }

    #[test]
    fn test_grow_when_below_desired() {
        assert_eq!(decide(&snap(3, 1, 0)), ControlAction::Grow);
        // Growing wins over backlog
        assert_eq!(decide(&snap(3, 1, 5)), ControlAction::Grow);
    }

    #[test]
    fn test_shrink_only_under_backlog() {
        assert_eq!(decide(&snap(0, 2, 1)), ControlAction::Shrink);
        assert_eq!(decide(&snap(1, 1, 2)), ControlAction::Shrink);
        assert_eq!(decide(&snap(1, 1, 1)), ControlAction::Hold);
    }

    #[test]
    fn test_idle_pool_never_shrinks() {
        assert_eq!(decide(&snap(0, 4, 0)), ControlAction::Hold);
        assert_eq!(decide(&snap(2, 4, 0)), ControlAction::Hold);
    }

    #[test]
    fn test_no_shrink_below_zero() {
        assert_eq!(decide(&snap(0, 0, 1)), ControlAction::Hold);
    }
}
