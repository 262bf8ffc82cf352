//! Background loops: the pairing sweep that turns queued tickets into
//! combats, the combat sweep that retries match archival that failed
//! on the happy path, the session sweep, and the metrics snapshot.
//! Each runs on its own `tokio::time::interval` behind a shared
//! `tokio::sync::watch` shutdown signal.

use crate::context::AppContext;
use crate::store::ephemeral::{keys, ttl};
use std::time::Duration;
use tokio::sync::watch;

const QUEUE_SWEEP_INTERVAL: Duration = Duration::from_secs(2);
const COMBAT_SWEEP_INTERVAL: Duration = Duration::from_secs(30);
const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60);
const METRICS_SNAPSHOT_INTERVAL: Duration = Duration::from_secs(10);

/// Spawns all four background loops and returns a handle that stops
/// them when dropped (closing `shutdown_tx` signals every loop to
/// exit after its current tick).
pub struct Sweepers {
    shutdown_tx: watch::Sender<bool>,
    handles: Vec<tokio::task::JoinHandle<()>>,
}

impl Sweepers {
    pub fn spawn(ctx: AppContext) -> Self {
        let (shutdown_tx, rx) = watch::channel(false);
        let handles = vec![
            tokio::spawn(run_loop(QUEUE_SWEEP_INTERVAL, rx.clone(), {
                let ctx = ctx.clone();
                move || queue_sweep(ctx.clone())
            })),
            tokio::spawn(run_loop(COMBAT_SWEEP_INTERVAL, rx.clone(), {
                let ctx = ctx.clone();
                move || combat_sweep(ctx.clone())
            })),
            tokio::spawn(run_loop(SESSION_SWEEP_INTERVAL, rx.clone(), {
                let ctx = ctx.clone();
                move || session_sweep(ctx.clone())
            })),
            tokio::spawn(run_loop(METRICS_SNAPSHOT_INTERVAL, rx.clone(), {
                let ctx = ctx.clone();
                move || metrics_snapshot(ctx.clone())
            })),
        ];
        Self { shutdown_tx, handles }
    }

    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        for handle in self.handles {
            let _ = handle.await;
        }
    }
}

async fn run_loop<F, Fut>(period: Duration, mut shutdown: watch::Receiver<bool>, mut tick: F)
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = ()>,
{
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = interval.tick() => tick().await,
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    return;
                }
            }
        }
    }
}

/// Pairs queued PvP tickets and persists the resulting combats to the
/// ephemeral store.
async fn queue_sweep(ctx: AppContext) {
    let matches = match crate::matchmaking::run_pairing_pass(&ctx).await {
        Ok(m) => m,
        Err(e) => {
            tracing::warn!(error = ?e, "pvp pairing pass failed");
            return;
        }
    };
    for paired in matches {
        if let Err(e) = persist_new_combat(&ctx, paired.combat).await {
            tracing::warn!(error = ?e, "failed to persist newly paired combat");
        }
    }
}

async fn persist_new_combat(ctx: &AppContext, combat: crate::models::combat::CombatState) -> crate::error::AppResult<()> {
    use crate::models::combat::ParticipantSlot;

    for slot in [ParticipantSlot::A, ParticipantSlot::B] {
        let Some(character_id) = combat.participants[&slot].character_id else { continue };
        if let Some(mut character) = ctx.db.get_character(character_id).await? {
            character.active_combat = Some(combat.combat_id);
            ctx.db.upsert_character(&character).await?;
        }
    }
    crate::store::ephemeral::traits::set_json_with_ttl(ctx.cache.as_ref(), &keys::combat(combat.combat_id), &combat, ttl::COMBAT).await?;
    ctx.metrics.record_combat_started();
    Ok(())
}

/// Retries the combats that failed to archive on their first
/// finalization attempt.
async fn combat_sweep(ctx: AppContext) {
    let pending = match ctx.cache.zrange_by_score(keys::PENDING_FINALIZE, f64::MIN, f64::MAX).await {
        Ok(p) => p,
        Err(e) => {
            tracing::warn!(error = ?e, "failed to read pending-finalize set");
            return;
        }
    };
    for combat_id_str in pending {
        let Ok(combat_id) = combat_id_str.parse::<crate::ids::CombatId>() else {
            let _ = ctx.cache.zrem(keys::PENDING_FINALIZE, &combat_id_str).await;
            continue;
        };
        let state: Option<crate::models::combat::CombatState> =
            match crate::store::ephemeral::traits::get_json(ctx.cache.as_ref(), &keys::combat(combat_id)).await {
                Ok(s) => s,
                Err(e) => {
                    tracing::warn!(combat_id = %combat_id, error = ?e, "failed to load pending-finalize combat");
                    continue;
                }
            };
        match state {
            Some(state) => {
                if let Err(e) = crate::combat::finalize_if_terminal(&ctx, &state).await {
                    tracing::warn!(combat_id = %combat_id, error = ?e, "combat sweep retry still failing");
                }
            }
            // The C2 entry already expired; nothing left to retry.
            None => {
                let _ = ctx.cache.zrem(keys::PENDING_FINALIZE, &combat_id_str).await;
            }
        }
    }
}

/// Both ephemeral backends expire `session:{user_id}` keys on their own
/// TTL; this loop exists to make that explicit and to give the sweep a
/// place to grow into if session state ever needs active eviction.
async fn session_sweep(_ctx: AppContext) {
    tracing::debug!("session sweep tick: sessions are TTL-expired by the ephemeral store, no action needed");
}

async fn metrics_snapshot(ctx: AppContext) {
    match ctx.cache.zrange_by_score(keys::PVP_QUEUE, f64::MIN, f64::MAX).await {
        Ok(members) => ctx.metrics.set_queue_depth(members.len() as u64),
        Err(e) => tracing::warn!(error = ?e, "failed to read pvp queue depth"),
    }
}
