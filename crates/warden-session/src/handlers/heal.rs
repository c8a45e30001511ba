//! Periodic healing (or harming) inside regions.

use chrono::{DateTime, TimeDelta, Utc};
use warden_query::ApplicableRegionSet;
use warden_types::flags::{HEAL_AMOUNT, HEAL_DELAY, MAX_HEAL, MIN_HEAL};

use crate::error::HandlerError;
use crate::handler::{Handler, HandlerContext};

/// Applies `heal-amount` every `heal-delay` seconds, keeping health within
/// `heal-min-health..=heal-max-health`.
///
/// A delay of zero jumps straight to the bound in the direction of the
/// amount. A missing or zero amount, or a missing or negative delay,
/// disables the handler.
#[derive(Debug, Default)]
pub struct HealHandler {
    last_heal: Option<DateTime<Utc>>,
}

impl HealHandler {
    /// A handler that has never healed.
    pub const fn new() -> Self {
        Self { last_heal: None }
    }

    /// When health was last changed by this handler.
    pub const fn last_heal(&self) -> Option<DateTime<Utc>> {
        self.last_heal
    }

    fn due(&self, now: DateTime<Utc>, delay: i64) -> bool {
        let Some(last) = self.last_heal else {
            return true;
        };
        TimeDelta::try_seconds(delay).is_some_and(|d| now.signed_duration_since(last) > d)
    }
}

impl Handler for HealHandler {
    fn name(&self) -> &'static str {
        "heal"
    }

    fn tick(&mut self, ctx: &HandlerContext<'_>, set: &ApplicableRegionSet) -> Result<(), HandlerError> {
        let actor = ctx.actor;
        if actor.is_dead() {
            return Ok(());
        }

        let amount = set.query_value(ctx.subject, &HEAL_AMOUNT).and_then(|v| v.as_integer());
        let delay = set.query_value(ctx.subject, &HEAL_DELAY).and_then(|v| v.as_integer());
        let (Some(amount), Some(delay)) = (amount, delay) else {
            return Ok(());
        };
        if amount == 0 || delay < 0 {
            return Ok(());
        }
        let Ok(amount) = i32::try_from(amount) else {
            return Ok(());
        };
        if ctx.invincible && amount < 0 {
            return Ok(());
        }

        let min = set
            .query_value(ctx.subject, &MIN_HEAL)
            .and_then(|v| v.as_double())
            .unwrap_or(0.0)
            .min(actor.max_health);
        let max = set
            .query_value(ctx.subject, &MAX_HEAL)
            .and_then(|v| v.as_double())
            .unwrap_or(actor.max_health)
            .min(actor.max_health);

        if actor.health >= max && amount > 0 {
            return Ok(());
        }

        let health = if delay == 0 {
            if amount > 0 { max } else { min }
        } else if self.due(ctx.now, delay) {
            (actor.health + f64::from(amount)).max(min).min(max)
        } else {
            return Ok(());
        };

        ctx.host.set_health(actor.id, health)?;
        self.last_heal = Some(ctx.now);
        Ok(())
    }

    fn reset_state(&mut self) {
        self.last_heal = None;
    }
}
