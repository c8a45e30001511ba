//! Periodic feeding (or starving) inside regions.

use chrono::{DateTime, TimeDelta, Utc};
use warden_query::ApplicableRegionSet;
use warden_types::flags::{FEED_AMOUNT, FEED_DELAY, MAX_FOOD, MIN_FOOD};

use crate::error::HandlerError;
use crate::handler::{Handler, HandlerContext};
use crate::host::MAX_FOOD_LEVEL;

/// Applies `feed-amount` every `feed-delay` seconds, keeping the food level
/// within `feed-min-hunger..=feed-max-hunger` (and always within `0..=20`).
/// Saturation is set to the new food level.
#[derive(Debug, Default)]
pub struct FeedHandler {
    last_feed: Option<DateTime<Utc>>,
}

impl FeedHandler {
    /// A handler that has never fed.
    pub const fn new() -> Self {
        Self { last_feed: None }
    }

    /// When food was last changed by this handler.
    pub const fn last_feed(&self) -> Option<DateTime<Utc>> {
        self.last_feed
    }
}

fn food_bound(value: Option<i64>, default: i32) -> i32 {
    value.map_or(default, |v| {
        i32::try_from(v.clamp(0, i64::from(MAX_FOOD_LEVEL))).unwrap_or(default)
    })
}

impl Handler for FeedHandler {
    fn name(&self) -> &'static str {
        "feed"
    }

    fn tick(&mut self, ctx: &HandlerContext<'_>, set: &ApplicableRegionSet) -> Result<(), HandlerError> {
        let actor = ctx.actor;
        if actor.is_dead() {
            return Ok(());
        }

        let amount = set.query_value(ctx.subject, &FEED_AMOUNT).and_then(|v| v.as_integer());
        let delay = set.query_value(ctx.subject, &FEED_DELAY).and_then(|v| v.as_integer());
        let (Some(amount), Some(delay)) = (amount, delay) else {
            return Ok(());
        };
        if amount == 0 || delay < 0 {
            return Ok(());
        }
        let Ok(amount) = i32::try_from(amount) else {
            return Ok(());
        };

        let min = food_bound(set.query_value(ctx.subject, &MIN_FOOD).and_then(|v| v.as_integer()), 0);
        let max = food_bound(
            set.query_value(ctx.subject, &MAX_FOOD).and_then(|v| v.as_integer()),
            MAX_FOOD_LEVEL,
        );

        if actor.food_level >= max && amount > 0 {
            return Ok(());
        }

        let food = if delay == 0 {
            if amount > 0 { max } else { min }
        } else if self.last_feed.is_none_or(|last| {
            TimeDelta::try_seconds(delay).is_some_and(|d| ctx.now.signed_duration_since(last) > d)
        }) {
            actor.food_level.saturating_add(amount).max(min).min(max)
        } else {
            return Ok(());
        };

        ctx.host.set_food(actor.id, food, f64::from(food))?;
        self.last_feed = Some(ctx.now);
        Ok(())
    }

    fn reset_state(&mut self) {
        self.last_feed = None;
    }
}
