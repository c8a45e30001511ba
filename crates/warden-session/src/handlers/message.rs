//! Greeting and farewell messages.

use warden_query::ApplicableRegionSet;
use warden_regions::Subject;
use warden_types::flags::{FAREWELL_MESSAGE, GREET_MESSAGE};
use warden_types::{Flag, Location};

use crate::error::HandlerError;
use crate::handler::{Crossing, Handler, HandlerContext};

/// Every distinct non-empty text value of `flag` at `set`, in resolution
/// order.
fn messages(set: &ApplicableRegionSet, subject: &Subject, flag: &Flag) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for value in set.query_all_values(subject, flag) {
        if let Some(text) = value.as_text().filter(|t| !t.is_empty()) {
            if !out.iter().any(|m| m == text) {
                out.push(text.to_owned());
            }
        }
    }
    out
}

/// Sends each greeting that becomes applicable when crossing into regions.
///
/// Greetings that were already applicable before the move are not
/// repeated, so walking between two sub-regions of a town does not greet
/// the actor twice.
#[derive(Debug, Default)]
pub struct GreetingHandler {
    last: Vec<String>,
}

impl GreetingHandler {
    /// A handler with no remembered greetings.
    pub const fn new() -> Self {
        Self { last: Vec::new() }
    }

    /// Greetings applicable at the last accepted position.
    pub fn last_messages(&self) -> &[String] {
        &self.last
    }
}

impl Handler for GreetingHandler {
    fn name(&self) -> &'static str {
        "greeting"
    }

    fn initialize(
        &mut self,
        ctx: &HandlerContext<'_>,
        _location: &Location,
        set: &ApplicableRegionSet,
    ) -> Result<(), HandlerError> {
        self.last = messages(set, ctx.subject, &GREET_MESSAGE);
        Ok(())
    }

    fn on_cross_boundary(
        &mut self,
        ctx: &HandlerContext<'_>,
        crossing: &Crossing<'_>,
    ) -> Result<bool, HandlerError> {
        let current = messages(crossing.to_set, ctx.subject, &GREET_MESSAGE);
        for message in current.iter().filter(|m| !self.last.contains(m)) {
            ctx.send_message(message)?;
        }
        self.last = current;
        Ok(true)
    }

    fn reset_state(&mut self) {
        self.last.clear();
    }
}

/// Sends each farewell that stops being applicable when crossing out of
/// regions.
#[derive(Debug, Default)]
pub struct FarewellHandler {
    last: Vec<String>,
}

impl FarewellHandler {
    /// A handler with no remembered farewells.
    pub const fn new() -> Self {
        Self { last: Vec::new() }
    }

    /// Farewells applicable at the last accepted position.
    pub fn last_messages(&self) -> &[String] {
        &self.last
    }
}

impl Handler for FarewellHandler {
    fn name(&self) -> &'static str {
        "farewell"
    }

    fn initialize(
        &mut self,
        ctx: &HandlerContext<'_>,
        _location: &Location,
        set: &ApplicableRegionSet,
    ) -> Result<(), HandlerError> {
        self.last = messages(set, ctx.subject, &FAREWELL_MESSAGE);
        Ok(())
    }

    fn on_cross_boundary(
        &mut self,
        ctx: &HandlerContext<'_>,
        crossing: &Crossing<'_>,
    ) -> Result<bool, HandlerError> {
        let current = messages(crossing.to_set, ctx.subject, &FAREWELL_MESSAGE);
        for message in self.last.iter().filter(|m| !current.contains(m)) {
            ctx.send_message(message)?;
        }
        self.last = current;
        Ok(true)
    }

    fn reset_state(&mut self) {
        self.last.clear();
    }
}
