//! Timer node
//!
//! Input `ticker_us` of 0 publishes a steady clock in microseconds on the
//! output `ticker_us`; any other input value is passed through unchanged.

use crate::property::{PropertyArena, PropertyId};
use crate::types::{PropertyDecl, PropertyType};
use crate::LogicNodeRuntimeError;
use std::sync::OnceLock;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

pub(crate) const TICKER_US: &str = "ticker_us";

pub(crate) fn input_decl() -> PropertyDecl {
    PropertyDecl::structure("IN", vec![PropertyDecl::new(TICKER_US, PropertyType::Int64)])
}

pub(crate) fn output_decl() -> PropertyDecl {
    PropertyDecl::structure("OUT", vec![PropertyDecl::new(TICKER_US, PropertyType::Int64)])
}

/// Microseconds on a monotonic clock anchored at the wall clock of first use
pub fn steady_clock_us() -> i64 {
    static ANCHOR: OnceLock<(i64, Instant)> = OnceLock::new();
    let (anchor_us, anchor) = ANCHOR.get_or_init(|| {
        let wall = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_micros() as i64)
            .unwrap_or(0);
        (wall, Instant::now())
    });
    anchor_us + anchor.elapsed().as_micros() as i64
}

#[derive(Default)]
pub(crate) struct TimerNode;

impl TimerNode {
    pub(crate) fn update(
        &mut self,
        properties: &mut PropertyArena,
        inputs: Option<PropertyId>,
        outputs: Option<PropertyId>,
    ) -> Result<(), LogicNodeRuntimeError> {
        let input = inputs
            .and_then(|root| properties.find_path(root, TICKER_US))
            .and_then(|id| properties.typed_value::<i64>(id))
            .unwrap_or(0);
        let ticker = if input == 0 { steady_clock_us() } else { input };

        let output = outputs
            .and_then(|root| properties.find_path(root, TICKER_US))
            .ok_or_else(|| LogicNodeRuntimeError::new("TimerNode has no ticker output"))?;
        properties.set_value(output, ticker.into());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeId;
    use crate::property::PropertySemantics;
    use slotmap::SlotMap;

    fn timer_properties() -> (PropertyArena, PropertyId, PropertyId) {
        let mut keys: SlotMap<NodeId, ()> = SlotMap::with_key();
        let node = keys.insert(());
        let mut arena = PropertyArena::new();
        let inputs = arena.create_tree(&input_decl(), node, PropertySemantics::ScriptInput);
        let outputs = arena.create_tree(&output_decl(), node, PropertySemantics::ScriptOutput);
        (arena, inputs, outputs)
    }

    #[test]
    fn test_zero_ticker_uses_clock() {
        let (mut arena, inputs, outputs) = timer_properties();
        let output = arena.find_path(outputs, TICKER_US).unwrap();
        let mut timer = TimerNode;

        let before = steady_clock_us();
        timer.update(&mut arena, Some(inputs), Some(outputs)).unwrap();
        let first = arena.typed_value::<i64>(output).unwrap();
        timer.update(&mut arena, Some(inputs), Some(outputs)).unwrap();
        let second = arena.typed_value::<i64>(output).unwrap();

        assert!(first >= before);
        assert!(second >= first);
    }

    #[test]
    fn test_user_ticker_passes_through() {
        let (mut arena, inputs, outputs) = timer_properties();
        let input = arena.find_path(inputs, TICKER_US).unwrap();
        arena.set_value(input, 1234i64.into());

        TimerNode.update(&mut arena, Some(inputs), Some(outputs)).unwrap();
        let output = arena.find_path(outputs, TICKER_US).unwrap();
        assert_eq!(arena.typed_value::<i64>(output), Some(1234));
    }
}
