//! Trigger-gated event handlers.
//!
//! # Responsibility
//! - Wrap a handler so it only runs for events carrying one trigger token.
//! - Provide confirm/cancel key instances without per-key duplication.
//!
//! # Invariants
//! - The wrapped handler receives exactly the arguments of the incoming call.
//! - Non-matching events are ignored without side effects.

/// Event that carries a comparable trigger token.
pub trait TriggerEvent {
    type Token: PartialEq;

    fn token(&self) -> &Self::Token;
}

/// Handler that only fires when an event's token equals `trigger`.
pub struct TriggerFilter<T, H> {
    trigger: T,
    handler: H,
}

impl<T: PartialEq, H> TriggerFilter<T, H> {
    pub fn new(trigger: T, handler: H) -> Self {
        Self { trigger, handler }
    }

    pub fn trigger(&self) -> &T {
        &self.trigger
    }

    /// Forwards `(context, event)` to the handler when the token matches.
    ///
    /// Returns whether the handler ran.
    pub fn handle<C, E>(&mut self, context: &C, event: &E) -> bool
    where
        C: ?Sized,
        E: TriggerEvent<Token = T>,
        H: FnMut(&C, &E),
    {
        if event.token() != &self.trigger {
            return false;
        }
        (self.handler)(context, event);
        true
    }
}

/// Key identifier carried by keyboard events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyCode(pub u32);

impl KeyCode {
    pub const ENTER: KeyCode = KeyCode(13);
    pub const ESCAPE: KeyCode = KeyCode(27);
}

/// Key-up event delivered by the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub code: KeyCode,
}

impl KeyEvent {
    pub fn new(code: KeyCode) -> Self {
        Self { code }
    }
}

impl TriggerEvent for KeyEvent {
    type Token = KeyCode;

    fn token(&self) -> &KeyCode {
        &self.code
    }
}

/// Gate for the "confirm" gesture (commit an edit, add a task).
pub fn confirm_key<H>(handler: H) -> TriggerFilter<KeyCode, H> {
    TriggerFilter::new(KeyCode::ENTER, handler)
}

/// Gate for the "cancel" gesture (abandon an edit).
pub fn cancel_key<H>(handler: H) -> TriggerFilter<KeyCode, H> {
    TriggerFilter::new(KeyCode::ESCAPE, handler)
}

#[cfg(test)]
mod tests {
    use super::{cancel_key, confirm_key, KeyCode, KeyEvent, TriggerEvent, TriggerFilter};
    use std::cell::RefCell;

    #[test]
    fn confirm_fires_only_for_enter() {
        let hits = RefCell::new(Vec::new());
        let mut confirm = confirm_key(|context: &str, event: &KeyEvent| {
            hits.borrow_mut().push((context.to_string(), event.code));
        });

        assert!(!confirm.handle("row-1", &KeyEvent::new(KeyCode(65))));
        assert!(!confirm.handle("row-1", &KeyEvent::new(KeyCode::ESCAPE)));
        assert!(confirm.handle("row-1", &KeyEvent::new(KeyCode::ENTER)));

        assert_eq!(
            *hits.borrow(),
            vec![("row-1".to_string(), KeyCode::ENTER)]
        );
    }

    #[test]
    fn cancel_and_confirm_share_one_implementation() {
        let mut fired = 0;
        {
            let mut cancel = cancel_key(|_: &(), _: &KeyEvent| fired += 1);
            assert_eq!(cancel.trigger(), &KeyCode::ESCAPE);
            cancel.handle(&(), &KeyEvent::new(KeyCode::ESCAPE));
            cancel.handle(&(), &KeyEvent::new(KeyCode::ENTER));
        }
        assert_eq!(fired, 1);
    }

    #[derive(Debug)]
    struct Gesture {
        name: &'static str,
    }

    impl TriggerEvent for Gesture {
        type Token = &'static str;

        fn token(&self) -> &&'static str {
            &self.name
        }
    }

    #[test]
    fn works_with_any_comparable_token() {
        let mut count = 0;
        let mut swipe = TriggerFilter::new("swipe-left", |_: &(), _: &Gesture| count += 1);
        swipe.handle(&(), &Gesture { name: "tap" });
        swipe.handle(&(), &Gesture { name: "swipe-left" });
        drop(swipe);
        assert_eq!(count, 1);
    }
}
