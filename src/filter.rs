//! Event filter for subscribers.

use crate::ws::ClientEvent;

/// Type implements this trait can check if a event is wanted.
pub trait Filter {
    /// true if event is wanted, otherwise false.
    fn filter_event(&self, event: &ClientEvent) -> bool;
}

impl<F> Filter for F
where
    F: Fn(&ClientEvent) -> bool,
{
    fn filter_event(&self, event: &ClientEvent) -> bool {
        self(event)
    }
}

/// Negative wrapper of a filter.
#[derive(Debug, Copy, Clone)]
pub struct Not<F> {
    filter: F,
}

impl<F> Filter for Not<F>
where
    F: Filter,
{
    fn filter_event(&self, event: &ClientEvent) -> bool {
        !self.filter.filter_event(event)
    }
}

/// If and only if a and b both pass, this filter will pass.
#[derive(Debug, Copy, Clone)]
pub struct And<FA, FB> {
    a: FA,
    b: FB,
}

impl<FA, FB> Filter for And<FA, FB>
where
    FA: Filter,
    FB: Filter,
{
    fn filter_event(&self, event: &ClientEvent) -> bool {
        self.a.filter_event(event) && self.b.filter_event(event)
    }
}

/// If a or b pass, this filter will pass.
#[derive(Debug, Copy, Clone)]
pub struct Or<FA, FB> {
    a: FA,
    b: FB,
}

impl<FA, FB> Filter for Or<FA, FB>
where
    FA: Filter,
    FB: Filter,
{
    fn filter_event(&self, event: &ClientEvent) -> bool {
        self.a.filter_event(event) || self.b.filter_event(event)
    }
}

/// Filter combinator.
pub trait FilterExt
where
    Self: Sized,
{
    /// Invert a filter.
    fn not(self) -> Not<Self> {
        Not { filter: self }
    }

    /// Return a new filter that pass a event only if self and other both pass it.
    fn and<F>(self, other: F) -> And<Self, F> {
        And { a: self, b: other }
    }

    /// Return a new filter that pass a event if self or other pass it.
    fn or<F>(self, other: F) -> Or<Self, F> {
        Or { a: self, b: other }
    }
}

impl<T> FilterExt for T where T: Filter {}

/// Filter that will pass all events.
#[derive(Debug, Copy, Clone)]
pub struct All;

impl Filter for All {
    fn filter_event(&self, _event: &ClientEvent) -> bool {
        true
    }
}

/// Create a filter that pass all events.
pub fn all() -> All {
    All
}

/// Filter that will reject all events.
#[derive(Debug, Copy, Clone)]
pub struct None;

impl Filter for None {
    fn filter_event(&self, _event: &ClientEvent) -> bool {
        false
    }
}

/// Create a filter that will reject all events.
pub fn none() -> None {
    None
}

/// Filter pass events with given [name](ClientEvent::name), like `joined`.
#[derive(Debug, Copy, Clone)]
pub struct Kind {
    name: &'static str,
}

impl Filter for Kind {
    fn filter_event(&self, event: &ClientEvent) -> bool {
        event.name() == self.name
    }
}

/// Create a filter that pass events of one kind.
pub fn kind(name: &'static str) -> Kind {
    Kind { name }
}

/// Filter pass application [Message](ClientEvent::Message) events with given tag.
#[derive(Debug, Clone)]
pub struct MessageName {
    name: String,
}

impl Filter for MessageName {
    fn filter_event(&self, event: &ClientEvent) -> bool {
        event.message_name() == Some(self.name.as_str())
    }
}

/// Create a filter that pass application events named `name`, like `chat.event`.
pub fn message<S: Into<String>>(name: S) -> MessageName {
    MessageName { name: name.into() }
}

/// Filter pass heartbeat ping/pong events and their frame logs.
#[derive(Debug, Copy, Clone)]
pub struct Heartbeat;

impl Filter for Heartbeat {
    fn filter_event(&self, event: &ClientEvent) -> bool {
        match event {
            ClientEvent::Ping(_) | ClientEvent::Pong(_) => true,
            ClientEvent::Log(record) => record.is_heartbeat(),
            _ => false,
        }
    }
}

/// Create a filter that pass heartbeat events, usually used with [not](FilterExt::not).
pub fn heartbeat() -> Heartbeat {
    Heartbeat
}
