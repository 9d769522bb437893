//! # Feature: Time Resolution
//!
//! Turns calendar dates and relative clock expressions ("tomorrow at 9pm")
//! into instants in the configured IANA time zone.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.3.0
//! - **Toggleable**: false

pub mod resolver;

pub use resolver::{
    display, from_storage, now_in, resolve_calendar, resolve_relative, to_storage, ClockTime,
    DayAnchor, Meridiem,
};
