//! Discovery — probing channels and keeping the status cache fresh.

pub mod poller;
pub mod prober;
