pub mod auth;
pub mod calendar;
pub mod contacts;
pub mod lifecycle;
pub mod notify;
pub mod poller;
pub mod remote;
pub mod scheduling;
