pub mod classify;
pub mod pipeline;
pub mod poller;
pub mod status;
pub mod train;
