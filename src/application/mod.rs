pub mod bootstrap;
pub mod calendar_directory;
pub mod commands;
pub mod credential;
pub mod error;
pub mod event_writer;
pub mod schedule_source;
pub mod schedule_sync;

#[cfg(test)]
mod test_support;
