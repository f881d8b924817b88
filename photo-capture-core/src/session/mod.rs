pub mod camera_session;
pub mod coordinator;
pub mod delegate;
