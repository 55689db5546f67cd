pub mod archive;
pub mod download;
pub mod error;
pub mod event;
pub mod vcs;
