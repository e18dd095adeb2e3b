//! `rxfer` - transfer files and folders to an rclone remote
//!
//! The binary validates its [`inputs`], makes sure rclone is available, runs
//! one rclone invocation per source and publishes the results as step
//! [`outputs`].

pub mod inputs;
pub mod outputs;
