//! Media Monitor - republishes the system's "now playing" state to websocket subscribers.
//!
//! A [`SessionTracker`](services::media::SessionTracker) follows the active
//! media session through a [`MediaProvider`](services::media::MediaProvider)
//! (MPRIS on Linux), decides which changes matter and fans them out through
//! a [`BroadcastHub`](services::broadcast::BroadcastHub) while driving a
//! terminal display.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use media_monitor::{Monitor, config::Config, services::media::MprisProvider};
//!
//! # async fn run() -> media_monitor::Result<()> {
//! let config = Config::load()?;
//! let provider = MprisProvider::connect(config.media.clone()).await?;
//!
//! let monitor = Monitor::start(&config, Arc::new(provider)).await?;
//! tokio::signal::ctrl_c().await?;
//! monitor.stop().await;
//! # Ok(())
//! # }
//! ```

/// Command-line interface.
pub mod cli;

/// Configuration schema definitions and loading.
pub mod config;

/// Core error types and result aliases.
pub mod core;

/// Terminal now-playing display.
pub mod display;

mod monitor;

/// Playback tracking and broadcast services.
pub mod services;

/// Logging setup.
pub mod tracing_config;

/// Re-exported core types for convenience.
pub use core::{MonitorError, Result};
pub use monitor::Monitor;
