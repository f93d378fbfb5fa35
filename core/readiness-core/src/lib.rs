//! # readiness-core
//!
//! Decides when the focused session may fire its single downstream action
//! (a suggestions fetch), given session lifecycle and page events arriving
//! in any order.
//!
//! ## Design Principles
//!
//! - **Synchronous**: No async runtime dependency. The owner runs delayed
//!   checks on the same thread that delivers events.
//! - **Not thread-safe**: Clients provide their own synchronization.
//! - **Total**: Events that do not apply are no-ops, never errors.
//! - **Injected collaborators**: The sink, scheduler, clock and host are
//!   traits; virtual implementations ship here for replay and tests.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use readiness_core::{replay::run_script, ReadinessConfig};
//! use readiness_protocol::parse_script;
//!
//! let script = parse_script(&input)?;
//! let report = run_script(&script, &ReadinessConfig::default())?;
//! ```

pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod host;
pub mod registry;
pub mod replay;
pub mod sink;
pub mod state;
pub mod timing;

pub use config::{load_config, ReadinessConfig, DEFAULT_MIN_DELAY_MS, MIN_DELAY_ENV_VAR};
pub use engine::ReadinessEngine;
pub use error::{ReadinessError, Result};
pub use host::{HostSession, ScriptHost, SessionHost};
pub use registry::SessionRegistry;
pub use sink::{ActionSink, RecordingSink};
pub use state::{ReadinessPhase, SessionReadinessState};
pub use timing::{
    Clock, DelayedCheck, DelayedTaskScheduler, ManualClock, ManualScheduler, MonotonicClock,
    ScheduledCheck,
};
