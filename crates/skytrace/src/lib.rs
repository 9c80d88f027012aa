//! # SKYTRACE
//!
//! Drone flight simulation session: keeps a physics engine and a scene
//! graph in lock-step, one render tick at a time, and replays recorded
//! flights through the same engine.
//!
//! ```text
//! ┌──────────────┐   commands    ┌─────────────────────────────────────────┐
//! │   UI layer   │ ────────────> │              SimSession                 │
//! └──────────────┘               │                                         │
//!                                │  PhysicsStepper   InteractionController │
//! ┌──────────────┐  SceneSource  │  TrajectoryPlayer PoseSync              │
//! │ asset files  │ ────────────> │                                         │
//! └──────────────┘               └──────┬───────────────────────┬──────────┘
//!                                       │ PhysicsEngine         │ SceneRenderer
//!                                       ▼                       ▼
//!                                  physics engine          scene graph
//! ```
//!
//! ## Modules
//!
//! - [`session`]: the render-tick orchestrator
//! - [`scene`]: scene keys, metadata and the loading contract
//! - [`commands`]: the UI command queue
//! - [`config`]: TOML session configuration

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod commands;
pub mod config;
pub mod error;
pub mod scene;
pub mod session;

pub use commands::{CommandSender, SimCommand, COMMAND_CAPACITY};
pub use config::SessionConfig;
pub use error::{ConfigError, LoadError, SessionError, SessionResult};
pub use scene::{AssetDirectory, BuiltScene, ModelLoader, SceneDescriptor, SceneKey, SceneMetadata, SceneSource};
pub use session::{SimSession, TickReport};
