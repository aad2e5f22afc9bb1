//! # skyflow
//!
//! Map composition engine for the SkyFlow Mobility urban air traffic
//! dashboard.
//!
//! This crate loads the SkyFlow tables (aircraft, active flights, forbidden
//! zones, real-time weather, ...) from a Supabase (PostgREST) backend or an
//! offline snapshot, and composes them into a [`RenderableMap`]: a centered
//! base map with toggleable overlays and an optional highlighted flight.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use skyflow::{Dashboard, MapOptions, Selection, Supabase};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Create a client (reads ~/.config/skyflow/settings.conf)
//!     let client = Supabase::new()?;
//!
//!     // Load every table; fails if flights or aircraft is empty
//!     let dashboard = Dashboard::load(&client).await?;
//!
//!     // Build the map for aircraft 3, flight 42
//!     let selection = Selection::new(Some(3), Some(42));
//!     let (_, map) = dashboard.render(selection, &MapOptions::default());
//!
//!     skyflow::map::render::write_html(&map, "SkyFlow", "map.html")?;
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! Connection settings are read from a platform-specific config file:
//! - Linux: `~/.config/skyflow/settings.conf`
//! - macOS: `~/Library/Application Support/skyflow/settings.conf`
//! - Windows: `%LOCALAPPDATA%\skyflow\settings.conf`
//!
//! ```ini
//! [supabase]
//! url = https://your-project.supabase.co
//! api_key = your_anon_key
//! ```
//!
//! `SKYFLOW_SUPABASE_URL` and `SKYFLOW_SUPABASE_KEY` take precedence over
//! the file.

pub mod config;
pub mod dashboard;
pub mod loader;
pub mod map;
pub mod records;
pub mod report;
pub mod selection;
pub mod source;
pub mod types;

// Re-export main types for convenience
pub use config::Config;
pub use dashboard::Dashboard;
pub use loader::{load_tables, LoadWarning, TableSet};
pub use map::{build_map, LayerKind, MapOptions, RenderableMap};
pub use records::{Aircraft, Cell, Flight, ForbiddenZone, GeoPoint, Records, SkipReason, WeatherSample};
pub use report::Report;
pub use selection::{SelectOption, Selection};
pub use source::{DirectorySource, MemorySource, Supabase, TableSource};
pub use types::{Result, SkyTable, SkyflowError, Table};

// Re-export polars DataFrame for convenience
pub use polars::frame::DataFrame;
