//! Core types for stagehand.
//!
//! This crate holds the small vocabulary shared by every other crate in the
//! workspace: handle identifiers, content categories, and the error-code
//! interface used for everything that crosses the script boundary.
//!
//! # Crate Architecture
//!
//! ```text
//! stagehand-types    : HandleId, Category, ErrorCode  ◄── HERE
//!     ↑
//! stagehand-auth     : Capability, PermissionResolver, checker
//!     ↑
//! stagehand-runtime  : Catalog, AssetSelector, HandleRegistry, Dispatcher
//!     ↑
//! stagehand-lua      : LuaEngine, host bindings, TurnLoop
//!     ↑
//! stagehand-cli      : binary
//! ```
//!
//! # Example
//!
//! ```
//! use stagehand_types::{Category, HandleId};
//!
//! let id = HandleId::from_raw(7);
//! assert_eq!(id.to_string(), "#7");
//!
//! assert_eq!("video".parse::<Category>(), Ok(Category::Video));
//! assert!(Category::Image.creates_handle());
//! assert!(!Category::Wallpaper.creates_handle());
//! ```

pub mod category;
pub mod error;
pub mod id;

pub use category::{Category, ParseCategoryError};
pub use error::ErrorCode;
pub use id::HandleId;
