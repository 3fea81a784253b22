#![deny(missing_docs)]

//! # EID Models
//!
//! Core data types for the EID member portal.
//!
//! ## Type hierarchy
//!
//! ```text
//! Identity
//! ├── tribes / admin_tribes: Vec<TribeName>
//! └── wallets: Vec<LinkedWallet>
//!     ├── WalletId
//!     ├── WalletAddress
//!     └── tribes: Vec<TribeName>
//! ```
//!
//! ## Module layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identity`] | `Identity`, `LinkedWallet`, `TribeName` |
//! | [`wallet`] | `WalletAddress`, `WalletId` and the short display form |
//! | [`chain`] | `ChainId` and `SuiNetwork` (wallet network detection) |
//! | [`api`] | Request / response bodies of the portal REST API |
//! | [`roster`] | Admin roster rows, member detail, audit trail and notes |
//! | [`voice`] | Voice-chat (Mumble) account DTOs |
//! | [`format`] | Human-readable time and explorer-link helpers |
//! | [`routes`] | Canonical REST paths (`ApiRoutes`) |

pub mod api;
pub mod chain;
pub mod error;
pub mod format;
pub mod identity;
pub mod roster;
pub mod routes;
pub mod voice;
pub mod wallet;

// Re-export all public types at crate root for convenience.
pub use api::*;
pub use chain::*;
pub use error::*;
pub use format::*;
pub use identity::*;
pub use roster::*;
pub use routes::*;
pub use voice::*;
pub use wallet::*;
