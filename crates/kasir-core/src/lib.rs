//! # kasir-core: Pure Business Logic for the kasir POS
//!
//! This crate is the heart of the system. It contains all business logic
//! as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  React frontends (cashier kiosk, admin dashboard)               │
//! │       │ REST                                                    │
//! │  ┌────▼────────────────────────────────────────────────────┐    │
//! │  │            ★ kasir-core (THIS CRATE) ★                  │    │
//! │  │                                                         │    │
//! │  │  ┌────────┐ ┌─────────┐ ┌──────────┐ ┌──────────────┐   │    │
//! │  │  │ money  │ │ pricing │ │ discount │ │  settings    │   │    │
//! │  │  │ Money  │ │ totals  │ │  parse   │ │ StoreSettings│   │    │
//! │  │  └────────┘ └─────────┘ └──────────┘ └──────────────┘   │    │
//! │  │  ┌────────┐ ┌─────────┐ ┌──────────────────────────┐   │    │
//! │  │  │ types  │ │ receipt │ │ validation               │   │    │
//! │  │  └────────┘ └─────────┘ └──────────────────────────┘   │    │
//! │  │                                                         │    │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS    │    │
//! │  └────┬────────────────────────────────────────────────────┘    │
//! │       │                                                         │
//! │  ┌────▼────────────────────────────────────────────────────┐    │
//! │  │  kasir-db: SQLite repositories, checkout transaction    │    │
//! │  └─────────────────────────────────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Member, Sale, etc.)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`discount`] - Manual discount input parsing
//! - [`pricing`] - The checkout totals computation
//! - [`settings`] - Typed store settings with per-field defaults
//! - [`receipt`] - Pure receipt projection
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: same input = same output, always
//! 2. **No I/O**: database, network and file access are FORBIDDEN here
//! 3. **Integer Money**: all monetary values are whole rupiah (i64)
//! 4. **Explicit Errors**: typed errors, never strings or panics

pub mod discount;
pub mod error;
pub mod money;
pub mod pricing;
pub mod receipt;
pub mod settings;
pub mod types;
pub mod validation;

pub use discount::ManualDiscount;
pub use error::{CoreError, ValidationError};
pub use money::{DiscountRate, Money, TaxRate};
pub use pricing::{CartLine, PricedLine, SaleTotals};
pub use receipt::ReceiptView;
pub use settings::{SettingKind, SettingValue, StoreSettings};
pub use types::*;

/// Maximum number of distinct lines in a single checkout.
///
/// Prevents runaway carts; a stationery counter sale never legitimately
/// reaches this.
pub const MAX_CART_LINES: usize = 100;

/// Maximum quantity of a single item per line.
///
/// Guards against typos (1000 where 10 was meant).
pub const MAX_LINE_QUANTITY: i64 = 999;

/// Settings key holding the ordered favorites list (JSON array of ids).
pub const FAVORITES_SETTING_KEY: &str = "favoriteProductIds";
