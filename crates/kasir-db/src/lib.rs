//! # kasir-db: SQLite Persistence for the kasir POS
//!
//! Everything that touches the database lives here: the connection pool,
//! embedded migrations, one repository per aggregate, and the two
//! stateful services built on top of them.
//!
//! ## Layout
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                    Database (pool.rs)                      │
//! │        WAL SQLite pool + embedded migrations               │
//! ├──────────────────────────┬─────────────────────────────────┤
//! │ repositories             │ services                        │
//! │                          │                                 │
//! │  CatalogRepository       │  CheckoutService (checkout.rs)  │
//! │  CategoryRepository      │    the atomic sale transaction  │
//! │  MemberRepository        │                                 │
//! │  SaleRepository          │  FavoritesManager               │
//! │  SettingsRepository      │    (favorites.rs)               │
//! └──────────────────────────┴─────────────────────────────────┘
//! ```
//!
//! Domain types and the pricing computation come from `kasir-core`; this
//! crate feeds them rows and persists their results.

pub mod checkout;
pub mod error;
pub mod favorites;
pub mod migrations;
pub mod pool;
pub mod repository;

pub use checkout::{CheckoutError, CheckoutRequest, CheckoutService, CommittedSale};
pub use error::{DbError, DbResult, StoreError, StoreResult};
pub use favorites::{FavoriteError, FavoritesManager};
pub use pool::{Database, DbConfig};
pub use repository::category::CategoryRepository;
pub use repository::member::{MemberRepository, NewMember};
pub use repository::product::{CatalogRepository, NewProduct};
pub use repository::sale::SaleRepository;
pub use repository::settings::SettingsRepository;
