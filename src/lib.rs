//! Multi-client bank account server.
//!
//! # Architecture Overview
//!
//! ```text
//!                   ┌───────────────────────────────────────────────────┐
//!                   │                   BANK SERVER                      │
//!                   │                                                    │
//!  Client ──────────┼─▶ ┌─────────┐   ┌──────────────┐   ┌───────────┐  │
//!  (TCP, framed)    │   │   net   │──▶│   session    │──▶│   store   │  │
//!                   │   │listener │   │ state machine│   │ 256-bucket│  │
//!  ◀────────────────┼── └─────────┘   └──────┬───────┘   │   table   │  │
//!   response frame  │                        │           └─────▲─────┘  │
//!                   │                 ┌──────▼───────┐         │        │
//!                   │                 │   protocol   │   ┌─────┴─────┐  │
//!                   │                 │ frames/parse │   │ snapshot  │  │
//!                   │                 └──────────────┘   │ reporter  │  │
//!                   │                                    └───────────┘  │
//!                   │  ┌──────────────────────────────────────────────┐ │
//!                   │  │            Cross-Cutting Concerns             │ │
//!                   │  │  config · lifecycle (shutdown, drain) ·       │ │
//!                   │  │  observability · resilience                   │ │
//!                   │  └──────────────────────────────────────────────┘ │
//!                   └───────────────────────────────────────────────────┘
//! ```

// Core subsystems
pub mod net;
pub mod protocol;
pub mod session;
pub mod store;

// Cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use config::BankConfig;
pub use lifecycle::Shutdown;
pub use net::{BankServer, Listener};
pub use store::AccountStore;
