//! # lua-chat
//!
//! A chat endpoint for Lua programmers. A message either goes straight to an
//! LLM completion service, or is first matched against a catalog of Lua
//! snippets whose best hits the model merges into one answer.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌────────────┐   ┌─────────────┐
//! │ Catalog  │──▶│   Scorer   │──▶│             │
//! │ builtin/ │   │ (keywords) │   │ ChatService │──▶ HTTP / CLI
//! │  TOML    │   └────────────┘   │             │
//! └──────────┘                    └──────┬──────┘
//!                                        ▼
//!                                 ┌─────────────┐
//!                                 │ Completion  │
//!                                 │  gateway    │
//!                                 └─────────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`catalog`] | Snippet sources |
//! | [`lua_check`] | Lua syntax validation |
//! | [`search`] | Keyword relevance scoring |
//! | [`completion`] | Completion gateway abstraction |
//! | [`prompts`] | Personas, templates, fixed texts |
//! | [`chat`] | Request orchestration |
//! | [`server`] | HTTP server |

pub mod catalog;
pub mod chat;
pub mod completion;
pub mod config;
pub mod lua_check;
pub mod models;
pub mod prompts;
pub mod search;
pub mod server;
