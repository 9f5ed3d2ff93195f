//! # rpsr - Predictive State Representations for POMDP Planning
//!
//! rpsr compresses a POMDP into a predictive state representation (PSR) or a
//! reward-predictive one (RPSR) and solves it with exact alpha-vector value
//! iteration. The compressed state has one dimension per basis trace, which
//! is never more than the number of POMDP states and often far fewer.
//!
//! ## Key Features
//!
//! - **Basis search**: breadth- and depth-first discovery of tests or intents
//!   with linearly independent outcome vectors
//! - **Compressed models**: PSR, RPSR and plain belief models behind one
//!   [`model::Model`] trait
//! - **Pruning**: domination filter plus LP-based incremental enumeration
//! - **Value iteration**: enumeration, incremental pruning and true
//!   incremental pruning, optionally parallel across actions
//! - **Persistence**: JSON / bincode round-trips of bases and value functions
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rpsr::config::{Representation, SolverConfig};
//! use rpsr::solver::Solver;
//! use rpsr::testing::tiger;
//!
//! let config = SolverConfig::builder()
//!     .representation(Representation::Rpsr)
//!     .horizon(10)
//!     .build()?;
//! let solution = Solver::new(config)?.solve(&tiger())?;
//! println!("value at start: {}", solution.value_at_start()?);
//! # Ok::<(), rpsr::error::RpsrError>(())
//! ```
//!
//! ## Module Organization
//!
//! - [`config`] - Solver configuration and its builder
//! - [`error`] - Error types and result handling
//! - [`linalg`] - SVD, rank, pseudo-inverse and vector-set helpers
//! - [`metrics`] - Distances between value functions
//! - [`model`] - PSR, RPSR and belief models
//! - [`outcome`] - Outcome vectors of traces
//! - [`persist`] - Saving and loading artifacts
//! - [`policy`] - Policies driven by a value function
//! - [`pomdp`] - POMDP specification and derived operators
//! - [`pruning`] - Alpha vector pruning
//! - [`search`] - Basis search
//! - [`solver`] - End-to-end solve loop
//! - [`testing`] - Random generators and the tiger problem
//! - [`trace`] - Interactions, tests and intents
//! - [`value_function`] - Alpha vectors and value functions
//! - [`value_iteration`] - Exact backups

pub mod config;
pub mod error;
pub mod linalg;
pub mod metrics;
pub mod model;
pub mod outcome;
pub mod persist;
pub mod policy;
pub mod pomdp;
pub mod pruning;
pub mod search;
pub mod solver;
pub mod testing;
pub mod trace;
pub mod value_function;
pub mod value_iteration;

pub use error::{Result, RpsrError};
