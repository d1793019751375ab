//! # cal-bdd: Binary Decision Diagrams with dynamic reordering
//!
//! **`cal-bdd`** is a single-threaded manager for **Reduced Ordered Binary
//! Decision Diagrams** with complement edges, reference-counted handles,
//! garbage collection and in-place dynamic variable reordering.
//!
//! ## What is a BDD?
//!
//! A Binary Decision Diagram represents a Boolean function as a directed
//! acyclic graph. It is **canonical**: for a fixed variable order, every
//! function has exactly one representation, so equivalence checking is a
//! comparison of two handles.
//!
//! ## Key Features
//!
//! - **Manager-Centric Architecture**: all state lives in a [`Bdd`][crate::bdd::Bdd] manager. Independent managers share nothing.
//! - **Complement Edges**: a function and its negation share every node; negation is free.
//! - **Reference-Counted Handles**: [`Function`][crate::function::Function] values keep their nodes alive. Dropping the last handle makes a node collectable.
//! - **Dynamic Reordering**: sifting and window permutation rewrite the node store in place, without invalidating any handle.
//! - **Associations**: quantification and substitution are driven by registered variable tables.
//!
//! ## Basic Usage
//!
//! ```rust
//! use cal_bdd::bdd::Bdd;
//!
//! // 1. Initialize the manager
//! let bdd = Bdd::default();
//!
//! // 2. Create variables
//! let x1 = bdd.new_var_last().unwrap();
//! let x2 = bdd.new_var_last().unwrap();
//!
//! // 3. Build a formula: f = x1 AND (NOT x2)
//! let f = x1.and(&x2.not()).unwrap();
//!
//! // 4. Check properties
//! assert!(!f.is_zero()); // It is satisfiable
//! assert!(!f.is_one()); // It is not a tautology
//!
//! // 5. Evaluate (x1=true, x2=false) -> should be true
//! assert!(f.evaluate(&[true, false]).unwrap());
//!
//! // 6. Reorder; f still denotes the same function
//! bdd.reorder().unwrap();
//! assert!(f.evaluate(&[true, false]).unwrap());
//! ```
//!
//! ## Core Components
//!
//! - **[`bdd`]**: The [`Bdd`][crate::bdd::Bdd] manager and its node store.
//! - **[`apply`]**: The ITE evaluator and Boolean connectives.
//! - **[`gc`]**: Reference counting and garbage collection.
//! - **[`reorder`]**: Adjacent swaps, sifting and window permutation.
//! - **[`association`]**: Variable tables for quantification and substitution.
//! - **[`block`]**: Groups of variables that reordering moves as a unit.
//! - **[`sat`]**: Satisfying assignments and model counting.

pub mod apply;
pub mod association;
pub mod bdd;
pub mod block;
pub mod cache;
pub mod compose;
pub mod config;
pub mod error;
pub mod function;
pub mod gc;
pub mod node;
pub mod quant;
pub mod reference;
pub mod reorder;
pub mod sat;
pub mod subtable;
pub mod types;
pub mod utils;
