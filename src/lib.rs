//! A collection library written from scratch: sequences, maps, sets and a couple of
//! concurrency-safe queues, with nothing borrowed from [`std::collections`].
//!
//! # Purpose
//! This crate exists because data structures are best understood by building them. Every container
//! here is implemented down to its allocations: the growable
//! [`Vector`](collections::contiguous::Vector) manages its own buffer, the
//! [`LinkedList`](collections::linked::LinkedList) its own nodes, the
//! [`HashMap`](collections::hash::HashMap) its own collision chains and the
//! [`TreeMap`](collections::tree::TreeMap) its own rebalancing. The [`concurrent`] module extends
//! the same approach to shared-memory containers.
//!
//! # Method
//! The APIs take a lot of inspiration from [`std`], because users shouldn't have to relearn what
//! `push` or `insert` means. The implementations don't: this library never uses [`Vec`],
//! [`std::collections::HashMap`] or friends internally. I have tried to be careful with unsafe
//! code - every unsafe block carries a `SAFETY:` comment - but the point of the exercise is the
//! data structures, not a formal audit.
//!
//! # Error Handling
//! Errors are strongly typed: small structs implementing [`Error`](std::error::Error), combined
//! into enums for static dispatch where an operation can fail more than one way. Operations that
//! are expected to be used infallibly (indexing a checked position, pushing within `isize::MAX`)
//! panic with a documented message instead of forcing a [`Result`] on every call; each such method
//! has a `try_` counterpart that surfaces the error value.
//!
//! # Dependencies
//! Apart from derive macros for the repetitive parts of error types, the only dependency is
//! `crossbeam-epoch`, which provides safe memory reclamation for the lock-free queue. Writing an
//! epoch collector is a project of its own; using one is not cheating, it is the ecosystem's
//! answer to the ABA problem.

#![warn(clippy::missing_safety_doc)]
#![warn(clippy::undocumented_unsafe_blocks)]
#![warn(clippy::missing_panics_doc)]
#![warn(clippy::unwrap_used)]
#![allow(clippy::module_inception)]

pub mod collections;

#[cfg(feature = "concurrent")]
pub mod concurrent;

pub(crate) mod util;
