//! Core read-side services built on top of the repositories.
//!
//! # Responsibility
//! - Compose repository lookups into presentation-ready values.
//! - Stay storage agnostic: services only see repository traits.

pub mod label_service;
