//! Domain records of the school administration schema.
//!
//! # Responsibility
//! - Define one record type per table with its write-time validation.
//! - Keep "required on write" separate from "nullable after clear": cleared
//!   references are `Option` on read, yet `validate()` rejects `None`.
//!
//! # Invariants
//! - Every record is identified by a client-generated UUID.
//! - `created_at`/`updated_at` are filled from storage and ignored on write.

pub mod account;
pub mod class_template;
pub mod comment;
pub mod profile;
pub mod student_result;
pub mod teacher;
pub mod ticket;
pub mod validation;
