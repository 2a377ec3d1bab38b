// src/types/mod.rs
//! Per-kind operations on [`crate::store::Store`]: String / List / Hash.

pub mod hash;
pub mod list;
pub mod string;
