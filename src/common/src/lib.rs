//! Shared types for KaikuOS.
//!
//! Console input is described by two vocabularies that both the kernel and
//! future consumers of keyboard input need to agree on: the modifier-key
//! state of the keyboard and the logical codes for keys without an ASCII
//! representation.

#![no_std]

pub mod keys;
mod modifiers;

pub use modifiers::Modifiers;
