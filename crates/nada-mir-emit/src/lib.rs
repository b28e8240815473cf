/*! Persist compiled MIR documents.
 *
 * The downstream circuit compiler picks programs up as `<name>.nada.json` files from a target
 * directory. This crate renders documents as compact or pretty JSON and places them there, optionally
 * alongside the program graph as `<name>.nada-pydsl-hir.json`.
 */

pub mod config;
pub mod emitter;

pub use config::{EmitterConfig, OutputStyle, DEFAULT_TARGET_DIR, TARGET_DIR_ENV};
pub use emitter::{MirEmitter, HIR_EXTENSION, MIR_EXTENSION};
