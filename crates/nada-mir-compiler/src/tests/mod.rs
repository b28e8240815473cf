/*! Compiler behaviour over hand-built graphs and HIR documents. */

mod fixtures;
mod hir_tests;
