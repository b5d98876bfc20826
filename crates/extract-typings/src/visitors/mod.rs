//! AST visitor implementations for extract-typings
//!
//! This module contains visitors for traversing declaration ASTs produced by
//! `oxc_parser`, enabling module reference discovery.

mod dependency_collector;

pub use dependency_collector::{
    DependencyCollector, DiscoveredSpecifier, SpecifierKind, collect_declaration_specifiers,
};
