//! Dependency collector that finds every statically known module reference
//! in a declaration file, in document order.

use oxc_allocator::Allocator;
use oxc_ast::ast::{
    Argument, CallExpression, ExportAllDeclaration, ExportNamedDeclaration, Expression,
    ImportDeclaration, ImportExpression, Program, StringLiteral, TSImportEqualsDeclaration,
    TSImportType, TSModuleReference,
};
use oxc_ast_visit::{Visit, walk};
use oxc_parser::Parser;
use oxc_span::{SourceType, Span};

/// Syntactic form a specifier was found in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecifierKind {
    /// `import ... from "x"` or `import "x"`
    Import,
    /// `export ... from "x"` or `export * from "x"`
    ReExport,
    /// `require("x")`
    Require,
    /// `import("x")`, as an expression or in type position
    DynamicImport,
    /// `import x = require("x")`
    ImportEquals,
}

/// A module specifier discovered during traversal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredSpecifier {
    pub specifier: String,
    pub kind: SpecifierKind,
    /// Span of the string literal, quotes included
    pub span: Span,
}

/// Visitor collecting module specifiers
#[derive(Debug, Default)]
pub struct DependencyCollector {
    specifiers: Vec<DiscoveredSpecifier>,
}

impl DependencyCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Walk `program` and return every specifier found, duplicates included
    pub fn collect(program: &Program<'_>) -> Vec<DiscoveredSpecifier> {
        let mut collector = Self::new();
        collector.visit_program(program);
        collector.specifiers
    }

    fn record(&mut self, literal: &StringLiteral<'_>, kind: SpecifierKind) {
        self.specifiers.push(DiscoveredSpecifier {
            specifier: literal.value.to_string(),
            kind,
            span: literal.span,
        });
    }
}

impl<'a> Visit<'a> for DependencyCollector {
    fn visit_import_declaration(&mut self, it: &ImportDeclaration<'a>) {
        self.record(&it.source, SpecifierKind::Import);
    }

    fn visit_export_named_declaration(&mut self, it: &ExportNamedDeclaration<'a>) {
        if let Some(source) = &it.source {
            self.record(source, SpecifierKind::ReExport);
        }
        walk::walk_export_named_declaration(self, it);
    }

    fn visit_export_all_declaration(&mut self, it: &ExportAllDeclaration<'a>) {
        self.record(&it.source, SpecifierKind::ReExport);
    }

    fn visit_ts_import_equals_declaration(&mut self, it: &TSImportEqualsDeclaration<'a>) {
        if let TSModuleReference::ExternalModuleReference(external) = &it.module_reference {
            self.record(&external.expression, SpecifierKind::ImportEquals);
        }
        walk::walk_ts_import_equals_declaration(self, it);
    }

    fn visit_call_expression(&mut self, it: &CallExpression<'a>) {
        if let Expression::Identifier(callee) = &it.callee
            && callee.name.as_str() == "require"
            && let Some(Argument::StringLiteral(literal)) = it.arguments.first()
        {
            self.record(literal, SpecifierKind::Require);
        }
        walk::walk_call_expression(self, it);
    }

    fn visit_import_expression(&mut self, it: &ImportExpression<'a>) {
        if let Expression::StringLiteral(literal) = &it.source {
            self.record(literal, SpecifierKind::DynamicImport);
        }
        walk::walk_import_expression(self, it);
    }

    fn visit_ts_import_type(&mut self, it: &TSImportType<'a>) {
        self.record(&it.source, SpecifierKind::DynamicImport);
        walk::walk_ts_import_type(self, it);
    }
}

/// Parse `declaration` as a `.d.ts` document and collect its specifiers.
///
/// Parse errors are tolerated: whatever the parser recovered is walked.
pub fn collect_declaration_specifiers(declaration: &str) -> Vec<DiscoveredSpecifier> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, declaration, SourceType::d_ts()).parse();
    if !ret.errors.is_empty() {
        log::debug!(
            "Declaration text has {} parse error(s); collecting from the recovered tree",
            ret.errors.len()
        );
    }
    DependencyCollector::collect(&ret.program)
}
