//! Declaration emit.
//!
//! The bundler only needs "source in, declaration text out"; the
//! [`DeclarationEmitter`] trait is that seam. The default implementation uses
//! oxc's isolated declarations, which derive `.d.ts` text from explicit type
//! annotations without running a type checker.

use std::{
    fmt,
    path::{Path, PathBuf},
};

use log::trace;
use oxc_allocator::Allocator;
use oxc_codegen::Codegen;
use oxc_diagnostics::OxcDiagnostic;
use oxc_isolated_declarations::{IsolatedDeclarations, IsolatedDeclarationsOptions};
use oxc_parser::Parser;
use oxc_span::SourceType;

use crate::resolver::is_declaration_file;

/// A problem reported alongside a successfully emitted declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub file: PathBuf,
    /// 1-based line and column
    pub position: Option<(usize, usize)>,
    pub message: String,
}

impl Diagnostic {
    pub fn new(file: impl Into<PathBuf>, position: Option<(usize, usize)>, message: String) -> Self {
        Self {
            file: file.into(),
            position,
            message,
        }
    }

    fn from_oxc(file: &Path, source: &str, diagnostic: &OxcDiagnostic) -> Self {
        let position = diagnostic
            .labels
            .as_ref()
            .and_then(|labels| labels.first())
            .map(|label| line_column(source, label.offset()));
        Self::new(file, position, diagnostic.message.to_string())
    }

    /// `file:line:col Error message`, with `file` shown as `display_path`
    pub fn format(&self, display_path: &str) -> String {
        match self.position {
            Some((line, column)) => {
                format!("{display_path}:{line}:{column} Error {}", self.message)
            }
            None => format!("{display_path} Error {}", self.message),
        }
    }
}

/// 1-based line and column of a byte offset
fn line_column(source: &str, offset: usize) -> (usize, usize) {
    let mut offset = offset.min(source.len());
    while !source.is_char_boundary(offset) {
        offset -= 1;
    }
    let before = &source[..offset];
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map_or(0, |index| index + 1);
    let column = before[line_start..].chars().count() + 1;
    (line, column)
}

/// Successful emit output
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Emitted {
    pub declaration: String,
    pub diagnostics: Vec<Diagnostic>,
}

/// The emitter could not produce any declaration for a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmitError {
    /// The path has no extension the parser understands
    UnsupportedExtension(PathBuf),
    /// The source could not be parsed far enough to derive declarations
    Unparsable {
        path: PathBuf,
        diagnostics: Vec<Diagnostic>,
    },
}

impl fmt::Display for EmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedExtension(path) => {
                write!(f, "Unsupported file extension: {}", path.display())
            }
            Self::Unparsable { diagnostics, .. } => match diagnostics.first() {
                Some(first) => write!(f, "Unrecoverable syntax error: {}", first.message),
                None => write!(f, "Unrecoverable syntax error"),
            },
        }
    }
}

impl std::error::Error for EmitError {}

/// Produces declaration text for one source file
pub trait DeclarationEmitter {
    fn emit(&mut self, path: &Path, source: &str) -> Result<Emitted, EmitError>;
}

/// Emitter backed by `oxc_isolated_declarations`
#[derive(Debug, Clone, Default)]
pub struct IsolatedDeclarationEmitter {
    /// Drop declarations annotated with `@internal`
    strip_internal: bool,
}

impl IsolatedDeclarationEmitter {
    pub fn new(strip_internal: bool) -> Self {
        Self { strip_internal }
    }
}

impl DeclarationEmitter for IsolatedDeclarationEmitter {
    fn emit(&mut self, path: &Path, source: &str) -> Result<Emitted, EmitError> {
        let source_type = SourceType::from_path(path)
            .map_err(|_| EmitError::UnsupportedExtension(path.to_path_buf()))?;

        let allocator = Allocator::default();
        let parsed = Parser::new(&allocator, source, source_type).parse();
        let mut diagnostics: Vec<Diagnostic> = parsed
            .errors
            .iter()
            .map(|error| Diagnostic::from_oxc(path, source, error))
            .collect();

        // Existing declaration files are already in their final form.
        if is_declaration_file(path) {
            trace!("Passing through declaration file {}", path.display());
            return Ok(Emitted {
                declaration: source.to_owned(),
                diagnostics,
            });
        }

        if parsed.panicked {
            return Err(EmitError::Unparsable {
                path: path.to_path_buf(),
                diagnostics,
            });
        }

        let options = IsolatedDeclarationsOptions {
            strip_internal: self.strip_internal,
        };
        let isolated = IsolatedDeclarations::new(&allocator, options).build(&parsed.program);
        diagnostics.extend(
            isolated
                .errors
                .iter()
                .map(|error| Diagnostic::from_oxc(path, source, error)),
        );
        let declaration = Codegen::new().build(&isolated.program).code;
        trace!(
            "Emitted {} byte(s) of declarations for {}",
            declaration.len(),
            path.display()
        );

        Ok(Emitted {
            declaration,
            diagnostics,
        })
    }
}
