//! Error types for manifest loading

use std::path::PathBuf;

use ariadne::{Color, Label, Report, ReportKind, Source};
use thiserror::Error;

use crate::template::RegistryError;

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("error reading manifest {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("manifest parse error: {message}")]
    Parse { message: String, span: Option<Span> },

    #[error("invalid manifest: {0}")]
    Registry(#[from] RegistryError),
}

impl From<toml::de::Error> for LoadError {
    fn from(err: toml::de::Error) -> Self {
        LoadError::Parse {
            message: err.message().to_string(),
            span: err.span(),
        }
    }
}

impl LoadError {
    /// Source location the error points at, if any
    pub fn span(&self, source: &str) -> Option<Span> {
        match self {
            LoadError::Parse { span, .. } => span.clone(),
            LoadError::Registry(err) => registry_span(err, source),
            LoadError::Io { .. } => None,
        }
    }

    /// Format the error with source context using ariadne
    pub fn format(&self, source: &str, filename: &str) -> String {
        let Some(span) = self.span(source) else {
            return format!("Error: {}", self);
        };

        let message = match self {
            LoadError::Parse { message, .. } => message.clone(),
            other => other.to_string(),
        };

        let mut buf = Vec::new();
        let written = Report::build(ReportKind::Error, filename, span.start)
            .with_message(&message)
            .with_label(
                Label::new((filename, span))
                    .with_message(message.as_str())
                    .with_color(Color::Red),
            )
            .finish()
            .write((filename, Source::from(source)), &mut buf);

        match written {
            Ok(()) => String::from_utf8_lossy(&buf).into_owned(),
            Err(_) => format!("Error: {}", self),
        }
    }
}

/// Point registry errors at the offending quoted name; the last occurrence
/// is the redeclaration for duplicates.
fn registry_span(err: &RegistryError, source: &str) -> Option<Span> {
    let name = match err {
        RegistryError::DuplicateBlock { name, .. } => name,
        RegistryError::DuplicateTemplate { id } => id,
        RegistryError::TemplateNotFound { id } => id,
        RegistryError::UndeclaredSubBlock { name, .. } => name,
    };
    let needle = format!("\"{}\"", name);
    source
        .rfind(&needle)
        .map(|start| start..start + needle.len())
}
