//! Output sanitizing seam for escaped variable output
//!
//! Escaping rules belong to the host application; the renderer only knows
//! that escaped `Var` output passes through a [`Sanitizer`].

/// Turns raw page-data text into safe markup
pub trait Sanitizer: Send + Sync {
    fn sanitize(&self, raw: &str) -> String;
}

/// Leaves text untouched
#[derive(Debug, Default, Clone, Copy)]
pub struct Verbatim;

impl Sanitizer for Verbatim {
    fn sanitize(&self, raw: &str) -> String {
        raw.to_string()
    }
}

impl<F> Sanitizer for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn sanitize(&self, raw: &str) -> String {
        self(raw)
    }
}
