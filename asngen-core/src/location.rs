//! Dotted location path maintained during the type-tree walk.

use crate::error::{GenerateError, Reason};

/// Path stack: module name, top-level type name, then one segment per
/// nested member or alternative.
///
/// It is passed explicitly through the traversal; nothing is stored
/// between separate generation calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    segments: Vec<String>,
}

impl Location {
    pub fn new(module: &str, name: &str) -> Self {
        Location {
            segments: vec![module.to_string(), name.to_string()],
        }
    }

    pub fn push(&mut self, segment: &str) {
        self.segments.push(segment.to_string());
    }

    pub fn pop(&mut self) {
        // The module and type segments stay for the whole walk.
        if self.segments.len() > 2 {
            self.segments.pop();
        }
    }

    /// Run `f` with `segment` pushed, popping it again on both success and
    /// failure.
    pub fn within<T>(
        &mut self,
        segment: &str,
        f: impl FnOnce(&mut Self) -> Result<T, GenerateError>,
    ) -> Result<T, GenerateError> {
        self.push(segment);
        let result = f(self);
        self.pop();
        result
    }

    pub fn module(&self) -> &str {
        &self.segments[0]
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn path(&self) -> String {
        self.segments.join(".")
    }

    pub fn error(&self, reason: Reason) -> GenerateError {
        GenerateError {
            location: self.path(),
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_segments_with_dots() {
        let mut location = Location::new("Foo", "A");
        location.push("a");
        location.push("b");
        assert_eq!(location.path(), "Foo.A.a.b");
        location.pop();
        assert_eq!(location.path(), "Foo.A.a");
    }

    #[test]
    fn never_pops_below_the_type() {
        let mut location = Location::new("Foo", "A");
        location.pop();
        assert_eq!(location.path(), "Foo.A");
    }

    #[test]
    fn within_restores_on_error() {
        let mut location = Location::new("Foo", "A");
        let err = location
            .within("a", |loc| Err::<(), _>(loc.error(Reason::MissingLowerBound)))
            .unwrap_err();
        assert_eq!(err.to_string(), "Foo.A.a: INTEGER has no minimum value.");
        assert_eq!(location.path(), "Foo.A");
    }
}
