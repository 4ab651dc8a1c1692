//! Schema tree positions.

use std::fmt;

use super::QName;

/// An ordered sequence of QNames identifying a node's position in the
/// effective schema tree.
///
/// Paths are recomputed whenever a statement is copied by uses expansion or
/// augmentation; the copy's QNames keep their original identity while the
/// path reflects the new location. The tail QName of a node's path always
/// equals the node's own QName.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SchemaPath {
    absolute: bool,
    segments: Vec<QName>,
}

impl SchemaPath {
    /// The absolute root path (no segments).
    pub const fn root() -> Self {
        Self {
            absolute: true,
            segments: Vec::new(),
        }
    }

    pub fn new(absolute: bool, segments: Vec<QName>) -> Self {
        Self { absolute, segments }
    }

    pub fn is_absolute(&self) -> bool {
        self.absolute
    }

    pub fn segments(&self) -> &[QName] {
        &self.segments
    }

    pub fn last(&self) -> Option<&QName> {
        self.segments.last()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Extend this path with one more segment.
    pub fn child(&self, qname: QName) -> SchemaPath {
        let mut segments = self.segments.clone();
        segments.push(qname);
        SchemaPath {
            absolute: self.absolute,
            segments,
        }
    }

    /// The path of this node's parent, or `None` at the root.
    pub fn parent(&self) -> Option<SchemaPath> {
        if self.segments.is_empty() {
            return None;
        }
        Some(SchemaPath {
            absolute: self.absolute,
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }
}

impl fmt::Display for SchemaPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.absolute {
            f.write_str("/")?;
        }
        for (i, q) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            f.write_str(q.local_name())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::QNameModule;

    fn module() -> QNameModule {
        QNameModule::new("urn:test", None)
    }

    #[test]
    fn test_child_extends_and_preserves_flag() {
        let path = SchemaPath::root()
            .child(module().qname("a"))
            .child(module().qname("b"));
        assert!(path.is_absolute());
        assert_eq!(path.len(), 2);
        assert_eq!(path.last().unwrap().local_name(), "b");
    }

    #[test]
    fn test_parent_of_root_is_none() {
        assert!(SchemaPath::root().parent().is_none());
        let one = SchemaPath::root().child(module().qname("a"));
        assert_eq!(one.parent().unwrap(), SchemaPath::root());
    }

    #[test]
    fn test_display() {
        let path = SchemaPath::root()
            .child(module().qname("a"))
            .child(module().qname("b"));
        assert_eq!(path.to_string(), "/a/b");
    }
}
