//! Namespace-qualified names.
//!
//! A [`QName`] identifies a schema node: the namespace URI and revision of
//! the module that defines it, plus the local name. Two QNames are equal iff
//! all three components are equal. Namespace and revision together identify
//! a module and are factored out as [`QNameModule`].

use std::fmt;

use smol_str::SmolStr;

/// A module revision date in `YYYY-MM-DD` form.
///
/// Ordering is calendar order; because the format is zero-padded ISO-8601,
/// lexicographic comparison of the underlying string is calendar comparison.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Revision(SmolStr);

impl Revision {
    /// Parse a revision date, validating the `YYYY-MM-DD` shape.
    pub fn parse(text: &str) -> Option<Self> {
        let bytes = text.as_bytes();
        if bytes.len() != 10 || bytes[4] != b'-' || bytes[7] != b'-' {
            return None;
        }
        let digits_at = |range: std::ops::Range<usize>| bytes[range].iter().all(u8::is_ascii_digit);
        if !digits_at(0..4) || !digits_at(5..7) || !digits_at(8..10) {
            return None;
        }
        let month: u8 = text[5..7].parse().ok()?;
        let day: u8 = text[8..10].parse().ok()?;
        if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
            return None;
        }
        Some(Self(SmolStr::new(text)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The (namespace URI, revision) pair identifying one module.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct QNameModule {
    pub namespace: SmolStr,
    pub revision: Option<Revision>,
}

impl QNameModule {
    pub fn new(namespace: impl Into<SmolStr>, revision: Option<Revision>) -> Self {
        Self {
            namespace: namespace.into(),
            revision,
        }
    }

    /// Qualify a local name in this module.
    pub fn qname(&self, local_name: impl Into<SmolStr>) -> QName {
        QName {
            module: self.clone(),
            local_name: local_name.into(),
        }
    }
}

impl fmt::Display for QNameModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.revision {
            Some(rev) => write!(f, "{}?revision={}", self.namespace, rev),
            None => f.write_str(&self.namespace),
        }
    }
}

/// A namespace-qualified name.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct QName {
    pub module: QNameModule,
    pub local_name: SmolStr,
}

impl QName {
    pub fn new(module: QNameModule, local_name: impl Into<SmolStr>) -> Self {
        Self {
            module,
            local_name: local_name.into(),
        }
    }

    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    pub fn namespace(&self) -> &str {
        &self.module.namespace
    }

    pub fn revision(&self) -> Option<&Revision> {
        self.module.revision.as_ref()
    }

    /// Same local name rebased into another module.
    pub fn rebase(&self, module: QNameModule) -> QName {
        QName {
            module,
            local_name: self.local_name.clone(),
        }
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}){}", self.module, self.local_name)
    }
}
