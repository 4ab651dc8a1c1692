//! Effective node representation.

use smol_str::SmolStr;

use crate::base::{QName, Revision, SchemaPath};
use crate::reactor::CopyKind;
use crate::resolve::ResolvedType;

/// Lifecycle status of a definition.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NodeStatus {
    #[default]
    Current,
    Deprecated,
    Obsolete,
}

impl NodeStatus {
    pub(crate) fn parse(raw: &str) -> Option<NodeStatus> {
        match raw {
            "current" => Some(NodeStatus::Current),
            "deprecated" => Some(NodeStatus::Deprecated),
            "obsolete" => Some(NodeStatus::Obsolete),
            _ => None,
        }
    }
}

/// Documentation and constraints common to every effective node.
#[derive(Clone, Debug, Default)]
pub struct NodeMeta {
    pub description: Option<SmolStr>,
    pub reference: Option<SmolStr>,
    pub status: NodeStatus,
    pub when: Option<SmolStr>,
    /// Must expressions, in declaration order.
    pub musts: Vec<SmolStr>,
}

/// One entry of a module's revision history.
#[derive(Clone, Debug)]
pub struct ModuleRevision {
    pub date: Revision,
    pub description: Option<SmolStr>,
    pub reference: Option<SmolStr>,
}

/// Kind-specific payload of an effective node.
#[derive(Clone, Debug)]
pub enum EffectiveKind {
    Module {
        name: SmolStr,
        namespace: SmolStr,
        prefix: Option<SmolStr>,
        yang_version: Option<SmolStr>,
        organization: Option<SmolStr>,
        contact: Option<SmolStr>,
        /// Revision history, in declaration order.
        revisions: Vec<ModuleRevision>,
    },
    Container {
        presence: Option<SmolStr>,
        config: bool,
    },
    List {
        keys: Vec<SmolStr>,
        config: bool,
        min_elements: Option<u32>,
        max_elements: Option<u32>,
        ordered_by_user: bool,
    },
    Leaf {
        ty: ResolvedType,
        default: Option<SmolStr>,
        units: Option<SmolStr>,
        mandatory: bool,
        config: bool,
    },
    LeafList {
        ty: ResolvedType,
        defaults: Vec<SmolStr>,
        units: Option<SmolStr>,
        config: bool,
        min_elements: Option<u32>,
        max_elements: Option<u32>,
        ordered_by_user: bool,
    },
    Choice {
        default_case: Option<SmolStr>,
        mandatory: bool,
        config: bool,
    },
    Case,
    Anydata {
        mandatory: bool,
        config: bool,
    },
    Anyxml {
        mandatory: bool,
        config: bool,
    },
    Rpc,
    Action,
    Input,
    Output,
    Notification,
    Grouping,
    Feature,
    Identity,
    Extension {
        /// Name of the argument an instance of this extension carries.
        argument: Option<SmolStr>,
    },
    /// Instance of an extension, kept verbatim.
    Unknown {
        keyword: SmolStr,
        argument: Option<SmolStr>,
    },
}

impl EffectiveKind {
    /// Whether the node can carry instance data children.
    pub fn is_data_node(&self) -> bool {
        matches!(
            self,
            EffectiveKind::Container { .. }
                | EffectiveKind::List { .. }
                | EffectiveKind::Leaf { .. }
                | EffectiveKind::LeafList { .. }
                | EffectiveKind::Choice { .. }
                | EffectiveKind::Case
                | EffectiveKind::Anydata { .. }
                | EffectiveKind::Anyxml { .. }
        )
    }

    /// The effective `config` value, where the kind carries one.
    pub fn config(&self) -> Option<bool> {
        match self {
            EffectiveKind::Container { config, .. }
            | EffectiveKind::List { config, .. }
            | EffectiveKind::Leaf { config, .. }
            | EffectiveKind::LeafList { config, .. }
            | EffectiveKind::Choice { config, .. }
            | EffectiveKind::Anydata { config, .. }
            | EffectiveKind::Anyxml { config, .. } => Some(*config),
            _ => None,
        }
    }
}

/// One node of the effective schema tree.
#[derive(Clone, Debug)]
pub struct EffectiveNode {
    pub qname: QName,
    pub path: SchemaPath,
    pub kind: EffectiveKind,
    /// How the node arrived at this position.
    pub origin: CopyKind,
    pub meta: NodeMeta,
    pub children: Vec<EffectiveNode>,
}

impl EffectiveNode {
    pub fn local_name(&self) -> &str {
        self.qname.local_name()
    }

    /// Child with the given QName.
    pub fn child(&self, qname: &QName) -> Option<&EffectiveNode> {
        self.children.iter().find(|c| c.qname == *qname)
    }

    /// Child with the given local name, regardless of namespace.
    pub fn child_named(&self, local_name: &str) -> Option<&EffectiveNode> {
        self.children.iter().find(|c| c.local_name() == local_name)
    }

    pub fn data_children(&self) -> impl Iterator<Item = &EffectiveNode> {
        self.children.iter().filter(|c| c.kind.is_data_node())
    }

    /// Depth-first, pre-order walk of this subtree.
    pub fn walk(&self, visit: &mut impl FnMut(&EffectiveNode)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }
}
