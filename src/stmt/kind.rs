//! The closed set of statement kinds.
//!
//! One variant per RFC 7950 statement keyword, plus [`StatementKind::Unknown`]
//! for extension-instance statements carrying their prefixed keyword verbatim.

use std::fmt;

use smol_str::SmolStr;

/// Kind tag of a declared statement.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum StatementKind {
    Action,
    Anydata,
    Anyxml,
    Argument,
    Augment,
    Base,
    BelongsTo,
    Bit,
    Case,
    Choice,
    Config,
    Contact,
    Container,
    Default,
    Description,
    Deviate,
    Deviation,
    Enum,
    ErrorAppTag,
    ErrorMessage,
    Extension,
    Feature,
    FractionDigits,
    Grouping,
    Identity,
    IfFeature,
    Import,
    Include,
    Input,
    Key,
    Leaf,
    LeafList,
    Length,
    List,
    Mandatory,
    MaxElements,
    MinElements,
    Modifier,
    Module,
    Must,
    Namespace,
    Notification,
    OrderedBy,
    Organization,
    Output,
    Path,
    Pattern,
    Position,
    Prefix,
    Presence,
    Range,
    Reference,
    Refine,
    RequireInstance,
    Revision,
    RevisionDate,
    Rpc,
    Status,
    Submodule,
    Type,
    Typedef,
    Unique,
    Units,
    Uses,
    Value,
    When,
    YangVersion,
    YinElement,
    /// Extension-instance statement; carries the (usually prefixed) keyword.
    Unknown(SmolStr),
}

impl StatementKind {
    /// Map a statement keyword to its kind; unrecognized keywords become
    /// [`StatementKind::Unknown`].
    pub fn from_keyword(keyword: &str) -> Self {
        use StatementKind::*;
        match keyword {
            "action" => Action,
            "anydata" => Anydata,
            "anyxml" => Anyxml,
            "argument" => Argument,
            "augment" => Augment,
            "base" => Base,
            "belongs-to" => BelongsTo,
            "bit" => Bit,
            "case" => Case,
            "choice" => Choice,
            "config" => Config,
            "contact" => Contact,
            "container" => Container,
            "default" => Default,
            "description" => Description,
            "deviate" => Deviate,
            "deviation" => Deviation,
            "enum" => Enum,
            "error-app-tag" => ErrorAppTag,
            "error-message" => ErrorMessage,
            "extension" => Extension,
            "feature" => Feature,
            "fraction-digits" => FractionDigits,
            "grouping" => Grouping,
            "identity" => Identity,
            "if-feature" => IfFeature,
            "import" => Import,
            "include" => Include,
            "input" => Input,
            "key" => Key,
            "leaf" => Leaf,
            "leaf-list" => LeafList,
            "length" => Length,
            "list" => List,
            "mandatory" => Mandatory,
            "max-elements" => MaxElements,
            "min-elements" => MinElements,
            "modifier" => Modifier,
            "module" => Module,
            "must" => Must,
            "namespace" => Namespace,
            "notification" => Notification,
            "ordered-by" => OrderedBy,
            "organization" => Organization,
            "output" => Output,
            "path" => Path,
            "pattern" => Pattern,
            "position" => Position,
            "prefix" => Prefix,
            "presence" => Presence,
            "range" => Range,
            "reference" => Reference,
            "refine" => Refine,
            "require-instance" => RequireInstance,
            "revision" => Revision,
            "revision-date" => RevisionDate,
            "rpc" => Rpc,
            "status" => Status,
            "submodule" => Submodule,
            "type" => Type,
            "typedef" => Typedef,
            "unique" => Unique,
            "units" => Units,
            "uses" => Uses,
            "value" => Value,
            "when" => When,
            "yang-version" => YangVersion,
            "yin-element" => YinElement,
            other => Unknown(SmolStr::new(other)),
        }
    }

    /// The statement keyword.
    pub fn keyword(&self) -> &str {
        use StatementKind::*;
        match self {
            Action => "action",
            Anydata => "anydata",
            Anyxml => "anyxml",
            Argument => "argument",
            Augment => "augment",
            Base => "base",
            BelongsTo => "belongs-to",
            Bit => "bit",
            Case => "case",
            Choice => "choice",
            Config => "config",
            Contact => "contact",
            Container => "container",
            Default => "default",
            Description => "description",
            Deviate => "deviate",
            Deviation => "deviation",
            Enum => "enum",
            ErrorAppTag => "error-app-tag",
            ErrorMessage => "error-message",
            Extension => "extension",
            Feature => "feature",
            FractionDigits => "fraction-digits",
            Grouping => "grouping",
            Identity => "identity",
            IfFeature => "if-feature",
            Import => "import",
            Include => "include",
            Input => "input",
            Key => "key",
            Leaf => "leaf",
            LeafList => "leaf-list",
            Length => "length",
            List => "list",
            Mandatory => "mandatory",
            MaxElements => "max-elements",
            MinElements => "min-elements",
            Modifier => "modifier",
            Module => "module",
            Must => "must",
            Namespace => "namespace",
            Notification => "notification",
            OrderedBy => "ordered-by",
            Organization => "organization",
            Output => "output",
            Path => "path",
            Pattern => "pattern",
            Position => "position",
            Prefix => "prefix",
            Presence => "presence",
            Range => "range",
            Reference => "reference",
            Refine => "refine",
            RequireInstance => "require-instance",
            Revision => "revision",
            RevisionDate => "revision-date",
            Rpc => "rpc",
            Status => "status",
            Submodule => "submodule",
            Type => "type",
            Typedef => "typedef",
            Unique => "unique",
            Units => "units",
            Uses => "uses",
            Value => "value",
            When => "when",
            YangVersion => "yang-version",
            YinElement => "yin-element",
            Unknown(kw) => kw.as_str(),
        }
    }

    /// Data-definition statements: the kinds that materialize data nodes.
    pub fn is_data_definition(&self) -> bool {
        use StatementKind::*;
        matches!(
            self,
            Container | Leaf | LeafList | List | Choice | Anydata | Anyxml | Uses
        )
    }

    /// Schema-node statements: data definitions plus case, rpc/action
    /// bodies and notifications. These get a QName and a schema path.
    pub fn is_schema_node(&self) -> bool {
        use StatementKind::*;
        self.is_data_definition()
            || matches!(
                self,
                Case | Rpc | Action | Input | Output | Notification | Grouping
            )
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, StatementKind::Unknown(_))
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}
