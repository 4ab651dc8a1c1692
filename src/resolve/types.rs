//! Type derivation.
//!
//! Every `type` statement resolves to a builtin type plus the restrictions
//! accumulated along its typedef chain. Derived types may only narrow:
//! a range or length expression must stay inside the set its base admits,
//! and patterns accumulate conjunctively. Typedef chains are memoized, so
//! a typedef used by a thousand leaves is walked once.

use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use tracing::debug;

use crate::base::QName;
use crate::errors::{InferenceError, ReactorError};
use crate::reactor::{BuildState, CtxId, ModelPhase};
use crate::registry::NamespaceKind;
use crate::stmt::StatementKind;

const PHASE: ModelPhase = ModelPhase::EffectiveModel;

/// Namespace carrying the builtin type names.
pub const BUILTIN_NAMESPACE: &str = "urn:ietf:params:xml:ns:yang:1";

/// The builtin types every derivation chain bottoms out in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BuiltinType {
    Binary,
    Bits,
    Boolean,
    Decimal64,
    Empty,
    Enumeration,
    Identityref,
    InstanceIdentifier,
    Int8,
    Int16,
    Int32,
    Int64,
    Leafref,
    String,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Union,
}

impl BuiltinType {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "binary" => BuiltinType::Binary,
            "bits" => BuiltinType::Bits,
            "boolean" => BuiltinType::Boolean,
            "decimal64" => BuiltinType::Decimal64,
            "empty" => BuiltinType::Empty,
            "enumeration" => BuiltinType::Enumeration,
            "identityref" => BuiltinType::Identityref,
            "instance-identifier" => BuiltinType::InstanceIdentifier,
            "int8" => BuiltinType::Int8,
            "int16" => BuiltinType::Int16,
            "int32" => BuiltinType::Int32,
            "int64" => BuiltinType::Int64,
            "leafref" => BuiltinType::Leafref,
            "string" => BuiltinType::String,
            "uint8" => BuiltinType::Uint8,
            "uint16" => BuiltinType::Uint16,
            "uint32" => BuiltinType::Uint32,
            "uint64" => BuiltinType::Uint64,
            "union" => BuiltinType::Union,
            _ => return None,
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            BuiltinType::Binary => "binary",
            BuiltinType::Bits => "bits",
            BuiltinType::Boolean => "boolean",
            BuiltinType::Decimal64 => "decimal64",
            BuiltinType::Empty => "empty",
            BuiltinType::Enumeration => "enumeration",
            BuiltinType::Identityref => "identityref",
            BuiltinType::InstanceIdentifier => "instance-identifier",
            BuiltinType::Int8 => "int8",
            BuiltinType::Int16 => "int16",
            BuiltinType::Int32 => "int32",
            BuiltinType::Int64 => "int64",
            BuiltinType::Leafref => "leafref",
            BuiltinType::String => "string",
            BuiltinType::Uint8 => "uint8",
            BuiltinType::Uint16 => "uint16",
            BuiltinType::Uint32 => "uint32",
            BuiltinType::Uint64 => "uint64",
            BuiltinType::Union => "union",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            BuiltinType::Decimal64
                | BuiltinType::Int8
                | BuiltinType::Int16
                | BuiltinType::Int32
                | BuiltinType::Int64
                | BuiltinType::Uint8
                | BuiltinType::Uint16
                | BuiltinType::Uint32
                | BuiltinType::Uint64
        )
    }

    pub fn has_length(&self) -> bool {
        matches!(self, BuiltinType::String | BuiltinType::Binary)
    }

    /// Natural value envelope of a numeric builtin.
    fn limits(&self) -> Option<(f64, f64)> {
        Some(match self {
            BuiltinType::Int8 => (i8::MIN as f64, i8::MAX as f64),
            BuiltinType::Int16 => (i16::MIN as f64, i16::MAX as f64),
            BuiltinType::Int32 => (i32::MIN as f64, i32::MAX as f64),
            BuiltinType::Int64 => (i64::MIN as f64, i64::MAX as f64),
            BuiltinType::Uint8 => (0.0, u8::MAX as f64),
            BuiltinType::Uint16 => (0.0, u16::MAX as f64),
            BuiltinType::Uint32 => (0.0, u32::MAX as f64),
            BuiltinType::Uint64 => (0.0, u64::MAX as f64),
            BuiltinType::Decimal64 => (f64::MIN, f64::MAX),
            _ => return None,
        })
    }
}

/// A disjunction of closed numeric intervals, as a `range` argument denotes.
#[derive(Clone, Debug, PartialEq)]
pub struct ValueRange {
    parts: Vec<(f64, f64)>,
}

impl ValueRange {
    pub fn parts(&self) -> &[(f64, f64)] {
        &self.parts
    }

    pub fn contains(&self, value: f64) -> bool {
        self.parts.iter().any(|&(lo, hi)| lo <= value && value <= hi)
    }

    /// Every interval of `self` lies within some interval of `other`.
    pub fn subset_of(&self, other: &ValueRange) -> bool {
        self.parts
            .iter()
            .all(|&(lo, hi)| other.parts.iter().any(|&(plo, phi)| plo <= lo && hi <= phi))
    }

    fn envelope(&self) -> (f64, f64) {
        let lo = self.parts.first().map(|p| p.0).unwrap_or(f64::MIN);
        let hi = self.parts.last().map(|p| p.1).unwrap_or(f64::MAX);
        (lo, hi)
    }

    /// Parse a range argument; `min`/`max` denote the bounds of `base`.
    pub fn parse(input: &str, base: &ValueRange) -> Result<ValueRange, String> {
        let (base_lo, base_hi) = base.envelope();
        let mut parts = Vec::new();
        for piece in input.split('|') {
            let piece = piece.trim();
            if piece.is_empty() {
                return Err(format!("empty part in range \"{input}\""));
            }
            let (lo_raw, hi_raw) = match piece.split_once("..") {
                Some((lo, hi)) => (lo.trim(), hi.trim()),
                None => (piece, piece),
            };
            let lo = parse_bound(lo_raw, base_lo, base_hi)?;
            let hi = parse_bound(hi_raw, base_lo, base_hi)?;
            if lo > hi {
                return Err(format!("inverted interval \"{piece}\""));
            }
            if let Some(&(_, prev_hi)) = parts.last() {
                if lo <= prev_hi {
                    return Err(format!("intervals out of order in \"{input}\""));
                }
            }
            parts.push((lo, hi));
        }
        Ok(ValueRange { parts })
    }
}

fn parse_bound(raw: &str, base_lo: f64, base_hi: f64) -> Result<f64, String> {
    match raw {
        "min" => Ok(base_lo),
        "max" => Ok(base_hi),
        _ => raw
            .parse::<f64>()
            .map_err(|_| format!("invalid range bound \"{raw}\"")),
    }
}

/// A disjunction of closed length intervals over string/binary values.
#[derive(Clone, Debug, PartialEq)]
pub struct LengthRange {
    parts: Vec<(u64, u64)>,
}

impl LengthRange {
    pub fn unrestricted() -> Self {
        LengthRange {
            parts: vec![(0, u64::MAX)],
        }
    }

    pub fn parts(&self) -> &[(u64, u64)] {
        &self.parts
    }

    pub fn allows(&self, length: u64) -> bool {
        self.parts
            .iter()
            .any(|&(lo, hi)| lo <= length && length <= hi)
    }

    pub fn subset_of(&self, other: &LengthRange) -> bool {
        self.parts
            .iter()
            .all(|&(lo, hi)| other.parts.iter().any(|&(plo, phi)| plo <= lo && hi <= phi))
    }

    fn envelope(&self) -> (u64, u64) {
        let lo = self.parts.first().map(|p| p.0).unwrap_or(0);
        let hi = self.parts.last().map(|p| p.1).unwrap_or(u64::MAX);
        (lo, hi)
    }

    pub fn parse(input: &str, base: &LengthRange) -> Result<LengthRange, String> {
        let (base_lo, base_hi) = base.envelope();
        let mut parts = Vec::new();
        for piece in input.split('|') {
            let piece = piece.trim();
            if piece.is_empty() {
                return Err(format!("empty part in length \"{input}\""));
            }
            let (lo_raw, hi_raw) = match piece.split_once("..") {
                Some((lo, hi)) => (lo.trim(), hi.trim()),
                None => (piece, piece),
            };
            let lo = parse_length_bound(lo_raw, base_lo, base_hi)?;
            let hi = parse_length_bound(hi_raw, base_lo, base_hi)?;
            if lo > hi {
                return Err(format!("inverted interval \"{piece}\""));
            }
            if let Some(&(_, prev_hi)) = parts.last() {
                if lo <= prev_hi {
                    return Err(format!("intervals out of order in \"{input}\""));
                }
            }
            parts.push((lo, hi));
        }
        Ok(LengthRange { parts })
    }
}

fn parse_length_bound(raw: &str, base_lo: u64, base_hi: u64) -> Result<u64, String> {
    match raw {
        "min" => Ok(base_lo),
        "max" => Ok(base_hi),
        _ => raw
            .parse::<u64>()
            .map_err(|_| format!("invalid length bound \"{raw}\"")),
    }
}

/// A fully derived type: the builtin it bottoms out in plus everything the
/// typedef chain and the final `type` statement contributed.
#[derive(Clone, Debug)]
pub struct ResolvedType {
    builtin: BuiltinType,
    /// Typedef names from most-derived to the one directly over the
    /// builtin; empty for a direct builtin reference.
    chain: Vec<QName>,
    range: Option<ValueRange>,
    length: Option<LengthRange>,
    patterns: Vec<SmolStr>,
    fraction_digits: Option<u8>,
    enum_names: Vec<SmolStr>,
    bit_names: Vec<SmolStr>,
    identity_bases: Vec<QName>,
    leafref_path: Option<SmolStr>,
    union_members: Vec<ResolvedType>,
    default: Option<SmolStr>,
    units: Option<SmolStr>,
}

impl ResolvedType {
    fn of_builtin(builtin: BuiltinType) -> Self {
        ResolvedType {
            builtin,
            chain: Vec::new(),
            range: builtin
                .limits()
                .map(|(lo, hi)| ValueRange { parts: vec![(lo, hi)] }),
            length: builtin.has_length().then(LengthRange::unrestricted),
            patterns: Vec::new(),
            fraction_digits: None,
            enum_names: Vec::new(),
            bit_names: Vec::new(),
            identity_bases: Vec::new(),
            leafref_path: None,
            union_members: Vec::new(),
            default: None,
            units: None,
        }
    }

    pub fn builtin(&self) -> BuiltinType {
        self.builtin
    }

    /// The typedef chain, most-derived first. Walkable down to the builtin.
    pub fn chain(&self) -> &[QName] {
        &self.chain
    }

    pub fn range(&self) -> Option<&ValueRange> {
        self.range.as_ref()
    }

    pub fn length(&self) -> Option<&LengthRange> {
        self.length.as_ref()
    }

    /// Accumulated patterns; a value must match all of them.
    pub fn patterns(&self) -> &[SmolStr] {
        &self.patterns
    }

    pub fn fraction_digits(&self) -> Option<u8> {
        self.fraction_digits
    }

    pub fn enum_names(&self) -> &[SmolStr] {
        &self.enum_names
    }

    pub fn bit_names(&self) -> &[SmolStr] {
        &self.bit_names
    }

    pub fn identity_bases(&self) -> &[QName] {
        &self.identity_bases
    }

    pub fn leafref_path(&self) -> Option<&str> {
        self.leafref_path.as_deref()
    }

    pub fn union_members(&self) -> &[ResolvedType] {
        &self.union_members
    }

    /// Default inherited from the typedef chain, unless overridden closer
    /// to the leaf.
    pub fn default(&self) -> Option<&str> {
        self.default.as_deref()
    }

    pub fn units(&self) -> Option<&str> {
        self.units.as_deref()
    }
}

/// All resolved types of one build, keyed by the `type` statement contexts
/// and aggregated per typedef.
#[derive(Clone, Debug, Default)]
pub struct ResolvedTypes {
    by_ctx: FxHashMap<CtxId, ResolvedType>,
    typedefs: IndexMap<QName, ResolvedType>,
}

impl ResolvedTypes {
    pub(crate) fn of_ctx(&self, type_ctx: CtxId) -> Option<&ResolvedType> {
        self.by_ctx.get(&type_ctx)
    }

    pub fn typedef(&self, qname: &QName) -> Option<&ResolvedType> {
        self.typedefs.get(qname)
    }

    pub fn typedefs(&self) -> impl Iterator<Item = (&QName, &ResolvedType)> {
        self.typedefs.iter()
    }
}

/// Resolve every live `type` statement in the build.
pub(crate) fn resolve_types(state: &mut BuildState) -> Result<ResolvedTypes, ReactorError> {
    let mut resolved = ResolvedTypes::default();
    let mut memo: FxHashMap<CtxId, ResolvedType> = FxHashMap::default();
    for index in 0..state.arena.len() {
        let id = CtxId::from_raw(index as u32);
        let ctx = state.arena.get(id);
        if ctx.removed || ctx.kind != StatementKind::Type {
            continue;
        }
        // Types nested in unions are resolved through their parent.
        if ctx
            .parent
            .is_some_and(|p| state.arena.get(p).kind == StatementKind::Type)
        {
            continue;
        }
        let ty = resolve_type_ctx(state, id, &mut memo, &mut Vec::new())?;
        resolved.by_ctx.insert(id, ty);
    }

    // Aggregate typedefs by QName for the effective context.
    for index in 0..state.arena.len() {
        let id = CtxId::from_raw(index as u32);
        let ctx = state.arena.get(id);
        if ctx.removed || ctx.kind != StatementKind::Typedef {
            continue;
        }
        let Some(qname) = ctx.qname.clone() else {
            continue;
        };
        let ty = resolve_typedef(state, id, &mut memo, &mut Vec::new())?;
        resolved.typedefs.entry(qname).or_insert(ty);
    }

    debug!(
        types = resolved.by_ctx.len(),
        typedefs = resolved.typedefs.len(),
        "type derivation complete"
    );
    Ok(resolved)
}

fn resolve_typedef(
    state: &BuildState,
    typedef: CtxId,
    memo: &mut FxHashMap<CtxId, ResolvedType>,
    visiting: &mut Vec<CtxId>,
) -> Result<ResolvedType, ReactorError> {
    if let Some(ty) = memo.get(&typedef) {
        return Ok(ty.clone());
    }
    let at = state.arena.get(typedef).at;
    let name = state
        .arena
        .get(typedef)
        .argument
        .clone()
        .unwrap_or_default();
    if visiting.contains(&typedef) {
        return Err(InferenceError::new(
            PHASE,
            at,
            format!("typedef \"{name}\" derives from itself"),
        )
        .into());
    }
    let Some(type_ctx) = state
        .arena
        .first_child_of_kind(typedef, &StatementKind::Type)
    else {
        return Err(InferenceError::new(
            PHASE,
            at,
            format!("typedef \"{name}\" lacks a type statement"),
        )
        .into());
    };

    visiting.push(typedef);
    let mut ty = resolve_type_ctx(state, type_ctx, memo, visiting)?;
    visiting.pop();

    if let Some(qname) = state.arena.get(typedef).qname.clone() {
        ty.chain.insert(0, qname);
    }
    if let Some(default) = state.arena.child_argument(typedef, &StatementKind::Default) {
        ty.default = Some(SmolStr::new(default));
    }
    if let Some(units) = state.arena.child_argument(typedef, &StatementKind::Units) {
        ty.units = Some(SmolStr::new(units));
    }
    memo.insert(typedef, ty.clone());
    Ok(ty)
}

fn resolve_type_ctx(
    state: &BuildState,
    type_ctx: CtxId,
    memo: &mut FxHashMap<CtxId, ResolvedType>,
    visiting: &mut Vec<CtxId>,
) -> Result<ResolvedType, ReactorError> {
    let at = state.arena.get(type_ctx).at;
    let name = state
        .arena
        .get(type_ctx)
        .argument
        .clone()
        .unwrap_or_default();

    let mut ty = match (name.contains(':'), BuiltinType::from_name(&name)) {
        (false, Some(builtin)) => ResolvedType::of_builtin(builtin),
        _ => {
            let Some(typedef) =
                state.resolve_ns_ref(type_ctx, NamespaceKind::Typedef, &name, PHASE)?
            else {
                return Err(InferenceError::new(
                    PHASE,
                    at,
                    format!("type \"{name}\" not found"),
                )
                .into());
            };
            resolve_typedef(state, typedef, memo, visiting)?
        }
    };

    apply_restrictions(state, type_ctx, &mut ty, memo, visiting)?;
    Ok(ty)
}

/// Fold the substatements of one `type` statement into the base type,
/// enforcing that ranges and lengths only ever narrow.
fn apply_restrictions(
    state: &BuildState,
    type_ctx: CtxId,
    ty: &mut ResolvedType,
    memo: &mut FxHashMap<CtxId, ResolvedType>,
    visiting: &mut Vec<CtxId>,
) -> Result<(), ReactorError> {
    let children: Vec<CtxId> = state
        .arena
        .get(type_ctx)
        .children
        .iter()
        .copied()
        .filter(|&c| !state.arena.get(c).removed)
        .collect();
    for child in children {
        let child_ctx = state.arena.get(child);
        let at = child_ctx.at;
        let arg = child_ctx.argument.clone().unwrap_or_default();
        match child_ctx.kind.clone() {
            StatementKind::Range => {
                let base = ty.range.clone().ok_or_else(|| {
                    InferenceError::new(
                        PHASE,
                        at,
                        format!("type \"{}\" does not admit a range", ty.builtin.name()),
                    )
                })?;
                let narrowed = ValueRange::parse(&arg, &base)
                    .map_err(|detail| InferenceError::new(PHASE, at, detail))?;
                if !narrowed.subset_of(&base) {
                    return Err(InferenceError::new(
                        PHASE,
                        at,
                        format!("range \"{arg}\" widens its base type"),
                    )
                    .into());
                }
                ty.range = Some(narrowed);
            }
            StatementKind::Length => {
                let base = ty.length.clone().ok_or_else(|| {
                    InferenceError::new(
                        PHASE,
                        at,
                        format!("type \"{}\" does not admit a length", ty.builtin.name()),
                    )
                })?;
                let narrowed = LengthRange::parse(&arg, &base)
                    .map_err(|detail| InferenceError::new(PHASE, at, detail))?;
                if !narrowed.subset_of(&base) {
                    return Err(InferenceError::new(
                        PHASE,
                        at,
                        format!("length \"{arg}\" widens its base type"),
                    )
                    .into());
                }
                ty.length = Some(narrowed);
            }
            StatementKind::Pattern => {
                ty.patterns.push(SmolStr::new(&arg));
            }
            StatementKind::FractionDigits => {
                let digits = arg.parse::<u8>().ok().filter(|d| (1..=18).contains(d));
                let Some(digits) = digits else {
                    return Err(InferenceError::new(
                        PHASE,
                        at,
                        format!("invalid fraction-digits \"{arg}\""),
                    )
                    .into());
                };
                ty.fraction_digits = Some(digits);
            }
            StatementKind::Enum => {
                ty.enum_names.push(SmolStr::new(&arg));
            }
            StatementKind::Bit => {
                ty.bit_names.push(SmolStr::new(&arg));
            }
            StatementKind::Base => {
                let Some(identity) =
                    state.resolve_ns_ref(child, NamespaceKind::Identity, &arg, PHASE)?
                else {
                    return Err(InferenceError::new(
                        PHASE,
                        at,
                        format!("base identity \"{arg}\" not found"),
                    )
                    .into());
                };
                if let Some(qname) = state.arena.get(identity).qname.clone() {
                    ty.identity_bases.push(qname);
                }
            }
            StatementKind::Path => {
                ty.leafref_path = Some(SmolStr::new(&arg));
            }
            StatementKind::Type => {
                let member = resolve_type_ctx(state, child, memo, visiting)?;
                ty.union_members.push(member);
            }
            _ => {}
        }
    }
    Ok(())
}
