//! Tag-to-constructor registry used when decoding tagged variants.
//!
//! Variants are declared explicitly: each [`Constructor`] names its family,
//! its tag and the ordered list of fields it carries. The process-wide
//! registry is installed once with [`install`] before any decode happens and
//! is read-only afterwards; [`global`] falls back to the standard families.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use tppl_core::{is_reserved_key, ErrorInfo, Fields, Tagged, TpplError, Value};
use tracing::{debug, info};

use crate::tree::Tree;

/// Builds a host value for a declared variant from decoded fields.
pub type BuildFn = fn(&VariantDecl, Fields) -> Result<Value, TpplError>;

/// Tag and ordered field names of one variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantDecl {
    tag: String,
    fields: Vec<String>,
}

impl VariantDecl {
    /// Declares a variant. Names are validated when the variant is registered.
    pub fn new<I, S>(tag: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tag: tag.into(),
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    /// Tag of the variant.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Declared field names in wire order.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    fn validate(&self) -> Result<(), TpplError> {
        for (idx, name) in self.fields.iter().enumerate() {
            if is_reserved_key(name) {
                return Err(TpplError::InvalidField(
                    ErrorInfo::new("reserved-field", "declared field collides with a reserved wire key")
                        .with_context("tag", self.tag.clone())
                        .with_context("field", name.clone()),
                ));
            }
            if self.fields[..idx].contains(name) {
                return Err(TpplError::InvalidField(
                    ErrorInfo::new("duplicate-field", "field declared twice")
                        .with_context("tag", self.tag.clone())
                        .with_context("field", name.clone()),
                ));
            }
        }
        Ok(())
    }
}

/// Registered constructor for one tag.
#[derive(Debug, Clone)]
pub struct Constructor {
    family: String,
    decl: VariantDecl,
    build: BuildFn,
}

impl Constructor {
    /// Constructor that only checks field names and orders them as declared.
    pub fn declared(family: impl Into<String>, decl: VariantDecl) -> Self {
        Self::with_build(family, decl, build_declared)
    }

    /// Constructor with a family-specific build function.
    pub fn with_build(family: impl Into<String>, decl: VariantDecl, build: BuildFn) -> Self {
        Self {
            family: family.into(),
            decl,
            build,
        }
    }

    /// Family the variant belongs to (e.g. `Tree`).
    pub fn family(&self) -> &str {
        &self.family
    }

    /// Tag handled by this constructor.
    pub fn tag(&self) -> &str {
        self.decl.tag()
    }

    /// Variant declaration.
    pub fn decl(&self) -> &VariantDecl {
        &self.decl
    }

    /// Builds a value from decoded fields.
    pub fn construct(&self, fields: Fields) -> Result<Value, TpplError> {
        (self.build)(&self.decl, fields)
    }

    fn same_constructor(&self, other: &Constructor) -> bool {
        self.family == other.family
            && self.decl == other.decl
            && self.build as usize == other.build as usize
    }
}

/// Checks `fields` against `decl` and returns a tagged value in declared order.
pub fn build_declared(decl: &VariantDecl, mut fields: Fields) -> Result<Value, TpplError> {
    if let Some(name) = fields.keys().find(|name| !decl.fields.contains(*name)) {
        return Err(TpplError::InvalidField(
            ErrorInfo::new("unexpected-field", "field is not declared by the variant")
                .with_context("tag", decl.tag.clone())
                .with_context("field", name.clone()),
        ));
    }
    let mut ordered = Fields::with_capacity(decl.fields.len());
    for name in &decl.fields {
        let value = fields.swap_remove(name).ok_or_else(|| {
            TpplError::InvalidField(
                ErrorInfo::new("missing-field", "declared field is absent")
                    .with_context("tag", decl.tag.clone())
                    .with_context("field", name.clone()),
            )
        })?;
        ordered.insert(name.clone(), value);
    }
    Tagged::new(decl.tag.clone(), ordered).map(Value::Tagged)
}

/// A closed set of tagged variants registered together.
pub trait TaggedFamily {
    /// Family name used in diagnostics and duplicate detection.
    const FAMILY: &'static str;

    /// Constructors for every variant of the family.
    fn constructors() -> Vec<Constructor>;
}

/// Mapping from tag name to constructor.
#[derive(Debug, Clone, Default)]
pub struct VariantRegistry {
    constructors: BTreeMap<String, Constructor>,
}

impl VariantRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the standard families (`Tree`).
    pub fn standard() -> Self {
        let mut registry = Self::new();
        for constructor in Tree::constructors() {
            registry
                .constructors
                .insert(constructor.tag().to_string(), constructor);
        }
        registry
    }

    /// Associates a tag with a constructor.
    ///
    /// Registering the same constructor twice is a no-op. Any difference in
    /// family, declaration or build function for an existing tag fails with
    /// [`TpplError::DuplicateTag`].
    pub fn register(&mut self, constructor: Constructor) -> Result<(), TpplError> {
        constructor.decl.validate()?;
        if let Some(existing) = self.constructors.get(constructor.tag()) {
            if existing.same_constructor(&constructor) {
                debug!(tag = constructor.tag(), "variant already registered");
                return Ok(());
            }
            return Err(TpplError::DuplicateTag(
                ErrorInfo::new("duplicate-tag", "tag already registered by another variant")
                    .with_context("tag", constructor.tag().to_string())
                    .with_context("existing_family", existing.family.clone())
                    .with_context("family", constructor.family.clone()),
            ));
        }
        debug!(
            tag = constructor.tag(),
            family = constructor.family(),
            "registered variant"
        );
        self.constructors
            .insert(constructor.tag().to_string(), constructor);
        Ok(())
    }

    /// Registers every variant of a family.
    pub fn register_family<F: TaggedFamily>(&mut self) -> Result<(), TpplError> {
        for constructor in F::constructors() {
            self.register(constructor)?;
        }
        Ok(())
    }

    /// Builds a value for `tag` from decoded fields.
    pub fn construct(&self, tag: &str, fields: Fields) -> Result<Value, TpplError> {
        self.lookup(tag)?.construct(fields)
    }

    /// Returns the constructor for `tag` or [`TpplError::UnknownTag`].
    pub fn lookup(&self, tag: &str) -> Result<&Constructor, TpplError> {
        self.constructors.get(tag).ok_or_else(|| {
            TpplError::UnknownTag(
                ErrorInfo::new("unknown-tag", "no constructor registered for tag")
                    .with_context("tag", tag.to_string())
                    .with_hint("register the variant before decoding runtime output"),
            )
        })
    }

    /// Returns true when `tag` is registered.
    pub fn contains(&self, tag: &str) -> bool {
        self.constructors.contains_key(tag)
    }

    /// Registered tags in sorted order.
    pub fn tags(&self) -> impl Iterator<Item = &str> + '_ {
        self.constructors.keys().map(String::as_str)
    }

    /// Number of registered tags.
    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    /// Returns true when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }
}

static GLOBAL: OnceLock<VariantRegistry> = OnceLock::new();

/// Installs the process-wide registry. Must run before the first decode.
pub fn install(registry: VariantRegistry) -> Result<&'static VariantRegistry, TpplError> {
    let tags = registry.len();
    GLOBAL.set(registry).map_err(|_| {
        TpplError::Config(
            ErrorInfo::new("registry-installed", "process-wide registry is already installed")
                .with_hint("install the registry once at startup"),
        )
    })?;
    info!(tags, "installed variant registry");
    Ok(global())
}

/// Process-wide registry; the standard families unless [`install`] ran first.
pub fn global() -> &'static VariantRegistry {
    GLOBAL.get_or_init(VariantRegistry::standard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_families_register_cleanly() {
        let mut checked = VariantRegistry::new();
        checked.register_family::<Tree>().unwrap();
        let standard = VariantRegistry::standard();
        assert_eq!(
            checked.tags().collect::<Vec<_>>(),
            standard.tags().collect::<Vec<_>>()
        );
    }

    #[test]
    fn declared_build_orders_fields() {
        let decl = VariantDecl::new("Pair", ["first", "second"]);
        let mut fields = Fields::new();
        fields.insert("second".into(), Value::Int(2));
        fields.insert("first".into(), Value::Int(1));
        let value = build_declared(&decl, fields).unwrap();
        let tagged = value.as_tagged().unwrap();
        let names: Vec<_> = tagged.fields().keys().cloned().collect();
        assert_eq!(names, vec!["first", "second"]);
    }
}
