//! Phylogenetic tree family (`Node` / `Leaf`) and phyjson construction.

use std::fs;
use std::path::Path;

use serde_json::Value as Json;
use tppl_core::{ErrorInfo, Fields, Tagged, TpplError, Value};

use crate::codec::{parse_document, DEFAULT_PREVIEW_BYTES};
use crate::registry::{build_declared, Constructor, TaggedFamily, VariantDecl};

/// Tag of internal tree nodes.
pub const NODE_TAG: &str = "Node";
/// Tag of tree leaves.
pub const LEAF_TAG: &str = "Leaf";

/// Rooted binary tree with node ages.
#[derive(Debug, Clone, PartialEq)]
pub enum Tree {
    /// Internal node with two children.
    Node {
        /// Left subtree.
        left: Box<Tree>,
        /// Right subtree.
        right: Box<Tree>,
        /// Age of the node.
        age: f64,
    },
    /// Leaf.
    Leaf {
        /// Age of the leaf.
        age: f64,
    },
}

impl Tree {
    /// Internal node.
    pub fn node(left: Tree, right: Tree, age: f64) -> Self {
        Tree::Node {
            left: Box::new(left),
            right: Box::new(right),
            age,
        }
    }

    /// Leaf.
    pub fn leaf(age: f64) -> Self {
        Tree::Leaf { age }
    }

    /// Age of the root of this subtree.
    pub fn age(&self) -> f64 {
        match self {
            Tree::Node { age, .. } | Tree::Leaf { age } => *age,
        }
    }

    /// Returns true for leaves.
    pub fn is_leaf(&self) -> bool {
        matches!(self, Tree::Leaf { .. })
    }

    /// Number of leaves in the subtree.
    pub fn leaf_count(&self) -> usize {
        match self {
            Tree::Leaf { .. } => 1,
            Tree::Node { left, right, .. } => left.leaf_count() + right.leaf_count(),
        }
    }

    /// Converts the tree into its tagged value form.
    pub fn to_value(&self) -> Result<Value, TpplError> {
        let tagged = match self {
            Tree::Leaf { age } => Tagged::from_pairs(LEAF_TAG, [("age", Value::Real(*age))])?,
            Tree::Node { left, right, age } => Tagged::from_pairs(
                NODE_TAG,
                [
                    ("left", left.to_value()?),
                    ("right", right.to_value()?),
                    ("age", Value::Real(*age)),
                ],
            )?,
        };
        Ok(Value::Tagged(tagged))
    }

    /// Rebuilds a tree from its tagged value form.
    pub fn from_value(value: &Value) -> Result<Self, TpplError> {
        let tagged = expect_tree_tag(value, "tree")?;
        let age = real_field(tagged, "age")?;
        match tagged.tag() {
            LEAF_TAG => Ok(Tree::leaf(age)),
            _ => {
                let left = Tree::from_value(child_field(tagged, "left")?)?;
                let right = Tree::from_value(child_field(tagged, "right")?)?;
                Ok(Tree::node(left, right, age))
            }
        }
    }

    /// Builds a tree from a phyjson document (`trees[0].root`).
    pub fn from_phyjson(document: &Json) -> Result<Self, TpplError> {
        let root = document
            .get("trees")
            .and_then(|trees| trees.get(0))
            .and_then(|tree| tree.get("root"))
            .ok_or_else(|| {
                TpplError::InvalidField(ErrorInfo::new(
                    "phyjson-root",
                    "phyjson document has no trees[0].root",
                ))
            })?;
        let root_age = phyjson_age(root)?;
        phyjson_convert(root, root_age)
    }

    /// Reads and converts a phyjson file.
    pub fn load_phyjson(path: &Path) -> Result<Self, TpplError> {
        let bytes = fs::read(path).map_err(|err| {
            TpplError::Config(
                ErrorInfo::new("phyjson-read", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })?;
        Tree::from_phyjson(&parse_document(&bytes, DEFAULT_PREVIEW_BYTES)?)
    }
}

impl TaggedFamily for Tree {
    const FAMILY: &'static str = "Tree";

    fn constructors() -> Vec<Constructor> {
        vec![
            Constructor::with_build(
                Self::FAMILY,
                VariantDecl::new(NODE_TAG, ["left", "right", "age"]),
                build_tree,
            ),
            Constructor::with_build(Self::FAMILY, VariantDecl::new(LEAF_TAG, ["age"]), build_tree),
        ]
    }
}

impl TryFrom<&Tree> for Value {
    type Error = TpplError;

    fn try_from(tree: &Tree) -> Result<Self, Self::Error> {
        tree.to_value()
    }
}

impl TryFrom<&Value> for Tree {
    type Error = TpplError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        Tree::from_value(value)
    }
}

// Children arrive already built by their own constructors, so only this
// level is checked. Ages keep their wire number kind.
fn build_tree(decl: &VariantDecl, fields: Fields) -> Result<Value, TpplError> {
    let value = build_declared(decl, fields)?;
    if let Value::Tagged(tagged) = &value {
        real_field(tagged, "age")?;
        if tagged.tag() == NODE_TAG {
            expect_tree_tag(child_field(tagged, "left")?, "left")?;
            expect_tree_tag(child_field(tagged, "right")?, "right")?;
        }
    }
    Ok(value)
}

fn expect_tree_tag<'v>(value: &'v Value, field: &str) -> Result<&'v Tagged, TpplError> {
    match value.as_tagged() {
        Some(tagged) if tagged.tag() == NODE_TAG || tagged.tag() == LEAF_TAG => Ok(tagged),
        _ => Err(TpplError::InvalidField(
            ErrorInfo::new("tree-child", "expected a Node or Leaf value")
                .with_context("field", field.to_string())
                .with_context("found", value.kind_name()),
        )),
    }
}

fn child_field<'v>(tagged: &'v Tagged, name: &str) -> Result<&'v Value, TpplError> {
    tagged.field(name).ok_or_else(|| {
        TpplError::InvalidField(
            ErrorInfo::new("missing-field", "declared field is absent")
                .with_context("tag", tagged.tag().to_string())
                .with_context("field", name.to_string()),
        )
    })
}

fn real_field(tagged: &Tagged, name: &str) -> Result<f64, TpplError> {
    let value = child_field(tagged, name)?;
    value.as_real().ok_or_else(|| {
        TpplError::InvalidField(
            ErrorInfo::new("field-type", "expected a numeric field")
                .with_context("tag", tagged.tag().to_string())
                .with_context("field", name.to_string())
                .with_context("found", value.kind_name()),
        )
    })
}

fn phyjson_children(node: &Json) -> Result<Option<(&Json, &Json)>, TpplError> {
    match node.get("children").and_then(Json::as_array) {
        None => Ok(None),
        Some(children) if children.is_empty() => Ok(None),
        Some(children) if children.len() == 2 => Ok(Some((&children[0], &children[1]))),
        Some(children) => Err(TpplError::InvalidField(
            ErrorInfo::new("phyjson-not-bifurcating", "tree nodes must have two children")
                .with_context("children", children.len().to_string()),
        )),
    }
}

fn branch_length(node: &Json) -> Option<f64> {
    node.get("branch_length").and_then(Json::as_f64)
}

fn phyjson_age(node: &Json) -> Result<f64, TpplError> {
    match phyjson_children(node)? {
        Some((left, right)) => {
            let own = branch_length(node).unwrap_or(0.0).max(0.0);
            Ok(own + phyjson_age(left)?.max(phyjson_age(right)?))
        }
        None => branch_length(node).ok_or_else(|| {
            TpplError::InvalidField(ErrorInfo::new(
                "phyjson-branch-length",
                "leaf has no numeric branch_length",
            ))
        }),
    }
}

fn phyjson_convert(node: &Json, parent_age: f64) -> Result<Tree, TpplError> {
    let age = parent_age - branch_length(node).unwrap_or(0.0).max(0.0);
    match phyjson_children(node)? {
        Some((left, right)) => Ok(Tree::node(
            phyjson_convert(left, age)?,
            phyjson_convert(right, age)?,
            age,
        )),
        None => Ok(Tree::leaf(age)),
    }
}
