#![deny(missing_docs)]
#![doc = "Variant registry and JSON wire codec for values exchanged with the TreePPL runtime."]

pub mod codec;
mod digest;
pub mod registry;
pub mod tree;

pub use codec::{
    decode, encode, encode_arguments, parse_document, to_bytes, Arguments, Decoder,
    DEFAULT_PREVIEW_BYTES,
};
pub use digest::input_digest;
pub use registry::{
    build_declared, global, install, BuildFn, Constructor, TaggedFamily, VariantDecl,
    VariantRegistry,
};
pub use tree::{Tree, LEAF_TAG, NODE_TAG};
