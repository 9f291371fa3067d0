#![deny(missing_docs)]
#![doc = "Core value model, error surface and seeding policy for the TreePPL host bridge."]

pub mod errors;
pub mod rng;
pub mod value;

pub use errors::{byte_preview, ErrorInfo, ErrorKind, TpplError};
pub use rng::{derive_substream_seed, RngHandle};
pub use value::{
    is_reserved_key, Fields, List, Matrix, Tagged, Value, CONSTRUCTOR_KEY, DATA_KEY, RESERVED_KEYS,
    SHAPE_KEY,
};
