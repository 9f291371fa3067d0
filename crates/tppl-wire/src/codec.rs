//! JSON wire codec between [`Value`] and the runtime's document format.
//!
//! Encoding:
//! - scalars map to JSON scalars, [`Value::Unit`] to `null`;
//! - vectors and lists map to JSON arrays;
//! - matrices map to `{"__data__": [...row-major...], "__shape__": [rows, cols]}`;
//! - tagged values map to `{"__constructor__": tag, field: value, ...}`;
//! - plain mappings map to plain JSON objects.
//!
//! Decoding inverts these rules and rebuilds tagged values through a
//! [`VariantRegistry`]. An unregistered tag is an error, never a fallback.

use indexmap::IndexMap;
use serde_json::{Map, Number, Value as Json};
use tppl_core::{
    byte_preview, is_reserved_key, ErrorInfo, Fields, Matrix, Tagged, TpplError, Value,
    CONSTRUCTOR_KEY, DATA_KEY, SHAPE_KEY,
};
use tracing::warn;

use crate::registry::{self, VariantRegistry};

/// Keyword arguments of one model call, in call order.
pub type Arguments = IndexMap<String, Value>;

/// Default number of raw bytes kept in malformed-output diagnostics.
pub const DEFAULT_PREVIEW_BYTES: usize = 256;

/// Encodes a value into its wire representation.
pub fn encode(value: &Value) -> Result<Json, TpplError> {
    match value {
        Value::Unit => Ok(Json::Null),
        Value::Bool(flag) => Ok(Json::Bool(*flag)),
        Value::Int(int) => Ok(Json::Number(Number::from(*int))),
        Value::Real(real) => encode_real(*real),
        Value::Str(text) => Ok(Json::String(text.clone())),
        Value::Vector(items) => encode_reals(items),
        Value::Matrix(matrix) => encode_matrix(matrix),
        Value::List(list) => list
            .items()
            .iter()
            .map(encode)
            .collect::<Result<Vec<_>, _>>()
            .map(Json::Array),
        Value::Map(fields) => encode_fields(fields, Map::with_capacity(fields.len())),
        Value::Tagged(tagged) => encode_tagged(tagged),
    }
}

/// Encodes the keyword arguments of a call as the input document.
pub fn encode_arguments(args: &Arguments) -> Result<Json, TpplError> {
    encode_fields(args, Map::with_capacity(args.len()))
}

/// Serializes a wire document to compact bytes.
pub fn to_bytes(document: &Json) -> Result<Vec<u8>, TpplError> {
    serde_json::to_vec(document)
        .map_err(|err| TpplError::InvalidField(ErrorInfo::new("json-serialize", err.to_string())))
}

/// Parses raw runtime output, keeping a truncated preview on failure.
pub fn parse_document(bytes: &[u8], preview_bytes: usize) -> Result<Json, TpplError> {
    serde_json::from_slice(bytes).map_err(|err| {
        warn!(len = bytes.len(), error = %err, "runtime output is not valid JSON");
        TpplError::MalformedOutput(
            ErrorInfo::new("json-parse", err.to_string())
                .with_context("len", bytes.len().to_string())
                .with_context("line", err.line().to_string())
                .with_context("column", err.column().to_string())
                .with_context("preview", byte_preview(bytes, preview_bytes))
                .with_hint("the runtime may have crashed or mixed diagnostics into stdout"),
        )
    })
}

fn encode_real(real: f64) -> Result<Json, TpplError> {
    Number::from_f64(real).map(Json::Number).ok_or_else(|| {
        TpplError::InvalidField(
            ErrorInfo::new("non-finite-real", "JSON cannot carry non-finite reals")
                .with_context("value", real.to_string()),
        )
    })
}

fn encode_reals(items: &[f64]) -> Result<Json, TpplError> {
    items
        .iter()
        .map(|real| encode_real(*real))
        .collect::<Result<Vec<_>, _>>()
        .map(Json::Array)
}

fn encode_matrix(matrix: &Matrix) -> Result<Json, TpplError> {
    let mut object = Map::with_capacity(2);
    object.insert(DATA_KEY.to_string(), encode_reals(matrix.data())?);
    object.insert(
        SHAPE_KEY.to_string(),
        Json::Array(vec![
            Json::Number(Number::from(matrix.rows() as u64)),
            Json::Number(Number::from(matrix.cols() as u64)),
        ]),
    );
    Ok(Json::Object(object))
}

fn encode_tagged(tagged: &Tagged) -> Result<Json, TpplError> {
    let mut object = Map::with_capacity(tagged.fields().len() + 1);
    object.insert(
        CONSTRUCTOR_KEY.to_string(),
        Json::String(tagged.tag().to_string()),
    );
    encode_fields(tagged.fields(), object)
}

fn encode_fields(fields: &Fields, mut object: Map<String, Json>) -> Result<Json, TpplError> {
    for (name, value) in fields {
        if is_reserved_key(name) {
            return Err(TpplError::InvalidField(
                ErrorInfo::new("reserved-key", "mapping key collides with a reserved wire key")
                    .with_context("key", name.clone()),
            ));
        }
        object.insert(name.clone(), encode(value)?);
    }
    Ok(Json::Object(object))
}

/// Decodes wire documents against a registry.
#[derive(Debug, Clone, Copy)]
pub struct Decoder<'r> {
    registry: &'r VariantRegistry,
}

impl<'r> Decoder<'r> {
    /// Decoder bound to `registry`.
    pub fn new(registry: &'r VariantRegistry) -> Self {
        Self { registry }
    }

    /// Registry used to rebuild tagged values.
    pub fn registry(&self) -> &'r VariantRegistry {
        self.registry
    }

    /// Decodes one wire value.
    pub fn decode(&self, json: &Json) -> Result<Value, TpplError> {
        match json {
            Json::Null => Ok(Value::Unit),
            Json::Bool(flag) => Ok(Value::Bool(*flag)),
            Json::Number(number) => decode_number(number),
            Json::String(text) => Ok(Value::Str(text.clone())),
            Json::Array(items) => {
                if items.iter().all(Json::is_number) {
                    items
                        .iter()
                        .map(|item| item_as_f64(item, "array"))
                        .collect::<Result<Vec<_>, _>>()
                        .map(Value::Vector)
                } else {
                    items
                        .iter()
                        .map(|item| self.decode(item))
                        .collect::<Result<Vec<_>, _>>()
                        .map(Value::list)
                }
            }
            Json::Object(object) => {
                if object.contains_key(CONSTRUCTOR_KEY) {
                    self.decode_tagged(object)
                } else if object.contains_key(DATA_KEY) || object.contains_key(SHAPE_KEY) {
                    decode_matrix(object).map(Value::Matrix)
                } else {
                    self.decode_fields(object.iter()).map(Value::Map)
                }
            }
        }
    }

    /// Parses and decodes a complete document.
    pub fn decode_slice(&self, bytes: &[u8], preview_bytes: usize) -> Result<Value, TpplError> {
        self.decode(&parse_document(bytes, preview_bytes)?)
    }

    fn decode_tagged(&self, object: &Map<String, Json>) -> Result<Value, TpplError> {
        let tag = match object.get(CONSTRUCTOR_KEY) {
            Some(Json::String(tag)) => tag,
            other => {
                return Err(TpplError::MalformedOutput(
                    ErrorInfo::new("tag-not-string", "variant discriminant must be a string")
                        .with_context("found", format!("{other:?}")),
                ))
            }
        };
        let constructor = self.registry.lookup(tag)?;
        let fields =
            self.decode_fields(object.iter().filter(|(name, _)| name.as_str() != CONSTRUCTOR_KEY))?;
        constructor.construct(fields)
    }

    fn decode_fields<'a, I>(&self, entries: I) -> Result<Fields, TpplError>
    where
        I: Iterator<Item = (&'a String, &'a Json)>,
    {
        let mut fields = Fields::new();
        for (name, json) in entries {
            fields.insert(name.clone(), self.decode(json)?);
        }
        Ok(fields)
    }
}

/// Decodes one wire value against the process-wide registry.
pub fn decode(json: &Json) -> Result<Value, TpplError> {
    Decoder::new(registry::global()).decode(json)
}

fn decode_number(number: &Number) -> Result<Value, TpplError> {
    if let Some(int) = number.as_i64() {
        return Ok(Value::Int(int));
    }
    number.as_f64().map(Value::Real).ok_or_else(|| {
        TpplError::MalformedOutput(
            ErrorInfo::new("number-unrepresentable", "number does not fit a real")
                .with_context("number", number.to_string()),
        )
    })
}

fn item_as_f64(item: &Json, location: &str) -> Result<f64, TpplError> {
    item.as_f64().ok_or_else(|| {
        TpplError::Shape(
            ErrorInfo::new("non-numeric-element", "expected a numeric element")
                .with_context("location", location.to_string())
                .with_context("found", item.to_string()),
        )
    })
}

fn decode_matrix(object: &Map<String, Json>) -> Result<Matrix, TpplError> {
    if object.len() != 2 {
        return Err(TpplError::Shape(
            ErrorInfo::new(
                "matrix-keys",
                "matrix payload must carry exactly the data and shape keys",
            )
            .with_context("keys", object.keys().cloned().collect::<Vec<_>>().join(",")),
        ));
    }
    let shape = match object.get(SHAPE_KEY) {
        Some(Json::Array(dims)) if dims.len() == 2 => dims
            .iter()
            .map(|dim| dim.as_u64().and_then(|dim| usize::try_from(dim).ok()))
            .collect::<Option<Vec<_>>>(),
        _ => None,
    };
    let Some(shape) = shape else {
        return Err(TpplError::Shape(
            ErrorInfo::new("matrix-shape-invalid", "matrix shape must be [rows, cols]")
                .with_context("shape", format!("{:?}", object.get(SHAPE_KEY))),
        ));
    };
    let data = match object.get(DATA_KEY) {
        Some(Json::Array(items)) => items
            .iter()
            .map(|item| item_as_f64(item, DATA_KEY))
            .collect::<Result<Vec<_>, _>>()?,
        other => {
            return Err(TpplError::Shape(
                ErrorInfo::new("matrix-data-invalid", "matrix data must be a numeric array")
                    .with_context("data", format!("{other:?}")),
            ))
        }
    };
    Matrix::new(shape[0], shape[1], data)
}
