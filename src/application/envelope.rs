//! Classification of exposed objects and construction of response envelopes.

use std::fmt;
use std::sync::Arc;

use axum::http::StatusCode;
use satchel_api_types::{Envelope, Pagination};
use serde_json::{Map, Value};

use crate::domain::error::ExposeError;
use crate::domain::exposed::{Exposed, Serializer};

/// Envelope shape of an exposed object, decided once per response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    Resource,
    Collection,
    Paginated,
}

impl Shape {
    pub fn as_str(self) -> &'static str {
        match self {
            Shape::Resource => "resource",
            Shape::Collection => "collection",
            Shape::Paginated => "paginated",
        }
    }

    pub fn is_singular(self) -> bool {
        matches!(self, Shape::Resource)
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pagination metadata wins over plain enumerability; everything else is a
/// single resource.
pub fn classify(object: &dyn Exposed) -> Shape {
    if object.as_paginated().is_some() {
        Shape::Paginated
    } else if object.as_enumerable().is_some() {
        Shape::Collection
    } else {
        Shape::Resource
    }
}

/// Extension points around envelope construction. Both run exactly once per
/// response, `pre_process` first.
pub trait ExposureHooks: Send + Sync {
    fn pre_process(&self, _object: &dyn Exposed, _shape: Shape, _singular: bool) {}

    fn post_process(&self, _object: &dyn Exposed, _shape: Shape, _singular: bool) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHooks;

impl ExposureHooks for NoopHooks {}

/// Per-response options supplied by the handler.
#[derive(Clone)]
pub struct ExposeOptions {
    pub status: StatusCode,
    pub content_type: Option<String>,
    /// Serializer for a singular object. Also used per item when
    /// `each_serializer` is absent.
    pub serializer: Option<Arc<dyn Serializer>>,
    pub each_serializer: Option<Arc<dyn Serializer>>,
    pub metadata: Map<String, Value>,
}

impl Default for ExposeOptions {
    fn default() -> Self {
        Self {
            status: StatusCode::OK,
            content_type: None,
            serializer: None,
            each_serializer: None,
            metadata: Map::new(),
        }
    }
}

impl fmt::Debug for ExposeOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExposeOptions")
            .field("status", &self.status)
            .field("content_type", &self.content_type)
            .field("serializer", &self.serializer.is_some())
            .field("each_serializer", &self.each_serializer.is_some())
            .field("metadata", &self.metadata)
            .finish()
    }
}

impl ExposeOptions {
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_serializer(mut self, serializer: Arc<dyn Serializer>) -> Self {
        self.serializer = Some(serializer);
        self
    }

    pub fn with_each_serializer(mut self, serializer: Arc<dyn Serializer>) -> Self {
        self.each_serializer = Some(serializer);
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

// ============================================================================
// Conversion chain
// ============================================================================

/// Inputs shared by every converter for one item.
struct Conversion<'a> {
    explicit: Option<&'a dyn Serializer>,
    serializers_enabled: bool,
}

type Converter = fn(&dyn Exposed, &Conversion<'_>) -> Option<Result<Value, ExposeError>>;

/// Tried in order; the first converter that applies is the only one run.
const CONVERTERS: [(&str, Converter); 4] = [
    ("explicit_serializer", explicit_serializer),
    ("native_serializer", native_serializer),
    ("hash_conversion", hash_conversion),
    ("json_conversion", json_conversion),
];

fn explicit_serializer(
    object: &dyn Exposed,
    conversion: &Conversion<'_>,
) -> Option<Result<Value, ExposeError>> {
    conversion
        .explicit
        .map(|serializer| serializer.serialize(object))
}

fn native_serializer(
    object: &dyn Exposed,
    conversion: &Conversion<'_>,
) -> Option<Result<Value, ExposeError>> {
    if !conversion.serializers_enabled {
        return None;
    }
    object
        .as_native_serializer()
        .map(|native| native.native_serializer().serialize(object))
}

fn hash_conversion(
    object: &dyn Exposed,
    _conversion: &Conversion<'_>,
) -> Option<Result<Value, ExposeError>> {
    object
        .as_hash_conversion()
        .map(|hash| Ok(Value::Object(hash.to_hash())))
}

fn json_conversion(
    object: &dyn Exposed,
    _conversion: &Conversion<'_>,
) -> Option<Result<Value, ExposeError>> {
    object.as_json_conversion().map(|json| json.to_json())
}

fn convert(object: &dyn Exposed, conversion: &Conversion<'_>) -> Result<Value, ExposeError> {
    for (name, converter) in CONVERTERS {
        if let Some(result) = converter(object, conversion) {
            tracing::trace!(
                converter = name,
                type_name = object.type_name(),
                "converted object"
            );
            return result;
        }
    }
    Err(ExposeError::unclassifiable(object.type_name()))
}

// ============================================================================
// Builder
// ============================================================================

/// Builds envelopes for one controller.
#[derive(Clone)]
pub struct EnvelopeBuilder {
    hooks: Arc<dyn ExposureHooks>,
    serializers_enabled: bool,
}

impl Default for EnvelopeBuilder {
    fn default() -> Self {
        Self::new(Arc::new(NoopHooks), true)
    }
}

impl EnvelopeBuilder {
    pub fn new(hooks: Arc<dyn ExposureHooks>, serializers_enabled: bool) -> Self {
        Self {
            hooks,
            serializers_enabled,
        }
    }

    /// Classify `object`, run hooks around conversion and build its envelope.
    pub fn expose(
        &self,
        object: &dyn Exposed,
        options: &ExposeOptions,
    ) -> Result<(Shape, Envelope), ExposeError> {
        let shape = classify(object);
        let singular = shape.is_singular();

        self.hooks.pre_process(object, shape, singular);
        let envelope = self.build(object, shape, options)?;
        self.hooks.post_process(object, shape, singular);

        Ok((shape, envelope))
    }

    /// Build the envelope for an already-classified object.
    pub fn build(
        &self,
        object: &dyn Exposed,
        shape: Shape,
        options: &ExposeOptions,
    ) -> Result<Envelope, ExposeError> {
        let mut envelope = match shape {
            Shape::Resource => {
                let conversion = Conversion {
                    explicit: options.serializer.as_deref(),
                    serializers_enabled: self.serializers_enabled,
                };
                Envelope::new(convert(object, &conversion)?)
            }
            Shape::Collection | Shape::Paginated => {
                let items = object
                    .as_enumerable()
                    .ok_or_else(|| ExposeError::unclassifiable(object.type_name()))?
                    .items();
                let conversion = Conversion {
                    explicit: options
                        .each_serializer
                        .as_deref()
                        .or(options.serializer.as_deref()),
                    serializers_enabled: self.serializers_enabled,
                };
                let converted = items
                    .iter()
                    .map(|item| convert(*item, &conversion))
                    .collect::<Result<Vec<_>, _>>()?;

                let mut envelope = Envelope::new(Value::Array(converted));
                envelope.count = Some(items.len() as u64);
                if shape == Shape::Paginated {
                    envelope.pagination = Some(pagination_for(object)?);
                }
                envelope
            }
        };

        envelope.merge_metadata(&options.metadata);
        Ok(envelope)
    }
}

fn pagination_for(object: &dyn Exposed) -> Result<Pagination, ExposeError> {
    let page = object
        .as_paginated()
        .ok_or_else(|| ExposeError::unclassifiable(object.type_name()))?;
    Ok(Pagination::from_page(
        page.current_page(),
        page.per_page(),
        page.total_entries(),
    ))
}
