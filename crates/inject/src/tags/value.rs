use std::sync::Arc;

use crate::config::Properties;
use crate::container::tags::{Tag, TagContext};
use crate::reflect::{Instance, TypeKind};

/// Decodes `value:"..."` literals into scalar fields
#[derive(Debug, Clone, Default)]
pub struct ValueTag {
    properties: Properties,
}

impl ValueTag {
    pub fn new(properties: Properties) -> Self {
        Self { properties }
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }
}

impl Tag for ValueTag {
    fn decode(&self, ctx: &TagContext<'_>, literal: &str) -> Option<Instance> {
        if ctx.field.indirect || ctx.field.type_info().kind != TypeKind::Scalar {
            return None;
        }
        Some(Arc::new(self.properties.resolve(literal)))
    }
}
