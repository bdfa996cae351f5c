use std::sync::Arc;

use crate::container::tags::{Tag, TagContext};
use crate::reflect::naming::instance_name;
use crate::reflect::Instance;

/// Decodes `inject:"name"` by looking up a registered instance.
///
/// An empty literal uses the field's own name.
#[derive(Debug, Clone, Copy, Default)]
pub struct InjectTag;

impl Tag for InjectTag {
    fn decode(&self, ctx: &TagContext<'_>, literal: &str) -> Option<Instance> {
        let name = literal.split(',').next().unwrap_or_default().trim();
        let name = if name.is_empty() {
            instance_name(ctx.field.name)
        } else {
            name.to_string()
        };

        let instance = ctx.instances.get(&name).map(Arc::clone);
        if instance.is_none() {
            tracing::trace!("No instance named '{}' for field '{}'", name, ctx.field.name);
        }
        instance
    }
}
