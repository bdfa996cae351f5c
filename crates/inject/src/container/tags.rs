//! Tag decoders
//!
//! A tag decoder turns the literal attached to a struct tag key into an
//! injectable instance. Decoders are registered under a name derived from
//! their type (`ValueTag` handles the `value` key), so new tag kinds can be
//! plugged into field injection without touching the injector.

use std::fmt;

use crate::container::registry::InstanceRegistry;
use crate::errors::InjectError;
use crate::reflect::naming::object_name;
use crate::reflect::{FieldInfo, Instance, Reflect};

/// Conventional suffix stripped from decoder type names
pub const TAG_SUFFIX: &str = "Tag";

/// What a decoder can see while decoding one field
pub struct TagContext<'a> {
    /// Object that declares the field
    pub object: &'a dyn Reflect,
    /// Field carrying the tag
    pub field: &'a FieldInfo,
    /// Instances registered so far
    pub instances: &'a InstanceRegistry,
}

/// Decoder for one struct tag key
pub trait Tag: Send + Sync + 'static {
    /// Produce a value for the field, or `None` when the tag does not apply
    fn decode(&self, ctx: &TagContext<'_>, literal: &str) -> Option<Instance>;

    /// Whether decoded values are cached in the instance registry
    fn is_singleton(&self) -> bool {
        false
    }

    /// Registration name, derived from the decoder's type name
    fn name(&self) -> String {
        object_name(std::any::type_name::<Self>(), TAG_SUFFIX)
    }
}

/// Registry of tag decoders, iterated in registration order
#[derive(Default)]
pub struct TagRegistry {
    tags: Vec<(String, Box<dyn Tag>)>,
}

impl TagRegistry {
    /// Create an empty tag registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a decoder under its derived name
    pub fn add_tag<T: Tag>(&mut self, tag: T) -> Result<(), InjectError> {
        let name = tag.name();
        self.register(&name, Some(Box::new(tag)))
    }

    /// Register a decoder under an explicit name.
    ///
    /// The name is validated first. A missing decoder then passes the guard
    /// without being stored, and a failed registration stores nothing.
    pub fn register(&mut self, name: &str, tag: Option<Box<dyn Tag>>) -> Result<(), InjectError> {
        if name.is_empty() {
            return Err(InjectError::InvalidTagName);
        }
        if self.contains(name) {
            return Err(InjectError::TagAlreadyExists {
                name: name.to_string(),
            });
        }
        let Some(tag) = tag else {
            let error = InjectError::TagIsNil {
                name: name.to_string(),
            };
            tracing::warn!("Ignoring registration: {}", error);
            return Ok(());
        };

        tracing::debug!("Registered tag decoder '{}'", name);
        self.tags.push((name.to_string(), tag));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&dyn Tag> {
        self.tags
            .iter()
            .find(|(registered, _)| registered == name)
            .map(|(_, tag)| tag.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Decoders in registration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &dyn Tag)> {
        self.tags.iter().map(|(name, tag)| (name.as_str(), tag.as_ref()))
    }

    pub fn names(&self) -> Vec<&str> {
        self.tags.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Decode `field` with the first applicable decoder.
    ///
    /// Only one tag drives injection for a field: the first decoder whose key
    /// is present on the field and which returns a value wins. The returned
    /// flag reports the winner's singleton semantics.
    pub fn decode(&self, ctx: &TagContext<'_>) -> Option<(Instance, bool)> {
        for (name, tag) in &self.tags {
            let Some(literal) = ctx.field.tag.lookup(name) else {
                continue;
            };
            if let Some(instance) = tag.decode(ctx, &literal) {
                tracing::trace!("Tag '{}' decoded field '{}'", name, ctx.field.name);
                return Some((instance, tag.is_singleton()));
            }
        }
        None
    }
}

impl fmt::Debug for TagRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TagRegistry")
            .field("tags", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    struct EchoTag;

    impl Tag for EchoTag {
        fn decode(&self, _ctx: &TagContext<'_>, literal: &str) -> Option<Instance> {
            Some(Arc::new(literal.to_string()))
        }
    }

    struct SkipTag;

    impl Tag for SkipTag {
        fn decode(&self, _ctx: &TagContext<'_>, _literal: &str) -> Option<Instance> {
            None
        }
    }

    mod unnamed {
        use super::*;

        pub struct Tag;

        impl super::super::Tag for Tag {
            fn decode(&self, _ctx: &TagContext<'_>, _literal: &str) -> Option<Instance> {
                None
            }
        }
    }

    #[test]
    fn test_names_are_derived_from_type() {
        let mut registry = TagRegistry::new();
        registry.add_tag(EchoTag).unwrap();
        registry.add_tag(SkipTag).unwrap();

        assert_eq!(registry.names(), vec!["echo", "skip"]);
        assert!(registry.contains("echo"));
    }

    #[test]
    fn test_duplicate_name_is_rejected() {
        let mut registry = TagRegistry::new();
        registry.add_tag(EchoTag).unwrap();

        let error = registry.add_tag(EchoTag).unwrap_err();
        assert_eq!(
            error,
            InjectError::TagAlreadyExists {
                name: "echo".to_string()
            }
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_empty_name_is_rejected() {
        let mut registry = TagRegistry::new();
        assert_eq!(registry.add_tag(unnamed::Tag).unwrap_err(), InjectError::InvalidTagName);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_nil_decoder_checks_name_and_is_ignored() {
        let mut registry = TagRegistry::new();
        registry.add_tag(EchoTag).unwrap();

        assert!(matches!(
            registry.register("echo", None),
            Err(InjectError::TagAlreadyExists { .. })
        ));
        registry.register("other", None).unwrap();
        assert_eq!(registry.names(), vec!["echo"]);
        assert!(!registry.contains("other"));

        registry.register("other", Some(Box::new(SkipTag))).unwrap();
        assert_eq!(registry.names(), vec!["echo", "other"]);
    }

    #[test]
    fn test_first_applicable_decoder_wins() {
        let mut registry = TagRegistry::new();
        registry.add_tag(SkipTag).unwrap();
        registry.add_tag(EchoTag).unwrap();

        let field = crate::reflect::FieldInfo::new::<String>("name", 0)
            .tagged(r#"skip:"ignored" echo:"hello""#);
        let instances = InstanceRegistry::new();
        let object = String::new();
        let ctx = TagContext {
            object: &object,
            field: &field,
            instances: &instances,
        };

        let (instance, singleton) = registry.decode(&ctx).unwrap();
        assert_eq!(instance.as_any().downcast_ref::<String>().unwrap(), "hello");
        assert!(!singleton);
    }
}
