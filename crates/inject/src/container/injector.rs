use std::sync::Arc;

use crate::annotation;
use crate::config::{InjectorConfig, Properties};
use crate::container::path::InjectionPath;
use crate::container::registry::InstanceRegistry;
use crate::container::tags::{Tag, TagContext, TagRegistry};
use crate::errors::{InjectError, Result};
use crate::reflect::naming::instance_name;
use crate::reflect::{indirect_mut, value_at, value_at_mut};
use crate::reflect::{FieldInfo, Instance, Reflect, TypeInfo, TypeKind};
use crate::tags::{InjectTag, ValueTag};

/// A field reached through embedded structs, relative to the injected value
#[derive(Debug, Clone)]
struct FieldSlot {
    field: &'static FieldInfo,
    owner: &'static TypeInfo,
    path: Vec<usize>,
}

impl FieldSlot {
    fn parent_path(&self) -> &[usize] {
        &self.path[..self.path.len() - 1]
    }
}

/// Wires resolved instances into object graphs.
///
/// Injection runs in three steps per object: annotation tag values are
/// copied into marker fields, every field is resolved from the instance
/// registry or the tag decoders, and finally the type's initializer is
/// called with its parameters resolved the same way.
#[derive(Debug, Default)]
pub struct Injector {
    instances: InstanceRegistry,
    tags: TagRegistry,
    config: InjectorConfig,
}

impl Injector {
    /// Create an injector without tag decoders
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: InjectorConfig) -> Self {
        Self {
            instances: InstanceRegistry::new(),
            tags: TagRegistry::new(),
            config,
        }
    }

    /// Create an injector with the `value` and `inject` decoders
    pub fn with_default_tags(properties: Properties) -> Result<Self> {
        let mut injector = Self::new();
        injector.add_default_tags(properties)?;
        Ok(injector)
    }

    /// Register the `value` and `inject` decoders
    pub fn add_default_tags(&mut self, properties: Properties) -> Result<()> {
        self.add_tag(ValueTag::new(properties))?;
        self.add_tag(InjectTag)
    }

    pub fn add_tag<T: Tag>(&mut self, tag: T) -> Result<()> {
        self.tags.add_tag(tag)
    }

    /// Register an instance under its type name
    pub fn register<T: Reflect>(&mut self, instance: T) -> String {
        self.instances.register(instance)
    }

    pub fn register_named<T: Reflect>(&mut self, name: &str, instance: T) -> String {
        self.instances.register_named(name, instance)
    }

    /// Register an already shared instance
    pub fn register_instance(&mut self, name: &str, instance: Instance) {
        self.instances.save(name, instance);
    }

    pub fn instances(&self) -> &InstanceRegistry {
        &self.instances
    }

    pub fn instances_mut(&mut self) -> &mut InstanceRegistry {
        &mut self.instances
    }

    pub fn tags(&self) -> &TagRegistry {
        &self.tags
    }

    pub fn tags_mut(&mut self) -> &mut TagRegistry {
        &mut self.tags
    }

    pub fn config(&self) -> &InjectorConfig {
        &self.config
    }

    /// Inject dependencies into `object` and everything nested in it
    pub fn into_object(&mut self, object: &mut dyn Reflect) -> Result<()> {
        let mut path = InjectionPath::new();
        self.inject(object, &mut path)
    }

    fn inject(&mut self, object: &mut dyn Reflect, path: &mut InjectionPath) -> Result<()> {
        if object.is_nil() {
            return Err(InjectError::InvalidObject);
        }
        let target = indirect_mut(object).ok_or(InjectError::InvalidObject)?;
        let info = target.type_info();
        if !info.is_struct() {
            tracing::error!("Cannot inject into {}", info.name);
            return Err(InjectError::InvalidObject);
        }

        annotation::inject_into_fields(target)?;

        path.push(info);
        let result = self.inject_fields(target, info, path);
        let result = result.and_then(|()| self.inject_method(target, info, path));
        path.pop();
        result
    }

    fn inject_fields(
        &mut self,
        target: &mut dyn Reflect,
        info: &'static TypeInfo,
        path: &mut InjectionPath,
    ) -> Result<()> {
        for slot in deep_fields(info) {
            let field = slot.field;
            let declared = field.type_info();

            if field.indirect || declared.assignable {
                if let Some(instance) = self.resolve_field(target, &slot) {
                    if field.settable {
                        let value =
                            value_at_mut(target, &slot.path).ok_or(InjectError::InvalidObject)?;
                        value
                            .assign(&instance)
                            .map_err(|error| error.with_field(slot.owner.name, field.name))?;
                        tracing::debug!(
                            "Injected {} into {}.{}",
                            instance.type_info().name,
                            slot.owner.name,
                            field.name
                        );
                    }
                }
            }

            // markers were filled from their tags by annotation injection
            if declared.kind == TypeKind::Struct && !declared.is(info) {
                self.inject_nested(target, &slot, path)?;
            }
        }
        Ok(())
    }

    fn resolve_field(&mut self, target: &dyn Reflect, slot: &FieldSlot) -> Option<Instance> {
        let name = instance_name(slot.field.name);
        if let Some(instance) = self.instances.resolve(&name, slot.field.type_info()) {
            return Some(instance);
        }

        let owner = value_at(target, slot.parent_path())?;
        let ctx = TagContext {
            object: owner,
            field: slot.field,
            instances: &self.instances,
        };
        let (instance, singleton) = self.tags.decode(&ctx)?;
        if singleton {
            self.instances.save(&name, Arc::clone(&instance));
        }
        Some(instance)
    }

    fn inject_nested(
        &mut self,
        target: &mut dyn Reflect,
        slot: &FieldSlot,
        path: &mut InjectionPath,
    ) -> Result<()> {
        let declared = slot.field.type_info();
        if !self.may_descend(declared, path) {
            return Ok(());
        }

        let value = value_at_mut(target, &slot.path).ok_or(InjectError::InvalidObject)?;
        if value.is_pointer() {
            // shared pointees are left to whoever owns them
            match value.pointee_mut() {
                Some(pointee) => self.inject(pointee, path),
                None => Ok(()),
            }
        } else {
            self.inject(value, path)
        }
    }

    fn may_descend(&self, info: &TypeInfo, path: &InjectionPath) -> bool {
        if path.depth() >= self.config.max_depth {
            tracing::warn!(
                "Not descending into {}: depth limit {} reached at {}",
                info.name,
                self.config.max_depth,
                path.path_string()
            );
            return false;
        }
        if !path.allows(info, self.config.cycle_guard) {
            tracing::trace!(
                "Not descending into {}: already injecting {}",
                info.name,
                path.path_string()
            );
            return false;
        }
        true
    }

    fn inject_method(
        &mut self,
        target: &mut dyn Reflect,
        info: &'static TypeInfo,
        path: &mut InjectionPath,
    ) -> Result<()> {
        let Some(init) = info.init else {
            return Ok(());
        };

        let params = (init.params)();
        let mut args = Vec::with_capacity(params.len());
        for param in params {
            if param.is(info) {
                return Err(InjectError::illegal_argument(info.name));
            }
            match self.resolve_param(param, path)? {
                Some(instance) => args.push(instance),
                None => {
                    tracing::warn!(
                        "Skipping {} initializer: no instance for parameter {}",
                        info.name,
                        param.name
                    );
                    return Ok(());
                }
            }
        }

        if (init.invoke)(target, &args) {
            tracing::info!("Initialized {} with {} dependencies", info.name, args.len());
        } else {
            tracing::warn!("Initializer of {} rejected its resolved arguments", info.name);
        }
        Ok(())
    }

    fn resolve_param(
        &mut self,
        param: &'static TypeInfo,
        path: &mut InjectionPath,
    ) -> Result<Option<Instance>> {
        let name = param.instance_name();
        let existing = [name.clone(), param.alternate_name()]
            .into_iter()
            .find_map(|key| self.instances.resolve(&key, param).map(|instance| (key, instance)));

        if let Some((key, instance)) = existing {
            if self.config.reinject_instances
                && param.is_struct()
                && instance.type_info().is(param)
                && self.may_descend(param, path)
            {
                drop(instance);
                return self.reinject(&key, path).map(Some);
            }
            return Ok(Some(instance));
        }

        if param.kind == TypeKind::Interface {
            return Ok(None);
        }
        let Some(construct) = param.construct else {
            return Ok(None);
        };
        if !param.is_struct() {
            let instance: Instance = Arc::from(construct());
            self.instances.save(&name, Arc::clone(&instance));
            return Ok(Some(instance));
        }
        // types refused by the guard are cached as their zero value
        let mut value = construct();
        if self.may_descend(param, path) {
            self.inject(value.as_mut(), path)?;
        }
        let instance: Instance = Arc::from(value);
        self.instances.save(&name, Arc::clone(&instance));
        tracing::debug!("Created {} for an initializer", param.name);
        Ok(Some(instance))
    }

    /// Re-run injection on a registered instance while nothing else holds it
    fn reinject(&mut self, key: &str, path: &mut InjectionPath) -> Result<Instance> {
        let mut instance = self.instances.take(key).ok_or(InjectError::InvalidObject)?;
        let result = match Arc::get_mut(&mut instance) {
            Some(unique) => self.inject(unique, path),
            None => Ok(()),
        };
        self.instances.save(key, Arc::clone(&instance));
        result.map(|()| instance)
    }
}

/// Fields of `info`, with embedded plain structs flattened in place
fn deep_fields(info: &'static TypeInfo) -> Vec<FieldSlot> {
    let mut slots = Vec::new();
    collect_deep_fields(info, &[], &mut slots);
    slots
}

fn collect_deep_fields(owner: &'static TypeInfo, prefix: &[usize], out: &mut Vec<FieldSlot>) {
    for field in &owner.fields {
        let mut path = prefix.to_vec();
        path.push(field.index);

        let ty = field.type_info();
        if field.embedded && !field.indirect && ty.kind == TypeKind::Struct {
            collect_deep_fields(ty, &path, out);
        } else {
            out.push(FieldSlot { field, owner, path });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::at;
    use crate::Reflect;

    #[derive(Debug, Default, Reflect)]
    struct Base {
        #[reflect(tag = r#"value:"base""#)]
        label: String,
    }

    #[derive(Debug, Default, Reflect)]
    struct Leaf {
        #[reflect(tag = r#"value:"${leaf.size:3}""#)]
        size: u32,
    }

    #[derive(Debug, Default, Reflect)]
    struct Root {
        #[reflect(embed)]
        base: Base,
        #[reflect(tag = r#"value:"/root""#)]
        controller: at::RestController,
        leaf: Leaf,
        #[reflect(readonly, tag = r#"value:"ignored""#)]
        fixed: String,
    }

    #[test]
    fn test_deep_fields_flatten_plain_embedded_structs() {
        let names: Vec<_> = deep_fields(<Root as crate::Typed>::type_info())
            .iter()
            .map(|slot| slot.field.name)
            .collect();
        assert_eq!(names, vec!["label", "controller", "leaf", "fixed"]);
    }

    #[test]
    fn test_into_object_fills_nested_values() {
        let mut injector = Injector::with_default_tags(Properties::new()).unwrap();
        let mut root = Root::default();
        injector.into_object(&mut root).unwrap();

        assert_eq!(root.base.label, "base");
        assert_eq!(root.controller.annotation.value, "/root");
        assert_eq!(root.leaf.size, 3);
        assert!(root.fixed.is_empty());
    }

    #[test]
    fn test_scalar_targets_are_invalid() {
        let mut injector = Injector::new();
        let mut number = 1u8;
        assert!(injector.into_object(&mut number).unwrap_err().is_invalid_object());

        let mut missing: Option<Arc<Leaf>> = None;
        assert!(injector.into_object(&mut missing).unwrap_err().is_invalid_object());
    }

    #[test]
    fn test_shared_target_is_invalid() {
        let mut injector = Injector::new();
        let shared = Arc::new(Leaf::default());
        let mut handle = Some(Arc::clone(&shared));
        assert!(injector.into_object(&mut handle).unwrap_err().is_invalid_object());
    }
}
