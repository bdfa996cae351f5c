//! Annotation discovery and injection
//!
//! An annotation is a marker struct derived with `#[reflect(annotation)]`.
//! Objects declare annotations by holding marker values whose struct tags
//! carry the annotation's arguments:
//!
//! ```ignore
//! #[derive(Default, Reflect)]
//! struct UserController {
//!     #[reflect(embed, tag = r#"value:"/users""#)]
//!     rest_controller: at::RestController,
//! }
//! ```
//!
//! Markers may embed other markers, which makes the embedded marker a parent
//! of the outer one (`GetMapping` embeds `RequestMapping`).

use std::collections::VecDeque;

use crate::errors::{InjectError, Result};
use crate::reflect::naming::normalize_key;
use crate::reflect::{indirect, indirect_mut, value_at, value_at_mut};
use crate::reflect::{FieldInfo, Reflect, TypeInfo, TypeKind, Typed};

/// Key whose trailing comma segments are copied into an `options` field
const VALUE_KEY: &str = "value";
const OPTIONS_FIELD: &str = "options";

/// An annotated field discovered on a type
#[derive(Debug, Clone)]
pub struct Field {
    /// Field metadata, including its struct tag
    pub info: &'static FieldInfo,
    /// Type declaring the field
    pub owner: &'static TypeInfo,
    /// Type the path starts from
    pub root: &'static TypeInfo,
    /// Field indices from the root value down to this field
    pub path: Vec<usize>,
}

impl Field {
    pub fn name(&self) -> &'static str {
        self.info.name
    }

    /// Type of the annotation held by this field
    pub fn type_info(&self) -> &'static TypeInfo {
        self.info.type_info()
    }

    /// Look up a struct tag value on the field
    pub fn lookup(&self, key: &str) -> Option<String> {
        self.info.tag.lookup(key)
    }

    /// Current value of the field inside `root`
    pub fn value<'a>(&self, root: &'a dyn Reflect) -> Option<&'a dyn Reflect> {
        let root = indirect(root)?;
        if !root.type_info().is(self.root) {
            return None;
        }
        value_at(root, &self.path)
    }

    /// Mutable value of the field inside `root`
    pub fn value_mut<'a>(&self, root: &'a mut dyn Reflect) -> Option<&'a mut dyn Reflect> {
        let root = indirect_mut(root)?;
        if !root.type_info().is(self.root) {
            return None;
        }
        value_at_mut(root, &self.path)
    }
}

/// Annotated fields of an object, depth first in declaration order.
///
/// Returns an empty list when the object is not a struct.
pub fn get_fields(object: &dyn Reflect) -> Vec<Field> {
    match indirect(object) {
        Some(target) => get_fields_of(target.type_info()),
        None => Vec::new(),
    }
}

/// Annotated fields of a type descriptor
pub fn get_fields_of(info: &'static TypeInfo) -> Vec<Field> {
    let mut fields = Vec::new();
    if info.is_struct() {
        collect_fields(info, info, &[], false, &mut fields);
    }
    fields
}

fn collect_fields(
    root: &'static TypeInfo,
    owner: &'static TypeInfo,
    prefix: &[usize],
    embedded_only: bool,
    out: &mut Vec<Field>,
) {
    for field in &owner.fields {
        if !field.is_nested_struct() || (embedded_only && !field.embedded) {
            continue;
        }
        let ty = field.type_info();
        let path = child_path(prefix, field.index);

        if ty.is_annotation() {
            out.push(Field {
                info: field,
                owner,
                root,
                path: path.clone(),
            });
            collect_fields(root, ty, &path, true, out);
        } else if field.embedded {
            collect_fields(root, ty, &path, embedded_only, out);
        }
    }
}

/// First annotated field of type `M`
pub fn get_field<M: Typed>(object: &dyn Reflect) -> Option<Field> {
    let target = indirect(object)?;
    get_field_of::<M>(target.type_info())
}

/// First annotated field of type `M` on a type descriptor
pub fn get_field_of<M: Typed>(info: &'static TypeInfo) -> Option<Field> {
    let wanted = M::type_info();
    get_fields_of(info)
        .into_iter()
        .find(|field| field.type_info().is(wanted))
}

/// Whether the object is an `M` or directly holds one
pub fn contains<M: Typed>(object: &dyn Reflect) -> bool {
    match indirect(object) {
        Some(target) => contains_type(target.type_info(), M::type_info()),
        None => false,
    }
}

/// Whether `info` is `wanted` or one of its direct fields has that type.
///
/// Embedded plain structs are looked through; markers are not.
pub fn contains_type(info: &TypeInfo, wanted: &TypeInfo) -> bool {
    if info.is(wanted) {
        return true;
    }
    info.fields.iter().any(|field| {
        let ty = field.type_info();
        ty.is(wanted)
            || (field.embedded
                && field.is_nested_struct()
                && !ty.is_annotation()
                && contains_type(ty, wanted))
    })
}

/// Whether `M` is embedded anywhere below any of `fields`
pub fn contains_child<M: Typed>(fields: &[Field]) -> bool {
    let wanted = M::type_info();
    fields
        .iter()
        .any(|field| embeds_type(field.type_info(), wanted))
}

fn embeds_type(info: &TypeInfo, wanted: &TypeInfo) -> bool {
    info.fields
        .iter()
        .filter(|field| field.embedded && field.is_nested_struct())
        .any(|field| {
            let ty = field.type_info();
            ty.is(wanted) || embeds_type(ty, wanted)
        })
}

/// Every value of type `M` nested anywhere inside the object
pub fn find<M: Typed>(object: &dyn Reflect) -> Vec<Field> {
    let mut found = Vec::new();
    if let Some(target) = indirect(object) {
        let info = target.type_info();
        if info.is_struct() {
            find_in(info, info, M::type_info(), &[], &mut found);
        }
    }
    found
}

fn find_in(
    root: &'static TypeInfo,
    owner: &'static TypeInfo,
    wanted: &'static TypeInfo,
    prefix: &[usize],
    out: &mut Vec<Field>,
) {
    for field in owner.fields.iter().filter(|field| field.is_nested_struct()) {
        let ty = field.type_info();
        let path = child_path(prefix, field.index);
        if ty.is(wanted) {
            out.push(Field {
                info: field,
                owner,
                root,
                path: path.clone(),
            });
        }
        find_in(root, ty, wanted, &path, out);
    }
}

/// Inject tag values into every annotation of the object
pub fn inject_into_fields(object: &mut dyn Reflect) -> Result<()> {
    if object.is_nil() {
        return Err(InjectError::InvalidObject);
    }
    let target = indirect_mut(object).ok_or(InjectError::InvalidObject)?;
    let info = target.type_info();
    if !info.is_struct() {
        return Err(InjectError::InvalidObject);
    }

    // embedded children of a marker were already defaulted with it, so only
    // their own tag pairs are applied
    let mut marker_path: Option<Vec<usize>> = None;
    for field in get_fields_of(info) {
        let nested = marker_path
            .as_ref()
            .is_some_and(|parent| field.path.starts_with(parent));
        if !nested {
            marker_path = Some(field.path.clone());
        }
        inject_tag(target, &field, !nested)?;
    }
    Ok(())
}

/// Inject the struct tag of one annotated field into the marker value.
///
/// Scalar marker fields carrying their own `value` tag receive it first as a
/// default. Each tag pair is then written to the shallowest scalar field of
/// the marker whose name matches the key; keys without a matching field are
/// ignored.
pub fn inject_into_field(object: &mut dyn Reflect, field: &Field) -> Result<()> {
    inject_tag(object, field, true)
}

fn inject_tag(object: &mut dyn Reflect, field: &Field, with_defaults: bool) -> Result<()> {
    let pairs = field.info.tag.parse()?;
    let marker = field.value_mut(object).ok_or(InjectError::InvalidObject)?;
    let info = field.type_info();

    if with_defaults {
        for (path, owner, slot) in scalar_fields(info) {
            if let Some(default) = slot.tag.lookup(VALUE_KEY) {
                set_literal_at(marker, &path, owner, slot, &default)?;
            }
        }
    }

    for pair in &pairs {
        let Some((path, owner, slot)) = locate(info, &pair.key) else {
            continue;
        };
        set_literal_at(marker, &path, owner, slot, pair.name())?;

        if pair.key == VALUE_KEY {
            if let Some((path, owner, slot)) = locate(info, OPTIONS_FIELD) {
                set_literal_at(marker, &path, owner, slot, &pair.options().join(","))?;
            }
        }
    }
    Ok(())
}

type ScalarSlot = (Vec<usize>, &'static TypeInfo, &'static FieldInfo);

/// Settable scalar fields of a marker, shallowest first
fn scalar_fields(info: &'static TypeInfo) -> Vec<ScalarSlot> {
    let mut slots = Vec::new();
    let mut queue = VecDeque::from([(Vec::new(), info)]);

    while let Some((prefix, owner)) = queue.pop_front() {
        for field in &owner.fields {
            if field.embedded && field.is_nested_struct() {
                queue.push_back((child_path(&prefix, field.index), field.type_info()));
            } else if field.settable
                && !field.indirect
                && field.type_info().kind == TypeKind::Scalar
            {
                slots.push((child_path(&prefix, field.index), owner, field));
            }
        }
    }
    slots
}

fn locate(info: &'static TypeInfo, key: &str) -> Option<ScalarSlot> {
    let key = normalize_key(key);
    scalar_fields(info)
        .into_iter()
        .find(|(_, _, field)| normalize_key(field.name) == key)
}

fn set_literal_at(
    marker: &mut dyn Reflect,
    path: &[usize],
    owner: &TypeInfo,
    field: &FieldInfo,
    literal: &str,
) -> Result<()> {
    let slot = value_at_mut(marker, path).ok_or(InjectError::InvalidObject)?;
    slot.set_literal(literal)
        .map_err(|error| error.with_field(owner.name, field.name))?;
    tracing::trace!("Set {}.{} = {:?}", owner.name, field.name, literal);
    Ok(())
}

fn child_path(prefix: &[usize], index: usize) -> Vec<usize> {
    let mut path = Vec::with_capacity(prefix.len() + 1);
    path.extend_from_slice(prefix);
    path.push(index);
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::at;
    use crate::Reflect;

    #[derive(Debug, Default, Reflect)]
    #[reflect(annotation)]
    struct AtRole {
        #[reflect(embed)]
        annotation: at::Annotation,
        options: Vec<String>,
        #[reflect(tag = r#"value:"1""#)]
        level: u8,
    }

    #[derive(Debug, Default, Reflect)]
    struct Secured {
        #[reflect(tag = r#"value:"admin,read,write""#)]
        role: AtRole,
        name: String,
    }

    #[test]
    fn test_value_options_and_defaults() {
        let mut secured = Secured::default();
        inject_into_fields(&mut secured).unwrap();

        assert_eq!(secured.role.annotation.value, "admin");
        assert_eq!(secured.role.options, vec!["read", "write"]);
        assert_eq!(secured.role.level, 1);
        assert!(secured.name.is_empty());
    }

    #[test]
    fn test_field_value_requires_matching_root() {
        let secured = Secured::default();
        let field = get_field::<AtRole>(&secured).unwrap();
        assert_eq!(field.name(), "role");
        assert!(field.value(&secured).is_some());

        let other = AtRole::default();
        assert!(field.value(&other).is_none());
    }

    #[test]
    fn test_non_struct_objects() {
        let mut number = 7i32;
        assert!(get_fields(&number).is_empty());
        assert!(get_field::<AtRole>(&number).is_none());
        assert!(find::<AtRole>(&number).is_empty());
        assert!(inject_into_fields(&mut number).unwrap_err().is_invalid_object());
    }
}
