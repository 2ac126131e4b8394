//! OpenAPI schema passes applied while building CRDs

use std::collections::BTreeMap;
use std::convert::Infallible;

use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::{
    JSONSchemaProps, JSONSchemaPropsOrArray, JSONSchemaPropsOrBool,
};

/// Fields of `metav1.ObjectMeta` as they appear in generated schemas
const OBJECT_META_FIELDS: &[&str] = &[
    "annotations",
    "creationTimestamp",
    "deletionGracePeriodSeconds",
    "deletionTimestamp",
    "finalizers",
    "generateName",
    "generation",
    "labels",
    "managedFields",
    "name",
    "namespace",
    "ownerReferences",
    "resourceVersion",
    "selfLink",
    "uid",
];

/// Visit every schema reachable from `schema`, parents before children.
///
/// The visitor receives the JSON path of each node; the root is `""`, its
/// properties are `.name`, array items `[*]`, map values `.*`.
pub fn try_visit_mut<E, F>(schema: &mut JSONSchemaProps, mut visitor: F) -> Result<(), E>
where
    F: FnMut(&str, &mut JSONSchemaProps) -> Result<(), E>,
{
    visit_node("", schema, &mut visitor)
}

/// Infallible variant of [`try_visit_mut`]
pub fn visit_mut<F>(schema: &mut JSONSchemaProps, mut visitor: F)
where
    F: FnMut(&str, &mut JSONSchemaProps),
{
    let result: Result<(), Infallible> = try_visit_mut(schema, |path, node| {
        visitor(path, node);
        Ok(())
    });
    if let Err(never) = result {
        match never {}
    }
}

fn visit_node<E, F>(path: &str, schema: &mut JSONSchemaProps, visitor: &mut F) -> Result<(), E>
where
    F: FnMut(&str, &mut JSONSchemaProps) -> Result<(), E>,
{
    visitor(path, schema)?;

    if let Some(properties) = schema.properties.as_mut() {
        for (name, child) in properties.iter_mut() {
            visit_node(&format!("{path}.{name}"), child, visitor)?;
        }
    }

    match schema.items.as_mut() {
        Some(JSONSchemaPropsOrArray::Schema(child)) => {
            visit_node(&format!("{path}[*]"), child, visitor)?;
        }
        Some(JSONSchemaPropsOrArray::Schemas(children)) => {
            for (i, child) in children.iter_mut().enumerate() {
                visit_node(&format!("{path}[{i}]"), child, visitor)?;
            }
        }
        None => {}
    }

    if let Some(JSONSchemaPropsOrBool::Schema(child)) = schema.additional_properties.as_mut() {
        visit_node(&format!("{path}.*"), child, visitor)?;
    }

    for (keyword, alternatives) in [
        ("allOf", &mut schema.all_of),
        ("anyOf", &mut schema.any_of),
        ("oneOf", &mut schema.one_of),
    ] {
        if let Some(alternatives) = alternatives.as_mut() {
            for (i, child) in alternatives.iter_mut().enumerate() {
                visit_node(&format!("{path}.{keyword}[{i}]"), child, visitor)?;
            }
        }
    }

    if let Some(child) = schema.not.as_mut() {
        visit_node(&format!("{path}.not"), child, visitor)?;
    }

    Ok(())
}

/// Drop properties whose name starts with an underscore
pub fn strip_unexported_fields(schema: &mut JSONSchemaProps) {
    visit_mut(schema, |_, node| {
        if let Some(properties) = node.properties.as_mut() {
            properties.retain(|name, _| !name.starts_with('_'));
        }
        if let Some(required) = node.required.as_mut() {
            required.retain(|name| !name.starts_with('_'));
            if required.is_empty() {
                node.required = None;
            }
        }
    });
}

/// Replace every embedded `metadata` object below the root with `replacement`.
///
/// The root `metadata` is owned by the API server and left untouched.
pub fn rewrite_embedded_object_meta(schema: &mut JSONSchemaProps, replacement: &JSONSchemaProps) {
    visit_mut(schema, |path, node| {
        if path.is_empty() {
            return;
        }
        if let Some(metadata) = node
            .properties
            .as_mut()
            .and_then(|properties| properties.get_mut("metadata"))
        {
            if is_object_meta(metadata) {
                *metadata = replacement.clone();
            }
        }
    });
}

fn is_object_meta(schema: &JSONSchemaProps) -> bool {
    if schema.type_.as_deref() != Some("object") {
        return false;
    }
    schema.properties.as_ref().map_or(true, |properties| {
        properties
            .keys()
            .all(|name| OBJECT_META_FIELDS.contains(&name.as_str()))
    })
}

/// Schema for an embedded `ObjectMeta` without any fields
pub fn collapsed_object_meta() -> JSONSchemaProps {
    JSONSchemaProps {
        type_: Some("object".to_string()),
        ..Default::default()
    }
}

/// Schema for an embedded `ObjectMeta` keeping the fields a template may set
pub fn embedded_object_meta() -> JSONSchemaProps {
    let string = || JSONSchemaProps {
        type_: Some("string".to_string()),
        ..Default::default()
    };
    let string_map = || JSONSchemaProps {
        type_: Some("object".to_string()),
        additional_properties: Some(JSONSchemaPropsOrBool::Schema(Box::new(string()))),
        ..Default::default()
    };

    JSONSchemaProps {
        type_: Some("object".to_string()),
        properties: Some(BTreeMap::from([
            ("annotations".to_string(), string_map()),
            (
                "finalizers".to_string(),
                JSONSchemaProps {
                    type_: Some("array".to_string()),
                    items: Some(JSONSchemaPropsOrArray::Schema(Box::new(string()))),
                    ..Default::default()
                },
            ),
            ("labels".to_string(), string_map()),
            ("name".to_string(), string()),
            ("namespace".to_string(), string()),
        ])),
        ..Default::default()
    }
}

/// JSON path of the first floating point schema, if any
pub fn find_float(schema: &mut JSONSchemaProps) -> Option<String> {
    let result = try_visit_mut(schema, |path, node| {
        if node.type_.as_deref() == Some("number") {
            return Err(path.to_string());
        }
        Ok(())
    });
    result.err()
}

/// Shorten every description longer than `max_len` bytes
pub fn truncate_descriptions(schema: &mut JSONSchemaProps, max_len: usize) {
    visit_mut(schema, |_, node| {
        if let Some(description) = node.description.as_mut() {
            truncate_description(description, max_len);
        }
    });
}

/// Cut at the last sentence end within `max_len` bytes, else before the last
/// space, else hard at `max_len`
pub fn truncate_description(description: &mut String, max_len: usize) {
    if description.len() <= max_len {
        return;
    }

    let mut end = max_len;
    while !description.is_char_boundary(end) {
        end -= 1;
    }

    let head = &description[..end];
    if let Some(sentence_end) = head.rfind('.').filter(|&n| n > 0) {
        end = sentence_end + 1;
    } else if let Some(word_end) = head.rfind(' ').filter(|&n| n > 0) {
        end = word_end;
    }

    description.truncate(end);
}
