//! Declaration text for JSON modules.
//!
//! A JSON document is described by a set of `export interface` declarations
//! plus a default-exported constant of the root type. Key order follows the
//! document (`serde_json` is built with `preserve_order`).

use std::fmt::Write as _;

use rustc_hash::{FxHashMap, FxHashSet};
use serde_json::{Map, Value};

/// Infer a declaration for the JSON document in `text`
pub fn json_to_declaration(text: &str) -> Result<String, serde_json::Error> {
    let document: Value = serde_json::from_str(text)?;
    let mut inferencer = SchemaInferencer::default();
    let root_type = render_union(&inferencer.infer(ROOT_NAME, &[&document]));

    let mut output = String::new();
    for interface in &inferencer.interfaces {
        interface.render(&mut output);
        output.push('\n');
    }
    let _ = writeln!(output, "declare const root: {root_type};");
    output.push_str("export default root;\n");
    Ok(output)
}

const ROOT_NAME: &str = "Root";

#[derive(Debug)]
struct Field {
    key: String,
    ty: String,
    optional: bool,
}

#[derive(Debug)]
struct Interface {
    name: String,
    fields: Vec<Field>,
}

impl Interface {
    fn render(&self, output: &mut String) {
        if self.fields.is_empty() {
            let _ = writeln!(output, "export interface {} {{}}", self.name);
            return;
        }
        let _ = writeln!(output, "export interface {} {{", self.name);
        for field in &self.fields {
            let optional = if field.optional { "?" } else { "" };
            let _ = writeln!(output, "    {}{optional}: {};", property_key(&field.key), field.ty);
        }
        output.push_str("}\n");
    }
}

/// Shape classes that are merged before rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Primitive(&'static str),
    Object,
    Array,
}

impl Kind {
    fn of(value: &Value) -> Self {
        match value {
            Value::Null => Self::Primitive("null"),
            Value::Bool(_) => Self::Primitive("boolean"),
            Value::Number(_) => Self::Primitive("number"),
            Value::String(_) => Self::Primitive("string"),
            Value::Object(_) => Self::Object,
            Value::Array(_) => Self::Array,
        }
    }
}

#[derive(Debug, Default)]
struct SchemaInferencer {
    interfaces: Vec<Interface>,
    used_names: FxHashSet<String>,
    name_counts: FxHashMap<String, usize>,
}

impl SchemaInferencer {
    /// Types describing every value in `values`, deduplicated in first-seen
    /// order. All objects share one interface and all arrays one element
    /// type.
    fn infer(&mut self, hint: &str, values: &[&Value]) -> Vec<String> {
        let mut kinds: Vec<Kind> = Vec::new();
        for value in values {
            let kind = Kind::of(value);
            if !kinds.contains(&kind) {
                kinds.push(kind);
            }
        }

        let mut types: Vec<String> = Vec::with_capacity(kinds.len());
        for kind in kinds {
            let ty = match kind {
                Kind::Primitive(name) => name.to_owned(),
                Kind::Object => {
                    let objects: Vec<&Map<String, Value>> =
                        values.iter().filter_map(|value| value.as_object()).collect();
                    self.interface(hint, &objects)
                }
                Kind::Array => {
                    let elements: Vec<&Value> = values
                        .iter()
                        .filter_map(|value| value.as_array())
                        .flatten()
                        .collect();
                    render_array(&self.infer(hint, &elements))
                }
            };
            if !types.contains(&ty) {
                types.push(ty);
            }
        }
        types
    }

    /// Declare one interface covering all `objects` and return its name
    fn interface(&mut self, hint: &str, objects: &[&Map<String, Value>]) -> String {
        let name = self.allocate_name(hint);
        // Reserve the slot so parents are emitted before their children.
        let slot = self.interfaces.len();
        self.interfaces.push(Interface {
            name: name.clone(),
            fields: Vec::new(),
        });

        let mut keys: Vec<&str> = Vec::new();
        for object in objects {
            for key in object.keys() {
                if !keys.contains(&key.as_str()) {
                    keys.push(key);
                }
            }
        }

        let mut fields = Vec::with_capacity(keys.len());
        for key in keys {
            let values: Vec<&Value> = objects.iter().filter_map(|object| object.get(key)).collect();
            let optional = values.len() < objects.len();
            let ty = render_union(&self.infer(&pascal_case(key), &values));
            fields.push(Field {
                key: key.to_owned(),
                ty,
                optional,
            });
        }
        self.interfaces[slot].fields = fields;
        name
    }

    fn allocate_name(&mut self, hint: &str) -> String {
        let count = self.name_counts.entry(hint.to_owned()).or_insert(0);
        loop {
            *count += 1;
            let name = if *count == 1 {
                hint.to_owned()
            } else {
                format!("{hint}{count}")
            };
            if self.used_names.insert(name.clone()) {
                return name;
            }
        }
    }
}

fn render_union(types: &[String]) -> String {
    if types.is_empty() {
        return "unknown".to_owned();
    }
    types.join(" | ")
}

fn render_array(element_types: &[String]) -> String {
    match element_types {
        [] => "unknown[]".to_owned(),
        [single] => format!("{single}[]"),
        many => format!("({})[]", many.join(" | ")),
    }
}

/// `"user-profile"` → `UserProfile`; names that would not start with a letter
/// get a `T` prefix
fn pascal_case(key: &str) -> String {
    let mut name = String::with_capacity(key.len());
    for part in key.split(|c: char| !c.is_ascii_alphanumeric()) {
        let mut chars = part.chars();
        if let Some(first) = chars.next() {
            name.push(first.to_ascii_uppercase());
            name.push_str(chars.as_str());
        }
    }
    match name.chars().next() {
        None => "Item".to_owned(),
        Some(first) if first.is_ascii_digit() => format!("T{name}"),
        Some(_) => name,
    }
}

fn is_identifier(key: &str) -> bool {
    let mut chars = key.chars();
    chars
        .next()
        .is_some_and(|first| first.is_ascii_alphabetic() || first == '_' || first == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

fn property_key(key: &str) -> String {
    if is_identifier(key) {
        return key.to_owned();
    }
    serde_json::to_string(key).unwrap_or_else(|_| format!("\"{key}\""))
}
