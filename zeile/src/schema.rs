//! A `Schema` is the resolved layout of one record type: its fields in declaration order, each with a codec and an
//! optional default. The order of the fields *is* the wire layout, so payloads can only be read back with the exact
//! schema they were written with.

use std::borrow::Cow;
use std::collections::HashSet;

use tracing::trace;

use crate::codec::Codec;
use crate::cursor::WriteCursor;
use crate::error::SchemaError;
use crate::value::{Record, Value};

#[derive(Debug, Clone)]
pub struct Field {
    name: String,
    codec: Codec,
    default: Option<Value>,
}

impl Field {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn codec(&self) -> &Codec {
        &self.codec
    }

    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// The declared default, or the empty value of the codec if there is none.
    pub fn default_or_zero(&self) -> Value {
        self.default.clone().unwrap_or_else(|| self.codec.zero())
    }
}

#[derive(Debug, Clone)]
pub struct Schema {
    name: String,
    fields: Vec<Field>,
}

impl Schema {

    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder { name: name.into(), fields: Vec::new() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns `record` with every missing field that declares a default filled in, down through nested records,
    /// lists and nullable values. Borrows if nothing is missing.
    pub fn fill_defaults<'r>(&self, record: &'r Record) -> Cow<'r, Record> {
        let mut filled = Cow::Borrowed(record);
        for field in &self.fields {
            match (record.get(&field.name), &field.default) {
                (None, Some(default)) => {
                    filled.to_mut().insert(field.name.clone(), default.clone());
                }
                (None, None) => (),
                (Some(value), _) => {
                    if let Cow::Owned(value) = fill_value(&field.codec, value) {
                        filled.to_mut().insert(field.name.clone(), value);
                    }
                }
            }
        }
        filled
    }

    /// A record holding the default or empty value of every field.
    pub fn zero(&self) -> Record {
        let mut record = Record::with_capacity(self.fields.len());
        for field in &self.fields {
            record.push(field.name.clone(), field.default_or_zero());
        }
        record
    }

}

fn fill_value<'v>(codec: &Codec, value: &'v Value) -> Cow<'v, Value> {
    match (codec, value) {
        (Codec::Nullable(inner), value) => fill_value(inner, value),
        (Codec::Record(schema), Value::Record(record)) => match schema.fill_defaults(record) {
            Cow::Owned(record) => Cow::Owned(Value::Record(record)),
            Cow::Borrowed(_) => Cow::Borrowed(value),
        },
        (Codec::List(inner), Value::List(items)) => {
            let mut filled: Option<Vec<Value>> = None;
            for (i, item) in items.iter().enumerate() {
                if let Cow::Owned(item) = fill_value(inner, item) {
                    filled.get_or_insert_with(|| items.clone())[i] = item;
                }
            }
            match filled {
                Some(items) => Cow::Owned(Value::List(items)),
                None => Cow::Borrowed(value),
            }
        }
        _ => Cow::Borrowed(value),
    }
}

pub struct SchemaBuilder {
    name: String,
    fields: Vec<Field>,
}

impl SchemaBuilder {

    pub fn field(mut self, name: impl Into<String>, codec: Codec) -> Self {
        self.fields.push(Field { name: name.into(), codec, default: None });
        self
    }

    pub fn field_with_default(mut self, name: impl Into<String>, codec: Codec, default: impl Into<Value>) -> Self {
        self.fields.push(Field { name: name.into(), codec, default: Some(default.into()) });
        self
    }

    /// Checks that field names are unique and that every default can be written by its field's codec. Defaults of
    /// skipped fields never reach the wire and are taken as they are.
    pub fn build(self) -> Result<Schema, SchemaError> {
        let mut seen = HashSet::with_capacity(self.fields.len());
        for field in &self.fields {
            if !seen.insert(field.name.as_str()) {
                return Err(SchemaError::DuplicateField { schema: self.name, field: field.name.clone() });
            }
            if matches!(field.codec, Codec::Skip) {
                continue;
            }
            if let Some(default) = &field.default {
                field.codec.write(&mut WriteCursor::new(), default)
                    .map_err(|e| SchemaError::Default { field: field.name.clone(), source: e.into_inner() })?;
            }
        }
        trace!(schema = %self.name, fields = self.fields.len(), "schema resolved");
        Ok(Schema { name: self.name, fields: self.fields })
    }

}
