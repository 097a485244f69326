//! Serialized form of a Structural Record.
//!
//! Tokenizers for on-disk formats produce this document; it is turned into
//! a [`StructuralRecord`] through the same builder calls any other producer
//! uses, so ids are checked and coordinates classified on the way in.

use serde::{Deserialize, Serialize};

use crate::error::{IrError, IrResult};
use crate::geometry::{Orientation, Placement, Vector};
use crate::ids::{ComponentId, TypeId};
use crate::link::LinkEnd;
use crate::port::PortDecl;
use crate::record::{Dependency, StructuralRecord, TypeRef};
use crate::schema::SchemaCatalog;

/// How a document names a component type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TypeSpec {
    /// Numeric catalog id.
    Id(u32),
    /// A dependency name, a catalog `path/name`, or a bare catalog name.
    Name(String),
}

/// A component entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentDocument {
    /// Producer-chosen id.
    pub id: u32,
    /// Component type.
    #[serde(rename = "type")]
    pub ty: TypeSpec,
    /// Column; missing means undefined.
    #[serde(default)]
    pub x: Option<f64>,
    /// Row; missing means undefined.
    #[serde(default)]
    pub y: Option<f64>,
    /// Clockwise quarter turns.
    #[serde(default)]
    pub rotation: i64,
}

/// A link entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkDocument {
    /// Output end.
    pub from: LinkEnd,
    /// Input end.
    pub to: LinkEnd,
}

/// A dependency entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencyDocument {
    /// Name components refer to.
    pub name: String,
    /// Declared input count.
    #[serde(default)]
    pub inputs: u32,
    /// Declared output count.
    #[serde(default)]
    pub outputs: u32,
    /// The dependency's own record.
    #[serde(default)]
    pub record: Option<Box<RecordDocument>>,
}

/// A whole record.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RecordDocument {
    /// Record name.
    pub name: String,
    /// Logical identity.
    #[serde(default)]
    pub identity: Option<String>,
    /// Declared composite footprint.
    #[serde(default)]
    pub size: Option<Vector>,
    /// Components.
    #[serde(default)]
    pub components: Vec<ComponentDocument>,
    /// Links, as the producer wrote them.
    #[serde(default)]
    pub links: Vec<LinkDocument>,
    /// Declared composite ports.
    #[serde(default)]
    pub ports: Vec<PortDecl>,
    /// Named dependencies.
    #[serde(default)]
    pub dependencies: Vec<DependencyDocument>,
}

impl RecordDocument {
    /// Parse a JSON document.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Build the record, resolving type names against `catalog`.
    ///
    /// A name matching a declared dependency refers to it; anything else
    /// must be a catalogued type.
    pub fn into_record(self, catalog: &SchemaCatalog) -> IrResult<StructuralRecord> {
        let mut record = StructuralRecord::new(self.name);
        if let Some(identity) = self.identity {
            record.set_identity(identity);
        }
        if let Some(size) = self.size {
            record.set_size(size);
        }

        let mut names = Vec::with_capacity(self.dependencies.len());
        for dep in self.dependencies {
            names.push(dep.name.clone());
            let mut dependency = Dependency::new(dep.name, dep.inputs, dep.outputs);
            if let Some(doc) = dep.record {
                dependency = dependency.with_record(doc.into_record(catalog)?);
            }
            record.add_dependency(dependency);
        }

        for component in self.components {
            let ty = match component.ty {
                TypeSpec::Id(id) => TypeRef::Known(TypeId(id)),
                TypeSpec::Name(name) if names.contains(&name) => TypeRef::Dependency(name),
                TypeSpec::Name(name) => TypeRef::Known(
                    catalog
                        .lookup(&name)
                        .ok_or(IrError::UnknownTypeName(name))?,
                ),
            };
            let placement = match (component.x, component.y) {
                (Some(x), Some(y)) => Placement::from_coords(x, y),
                _ => Placement::Undefined,
            };
            record.add_component(
                ComponentId(component.id),
                ty,
                placement,
                Orientation::from_quarter_turns(component.rotation),
            )?;
        }

        for link in self.links {
            record.add_link(link.from, link.to);
        }
        for port in self.ports {
            record.add_port(port)?;
        }
        Ok(record)
    }
}
