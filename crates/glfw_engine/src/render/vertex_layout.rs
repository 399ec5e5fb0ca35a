//! Vertex layout definitions and shader input matching
//!
//! A vertex array records, per input location, how to read bytes out of a
//! buffer. The vertex shader declares which locations it consumes. OpenGL
//! never checks that the two agree: a layout written for location 1 against a
//! shader reading location 0 renders garbage without raising an error.
//! [`ShaderInputLayout::check`] closes that gap so a mismatch fails at bind
//! time instead.

use crate::render::backend::{ActiveAttribute, ProgramId};
use thiserror::Error;

/// Scalar type of each attribute component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ComponentType {
    /// 32-bit IEEE float
    #[default]
    Float,
}

impl ComponentType {
    /// Size of one component in bytes
    pub const fn size_bytes(self) -> u32 {
        match self {
            Self::Float => 4,
        }
    }
}

/// Description of one vertex attribute inside a buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    /// Shader input location this attribute feeds
    pub location: u32,
    /// Components per vertex (1..=4)
    pub components: u8,
    /// Component scalar type
    pub component_type: ComponentType,
    /// Byte distance between consecutive vertices; 0 means tightly packed
    pub stride: u32,
    /// Byte offset of the first component inside the buffer
    pub offset: u32,
}

impl VertexAttribute {
    /// Tightly packed float attribute starting at the beginning of the buffer
    pub const fn float(location: u32, components: u8) -> Self {
        Self {
            location,
            components,
            component_type: ComponentType::Float,
            stride: 0,
            offset: 0,
        }
    }

    /// Set the byte stride between vertices
    pub const fn with_stride(mut self, stride: u32) -> Self {
        self.stride = stride;
        self
    }

    /// Set the byte offset of the first component
    pub const fn with_offset(mut self, offset: u32) -> Self {
        self.offset = offset;
        self
    }

    /// Stride actually used by the driver, resolving 0 to the packed size
    pub const fn effective_stride(&self) -> u32 {
        if self.stride == 0 {
            self.components as u32 * self.component_type.size_bytes()
        } else {
            self.stride
        }
    }
}

/// One vertex input of a linked program
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderInput {
    /// Variable name in the vertex shader
    pub name: String,
    /// Bound location
    pub location: u32,
    /// Declared component count
    pub components: u8,
}

impl From<ActiveAttribute> for ShaderInput {
    fn from(attribute: ActiveAttribute) -> Self {
        Self {
            name: attribute.name,
            location: attribute.location,
            components: attribute.components,
        }
    }
}

/// Layout mismatches detected when binding geometry for a draw
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    /// A shader input has no attribute at its location
    #[error("shader input '{name}' at location {location} has no vertex attribute")]
    MissingAttribute { name: String, location: u32 },

    /// An attribute feeds no shader input
    #[error("vertex attribute at location {location} is not consumed by any shader input")]
    UnusedAttribute { location: u32 },

    /// The attribute supplies more components than the input declares
    #[error("vertex attribute at location {location} supplies {supplied} components but shader input '{name}' declares {declared}")]
    ComponentMismatch {
        name: String,
        location: u32,
        supplied: u8,
        declared: u8,
    },

    /// The program passed to bind is not the active one
    #[error("geometry bound against program {expected:?} but the active program is {active:?}")]
    ProgramNotActive {
        expected: ProgramId,
        active: Option<ProgramId>,
    },
}

/// Vertex inputs reflected from a linked program, sorted by location
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShaderInputLayout {
    inputs: Vec<ShaderInput>,
}

impl ShaderInputLayout {
    /// Build a layout from reflected attributes
    pub fn new(inputs: impl IntoIterator<Item = ShaderInput>) -> Self {
        let mut inputs: Vec<ShaderInput> = inputs.into_iter().collect();
        inputs.sort_by_key(|input| input.location);
        Self { inputs }
    }

    /// All inputs, ordered by location
    pub fn inputs(&self) -> &[ShaderInput] {
        &self.inputs
    }

    /// Input at `location`, if the program declares one
    pub fn input_at(&self, location: u32) -> Option<&ShaderInput> {
        self.inputs.iter().find(|input| input.location == location)
    }

    /// Verify that `attributes` feed exactly the declared inputs
    ///
    /// Every input needs an attribute at the same location, and every
    /// attribute must land on an input. An attribute may supply fewer
    /// components than the input declares (the driver fills the rest with
    /// `(0, 0, 0, 1)`), but never more.
    pub fn check(&self, attributes: &[VertexAttribute]) -> Result<(), LayoutError> {
        for input in &self.inputs {
            let attribute = attributes
                .iter()
                .find(|attribute| attribute.location == input.location)
                .ok_or_else(|| LayoutError::MissingAttribute {
                    name: input.name.clone(),
                    location: input.location,
                })?;

            if attribute.components > input.components {
                return Err(LayoutError::ComponentMismatch {
                    name: input.name.clone(),
                    location: input.location,
                    supplied: attribute.components,
                    declared: input.components,
                });
            }
        }

        if let Some(unused) = attributes
            .iter()
            .find(|attribute| self.input_at(attribute.location).is_none())
        {
            return Err(LayoutError::UnusedAttribute {
                location: unused.location,
            });
        }

        Ok(())
    }
}
