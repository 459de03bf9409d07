//! Reference declarations and their container shapes.

/// Structural form of a reference within a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainerShape {
    /// A required id field.
    Scalar,
    /// An optional id field. A matching value still ties the owner's
    /// lifetime to the referenced document.
    OptionalScalar,
    /// A list of id values.
    ScalarList,
    /// A single embedded sub-document with its own declarations.
    EmbeddedSingle {
        /// The sub-document's reference declarations.
        nested: Vec<ReferenceDeclaration>,
    },
    /// A list of embedded sub-documents, kept in a dense 0-based order.
    EmbeddedList {
        /// The element sub-document's reference declarations.
        nested: Vec<ReferenceDeclaration>,
        /// Element field holding the dense 0-based position.
        order_key: String,
    },
}

/// Where, within a document type, a reference to another collection lives.
///
/// `target` is only meaningful for the scalar shapes; embedded shapes carry
/// their targets in the nested declaration set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceDeclaration {
    /// Field path within the owner document (single segment; nesting is
    /// expressed through embedded shapes, not dotted paths).
    pub field_path: String,
    /// Collection type the field refers to (empty for embedded shapes).
    pub target: String,
    /// Container shape of the reference.
    pub shape: ContainerShape,
}

impl ReferenceDeclaration {
    /// Declare a required scalar reference.
    pub fn scalar(field_path: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            field_path: field_path.into(),
            target: target.into(),
            shape: ContainerShape::Scalar,
        }
    }

    /// Declare an optional scalar reference.
    pub fn optional_scalar(field_path: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            field_path: field_path.into(),
            target: target.into(),
            shape: ContainerShape::OptionalScalar,
        }
    }

    /// Declare a list of scalar references.
    pub fn scalar_list(field_path: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            field_path: field_path.into(),
            target: target.into(),
            shape: ContainerShape::ScalarList,
        }
    }

    /// Declare a single embedded sub-document.
    pub fn embedded(field_path: impl Into<String>, nested: Vec<ReferenceDeclaration>) -> Self {
        Self {
            field_path: field_path.into(),
            target: String::new(),
            shape: ContainerShape::EmbeddedSingle { nested },
        }
    }

    /// Declare a list of embedded sub-documents with an order key.
    pub fn embedded_list(
        field_path: impl Into<String>,
        nested: Vec<ReferenceDeclaration>,
        order_key: impl Into<String>,
    ) -> Self {
        Self {
            field_path: field_path.into(),
            target: String::new(),
            shape: ContainerShape::EmbeddedList {
                nested,
                order_key: order_key.into(),
            },
        }
    }

    /// Nested declarations for embedded shapes, if any.
    pub fn nested(&self) -> Option<&[ReferenceDeclaration]> {
        match &self.shape {
            ContainerShape::EmbeddedSingle { nested }
            | ContainerShape::EmbeddedList { nested, .. } => Some(nested),
            _ => None,
        }
    }
}
