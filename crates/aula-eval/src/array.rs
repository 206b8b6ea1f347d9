//! One- and two-dimensional homogeneous arrays.

use crate::error::SemanticError;
use crate::value::{ArrayRef, Value};
use aula_types::DataType;

/// Fixed dimensions of an array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Vector(usize),
    Matrix(usize, usize),
}

impl Shape {
    pub fn dimensions(&self) -> Vec<usize> {
        match *self {
            Shape::Vector(len) => vec![len],
            Shape::Matrix(rows, cols) => vec![rows, cols],
        }
    }

    /// Total number of elements, `None` if it does not fit in `usize`.
    pub fn size(&self) -> Option<usize> {
        match *self {
            Shape::Vector(len) => Some(len),
            Shape::Matrix(rows, cols) => rows.checked_mul(cols),
        }
    }
}

/// A homogeneous array stored row-major.
///
/// Every element's kind equals `elem_type`, and the shape never changes.
#[derive(Debug, Clone, PartialEq)]
pub struct Array {
    id: String,
    elem_type: DataType,
    shape: Shape,
    items: Vec<Value>,
}

impl Array {
    /// An array of `shape` filled with the element type's default value.
    ///
    /// Callers bound the element count first; see [`ArrayStore::reserve`].
    pub fn filled(
        id: impl Into<String>,
        elem_type: DataType,
        shape: Shape,
    ) -> Result<Self, SemanticError> {
        check_elem_type(elem_type)?;
        let zero = match shape {
            Shape::Vector(len) => len == 0,
            Shape::Matrix(rows, cols) => rows == 0 || cols == 0,
        };
        if zero {
            return Err(SemanticError::InvalidDimensions(format!(
                "every dimension must be positive, found {:?}",
                shape.dimensions()
            )));
        }
        let size = shape.size().ok_or_else(|| too_large(shape))?;
        Ok(Self {
            id: id.into(),
            elem_type,
            shape,
            items: vec![Value::default_for(elem_type); size],
        })
    }

    /// A vector holding `values`. An empty list is allowed.
    pub fn vector(
        id: impl Into<String>,
        elem_type: DataType,
        values: Vec<Value>,
    ) -> Result<Self, SemanticError> {
        check_elem_type(elem_type)?;
        check_items(elem_type, &values)?;
        Ok(Self {
            id: id.into(),
            elem_type,
            shape: Shape::Vector(values.len()),
            items: values,
        })
    }

    /// A matrix from equally long, non-empty rows.
    pub fn matrix(
        id: impl Into<String>,
        elem_type: DataType,
        rows: Vec<Vec<Value>>,
    ) -> Result<Self, SemanticError> {
        check_elem_type(elem_type)?;
        let cols = rows.first().map(Vec::len).unwrap_or(0);
        if cols == 0 {
            return Err(SemanticError::InvalidDimensions(
                "a matrix needs at least one row and one column".into(),
            ));
        }
        if let Some(bad) = rows.iter().position(|r| r.len() != cols) {
            return Err(SemanticError::InvalidDimensions(format!(
                "row {bad} has {} elements, expected {cols}",
                rows[bad].len()
            )));
        }
        let shape = Shape::Matrix(rows.len(), cols);
        let items: Vec<Value> = rows.into_iter().flatten().collect();
        check_items(elem_type, &items)?;
        Ok(Self {
            id: id.into(),
            elem_type,
            shape,
            items,
        })
    }

    /// A copy of this array under another name.
    pub fn renamed(&self, id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..self.clone()
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn elem_type(&self) -> DataType {
        self.elem_type
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn dimensions(&self) -> Vec<usize> {
        self.shape.dimensions()
    }

    /// Elements in row-major order.
    pub fn values(&self) -> &[Value] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: &[i64]) -> Result<&Value, SemanticError> {
        let at = self.offset(index)?;
        Ok(&self.items[at])
    }

    pub fn set(&mut self, index: &[i64], value: Value) -> Result<(), SemanticError> {
        if value.data_type() != self.elem_type {
            return Err(SemanticError::TypeMismatch(format!(
                "cannot store {} in {} array `{}`",
                value.data_type(),
                self.elem_type,
                self.id
            )));
        }
        let at = self.offset(index)?;
        self.items[at] = value;
        Ok(())
    }

    /// Reverses a vector, or the row order of a matrix.
    pub fn reverse(&mut self) {
        match self.shape {
            Shape::Vector(_) => self.items.reverse(),
            Shape::Matrix(_, cols) => {
                self.items = self.items.chunks(cols).rev().flatten().cloned().collect();
            }
        }
    }

    fn offset(&self, index: &[i64]) -> Result<usize, SemanticError> {
        match (self.shape, index) {
            (Shape::Vector(len), [i]) => bounded(*i, len),
            (Shape::Matrix(rows, cols), [r, c]) => {
                let r = bounded(*r, rows)?;
                let c = bounded(*c, cols)?;
                Ok(r * cols + c)
            }
            (shape, _) => Err(SemanticError::TypeMismatch(format!(
                "`{}` has {} dimension(s), indexed with {}",
                self.id,
                shape.dimensions().len(),
                index.len()
            ))),
        }
    }
}

fn bounded(index: i64, len: usize) -> Result<usize, SemanticError> {
    usize::try_from(index)
        .ok()
        .filter(|i| *i < len)
        .ok_or(SemanticError::IndexOutOfBounds { index, len })
}

fn too_large(shape: Shape) -> SemanticError {
    SemanticError::InvalidDimensions(format!(
        "{:?} holds more elements than can be addressed",
        shape.dimensions()
    ))
}

fn check_elem_type(elem_type: DataType) -> Result<(), SemanticError> {
    if elem_type == DataType::Array {
        return Err(SemanticError::TypeMismatch(
            "array elements must be scalars".into(),
        ));
    }
    Ok(())
}

fn check_items(elem_type: DataType, items: &[Value]) -> Result<(), SemanticError> {
    match items.iter().find(|v| v.data_type() != elem_type) {
        Some(bad) => Err(SemanticError::TypeMismatch(format!(
            "{elem_type} array cannot hold {}",
            bad.data_type()
        ))),
        None => Ok(()),
    }
}

/// Owns every array created during one run.
///
/// Arrays are never freed before the run ends, since a handle may outlive
/// the scope that declared it. `elements` counts every slot held, which is
/// what the per-run element limit is checked against.
#[derive(Debug, Default)]
pub struct ArrayStore {
    arrays: Vec<Array>,
    elements: usize,
}

impl ArrayStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, array: Array) -> ArrayRef {
        self.elements += array.len();
        self.arrays.push(array);
        ArrayRef(self.arrays.len() - 1)
    }

    /// Handles are only minted by `insert`, so they always resolve.
    pub fn get(&self, handle: ArrayRef) -> &Array {
        &self.arrays[handle.0]
    }

    pub fn get_mut(&mut self, handle: ArrayRef) -> &mut Array {
        &mut self.arrays[handle.0]
    }

    pub fn len(&self) -> usize {
        self.arrays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arrays.is_empty()
    }

    pub fn clear(&mut self) {
        self.arrays.clear();
        self.elements = 0;
    }

    /// Elements held by every stored array together.
    pub fn element_count(&self) -> usize {
        self.elements
    }

    /// Check that `shape` more elements fit under `limit`, before allocating.
    pub fn reserve(&self, shape: Shape, limit: usize) -> Result<usize, SemanticError> {
        let size = shape.size().ok_or_else(|| too_large(shape))?;
        let available = limit.saturating_sub(self.elements);
        if size > available {
            return Err(SemanticError::InvalidDimensions(format!(
                "{:?} needs {size} elements, only {available} of {limit} remain",
                shape.dimensions()
            )));
        }
        Ok(size)
    }

    /// Display text of any value, expanding arrays as `[a, b]` / `[[a, b], [c, d]]`.
    pub fn render(&self, value: &Value) -> String {
        let Value::Array(handle) = value else {
            return value.to_string();
        };
        let array = self.get(*handle);
        let join = |items: &[Value]| {
            items
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        };
        match array.shape {
            Shape::Vector(_) => format!("[{}]", join(&array.items)),
            Shape::Matrix(_, cols) => {
                let rows: Vec<String> = array
                    .items
                    .chunks(cols)
                    .map(|row| format!("[{}]", join(row)))
                    .collect();
                format!("[{}]", rows.join(", "))
            }
        }
    }

    /// Kind label used by the symbol report, e.g. `Array<Integer>`.
    pub fn kind_label(&self, value: &Value) -> String {
        match value {
            Value::Array(handle) => format!("Array<{}>", self.get(*handle).elem_type),
            other => other.data_type().to_string(),
        }
    }
}
