//! Columnar batches: the unit of data flowing out of the scan operator.
//!
//! A batch is a column-oriented container of typed scalar values. It may
//! carry a selection vector (an index list marking the logically visible
//! rows). Filters downstream produce those; the leaf scan never does, and
//! the operator treats one coming out of the fetch engine as an internal
//! error.

use serde::{Deserialize, Serialize};

use crate::schema::DataType;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Scalar {
    Null,
    Bool(bool),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Str(String),
    Bin(Vec<u8>),
}

impl Scalar {
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            Scalar::Null => None,
            Scalar::Bool(_) => Some(DataType::Boolean),
            Scalar::I32(_) => Some(DataType::Int32),
            Scalar::I64(_) => Some(DataType::Int64),
            Scalar::F32(_) => Some(DataType::Float32),
            Scalar::F64(_) => Some(DataType::Float64),
            Scalar::Str(_) => Some(DataType::Utf8),
            Scalar::Bin(_) => Some(DataType::Binary),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub values: Vec<Scalar>,
}

impl Column {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: Vec::new(),
        }
    }

    /// A column pre-sized for `rows` values.
    pub fn with_capacity(name: impl Into<String>, rows: usize) -> Self {
        Self {
            name: name.into(),
            values: Vec::with_capacity(rows),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Batch {
    pub columns: Vec<Column>,
    selection: Option<Vec<u32>>,
}

impl Batch {
    /// The canonical zero-length batch signalling scan exhaustion.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            columns,
            selection: None,
        }
    }

    /// Attach a selection vector. Only execution-time filters do this; the
    /// scan operator asserts that fetch-engine batches never carry one.
    pub fn with_selection(mut self, sel: Vec<u32>) -> Self {
        self.selection = Some(sel);
        self
    }

    pub fn selection(&self) -> Option<&[u32]> {
        self.selection.as_deref()
    }

    /// Physical row count (ignores any selection vector).
    pub fn num_rows(&self) -> usize {
        self.columns.first().map(Column::len).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.num_rows() == 0
    }
}
