//! Typed, column-oriented value vectors.

use crate::access::{DataType, Value};
use anyhow::{bail, Result};

/// A vector of values sharing one element type
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    data_type: DataType,
    values: Vec<Value>,
}

impl Column {
    /// Create a column, checking every value against `data_type`.
    ///
    /// Integers stored in a float column are widened.
    pub fn new(data_type: DataType, values: Vec<Value>) -> Result<Self> {
        let mut checked = Vec::with_capacity(values.len());
        for (i, value) in values.into_iter().enumerate() {
            match value.clone().cast_to(data_type) {
                Some(v) => checked.push(v),
                None => bail!(
                    "Value {} at position {} is not compatible with type {}",
                    value,
                    i,
                    data_type
                ),
            }
        }
        Ok(Self {
            data_type,
            values: checked,
        })
    }

    /// Build a column whose values are already known to match `data_type`
    pub(crate) fn from_parts(data_type: DataType, values: Vec<Value>) -> Self {
        debug_assert!(values.iter().all(|v| v.is_compatible_with(data_type)));
        Self { data_type, values }
    }

    pub fn boolean(values: impl IntoIterator<Item = bool>) -> Self {
        Self::from_parts(
            DataType::Boolean,
            values.into_iter().map(Value::Boolean).collect(),
        )
    }

    pub fn int32(values: impl IntoIterator<Item = i32>) -> Self {
        Self::from_parts(
            DataType::Int32,
            values.into_iter().map(Value::Int32).collect(),
        )
    }

    pub fn float64(values: impl IntoIterator<Item = f64>) -> Self {
        Self::from_parts(
            DataType::Float64,
            values.into_iter().map(Value::Float64).collect(),
        )
    }

    pub fn varchar<S: Into<String>>(values: impl IntoIterator<Item = S>) -> Self {
        Self::from_parts(
            DataType::Varchar,
            values.into_iter().map(|s| Value::String(s.into())).collect(),
        )
    }

    /// Create a list column, one element per row
    pub fn list(values: impl IntoIterator<Item = Vec<Value>>) -> Self {
        Self::from_parts(DataType::List, values.into_iter().map(Value::List).collect())
    }

    /// Size-1 column holding a single non-NULL value
    pub fn scalar(value: Value) -> Option<Self> {
        let data_type = value.data_type()?;
        Some(Self::from_parts(data_type, vec![value]))
    }

    /// Turn the items of one list element into a column.
    ///
    /// The element type is the common type of the non-NULL items. Items
    /// without a common type stay boxed, one single-item list per value.
    pub fn from_list_element(items: Vec<Value>) -> Self {
        let mut data_type = None;
        let mut conflict = false;
        for item in items.iter().filter_map(Value::data_type) {
            match data_type {
                None => data_type = Some(item),
                Some(current) => match DataType::common_type(current, item) {
                    Some(common) => data_type = Some(common),
                    None => {
                        conflict = true;
                        break;
                    }
                },
            }
        }

        if conflict {
            let boxed = items.into_iter().map(|v| Value::List(vec![v])).collect();
            return Self::from_parts(DataType::List, boxed);
        }

        let data_type = data_type.unwrap_or(DataType::List);
        let values = items
            .into_iter()
            .map(|v| v.cast_to(data_type).unwrap_or(Value::Null))
            .collect();
        Self::from_parts(data_type, values)
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    /// Gather the values at `indices`, in that order
    pub fn take(&self, indices: &[usize]) -> Column {
        Self {
            data_type: self.data_type,
            values: indices.iter().map(|&i| self.values[i].clone()).collect(),
        }
    }

    /// Repeat a size-1 column `len` times; other sizes are returned unchanged
    pub fn recycle(self, len: usize) -> Column {
        if self.values.len() != 1 || len == 1 {
            return self;
        }
        let value = self.values[0].clone();
        Self {
            data_type: self.data_type,
            values: vec![value; len],
        }
    }

    /// Convert every value to `data_type`, if the types are compatible
    pub fn cast(self, data_type: DataType) -> Option<Column> {
        if self.data_type == data_type {
            return Some(self);
        }
        let values = self
            .values
            .into_iter()
            .map(|v| v.cast_to(data_type))
            .collect::<Option<Vec<_>>>()?;
        Some(Self { data_type, values })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_checks_types() -> Result<()> {
        let col = Column::new(DataType::Float64, vec![Value::Int32(1), Value::Null])?;
        assert_eq!(col.values(), &[Value::Float64(1.0), Value::Null]);

        assert!(Column::new(DataType::Int32, vec![Value::String("a".to_string())]).is_err());
        Ok(())
    }

    #[test]
    fn test_take_preserves_index_order() {
        let col = Column::int32([10, 20, 30, 40]);
        assert_eq!(col.take(&[3, 1]), Column::int32([40, 20]));
        assert_eq!(col.take(&[]).len(), 0);
    }

    #[test]
    fn test_recycle() {
        assert_eq!(Column::int32([7]).recycle(3), Column::int32([7, 7, 7]));
        assert_eq!(Column::int32([7]).recycle(0).len(), 0);
        assert_eq!(Column::int32([1, 2]).recycle(5), Column::int32([1, 2]));
    }

    #[test]
    fn test_cast() {
        assert_eq!(
            Column::int32([1, 2]).cast(DataType::Float64),
            Some(Column::float64([1.0, 2.0]))
        );
        assert_eq!(Column::varchar(["a"]).cast(DataType::Int32), None);
    }

    #[test]
    fn test_from_list_element() {
        let col = Column::from_list_element(vec![Value::Int32(1), Value::Float64(2.5)]);
        assert_eq!(col, Column::float64([1.0, 2.5]));

        let col = Column::from_list_element(vec![]);
        assert_eq!(col.data_type(), DataType::List);
        assert!(col.is_empty());

        let col = Column::from_list_element(vec![Value::Int32(1), Value::Boolean(true)]);
        assert_eq!(col.data_type(), DataType::List);
        assert_eq!(col.get(1), Some(&Value::List(vec![Value::Boolean(true)])));
    }

    #[test]
    fn test_scalar() {
        assert_eq!(Column::scalar(Value::Int32(5)), Some(Column::int32([5])));
        assert_eq!(Column::scalar(Value::Null), None);
    }
}
