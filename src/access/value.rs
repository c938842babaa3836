use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Element types a column can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Boolean,
    Int32,
    Float64,
    Varchar,
    List,
}

impl DataType {
    /// Get the display name of this type
    pub fn name(&self) -> &'static str {
        match self {
            DataType::Boolean => "boolean",
            DataType::Int32 => "int32",
            DataType::Float64 => "float64",
            DataType::Varchar => "varchar",
            DataType::List => "list",
        }
    }

    /// Type that values of both `self` and `other` can be concatenated under.
    ///
    /// Identical types combine to themselves and integers widen to floats.
    /// Every other pairing is a conflict.
    pub fn common_type(self, other: DataType) -> Option<DataType> {
        match (self, other) {
            (a, b) if a == b => Some(a),
            (DataType::Int32, DataType::Float64) | (DataType::Float64, DataType::Int32) => {
                Some(DataType::Float64)
            }
            _ => None,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single cell value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Boolean(bool),
    Int32(i32),
    Float64(f64),
    String(String),
    List(Vec<Value>),
}

impl Value {
    /// Get the data type of this value
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            Value::Null => None,
            Value::Boolean(_) => Some(DataType::Boolean),
            Value::Int32(_) => Some(DataType::Int32),
            Value::Float64(_) => Some(DataType::Float64),
            Value::String(_) => Some(DataType::Varchar),
            Value::List(_) => Some(DataType::List),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Check if this value can be stored in a column of the given data type
    pub fn is_compatible_with(&self, data_type: DataType) -> bool {
        match (self, data_type) {
            (Value::Null, _) => true, // NULL is compatible with any type
            (Value::Int32(_), DataType::Float64) => true,
            (value, data_type) => value.data_type() == Some(data_type),
        }
    }

    /// Convert this value into the given column type.
    ///
    /// Returns `None` when the value is not compatible with `data_type`.
    pub fn cast_to(self, data_type: DataType) -> Option<Value> {
        match (self, data_type) {
            (Value::Int32(n), DataType::Float64) => Some(Value::Float64(f64::from(n))),
            (value, data_type) if value.is_compatible_with(data_type) => Some(value),
            _ => None,
        }
    }

    /// Numeric view of the value, if it has one
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int32(n) => Some(f64::from(*n)),
            Value::Float64(x) => Some(*x),
            _ => None,
        }
    }

    /// Total order used to sort group keys.
    ///
    /// NULL sorts first, then booleans, numbers, strings and lists. Numbers
    /// of different widths compare by value.
    pub fn total_cmp(&self, other: &Value) -> Ordering {
        fn rank(value: &Value) -> u8 {
            match value {
                Value::Null => 0,
                Value::Boolean(_) => 1,
                Value::Int32(_) | Value::Float64(_) => 2,
                Value::String(_) => 3,
                Value::List(_) => 4,
            }
        }

        match (self, other) {
            (Value::Boolean(a), Value::Boolean(b)) => a.cmp(b),
            (Value::Int32(a), Value::Int32(b)) => a.cmp(b),
            (Value::String(a), Value::String(b)) => a.cmp(b),
            (Value::List(a), Value::List(b)) => {
                for (x, y) in a.iter().zip(b.iter()) {
                    let ord = x.total_cmp(y);
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                a.len().cmp(&b.len())
            }
            (a, b) => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => x.total_cmp(&y),
                _ => rank(a).cmp(&rank(b)),
            },
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Int32(n) => write!(f, "{}", n),
            Value::Float64(x) => write!(f, "{}", x),
            Value::String(s) => write!(f, "{:?}", s),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_type() {
        assert_eq!(
            DataType::Int32.common_type(DataType::Int32),
            Some(DataType::Int32)
        );
        assert_eq!(
            DataType::Int32.common_type(DataType::Float64),
            Some(DataType::Float64)
        );
        assert_eq!(
            DataType::Float64.common_type(DataType::Int32),
            Some(DataType::Float64)
        );
        assert_eq!(DataType::Int32.common_type(DataType::Varchar), None);
        assert_eq!(DataType::List.common_type(DataType::Boolean), None);
    }

    #[test]
    fn test_value_compatibility() {
        assert!(Value::Null.is_compatible_with(DataType::Int32));
        assert!(Value::Boolean(true).is_compatible_with(DataType::Boolean));
        assert!(Value::Int32(42).is_compatible_with(DataType::Int32));
        assert!(Value::Int32(42).is_compatible_with(DataType::Float64));
        assert!(Value::String("hello".to_string()).is_compatible_with(DataType::Varchar));

        assert!(!Value::Boolean(true).is_compatible_with(DataType::Int32));
        assert!(!Value::Int32(42).is_compatible_with(DataType::Varchar));
        assert!(!Value::Float64(1.5).is_compatible_with(DataType::Int32));
    }

    #[test]
    fn test_cast_to() {
        assert_eq!(
            Value::Int32(3).cast_to(DataType::Float64),
            Some(Value::Float64(3.0))
        );
        assert_eq!(Value::Null.cast_to(DataType::Varchar), Some(Value::Null));
        assert_eq!(Value::Boolean(true).cast_to(DataType::Int32), None);
    }

    #[test]
    fn test_total_cmp() {
        assert_eq!(Value::Null.total_cmp(&Value::Int32(0)), Ordering::Less);
        assert_eq!(
            Value::Int32(2).total_cmp(&Value::Float64(1.5)),
            Ordering::Greater
        );
        assert_eq!(
            Value::String("A".to_string()).total_cmp(&Value::String("B".to_string())),
            Ordering::Less
        );
        assert_eq!(
            Value::Boolean(true).total_cmp(&Value::Int32(-5)),
            Ordering::Less
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Null.to_string(), "NULL");
        assert_eq!(Value::String("A".to_string()).to_string(), "\"A\"");
        assert_eq!(
            Value::List(vec![Value::Int32(1), Value::Int32(2)]).to_string(),
            "[1, 2]"
        );
    }

    #[test]
    fn test_untagged_serde() -> anyhow::Result<()> {
        let values: Vec<Value> = serde_json::from_str(r#"[null, true, 3, 1.5, "x", [1]]"#)?;
        assert_eq!(
            values,
            vec![
                Value::Null,
                Value::Boolean(true),
                Value::Int32(3),
                Value::Float64(1.5),
                Value::String("x".to_string()),
                Value::List(vec![Value::Int32(1)]),
            ]
        );
        Ok(())
    }
}
