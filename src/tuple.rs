use crate::catalog::DataType;

#[derive(Debug, Clone, PartialEq)]
pub struct Tuple {
    fields: Vec<Field>,
}

impl Tuple {
    pub fn with_capacity(capacity: usize) -> Self {
        Tuple {
            fields: Vec::with_capacity(capacity),
        }
    }

    pub fn from_fields(fields: Vec<Field>) -> Self {
        Tuple { fields }
    }

    pub fn fields(&self) -> &Vec<Field> {
        &self.fields
    }

    pub fn get(&self, field_idx: usize) -> &Field {
        &self.fields[field_idx]
    }

    pub fn push(&mut self, field: Field) {
        self.fields.push(field);
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl std::fmt::Display for Tuple {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let fields: Vec<String> = self.fields.iter().map(|field| field.to_string()).collect();
        write!(f, "{}", fields.join("|"))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    Boolean(Option<bool>),
    Int(Option<i64>),
    Float(Option<f64>),
    String(Option<String>),
}

impl Field {
    pub fn null(data_type: &DataType) -> Self {
        match data_type {
            DataType::Boolean => Field::Boolean(None),
            DataType::Int => Field::Int(None),
            DataType::Float => Field::Float(None),
            DataType::String => Field::String(None),
        }
    }

    pub fn data_type(&self) -> DataType {
        match self {
            Field::Boolean(_) => DataType::Boolean,
            Field::Int(_) => DataType::Int,
            Field::Float(_) => DataType::Float,
            Field::String(_) => DataType::String,
        }
    }

    pub fn is_null(&self) -> bool {
        match self {
            Field::Boolean(val) => val.is_none(),
            Field::Int(val) => val.is_none(),
            Field::Float(val) => val.is_none(),
            Field::String(val) => val.is_none(),
        }
    }

    /// Convert raw CSV text into a field of the given type. `None` is a null.
    pub fn from_str(data_type: &DataType, raw: Option<&str>) -> Result<Self, String> {
        let raw = match raw {
            Some(raw) => raw,
            None => return Ok(Field::null(data_type)),
        };
        match data_type {
            DataType::Boolean => {
                let val = parse_bool(raw).ok_or(format!("{:?} is not a boolean", raw))?;
                Ok(Field::Boolean(Some(val)))
            }
            DataType::Int => {
                let val = raw.parse::<i64>().map_err(|e| format!("{:?}: {}", raw, e))?;
                Ok(Field::Int(Some(val)))
            }
            DataType::Float => {
                let val = raw.parse::<f64>().map_err(|e| format!("{:?}: {}", raw, e))?;
                Ok(Field::Float(Some(val)))
            }
            DataType::String => Ok(Field::String(Some(raw.to_string()))),
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Field::Int(val) => *val,
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&str> {
        match self {
            Field::String(val) => val.as_deref(),
            _ => None,
        }
    }
}

pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "true" | "True" | "TRUE" => Some(true),
        "false" | "False" | "FALSE" => Some(false),
        _ => None,
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Field::Boolean(val) => match val {
                Some(val) => write!(f, "{}", val),
                None => write!(f, "NULL"),
            },
            Field::Int(val) => match val {
                Some(val) => write!(f, "{}", val),
                None => write!(f, "NULL"),
            },
            Field::Float(val) => match val {
                Some(val) => write!(f, "{}", val),
                None => write!(f, "NULL"),
            },
            Field::String(val) => match val {
                Some(val) => write!(f, "{}", val),
                None => write!(f, "NULL"),
            },
        }
    }
}

impl From<i64> for Field {
    fn from(val: i64) -> Self {
        Field::Int(Some(val))
    }
}

impl From<f64> for Field {
    fn from(val: f64) -> Self {
        Field::Float(Some(val))
    }
}

impl From<bool> for Field {
    fn from(val: bool) -> Self {
        Field::Boolean(Some(val))
    }
}

impl From<String> for Field {
    fn from(val: String) -> Self {
        Field::String(Some(val))
    }
}

impl From<&str> for Field {
    fn from(val: &str) -> Self {
        Field::String(Some(val.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str_typed() {
        assert_eq!(
            Field::from_str(&DataType::Int, Some("42")).unwrap(),
            42i64.into()
        );
        assert_eq!(
            Field::from_str(&DataType::Float, Some("2.5")).unwrap(),
            2.5f64.into()
        );
        assert_eq!(
            Field::from_str(&DataType::Boolean, Some("False")).unwrap(),
            false.into()
        );
        assert_eq!(
            Field::from_str(&DataType::String, Some("Claude Monet")).unwrap(),
            "Claude Monet".into()
        );
    }

    #[test]
    fn test_from_str_null() {
        let field = Field::from_str(&DataType::Int, None).unwrap();
        assert!(field.is_null());
        assert_eq!(field.data_type(), DataType::Int);
        assert_eq!(field.to_string(), "NULL");
    }

    #[test]
    fn test_from_str_rejects_mismatch() {
        assert!(Field::from_str(&DataType::Int, Some("12.5")).is_err());
        assert!(Field::from_str(&DataType::Boolean, Some("yes")).is_err());
    }

    #[test]
    fn test_tuple_display() {
        let tuple = Tuple::from_fields(vec![1i64.into(), "Vincent".into(), Field::Float(None)]);
        assert_eq!(tuple.to_string(), "1|Vincent|NULL");
        assert_eq!(tuple.len(), 3);
    }
}
