use crate::error::{
    GradeNotIntegerSnafu, MissingStudentFieldSnafu, RosterResult, StudentBodyNotJsonSnafu,
    StudentBodyNotObjectSnafu, StudentNameNotStringSnafu,
};
use serde_json::{Map, Value};
use snafu::{OptionExt, ResultExt};

/// One row of the students table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentRecord {
    pub name: String,
    pub grade: i32,
}

impl StudentRecord {
    /// Reads `name` and `grade` out of a JSON body, whatever content type it was sent with.
    pub fn from_json_body(body: &[u8]) -> RosterResult<Self> {
        let value: Value = serde_json::from_slice(body).context(StudentBodyNotJsonSnafu)?;
        let Value::Object(fields) = value else {
            return StudentBodyNotObjectSnafu.fail();
        };

        let name = match field(&fields, "name")? {
            Value::String(name) => name.clone(),
            other => {
                return StudentNameNotStringSnafu {
                    found: other.clone(),
                }
                .fail();
            }
        };

        let grade = field(&fields, "grade")?;
        let grade = coerce_grade(grade).context(GradeNotIntegerSnafu {
            found: grade.clone(),
        })?;

        Ok(Self { name, grade })
    }
}

fn field<'a>(fields: &'a Map<String, Value>, name: &'static str) -> RosterResult<&'a Value> {
    fields
        .get(name)
        .filter(|value| !value.is_null())
        .context(MissingStudentFieldSnafu { field: name })
}

/// Integers, integral floats and integer strings; nothing else counts as a grade.
#[allow(clippy::cast_possible_truncation)]
fn coerce_grade(grade: &Value) -> Option<i32> {
    match grade {
        Value::Number(number) => {
            if let Some(int) = number.as_i64() {
                i32::try_from(int).ok()
            } else {
                let float = number.as_f64()?;
                (float.is_finite()
                    && float.fract() == 0.0
                    && float >= f64::from(i32::MIN)
                    && float <= f64::from(i32::MAX))
                .then_some(float as i32)
            }
        }
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}
