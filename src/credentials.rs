//! Sign-in credentials and their binding from scenario tables.
//!
//! Two table shapes are accepted:
//!
//! ```text
//! | username      | password     |      | field    | value         |
//! | standard_user | secret_sauce |      | username | standard_user |
//!                                       | password | secret_sauce  |
//! ```
//!
//! Column names are matched case-insensitively. Missing, unknown or duplicated
//! columns are rejected instead of being defaulted.

use crate::error::{HarnessError, Result};

const USERNAME: &str = "username";
const PASSWORD: &str = "password";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Bind a scenario table (rows of cells, header first) to credentials
    pub fn from_table(rows: &[Vec<String>]) -> Result<Self> {
        let header = rows
            .first()
            .ok_or_else(|| HarnessError::InvalidTable("table is empty".to_string()))?;

        let is_vertical = header.len() == 2
            && header[0].trim().eq_ignore_ascii_case("field")
            && header[1].trim().eq_ignore_ascii_case("value");

        if is_vertical {
            Self::from_vertical(&rows[1..])
        } else {
            Self::from_horizontal(header, &rows[1..])
        }
    }

    fn from_horizontal(header: &[String], data: &[Vec<String>]) -> Result<Self> {
        let row = match data {
            [row] => row,
            [] => {
                return Err(HarnessError::InvalidTable(
                    "expected one credentials row below the header, found none".to_string(),
                ))
            }
            _ => {
                return Err(HarnessError::InvalidTable(format!(
                    "expected one credentials row below the header, found {}",
                    data.len()
                )))
            }
        };

        if row.len() != header.len() {
            return Err(HarnessError::InvalidTable(format!(
                "row has {} cells but header has {}",
                row.len(),
                header.len()
            )));
        }

        let mut fields = FieldSlots::default();
        for (name, value) in header.iter().zip(row) {
            fields.assign(name, value)?;
        }
        fields.finish()
    }

    fn from_vertical(data: &[Vec<String>]) -> Result<Self> {
        let mut fields = FieldSlots::default();
        for row in data {
            match row.as_slice() {
                [name, value] => fields.assign(name, value)?,
                _ => {
                    return Err(HarnessError::InvalidTable(format!(
                        "field/value rows need exactly 2 cells, found {}",
                        row.len()
                    )))
                }
            }
        }
        fields.finish()
    }
}

#[derive(Default)]
struct FieldSlots {
    username: Option<String>,
    password: Option<String>,
}

impl FieldSlots {
    fn assign(&mut self, name: &str, value: &str) -> Result<()> {
        let slot = match name.trim().to_ascii_lowercase().as_str() {
            USERNAME => &mut self.username,
            PASSWORD => &mut self.password,
            other => {
                return Err(HarnessError::InvalidTable(format!(
                    "unknown column '{}' (expected '{}' and '{}')",
                    other, USERNAME, PASSWORD
                )))
            }
        };
        if slot.is_some() {
            return Err(HarnessError::InvalidTable(format!(
                "column '{}' appears more than once",
                name.trim()
            )));
        }
        *slot = Some(value.to_string());
        Ok(())
    }

    fn finish(self) -> Result<Credentials> {
        let missing = |field: &str| HarnessError::InvalidTable(format!("missing column '{}'", field));
        Ok(Credentials {
            username: self.username.ok_or_else(|| missing(USERNAME))?,
            password: self.password.ok_or_else(|| missing(PASSWORD))?,
        })
    }
}
