use serde::{Deserialize, Serialize};

/// Column names of the `people` table, in the canonical CSV header order.
pub const PERSON_COLUMNS: [&str; 5] = ["name", "surname", "initials", "age", "date_of_birth"];

/// One imported row of the `people` table.
///
/// `(name, surname, date_of_birth)` is unique in the store; `date_of_birth` is
/// kept as the text the upload carried.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Person {
    pub name: String,
    pub surname: String,
    pub initials: String,
    pub age: i32,
    pub date_of_birth: String,
}

impl Person {
    pub fn new(
        name: impl Into<String>,
        surname: impl Into<String>,
        initials: impl Into<String>,
        age: i32,
        date_of_birth: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            surname: surname.into(),
            initials: initials.into(),
            age,
            date_of_birth: date_of_birth.into(),
        }
    }
}
