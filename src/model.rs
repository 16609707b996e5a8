use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// A user record as stored in the `users` table.
///
/// `id` is the primary key and never changes once the row exists.
/// Fields absent from a request body or null in a row take their zero value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<NaiveDate>,
}

impl User {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = phone.into();
        self
    }

    pub fn with_date_of_birth(mut self, date: NaiveDate) -> Self {
        self.date_of_birth = Some(date);
        self
    }

    /// JSON rendering for logs with contact fields masked.
    pub fn redacted(&self) -> Value {
        json!({
            "id": self.id,
            "username": self.username,
            "email": mask(&self.email),
            "phone": mask(&self.phone),
            "dateOfBirth": self.date_of_birth.map(|_| "***"),
        })
    }
}

fn mask(value: &str) -> String {
    match value.chars().next() {
        None => String::new(),
        Some(first) => format!("{}***", first),
    }
}

/// Result of a conditional write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The statement changed exactly one row.
    Applied,
    /// Update or delete targeted an id with no row.
    NotFound,
    /// Create targeted an id that already has a row; nothing was written.
    AlreadyExists,
}

impl WriteOutcome {
    /// Affected-row view: `1` when applied, `0` otherwise.
    pub fn affected(self) -> i64 {
        match self {
            WriteOutcome::Applied => 1,
            WriteOutcome::NotFound | WriteOutcome::AlreadyExists => 0,
        }
    }

    pub fn is_applied(self) -> bool {
        self == WriteOutcome::Applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_field_names() {
        let user = User::new("u1")
            .with_username("alice")
            .with_date_of_birth(NaiveDate::from_ymd_opt(1990, 4, 2).unwrap());
        let value = serde_json::to_value(&user).unwrap();
        assert_eq!(value["id"], "u1");
        assert_eq!(value["username"], "alice");
        assert_eq!(value["dateOfBirth"], "1990-04-02");
    }

    #[test]
    fn test_missing_fields_default() {
        let user: User = serde_json::from_str(r#"{"id":"u2"}"#).unwrap();
        assert_eq!(user, User::new("u2"));
        assert!(user.date_of_birth.is_none());
    }

    #[test]
    fn test_redacted_masks_contacts() {
        let user = User::new("u1")
            .with_email("alice@example.com")
            .with_phone("+4912345");
        let value = user.redacted();
        assert_eq!(value["email"], "a***");
        assert_eq!(value["phone"], "+***");
        assert!(!value.to_string().contains("example.com"));
    }

    #[test]
    fn test_affected() {
        assert_eq!(WriteOutcome::Applied.affected(), 1);
        assert_eq!(WriteOutcome::NotFound.affected(), 0);
        assert_eq!(WriteOutcome::AlreadyExists.affected(), 0);
    }
}
