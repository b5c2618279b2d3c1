//! User data model.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Validation errors returned by the user constructors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserValidationError {
    /// The identifier is not a UUID.
    #[error("user id must be a valid UUID")]
    InvalidId,
    /// The address is blank.
    #[error("email must not be empty")]
    EmptyEmail,
    /// The address lacks a local part or a dotted domain.
    #[error("email must contain a local part and a domain")]
    MalformedEmail,
    /// The role label is not recognised.
    #[error("role must be one of: user, admin")]
    UnknownRole,
}

/// Stable user identifier stored as a UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    /// Validate and construct a [`UserId`] from its textual form.
    ///
    /// # Errors
    ///
    /// Returns [`UserValidationError::InvalidId`] for anything but a bare
    /// UUID.
    pub fn new(id: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let raw = id.as_ref();
        if raw.trim() != raw {
            return Err(UserValidationError::InvalidId);
        }
        Uuid::parse_str(raw)
            .map(Self)
            .map_err(|_| UserValidationError::InvalidId)
    }

    /// Wrap an existing UUID.
    #[must_use]
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Generate a new random [`UserId`].
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Contact address used when notifying promoted users.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Validate and construct an address. Only the `local@domain` shape is
    /// checked; deliverability is not.
    ///
    /// # Examples
    /// ```
    /// use eventbook::domain::EmailAddress;
    ///
    /// assert!(EmailAddress::new("ada@example.com").is_ok());
    /// assert!(EmailAddress::new("ada").is_err());
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`UserValidationError::EmptyEmail`] or
    /// [`UserValidationError::MalformedEmail`].
    pub fn new(raw: impl Into<String>) -> Result<Self, UserValidationError> {
        let value = raw.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(UserValidationError::EmptyEmail);
        }
        match trimmed.split_once('@') {
            Some((local, domain)) if !local.is_empty() && domain.contains('.') => {
                Ok(Self(trimmed.to_owned()))
            }
            _ => Err(UserValidationError::MalformedEmail),
        }
    }

    /// The address as text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl TryFrom<String> for EmailAddress {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authorisation role; admins may manage any event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Regular attendee.
    #[default]
    User,
    /// May manage every event.
    Admin,
}

impl UserRole {
    /// Stored label of the role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }
}

impl FromStr for UserRole {
    type Err = UserValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "" | "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            _ => Err(UserValidationError::UnknownRole),
        }
    }
}

/// Application user as seen by the booking engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    id: UserId,
    email: EmailAddress,
    role: UserRole,
}

impl User {
    /// Assemble a user profile.
    #[must_use]
    pub const fn new(id: UserId, email: EmailAddress, role: UserRole) -> Self {
        Self { id, email, role }
    }

    /// User identifier.
    #[must_use]
    pub const fn id(&self) -> UserId {
        self.id
    }

    /// Notification address.
    #[must_use]
    pub const fn email(&self) -> &EmailAddress {
        &self.email
    }

    /// Authorisation role.
    #[must_use]
    pub const fn role(&self) -> UserRole {
        self.role
    }

    /// Whether this user may read or manage the given event's waitlist.
    #[must_use]
    pub fn can_manage(&self, owner_id: UserId) -> bool {
        self.role == UserRole::Admin || self.id == owner_id
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("", Err(UserValidationError::EmptyEmail))]
    #[case("no-at-sign", Err(UserValidationError::MalformedEmail))]
    #[case("@example.com", Err(UserValidationError::MalformedEmail))]
    #[case("ada@localhost", Err(UserValidationError::MalformedEmail))]
    #[case(" ada@example.com ", Ok("ada@example.com"))]
    fn email_validation(#[case] raw: &str, #[case] expected: Result<&str, UserValidationError>) {
        let parsed = EmailAddress::new(raw);
        assert_eq!(parsed.as_ref().map(EmailAddress::as_str), expected.as_ref().copied());
    }

    #[rstest]
    fn user_id_rejects_padding() {
        let raw = format!(" {} ", Uuid::new_v4());
        assert_eq!(UserId::new(raw), Err(UserValidationError::InvalidId));
    }

    #[rstest]
    #[case("user", UserRole::User)]
    #[case("", UserRole::User)]
    #[case("admin", UserRole::Admin)]
    fn role_parses_known_values(#[case] raw: &str, #[case] role: UserRole) {
        assert_eq!(raw.parse::<UserRole>(), Ok(role));
    }

    #[rstest]
    fn owners_and_admins_can_manage() {
        let owner = UserId::random();
        let email = EmailAddress::new("owner@example.com").expect("valid email");
        let as_owner = User::new(owner, email.clone(), UserRole::User);
        let as_admin = User::new(UserId::random(), email.clone(), UserRole::Admin);
        let stranger = User::new(UserId::random(), email, UserRole::User);

        assert!(as_owner.can_manage(owner));
        assert!(as_admin.can_manage(owner));
        assert!(!stranger.can_manage(owner));
    }
}
