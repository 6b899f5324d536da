use std::fmt;
use std::str::FromStr;

/// Listing category
///
/// Closed set; stored as text in the database and rendered as a hashtag in
/// channel posts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Utility,
    Entertainment,
    Productivity,
    Social,
    Gaming,
    Other,
}

impl Category {
    /// All categories, in keyboard display order.
    pub const ALL: [Category; 6] = [
        Category::Utility,
        Category::Entertainment,
        Category::Productivity,
        Category::Social,
        Category::Gaming,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Utility => "Utility",
            Category::Entertainment => "Entertainment",
            Category::Productivity => "Productivity",
            Category::Social => "Social",
            Category::Gaming => "Gaming",
            Category::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Utility" => Ok(Category::Utility),
            "Entertainment" => Ok(Category::Entertainment),
            "Productivity" => Ok(Category::Productivity),
            "Social" => Ok(Category::Social),
            "Gaming" => Ok(Category::Gaming),
            "Other" => Ok(Category::Other),
            _ => Err(format!("Unknown category: {}", s)),
        }
    }
}

impl rusqlite::types::FromSql for Category {
    fn column_result(value: rusqlite::types::ValueRef<'_>) -> rusqlite::types::FromSqlResult<Self> {
        let s = value.as_str()?;
        Category::from_str(s).map_err(|e| rusqlite::types::FromSqlError::Other(Box::new(std::io::Error::other(e))))
    }
}

impl rusqlite::types::ToSql for Category {
    fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
        Ok(rusqlite::types::ToSqlOutput::Borrowed(rusqlite::types::ValueRef::Text(
            self.as_str().as_bytes(),
        )))
    }
}

/// Account role
///
/// Owner and sudo may also be granted through startup configuration; the
/// moderator role exists only in the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Role {
    Owner,
    Sudo,
    Moderator,
    #[default]
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "owner",
            Role::Sudo => "sudo",
            Role::Moderator => "moderator",
            Role::User => "user",
        }
    }

    /// True for roles allowed to run moderation and admin actions.
    pub fn is_privileged(&self) -> bool {
        matches!(self, Role::Owner | Role::Sudo | Role::Moderator)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "owner" => Ok(Role::Owner),
            "sudo" => Ok(Role::Sudo),
            "moderator" => Ok(Role::Moderator),
            "user" => Ok(Role::User),
            _ => Err(format!("Unknown role: {}", s)),
        }
    }
}

impl rusqlite::types::FromSql for Role {
    fn column_result(value: rusqlite::types::ValueRef<'_>) -> rusqlite::types::FromSqlResult<Self> {
        let s = value.as_str()?;
        Role::from_str(s).map_err(|e| rusqlite::types::FromSqlError::Other(Box::new(std::io::Error::other(e))))
    }
}

impl rusqlite::types::ToSql for Role {
    fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
        Ok(rusqlite::types::ToSqlOutput::Borrowed(rusqlite::types::ValueRef::Text(
            self.as_str().as_bytes(),
        )))
    }
}

/// Submission lifecycle status
///
/// pending → under_review (claimed) → approved | rejected.
/// Unclaiming returns a submission to pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SubmissionStatus {
    #[default]
    Pending,
    UnderReview,
    Approved,
    Rejected,
}

impl SubmissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStatus::Pending => "pending",
            SubmissionStatus::UnderReview => "under_review",
            SubmissionStatus::Approved => "approved",
            SubmissionStatus::Rejected => "rejected",
        }
    }

    /// True while the submission can still be claimed/approved/rejected.
    pub fn is_open(&self) -> bool {
        matches!(self, SubmissionStatus::Pending | SubmissionStatus::UnderReview)
    }
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubmissionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(SubmissionStatus::Pending),
            "under_review" => Ok(SubmissionStatus::UnderReview),
            "approved" => Ok(SubmissionStatus::Approved),
            "rejected" => Ok(SubmissionStatus::Rejected),
            _ => Err(format!("Unknown submission status: {}", s)),
        }
    }
}

impl rusqlite::types::FromSql for SubmissionStatus {
    fn column_result(value: rusqlite::types::ValueRef<'_>) -> rusqlite::types::FromSqlResult<Self> {
        let s = value.as_str()?;
        SubmissionStatus::from_str(s)
            .map_err(|e| rusqlite::types::FromSqlError::Other(Box::new(std::io::Error::other(e))))
    }
}

impl rusqlite::types::ToSql for SubmissionStatus {
    fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
        Ok(rusqlite::types::ToSqlOutput::Borrowed(rusqlite::types::ValueRef::Text(
            self.as_str().as_bytes(),
        )))
    }
}

/// Rejection reason code
///
/// Each code maps to canned explanatory text sent to the submitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectReason {
    Spam,
    Offline,
    InsufficientDescription,
    Duplicate,
    Other,
}

impl RejectReason {
    /// All reasons, in menu display order.
    pub const ALL: [RejectReason; 5] = [
        RejectReason::Spam,
        RejectReason::Offline,
        RejectReason::InsufficientDescription,
        RejectReason::Duplicate,
        RejectReason::Other,
    ];

    /// Short code used in callback tokens.
    pub fn code(&self) -> &'static str {
        match self {
            RejectReason::Spam => "spam",
            RejectReason::Offline => "offline",
            RejectReason::InsufficientDescription => "desc",
            RejectReason::Duplicate => "duplicate",
            RejectReason::Other => "other",
        }
    }

    /// Button label shown to the reviewer.
    pub fn label(&self) -> &'static str {
        match self {
            RejectReason::Spam => "Spam 🗑️",
            RejectReason::Offline => "Offline 🔌",
            RejectReason::InsufficientDescription => "Insufficient Desc 📝",
            RejectReason::Duplicate => "Duplicate 📑",
            RejectReason::Other => "Other (Generic) ❌",
        }
    }

    /// Canned text stored on the submission and sent to the submitter.
    pub fn text(&self) -> &'static str {
        match self {
            RejectReason::Spam => "Identified as spam or malicious.",
            RejectReason::Offline => "Bot appears to be offline or unresponsive.",
            RejectReason::InsufficientDescription => "Description or features provided are insufficient.",
            RejectReason::Duplicate => "This bot is already in our library.",
            RejectReason::Other => "Does not meet our quality standards.",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|r| r.code() == code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_roundtrip() {
        for cat in Category::ALL {
            assert_eq!(Category::from_str(cat.as_str()).unwrap(), cat);
        }
        assert!(Category::from_str("Music").is_err());
    }

    #[test]
    fn test_category_display() {
        assert_eq!(Category::Utility.to_string(), "Utility");
        assert_eq!(Category::Other.to_string(), "Other");
    }

    #[test]
    fn test_role_roundtrip() {
        for role in [Role::Owner, Role::Sudo, Role::Moderator, Role::User] {
            assert_eq!(Role::from_str(role.as_str()).unwrap(), role);
        }
        assert!(Role::from_str("admin").is_err());
    }

    #[test]
    fn test_role_privileged() {
        assert!(Role::Owner.is_privileged());
        assert!(Role::Sudo.is_privileged());
        assert!(Role::Moderator.is_privileged());
        assert!(!Role::User.is_privileged());
    }

    #[test]
    fn test_role_default() {
        assert_eq!(Role::default(), Role::User);
    }

    #[test]
    fn test_status_roundtrip() {
        for status in [
            SubmissionStatus::Pending,
            SubmissionStatus::UnderReview,
            SubmissionStatus::Approved,
            SubmissionStatus::Rejected,
        ] {
            assert_eq!(SubmissionStatus::from_str(status.as_str()).unwrap(), status);
        }
    }

    #[test]
    fn test_status_is_open() {
        assert!(SubmissionStatus::Pending.is_open());
        assert!(SubmissionStatus::UnderReview.is_open());
        assert!(!SubmissionStatus::Approved.is_open());
        assert!(!SubmissionStatus::Rejected.is_open());
    }

    #[test]
    fn test_reject_reason_codes_unique() {
        for reason in RejectReason::ALL {
            assert_eq!(RejectReason::from_code(reason.code()), Some(reason));
        }
        assert_eq!(RejectReason::from_code("nope"), None);
    }
}
