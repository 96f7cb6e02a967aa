use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct SupabaseUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub aud: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct PasswordGrantRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct SupabaseSession {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    pub expires_in: i64,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub user: SupabaseUser,
}

/// GoTrue and Storage disagree on error field names; this accepts all of them.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct SupabaseErrorBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl SupabaseErrorBody {
    pub fn best_message(&self) -> Option<&str> {
        self.error_description
            .as_deref()
            .or(self.msg.as_deref())
            .or(self.message.as_deref())
            .or(self.error.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn best_message_prefers_description() {
        let raw = r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#;
        let parsed: SupabaseErrorBody = serde_json::from_str(raw).expect("parse error body");
        assert_eq!(parsed.best_message(), Some("Invalid login credentials"));
    }

    #[test]
    fn session_parses_user() {
        let raw = r#"{
            "access_token": "at",
            "token_type": "bearer",
            "expires_in": 3600,
            "refresh_token": "rt",
            "user": {"id": "u-1", "email": "a@b.c", "aud": "authenticated"}
        }"#;
        let parsed: SupabaseSession = serde_json::from_str(raw).expect("parse session");
        assert_eq!(parsed.user.id, "u-1");
        assert_eq!(parsed.expires_in, 3600);
    }
}
