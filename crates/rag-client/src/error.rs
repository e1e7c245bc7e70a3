//! Error types for rag-client

use thiserror::Error;

/// Result type alias using rag-client Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when talking to the console API
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Shared storage could not be read or written
    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// Server answered with an error status
    #[error("API error ({status}): {message}")]
    Api {
        status: u16,
        error_code: Option<String>,
        message: String,
    },

    /// Server answered 2xx but the envelope's `result` was not "success"
    #[error("Request rejected: {}", rejection_message(.body))]
    Rejected { body: serde_json::Value },

    /// Access token was rejected and could not be refreshed
    #[error("Unauthorized")]
    Unauthorized,

    /// Server demanded the session be discarded
    #[error("Session was forcibly logged out")]
    ForcedLogout,

    /// No refresh token is stored
    #[error("No refresh token found")]
    NoRefreshToken,

    /// Token refresh did not finish within its timeout
    #[error("request timeout")]
    RefreshTimeout,

    /// Server-sent events error
    #[error("SSE error: {0}")]
    Sse(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// The known error code carried by an API error, if any
    pub fn error_code(&self) -> Option<ErrorCode> {
        match self {
            Error::Api {
                error_code: Some(code),
                ..
            } => ErrorCode::from_code(code),
            _ => None,
        }
    }

    /// Message suitable for showing to a user
    pub fn user_message(&self) -> String {
        match self {
            Error::Api { message, .. } if !message.is_empty() => message.clone(),
            Error::Rejected { body } => rejection_message(body),
            other => other.to_string(),
        }
    }
}

fn rejection_message(body: &serde_json::Value) -> String {
    body.get("message")
        .and_then(|m| m.as_str())
        .or_else(|| body.get("data").and_then(|d| d.as_str()))
        .unwrap_or("Server Error")
        .to_string()
}

macro_rules! error_codes {
    ($($variant:ident => $code:literal, $message:literal;)+) => {
        /// Error codes the server attaches to failed responses
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum ErrorCode {
            $($variant,)+
        }

        impl ErrorCode {
            /// Every known code
            pub const ALL: &'static [ErrorCode] = &[$(ErrorCode::$variant,)+];

            /// Wire representation of the code
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(ErrorCode::$variant => $code,)+
                }
            }

            /// User-facing message for the code
            pub fn message(&self) -> &'static str {
                match self {
                    $(ErrorCode::$variant => $message,)+
                }
            }

            /// Parse a wire code; unknown codes yield `None`
            pub fn from_code(code: &str) -> Option<Self> {
                match code {
                    $($code => Some(ErrorCode::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

error_codes! {
    Unknown => "unknown", "Unknown error";
    InvalidParameter => "invalid_parameter", "Invalid parameter";
    QuotaExceeded => "quota_exceeded", "Quota exceeded";
    RateLimitError => "rate_limit_error", "Rate limit reached, please try again later";
    Unauthorized => "unauthorized", "Please sign in again";

    AlreadySetup => "already_setup", "The system has already been set up";
    NotSetup => "not_setup", "The system has not been set up";
    NotInitValidated => "not_init_validated", "Initialization has not been validated";
    InitValidateFailed => "init_validate_failed", "Initialization validation failed";
    DuplicatedName => "duplicated_name", "The name is already in use";
    DuplicatedEmail => "duplicated_email", "The email is already registered";

    FileTooLarge => "file_too_large", "The file is too large";
    UnsupportedFileType => "unsupported_file_type", "Unsupported file type";
    TooManyFiles => "too_many_files", "Too many files";
    NoFileUploaded => "no_file_uploaded", "No file was uploaded";

    RepeatPasswordNotMatch => "repeat_password_not_match", "The passwords do not match";
    CurrentPasswordIncorrect => "current_password_incorrect", "The current password is incorrect";
    InvalidInvitationCode => "invalid_invitation_code", "Invalid invitation code";
    InvalidAccountDeleteCode => "invalid_account_delete_code", "Invalid account deletion code";

    AccountBanned => "account_banned", "The account has been banned";
    AccountRegisterError => "account_register_error", "Account registration failed";
    AccountLoginError => "account_login_error", "Sign in failed";
    AccountPasswordError => "account_password_error", "Incorrect password";
    AccountNotLinkTenant => "account_not_link_tenant", "The account is not linked to a workspace";
    AlreadyActivate => "already_activate", "The account is already activated";
    AccountNotFound => "account_not_found", "Account not found";
    AccountInFreeze => "account_in_freeze", "The account is frozen";

    LinkAccountIntegrateError => "link_account_integrate_error", "Failed to link the account";
    TenantNotFound => "tenant_not_found", "Workspace not found";
    AccountAlreadyInTenant => "account_already_in_tenant", "The account is already in the workspace";

    InvalidAction => "invalid_action", "Invalid action";
    CannotOperateSelf => "cannot_operate_self", "You cannot perform this action on yourself";
    NoPermission => "no_permission", "You do not have permission";
    MemberNotInTenant => "member_not_in_tenant", "The member is not in the workspace";
    RoleAlreadyAssigned => "role_already_assigned", "The role is already assigned";

    RateLimitExceeded => "rate_limit_exceeded", "Too many requests, please try again later";
    WorkspaceNotAllowedCreateError => "workspace_not_allowed_create_error", "Creating workspaces is not allowed";
    WorkspaceNotFoundError => "workspace_not_found_error", "Workspace not found";

    EmailSendIpLimit => "email_send_ip_limit", "Too many emails sent from this address";
    EmailCodeError => "email_code_error", "Invalid email verification code";
    EmailCodeLoginLimit => "email_code_login_limit", "Too many email sign-in attempts";
    EmailCodeLoginRateLimitExceeded => "email_code_login_rate_limit_exceeded", "Too many email sign-in attempts, please try again later";
    EmailCodeAccountDeletionRateLimitExceeded => "email_code_account_deletion_rate_limit_exceeded", "Too many account deletion attempts, please try again later";
    EmailPasswordResetLimit => "email_password_reset_limit", "Too many password reset emails";

    UnauthorizedAndForceLogout => "unauthorized_and_force_logout", "Your session has ended, please sign in again";
    AuthFailed => "auth_failed", "Authentication failed";
    InvalidEmail => "invalid_email", "Invalid email address";
    PasswordMismatch => "password_mismatch", "Incorrect password";
    InvalidOrExpiredToken => "invalid_or_expired_token", "The token is invalid or has expired";
    PasswordResetRateLimitExceeded => "password_reset_rate_limit_exceeded", "Too many password resets, please try again later";
    EmailOrPasswordMismatch => "email_or_password_mismatch", "Incorrect email or password";

    AgentNotFound => "agent_not_found", "The agent does not exist";
    AgentNotAllowedOperate => "agent_not_allowed_operate", "You are not allowed to operate this agent";

    InvalidName => "invalid_name", "Invalid name";
    NotFound => "not_found", "Resource not found";
    DownloadError => "download_error", "Download failed";
    FileNotFound => "file_not_found", "File not found";
    ArgumentError => "argument_error", "Invalid argument";
    FolderNotFound => "folder_not_found", "Folder not found";
    MaxFileNumPerUser => "max_file_num_per_user", "File limit reached";
    NotSupport => "not_support", "Not supported";
    NoAuthorization => "no_authorization", "You are not authorized for this operation";
    InvalidLlm => "invalid_llm", "Invalid model";
}
