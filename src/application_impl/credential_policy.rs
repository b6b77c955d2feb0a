use crate::application_port::AuthError;
use nanoid::nanoid;
use regex::Regex;

/// Alphabet temporary passwords are drawn from.
pub const TEMP_PASSWORD_CHARSET: [char; 69] = [
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', //
    'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', //
    'N', 'O', 'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z', //
    'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm', //
    'n', 'o', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z', //
    '@', '$', '!', '%', '*', '?', '&',
];

const MAX_TEMP_PASSWORD_ATTEMPTS: usize = 1000;

const EMAIL_PATTERN: &str = r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$";
/// `010-1234-5678`, or 10 to 11 bare digits.
const PHONE_PATTERN: &str = r"^(010-\d{4}-\d{4}|\d{10,11})$";

#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
    #[error("temporary password length must be positive")]
    ZeroTempPasswordLength,
}

#[derive(Debug, Clone)]
pub struct PasswordPolicyConfig {
    /// Whole-string pattern, e.g. allowed characters and length.
    pub pattern: String,
    /// Each of these must match somewhere in the password.
    pub required_classes: Vec<String>,
    pub temp_password_length: usize,
}

/// Format rules for signup input, plus the temporary password generator that
/// has to satisfy the same password rules.
pub struct CredentialPolicy {
    email: Regex,
    phone: Regex,
    password: Regex,
    required_classes: Vec<Regex>,
    temp_password_length: usize,
}

impl CredentialPolicy {
    pub fn new(config: &PasswordPolicyConfig) -> Result<Self, PolicyError> {
        // nanoid never returns for a zero size
        if config.temp_password_length == 0 {
            return Err(PolicyError::ZeroTempPasswordLength);
        }
        let required_classes = config
            .required_classes
            .iter()
            .map(|class| Regex::new(class))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            email: Regex::new(EMAIL_PATTERN)?,
            phone: Regex::new(PHONE_PATTERN)?,
            password: Regex::new(&config.pattern)?,
            required_classes,
            temp_password_length: config.temp_password_length,
        })
    }

    pub fn password_matches(&self, password: &str) -> bool {
        self.password.is_match(password)
            && self
                .required_classes
                .iter()
                .all(|class| class.is_match(password))
    }

    pub fn check_signup(
        &self,
        email: &str,
        phone_number: &str,
        password: &str,
    ) -> Result<(), AuthError> {
        if !self.email.is_match(email) {
            return Err(AuthError::InvalidFormat("email".to_string()));
        }
        if !self.phone.is_match(phone_number) {
            return Err(AuthError::InvalidFormat("phone number".to_string()));
        }
        if !self.password_matches(password) {
            return Err(AuthError::InvalidFormat("password".to_string()));
        }
        Ok(())
    }

    /// Rejection sampling: draw uniformly from the charset until the password
    /// rules accept the candidate.
    pub fn generate_temporary_password(&self) -> Result<String, AuthError> {
        let length = self.temp_password_length;
        for _ in 0..MAX_TEMP_PASSWORD_ATTEMPTS {
            let candidate = nanoid!(length, &TEMP_PASSWORD_CHARSET);
            if self.password_matches(&candidate) {
                return Ok(candidate);
            }
        }
        Err(AuthError::InternalError(format!(
            "no temporary password of length {length} satisfies the password policy"
        )))
    }
}
