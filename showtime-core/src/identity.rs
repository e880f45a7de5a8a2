use serde::{Deserialize, Serialize};
use showtime_shared::Masked;

use crate::{CoreError, CoreResult};

/// The customer a booking is issued to. Both fields are masked in log output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub name: Masked<String>,
    pub email: Masked<String>,
}

impl UserIdentity {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> CoreResult<Self> {
        let name = name.into().trim().to_string();
        let email = email.into().trim().to_string();

        if name.is_empty() {
            return Err(CoreError::ValidationError("user_name is required".to_string()));
        }
        if !email.contains('@') {
            return Err(CoreError::ValidationError("user_email is not a valid address".to_string()));
        }

        Ok(Self {
            name: Masked(name),
            email: Masked(email),
        })
    }
}
