use std::fmt;

use async_trait::async_trait;
use pgwire::api::auth::{AuthSource, LoginInfo, Password};
use pgwire::error::PgWireResult;

/// Single shared password for every login; the user name is not checked.
pub struct ClinicAuthSource {
    password: String,
}

impl ClinicAuthSource {
    pub fn new(password: String) -> Self {
        Self { password }
    }
}

impl fmt::Debug for ClinicAuthSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClinicAuthSource").finish_non_exhaustive()
    }
}

#[async_trait]
impl AuthSource for ClinicAuthSource {
    async fn get_password(&self, _login: &LoginInfo) -> PgWireResult<Password> {
        Ok(Password::new(None, self.password.as_bytes().to_vec()))
    }
}
