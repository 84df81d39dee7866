use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    models::UserProfile,
    validation::{Validate, ValidationErrors, is_valid_email},
};

#[derive(Deserialize, Debug, Clone, ToSchema)]
pub struct SignUpRequest {
    pub email: String,
    pub login: String,
    pub password: String,
    pub phone: String,
    pub firstname: String,
    pub lastname: String,
    pub address: String,
}

impl SignUpRequest {
    /// Trims free-text fields and lowercases the email. The password is kept verbatim.
    pub fn normalized(self) -> Self {
        Self {
            email: self.email.trim().to_lowercase(),
            login: self.login.trim().to_string(),
            password: self.password,
            phone: self.phone.trim().to_string(),
            firstname: self.firstname.trim().to_string(),
            lastname: self.lastname.trim().to_string(),
            address: self.address.trim().to_string(),
        }
    }
}

impl Validate for SignUpRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if !is_valid_email(&self.email) {
            errors.add("email", "must be a valid email address");
        }
        errors.check_length("login", &self.login, 2, Some(30));
        errors.check_length("password", &self.password, 5, None);
        errors.check_length("phone", &self.phone, 5, Some(16));
        errors.check_length("firstname", &self.firstname, 2, Some(30));
        errors.check_length("lastname", &self.lastname, 3, Some(30));
        errors.check_length("address", &self.address, 10, None);
        errors.into_result()
    }
}

#[derive(Deserialize, Debug, Clone, ToSchema)]
pub struct SignInRequest {
    pub login: String,
    pub password: String,
}

impl Validate for SignInRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check_length("login", self.login.trim(), 2, Some(30));
        errors.check_length("password", &self.password, 5, None);
        errors.into_result()
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SignInResponse {
    pub token: String,
    pub user: UserProfile,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
}
