use serde::Deserialize;

use crate::{auth::repo_types::NewUser, forms::filled};

/// Registration form. Every field is optional so missing ones can be reported inline.
#[derive(Debug, Default, Deserialize)]
pub struct RegisterForm {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub city: Option<String>,
    pub brand: Option<String>,
    pub password: Option<String>,
    pub confirmation: Option<String>,
}

/// A registration with every field present.
#[derive(Debug)]
pub struct Registration<'a> {
    pub user: NewUser<'a>,
    pub password: &'a str,
    pub confirmation: &'a str,
}

impl RegisterForm {
    /// Presence checks, first failure wins.
    pub fn require_all(&self) -> Result<Registration<'_>, &'static str> {
        let username = filled(&self.username).ok_or("Missing username")?;
        let password = filled(&self.password).ok_or("Missing password")?;
        let first_name = filled(&self.first_name).ok_or("Missing first name")?;
        let last_name = filled(&self.last_name).ok_or("Missing last name")?;
        let email = filled(&self.email).ok_or("Please provide an email")?;
        let confirmation = filled(&self.confirmation).ok_or("Please confirm password")?;
        let city = filled(&self.city).ok_or("Missing city")?;
        let car_model = filled(&self.brand).ok_or("Missing car brand")?;

        Ok(Registration {
            user: NewUser {
                first_name,
                last_name,
                username,
                car_model,
                city,
                email,
            },
            password,
            confirmation,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    pub username: Option<String>,
    pub password: Option<String>,
}
