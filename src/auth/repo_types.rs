use sqlx::FromRow;

/// The columns of a `users` row that sign-in and booking need.
///
/// Profile details, the hosted-drive count and the driver rating are only read
/// through the listing queries in `rides::repo`.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password_hash: String, // Argon2 PHC string
    pub city: String,
}

/// Profile fields supplied at registration.
#[derive(Debug, Clone, Copy)]
pub struct NewUser<'a> {
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub username: &'a str,
    pub car_model: &'a str,
    pub city: &'a str,
    pub email: &'a str,
}
