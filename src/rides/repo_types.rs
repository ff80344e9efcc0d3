use sqlx::FromRow;

/// Who hosts a drive and where; enough to validate a booking or a rating.
#[derive(Debug, Clone, FromRow)]
pub struct Drive {
    pub id: i64,
    pub user_id: i64, // driver
    pub city: String,
}

/// A drive the rider has booked, with the driver's contact details.
#[derive(Debug, Clone, FromRow)]
pub struct BookedDrive {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub city: String,
    pub date: String,
    pub time: String,
    pub driver_rating: Option<f64>,
    pub email: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct AvailableDrive {
    pub id: i64,
    pub city: String,
    pub date: String,
    pub time: String,
    pub driver_rating: Option<f64>,
}
