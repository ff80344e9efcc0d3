use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct HostForm {
    pub drive_date: Option<String>,
    pub drive_time: Option<String>,
}

/// The rides page posts either a rating (`rate_id`, `rating`) or a booking (`drive_id`).
#[derive(Debug, Default, Deserialize)]
pub struct RidesForm {
    pub rate_id: Option<String>,
    pub rating: Option<String>,
    pub drive_id: Option<String>,
}
