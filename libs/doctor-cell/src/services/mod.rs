pub mod doctor;
pub mod availability;
pub mod validator;

pub use doctor::DoctorService;
pub use availability::AvailabilityService;
pub use validator::AvailabilityValidator;
