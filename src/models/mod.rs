pub mod adminmodel;
pub mod bookingmodel;
pub mod providermodel;
pub mod reviewmodel;
pub mod usermodel;
