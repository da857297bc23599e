pub mod admindtos;
pub mod bookingdtos;
pub mod providerdtos;
pub mod reviewdtos;
pub mod userdtos;
