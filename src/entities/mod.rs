pub mod prelude;

pub mod certificates;
pub mod password_recoveries;
pub mod users;
