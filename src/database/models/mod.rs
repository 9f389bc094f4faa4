pub mod badge;
pub mod enrollment;
pub mod goal;
pub mod personal_record;
pub mod social;
pub mod training;
pub mod user_badge;
