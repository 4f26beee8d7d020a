pub mod education;
pub mod experience;
pub mod skill;

pub use education::Education;
pub use experience::Experience;
pub use skill::Skill;
