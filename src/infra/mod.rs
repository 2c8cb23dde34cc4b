pub mod bugzilla;
pub mod git;
