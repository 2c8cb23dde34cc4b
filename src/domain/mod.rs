pub mod branch;
pub mod bug_reference;
pub mod commit;
pub mod ticket;
